//! Orchestration core shared by the plan-driven and diff-driven flows.
//!
//! A run validates its candidates, bounds the batch, translates each entry
//! into every target locale one task at a time, reconciles the structural
//! manifest once at the end, and persists the result manifest. A failing
//! translation task is recorded and never stops its siblings.
//!
//! The diff-driven flow first propagates deletions and renames of source
//! documents to every target locale.

use crate::analyzer::{ChangeAnalyzer, ChangeCategory, FileOperation};
use crate::config::SyncProfile;
use crate::error::SyncError;
use crate::plan::SyncPlan;
use crate::report::{RunResult, SkipReason};
use crate::structure::StructureSynchronizer;
use crate::translator::{TranslationTask, Translator};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Explicit run settings; the core never reads the process environment.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Translator credential. Required: a run without it aborts before any task.
    pub api_key: Option<String>,
    /// Repository root the candidate paths are relative to
    pub docs_root: PathBuf,
    /// Count a structural reconciliation failure against the run
    pub strict_structure_sync: bool,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: RunResult,
    /// Deletions and renames applied to target-locale copies
    pub file_operations: Vec<String>,
    /// Reconciliation log; empty when reconciliation did not run or failed
    pub structure_log: Vec<String>,
    /// Set when reconciliation ran and failed
    pub structure_error: Option<String>,
    strict_structure_sync: bool,
}

impl RunOutcome {
    /// Drives the process exit code.
    pub fn is_success(&self) -> bool {
        if self.result.has_failures() {
            return false;
        }
        !(self.strict_structure_sync && self.structure_error.is_some())
    }
}

pub struct Orchestrator<T, S> {
    profile: SyncProfile,
    settings: OrchestratorSettings,
    translator: T,
    structure: S,
}

impl<T, S> Orchestrator<T, S>
where
    T: Translator,
    S: StructureSynchronizer,
{
    pub fn new(profile: SyncProfile, settings: OrchestratorSettings, translator: T, structure: S) -> Self {
        Self {
            profile,
            settings,
            translator,
            structure,
        }
    }

    /// Plan-driven sync: the whole plan is re-validated before anything runs.
    pub async fn run_plan(&self, plan: &SyncPlan) -> Result<RunOutcome, SyncError> {
        info!("Validating {} planned files", plan.files_to_sync.len());
        plan.validate(&self.profile.policy())?;
        self.require_credential()?;

        self.execute(&[], plan.paths(), plan.structure_changes.structure_changed)
            .await
    }

    /// Diff-driven update: only source-language changes are synced.
    pub async fn run_update<A: ChangeAnalyzer>(
        &self,
        analyzer: &A,
        base: &str,
        head: &str,
    ) -> Result<RunOutcome, SyncError> {
        info!("Analyzing changes between {} and {}", base, head);
        let analysis = analyzer
            .analyze(base, head)
            .await
            .map_err(SyncError::Analysis)?;

        if analysis.category != ChangeCategory::English {
            return Err(SyncError::ClassificationMismatch {
                found: analysis.category,
                expected: ChangeCategory::English,
            });
        }

        let policy = self.profile.policy();
        let operation_paths = analysis
            .file_operations
            .iter()
            .flat_map(FileOperation::paths);
        for path in analysis.english_files.iter().map(String::as_str).chain(operation_paths) {
            policy
                .check(path)
                .map_err(|reason| SyncError::SecurityViolation {
                    path: path.to_string(),
                    reason,
                })?;
        }
        self.require_credential()?;

        info!(
            "Found {} English files to update translations for",
            analysis.english_files.len()
        );
        self.execute(
            &analysis.file_operations,
            analysis.english_files,
            analysis.structure_changed,
        )
        .await
    }

    fn require_credential(&self) -> Result<(), SyncError> {
        match self.settings.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(SyncError::Configuration(
                "translator API credential is not set".to_string(),
            )),
        }
    }

    /// Dedupe in order, then keep the first `max_batch_size` entries.
    fn build_batch(&self, paths: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = paths
            .into_iter()
            .filter(|path| seen.insert(path.clone()))
            .collect();

        if unique.len() > self.profile.max_batch_size {
            info!(
                "Limiting run to the first {} of {} files",
                self.profile.max_batch_size,
                unique.len()
            );
        }
        unique
            .into_iter()
            .take(self.profile.max_batch_size)
            .collect()
    }

    async fn execute(
        &self,
        operations: &[FileOperation],
        paths: Vec<String>,
        structure_changed: bool,
    ) -> Result<RunOutcome, SyncError> {
        let mut result = RunResult::new(self.profile.mark_updated);
        let file_operations = self.propagate_operations(operations, &mut result).await;

        let batch = self.build_batch(paths);

        for path in &batch {
            self.process_entry(path, &mut result).await;
        }

        let (structure_log, structure_error) = if structure_changed {
            self.reconcile_structure().await
        } else {
            (Vec::new(), None)
        };

        result.write_manifest(&self.profile.results_path).await?;
        result.log_summary();

        Ok(RunOutcome {
            result,
            file_operations,
            structure_log,
            structure_error,
            strict_structure_sync: self.settings.strict_structure_sync,
        })
    }

    /// Delete or move the target-locale copies of deleted or renamed source
    /// documents. A copy that does not exist is left alone; a failed
    /// filesystem operation is recorded against its destination.
    async fn propagate_operations(&self, operations: &[FileOperation], result: &mut RunResult) -> Vec<String> {
        let mut log = Vec::new();

        for operation in operations {
            for locale in &self.profile.targets {
                match operation {
                    FileOperation::Deleted(source) => {
                        let Some(target) = self.profile.target_path(source, *locale) else {
                            continue;
                        };
                        let full_path = self.settings.docs_root.join(&target);
                        if !tokio::fs::try_exists(&full_path).await.unwrap_or(false) {
                            continue;
                        }
                        match tokio::fs::remove_file(&full_path).await {
                            Ok(()) => {
                                info!("  ✓ Deleted {}", target);
                                log.push(format!("DELETED: {}", target));
                            }
                            Err(e) => {
                                error!("  ✗ Failed to delete {}: {}", target, e);
                                result.record_failed(target);
                            }
                        }
                    }
                    FileOperation::Renamed { from, to } => {
                        let (Some(old_target), Some(new_target)) = (
                            self.profile.target_path(from, *locale),
                            self.profile.target_path(to, *locale),
                        ) else {
                            continue;
                        };
                        let old_path = self.settings.docs_root.join(&old_target);
                        if !tokio::fs::try_exists(&old_path).await.unwrap_or(false) {
                            continue;
                        }
                        let new_path = self.settings.docs_root.join(&new_target);
                        match move_file(&old_path, &new_path).await {
                            Ok(()) => {
                                info!("  ✓ Renamed {} -> {}", old_target, new_target);
                                log.push(format!("RENAMED: {} -> {}", old_target, new_target));
                            }
                            Err(e) => {
                                error!("  ✗ Failed to rename {} -> {}: {}", old_target, new_target, e);
                                result.record_failed(new_target);
                            }
                        }
                    }
                }
            }
        }

        log
    }

    async fn process_entry(&self, path: &str, result: &mut RunResult) {
        info!("Processing: {}", path);

        if self.profile.is_structure_file(path) {
            result.record_skipped(path, SkipReason::StructureFile);
            return;
        }
        if self.profile.is_versioned(path) {
            info!("Skipping versioned file {}", path);
            result.record_skipped(path, SkipReason::Versioned);
            return;
        }

        let source = self.settings.docs_root.join(path);
        if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
            warn!("File {} not found, skipping", path);
            result.record_skipped(path, SkipReason::MissingSource);
            return;
        }

        let tasks: Option<Vec<TranslationTask>> = self
            .profile
            .targets
            .iter()
            .map(|locale| {
                self.profile
                    .target_path(path, *locale)
                    .map(|destination| TranslationTask {
                        source: path.to_string(),
                        destination,
                        locale: *locale,
                    })
            })
            .collect();
        let Some(tasks) = tasks else {
            warn!("{} is outside {}, skipping", path, self.profile.source_prefix);
            result.record_skipped(path, SkipReason::OutsideSource);
            return;
        };

        for task in tasks {
            info!("  Translating to {}: {}", task.locale, task.destination);
            match self.translator.translate(&task).await {
                Ok(()) => {
                    info!("  ✓ Successfully translated: {}", task.destination);
                    result.record_translated(task.destination);
                }
                Err(e) => {
                    error!("  ✗ Failed to translate {}: {:#}", task.destination, e);
                    result.record_failed(task.destination);
                }
            }
        }
    }

    async fn reconcile_structure(&self) -> (Vec<String>, Option<String>) {
        info!("Syncing {} structure...", self.profile.structure_file);
        match self.structure.reconcile().await {
            Ok(log) => {
                for line in &log {
                    info!("  {}", line);
                }
                (log, None)
            }
            Err(e) => {
                error!("Error syncing {} structure: {:#}", self.profile.structure_file, e);
                (Vec::new(), Some(format!("{:#}", e)))
            }
        }
    }
}

async fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::rename(from, to).await
}
