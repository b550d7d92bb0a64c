//! Change classification between two revisions.
//!
//! The orchestrator only depends on the [`ChangeAnalyzer`] trait. The shipped
//! [`GitChangeAnalyzer`] asks `git` for the changed paths and sorts them into
//! source docs, translations, the structural manifest, and deletions or
//! renames of source docs.

use crate::config::SyncProfile;
use anyhow::{bail, Context, Result};
use std::fmt;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCategory {
    /// Only source-language docs (and possibly the manifest) changed
    English,
    /// Only translated docs changed
    Translation,
    /// Both source and translated docs changed
    Mixed,
    /// No documentation changed
    Other,
}

impl fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeCategory::English => "english",
            ChangeCategory::Translation => "translation",
            ChangeCategory::Mixed => "mixed",
            ChangeCategory::Other => "other",
        };
        f.write_str(name)
    }
}

/// Classified change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeAnalysis {
    pub category: ChangeCategory,
    /// Source-language documents to (re)translate, in diff order
    pub english_files: Vec<String>,
    /// Documents under any target-locale directory
    pub translation_files: Vec<String>,
    /// Deletions and renames of source-language documents
    pub file_operations: Vec<FileOperation>,
    /// Whether the structural manifest is part of the change
    pub structure_changed: bool,
}

/// A source document that went away or moved; its translations follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    Deleted(String),
    Renamed { from: String, to: String },
}

impl FileOperation {
    /// Every path the operation touches, for policy checks.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            FileOperation::Deleted(path) => vec![path.as_str()],
            FileOperation::Renamed { from, to } => vec![from.as_str(), to.as_str()],
        }
    }
}

/// One line of `git diff --name-status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathChange {
    /// Added, modified, copied or type-changed
    Changed(String),
    Deleted(String),
    Renamed { from: String, to: String },
}

/// Parse `git diff --name-status` output. Unknown status letters are ignored.
pub fn parse_name_status(output: &str) -> Result<Vec<PathChange>> {
    let mut changes = Vec::new();

    for line in output.lines().filter(|l| !l.trim().is_empty()) {
        let mut parts = line.split('\t');
        let status = parts.next().unwrap_or_default();
        let first = parts
            .next()
            .with_context(|| format!("Malformed name-status line: {:?}", line))?;

        let change = match status.chars().next() {
            Some('A' | 'M' | 'T') => PathChange::Changed(first.to_string()),
            Some('D') => PathChange::Deleted(first.to_string()),
            Some('R') => PathChange::Renamed {
                from: first.to_string(),
                to: parts
                    .next()
                    .with_context(|| format!("Rename without destination: {:?}", line))?
                    .to_string(),
            },
            // A copy leaves the original in place; only the new path matters
            Some('C') => PathChange::Changed(
                parts
                    .next()
                    .with_context(|| format!("Copy without destination: {:?}", line))?
                    .to_string(),
            ),
            _ => {
                debug!("Ignoring name-status line {:?}", line);
                continue;
            }
        };
        changes.push(change);
    }

    Ok(changes)
}

#[allow(async_fn_in_trait)]
pub trait ChangeAnalyzer {
    async fn analyze(&self, base: &str, head: &str) -> Result<ChangeAnalysis>;
}

/// Classification rules shared by every analyzer implementation.
#[derive(Debug, Clone)]
pub struct ChangeClassifier {
    source_prefix: String,
    target_prefixes: Vec<String>,
    structure_file: String,
}

impl ChangeClassifier {
    pub fn new(profile: &SyncProfile) -> Self {
        Self {
            source_prefix: profile.source_prefix.clone(),
            target_prefixes: profile
                .targets
                .iter()
                .map(|locale| format!("{}/", locale.code()))
                .collect(),
            structure_file: profile.structure_file.clone(),
        }
    }

    /// Source docs are markdown pages under the source tree, excluding the
    /// generated API reference.
    pub fn is_english_doc(&self, path: &str) -> bool {
        path.strip_prefix(&self.source_prefix).is_some_and(|rest| {
            (rest.ends_with(".md") || rest.ends_with(".mdx")) && !rest.starts_with("api-reference/")
        })
    }

    pub fn is_translation_doc(&self, path: &str) -> bool {
        self.target_prefixes.iter().any(|prefix| path.starts_with(prefix))
    }

    /// Classify plain changed paths, as if every one was modified.
    pub fn classify<I, S>(&self, changed: I) -> ChangeAnalysis
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.classify_changes(
            changed
                .into_iter()
                .map(|path| PathChange::Changed(path.as_ref().to_string())),
        )
    }

    pub fn classify_changes<I>(&self, changes: I) -> ChangeAnalysis
    where
        I: IntoIterator<Item = PathChange>,
    {
        let mut english_files = Vec::new();
        let mut translation_files = Vec::new();
        let mut file_operations = Vec::new();
        let mut structure_changed = false;

        for change in changes {
            match change {
                PathChange::Changed(path) => {
                    if path == self.structure_file {
                        structure_changed = true;
                    } else if self.is_english_doc(&path) {
                        english_files.push(path);
                    } else if self.is_translation_doc(&path) {
                        translation_files.push(path);
                    }
                }
                PathChange::Deleted(path) => {
                    if self.is_english_doc(&path) {
                        file_operations.push(FileOperation::Deleted(path));
                    } else if self.is_translation_doc(&path) {
                        translation_files.push(path);
                    }
                }
                PathChange::Renamed { from, to } => {
                    if self.is_english_doc(&from) || self.is_english_doc(&to) {
                        if self.is_english_doc(&to) {
                            english_files.push(to.clone());
                        }
                        file_operations.push(FileOperation::Renamed { from, to });
                    } else if self.is_translation_doc(&from) || self.is_translation_doc(&to) {
                        translation_files.push(to);
                    }
                }
            }
        }

        let english_side = !english_files.is_empty() || !file_operations.is_empty();
        let category = match (english_side, !translation_files.is_empty()) {
            (true, false) => ChangeCategory::English,
            (false, true) => ChangeCategory::Translation,
            (true, true) => ChangeCategory::Mixed,
            // A manifest-only change still belongs to the source side
            (false, false) if structure_changed => ChangeCategory::English,
            (false, false) => ChangeCategory::Other,
        };

        ChangeAnalysis {
            category,
            english_files,
            translation_files,
            file_operations,
            structure_changed,
        }
    }
}

/// Analyzer backed by `git diff --name-status`.
pub struct GitChangeAnalyzer {
    repo_root: PathBuf,
    classifier: ChangeClassifier,
}

impl GitChangeAnalyzer {
    pub fn new(repo_root: impl Into<PathBuf>, profile: &SyncProfile) -> Self {
        Self {
            repo_root: repo_root.into(),
            classifier: ChangeClassifier::new(profile),
        }
    }
}

/// Revisions come from CI input and must not be read as git options.
fn check_revision(revision: &str) -> Result<()> {
    if revision.trim().is_empty() {
        bail!("Empty git revision");
    }
    if revision.starts_with('-') {
        bail!("Invalid git revision {:?}: must not start with '-'", revision);
    }
    Ok(())
}

impl ChangeAnalyzer for GitChangeAnalyzer {
    async fn analyze(&self, base: &str, head: &str) -> Result<ChangeAnalysis> {
        check_revision(base)?;
        check_revision(head)?;

        let output = Command::new("git")
            .args(["diff", "--name-status", "--find-renames", "--end-of-options", base, head, "--"])
            .current_dir(&self.repo_root)
            .output()
            .await
            .context("Failed to run git diff")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git diff {}..{} failed: {}", base, head, stderr.trim());
        }

        let stdout = String::from_utf8(output.stdout).context("git diff output is not UTF-8")?;
        let changes = parse_name_status(&stdout)?;
        debug!("git diff {}..{} reported {} changes", base, head, changes.len());

        Ok(self.classifier.classify_changes(changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn classifier() -> ChangeClassifier {
        ChangeClassifier::new(&SyncProfile::update().unwrap())
    }

    // ==================== Doc Detection Tests ====================

    #[test]
    fn test_is_english_doc() {
        let c = classifier();
        assert!(c.is_english_doc("en/guide.md"));
        assert!(c.is_english_doc("en/pages/intro.mdx"));
        assert!(!c.is_english_doc("en/api-reference/openapi.md"));
        assert!(!c.is_english_doc("en/images/logo.png"));
        assert!(!c.is_english_doc("zh-hans/guide.md"));
    }

    #[test]
    fn test_is_translation_doc() {
        let c = classifier();
        assert!(c.is_translation_doc("zh-hans/guide.md"));
        assert!(c.is_translation_doc("ja-jp/guide.md"));
        assert!(!c.is_translation_doc("en/guide.md"));
    }

    // ==================== Classification Tests ====================

    #[test]
    fn test_classify_english_only() {
        let analysis = classifier().classify(["en/a.md", "docs.json", "README.md"]);
        assert_eq!(analysis.category, ChangeCategory::English);
        assert_eq!(analysis.english_files, vec!["en/a.md"]);
        assert!(analysis.structure_changed);
    }

    #[test]
    fn test_classify_translation_only() {
        let analysis = classifier().classify(["zh-hans/a.md", "ja-jp/a.md"]);
        assert_eq!(analysis.category, ChangeCategory::Translation);
        assert!(analysis.english_files.is_empty());
        assert_eq!(analysis.translation_files.len(), 2);
        assert!(!analysis.structure_changed);
    }

    #[test]
    fn test_classify_mixed() {
        let analysis = classifier().classify(["en/a.md", "ja-jp/b.md"]);
        assert_eq!(analysis.category, ChangeCategory::Mixed);
    }

    #[test]
    fn test_classify_nothing_relevant() {
        let analysis = classifier().classify(["src/main.rs", "README.md"]);
        assert_eq!(analysis.category, ChangeCategory::Other);
    }

    #[test]
    fn test_classify_manifest_only() {
        let analysis = classifier().classify(["docs.json"]);
        assert_eq!(analysis.category, ChangeCategory::English);
        assert!(analysis.english_files.is_empty());
        assert!(analysis.structure_changed);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ChangeCategory::English.to_string(), "english");
        assert_eq!(ChangeCategory::Translation.to_string(), "translation");
        assert_eq!(ChangeCategory::Mixed.to_string(), "mixed");
        assert_eq!(ChangeCategory::Other.to_string(), "other");
    }

    // ==================== Name-Status Tests ====================

    #[test]
    fn test_parse_name_status() {
        let output = "M\ten/guide.md\nA\ten/new.mdx\nD\ten/old.md\nR087\ten/a.md\ten/b.md\nC100\ten/x.md\ten/y.md\nX\tweird\n";
        let changes = parse_name_status(output).expect("Should parse");

        assert_eq!(
            changes,
            vec![
                PathChange::Changed("en/guide.md".to_string()),
                PathChange::Changed("en/new.mdx".to_string()),
                PathChange::Deleted("en/old.md".to_string()),
                PathChange::Renamed {
                    from: "en/a.md".to_string(),
                    to: "en/b.md".to_string(),
                },
                PathChange::Changed("en/y.md".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_name_status_malformed_rename() {
        assert!(parse_name_status("R100\ten/a.md\n").is_err());
        assert!(parse_name_status("M\n").is_err());
    }

    #[test]
    fn test_classify_deleted_english_doc() {
        let analysis = classifier().classify_changes([
            PathChange::Deleted("en/gone.md".to_string()),
            PathChange::Deleted("en/images/logo.png".to_string()),
        ]);

        assert_eq!(analysis.category, ChangeCategory::English);
        assert!(analysis.english_files.is_empty());
        assert_eq!(
            analysis.file_operations,
            vec![FileOperation::Deleted("en/gone.md".to_string())]
        );
    }

    #[test]
    fn test_classify_renamed_english_doc_is_retranslated() {
        let analysis = classifier().classify_changes([PathChange::Renamed {
            from: "en/old/intro.md".to_string(),
            to: "en/new/intro.md".to_string(),
        }]);

        assert_eq!(analysis.category, ChangeCategory::English);
        assert_eq!(analysis.english_files, vec!["en/new/intro.md"]);
        assert_eq!(
            analysis.file_operations[0].paths(),
            vec!["en/old/intro.md", "en/new/intro.md"]
        );
    }

    #[test]
    fn test_classify_translation_delete_is_translation_change() {
        let analysis = classifier().classify_changes([PathChange::Deleted("ja-jp/a.md".to_string())]);
        assert_eq!(analysis.category, ChangeCategory::Translation);
        assert!(analysis.file_operations.is_empty());
    }

    // ==================== Revision Tests ====================

    #[test]
    fn test_check_revision() {
        assert!(check_revision("HEAD~1").is_ok());
        assert!(check_revision("3f2a9c1").is_ok());
        assert!(check_revision("--output=/tmp/pwned").is_err());
        assert!(check_revision("-p").is_err());
        assert!(check_revision("  ").is_err());
    }

    #[tokio::test]
    async fn test_git_analyzer_rejects_option_like_revision() {
        let dir = TempDir::new().unwrap();
        let analyzer = GitChangeAnalyzer::new(dir.path(), &SyncProfile::update().unwrap());

        let err = analyzer
            .analyze("--output=/tmp/pwned", "HEAD")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("must not start with '-'"));
    }

    // ==================== Git Analyzer Tests ====================

    #[tokio::test]
    async fn test_git_analyzer_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let analyzer = GitChangeAnalyzer::new(dir.path(), &SyncProfile::update().unwrap());

        let result = analyzer.analyze("HEAD~1", "HEAD").await;
        assert!(result.is_err());
    }
}
