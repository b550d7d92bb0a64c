use crate::locale::Locale;
use crate::orchestrator::OrchestratorSettings;
use crate::security::SyncPolicy;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// Process-level configuration, read once from the environment by the binaries.
///
/// The orchestrator never reads the environment itself; the binaries turn this
/// into a [`SyncProfile`] and explicit orchestrator settings.
#[derive(Debug, Clone)]
pub struct Config {
    // Translator
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,

    // Repository layout
    pub docs_root: PathBuf,

    // Run behavior
    pub max_sync_files: Option<usize>,
    pub strict_structure_sync: bool,
    pub results_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let max_sync_files = std::env::var("MAX_SYNC_FILES")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok());
        if max_sync_files == Some(0) {
            bail!("MAX_SYNC_FILES must be at least 1");
        }

        Ok(Self {
            // Missing key is reported by the orchestrator, after plan validation
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),

            docs_root: std::env::var("DOCS_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),

            max_sync_files,
            strict_structure_sync: std::env::var("STRICT_STRUCTURE_SYNC")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            results_path: std::env::var("SYNC_RESULTS_PATH").ok().map(PathBuf::from),
        })
    }

    /// Run settings handed to the orchestrator core.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            api_key: self.openai_api_key.clone(),
            docs_root: self.docs_root.clone(),
            strict_structure_sync: self.strict_structure_sync,
        }
    }

    /// Layer the environment overrides on top of a flow's default profile.
    pub fn apply_to(&self, mut profile: SyncProfile) -> SyncProfile {
        if let Some(max) = self.max_sync_files {
            profile.max_batch_size = max;
        }
        if let Some(path) = &self.results_path {
            profile.results_path = path.clone();
        }
        profile
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Everything that differs between the plan-driven and diff-driven flows.
///
/// Both flows share one profile type so the source prefix, locale set and
/// batch bound are defined in one place.
#[derive(Debug, Clone)]
pub struct SyncProfile {
    /// Path prefix of the source locale, including the trailing slash
    pub source_prefix: String,
    /// Locales every source file is translated into, in execution order
    pub targets: Vec<Locale>,
    /// Locales whose `docs.json` sections are reconciled. Shared by both
    /// flows so the manifest converges to one state.
    pub navigation_targets: Vec<Locale>,
    /// Structural manifest; admissible but never translated per file
    pub structure_file: String,
    /// Frozen documentation that is never translated automatically
    pub versioned_prefix: String,
    /// Maximum number of entries considered in one run
    pub max_batch_size: usize,
    /// Fixed location of the result manifest, overwritten every run
    pub results_path: PathBuf,
    /// Adds `"updated": true` to the result manifest
    pub mark_updated: bool,
}

impl SyncProfile {
    pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

    /// Directory codes the navigation tree points at.
    pub const NAVIGATION_TARGETS: &'static [&'static str] = &["zh-hans", "ja-jp"];

    /// Profile for `docs-sync`, driven by a precomputed sync plan.
    pub fn plan() -> Result<Self> {
        Self::new(&["cn", "jp"], "/tmp/sync_results.json", false)
    }

    /// Profile for `docs-update`, driven by a revision diff.
    pub fn update() -> Result<Self> {
        Self::new(&["zh-hans", "ja-jp"], "/tmp/update_results.json", true)
    }

    /// Build a profile for the given target locale codes.
    pub fn new(target_codes: &[&str], results_path: impl AsRef<Path>, mark_updated: bool) -> Result<Self> {
        let source = Locale::source();
        let targets = target_codes
            .iter()
            .map(|code| Locale::from_code(code))
            .collect::<Result<Vec<_>>>()?;
        if targets.iter().any(|locale| locale.is_source()) {
            bail!("The source locale '{}' cannot be a translation target", source.code());
        }
        let navigation_targets = Self::NAVIGATION_TARGETS
            .iter()
            .map(|code| Locale::from_code(code))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source_prefix: format!("{}/", source.code()),
            targets,
            navigation_targets,
            structure_file: "docs.json".to_string(),
            versioned_prefix: "versions/".to_string(),
            max_batch_size: Self::DEFAULT_MAX_BATCH_SIZE,
            results_path: results_path.as_ref().to_path_buf(),
            mark_updated,
        })
    }

    pub fn with_max_batch_size(mut self, max: usize) -> Self {
        self.max_batch_size = max;
        self
    }

    pub fn with_results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = path.into();
        self
    }

    /// Path admission rules derived from this profile.
    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy::new(&self.source_prefix, &self.structure_file)
    }

    pub fn is_structure_file(&self, path: &str) -> bool {
        path == self.structure_file
    }

    /// Versioned docs live either at the repository root or inside the source tree.
    pub fn is_versioned(&self, path: &str) -> bool {
        path.starts_with(&self.versioned_prefix)
            || path
                .strip_prefix(&self.source_prefix)
                .is_some_and(|rest| rest.starts_with(&self.versioned_prefix))
    }

    /// Destination of `source` in `locale`: the source prefix is replaced with
    /// the locale's directory code. `None` for paths outside the source tree.
    pub fn target_path(&self, source: &str, locale: Locale) -> Option<String> {
        source
            .strip_prefix(&self.source_prefix)
            .map(|rest| format!("{}/{}", locale.code(), rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "OPENAI_API_URL",
        "DOCS_ROOT",
        "MAX_SYNC_FILES",
        "STRICT_STRUCTURE_SYNC",
        "SYNC_RESULTS_PATH",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    // ==================== from_env Tests ====================

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();

        let config = Config::from_env().expect("Should load");
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(
            config.openai_api_url,
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.docs_root, PathBuf::from("."));
        assert!(config.max_sync_files.is_none());
        assert!(!config.strict_structure_sync);
        assert!(config.results_path.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "sk-test");
        std::env::set_var("OPENAI_MODEL", "gpt-5-mini");
        std::env::set_var("DOCS_ROOT", "/srv/docs");
        std::env::set_var("MAX_SYNC_FILES", "3");
        std::env::set_var("STRICT_STRUCTURE_SYNC", "true");
        std::env::set_var("SYNC_RESULTS_PATH", "/tmp/custom.json");

        let config = Config::from_env().expect("Should load");
        clear_env();

        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_model, "gpt-5-mini");
        assert_eq!(config.docs_root, PathBuf::from("/srv/docs"));
        assert_eq!(config.max_sync_files, Some(3));
        assert!(config.strict_structure_sync);
        assert_eq!(config.results_path, Some(PathBuf::from("/tmp/custom.json")));
    }

    #[test]
    #[serial]
    fn test_from_env_blank_api_key_is_missing() {
        clear_env();
        std::env::set_var("OPENAI_API_KEY", "   ");

        let config = Config::from_env().expect("Should load");
        clear_env();

        assert!(config.openai_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_max_falls_back() {
        clear_env();
        std::env::set_var("MAX_SYNC_FILES", "lots");

        let config = Config::from_env().expect("Should load");
        clear_env();

        assert!(config.max_sync_files.is_none());
    }

    #[test]
    #[serial]
    fn test_from_env_zero_max_rejected() {
        clear_env();
        std::env::set_var("MAX_SYNC_FILES", "0");

        let result = Config::from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" yes "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    // ==================== SyncProfile Tests ====================

    #[test]
    fn test_plan_profile() {
        let profile = SyncProfile::plan().unwrap();
        let codes: Vec<_> = profile.targets.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["cn", "jp"]);
        assert_eq!(profile.source_prefix, "en/");
        assert_eq!(profile.max_batch_size, 10);
        assert_eq!(profile.results_path, PathBuf::from("/tmp/sync_results.json"));
        assert!(!profile.mark_updated);
    }

    #[test]
    fn test_update_profile() {
        let profile = SyncProfile::update().unwrap();
        let codes: Vec<_> = profile.targets.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["zh-hans", "ja-jp"]);
        assert_eq!(profile.results_path, PathBuf::from("/tmp/update_results.json"));
        assert!(profile.mark_updated);
    }

    #[test]
    fn test_both_flows_share_navigation_targets() {
        let plan = SyncProfile::plan().unwrap();
        let update = SyncProfile::update().unwrap();
        assert_eq!(plan.navigation_targets, update.navigation_targets);

        let codes: Vec<_> = plan.navigation_targets.iter().map(|l| l.code()).collect();
        assert_eq!(codes, vec!["zh-hans", "ja-jp"]);
    }

    #[test]
    fn test_profile_rejects_unknown_or_source_target() {
        assert!(SyncProfile::new(&["fr"], "/tmp/x.json", false).is_err());
        assert!(SyncProfile::new(&["en"], "/tmp/x.json", false).is_err());
    }

    #[test]
    fn test_target_path_replaces_only_leading_prefix() {
        let profile = SyncProfile::plan().unwrap();
        let cn = Locale::from_code("cn").unwrap();
        assert_eq!(
            profile.target_path("en/guide/en/intro.md", cn).as_deref(),
            Some("cn/guide/en/intro.md")
        );
        assert_eq!(profile.target_path("docs.json", cn), None);
    }

    #[test]
    fn test_is_versioned_and_structure() {
        let profile = SyncProfile::plan().unwrap();
        assert!(profile.is_versioned("versions/3.0/en/intro.md"));
        assert!(profile.is_versioned("en/versions/2.x/intro.md"));
        assert!(!profile.is_versioned("en/versions.md"));
        assert!(profile.is_structure_file("docs.json"));
        assert!(!profile.is_structure_file("en/docs.json"));
    }

    #[test]
    fn test_apply_to_overrides_profile() {
        let config = Config {
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_api_url: "http://localhost".to_string(),
            docs_root: PathBuf::from("."),
            max_sync_files: Some(2),
            strict_structure_sync: false,
            results_path: Some(PathBuf::from("/tmp/override.json")),
        };

        let profile = config.apply_to(SyncProfile::plan().unwrap());
        assert_eq!(profile.max_batch_size, 2);
        assert_eq!(profile.results_path, PathBuf::from("/tmp/override.json"));
    }
}
