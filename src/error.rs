use crate::analyzer::ChangeCategory;
use crate::security::PathViolation;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a sync run before or instead of producing a result.
///
/// Per-task translation failures are not errors at this level; they are
/// recorded in the run result.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("security violation for {path}: {reason}")]
    SecurityViolation { path: String, reason: PathViolation },

    #[error("change category is '{found}', only '{expected}' changes are synced by this flow")]
    ClassificationMismatch {
        found: ChangeCategory,
        expected: ChangeCategory,
    },

    #[error("failed to load sync plan {}: {source:#}", path.display())]
    Plan {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("change analysis failed: {0:#}")]
    Analysis(#[source] anyhow::Error),

    #[error("failed to write result manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// Short category name used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Configuration(_) => "ConfigurationError",
            SyncError::SecurityViolation { .. } => "SecurityViolation",
            SyncError::ClassificationMismatch { .. } => "ClassificationMismatch",
            SyncError::Plan { .. } => "PlanError",
            SyncError::Analysis(_) => "AnalysisError",
            SyncError::Manifest { .. } => "ManifestError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = SyncError::Configuration("OPENAI_API_KEY not set".to_string());
        assert_eq!(err.to_string(), "configuration error: OPENAI_API_KEY not set");

        let err = SyncError::SecurityViolation {
            path: "../x".to_string(),
            reason: PathViolation::Traversal,
        };
        assert!(err.to_string().contains("../x"));
        assert!(err.to_string().contains("traversal"));

        let err = SyncError::ClassificationMismatch {
            found: ChangeCategory::Translation,
            expected: ChangeCategory::English,
        };
        assert_eq!(
            err.to_string(),
            "change category is 'translation', only 'english' changes are synced by this flow"
        );
    }

    #[test]
    fn test_kind() {
        assert_eq!(SyncError::Configuration(String::new()).kind(), "ConfigurationError");
        assert_eq!(
            SyncError::Analysis(anyhow::anyhow!("git failed")).kind(),
            "AnalysisError"
        );
    }
}
