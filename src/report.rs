//! Per-run result manifest.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Why a candidate entry was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    StructureFile,
    Versioned,
    MissingSource,
    OutsideSource,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::StructureFile => "structure file - handled separately",
            SkipReason::Versioned => "versioned - not translated",
            SkipReason::MissingSource => "source file not found",
            SkipReason::OutsideSource => "outside the source tree",
        };
        f.write_str(reason)
    }
}

/// Outcome of every entry and task in one run.
///
/// `translated` and `failed` hold destination paths; `skipped` holds
/// `"<source path> (<reason>)"` records. Lists only grow during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub translated: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub updated: bool,
}

impl RunResult {
    pub fn new(updated: bool) -> Self {
        Self {
            updated,
            ..Self::default()
        }
    }

    pub fn record_translated(&mut self, destination: impl Into<String>) {
        self.translated.push(destination.into());
    }

    pub fn record_failed(&mut self, destination: impl Into<String>) {
        self.failed.push(destination.into());
    }

    pub fn record_skipped(&mut self, path: &str, reason: SkipReason) {
        self.skipped.push(format!("{} ({})", path, reason));
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Overwrite the manifest at `path` with this result.
    pub async fn write_manifest(&self, path: &Path) -> Result<(), SyncError> {
        let to_error = |source: std::io::Error| SyncError::Manifest {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(to_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| to_error(e.into()))?;
        tokio::fs::write(path, json).await.map_err(to_error)?;

        info!("Results saved to {}", path.display());
        Ok(())
    }

    pub fn log_summary(&self) {
        info!("Translation summary:");
        info!("  ✓ Translated: {} files", self.translated.len());
        info!("  ✗ Failed: {} files", self.failed.len());
        info!("  - Skipped: {} files", self.skipped.len());
    }
}
