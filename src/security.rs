//! Path admission policy for sync candidates.
//!
//! Sync plans are produced by an earlier CI step and may have been tampered
//! with before they reach us, so every candidate path is checked again here,
//! in both entry flows, before it can become part of a batch.

use std::path::Path;
use thiserror::Error;

/// Why a candidate path was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathViolation {
    #[error("path is empty")]
    Empty,

    #[error("path contains a parent-directory traversal")]
    Traversal,

    #[error("path is absolute")]
    Absolute,

    #[error("path is outside {prefix} and is not {structure_file}")]
    OutsideSource {
        prefix: String,
        structure_file: String,
    },
}

/// Allow-list of paths the sync tooling may touch.
///
/// A path is admissible iff it lies under the source-locale prefix or is
/// exactly the structural manifest file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPolicy {
    source_prefix: String,
    structure_file: String,
}

impl SyncPolicy {
    pub fn new(source_prefix: &str, structure_file: &str) -> Self {
        Self {
            source_prefix: source_prefix.to_string(),
            structure_file: structure_file.to_string(),
        }
    }

    /// `true` if the path may enter a batch.
    pub fn validate(&self, path: &str) -> bool {
        self.check(path).is_ok()
    }

    /// Same as [`validate`](Self::validate) but reports the first rule broken.
    pub fn check(&self, path: &str) -> Result<(), PathViolation> {
        if path.is_empty() {
            return Err(PathViolation::Empty);
        }
        // Substring match, so `a..b` is refused as well
        if path.contains("..") {
            return Err(PathViolation::Traversal);
        }
        if path.starts_with('/') || path.starts_with('\\') || Path::new(path).is_absolute() {
            return Err(PathViolation::Absolute);
        }
        if path.starts_with(&self.source_prefix) || path == self.structure_file {
            return Ok(());
        }
        Err(PathViolation::OutsideSource {
            prefix: self.source_prefix.clone(),
            structure_file: self.structure_file.clone(),
        })
    }
}
