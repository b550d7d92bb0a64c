//! Sync plan produced by the upstream planning step.

use crate::error::SyncError;
use crate::security::SyncPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PLAN_FILE_NAME: &str = "sync_plan.json";

/// One candidate file. Fields other than `path` are carried along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            metadata: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructureChanges {
    #[serde(default)]
    pub structure_changed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPlan {
    #[serde(default)]
    pub files_to_sync: Vec<FileEntry>,
    #[serde(default)]
    pub structure_changes: StructureChanges,
}

impl SyncPlan {
    /// Read `sync_plan.json` from the planning step's working directory.
    pub async fn load(work_dir: &Path) -> Result<Self, SyncError> {
        let path = work_dir.join(PLAN_FILE_NAME);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| SyncError::Plan {
            path: path.clone(),
            source: e.into(),
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: PathBuf) -> Result<Self, SyncError> {
        serde_json::from_str(content).map_err(|e| SyncError::Plan {
            path,
            source: e.into(),
        })
    }

    /// Check every listed path, not only the ones that will fit in the batch.
    /// The first offending entry aborts the run.
    pub fn validate(&self, policy: &SyncPolicy) -> Result<(), SyncError> {
        for entry in &self.files_to_sync {
            policy
                .check(&entry.path)
                .map_err(|reason| SyncError::SecurityViolation {
                    path: entry.path.clone(),
                    reason,
                })?;
        }
        Ok(())
    }

    pub fn paths(&self) -> Vec<String> {
        self.files_to_sync.iter().map(|e| e.path.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::PathViolation;
    use tempfile::TempDir;

    fn policy() -> SyncPolicy {
        SyncPolicy::new("en/", "docs.json")
    }

    // ==================== Parsing Tests ====================

    #[test]
    fn test_parse_full_plan() {
        let json = r#"{
            "files_to_sync": [
                {"path": "en/guide.md", "size": 1200, "status": "modified"},
                {"path": "docs.json"}
            ],
            "structure_changes": {"structure_changed": true}
        }"#;

        let plan = SyncPlan::parse(json, PathBuf::from("plan.json")).expect("Should parse");
        assert_eq!(plan.paths(), vec!["en/guide.md", "docs.json"]);
        assert!(plan.structure_changes.structure_changed);
        assert_eq!(plan.files_to_sync[0].metadata["size"], 1200);
        assert_eq!(plan.files_to_sync[0].metadata["status"], "modified");
        assert!(plan.files_to_sync[1].metadata.is_empty());
    }

    #[test]
    fn test_parse_missing_sections_default() {
        let plan = SyncPlan::parse("{}", PathBuf::from("plan.json")).expect("Should parse");
        assert!(plan.files_to_sync.is_empty());
        assert!(!plan.structure_changes.structure_changed);

        let plan = SyncPlan::parse(r#"{"structure_changes": {}}"#, PathBuf::from("plan.json"))
            .expect("Should parse");
        assert!(!plan.structure_changes.structure_changed);
    }

    #[test]
    fn test_parse_entry_without_path_fails() {
        let result = SyncPlan::parse(
            r#"{"files_to_sync": [{"size": 10}]}"#,
            PathBuf::from("plan.json"),
        );
        assert!(matches!(result, Err(SyncError::Plan { .. })));
    }

    #[tokio::test]
    async fn test_load_from_work_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PLAN_FILE_NAME),
            r#"{"files_to_sync": [{"path": "en/a.md"}]}"#,
        )
        .unwrap();

        let plan = SyncPlan::load(dir.path()).await.expect("Should load");
        assert_eq!(plan.paths(), vec!["en/a.md"]);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = SyncPlan::load(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains(PLAN_FILE_NAME));
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_accepts_clean_plan() {
        let plan = SyncPlan {
            files_to_sync: vec![FileEntry::new("en/a.md"), FileEntry::new("docs.json")],
            structure_changes: StructureChanges::default(),
        };
        assert!(plan.validate(&policy()).is_ok());
    }

    #[test]
    fn test_validate_stops_at_first_violation() {
        let plan = SyncPlan {
            files_to_sync: vec![
                FileEntry::new("en/a.md"),
                FileEntry::new("/etc/passwd"),
                FileEntry::new("../x.md"),
            ],
            structure_changes: StructureChanges::default(),
        };

        match plan.validate(&policy()) {
            Err(SyncError::SecurityViolation { path, reason }) => {
                assert_eq!(path, "/etc/passwd");
                assert_eq!(reason, PathViolation::Absolute);
            }
            other => panic!("Expected security violation, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_checks_entries_beyond_batch_cap() {
        let mut files: Vec<FileEntry> = (0..15).map(|i| FileEntry::new(format!("en/{}.md", i))).collect();
        files.push(FileEntry::new("jp/late.md"));
        let plan = SyncPlan {
            files_to_sync: files,
            structure_changes: StructureChanges::default(),
        };

        assert!(plan.validate(&policy()).is_err());
    }
}
