use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file that could not be parsed during a workspace run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of an `index_workspace` run.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct IndexSummary {
    /// Files parsed and committed in this run.
    pub files_indexed: usize,
    pub files_failed: usize,
    /// Files whose content hash matched the stored record.
    pub files_unchanged: usize,
    /// Index entries dropped because the file vanished or became excluded.
    pub files_removed: usize,
    pub errors: Vec<FileFailure>,
    pub elapsed_ms: u64,
}

impl IndexSummary {
    pub fn record_failure(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        self.files_failed += 1;
        self.errors.push(FileFailure {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn files_visited(&self) -> usize {
        self.files_indexed + self.files_failed + self.files_unchanged
    }
}

/// Lifecycle of one workspace inside an indexer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceState {
    #[default]
    Unindexed,
    Indexing,
    Indexed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_count_towards_visited() {
        let mut summary = IndexSummary {
            files_indexed: 2,
            files_unchanged: 1,
            ..Default::default()
        };
        summary.record_failure("bad.c", "not utf-8");
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.files_visited(), 4);
        assert_eq!(summary.errors[0].path, PathBuf::from("bad.c"));
    }
}
