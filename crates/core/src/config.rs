use crate::error::Result;
use codegraph_api::VisitPattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INDEX_DIR: &str = ".codegraph/indices";
pub const INDEX_DIR_ENV: &str = "CODEGRAPH_INDEX_DIR";
pub const CONCURRENCY_ENV: &str = "CODEGRAPH_CONCURRENCY";
pub const DEFAULT_MAX_FILE_BYTES: u64 = 4 * 1024 * 1024;

/// Indexer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Where per-workspace indexes are persisted. `None` keeps everything in
    /// memory.
    pub index_dir: Option<PathBuf>,
    /// Files parsed in parallel.
    pub concurrency: usize,
    pub visit_pattern: VisitPattern,
    /// Line number of the first line as seen by callers (0 or 1).
    pub line_base: i32,
    /// Larger files are reported as failures instead of parsed.
    pub max_file_bytes: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            index_dir: Some(base_index_dir()),
            concurrency: default_concurrency(),
            visit_pattern: VisitPattern::default(),
            line_base: 0,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl IndexerConfig {
    /// Defaults with `CODEGRAPH_INDEX_DIR` and `CODEGRAPH_CONCURRENCY` applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(n) = std::env::var(CONCURRENCY_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config.concurrency = n;
        }
        config
    }

    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn in_memory() -> Self {
        Self {
            index_dir: None,
            ..Self::default()
        }
    }

    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_visit_pattern(mut self, pattern: VisitPattern) -> Self {
        self.visit_pattern = pattern;
        self
    }

    pub fn with_line_base(mut self, line_base: i32) -> Self {
        self.line_base = line_base;
        self
    }

    pub fn with_max_file_bytes(mut self, max: u64) -> Self {
        self.max_file_bytes = max;
        self
    }

    pub(crate) fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

/// Base directory for stored indexes, honoring `CODEGRAPH_INDEX_DIR`.
pub fn base_index_dir() -> PathBuf {
    if let Ok(env_dir) = std::env::var(INDEX_DIR_ENV) {
        return PathBuf::from(env_dir);
    }

    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_INDEX_DIR)
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codegraph.json");
        std::fs::write(
            &path,
            r#"{ "line_base": 1, "visit_pattern": { "include_exts": [".py"] } }"#,
        )
        .unwrap();

        let config = IndexerConfig::load(&path).unwrap();
        assert_eq!(config.line_base, 1);
        assert_eq!(config.visit_pattern.include_exts, vec![".py".to_string()]);
        assert!(config.visit_pattern.exclude_dirs.iter().any(|d| d == ".git"));
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert!(config.concurrency >= 1);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ line_base: ").unwrap();
        assert!(IndexerConfig::load(&path).is_err());
    }

    #[test]
    fn test_zero_concurrency_still_makes_progress() {
        let config = IndexerConfig::in_memory().with_concurrency(0);
        assert_eq!(config.effective_concurrency(), 1);
        assert!(config.index_dir.is_none());
    }
}
