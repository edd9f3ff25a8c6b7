use crate::error::{IndexError, IndexResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location-based definition query.
///
/// Lines use the line base the indexer is configured with (0-based unless
/// configured otherwise). `code_snippet` carries the current, possibly
/// unsaved, content of `file_path`; it is parsed transiently and never
/// persisted.
#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
pub struct QueryDefinitionOptions {
    pub workspace: PathBuf,
    pub file_path: PathBuf,
    pub start_line: i32,
    pub end_line: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<Vec<u8>>,
}

impl QueryDefinitionOptions {
    pub fn new(
        workspace: impl Into<PathBuf>,
        file_path: impl Into<PathBuf>,
        start_line: i32,
        end_line: i32,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            file_path: file_path.into(),
            start_line,
            end_line,
            code_snippet: None,
        }
    }

    pub fn with_snippet(mut self, snippet: impl Into<Vec<u8>>) -> Self {
        self.code_snippet = Some(snippet.into());
        self
    }

    /// Rejects empty paths and negative or inverted line ranges.
    pub fn validate(&self) -> IndexResult<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(IndexError::invalid("file path is empty"));
        }
        if self.start_line < 0 || self.end_line < 0 {
            return Err(IndexError::invalid(format!(
                "negative line range [{}, {}]",
                self.start_line, self.end_line
            )));
        }
        if self.start_line > self.end_line {
            return Err(IndexError::invalid(format!(
                "start line {} is after end line {}",
                self.start_line, self.end_line
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_ranges() {
        let ok = QueryDefinitionOptions::new("/ws", "a.py", 3, 3);
        assert!(ok.validate().is_ok());

        let inverted = QueryDefinitionOptions::new("/ws", "a.py", 5, 4);
        assert!(matches!(inverted.validate(), Err(IndexError::InvalidInput(_))));

        let negative = QueryDefinitionOptions::new("/ws", "a.py", -1, 2);
        assert!(matches!(negative.validate(), Err(IndexError::InvalidInput(_))));

        let empty = QueryDefinitionOptions::new("/ws", "", 0, 0);
        assert!(matches!(empty.validate(), Err(IndexError::InvalidInput(_))));
    }

    #[test]
    fn test_snippet_is_omitted_from_json_when_absent() {
        let value = serde_json::to_value(QueryDefinitionOptions::new("/ws", "a.py", 1, 2)).unwrap();
        assert!(value.get("code_snippet").is_none());
    }
}
