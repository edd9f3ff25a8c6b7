use std::path::PathBuf;

/// Errors surfaced by the indexing core to its callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// Malformed query range, missing or unreadable workspace, empty path.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A single file could not be parsed. Recorded in summaries, never
    /// returned from a workspace run.
    #[error("Failed to parse {}: {message}", path.display())]
    ParseFailure { path: PathBuf, message: String },
    #[error("Operation cancelled")]
    Cancelled,
    /// The workspace index could not be read or written.
    #[error("Index store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IndexError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        IndexError::InvalidInput(msg.into())
    }

    /// Whether a caller may reasonably retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IndexError::Cancelled | IndexError::StoreUnavailable(_))
    }
}

pub type IndexResult<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(IndexError::Cancelled.is_retryable());
        assert!(IndexError::StoreUnavailable("disk full".into()).is_retryable());
        assert!(!IndexError::invalid("bad range").is_retryable());
        assert!(
            !IndexError::ParseFailure {
                path: PathBuf::from("a.py"),
                message: "boom".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_parse_failure_message_names_file() {
        let err = IndexError::ParseFailure {
            path: PathBuf::from("src/a.c"),
            message: "not utf-8".into(),
        };
        assert_eq!(err.to_string(), "Failed to parse src/a.c: not utf-8");
    }
}
