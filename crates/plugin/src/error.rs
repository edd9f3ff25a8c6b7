use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Invalid query: {0}")]
    Query(String),

    #[error("Capture name '{0}' not found in SCM")]
    Capture(String),

    #[error("Grammar error: {0}")]
    Grammar(String),

    #[error("Source is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, PluginError>;
