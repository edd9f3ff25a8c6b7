//! Element model and the contract language parsers implement.

pub mod element;
pub mod error;
pub mod parser;
pub mod utils;

pub use element::{
    CodeElement, Element, FileElement, Import, content_hash, is_valid_element, span_contains,
    span_of,
};
pub use error::{PluginError, Result};
pub use parser::{BoxError, LanguageParser, default_import_matches};
