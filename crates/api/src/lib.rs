//! Public contract of the codegraph indexer.
//!
//! Transport layers and schedulers depend on this crate only: the query and
//! result shapes, the visit pattern, the error taxonomy and the
//! [`CodeIndexer`] service trait.

pub mod error;
pub mod indexer;
pub mod models;

pub use error::{IndexError, IndexResult};
pub use indexer::CodeIndexer;
pub use models::*;
