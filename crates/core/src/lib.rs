//! Indexing core: the per-workspace element store, the resolver and the
//! [`Indexer`] implementing [`codegraph_api::CodeIndexer`].

pub mod config;
pub mod error;
pub mod indexer;
pub mod logging;
pub mod registry;
pub mod resolver;
pub mod store;

pub use config::IndexerConfig;
pub use error::{CoreError, Result};
pub use indexer::{Indexer, IndexerBuilder};
pub use registry::ParserRegistry;
pub use resolver::{Confidence, Resolver};
pub use store::{IndexStats, WorkspaceIndex};
