use codegraph_api::{IndexError, IndexResult};
use codegraph_core::{Indexer, IndexerConfig};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

/// Bootstraps an indexer with every bundled language parser.
///
/// A parser whose queries fail to compile is logged and skipped; the rest
/// still index.
pub fn build_default_indexer(config: IndexerConfig) -> Arc<Indexer> {
    let mut builder = Indexer::builder().with_config(config);

    match codegraph_python::PythonParser::new() {
        Ok(parser) => builder = builder.with_parser(Arc::new(parser)),
        Err(e) => tracing::error!("Failed to load Python parser: {}", e),
    }
    match codegraph_c::CParser::new() {
        Ok(parser) => builder = builder.with_parser(Arc::new(parser)),
        Err(e) => tracing::error!("Failed to load C parser: {}", e),
    }
    match codegraph_cpp::CppParser::new() {
        Ok(parser) => builder = builder.with_parser(Arc::new(parser)),
        Err(e) => tracing::error!("Failed to load C++ parser: {}", e),
    }

    Arc::new(builder.build())
}

/// Initializes logging for a component. This delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> WorkerGuard {
    codegraph_core::logging::init_logging(component, to_stderr)
}

/// Removes every stored workspace index under the configured directory.
pub fn clear_all_indexes(config: &IndexerConfig) -> IndexResult<()> {
    let Some(dir) = &config.index_dir else {
        return Ok(());
    };
    match std::fs::remove_dir_all(dir) {
        Ok(()) => {
            tracing::info!("Cleared all indexes at {}", dir.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(IndexError::StoreUnavailable(format!(
            "failed to clear {}: {}",
            dir.display(),
            e
        ))),
    }
}
