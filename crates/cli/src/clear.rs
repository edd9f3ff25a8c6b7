use codegraph_api::CodeIndexer;
use codegraph_core::IndexerConfig;
use std::path::PathBuf;
use tracing::info;

pub async fn run(path: Option<PathBuf>, config: IndexerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = path {
        info!("Clearing index for workspace at: {}...", path.display());
        let indexer = codegraph_runtime::build_default_indexer(config);
        indexer.remove_all_indexes(&path).await?;
        info!("Workspace index cleared.");
    } else {
        info!("Clearing all indexes...");
        codegraph_runtime::clear_all_indexes(&config)?;
        info!("All indexes cleared.");
    }
    Ok(())
}
