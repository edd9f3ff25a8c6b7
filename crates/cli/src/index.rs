use codegraph_api::CodeIndexer;
use codegraph_core::IndexerConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(path: PathBuf, config: IndexerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let indexer = codegraph_runtime::build_default_indexer(config);

    info!("Indexing workspace at: {}...", path.display());

    // Ctrl-C stops the run between files; committed files stay indexed.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let summary = indexer.index_workspace(&path, cancel).await?;

    info!(
        "Indexing complete: {} indexed, {} unchanged, {} removed, {} failed in {}ms",
        summary.files_indexed,
        summary.files_unchanged,
        summary.files_removed,
        summary.files_failed,
        summary.elapsed_ms
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
