use codegraph_api::{CodeIndexer, QueryDefinitionOptions};
use codegraph_core::IndexerConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub struct Request {
    pub workspace: PathBuf,
    pub file: PathBuf,
    pub start_line: i32,
    pub end_line: i32,
    pub snippet: Option<PathBuf>,
}

pub async fn run(request: Request, config: IndexerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let indexer = codegraph_runtime::build_default_indexer(config);

    let mut options = QueryDefinitionOptions::new(
        &request.workspace,
        &request.file,
        request.start_line,
        request.end_line,
    );
    if let Some(snippet) = &request.snippet {
        options = options.with_snippet(tokio::fs::read(snippet).await?);
    }

    let definitions = indexer
        .query_definitions(&options, CancellationToken::new())
        .await?;
    println!("{}", serde_json::to_string_pretty(&definitions)?);
    Ok(())
}
