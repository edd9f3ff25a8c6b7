use crate::error::IndexResult;
use crate::models::{Definition, IndexSummary, QueryDefinitionOptions};
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Operations the indexing core exposes to transport layers and schedulers.
#[async_trait]
pub trait CodeIndexer: Send + Sync {
    /// Walk `workspace`, parse every visited file and commit the results.
    ///
    /// Per-file parse failures are reported in the summary. Only an invalid
    /// workspace, cancellation or an unavailable store fail the call.
    async fn index_workspace(
        &self,
        workspace: &Path,
        cancel: CancellationToken,
    ) -> IndexResult<IndexSummary>;

    /// Drop every indexed record of `workspace`.
    async fn remove_all_indexes(&self, workspace: &Path) -> IndexResult<()>;

    /// Resolve the element at the given line range to its definitions.
    /// An empty vector means nothing resolved.
    async fn query_definitions(
        &self,
        options: &QueryDefinitionOptions,
        cancel: CancellationToken,
    ) -> IndexResult<Vec<Definition>>;
}
