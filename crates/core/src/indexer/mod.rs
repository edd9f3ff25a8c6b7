//! Workspace indexing and definition queries.
//!
//! Each workspace root gets its own [`WorkspaceIndex`]. Files are parsed on
//! tokio's blocking pool with at most `concurrency` in flight, and committed
//! one by one so queries keep working while a run is in progress.

mod query;
mod walk;

use crate::config::IndexerConfig;
use crate::error::CoreError;
use crate::registry::ParserRegistry;
use crate::resolver::Resolver;
use crate::store::WorkspaceIndex;
use async_trait::async_trait;
use codegraph_api::{
    CodeIndexer, CompiledVisitPattern, Definition, IndexError, IndexResult, IndexSummary,
    QueryDefinitionOptions, WorkspaceState,
};
use codegraph_plugin::{FileElement, LanguageParser, content_hash};
use dashmap::DashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use walk::SourceFile;

fn join_error(e: JoinError) -> IndexError {
    IndexError::Internal(e.to_string())
}

struct Workspace {
    index: Arc<WorkspaceIndex>,
    state: Mutex<WorkspaceState>,
    /// Serializes indexing runs on the same workspace.
    run_lock: tokio::sync::Mutex<()>,
    active: Mutex<Option<CancellationToken>>,
}

struct Run {
    prior: WorkspaceState,
    token: CancellationToken,
}

impl Workspace {
    fn new(index: WorkspaceIndex, state: WorkspaceState) -> Self {
        Self {
            index: Arc::new(index),
            state: Mutex::new(state),
            run_lock: tokio::sync::Mutex::new(()),
            active: Mutex::new(None),
        }
    }

    fn state(&self) -> WorkspaceState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: WorkspaceState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn begin(&self, cancel: &CancellationToken) -> Run {
        let token = cancel.child_token();
        let prior = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *state, WorkspaceState::Indexing)
        };
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Run { prior, token }
    }

    /// A failed or cancelled run restores the state it started from, unless
    /// the workspace was cleared meanwhile.
    fn finish(&self, run: Run, succeeded: bool) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = None;
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == WorkspaceState::Indexing {
            *state = if succeeded {
                WorkspaceState::Indexed
            } else {
                run.prior
            };
        }
    }

    fn cancel_active(&self) {
        if let Some(token) = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            token.cancel();
        }
    }
}

enum FileOutcome {
    Indexed,
    Unchanged,
    Failed { path: String, message: String },
    Abandoned,
    StoreFailed(CoreError),
}

/// Everything a blocking worker needs to process one file.
#[derive(Clone)]
struct FileTask {
    index: Arc<WorkspaceIndex>,
    registry: Arc<ParserRegistry>,
    max_file_bytes: u64,
    token: CancellationToken,
}

impl FileTask {
    fn run(&self, file: SourceFile) -> FileOutcome {
        if self.token.is_cancelled() {
            return FileOutcome::Abandoned;
        }
        // A file that no longer parses keeps nothing from its last good run.
        let failed = |message: String| match self.index.remove(&file.rel) {
            Ok(_) => FileOutcome::Failed {
                path: file.rel.clone(),
                message,
            },
            Err(e) => FileOutcome::StoreFailed(e),
        };

        let content = match read_source(&file.abs, self.max_file_bytes) {
            Ok(content) => content,
            Err(message) => return failed(message),
        };

        match self.index.content_hash(&file.rel) {
            Ok(Some(hash)) if hash == content_hash(&content) => return FileOutcome::Unchanged,
            Ok(_) => {}
            Err(e) => return FileOutcome::StoreFailed(e),
        }

        let Some(parser) = self.registry.for_path(&file.abs) else {
            return failed("no parser registered for this file type".to_string());
        };
        let parsed = match parser.parse(&file.rel, &content) {
            Ok(parsed) => parsed,
            Err(e) => return failed(e.to_string()),
        };

        if self.token.is_cancelled() {
            return FileOutcome::Abandoned;
        }
        match self.index.upsert(parsed) {
            Ok(()) => FileOutcome::Indexed,
            Err(e) => FileOutcome::StoreFailed(e),
        }
    }
}

fn read_source(path: &Path, max_bytes: u64) -> Result<Vec<u8>, String> {
    let metadata = std::fs::metadata(path).map_err(|e| e.to_string())?;
    if metadata.len() > max_bytes {
        return Err(format!(
            "file is {} bytes, above the {} byte limit",
            metadata.len(),
            max_bytes
        ));
    }
    std::fs::read(path).map_err(|e| e.to_string())
}

fn validate_workspace(path: &Path) -> IndexResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(IndexError::invalid("workspace path is empty"));
    }
    let root = path.canonicalize().map_err(|e| {
        IndexError::invalid(format!("workspace {} is not accessible: {}", path.display(), e))
    })?;
    if !root.is_dir() {
        return Err(IndexError::invalid(format!(
            "workspace {} is not a directory",
            path.display()
        )));
    }
    std::fs::read_dir(&root).map_err(|e| {
        IndexError::invalid(format!("workspace {} is unreadable: {}", path.display(), e))
    })?;
    Ok(root)
}

/// Canonical root when it still exists, the path as given otherwise.
fn workspace_key(path: &Path) -> IndexResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(IndexError::invalid("workspace path is empty"));
    }
    Ok(path.canonicalize().unwrap_or_else(|_| path.to_path_buf()))
}

pub struct IndexerBuilder {
    config: IndexerConfig,
    registry: ParserRegistry,
}

impl IndexerBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexerConfig::default(),
            registry: ParserRegistry::new(),
        }
    }

    pub fn with_config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn LanguageParser>) -> Self {
        self.registry.register(parser);
        self
    }

    pub fn build(self) -> Indexer {
        Indexer {
            pattern: self.config.visit_pattern.compile(),
            config: self.config,
            registry: Arc::new(self.registry),
            workspaces: DashMap::new(),
        }
    }
}

impl Default for IndexerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Indexer {
    config: IndexerConfig,
    pattern: CompiledVisitPattern,
    registry: Arc<ParserRegistry>,
    workspaces: DashMap<PathBuf, Arc<Workspace>>,
}

impl Indexer {
    pub fn builder() -> IndexerBuilder {
        IndexerBuilder::new()
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn workspace_state(&self, workspace: &Path) -> WorkspaceState {
        let key = workspace
            .canonicalize()
            .unwrap_or_else(|_| workspace.to_path_buf());
        self.workspaces
            .get(&key)
            .map(|ws| ws.state())
            .unwrap_or_default()
    }

    /// The index of `workspace`, loading it from disk on first use.
    pub async fn workspace_index(&self, workspace: &Path) -> IndexResult<Arc<WorkspaceIndex>> {
        let root = workspace_key(workspace)?;
        Ok(self.workspace(&root).await?.index.clone())
    }

    async fn workspace(&self, root: &Path) -> IndexResult<Arc<Workspace>> {
        if let Some(ws) = self.workspaces.get(root) {
            return Ok(ws.value().clone());
        }

        let index = match &self.config.index_dir {
            Some(dir) => {
                let dir = dir.clone();
                let root = root.to_path_buf();
                tokio::task::spawn_blocking(move || WorkspaceIndex::open(root, &dir))
                    .await
                    .map_err(join_error)??
            }
            None => WorkspaceIndex::in_memory(root),
        };
        let state = if index.file_paths()?.is_empty() {
            WorkspaceState::Unindexed
        } else {
            WorkspaceState::Indexed
        };

        Ok(self
            .workspaces
            .entry(root.to_path_buf())
            .or_insert_with(|| Arc::new(Workspace::new(index, state)))
            .value()
            .clone())
    }

    /// Re-parses the given files and drops index entries for those that were
    /// deleted or are no longer visited. Paths may be absolute or relative to
    /// the workspace; paths outside it are ignored.
    pub async fn index_files(
        &self,
        workspace: &Path,
        paths: &[PathBuf],
        cancel: CancellationToken,
    ) -> IndexResult<IndexSummary> {
        let root = validate_workspace(workspace)?;
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        let ws = self.workspace(&root).await?;
        let _run_guard = ws.run_lock.lock().await;
        let run = ws.begin(&cancel);
        let started = Instant::now();

        let mut to_parse = Vec::new();
        let mut gone = Vec::new();
        for path in paths {
            let abs = if path.is_absolute() {
                path.clone()
            } else {
                root.join(path)
            };
            let abs = abs.canonicalize().unwrap_or(abs);
            let Some(rel) = walk::relative_path(&root, &abs) else {
                tracing::debug!("Ignoring {} outside workspace", path.display());
                continue;
            };
            if abs.is_file() && walk::is_visitable(&rel, &self.pattern, &self.registry) {
                to_parse.push(SourceFile { abs, rel });
            } else {
                gone.push(rel);
            }
        }

        let result = async {
            let mut summary = self.process_files(&ws, to_parse, &run.token).await?;
            summary.files_removed = self.remove_paths(&ws, gone).await?;
            Ok::<_, IndexError>(summary)
        }
        .await;
        ws.finish(run, result.is_ok());

        let mut summary = result?;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Updated {} in {}ms: {} indexed, {} unchanged, {} failed, {} removed",
            root.display(),
            summary.elapsed_ms,
            summary.files_indexed,
            summary.files_unchanged,
            summary.files_failed,
            summary.files_removed
        );
        Ok(summary)
    }

    async fn full_run(
        &self,
        root: &Path,
        ws: &Workspace,
        token: &CancellationToken,
    ) -> IndexResult<IndexSummary> {
        let registry = self.registry.clone();
        let pattern = self.pattern.clone();
        let walk_root = root.to_path_buf();
        let files = tokio::task::spawn_blocking(move || {
            walk::collect_files(&walk_root, &pattern, &registry)
        })
        .await
        .map_err(join_error)?;
        tracing::debug!("Found {} candidate files under {}", files.len(), root.display());

        let visited: HashSet<String> = files.iter().map(|f| f.rel.clone()).collect();
        let mut summary = self.process_files(ws, files, token).await?;

        let stale: Vec<String> = ws
            .index
            .file_paths()?
            .into_iter()
            .filter(|p| !visited.contains(p))
            .collect();
        summary.files_removed = self.remove_paths(ws, stale).await?;
        Ok(summary)
    }

    async fn process_files(
        &self,
        ws: &Workspace,
        files: Vec<SourceFile>,
        token: &CancellationToken,
    ) -> IndexResult<IndexSummary> {
        let semaphore = Arc::new(Semaphore::new(self.config.effective_concurrency()));
        let task = FileTask {
            index: ws.index.clone(),
            registry: self.registry.clone(),
            max_file_bytes: self.config.max_file_bytes,
            token: token.clone(),
        };
        let mut tasks = JoinSet::new();
        let mut summary = IndexSummary::default();
        let mut store_error: Option<IndexError> = None;

        for file in files {
            let permit = tokio::select! {
                _ = token.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|_| IndexError::Internal("indexing semaphore closed".to_string()))?,
            };
            let task = task.clone();
            tasks.spawn_blocking(move || {
                let _permit = permit;
                task.run(file)
            });

            while let Some(joined) = tasks.try_join_next() {
                tally(&mut summary, &mut store_error, joined, token);
            }
        }
        while let Some(joined) = tasks.join_next().await {
            tally(&mut summary, &mut store_error, joined, token);
        }

        if let Some(e) = store_error {
            return Err(e);
        }
        if token.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        Ok(summary)
    }

    async fn remove_paths(&self, ws: &Workspace, paths: Vec<String>) -> IndexResult<usize> {
        if paths.is_empty() {
            return Ok(0);
        }
        let index = ws.index.clone();
        let removed = tokio::task::spawn_blocking(move || -> crate::error::Result<usize> {
            let mut removed = 0;
            for path in paths {
                if index.remove(&path)? {
                    tracing::debug!("Removed {} from index", path);
                    removed += 1;
                }
            }
            Ok(removed)
        })
        .await
        .map_err(join_error)??;
        Ok(removed)
    }

    /// Parses unsaved content off the async runtime. Returns `None` when no
    /// parser handles the file.
    async fn parse_snippet(
        &self,
        rel: &str,
        snippet: Vec<u8>,
        cancel: &CancellationToken,
    ) -> IndexResult<Option<FileElement>> {
        let Some(parser) = self.registry.for_path(Path::new(rel)).cloned() else {
            return Ok(None);
        };
        let path = rel.to_string();
        let parse = tokio::task::spawn_blocking(move || {
            parser.parse(&path, &snippet).map_err(|e| e.to_string())
        });

        tokio::select! {
            _ = cancel.cancelled() => Err(IndexError::Cancelled),
            joined = parse => match joined.map_err(join_error)? {
                Ok(file) => Ok(Some(file)),
                Err(message) => Err(IndexError::ParseFailure {
                    path: PathBuf::from(rel),
                    message,
                }),
            },
        }
    }

    fn query_path(&self, root: &Path, workspace: &Path, file: &Path) -> IndexResult<String> {
        let rel = if file.is_absolute() {
            let canonical = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
            walk::relative_path(root, &canonical)
                .or_else(|| walk::relative_path(workspace, file))
        } else {
            walk::normalize_relative(file)
        };
        rel.ok_or_else(|| {
            IndexError::invalid(format!(
                "{} is not inside workspace {}",
                file.display(),
                workspace.display()
            ))
        })
    }

    fn to_caller_lines(&self, mut def: Definition) -> Definition {
        def.range[0] += self.config.line_base;
        def.range[2] += self.config.line_base;
        def
    }
}

fn tally(
    summary: &mut IndexSummary,
    store_error: &mut Option<IndexError>,
    joined: Result<FileOutcome, JoinError>,
    token: &CancellationToken,
) {
    match joined {
        Ok(FileOutcome::Indexed) => summary.files_indexed += 1,
        Ok(FileOutcome::Unchanged) => summary.files_unchanged += 1,
        Ok(FileOutcome::Failed { path, message }) => {
            tracing::warn!("Failed to parse {}: {}", path, message);
            summary.record_failure(path, message);
        }
        Ok(FileOutcome::Abandoned) => {}
        Ok(FileOutcome::StoreFailed(e)) => {
            tracing::error!("Index store failure: {}", e);
            if store_error.is_none() {
                *store_error = Some(e.into());
            }
            token.cancel();
        }
        Err(e) => {
            if store_error.is_none() {
                *store_error = Some(join_error(e));
            }
            token.cancel();
        }
    }
}

#[async_trait]
impl CodeIndexer for Indexer {
    async fn index_workspace(
        &self,
        workspace: &Path,
        cancel: CancellationToken,
    ) -> IndexResult<IndexSummary> {
        let root = validate_workspace(workspace)?;
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }
        let ws = self.workspace(&root).await?;
        let _run_guard = ws.run_lock.lock().await;
        let run = ws.begin(&cancel);
        let started = Instant::now();

        let result = self.full_run(&root, &ws, &run.token).await;
        ws.finish(run, result.is_ok());

        let mut summary = result?;
        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Indexed {} in {}ms: {} indexed, {} unchanged, {} failed, {} removed",
            root.display(),
            summary.elapsed_ms,
            summary.files_indexed,
            summary.files_unchanged,
            summary.files_failed,
            summary.files_removed
        );
        Ok(summary)
    }

    async fn remove_all_indexes(&self, workspace: &Path) -> IndexResult<()> {
        let root = workspace_key(workspace)?;
        let ws = self.workspace(&root).await?;
        ws.cancel_active();
        // Wait for the cancelled run to drain its workers before clearing.
        let _run_guard = ws.run_lock.lock().await;

        let index = ws.index.clone();
        tokio::task::spawn_blocking(move || index.remove_all())
            .await
            .map_err(join_error)??;
        ws.set_state(WorkspaceState::Unindexed);
        tracing::info!("Removed all indexes of {}", root.display());
        Ok(())
    }

    async fn query_definitions(
        &self,
        options: &QueryDefinitionOptions,
        cancel: CancellationToken,
    ) -> IndexResult<Vec<Definition>> {
        options.validate()?;
        let line_base = self.config.line_base;
        let start_line = options.start_line - line_base;
        let end_line = options.end_line - line_base;
        if start_line < 0 {
            return Err(IndexError::invalid(format!(
                "line {} is below the first line {}",
                options.start_line, line_base
            )));
        }
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }

        let root = workspace_key(&options.workspace)?;
        let rel = self.query_path(&root, &options.workspace, &options.file_path)?;
        let ws = self.workspace(&root).await?;

        let origin = match &options.code_snippet {
            Some(snippet) => match self.parse_snippet(&rel, snippet.clone(), &cancel).await? {
                Some(file) => Arc::new(file),
                None => return Ok(Vec::new()),
            },
            None => match ws.index.file(&rel)? {
                Some(file) => file,
                None => return Ok(Vec::new()),
            },
        };

        let Some(element) = query::locate(&origin, start_line, end_line) else {
            tracing::debug!("No element at {}:{}-{}", rel, start_line, end_line);
            return Ok(Vec::new());
        };
        let definitions = Resolver::new(&ws.index, &self.registry).resolve(&origin, element)?;
        Ok(definitions
            .into_iter()
            .map(|d| self.to_caller_lines(d))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_validation() {
        assert!(matches!(
            validate_workspace(Path::new("")),
            Err(IndexError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_workspace(Path::new("/definitely/not/here")),
            Err(IndexError::InvalidInput(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.py");
        std::fs::write(&file, "x = 1").unwrap();
        assert!(matches!(validate_workspace(&file), Err(IndexError::InvalidInput(_))));
        assert!(validate_workspace(dir.path()).is_ok());
    }

    #[test]
    fn test_oversized_files_are_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.py");
        std::fs::write(&file, vec![b'#'; 64]).unwrap();
        assert!(read_source(&file, 16).is_err());
        assert_eq!(read_source(&file, 64).unwrap().len(), 64);
    }
}
