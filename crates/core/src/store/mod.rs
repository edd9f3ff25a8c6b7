//! Per-workspace element store.
//!
//! Readers share a snapshot of `path -> FileElement` plus a name index.
//! Writers serialize per path, do their disk IO outside the shared lock and
//! commit with a short exclusive section, so a reader sees either the old or
//! the new version of a file, never a mix.

mod storage;

pub use storage::{FORMAT_VERSION, IndexStorage};

use crate::error::{CoreError, Result};
use codegraph_api::Scope;
use codegraph_plugin::{Element, FileElement};
use dashmap::DashMap;
use smol_str::SmolStr;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

#[derive(Default)]
struct IndexState {
    files: HashMap<String, Arc<FileElement>>,
    /// Definition name -> paths of files defining it.
    by_name: HashMap<SmolStr, BTreeSet<String>>,
}

impl IndexState {
    fn insert(&mut self, file: Arc<FileElement>) {
        self.evict(&file.path);
        for def in file.definitions() {
            self.by_name
                .entry(SmolStr::new(&def.name))
                .or_default()
                .insert(file.path.clone());
        }
        self.files.insert(file.path.clone(), file);
    }

    fn evict(&mut self, path: &str) -> bool {
        let Some(old) = self.files.remove(path) else {
            return false;
        };
        for def in old.definitions() {
            if let Some(paths) = self.by_name.get_mut(def.name.as_str()) {
                paths.remove(path);
                if paths.is_empty() {
                    self.by_name.remove(def.name.as_str());
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IndexStats {
    pub files: usize,
    pub definitions: usize,
    pub references: usize,
    pub imports: usize,
}

pub struct WorkspaceIndex {
    root: PathBuf,
    storage: Option<IndexStorage>,
    state: RwLock<IndexState>,
    path_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl WorkspaceIndex {
    /// Index kept in memory only.
    pub fn in_memory(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            storage: None,
            state: RwLock::new(IndexState::default()),
            path_locks: DashMap::new(),
        }
    }

    /// Opens the persisted index of `root` under `index_dir`, loading every
    /// stored record.
    pub fn open(root: impl Into<PathBuf>, index_dir: &Path) -> Result<Self> {
        let root = root.into();
        let storage = IndexStorage::new(index_dir, &root);
        let mut state = IndexState::default();
        for file in storage.load_all()? {
            state.insert(Arc::new(file));
        }
        Ok(Self {
            root,
            storage: Some(storage),
            state: RwLock::new(state),
            path_locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn storage(&self) -> Option<&IndexStorage> {
        self.storage.as_ref()
    }

    fn path_lock(&self, path: &str) -> Arc<Mutex<()>> {
        self.path_locks
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, IndexState>> {
        self.state
            .read()
            .map_err(|_| CoreError::Internal("index state lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, IndexState>> {
        self.state
            .write()
            .map_err(|_| CoreError::Internal("index state lock poisoned".to_string()))
    }

    /// Replaces whatever was stored for `file.path`.
    pub fn upsert(&self, mut file: FileElement) -> Result<()> {
        file.dedup();
        let lock = self.path_lock(&file.path);
        let _guard = lock
            .lock()
            .map_err(|_| CoreError::Internal("path lock poisoned".to_string()))?;

        if let Some(storage) = &self.storage {
            storage.write(&file)?;
        }

        // Write lock held for microseconds
        self.write_state()?.insert(Arc::new(file));
        Ok(())
    }

    /// Drops a file's contribution. Returns whether anything was stored.
    pub fn remove(&self, path: &str) -> Result<bool> {
        let lock = self.path_lock(path);
        let _guard = lock
            .lock()
            .map_err(|_| CoreError::Internal("path lock poisoned".to_string()))?;

        if let Some(storage) = &self.storage {
            storage.delete(path)?;
        }
        Ok(self.write_state()?.evict(path))
    }

    /// Clears every file. Callers must not run this alongside `upsert`;
    /// the indexer holds its run lock around it.
    pub fn remove_all(&self) -> Result<()> {
        let mut state = self.write_state()?;
        if let Some(storage) = &self.storage {
            storage.clear()?;
        }
        *state = IndexState::default();
        Ok(())
    }

    /// Definition-kind elements named `name`, optionally restricted to one
    /// scope, ordered by path then source order.
    pub fn lookup(&self, name: &str, scope: Option<Scope>) -> Result<Vec<Element>> {
        let state = self.read_state()?;
        let Some(paths) = state.by_name.get(name) else {
            return Ok(Vec::new());
        };
        Ok(paths
            .iter()
            .filter_map(|p| state.files.get(p))
            .flat_map(|f| f.definitions())
            .filter(|e| e.name == name)
            .filter(|e| scope.is_none_or(|s| e.scope == s))
            .cloned()
            .collect())
    }

    pub fn file(&self, path: &str) -> Result<Option<Arc<FileElement>>> {
        Ok(self.read_state()?.files.get(path).cloned())
    }

    pub fn file_paths(&self) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self.read_state()?.files.keys().cloned().collect();
        paths.sort();
        Ok(paths)
    }

    pub fn content_hash(&self, path: &str) -> Result<Option<u64>> {
        Ok(self.read_state()?.files.get(path).map(|f| f.content_hash))
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let state = self.read_state()?;
        let mut stats = IndexStats {
            files: state.files.len(),
            ..Default::default()
        };
        for file in state.files.values() {
            stats.definitions += file.definitions().count();
            stats.references += file.references().count();
            stats.imports += file.imports.len();
        }
        Ok(stats)
    }
}

impl std::fmt::Debug for WorkspaceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkspaceIndex")
            .field("root", &self.root)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}
