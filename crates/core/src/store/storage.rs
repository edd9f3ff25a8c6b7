use crate::error::{CoreError, Result};
use codegraph_plugin::FileElement;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

pub const FORMAT_VERSION: u32 = 1;

const META_FILE: &str = "meta.json";
const FILES_DIR: &str = "files";
const RECORD_EXT: &str = "bin";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
struct Meta {
    version: u32,
    root: String,
}

/// On-disk layout of one workspace index:
/// `<index_dir>/<xxh3(root)>/meta.json` and one compressed record per file
/// under `files/<xxh3(path)>.bin`.
#[derive(Debug, Clone)]
pub struct IndexStorage {
    dir: PathBuf,
    root: PathBuf,
}

impl IndexStorage {
    pub fn new(index_dir: &Path, root: &Path) -> Self {
        let hash = xxh3_64(root.to_string_lossy().as_bytes());
        Self {
            dir: index_dir.join(format!("{:016x}", hash)),
            root: root.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn files_dir(&self) -> PathBuf {
        self.dir.join(FILES_DIR)
    }

    fn record_path(&self, path: &str) -> PathBuf {
        self.files_dir()
            .join(format!("{:016x}.{}", xxh3_64(path.as_bytes()), RECORD_EXT))
    }

    /// Reads every stored record. Stale or corrupt data is discarded with a
    /// warning and never fails the load.
    pub fn load_all(&self) -> Result<Vec<FileElement>> {
        self.prepare()?;

        let files_dir = self.files_dir();
        if !files_dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&files_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                // Leftover temp file from an interrupted write.
                let _ = std::fs::remove_file(&path);
                continue;
            }
            match std::fs::read(&path).map_err(CoreError::from).and_then(|b| decode(&b)) {
                Ok(file) => files.push(file),
                Err(e) => {
                    tracing::warn!(
                        "Failed to read index record {}: {}. Will rebuild.",
                        path.display(),
                        e
                    );
                    let _ = std::fs::remove_file(&path);
                }
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::info!(
            "Loaded {} index records from {}",
            files.len(),
            self.dir.display()
        );
        Ok(files)
    }

    /// Ensures the directory exists with current metadata, wiping records
    /// written by another format version.
    fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let meta_path = self.dir.join(META_FILE);

        if meta_path.exists() {
            let found = std::fs::read_to_string(&meta_path)
                .ok()
                .and_then(|s| serde_json::from_str::<Meta>(&s).ok());
            match found {
                Some(meta) if meta.version == FORMAT_VERSION => return Ok(()),
                Some(meta) => tracing::warn!(
                    "Index version mismatch at {} (found {}, expected {}). Will rebuild.",
                    self.dir.display(),
                    meta.version,
                    FORMAT_VERSION
                ),
                None => tracing::warn!(
                    "Unreadable index metadata at {}. Will rebuild.",
                    meta_path.display()
                ),
            }
            let files_dir = self.files_dir();
            if files_dir.exists() {
                std::fs::remove_dir_all(&files_dir)?;
            }
        }

        let meta = Meta {
            version: FORMAT_VERSION,
            root: self.root.to_string_lossy().to_string(),
        };
        write_atomic(&meta_path, serde_json::to_string_pretty(&meta)?.as_bytes())
    }

    pub fn write(&self, file: &FileElement) -> Result<()> {
        std::fs::create_dir_all(self.files_dir())?;
        let bytes = encode(file)?;
        write_atomic(&self.record_path(&file.path), &bytes)
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        match std::fs::remove_file(self.record_path(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every record, keeping the metadata.
    pub fn clear(&self) -> Result<()> {
        let files_dir = self.files_dir();
        if files_dir.exists() {
            std::fs::remove_dir_all(&files_dir)?;
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    std::fs::write(&temp_path, bytes)?;
    std::fs::rename(temp_path, path)?;
    Ok(())
}

pub fn encode(file: &FileElement) -> Result<Vec<u8>> {
    let bytes = rmp_serde::to_vec_named(file)?;
    zstd::encode_all(&bytes[..], 0)
        .map_err(|e| CoreError::Internal(format!("Zstd compression failed: {}", e)))
}

pub fn decode(bytes: &[u8]) -> Result<FileElement> {
    let decompressed = zstd::decode_all(bytes)?;
    Ok(rmp_serde::from_slice(&decompressed)?)
}
