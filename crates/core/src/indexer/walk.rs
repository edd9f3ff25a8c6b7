use crate::registry::ParserRegistry;
use codegraph_api::CompiledVisitPattern;
use ignore::WalkBuilder;
use std::path::{Component, Path, PathBuf};

/// A file picked for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceFile {
    pub abs: PathBuf,
    /// Workspace-relative, `/` separated.
    pub rel: String,
}

/// Walks `root` honoring `.gitignore` and the visit pattern. Only files some
/// registered parser handles are returned, sorted by relative path.
pub(crate) fn collect_files(
    root: &Path,
    pattern: &CompiledVisitPattern,
    registry: &ParserRegistry,
) -> Vec<SourceFile> {
    let dir_filter = pattern.clone();
    let mut files: Vec<SourceFile> = WalkBuilder::new(root)
        .filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            if !is_dir || entry.depth() == 0 {
                return true;
            }
            !entry
                .file_name()
                .to_str()
                .is_some_and(|name| dir_filter.is_excluded_dir(name))
        })
        .build()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            if !entry.file_type()?.is_file() {
                return None;
            }
            let path = entry.path();
            if !registry.handles(path) || !pattern.includes_file(path) {
                return None;
            }
            let rel = relative_path(root, path)?;
            Some(SourceFile {
                abs: path.to_path_buf(),
                rel,
            })
        })
        .collect();
    files.sort_by(|a, b| a.rel.cmp(&b.rel));
    files
}

/// Whether a workspace-relative path would be visited by a full walk.
pub(crate) fn is_visitable(
    rel: &str,
    pattern: &CompiledVisitPattern,
    registry: &ParserRegistry,
) -> bool {
    let path = Path::new(rel);
    registry.handles(path) && pattern.includes_file(path) && !pattern.is_excluded_path(path)
}

/// `path` relative to `root` with `/` separators.
pub(crate) fn relative_path(root: &Path, path: &Path) -> Option<String> {
    normalize_relative(path.strip_prefix(root).ok()?)
}

/// Joins normal components with `/`. Rejects `..`, roots and non UTF-8 names.
pub(crate) fn normalize_relative(path: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str()?),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
