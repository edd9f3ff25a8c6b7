use crate::element::{CodeElement, FileElement, Import, is_valid_element};
use codegraph_api::Language;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Per-language adapter turning file content into a [`FileElement`].
///
/// Implementations must be deterministic: the same bytes always produce the
/// same elements, ranges and order.
pub trait LanguageParser: Send + Sync {
    fn language(&self) -> Language;

    /// Extensions handled by this parser, without the leading dot.
    fn extensions(&self) -> &[&'static str];

    /// `path` is workspace-relative with `/` separators.
    fn parse(&self, path: &str, content: &[u8]) -> Result<FileElement, BoxError>;

    fn is_valid(&self, element: &dyn CodeElement) -> bool {
        is_valid_element(element)
    }

    /// Whether `import`, declared in `importer`, refers to the file `candidate`.
    fn import_matches(&self, import: &Import, importer: &str, candidate: &str) -> bool {
        default_import_matches(import, importer, candidate)
    }
}

/// Treats the import source as a path, stripping include delimiters.
pub fn default_import_matches(import: &Import, importer: &str, candidate: &str) -> bool {
    let source = import
        .source
        .trim_matches(|c| c == '"' || c == '<' || c == '>');
    path_matches(source, importer, candidate)
}

/// Matches a slash-separated import path against a candidate file, first
/// relative to the importer's directory, then by trailing path components.
pub fn path_matches(source: &str, importer: &str, candidate: &str) -> bool {
    if source.is_empty() {
        return false;
    }
    if let Some(joined) = join_relative(parent_dir(importer), source) {
        if joined == candidate {
            return true;
        }
    }
    ends_with_components(candidate, source.trim_start_matches("./"))
}

pub fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Joins `rel` onto `dir`, folding `.` and `..` segments. `None` when the
/// result would climb above the workspace root.
pub fn join_relative(dir: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for seg in rel.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            s => parts.push(s),
        }
    }
    Some(parts.join("/"))
}

/// `a/b/c.h` ends with `b/c.h` and `c.h`, but not with `/c.h` or `bc.h`.
pub fn ends_with_components(candidate: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    candidate == suffix
        || (candidate.ends_with(suffix)
            && candidate.as_bytes()[candidate.len() - suffix.len() - 1] == b'/')
}
