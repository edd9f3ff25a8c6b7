use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Directory names skipped unless a caller overrides the pattern.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    ".svn",
    ".hg",
    ".idea",
    ".vscode",
    "node_modules",
    "vendor",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".venv",
    "venv",
];

/// Which files inside a workspace are visited.
///
/// `include_exts` entries may be written with or without the leading dot.
/// An empty list means "every extension a registered parser handles".
/// `exclude_dirs` entries are plain directory names or `*` wildcard
/// patterns matched against a single directory name. A missing field takes
/// its default, so omitting `exclude_dirs` keeps [`DEFAULT_EXCLUDE_DIRS`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(default)]
pub struct VisitPattern {
    pub include_exts: Vec<String>,
    pub exclude_dirs: Vec<String>,
}

impl Default for VisitPattern {
    fn default() -> Self {
        Self {
            include_exts: Vec::new(),
            exclude_dirs: DEFAULT_EXCLUDE_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl VisitPattern {
    pub fn new<I, E, S, T>(include_exts: I, exclude_dirs: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            include_exts: include_exts.into_iter().map(Into::into).collect(),
            exclude_dirs: exclude_dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Compiles the pattern for repeated matching during a walk.
    pub fn compile(&self) -> CompiledVisitPattern {
        let include_exts = self
            .include_exts
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let mut exclude_names = Vec::new();
        let mut exclude_globs = Vec::new();
        for entry in &self.exclude_dirs {
            let entry = entry.trim_matches('/');
            if entry.is_empty() {
                continue;
            }
            if entry.contains('*') || entry.contains('?') {
                if let Some(re) = wildcard_to_regex(entry) {
                    exclude_globs.push(re);
                }
            } else {
                exclude_names.push(entry.to_string());
            }
        }

        CompiledVisitPattern {
            include_exts,
            exclude_names,
            exclude_globs,
        }
    }
}

fn wildcard_to_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() + 4);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re).ok()
}

/// Matcher form of a [`VisitPattern`].
#[derive(Debug, Clone)]
pub struct CompiledVisitPattern {
    include_exts: Vec<String>,
    exclude_names: Vec<String>,
    exclude_globs: Vec<Regex>,
}

impl CompiledVisitPattern {
    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_names.iter().any(|n| n == name)
            || self.exclude_globs.iter().any(|re| re.is_match(name))
    }

    /// Whether any directory component of `relative` is excluded.
    pub fn is_excluded_path(&self, relative: &Path) -> bool {
        relative
            .parent()
            .into_iter()
            .flat_map(|p| p.components())
            .filter_map(|c| c.as_os_str().to_str())
            .any(|name| self.is_excluded_dir(name))
    }

    pub fn includes_file(&self, path: &Path) -> bool {
        if self.include_exts.is_empty() {
            return true;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                let ext = ext.to_ascii_lowercase();
                self.include_exts.iter().any(|e| *e == ext)
            }
            None => false,
        }
    }
}
