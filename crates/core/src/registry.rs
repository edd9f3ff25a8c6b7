use codegraph_api::Language;
use codegraph_plugin::LanguageParser;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Maps file extensions to the parser that handles them.
#[derive(Clone, Default)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn LanguageParser>>,
    by_ext: HashMap<String, usize>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations win when two parsers claim the same extension.
    pub fn register(&mut self, parser: Arc<dyn LanguageParser>) {
        let idx = self.parsers.len();
        for ext in parser.extensions() {
            self.by_ext.insert(ext.to_ascii_lowercase(), idx);
        }
        self.parsers.push(parser);
    }

    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn LanguageParser>> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.by_ext.get(&ext).map(|&i| &self.parsers[i])
    }

    pub fn for_language(&self, language: &Language) -> Option<&Arc<dyn LanguageParser>> {
        self.parsers.iter().find(|p| &p.language() == language)
    }

    pub fn handles(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }

    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.by_ext.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_plugin::{BoxError, FileElement};

    struct Stub(&'static str, &'static [&'static str]);

    impl LanguageParser for Stub {
        fn language(&self) -> Language {
            Language::new(self.0)
        }

        fn extensions(&self) -> &[&'static str] {
            self.1
        }

        fn parse(&self, path: &str, content: &[u8]) -> Result<FileElement, BoxError> {
            Ok(FileElement::new(path, self.language(), content))
        }
    }

    #[test]
    fn test_lookup_by_extension_is_case_insensitive() {
        let mut registry = ParserRegistry::new();
        registry.register(Arc::new(Stub("c", &["c", "h"])));
        registry.register(Arc::new(Stub("python", &["py"])));

        let parser = registry.for_path(Path::new("src/Main.C")).unwrap();
        assert_eq!(parser.language(), Language::C);
        assert!(registry.handles(Path::new("a.py")));
        assert!(!registry.handles(Path::new("README")));
        assert_eq!(registry.extensions(), vec!["c", "h", "py"]);
        assert!(registry.for_language(&Language::PYTHON).is_some());
    }
}
