mod extract;
mod imports;
pub mod queries;

use codegraph_api::Language;
use codegraph_plugin::utils::{load_query, parse_tree};
use codegraph_plugin::{BoxError, FileElement, Import, LanguageParser};
use once_cell::sync::Lazy;
use queries::python_imports::{ImportIndices, PYTHON_IMPORTS_SCM};
use std::sync::Arc;
use tree_sitter::Query;

static GRAMMAR: Lazy<tree_sitter::Language> = Lazy::new(|| tree_sitter_python::LANGUAGE.into());

/// Tree-sitter backed parser for `.py` files.
#[derive(Clone)]
pub struct PythonParser {
    import_query: Arc<Query>,
    import_indices: ImportIndices,
}

impl PythonParser {
    pub fn new() -> Result<Self, BoxError> {
        let import_query = load_query(&GRAMMAR, PYTHON_IMPORTS_SCM)?;
        let import_indices = ImportIndices::new(&import_query)?;
        Ok(Self {
            import_query: Arc::new(import_query),
            import_indices,
        })
    }
}

impl LanguageParser for PythonParser {
    fn language(&self) -> Language {
        Language::PYTHON
    }

    fn extensions(&self) -> &[&'static str] {
        &["py"]
    }

    fn parse(&self, path: &str, content: &[u8]) -> Result<FileElement, BoxError> {
        std::str::from_utf8(content)?;
        let tree = parse_tree(&GRAMMAR, content)?;

        let mut file = FileElement::new(path, Language::PYTHON, content);
        extract::Extractor::new(content, &mut file).run(tree.root_node());
        imports::collect(
            &self.import_query,
            &self.import_indices,
            &tree,
            content,
            &mut file,
        );
        Ok(file)
    }

    fn import_matches(&self, import: &Import, importer: &str, candidate: &str) -> bool {
        imports::module_matches(import, importer, candidate)
    }
}
