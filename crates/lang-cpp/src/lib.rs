mod extract;

use codegraph_api::Language;
use codegraph_c::includes;
use codegraph_c::queries::c_includes::{C_INCLUDES_SCM, IncludeIndices};
use codegraph_plugin::utils::{load_query, parse_tree};
use codegraph_plugin::{BoxError, FileElement, LanguageParser};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tree_sitter::Query;

static GRAMMAR: Lazy<tree_sitter::Language> = Lazy::new(|| tree_sitter_cpp::LANGUAGE.into());

/// Tree-sitter backed parser for C++ sources and headers.
///
/// Plain `.h` headers belong to the C parser; C++ code reaches them through
/// `#include` like any other file.
#[derive(Clone)]
pub struct CppParser {
    include_query: Arc<Query>,
    include_indices: IncludeIndices,
}

impl CppParser {
    pub fn new() -> Result<Self, BoxError> {
        let include_query = load_query(&GRAMMAR, C_INCLUDES_SCM)?;
        let include_indices = IncludeIndices::new(&include_query)?;
        Ok(Self {
            include_query: Arc::new(include_query),
            include_indices,
        })
    }
}

impl LanguageParser for CppParser {
    fn language(&self) -> Language {
        Language::CPP
    }

    fn extensions(&self) -> &[&'static str] {
        &["cpp", "cc", "cxx", "hpp", "hh", "hxx"]
    }

    fn parse(&self, path: &str, content: &[u8]) -> Result<FileElement, BoxError> {
        std::str::from_utf8(content)?;
        let tree = parse_tree(&GRAMMAR, content)?;

        let mut file = FileElement::new(path, Language::CPP, content);
        extract::Extractor::new(content, &mut file).run(tree.root_node());
        includes::collect(
            &self.include_query,
            &self.include_indices,
            &tree,
            content,
            &mut file,
        );
        Ok(file)
    }
}
