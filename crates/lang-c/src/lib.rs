mod extract;
pub mod includes;
pub mod queries;

use codegraph_api::Language;
use codegraph_plugin::utils::{load_query, parse_tree};
use codegraph_plugin::{BoxError, FileElement, LanguageParser};
use once_cell::sync::Lazy;
use queries::c_includes::{C_INCLUDES_SCM, IncludeIndices};
use std::sync::Arc;
use tree_sitter::Query;

static GRAMMAR: Lazy<tree_sitter::Language> = Lazy::new(|| tree_sitter_c::LANGUAGE.into());

/// Tree-sitter backed parser for C sources and headers.
#[derive(Clone)]
pub struct CParser {
    include_query: Arc<Query>,
    include_indices: IncludeIndices,
}

impl CParser {
    pub fn new() -> Result<Self, BoxError> {
        let include_query = load_query(&GRAMMAR, C_INCLUDES_SCM)?;
        let include_indices = IncludeIndices::new(&include_query)?;
        Ok(Self {
            include_query: Arc::new(include_query),
            include_indices,
        })
    }
}

impl LanguageParser for CParser {
    fn language(&self) -> Language {
        Language::C
    }

    fn extensions(&self) -> &[&'static str] {
        &["c", "h"]
    }

    fn parse(&self, path: &str, content: &[u8]) -> Result<FileElement, BoxError> {
        std::str::from_utf8(content)?;
        let tree = parse_tree(&GRAMMAR, content)?;

        let mut file = FileElement::new(path, Language::C, content);
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

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_api::{ElementType, Scope};
    use codegraph_plugin::Element;

    const SAMPLE: &str = r#"#include <stdio.h>
#include "util.h"

#define MAX 16
#define SQUARE(x) ((x) * (x))

typedef struct point {
    int x;
    int y;
} point_t;

enum color { RED, GREEN = 2 };

union value { int i; float f; };

static int counter = 0;

int add(int a, int b);

struct ops {
    int (*open)(const char *path);
};

int add(int a, int b) {
    int sum = a + b;
    for (int i = 0; i < MAX; i++) {
        int tmp = SQUARE(i);
        sum += tmp;
    }
    return sum;
}

void run(struct ops *o, point_t p) {
    o->open("x");
    printf("%d\n", add(p.x, counter));
}
"#;

    fn parse(source: &str) -> FileElement {
        CParser::new()
            .unwrap()
            .parse("src/sample.c", source.as_bytes())
            .unwrap()
    }

    fn all<'a>(file: &'a FileElement, kind: ElementType, name: &str) -> Vec<&'a Element> {
        file.elements
            .iter()
            .filter(|e| e.element_type == kind && e.name == name)
            .collect()
    }

    fn find<'a>(file: &'a FileElement, kind: ElementType, name: &str) -> &'a Element {
        all(file, kind, name)
            .into_iter()
            .next()
            .unwrap_or_else(|| panic!("no {} {}", kind, name))
    }

    #[test]
    fn test_type_and_macro_definitions() {
        let file = parse(SAMPLE);

        assert_eq!(find(&file, ElementType::Macro, "MAX").range[0], 3);
        assert_eq!(find(&file, ElementType::Macro, "SQUARE").range[0], 4);

        let point = find(&file, ElementType::Struct, "point");
        assert_eq!((point.range[0], point.range[2]), (6, 9));
        let x = find(&file, ElementType::Field, "x");
        assert_eq!(x.scope, Scope::Class);
        assert_eq!(x.enclosing, point.span());
        assert_eq!(find(&file, ElementType::Typedef, "point_t").range[0], 9);

        assert_eq!(find(&file, ElementType::Enum, "color").range[0], 11);
        assert_eq!(find(&file, ElementType::EnumConstant, "RED").scope, Scope::File);
        find(&file, ElementType::EnumConstant, "GREEN");

        assert_eq!(find(&file, ElementType::Union, "value").range[0], 13);
        find(&file, ElementType::Field, "f");
        assert_eq!(find(&file, ElementType::Field, "open").range[0], 20);
    }

    #[test]
    fn test_functions_variables_and_scopes() {
        let file = parse(SAMPLE);

        let adds = all(&file, ElementType::Function, "add");
        assert_eq!(adds.len(), 2);
        assert_eq!((adds[0].range[0], adds[1].range[0]), (17, 23));

        assert_eq!(find(&file, ElementType::Variable, "counter").scope, Scope::File);
        // Prototype parameters are not definitions.
        let a = all(&file, ElementType::Parameter, "a");
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].enclosing.map(|r| r[0]), Some(23));

        assert_eq!(find(&file, ElementType::Variable, "sum").scope, Scope::Function);
        let i = find(&file, ElementType::Variable, "i");
        assert_eq!(i.scope, Scope::Block);
        assert_eq!(i.enclosing.map(|r| r[0]), Some(25));
        assert_eq!(find(&file, ElementType::Variable, "tmp").scope, Scope::Block);
        assert_eq!(find(&file, ElementType::Parameter, "o").scope, Scope::Function);
    }

    #[test]
    fn test_calls_and_references() {
        let file = parse(SAMPLE);

        assert_eq!(find(&file, ElementType::CallFunction, "SQUARE").range[0], 26);
        let open = find(&file, ElementType::CallMethod, "open");
        assert_eq!((open.range[0], open.receiver.as_deref()), (33, Some("o")));
        assert_eq!(find(&file, ElementType::CallFunction, "printf").range[0], 34);
        assert_eq!(find(&file, ElementType::CallFunction, "add").range[0], 34);

        let field = find(&file, ElementType::Reference, "x");
        assert_eq!((field.range[0], field.receiver.as_deref()), (34, Some("p")));
        assert_eq!(find(&file, ElementType::Reference, "counter").range[0], 34);
        assert_eq!(find(&file, ElementType::Reference, "point_t").range[0], 32);
        assert_eq!(find(&file, ElementType::Reference, "ops").range[0], 32);
    }

    #[test]
    fn test_includes_are_reexported_imports() {
        let file = parse(SAMPLE);
        assert_eq!(file.imports.len(), 2);
        assert_eq!(file.imports[0].name, "stdio.h");
        assert_eq!(file.imports[0].source, "<stdio.h>");
        assert_eq!(file.imports[1].name, "util.h");
        assert_eq!(file.imports[1].source, "\"util.h\"");
        assert!(file.imports.iter().all(|i| i.reexport && i.scope == Scope::File));
        assert_eq!(file.imports[1].range[0], 1);
    }

    #[test]
    fn test_include_matching_uses_default_rules() {
        let parser = CParser::new().unwrap();
        let file = parse(SAMPLE);
        let util = &file.imports[1];
        assert!(parser.import_matches(util, "src/sample.c", "src/util.h"));
        assert!(parser.import_matches(util, "src/sample.c", "include/util.h"));
        assert!(!parser.import_matches(util, "src/sample.c", "src/other.h"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse(SAMPLE), parse(SAMPLE));
    }
}
