use crate::error::{PluginError, Result};
use tree_sitter::{Language, Node, Parser, Query, Tree};

/// Converts a tree-sitter range to `[start_line, start_col, end_line, end_col]`.
pub fn range_from_ts(range: tree_sitter::Range) -> [i32; 4] {
    [
        range.start_point.row as i32,
        range.start_point.column as i32,
        range.end_point.row as i32,
        range.end_point.column as i32,
    ]
}

pub fn node_range(node: Node) -> [i32; 4] {
    range_from_ts(node.range())
}

/// Text of `node`; empty when the slice is not valid UTF-8.
pub fn node_text<'a>(node: Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Loads a Tree-sitter query from an SCM string.
pub fn load_query(language: &Language, scm: &str) -> Result<Query> {
    Query::new(language, scm).map_err(|e| PluginError::Query(format!("{:?}", e)))
}

/// Gets the index of a capture name in a query.
pub fn get_capture_index(query: &Query, name: &str) -> Result<u32> {
    query
        .capture_index_for_name(name)
        .ok_or_else(|| PluginError::Capture(name.to_string()))
}

/// Parses `source` with a fresh parser for `language`.
pub fn parse_tree(language: &Language, source: &[u8]) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| PluginError::Grammar(e.to_string()))?;
    parser
        .parse(source, None)
        .ok_or_else(|| PluginError::Grammar("parser returned no tree".to_string()))
}

/// Named children of `node`, collected so callers can recurse freely.
pub fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Macro to define a struct for capture indices and a `new` method to initialize it from a query.
#[macro_export]
macro_rules! decl_indices {
    ($name:ident, { $($field:ident => $capture:expr),+ $(,)? }) => {
        #[derive(Clone)]
        pub struct $name {
            $(pub $field: u32,)+
        }

        impl $name {
            pub fn new(query: &tree_sitter::Query) -> $crate::error::Result<Self> {
                Ok(Self {
                    $($field: $crate::utils::get_capture_index(query, $capture)?,)+
                })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_and_capture_helpers() {
        let language: Language = tree_sitter_python::LANGUAGE.into();
        let source = b"def foo():\n    pass\n";
        let tree = parse_tree(&language, source).unwrap();
        let func = named_children(tree.root_node())[0];
        assert_eq!(node_range(func), [0, 0, 1, 8]);

        let name = func.child_by_field_name("name").unwrap();
        assert_eq!(node_text(name, source), "foo");

        let query = load_query(&language, "(function_definition name: (identifier) @name)").unwrap();
        assert_eq!(get_capture_index(&query, "name").unwrap(), 0);
        assert!(matches!(get_capture_index(&query, "missing"), Err(PluginError::Capture(_))));
        assert!(load_query(&language, "(not_a_node)").is_err());
    }
}
