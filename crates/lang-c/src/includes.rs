use crate::queries::c_includes::IncludeIndices;
use codegraph_api::Scope;
use codegraph_plugin::utils::{node_range, node_text};
use codegraph_plugin::{FileElement, Import};
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

/// Records one [`Import`] per `#include` matched by `query`.
///
/// Every include re-exports: a header's own includes are visible to whoever
/// includes it. The query must come from `C_INCLUDES_SCM`, compiled for any
/// grammar sharing the C preprocessor nodes.
pub fn collect(
    query: &Query,
    indices: &IncludeIndices,
    tree: &Tree,
    source: &[u8],
    file: &mut FileElement,
) {
    let path = file.path.clone();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);
    while let Some(mat) = matches.next() {
        let capture = |index: u32| {
            mat.captures
                .iter()
                .find(|c| c.index == index)
                .map(|c| c.node)
        };
        let Some(target) = capture(indices.path) else {
            continue;
        };
        let raw = node_text(target, source);
        let name = raw.trim_matches(|c| c == '"' || c == '<' || c == '>');
        if name.is_empty() {
            continue;
        }
        let in_function = capture(indices.directive).is_some_and(has_function_ancestor);
        let scope = if in_function {
            Scope::Function
        } else {
            Scope::File
        };
        let import = Import::new(name, raw, path.as_str(), node_range(target))
            .reexported(true)
            .with_scope(scope);
        file.push_import(import);
    }
}

fn has_function_ancestor(node: Node) -> bool {
    let mut current = node.parent();
    while let Some(n) = current {
        if n.kind() == "function_definition" {
            return true;
        }
        current = n.parent();
    }
    false
}
