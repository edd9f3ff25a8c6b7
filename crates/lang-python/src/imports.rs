use crate::queries::python_imports::ImportIndices;
use codegraph_api::Scope;
use codegraph_plugin::parser::{ends_with_components, parent_dir};
use codegraph_plugin::utils::{node_range, node_text};
use codegraph_plugin::{FileElement, Import};
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

/// Runs the import query over `tree` and records one [`Import`] per
/// imported name. `from m import *` re-exports everything `m` defines.
pub(crate) fn collect(
    query: &Query,
    indices: &ImportIndices,
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
        let text = |index: u32| capture(index).map(|n| node_text(n, source).to_string());

        let Some(statement) = capture(indices.statement) else {
            continue;
        };
        let range = node_range(statement);

        let import = if let Some(module) = text(indices.module) {
            Import::new(module.clone(), module, path.as_str(), range)
                .with_alias(text(indices.module_alias))
        } else if let Some(from) = text(indices.from_module) {
            if capture(indices.wildcard).is_some() {
                Import::new("*", from, path.as_str(), range).reexported(true)
            } else if let Some(name) = text(indices.from_name) {
                Import::new(name, from, path.as_str(), range).with_alias(text(indices.from_alias))
            } else {
                continue;
            }
        } else {
            continue;
        };
        file.push_import(import.with_scope(scope_of(statement)));
    }
}

fn scope_of(node: Node) -> Scope {
    let mut current = node.parent();
    while let Some(n) = current {
        match n.kind() {
            "function_definition" => return Scope::Function,
            "class_definition" => return Scope::Class,
            _ => current = n.parent(),
        }
    }
    Scope::File
}

/// Whether a Python import names the module file `candidate`.
///
/// `a.b` matches `a/b.py` or the package `a/b/__init__.py`, anchored at any
/// directory so `src/` layouts work. Relative imports (`.m`, `..`) resolve
/// against the importer's package. `from pkg import mod` also matches the
/// submodule `pkg/mod.py`.
pub(crate) fn module_matches(import: &Import, importer: &str, candidate: &str) -> bool {
    let Some(stem) = candidate.strip_suffix(".py") else {
        return false;
    };
    let dots = import.source.chars().take_while(|c| *c == '.').count();
    let module = import.source[dots..].replace('.', "/");

    let mut modules = vec![module.clone()];
    if !import.is_wildcard() && import.name != import.source {
        modules.push(join(&module, &import.name.replace('.', "/")));
    }

    if dots == 0 {
        return modules.iter().any(|m| {
            ends_with_components(stem, m) || ends_with_components(stem, &join(m, "__init__"))
        });
    }

    let mut package = parent_dir(importer);
    for _ in 1..dots {
        if package.is_empty() {
            return false;
        }
        package = parent_dir(package);
    }
    modules.iter().any(|m| {
        let full = join(package, m);
        // `from . import x` names the package itself, never a sibling module.
        (!m.is_empty() && stem == full) || stem == join(&full, "__init__")
    })
}

fn join(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base, rest),
    }
}
