//! Maps a reference to the definitions it may denote.
//!
//! Resolution is syntactic: candidates are definitions with the same name,
//! filtered by visibility and kind, then ranked by where they live relative
//! to the reference. Lower tiers are kept behind better ones. Nothing is
//! cached between calls.

use crate::registry::ParserRegistry;
use crate::store::WorkspaceIndex;
use codegraph_api::{Definition, IndexError, IndexResult, Language};
use codegraph_plugin::{
    Element, FileElement, Import, default_import_matches, is_valid_element, span_contains,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// How far re-exporting imports are followed.
pub const MAX_IMPORT_DEPTH: usize = 8;

/// Ranking tier of a candidate, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// Same file, declared inside the function enclosing the reference.
    Local,
    SameFile,
    /// Another file reachable through the reference file's imports.
    Imported,
    /// Another file with a matching name and no import path to it.
    Heuristic,
}

pub struct Resolver<'a> {
    index: &'a WorkspaceIndex,
    registry: &'a ParserRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(index: &'a WorkspaceIndex, registry: &'a ParserRegistry) -> Self {
        Self { index, registry }
    }

    /// Every surviving candidate, best tier first, then by path, line and
    /// column. A definition local to the function enclosing the reference
    /// shadows all outer ones.
    ///
    /// `origin` is the file holding `reference`. Its definitions take the
    /// place of whatever the index stores for the same path.
    pub fn resolve(&self, origin: &FileElement, reference: &Element) -> IndexResult<Vec<Definition>> {
        let ranked = self.resolve_ranked(origin, reference)?;
        let shadowed = ranked.first().is_some_and(|(_, c)| *c == Confidence::Local);
        Ok(ranked
            .into_iter()
            .filter(|(_, c)| !shadowed || *c == Confidence::Local)
            .map(|(d, _)| d)
            .collect())
    }

    /// Every visible candidate with its tier, best tier first.
    pub fn resolve_ranked(
        &self,
        origin: &FileElement,
        reference: &Element,
    ) -> IndexResult<Vec<(Definition, Confidence)>> {
        let Some(at) = reference.span() else {
            return Err(IndexError::invalid(format!(
                "element '{}' in {} has a {}-field range",
                reference.name,
                reference.path,
                reference.range.len()
            )));
        };
        if reference.name.is_empty() {
            return Ok(Vec::new());
        }

        let names = candidate_names(origin, reference);
        let visible: Vec<Element> = self
            .name_matches(origin, &names)?
            .into_iter()
            .filter(|c| visible_from(c, origin, at))
            .collect();

        let compatible: Vec<Element> = visible
            .iter()
            .filter(|c| reference.element_type.accepts(c.element_type))
            .cloned()
            .collect();
        let pool = if compatible.is_empty() { visible } else { compatible };

        let reachable = if pool.iter().any(|c| c.path != origin.path) {
            self.reachable_files(origin)?
        } else {
            HashSet::new()
        };

        let mut ranked: Vec<(Definition, Confidence)> = pool
            .iter()
            .filter_map(|c| {
                let confidence = if c.path == origin.path {
                    if c.scope.is_local() {
                        Confidence::Local
                    } else {
                        Confidence::SameFile
                    }
                } else if reachable.contains(&c.path) {
                    Confidence::Imported
                } else {
                    Confidence::Heuristic
                };
                c.to_definition().map(|d| (d, confidence))
            })
            .collect();

        ranked.sort_by(|(a, ca), (b, cb)| {
            ca.cmp(cb)
                .then_with(|| a.path.cmp(&b.path))
                .then_with(|| a.range[0].cmp(&b.range[0]))
                .then_with(|| a.range[1].cmp(&b.range[1]))
        });
        ranked.dedup_by(|a, b| a.0 == b.0);
        Ok(ranked)
    }

    fn name_matches(&self, origin: &FileElement, names: &[String]) -> IndexResult<Vec<Element>> {
        let mut out = Vec::new();
        for name in names {
            out.extend(origin.definitions().filter(|d| &d.name == name).cloned());
            out.extend(
                self.index
                    .lookup(name, None)?
                    .into_iter()
                    .filter(|d| d.path != origin.path),
            );
        }
        out.retain(|e| self.is_valid(e));
        Ok(out)
    }

    fn is_valid(&self, element: &Element) -> bool {
        match self.registry.for_path(Path::new(&element.path)) {
            Some(parser) => parser.is_valid(element),
            None => is_valid_element(element),
        }
    }

    /// Files whose names `origin` can see through its imports, following
    /// re-exporting imports transitively.
    fn reachable_files(&self, origin: &FileElement) -> IndexResult<HashSet<String>> {
        let paths = self.index.file_paths()?;
        let mut reached = HashSet::new();
        let mut frontier = self.import_targets(origin, false, &paths);
        let mut depth = 1;

        while !frontier.is_empty() && depth <= MAX_IMPORT_DEPTH {
            let mut next = Vec::new();
            for path in frontier {
                if path == origin.path || !reached.insert(path.clone()) {
                    continue;
                }
                if let Some(file) = self.index.file(&path)? {
                    next.extend(self.import_targets(&file, true, &paths));
                }
            }
            frontier = next;
            depth += 1;
        }
        Ok(reached)
    }

    fn import_targets(&self, file: &FileElement, reexport_only: bool, paths: &[String]) -> Vec<String> {
        let mut targets = Vec::new();
        for import in file.imports.iter().filter(|i| !reexport_only || i.reexport) {
            for candidate in paths {
                if *candidate != file.path
                    && self.import_matches(&file.language, import, &file.path, candidate)
                {
                    targets.push(candidate.clone());
                }
            }
        }
        targets
    }

    fn import_matches(&self, language: &Language, import: &Import, importer: &str, candidate: &str) -> bool {
        match self.registry.for_language(language) {
            Some(parser) => parser.import_matches(import, importer, candidate),
            None => default_import_matches(import, importer, candidate),
        }
    }
}

/// The reference name plus the original names of imports aliased to it.
fn candidate_names(origin: &FileElement, reference: &Element) -> Vec<String> {
    let mut names = vec![reference.name.clone()];
    for import in &origin.imports {
        if import.alias.as_deref() == Some(reference.name.as_str()) {
            let original = import.name.rsplit('.').next().unwrap_or(&import.name);
            if !original.is_empty() && original != "*" && !names.iter().any(|n| n == original) {
                names.push(original.to_string());
            }
        }
    }
    names
}

/// Function and block scoped definitions are only visible inside their
/// enclosing definition, in their own file.
fn visible_from(candidate: &Element, origin: &FileElement, at: [i32; 4]) -> bool {
    if !candidate.scope.is_local() {
        return true;
    }
    if candidate.path != origin.path {
        return false;
    }
    match candidate.enclosing {
        Some(enclosing) => span_contains(enclosing, at),
        None => true,
    }
}
