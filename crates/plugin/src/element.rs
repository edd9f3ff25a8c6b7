use codegraph_api::{Definition, ElementType, Language, Scope};
use serde::{Deserialize, Serialize};

/// Capability shared by every element variant.
///
/// Validity and resolution only ever look at elements through this trait.
pub trait CodeElement {
    fn element_type(&self) -> ElementType;
    fn name(&self) -> &str;
    fn path(&self) -> &str;
    fn range(&self) -> &[i32];
    fn scope(&self) -> Scope;
}

/// An element takes part in resolution when it has a name, a full
/// `[start_line, start_col, end_line, end_col]` range and a non-structural
/// kind.
pub fn is_valid_element(element: &dyn CodeElement) -> bool {
    !element.name().is_empty() && element.range().len() == 4 && !element.element_type().is_structural()
}

/// Returns the range as a fixed array when it has exactly four fields.
pub fn span_of(range: &[i32]) -> Option<[i32; 4]> {
    <[i32; 4]>::try_from(range).ok()
}

/// Whether `outer` fully contains `inner`, comparing (line, col) positions.
pub fn span_contains(outer: [i32; 4], inner: [i32; 4]) -> bool {
    (outer[0], outer[1]) <= (inner[0], inner[1]) && (inner[2], inner[3]) <= (outer[2], outer[3])
}

/// Definition or reference produced by a parser.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Element {
    pub element_type: ElementType,
    pub name: String,
    /// Workspace-relative path with `/` separators.
    pub path: String,
    pub range: Vec<i32>,
    pub scope: Scope,
    /// Range of the innermost enclosing function or class definition.
    pub enclosing: Option<[i32; 4]>,
    /// Qualifier of a method call, `obj` in `obj.run()`.
    pub receiver: Option<String>,
}

impl Element {
    pub fn new(
        element_type: ElementType,
        name: impl Into<String>,
        path: impl Into<String>,
        range: [i32; 4],
        scope: Scope,
    ) -> Self {
        Self {
            element_type,
            name: name.into(),
            path: path.into(),
            range: range.to_vec(),
            scope,
            enclosing: None,
            receiver: None,
        }
    }

    pub fn with_enclosing(mut self, enclosing: Option<[i32; 4]>) -> Self {
        self.enclosing = enclosing;
        self
    }

    pub fn with_receiver(mut self, receiver: Option<String>) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn span(&self) -> Option<[i32; 4]> {
        span_of(&self.range)
    }

    /// Whether the element's lines intersect `[start_line, end_line]`.
    pub fn overlaps_lines(&self, start_line: i32, end_line: i32) -> bool {
        match self.span() {
            Some(r) => r[0] <= end_line && start_line <= r[2],
            None => false,
        }
    }

    /// Line count first, then columns; used to pick the innermost element.
    pub fn extent(&self) -> (i32, i32) {
        match self.span() {
            Some(r) => (r[2] - r[0], if r[0] == r[2] { r[3] - r[1] } else { r[3] }),
            None => (i32::MAX, i32::MAX),
        }
    }

    /// Projects a valid definition-kind element onto the query result type.
    pub fn to_definition(&self) -> Option<Definition> {
        if !self.element_type.is_definition() || self.name.is_empty() {
            return None;
        }
        Some(Definition {
            name: self.name.clone(),
            element_type: self.element_type,
            path: self.path.clone(),
            range: self.span()?,
        })
    }
}

impl CodeElement for Element {
    fn element_type(&self) -> ElementType {
        self.element_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn range(&self) -> &[i32] {
        &self.range
    }

    fn scope(&self) -> Scope {
        self.scope
    }
}

/// A declared import.
///
/// `source` is the module or header as written (`os.path`, `.models`,
/// `"util.h"`, `<stdio.h>`). `name` is the imported symbol, `*` for a
/// wildcard, or the module itself for plain imports. A `reexport` import
/// makes every name of the imported file visible to whoever imports this
/// file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Import {
    pub name: String,
    pub alias: Option<String>,
    pub source: String,
    pub reexport: bool,
    pub path: String,
    pub range: Vec<i32>,
    pub scope: Scope,
}

impl Import {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        path: impl Into<String>,
        range: [i32; 4],
    ) -> Self {
        Self {
            name: name.into(),
            alias: None,
            source: source.into(),
            reexport: false,
            path: path.into(),
            range: range.to_vec(),
            scope: Scope::File,
        }
    }

    pub fn with_alias(mut self, alias: Option<String>) -> Self {
        self.alias = alias;
        self
    }

    pub fn reexported(mut self, reexport: bool) -> Self {
        self.reexport = reexport;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// The name the import binds locally.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "*"
    }
}

impl CodeElement for Import {
    fn element_type(&self) -> ElementType {
        ElementType::Import
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn range(&self) -> &[i32] {
        &self.range
    }

    fn scope(&self) -> Scope {
        self.scope
    }
}

/// Everything a parser extracted from one file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileElement {
    pub path: String,
    pub language: Language,
    pub content_hash: u64,
    /// Definitions and references in source order.
    pub elements: Vec<Element>,
    pub imports: Vec<Import>,
}

impl FileElement {
    pub fn new(path: impl Into<String>, language: Language, content: &[u8]) -> Self {
        Self {
            path: path.into(),
            language,
            content_hash: content_hash(content),
            elements: Vec::new(),
            imports: Vec::new(),
        }
    }

    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    pub fn push_import(&mut self, import: Import) {
        self.imports.push(import);
    }

    pub fn definitions(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.element_type.is_definition())
    }

    pub fn references(&self) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(|e| e.element_type.is_reference())
    }

    /// Drops exact duplicates, keeping the first occurrence and source order.
    pub fn dedup(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.elements
            .retain(|e| seen.insert((e.element_type, e.name.clone(), e.range.clone())));
    }
}

pub fn content_hash(content: &[u8]) -> u64 {
    xxhash_rust::xxh3::xxh3_64(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_requires_name_range_and_kind() {
        let ok = Element::new(ElementType::Function, "foo", "a.py", [1, 0, 2, 0], Scope::File);
        assert!(is_valid_element(&ok));

        let mut short = ok.clone();
        short.range = vec![1, 0];
        assert!(!is_valid_element(&short));

        let unnamed = Element::new(ElementType::Function, "", "a.py", [1, 0, 2, 0], Scope::File);
        assert!(!is_valid_element(&unnamed));

        let import = Import::new("os", "os", "a.py", [0, 0, 0, 9]);
        assert!(!is_valid_element(&import));
    }

    #[test]
    fn test_overlap_and_extent() {
        let call = Element::new(ElementType::CallFunction, "f", "a.c", [4, 2, 4, 5], Scope::Function);
        let func = Element::new(ElementType::Function, "g", "a.c", [2, 0, 8, 1], Scope::File);
        assert!(call.overlaps_lines(4, 4));
        assert!(!call.overlaps_lines(5, 9));
        assert!(func.overlaps_lines(8, 10));
        assert!(call.extent() < func.extent());
        assert!(span_contains(func.span().unwrap(), call.span().unwrap()));
    }

    #[test]
    fn test_references_do_not_project_to_definitions() {
        let call = Element::new(ElementType::CallFunction, "f", "a.c", [4, 2, 4, 5], Scope::File);
        assert!(call.to_definition().is_none());
        let var = Element::new(ElementType::Variable, "x", "a.c", [1, 4, 1, 5], Scope::File);
        assert_eq!(var.to_definition().unwrap().range, [1, 4, 1, 5]);
    }

    #[test]
    fn test_dedup_keeps_source_order() {
        let mut file = FileElement::new("a.py", Language::PYTHON, b"x = 1");
        let x = Element::new(ElementType::Variable, "x", "a.py", [0, 0, 0, 1], Scope::File);
        let y = Element::new(ElementType::Variable, "y", "a.py", [1, 0, 1, 1], Scope::File);
        file.push(x.clone());
        file.push(y.clone());
        file.push(x.clone());
        file.dedup();
        assert_eq!(file.elements, vec![x, y]);
        assert_eq!(file.content_hash, content_hash(b"x = 1"));
    }
}
