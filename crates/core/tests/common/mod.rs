#![allow(dead_code)]

use codegraph_api::{Language, Scope, ElementType};
use codegraph_core::{Indexer, IndexerConfig};
use codegraph_plugin::{BoxError, Element, FileElement, Import, LanguageParser};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Line-oriented test language for `.src` files.
///
/// ```text
/// def foo        function foo, file scope
/// var x          variable x, function scope inside begin/end
/// begin main     function main spanning until the matching `end`
/// call foo       call of foo
/// use x          reference to x
/// import a.src   import of a file
/// export a.src   re-exporting import
/// !!             syntax error
/// ```
///
/// Every element on line `n` gets the range `[n, 0, n, 0]`.
pub struct MockParser {
    pub delay: Option<Duration>,
}

impl MockParser {
    pub fn new() -> Self {
        Self { delay: None }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { delay: Some(delay) }
    }
}

impl LanguageParser for MockParser {
    fn language(&self) -> Language {
        Language::new("mock")
    }

    fn extensions(&self) -> &[&'static str] {
        &["src"]
    }

    fn parse(&self, path: &str, content: &[u8]) -> Result<FileElement, BoxError> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let text = std::str::from_utf8(content)?;
        let lines: Vec<&str> = text.lines().collect();

        let mut blocks: Vec<[i32; 4]> = Vec::new();
        let mut open = None;
        for (i, line) in lines.iter().enumerate() {
            match line.split_whitespace().next() {
                Some("begin") => open = Some(i as i32),
                Some("end") => {
                    if let Some(start) = open.take() {
                        blocks.push([start, 0, i as i32, 0]);
                    }
                }
                _ => {}
            }
        }
        let enclosing_of =
            |line: i32| blocks.iter().copied().find(|b| b[0] < line && line <= b[2]);

        let mut file = FileElement::new(path, self.language(), content);
        for (i, line) in lines.iter().enumerate() {
            let n = i as i32;
            let mut words = line.split_whitespace();
            let Some(keyword) = words.next() else {
                continue;
            };
            let name = words.next().unwrap_or("");
            let at = [n, 0, n, 0];
            let enclosing = enclosing_of(n);
            let scope = if enclosing.is_some() {
                Scope::Function
            } else {
                Scope::File
            };

            match keyword {
                "!!" => return Err(format!("syntax error at line {}", n).into()),
                "def" => file.push(Element::new(ElementType::Function, name, path, at, Scope::File)),
                "begin" => {
                    let span = blocks
                        .iter()
                        .copied()
                        .find(|b| b[0] == n)
                        .unwrap_or(at);
                    file.push(Element::new(ElementType::Function, name, path, span, Scope::File));
                }
                "var" => file.push(
                    Element::new(ElementType::Variable, name, path, at, scope).with_enclosing(enclosing),
                ),
                "call" => file.push(
                    Element::new(ElementType::CallFunction, name, path, at, scope)
                        .with_enclosing(enclosing),
                ),
                "use" => file.push(
                    Element::new(ElementType::Reference, name, path, at, scope).with_enclosing(enclosing),
                ),
                "import" => file.push_import(Import::new(name, name, path, at)),
                "export" => file.push_import(Import::new(name, name, path, at).reexported(true)),
                _ => {}
            }
        }
        Ok(file)
    }
}

/// Content whose line `n` holds the given text; other lines are blank.
pub fn lines(entries: &[(usize, &str)]) -> String {
    let last = entries.iter().map(|(n, _)| *n).max().unwrap_or(0);
    let mut out = vec![""; last + 1];
    for (n, text) in entries {
        out[*n] = text;
    }
    out.join("\n") + "\n"
}

pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

pub fn workspace(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_files(dir.path(), files);
    dir
}

pub fn mock_indexer(config: IndexerConfig) -> Indexer {
    Indexer::builder()
        .with_config(config)
        .with_parser(Arc::new(MockParser::new()))
        .build()
}

pub fn memory_indexer() -> Indexer {
    mock_indexer(IndexerConfig::in_memory().with_concurrency(4))
}

/// Workspace with `a.src` defining `foo` on line 10 and `b.src` importing
/// it and calling `foo` on line 5.
pub fn scenario_workspace() -> TempDir {
    workspace(&[
        ("a.src", &lines(&[(10, "def foo")])),
        ("b.src", &lines(&[(0, "import a.src"), (5, "call foo")])),
    ])
}
