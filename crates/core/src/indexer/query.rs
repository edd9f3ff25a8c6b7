use codegraph_api::ElementType;
use codegraph_plugin::{Element, FileElement};

fn class_rank(kind: ElementType) -> u8 {
    if kind.is_call() {
        0
    } else if kind.is_reference() {
        1
    } else {
        2
    }
}

/// Picks the element a line-range query is about: calls first, then other
/// references, then definitions; inside a class the smallest range, then the
/// earliest start.
pub(crate) fn locate(file: &FileElement, start_line: i32, end_line: i32) -> Option<&Element> {
    file.elements
        .iter()
        .filter(|e| {
            !e.name.is_empty()
                && !e.element_type.is_structural()
                && e.overlaps_lines(start_line, end_line)
        })
        .min_by_key(|e| {
            (
                class_rank(e.element_type),
                e.extent(),
                e.span().map(|r| (r[0], r[1])),
            )
        })
}
