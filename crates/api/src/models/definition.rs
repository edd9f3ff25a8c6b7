use super::element::ElementType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A resolved definition site returned by `query_definitions`.
///
/// `range` is always `[start_line, start_col, end_line, end_col]`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
pub struct Definition {
    pub name: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Workspace-relative path with `/` separators.
    pub path: String,
    pub range: [i32; 4],
}

impl Definition {
    pub fn start_line(&self) -> i32 {
        self.range[0]
    }

    pub fn end_line(&self) -> i32 {
        self.range[2]
    }
}
