use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of element kinds produced by language parsers.
///
/// Kinds fall into three families: definitions (resolution targets),
/// references (things that need resolving) and structural markers that are
/// never returned as a resolved definition.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
pub enum ElementType {
    #[serde(rename = "function")]
    Function,
    #[serde(rename = "method")]
    Method,
    #[serde(rename = "class")]
    Class,
    #[serde(rename = "struct")]
    Struct,
    #[serde(rename = "union")]
    Union,
    #[serde(rename = "enum")]
    Enum,
    #[serde(rename = "enum.constant")]
    EnumConstant,
    #[serde(rename = "interface")]
    Interface,
    #[serde(rename = "typedef")]
    Typedef,
    #[serde(rename = "macro")]
    Macro,
    #[serde(rename = "variable")]
    Variable,
    #[serde(rename = "field")]
    Field,
    #[serde(rename = "parameter")]
    Parameter,

    #[serde(rename = "call.function")]
    CallFunction,
    #[serde(rename = "call.method")]
    CallMethod,
    #[serde(rename = "reference")]
    Reference,

    #[serde(rename = "import")]
    Import,
    #[serde(rename = "import.name")]
    ImportName,
    #[serde(rename = "import.alias")]
    ImportAlias,
    #[serde(rename = "import.path")]
    ImportPath,
    #[serde(rename = "package")]
    Package,
    #[serde(rename = "namespace")]
    Namespace,
    #[serde(rename = "undefined")]
    Undefined,
}

impl ElementType {
    pub const ALL: [ElementType; 23] = [
        ElementType::Function,
        ElementType::Method,
        ElementType::Class,
        ElementType::Struct,
        ElementType::Union,
        ElementType::Enum,
        ElementType::EnumConstant,
        ElementType::Interface,
        ElementType::Typedef,
        ElementType::Macro,
        ElementType::Variable,
        ElementType::Field,
        ElementType::Parameter,
        ElementType::CallFunction,
        ElementType::CallMethod,
        ElementType::Reference,
        ElementType::Import,
        ElementType::ImportName,
        ElementType::ImportAlias,
        ElementType::ImportPath,
        ElementType::Package,
        ElementType::Namespace,
        ElementType::Undefined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Function => "function",
            ElementType::Method => "method",
            ElementType::Class => "class",
            ElementType::Struct => "struct",
            ElementType::Union => "union",
            ElementType::Enum => "enum",
            ElementType::EnumConstant => "enum.constant",
            ElementType::Interface => "interface",
            ElementType::Typedef => "typedef",
            ElementType::Macro => "macro",
            ElementType::Variable => "variable",
            ElementType::Field => "field",
            ElementType::Parameter => "parameter",
            ElementType::CallFunction => "call.function",
            ElementType::CallMethod => "call.method",
            ElementType::Reference => "reference",
            ElementType::Import => "import",
            ElementType::ImportName => "import.name",
            ElementType::ImportAlias => "import.alias",
            ElementType::ImportPath => "import.path",
            ElementType::Package => "package",
            ElementType::Namespace => "namespace",
            ElementType::Undefined => "undefined",
        }
    }

    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            ElementType::Function
                | ElementType::Method
                | ElementType::Class
                | ElementType::Struct
                | ElementType::Union
                | ElementType::Enum
                | ElementType::EnumConstant
                | ElementType::Interface
                | ElementType::Typedef
                | ElementType::Macro
                | ElementType::Variable
                | ElementType::Field
                | ElementType::Parameter
        )
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            ElementType::CallFunction | ElementType::CallMethod | ElementType::Reference
        )
    }

    pub fn is_call(&self) -> bool {
        matches!(self, ElementType::CallFunction | ElementType::CallMethod)
    }

    pub fn is_structural(&self) -> bool {
        !self.is_definition() && !self.is_reference()
    }

    /// Whether a definition of kind `target` is a plausible resolution for a
    /// reference of this kind. Non-reference kinds accept any definition.
    pub fn accepts(&self, target: ElementType) -> bool {
        if !target.is_definition() {
            return false;
        }
        match self {
            ElementType::CallFunction => matches!(
                target,
                ElementType::Function
                    | ElementType::Macro
                    | ElementType::Class
                    | ElementType::Struct
                    | ElementType::Typedef
                    | ElementType::Variable
                    | ElementType::Parameter
                    | ElementType::Field
            ),
            ElementType::CallMethod => matches!(
                target,
                ElementType::Method | ElementType::Function | ElementType::Field | ElementType::Macro
            ),
            _ => true,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown element type '{}'", s))
    }
}

/// Lexical container classification of an element.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    File,
    Class,
    Function,
    Block,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::File => "file",
            Scope::Class => "class",
            Scope::Function => "function",
            Scope::Block => "block",
        }
    }

    /// Function and block scoped definitions are only visible from inside
    /// their enclosing definition.
    pub fn is_local(&self) -> bool {
        matches!(self, Scope::Function | Scope::Block)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
