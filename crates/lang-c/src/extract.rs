use codegraph_api::{ElementType, Scope};
use codegraph_plugin::utils::{named_children, node_range, node_text};
use codegraph_plugin::{Element, FileElement};
use tree_sitter::Node;

#[derive(Clone, Copy)]
struct Context {
    scope: Scope,
    enclosing: Option<[i32; 4]>,
}

impl Context {
    const FILE: Context = Context {
        scope: Scope::File,
        enclosing: None,
    };
}

/// Recursive walk over a C translation unit.
pub(crate) struct Extractor<'a> {
    source: &'a [u8],
    file: &'a mut FileElement,
}

impl<'a> Extractor<'a> {
    pub(crate) fn new(source: &'a [u8], file: &'a mut FileElement) -> Self {
        Self { source, file }
    }

    pub(crate) fn run(mut self, root: Node) {
        self.visit_children(root, Context::FILE);
    }

    fn visit_children(&mut self, node: Node, ctx: Context) {
        for child in named_children(node) {
            self.visit(child, ctx);
        }
    }

    fn visit(&mut self, node: Node, ctx: Context) {
        match node.kind() {
            "function_definition" => self.function(node, ctx),
            "declaration" => self.declaration(node, ctx),
            "type_definition" => {
                if let Some(ty) = node.child_by_field_name("type") {
                    self.visit(ty, ctx);
                }
                for declarator in declarators(node) {
                    if let Some(name) = declarator_name(declarator) {
                        self.define(ElementType::Typedef, name, node_range(name), ctx);
                    }
                }
            }
            "struct_specifier" | "union_specifier" | "enum_specifier" => self.tagged(node, ctx),
            "preproc_def" | "preproc_function_def" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(ElementType::Macro, name, node_range(name), ctx);
                }
            }
            "compound_statement" | "for_statement" if ctx.scope.is_local() => {
                let block = Context {
                    scope: Scope::Block,
                    enclosing: Some(node_range(node)),
                };
                self.visit_children(node, block);
            }
            "call_expression" => self.call(node, ctx),
            "field_expression" => {
                let argument = node.child_by_field_name("argument");
                if let Some(argument) = argument {
                    self.visit(argument, ctx);
                }
                if let Some(field) = node.child_by_field_name("field") {
                    let receiver = argument.map(|a| node_text(a, self.source).to_string());
                    self.reference(ElementType::Reference, field, receiver, ctx);
                }
            }
            "identifier" | "type_identifier" => {
                self.reference(ElementType::Reference, node, None, ctx)
            }
            // Includes are collected by query.
            "preproc_include" | "comment" | "string_literal" | "char_literal" => {}
            _ => self.visit_children(node, ctx),
        }
    }

    fn function(&mut self, node: Node, ctx: Context) {
        let span = node_range(node);
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, ctx);
        }
        let declarator = node.child_by_field_name("declarator");
        if let Some(name) = declarator.and_then(declarator_name) {
            self.define(ElementType::Function, name, span, ctx);
        }

        let inner = Context {
            scope: Scope::Function,
            enclosing: Some(span),
        };
        let params = declarator
            .and_then(function_declarator)
            .and_then(|f| f.child_by_field_name("parameters"));
        if let Some(params) = params {
            for param in named_children(params) {
                if param.kind() != "parameter_declaration" {
                    continue;
                }
                if let Some(ty) = param.child_by_field_name("type") {
                    self.visit(ty, ctx);
                }
                let name = param
                    .child_by_field_name("declarator")
                    .and_then(declarator_name);
                if let Some(name) = name {
                    self.define(ElementType::Parameter, name, node_range(name), inner);
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body, inner);
        }
    }

    /// Variables, or prototypes when the declarator declares a function.
    fn declaration(&mut self, node: Node, ctx: Context) {
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, ctx);
        }
        for declarator in declarators(node) {
            let Some(name) = declarator_name(declarator) else {
                continue;
            };
            if function_declarator(declarator).is_some() {
                self.define(ElementType::Function, name, node_range(node), ctx);
                continue;
            }
            self.define(ElementType::Variable, name, node_range(name), ctx);
            if let Some(value) = declarator.child_by_field_name("value") {
                self.visit(value, ctx);
            }
        }
    }

    /// `struct`, `union` and `enum` specifiers. With a body they define the
    /// tag, without one they refer to it.
    fn tagged(&mut self, node: Node, ctx: Context) {
        let name = node.child_by_field_name("name");
        let Some(body) = node.child_by_field_name("body") else {
            if let Some(name) = name {
                self.reference(ElementType::Reference, name, None, ctx);
            }
            return;
        };

        let span = node_range(node);
        let kind = match node.kind() {
            "struct_specifier" => ElementType::Struct,
            "union_specifier" => ElementType::Union,
            _ => ElementType::Enum,
        };
        if let Some(name) = name {
            self.define(kind, name, span, ctx);
        }

        if kind == ElementType::Enum {
            // Enumerators belong to the scope enclosing the enum.
            for enumerator in named_children(body) {
                if enumerator.kind() != "enumerator" {
                    continue;
                }
                if let Some(name) = enumerator.child_by_field_name("name") {
                    self.define(ElementType::EnumConstant, name, node_range(name), ctx);
                }
                if let Some(value) = enumerator.child_by_field_name("value") {
                    self.visit(value, ctx);
                }
            }
            return;
        }

        let members = Context {
            scope: Scope::Class,
            enclosing: Some(span),
        };
        for field in named_children(body) {
            if field.kind() != "field_declaration" {
                self.visit(field, ctx);
                continue;
            }
            if let Some(ty) = field.child_by_field_name("type") {
                self.visit(ty, ctx);
            }
            for declarator in declarators(field) {
                if let Some(name) = declarator_name(declarator) {
                    self.define(ElementType::Field, name, node_range(name), members);
                }
            }
        }
    }

    fn call(&mut self, node: Node, ctx: Context) {
        if let Some(function) = node.child_by_field_name("function") {
            match function.kind() {
                "identifier" => self.reference(ElementType::CallFunction, function, None, ctx),
                "field_expression" => {
                    let argument = function.child_by_field_name("argument");
                    if let Some(argument) = argument {
                        self.visit(argument, ctx);
                    }
                    if let Some(field) = function.child_by_field_name("field") {
                        let receiver = argument.map(|a| node_text(a, self.source).to_string());
                        self.reference(ElementType::CallMethod, field, receiver, ctx);
                    }
                }
                _ => self.visit(function, ctx),
            }
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            self.visit(args, ctx);
        }
    }

    fn define(&mut self, kind: ElementType, name: Node, range: [i32; 4], ctx: Context) {
        let element = Element::new(
            kind,
            node_text(name, self.source),
            self.file.path.clone(),
            range,
            ctx.scope,
        )
        .with_enclosing(ctx.enclosing);
        self.file.push(element);
    }

    fn reference(&mut self, kind: ElementType, node: Node, receiver: Option<String>, ctx: Context) {
        let element = Element::new(
            kind,
            node_text(node, self.source),
            self.file.path.clone(),
            node_range(node),
            ctx.scope,
        )
        .with_enclosing(ctx.enclosing)
        .with_receiver(receiver);
        self.file.push(element);
    }
}

fn declarators(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.children_by_field_name("declarator", &mut cursor).collect()
}

/// The name a declarator introduces, looking through pointers, arrays,
/// initializers and parentheses: `*buf[4]`, `(*cb)(int)`, `x = 1`.
fn declarator_name(node: Node) -> Option<Node> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" => Some(node),
        "pointer_declarator" | "array_declarator" | "function_declarator" | "init_declarator" => node
            .child_by_field_name("declarator")
            .and_then(declarator_name),
        "parenthesized_declarator" | "attributed_declarator" => {
            named_children(node).into_iter().find_map(declarator_name)
        }
        _ => None,
    }
}

/// The function declarator of a function or prototype, `f(int)` in
/// `int *f(int)`. Function pointers such as `(*cb)(int)` do not count.
fn function_declarator(node: Node) -> Option<Node> {
    match node.kind() {
        "function_declarator" => node
            .child_by_field_name("declarator")
            .filter(|inner| inner.kind() == "identifier")
            .map(|_| node),
        "pointer_declarator" => node
            .child_by_field_name("declarator")
            .and_then(function_declarator),
        _ => None,
    }
}
