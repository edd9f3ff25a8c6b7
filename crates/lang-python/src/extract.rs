use codegraph_api::{ElementType, Scope};
use codegraph_plugin::utils::{named_children, node_range, node_text};
use codegraph_plugin::{Element, FileElement};
use tree_sitter::Node;

/// Where the walker currently is.
#[derive(Clone, Copy)]
struct Context {
    scope: Scope,
    enclosing: Option<[i32; 4]>,
    /// Innermost class definition, carried into its methods for `self.x` fields.
    class_span: Option<[i32; 4]>,
    /// Directly inside a class body, not inside one of its methods.
    in_class_body: bool,
}

impl Context {
    const MODULE: Context = Context {
        scope: Scope::File,
        enclosing: None,
        class_span: None,
        in_class_body: false,
    };
}

/// Recursive walk collecting definitions and references in source order.
pub(crate) struct Extractor<'a> {
    source: &'a [u8],
    file: &'a mut FileElement,
}

impl<'a> Extractor<'a> {
    pub(crate) fn new(source: &'a [u8], file: &'a mut FileElement) -> Self {
        Self { source, file }
    }

    pub(crate) fn run(mut self, root: Node) {
        self.visit_children(root, Context::MODULE);
    }

    fn visit_children(&mut self, node: Node, ctx: Context) {
        for child in named_children(node) {
            self.visit(child, ctx);
        }
    }

    fn visit(&mut self, node: Node, ctx: Context) {
        match node.kind() {
            "function_definition" => self.function(node, ctx),
            "class_definition" => self.class(node, ctx),
            "assignment" => self.assignment(node, ctx),
            "for_statement" => {
                if let Some(left) = node.child_by_field_name("left") {
                    self.bind_targets(left, ctx);
                }
                for field in ["right", "body", "alternative"] {
                    if let Some(child) = node.child_by_field_name(field) {
                        self.visit(child, ctx);
                    }
                }
            }
            "list_comprehension" | "set_comprehension" | "dictionary_comprehension"
            | "generator_expression" => self.comprehension(node, ctx),
            "as_pattern" => {
                let alias = node.child_by_field_name("alias");
                for child in named_children(node) {
                    if Some(child) == alias {
                        self.bind_targets(child, ctx);
                    } else {
                        self.visit(child, ctx);
                    }
                }
            }
            "except_clause" => {
                let alias = node.child_by_field_name("alias");
                for child in named_children(node) {
                    if Some(child) == alias {
                        self.bind_targets(child, ctx);
                    } else {
                        self.visit(child, ctx);
                    }
                }
            }
            "call" => self.call(node, ctx),
            "attribute" => self.attribute(node, ctx),
            "identifier" => self.reference(ElementType::Reference, node, None, ctx),
            "keyword_argument" => {
                if let Some(value) = node.child_by_field_name("value") {
                    self.visit(value, ctx);
                }
            }
            "lambda" => {
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit(body, ctx);
                }
            }
            // Imports are collected by query; the rest bind no new names.
            "import_statement" | "import_from_statement" | "future_import_statement"
            | "global_statement" | "nonlocal_statement" | "comment" => {}
            _ => self.visit_children(node, ctx),
        }
    }

    fn function(&mut self, node: Node, ctx: Context) {
        let span = node_range(node);
        if let Some(name) = node.child_by_field_name("name") {
            let kind = if ctx.in_class_body {
                ElementType::Method
            } else {
                ElementType::Function
            };
            self.define(kind, node_text(name, self.source), span, ctx);
        }

        let inner = Context {
            scope: Scope::Function,
            enclosing: Some(span),
            class_span: ctx.class_span,
            in_class_body: false,
        };
        if let Some(params) = node.child_by_field_name("parameters") {
            self.parameters(params, ctx, inner);
        }
        if let Some(ret) = node.child_by_field_name("return_type") {
            self.visit(ret, ctx);
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body, inner);
        }
    }

    /// Parameters bind in the function; annotations and defaults are
    /// evaluated where the function is defined.
    fn parameters(&mut self, params: Node, outer: Context, inner: Context) {
        for param in named_children(params) {
            let name = match param.kind() {
                "default_parameter" | "typed_default_parameter" => param.child_by_field_name("name"),
                _ => binding_identifier(param),
            };
            if let Some(name) = name {
                self.define(
                    ElementType::Parameter,
                    node_text(name, self.source),
                    node_range(name),
                    inner,
                );
            }
            if let Some(ty) = param.child_by_field_name("type") {
                self.visit(ty, outer);
            }
            if let Some(value) = param.child_by_field_name("value") {
                self.visit(value, outer);
            }
        }
    }

    fn class(&mut self, node: Node, ctx: Context) {
        let span = node_range(node);
        if let Some(name) = node.child_by_field_name("name") {
            self.define(ElementType::Class, node_text(name, self.source), span, ctx);
        }
        if let Some(bases) = node.child_by_field_name("superclasses") {
            self.visit_children(bases, ctx);
        }

        let inner = Context {
            scope: Scope::Class,
            enclosing: Some(span),
            class_span: Some(span),
            in_class_body: true,
        };
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body, inner);
        }
    }

    fn assignment(&mut self, node: Node, ctx: Context) {
        if let Some(left) = node.child_by_field_name("left") {
            self.bind_targets(left, ctx);
        }
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, ctx);
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.visit(right, ctx);
        }
    }

    /// Comprehension variables live in their own block.
    fn comprehension(&mut self, node: Node, ctx: Context) {
        let inner = Context {
            scope: Scope::Block,
            enclosing: Some(node_range(node)),
            in_class_body: false,
            ..ctx
        };
        for child in named_children(node) {
            if child.kind() != "for_in_clause" {
                self.visit(child, inner);
                continue;
            }
            if let Some(left) = child.child_by_field_name("left") {
                self.bind_targets(left, inner);
            }
            if let Some(right) = child.child_by_field_name("right") {
                self.visit(right, inner);
            }
        }
    }

    /// Names bound by an assignment target, a loop variable or an `as` alias.
    fn bind_targets(&mut self, target: Node, ctx: Context) {
        match target.kind() {
            "identifier" => {
                let kind = if ctx.in_class_body {
                    ElementType::Field
                } else {
                    ElementType::Variable
                };
                self.define(kind, node_text(target, self.source), node_range(target), ctx);
            }
            "pattern_list" | "tuple_pattern" | "list_pattern" | "list_splat_pattern"
            | "as_pattern_target" | "parenthesized_expression" | "tuple" | "list" => {
                for child in named_children(target) {
                    self.bind_targets(child, ctx);
                }
            }
            "attribute" => {
                let object = target.child_by_field_name("object");
                let attr = target.child_by_field_name("attribute");
                match (object, attr, ctx.class_span) {
                    (Some(object), Some(attr), Some(class_span))
                        if node_text(object, self.source) == "self" =>
                    {
                        let field = Element::new(
                            ElementType::Field,
                            node_text(attr, self.source),
                            self.file.path.clone(),
                            node_range(attr),
                            Scope::Class,
                        )
                        .with_enclosing(Some(class_span));
                        self.file.push(field);
                    }
                    _ => self.visit(target, ctx),
                }
            }
            _ => self.visit(target, ctx),
        }
    }

    fn call(&mut self, node: Node, ctx: Context) {
        if let Some(function) = node.child_by_field_name("function") {
            match function.kind() {
                "identifier" => self.reference(ElementType::CallFunction, function, None, ctx),
                "attribute" => {
                    let object = function.child_by_field_name("object");
                    if let Some(object) = object {
                        self.visit(object, ctx);
                    }
                    if let Some(attr) = function.child_by_field_name("attribute") {
                        let receiver = object.map(|o| node_text(o, self.source).to_string());
                        self.reference(ElementType::CallMethod, attr, receiver, ctx);
                    }
                }
                _ => self.visit(function, ctx),
            }
        }
        if let Some(args) = node.child_by_field_name("arguments") {
            self.visit(args, ctx);
        }
    }

    fn attribute(&mut self, node: Node, ctx: Context) {
        let object = node.child_by_field_name("object");
        if let Some(object) = object {
            self.visit(object, ctx);
        }
        if let Some(attr) = node.child_by_field_name("attribute") {
            let receiver = object.map(|o| node_text(o, self.source).to_string());
            self.reference(ElementType::Reference, attr, receiver, ctx);
        }
    }

    fn define(&mut self, kind: ElementType, name: &str, range: [i32; 4], ctx: Context) {
        let element = Element::new(kind, name, self.file.path.clone(), range, ctx.scope)
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

/// The identifier a parameter binds: `x`, `x: int`, `*args`, `**kwargs`.
fn binding_identifier(node: Node) -> Option<Node> {
    if node.kind() == "identifier" {
        return Some(node);
    }
    named_children(node)
        .into_iter()
        .find_map(|child| match child.kind() {
            "identifier" => Some(child),
            "list_splat_pattern" | "dictionary_splat_pattern" => binding_identifier(child),
            _ => None,
        })
}
