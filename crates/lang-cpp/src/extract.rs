use codegraph_api::{ElementType, Scope};
use codegraph_plugin::utils::{named_children, node_range, node_text};
use codegraph_plugin::{Element, FileElement};
use tree_sitter::Node;

#[derive(Clone, Copy)]
struct Context {
    scope: Scope,
    enclosing: Option<[i32; 4]>,
    /// Directly inside a class, struct or union body.
    in_class: bool,
}

impl Context {
    const FILE: Context = Context {
        scope: Scope::File,
        enclosing: None,
        in_class: false,
    };

    fn local(span: [i32; 4], scope: Scope) -> Context {
        Context {
            scope,
            enclosing: Some(span),
            in_class: false,
        }
    }
}

/// Recursive walk over a C++ translation unit.
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
            "namespace_definition" => {
                // Namespace members stay visible at file scope.
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(ElementType::Namespace, name, node_range(node), ctx);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_children(body, ctx);
                }
            }
            "template_declaration" => {
                let params = node.child_by_field_name("parameters");
                for child in named_children(node) {
                    if Some(child) != params {
                        self.visit(child, ctx);
                    }
                }
            }
            "function_definition" => self.function(node, ctx),
            "declaration" => self.declaration(node, ctx),
            "field_declaration" if ctx.in_class => self.member(node, ctx),
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
            "alias_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(ElementType::Typedef, name, node_range(name), ctx);
                }
                if let Some(ty) = node.child_by_field_name("type") {
                    self.visit(ty, ctx);
                }
            }
            "class_specifier" | "struct_specifier" | "union_specifier" => self.class(node, ctx),
            "enum_specifier" => self.enumeration(node, ctx),
            "preproc_def" | "preproc_function_def" => {
                if let Some(name) = node.child_by_field_name("name") {
                    self.define(ElementType::Macro, name, node_range(name), ctx);
                }
            }
            "compound_statement" | "for_statement" if ctx.scope.is_local() => {
                self.visit_children(node, Context::local(node_range(node), Scope::Block));
            }
            "for_range_loop" => {
                let block = Context::local(node_range(node), Scope::Block);
                if let Some(ty) = node.child_by_field_name("type") {
                    self.visit(ty, ctx);
                }
                if let Some(name) = node
                    .child_by_field_name("declarator")
                    .and_then(declarator_name)
                {
                    self.define(ElementType::Variable, name, node_range(name), block);
                }
                if let Some(right) = node.child_by_field_name("right") {
                    self.visit(right, ctx);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_children(body, block);
                }
            }
            "lambda_expression" => {
                let inner = Context::local(node_range(node), Scope::Function);
                let params = node
                    .child_by_field_name("declarator")
                    .and_then(|d| d.child_by_field_name("parameters"));
                if let Some(params) = params {
                    self.parameters(params, ctx, inner);
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.visit_children(body, inner);
                }
            }
            "call_expression" => self.call(node, ctx),
            "field_expression" => {
                let argument = node.child_by_field_name("argument");
                if let Some(argument) = argument {
                    self.visit(argument, ctx);
                }
                if let Some(field) = node.child_by_field_name("field").and_then(member_name) {
                    let receiver = argument.map(|a| node_text(a, self.source).to_string());
                    self.reference(ElementType::Reference, field, receiver, ctx);
                }
            }
            "qualified_identifier" => {
                let (scope, name) = split_qualified(node, self.source);
                if let Some(name) = name {
                    self.reference(ElementType::Reference, name, scope, ctx);
                }
            }
            "identifier" | "type_identifier" => {
                self.reference(ElementType::Reference, node, None, ctx)
            }
            // Includes are collected by query.
            "preproc_include" | "using_declaration" | "namespace_alias_definition" | "comment"
            | "string_literal" | "raw_string_literal" | "char_literal" => {}
            _ => self.visit_children(node, ctx),
        }
    }

    /// Function bodies. Inside a class body, or named `A::f`, they are
    /// methods.
    fn function(&mut self, node: Node, ctx: Context) {
        let span = node_range(node);
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, ctx);
        }
        let declarator = node.child_by_field_name("declarator");
        let function = declarator.and_then(function_declarator);
        if let Some(name) = declarator.and_then(declarator_name) {
            let qualified = function
                .and_then(|f| f.child_by_field_name("declarator"))
                .is_some_and(|d| d.kind() == "qualified_identifier");
            let kind = if ctx.in_class || qualified {
                ElementType::Method
            } else {
                ElementType::Function
            };
            self.define(kind, name, span, ctx);
        }

        let inner = Context::local(span, Scope::Function);
        if let Some(params) = function.and_then(|f| f.child_by_field_name("parameters")) {
            self.parameters(params, ctx, inner);
        }
        for child in named_children(node) {
            if child.kind() == "field_initializer_list" {
                self.visit_children(child, inner);
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.visit_children(body, inner);
        }
    }

    /// Parameters bind in `inner`; their types and defaults are read in
    /// `outer`.
    fn parameters(&mut self, params: Node, outer: Context, inner: Context) {
        for param in named_children(params) {
            if !matches!(
                param.kind(),
                "parameter_declaration" | "optional_parameter_declaration"
            ) {
                continue;
            }
            if let Some(ty) = param.child_by_field_name("type") {
                self.visit(ty, outer);
            }
            let name = param
                .child_by_field_name("declarator")
                .and_then(declarator_name);
            if let Some(name) = name {
                self.define(ElementType::Parameter, name, node_range(name), inner);
            }
            if let Some(value) = param.child_by_field_name("default_value") {
                self.visit(value, outer);
            }
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
                let kind = if ctx.in_class {
                    ElementType::Method
                } else {
                    ElementType::Function
                };
                self.define(kind, name, node_range(node), ctx);
                continue;
            }
            self.define(ElementType::Variable, name, node_range(name), ctx);
            if let Some(value) = declarator.child_by_field_name("value") {
                self.visit(value, ctx);
            }
        }
    }

    /// A declaration inside a class body: a method declaration or fields.
    fn member(&mut self, node: Node, ctx: Context) {
        if let Some(ty) = node.child_by_field_name("type") {
            self.visit(ty, ctx);
        }
        for declarator in declarators(node) {
            let Some(name) = declarator_name(declarator) else {
                continue;
            };
            if function_declarator(declarator).is_some() {
                self.define(ElementType::Method, name, node_range(node), ctx);
            } else {
                self.define(ElementType::Field, name, node_range(name), ctx);
            }
        }
        if let Some(value) = node.child_by_field_name("default_value") {
            self.visit(value, ctx);
        }
    }

    /// `class`, `struct` and `union` specifiers. With a body they define the
    /// type, without one they refer to it.
    fn class(&mut self, node: Node, ctx: Context) {
        let name = node.child_by_field_name("name");
        let Some(body) = node.child_by_field_name("body") else {
            if let Some(name) = name {
                self.visit(name, ctx);
            }
            return;
        };

        let span = node_range(node);
        let kind = match node.kind() {
            "class_specifier" => ElementType::Class,
            "union_specifier" => ElementType::Union,
            _ => ElementType::Struct,
        };
        if let Some(name) = name.and_then(declarator_name) {
            self.define(kind, name, span, ctx);
        }
        for child in named_children(node) {
            if child.kind() == "base_class_clause" {
                self.visit_children(child, ctx);
            }
        }

        let members = Context {
            scope: Scope::Class,
            enclosing: Some(span),
            in_class: true,
        };
        self.visit_children(body, members);
    }

    fn enumeration(&mut self, node: Node, ctx: Context) {
        let name = node.child_by_field_name("name");
        let Some(body) = node.child_by_field_name("body") else {
            if let Some(name) = name {
                self.visit(name, ctx);
            }
            return;
        };
        if let Some(name) = name.and_then(declarator_name) {
            self.define(ElementType::Enum, name, node_range(node), ctx);
        }
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
    }

    fn call(&mut self, node: Node, ctx: Context) {
        if let Some(function) = node.child_by_field_name("function") {
            match function.kind() {
                "identifier" => self.reference(ElementType::CallFunction, function, None, ctx),
                "template_function" => match function.child_by_field_name("name") {
                    Some(name) => self.reference(ElementType::CallFunction, name, None, ctx),
                    None => self.visit(function, ctx),
                },
                "field_expression" => {
                    let argument = function.child_by_field_name("argument");
                    if let Some(argument) = argument {
                        self.visit(argument, ctx);
                    }
                    let field = function.child_by_field_name("field").and_then(member_name);
                    if let Some(field) = field {
                        let receiver = argument.map(|a| node_text(a, self.source).to_string());
                        self.reference(ElementType::CallMethod, field, receiver, ctx);
                    }
                }
                "qualified_identifier" => {
                    let (scope, name) = split_qualified(function, self.source);
                    if let Some(name) = name {
                        let kind = if scope.is_some() {
                            ElementType::CallMethod
                        } else {
                            ElementType::CallFunction
                        };
                        self.reference(kind, name, scope, ctx);
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

/// The name a declarator introduces: `*buf[4]`, `&ref`, `x = 1`, `A::f`,
/// `~A`, `operator==`.
fn declarator_name(node: Node) -> Option<Node> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" | "destructor_name"
        | "operator_name" => Some(node),
        "pointer_declarator" | "array_declarator" | "function_declarator" | "init_declarator" => node
            .child_by_field_name("declarator")
            .and_then(declarator_name),
        "qualified_identifier" | "template_function" | "template_type" => node
            .child_by_field_name("name")
            .and_then(declarator_name),
        "reference_declarator" | "parenthesized_declarator" | "attributed_declarator" => {
            named_children(node).into_iter().find_map(declarator_name)
        }
        _ => None,
    }
}

/// The function declarator of a function, method or prototype. Function
/// pointers such as `(*cb)(int)` do not count.
fn function_declarator(node: Node) -> Option<Node> {
    match node.kind() {
        "function_declarator" => node
            .child_by_field_name("declarator")
            .filter(|inner| {
                matches!(
                    inner.kind(),
                    "identifier"
                        | "field_identifier"
                        | "qualified_identifier"
                        | "destructor_name"
                        | "operator_name"
                        | "template_function"
                )
            })
            .map(|_| node),
        "pointer_declarator" | "reference_declarator" => {
            named_children(node).into_iter().find_map(function_declarator)
        }
        _ => None,
    }
}

/// The name node of a member access: `f` in `o.f` and `o.template f<T>`.
fn member_name(node: Node) -> Option<Node> {
    match node.kind() {
        "template_method" => node.child_by_field_name("name"),
        _ => Some(node),
    }
}

/// Splits `a::b::f` into the scope text `a::b` and the innermost name node.
/// A leading `::` yields no scope.
fn split_qualified<'t>(node: Node<'t>, source: &[u8]) -> (Option<String>, Option<Node<'t>>) {
    let mut scopes = Vec::new();
    let mut current = node;
    while current.kind() == "qualified_identifier" {
        if let Some(scope) = current.child_by_field_name("scope") {
            scopes.push(node_text(scope, source).to_string());
        }
        match current.child_by_field_name("name") {
            Some(name) => current = name,
            None => return (None, None),
        }
    }
    let name = match current.kind() {
        "template_function" | "template_type" | "template_method" => {
            current.child_by_field_name("name")
        }
        _ => Some(current),
    };
    let scope = (!scopes.is_empty()).then(|| scopes.join("::"));
    (scope, name)
}
