//! Lowering from tree-sitter's concrete syntax tree to the expression
//! tree the virtual machine walks.
//!
//! The concrete tree is faithful to the source text: bodies are wrapped
//! in `then`/`do`/`body_statement` containers, operators appear as
//! anonymous tokens and compound assignments keep their surface form.
//! Lowering strips all of that down to a small set of node kinds with
//! fixed child layouts, desugaring along the way: `a += b` becomes an
//! assignment whose value is the `+` call, `a ||= b` an assignment that
//! does not read `a` first, `alias` an `alias_method` call. Constructs
//! with no analysis value are dropped with a debug log rather than
//! failing the file.

use tree_sitter::Node as TsNode;

use crate::ast::{Child, Node, NodeId, NodeKind, SourceLocation};

pub(super) struct Lowerer<'a> {
    source: &'a [u8],
    next_id: u32,
}

impl<'a> Lowerer<'a> {
    pub(super) fn new(source: &'a str) -> Self {
        Self {
            source: source.as_bytes(),
            next_id: 0,
        }
    }

    pub(super) fn lower_program(&mut self, root: TsNode<'_>) -> Node {
        let statements = self.lower_all_named(root);
        self.sequence(statements, root)
    }

    fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn text(&self, ts: TsNode<'_>) -> String {
        ts.utf8_text(self.source).unwrap_or_default().to_owned()
    }

    fn location(&self, ts: TsNode<'_>) -> SourceLocation {
        let position = ts.start_position();
        SourceLocation {
            line: position.row as u32 + 1,
            column: position.column as u32,
        }
    }

    fn make(&mut self, kind: NodeKind, children: Vec<Child>, ts: TsNode<'_>) -> Node {
        Node {
            id: self.fresh(),
            kind,
            children,
            location: self.location(ts),
        }
    }

    fn sequence(&mut self, statements: Vec<Node>, ts: TsNode<'_>) -> Node {
        self.make(
            NodeKind::Begin,
            statements.into_iter().map(Child::Node).collect(),
            ts,
        )
    }

    /// A body position: absent bodies stay absent, single statements stay
    /// bare and longer bodies get a sequence wrapper.
    fn seq_child(&mut self, mut statements: Vec<Node>, ts: TsNode<'_>) -> Child {
        match statements.len() {
            0 => Child::Null,
            1 => Child::Node(statements.remove(0)),
            _ => Child::Node(self.sequence(statements, ts)),
        }
    }

    fn lower_all_named(&mut self, ts: TsNode<'_>) -> Vec<Node> {
        let mut cursor = ts.walk();
        let mut lowered = Vec::new();
        for child in ts.named_children(&mut cursor) {
            if let Some(node) = self.lower(child) {
                lowered.push(node);
            }
        }
        lowered
    }

    fn lower_child(&mut self, ts: Option<TsNode<'_>>) -> Child {
        match ts.and_then(|ts| self.lower(ts)) {
            Some(node) => Child::Node(node),
            None => Child::Null,
        }
    }

    fn seq_from(&mut self, container: TsNode<'_>) -> Child {
        let statements = self.lower_all_named(container);
        self.seq_child(statements, container)
    }

    /// Lowers a body field. Method, class and block bodies arrive inside
    /// container nodes; endless method bodies are a bare expression.
    fn lower_body_field(&mut self, ts: Option<TsNode<'_>>) -> Child {
        let Some(ts) = ts else {
            return Child::Null;
        };
        match ts.kind() {
            "body_statement" => self.lower_body_statement(ts),
            "then" | "do" | "block_body" | "else" => self.seq_from(ts),
            _ => self.lower_child(Some(ts)),
        }
    }

    /// Lowers a `body_statement`, folding trailing `rescue`, `else` and
    /// `ensure` clauses around the statement sequence.
    fn lower_body_statement(&mut self, ts: TsNode<'_>) -> Child {
        let mut statements = Vec::new();
        let mut rescues = Vec::new();
        let mut else_child = Child::Null;
        let mut ensure_child = None;

        let mut cursor = ts.walk();
        for child in ts.named_children(&mut cursor) {
            match child.kind() {
                "rescue" => rescues.push(self.lower_rescue(child)),
                "else" => else_child = self.seq_from(child),
                "ensure" => ensure_child = Some(self.seq_from(child)),
                _ => {
                    if let Some(node) = self.lower(child) {
                        statements.push(node);
                    }
                }
            }
        }

        let mut result = self.seq_child(statements, ts);
        if !rescues.is_empty() || !matches!(else_child, Child::Null) {
            let node = self.make(
                NodeKind::Rescue,
                vec![result, Child::Nodes(rescues), else_child],
                ts,
            );
            result = Child::Node(node);
        }
        if let Some(body) = ensure_child {
            let node = self.make(NodeKind::Ensure, vec![result, body], ts);
            result = Child::Node(node);
        }
        result
    }

    fn lower_rescue(&mut self, ts: TsNode<'_>) -> Node {
        let exceptions = match ts.child_by_field_name("exceptions") {
            Some(list) => self.lower_all_named(list),
            None => Vec::new(),
        };
        let variable = match ts
            .child_by_field_name("variable")
            .and_then(|variable| variable.named_child(0))
        {
            Some(target) => Child::Node(self.lower_assignment_target(target, Child::Null)),
            None => Child::Null,
        };
        let body = self.lower_body_field(ts.child_by_field_name("body"));
        self.make(
            NodeKind::Resbody,
            vec![Child::Nodes(exceptions), variable, body],
            ts,
        )
    }

    fn lower_params(&mut self, ts: Option<TsNode<'_>>) -> Child {
        let Some(ts) = ts else {
            return Child::Null;
        };
        let mut cursor = ts.walk();
        let mut params = Vec::new();
        for child in ts.named_children(&mut cursor) {
            if let Some(node) = self.lower_param(child) {
                params.push(Child::Node(node));
            }
        }
        Child::Node(self.make(NodeKind::Args, params, ts))
    }

    fn lower_param(&mut self, ts: TsNode<'_>) -> Option<Node> {
        let named = |lowerer: &mut Self, field: &str| -> Child {
            match ts.child_by_field_name(field) {
                Some(name) => Child::Name(lowerer.text(name)),
                None => Child::Null,
            }
        };
        match ts.kind() {
            "identifier" => {
                let name = self.text(ts);
                Some(self.make(NodeKind::Arg, vec![Child::Name(name)], ts))
            }
            "optional_parameter" => {
                let name = named(self, "name");
                let value = self.lower_child(ts.child_by_field_name("value"));
                Some(self.make(NodeKind::Optarg, vec![name, value], ts))
            }
            "keyword_parameter" => {
                let name = named(self, "name");
                match ts.child_by_field_name("value") {
                    Some(value) => {
                        let value = self.lower_child(Some(value));
                        Some(self.make(NodeKind::Kwoptarg, vec![name, value], ts))
                    }
                    None => Some(self.make(NodeKind::Kwarg, vec![name], ts)),
                }
            }
            "splat_parameter" => {
                let name = named(self, "name");
                Some(self.make(NodeKind::Restarg, vec![name], ts))
            }
            "hash_splat_parameter" => {
                let name = named(self, "name");
                Some(self.make(NodeKind::Kwrestarg, vec![name], ts))
            }
            "block_parameter" => {
                let name = named(self, "name");
                Some(self.make(NodeKind::Blockarg, vec![name], ts))
            }
            "destructured_parameter" => {
                let mut cursor = ts.walk();
                let mut inner = Vec::new();
                for child in ts.named_children(&mut cursor) {
                    if let Some(node) = self.lower_param(child) {
                        inner.push(Child::Node(node));
                    }
                }
                Some(self.make(NodeKind::Mlhs, inner, ts))
            }
            "hash_splat_nil" | "forward_parameter" => None,
            other => {
                log::debug!("skipping unsupported Ruby parameter node `{other}`");
                None
            }
        }
    }

    /// Lowers the left hand side of an assignment, nesting `value` as the
    /// assigned expression. Multiple assignment targets carry a null
    /// value since their elements cannot be tracked individually.
    fn lower_assignment_target(&mut self, ts: TsNode<'_>, value: Child) -> Node {
        match ts.kind() {
            "identifier" => {
                let name = self.text(ts);
                self.make(NodeKind::Lvasgn, vec![Child::Name(name), value], ts)
            }
            "instance_variable" => {
                let name = self.text(ts);
                self.make(NodeKind::Ivasgn, vec![Child::Name(name), value], ts)
            }
            "class_variable" => {
                let name = self.text(ts);
                self.make(NodeKind::Cvasgn, vec![Child::Name(name), value], ts)
            }
            "global_variable" => {
                let name = self.text(ts);
                self.make(NodeKind::Gvasgn, vec![Child::Name(name), value], ts)
            }
            "constant" => {
                let name = self.text(ts);
                self.make(NodeKind::Casgn, vec![Child::Null, Child::Name(name), value], ts)
            }
            "scope_resolution" => {
                let scope = self.lower_child(ts.child_by_field_name("scope"));
                let name = match ts.child_by_field_name("name") {
                    Some(name) => Child::Name(self.text(name)),
                    None => Child::Null,
                };
                self.make(NodeKind::Casgn, vec![scope, name, value], ts)
            }
            "element_reference" => {
                let (object, mut arguments) = self.element_reference_parts(ts);
                if let Child::Node(node) = value {
                    arguments.push(node);
                }
                self.make(
                    NodeKind::Send,
                    vec![object, Child::Name("[]=".to_owned()), Child::Nodes(arguments)],
                    ts,
                )
            }
            "call" => {
                let receiver = self.lower_child(ts.child_by_field_name("receiver"));
                let method = match ts.child_by_field_name("method") {
                    Some(method) => self.text(method),
                    None => "call".to_owned(),
                };
                let arguments = match value {
                    Child::Node(node) => vec![node],
                    _ => Vec::new(),
                };
                self.make(
                    NodeKind::Send,
                    vec![
                        receiver,
                        Child::Name(format!("{method}=")),
                        Child::Nodes(arguments),
                    ],
                    ts,
                )
            }
            "left_assignment_list" | "destructured_left_assignment" => {
                let mut cursor = ts.walk();
                let mut targets = Vec::new();
                for child in ts.named_children(&mut cursor) {
                    let target = match child.kind() {
                        "rest_assignment" => {
                            let inner = match child.named_child(0) {
                                Some(inner) => {
                                    Child::Node(self.lower_assignment_target(inner, Child::Null))
                                }
                                None => Child::Null,
                            };
                            self.make(NodeKind::Splat, vec![inner], child)
                        }
                        _ => self.lower_assignment_target(child, Child::Null),
                    };
                    targets.push(Child::Node(target));
                }
                let targets = self.make(NodeKind::Mlhs, targets, ts);
                self.make(NodeKind::Masgn, vec![Child::Node(targets), value], ts)
            }
            other => {
                log::debug!("treating unsupported assignment target `{other}` as a local");
                let name = self.text(ts);
                self.make(NodeKind::Lvasgn, vec![Child::Name(name), value], ts)
            }
        }
    }

    fn element_reference_parts(&mut self, ts: TsNode<'_>) -> (Child, Vec<Node>) {
        let object_ts = ts.child_by_field_name("object");
        let object = self.lower_child(object_ts);
        let object_id = object_ts.map(|object| object.id());

        let mut cursor = ts.walk();
        let mut arguments = Vec::new();
        for child in ts.named_children(&mut cursor) {
            if Some(child.id()) == object_id {
                continue;
            }
            if let Some(node) = self.lower(child) {
                arguments.push(node);
            }
        }
        (object, arguments)
    }

    fn block_body_of<'b>(&self, block: TsNode<'b>) -> Option<TsNode<'b>> {
        block.child_by_field_name("body").or_else(|| {
            let mut cursor = block.walk();
            let found = block
                .named_children(&mut cursor)
                .find(|child| matches!(child.kind(), "body_statement" | "block_body"));
            found
        })
    }

    fn attach_block(&mut self, call: Node, ts: TsNode<'_>) -> Node {
        let Some(block) = ts.child_by_field_name("block") else {
            return call;
        };
        let params = self.lower_params(block.child_by_field_name("parameters"));
        let body = self.lower_body_field(self.block_body_of(block));
        self.make(
            NodeKind::Block,
            vec![Child::Node(call), params, body],
            block,
        )
    }

    fn lower_call(&mut self, ts: TsNode<'_>) -> Option<Node> {
        let method = ts.child_by_field_name("method");
        let receiver = self.lower_child(ts.child_by_field_name("receiver"));
        let arguments = match ts.child_by_field_name("arguments") {
            Some(list) => self.lower_all_named(list),
            None => Vec::new(),
        };

        let base = if method.is_some_and(|method| method.kind() == "super") {
            self.make(NodeKind::Super, vec![Child::Nodes(arguments)], ts)
        } else {
            let name = match method {
                Some(method) => self.text(method),
                None => "call".to_owned(),
            };
            let kind = match ts.child_by_field_name("operator") {
                Some(operator) if operator.kind() == "&." => NodeKind::Csend,
                _ => NodeKind::Send,
            };
            self.make(
                kind,
                vec![receiver, Child::Name(name), Child::Nodes(arguments)],
                ts,
            )
        };

        Some(self.attach_block(base, ts))
    }

    fn lower_string(&mut self, ts: TsNode<'_>) -> Node {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut interpolated = false;

        let mut cursor = ts.walk();
        for child in ts.named_children(&mut cursor) {
            match child.kind() {
                "interpolation" => {
                    interpolated = true;
                    let inner = self.lower_all_named(child);
                    parts.extend(inner);
                }
                "string_content" | "heredoc_content" | "escape_sequence" => {
                    let text = self.text(child);
                    literal.push_str(&text);
                    let node = self.make(NodeKind::Str, vec![Child::Str(text)], child);
                    parts.push(node);
                }
                _ => {}
            }
        }

        if interpolated {
            self.make(
                NodeKind::Dstr,
                parts.into_iter().map(Child::Node).collect(),
                ts,
            )
        } else {
            self.make(NodeKind::Str, vec![Child::Str(literal)], ts)
        }
    }

    fn lower_regex(&mut self, ts: TsNode<'_>) -> Node {
        let mut parts = Vec::new();
        let mut cursor = ts.walk();
        for child in ts.named_children(&mut cursor) {
            if child.kind() == "interpolation" {
                parts.extend(self.lower_all_named(child));
            }
        }
        self.make(
            NodeKind::Regexp,
            parts.into_iter().map(Child::Node).collect(),
            ts,
        )
    }

    /// Collects the identifiers a pattern binds so they can be declared
    /// before the clause body runs. Bare identifiers and valueless
    /// keyword patterns bind; everything else is recursed into.
    fn pattern_bindings<'b>(&self, ts: TsNode<'b>, out: &mut Vec<(String, TsNode<'b>)>) {
        match ts.kind() {
            "identifier" => out.push((self.text(ts), ts)),
            "keyword_pattern" => match ts.child_by_field_name("value") {
                Some(value) => self.pattern_bindings(value, out),
                None => {
                    if let Some(key) = ts.child_by_field_name("key") {
                        out.push((self.text(key), key));
                    }
                }
            },
            _ => {
                let mut cursor = ts.walk();
                for child in ts.named_children(&mut cursor) {
                    self.pattern_bindings(child, out);
                }
            }
        }
    }

    fn pattern_binding_nodes(&mut self, pattern: TsNode<'_>) -> Vec<Node> {
        let mut bindings = Vec::new();
        self.pattern_bindings(pattern, &mut bindings);
        bindings
            .into_iter()
            .map(|(name, ts)| {
                self.make(NodeKind::Lvasgn, vec![Child::Name(name), Child::Null], ts)
            })
            .collect()
    }

    fn lower_in_clause(&mut self, ts: TsNode<'_>) -> Node {
        let mut prelude = match ts.child_by_field_name("pattern") {
            Some(pattern) => self.pattern_binding_nodes(pattern),
            None => Vec::new(),
        };
        let body = self.lower_body_field(ts.child_by_field_name("body"));
        let body = if prelude.is_empty() {
            body
        } else {
            if let Child::Node(node) = body {
                prelude.push(node);
            }
            Child::Node(self.sequence(prelude, ts))
        };
        self.make(NodeKind::When, vec![Child::Nodes(Vec::new()), body], ts)
    }

    fn lower_elsif(&mut self, ts: TsNode<'_>) -> Node {
        let condition = self.lower_child(ts.child_by_field_name("condition"));
        let consequence = self.lower_body_field(ts.child_by_field_name("consequence"));
        let alternative = self.lower_alternative(ts.child_by_field_name("alternative"));
        self.make(NodeKind::If, vec![condition, consequence, alternative], ts)
    }

    fn lower_alternative(&mut self, ts: Option<TsNode<'_>>) -> Child {
        match ts {
            None => Child::Null,
            Some(node) if node.kind() == "elsif" => Child::Node(self.lower_elsif(node)),
            Some(node) if node.kind() == "else" => self.seq_from(node),
            Some(node) => self.lower_child(Some(node)),
        }
    }

    fn lower(&mut self, ts: TsNode<'_>) -> Option<Node> {
        match ts.kind() {
            "comment" | "empty_statement" | "heredoc_end" | "redo" | "retry" | "undef"
            | "begin_block" | "end_block" | "forward_argument" => None,

            "program" => Some(self.lower_program(ts)),
            "parenthesized_statements" => {
                let statements = self.lower_all_named(ts);
                match self.seq_child(statements, ts) {
                    Child::Node(node) => Some(node),
                    _ => None,
                }
            }
            "begin" => {
                let inner = {
                    let mut cursor = ts.walk();
                    let mut children = ts.named_children(&mut cursor);
                    match (children.next(), children.next()) {
                        (Some(only), None) if only.kind() == "body_statement" => only,
                        _ => ts,
                    }
                };
                match self.lower_body_statement(inner) {
                    Child::Node(node) => Some(node),
                    _ => None,
                }
            }
            "body_statement" => match self.lower_body_statement(ts) {
                Child::Node(node) => Some(node),
                _ => None,
            },
            "then" | "do" | "block_body" | "else" | "interpolation" | "in" => {
                match self.seq_from(ts) {
                    Child::Node(node) => Some(node),
                    _ => None,
                }
            }

            "class" => {
                let name = self.lower_child(ts.child_by_field_name("name"));
                let superclass = match ts.child_by_field_name("superclass") {
                    Some(clause) => {
                        let inner = if clause.kind() == "superclass" {
                            clause.named_child(0)
                        } else {
                            Some(clause)
                        };
                        self.lower_child(inner)
                    }
                    None => Child::Null,
                };
                let body = self.lower_body_field(ts.child_by_field_name("body"));
                Some(self.make(NodeKind::Class, vec![name, superclass, body], ts))
            }
            "singleton_class" => {
                let value = self.lower_child(ts.child_by_field_name("value"));
                let body = self.lower_body_field(ts.child_by_field_name("body"));
                Some(self.make(NodeKind::Sclass, vec![value, body], ts))
            }
            "module" => {
                let name = self.lower_child(ts.child_by_field_name("name"));
                let body = self.lower_body_field(ts.child_by_field_name("body"));
                Some(self.make(NodeKind::Module, vec![name, body], ts))
            }
            "method" => {
                let name = self.text(ts.child_by_field_name("name")?);
                let params = self.lower_params(ts.child_by_field_name("parameters"));
                let body = self.lower_body_field(ts.child_by_field_name("body"));
                Some(self.make(NodeKind::Def, vec![Child::Name(name), params, body], ts))
            }
            "singleton_method" => {
                let object = self.lower_child(ts.child_by_field_name("object"));
                let name = self.text(ts.child_by_field_name("name")?);
                let params = self.lower_params(ts.child_by_field_name("parameters"));
                let body = self.lower_body_field(ts.child_by_field_name("body"));
                Some(self.make(
                    NodeKind::Defs,
                    vec![object, Child::Name(name), params, body],
                    ts,
                ))
            }

            "identifier" => {
                let name = self.text(ts);
                Some(self.make(NodeKind::Ident, vec![Child::Name(name)], ts))
            }
            "constant" => {
                let name = self.text(ts);
                Some(self.make(NodeKind::Const, vec![Child::Null, Child::Name(name)], ts))
            }
            "scope_resolution" => {
                let scope = self.lower_child(ts.child_by_field_name("scope"));
                let name = match ts.child_by_field_name("name") {
                    Some(name) => Child::Name(self.text(name)),
                    None => Child::Null,
                };
                Some(self.make(NodeKind::Const, vec![scope, name], ts))
            }
            "instance_variable" => {
                let name = self.text(ts);
                Some(self.make(NodeKind::Ivar, vec![Child::Name(name)], ts))
            }
            "class_variable" => {
                let name = self.text(ts);
                Some(self.make(NodeKind::Cvar, vec![Child::Name(name)], ts))
            }
            "global_variable" => {
                let name = self.text(ts);
                Some(self.make(NodeKind::Gvar, vec![Child::Name(name)], ts))
            }
            "self" => Some(self.make(NodeKind::Self_, Vec::new(), ts)),
            "nil" => Some(self.make(NodeKind::Nil, Vec::new(), ts)),
            "true" => Some(self.make(NodeKind::True, Vec::new(), ts)),
            "false" => Some(self.make(NodeKind::False, Vec::new(), ts)),

            "integer" => {
                let value = parse_integer(&self.text(ts));
                Some(self.make(NodeKind::Int, vec![Child::Int(value)], ts))
            }
            "float" => {
                let text: String = self.text(ts).chars().filter(|c| *c != '_').collect();
                let value = text.parse::<f64>().unwrap_or(0.0);
                Some(self.make(NodeKind::Float, vec![Child::Float(value)], ts))
            }
            "rational" | "complex" => Some(self.make(NodeKind::Float, vec![Child::Float(0.0)], ts)),
            "character" => {
                let text = self.text(ts);
                let content = text.strip_prefix('?').unwrap_or(&text).to_owned();
                Some(self.make(NodeKind::Str, vec![Child::Str(content)], ts))
            }
            "string" | "subshell" | "heredoc_body" => Some(self.lower_string(ts)),
            "heredoc_beginning" => {
                Some(self.make(NodeKind::Str, vec![Child::Str(String::new())], ts))
            }
            "chained_string" => {
                let parts = self.lower_all_named(ts);
                Some(self.make(
                    NodeKind::Dstr,
                    parts.into_iter().map(Child::Node).collect(),
                    ts,
                ))
            }
            "regex" => Some(self.lower_regex(ts)),
            "simple_symbol" => {
                let text = self.text(ts);
                let name = text.strip_prefix(':').unwrap_or(&text).to_owned();
                Some(self.make(NodeKind::Sym, vec![Child::Name(name)], ts))
            }
            "hash_key_symbol" => {
                let name = self.text(ts);
                Some(self.make(NodeKind::Sym, vec![Child::Name(name)], ts))
            }
            "delimited_symbol" => {
                let mut name = String::new();
                let mut cursor = ts.walk();
                for child in ts.named_children(&mut cursor) {
                    if matches!(child.kind(), "string_content" | "escape_sequence") {
                        name.push_str(&self.text(child));
                    }
                }
                Some(self.make(NodeKind::Sym, vec![Child::Name(name)], ts))
            }
            "string_array" => {
                let mut cursor = ts.walk();
                let mut elements = Vec::new();
                for child in ts.named_children(&mut cursor) {
                    let text = self.text(child);
                    elements.push(Child::Node(self.make(
                        NodeKind::Str,
                        vec![Child::Str(text)],
                        child,
                    )));
                }
                Some(self.make(NodeKind::Array, elements, ts))
            }
            "symbol_array" => {
                let mut cursor = ts.walk();
                let mut elements = Vec::new();
                for child in ts.named_children(&mut cursor) {
                    let name = self.text(child);
                    elements.push(Child::Node(self.make(
                        NodeKind::Sym,
                        vec![Child::Name(name)],
                        child,
                    )));
                }
                Some(self.make(NodeKind::Array, elements, ts))
            }

            "array" => {
                let elements = self.lower_all_named(ts);
                Some(self.make(
                    NodeKind::Array,
                    elements.into_iter().map(Child::Node).collect(),
                    ts,
                ))
            }
            "right_assignment_list" => {
                let elements = self.lower_all_named(ts);
                Some(self.make(
                    NodeKind::Array,
                    elements.into_iter().map(Child::Node).collect(),
                    ts,
                ))
            }
            "hash" => {
                let entries = self.lower_all_named(ts);
                Some(self.make(
                    NodeKind::Hash,
                    entries.into_iter().map(Child::Node).collect(),
                    ts,
                ))
            }
            "pair" => {
                let key_ts = ts.child_by_field_name("key");
                let key = self.lower_child(key_ts);
                let value = match ts.child_by_field_name("value") {
                    Some(value) => self.lower_child(Some(value)),
                    // `{name:}` shorthand reads the local of the same name.
                    None => match key_ts {
                        Some(key_ts) if key_ts.kind() == "hash_key_symbol" => {
                            let name = self.text(key_ts);
                            Child::Node(self.make(
                                NodeKind::Ident,
                                vec![Child::Name(name)],
                                key_ts,
                            ))
                        }
                        _ => Child::Null,
                    },
                };
                Some(self.make(NodeKind::Pair, vec![key, value], ts))
            }
            "splat_argument" => {
                let inner = self.lower_child(ts.named_child(0));
                Some(self.make(NodeKind::Splat, vec![inner], ts))
            }
            "hash_splat_argument" => {
                let inner = self.lower_child(ts.named_child(0));
                Some(self.make(NodeKind::Kwsplat, vec![inner], ts))
            }
            "block_argument" => {
                let inner = self.lower_child(ts.named_child(0));
                Some(self.make(NodeKind::BlockPass, vec![inner], ts))
            }
            "range" => {
                let mut exclusive = false;
                let mut lower = Child::Null;
                let mut upper = Child::Null;
                let mut seen_operator = false;
                let mut cursor = ts.walk();
                for child in ts.children(&mut cursor) {
                    match child.kind() {
                        ".." => seen_operator = true,
                        "..." => {
                            seen_operator = true;
                            exclusive = true;
                        }
                        _ if child.is_named() => {
                            let side = self.lower_child(Some(child));
                            if seen_operator {
                                upper = side;
                            } else {
                                lower = side;
                            }
                        }
                        _ => {}
                    }
                }
                let kind = if exclusive {
                    NodeKind::Erange
                } else {
                    NodeKind::Irange
                };
                Some(self.make(kind, vec![lower, upper], ts))
            }

            "assignment" => {
                let value = self.lower_child(ts.child_by_field_name("right"));
                let left = ts.child_by_field_name("left")?;
                Some(self.lower_assignment_target(left, value))
            }
            "operator_assignment" => {
                let left = ts.child_by_field_name("left")?;
                let operator = ts
                    .child_by_field_name("operator")
                    .map(|operator| operator.kind().to_owned())
                    .unwrap_or_default();
                let right = self.lower_child(ts.child_by_field_name("right"));

                // `a ||= b` and `a &&= b` only assign; the other compound
                // operators read the target first.
                let value = if operator == "||=" || operator == "&&=" {
                    right
                } else {
                    let read = self.lower_child(Some(left));
                    let method = operator.trim_end_matches('=').to_owned();
                    let arguments = match right {
                        Child::Node(node) => vec![node],
                        _ => Vec::new(),
                    };
                    Child::Node(self.make(
                        NodeKind::Send,
                        vec![read, Child::Name(method), Child::Nodes(arguments)],
                        ts,
                    ))
                };
                Some(self.lower_assignment_target(left, value))
            }

            "binary" => {
                let left = self.lower_child(ts.child_by_field_name("left"));
                let right = self.lower_child(ts.child_by_field_name("right"));
                let operator = ts
                    .child_by_field_name("operator")
                    .map(|operator| operator.kind().to_owned())
                    .unwrap_or_default();
                match operator.as_str() {
                    "&&" | "and" => Some(self.make(NodeKind::And, vec![left, right], ts)),
                    "||" | "or" => Some(self.make(NodeKind::Or, vec![left, right], ts)),
                    _ => {
                        let arguments = match right {
                            Child::Node(node) => vec![node],
                            _ => Vec::new(),
                        };
                        Some(self.make(
                            NodeKind::Send,
                            vec![left, Child::Name(operator), Child::Nodes(arguments)],
                            ts,
                        ))
                    }
                }
            }
            "unary" => {
                let operator = ts.child(0).map(|op| op.kind()).unwrap_or_default();
                if operator == "defined?" {
                    // The operand is only existence-checked, never read.
                    return Some(self.make(
                        NodeKind::Send,
                        vec![
                            Child::Null,
                            Child::Name("defined?".to_owned()),
                            Child::Nodes(Vec::new()),
                        ],
                        ts,
                    ));
                }
                let method = match operator {
                    "-" => "-@".to_owned(),
                    "+" => "+@".to_owned(),
                    "not" => "!".to_owned(),
                    other => other.to_owned(),
                };
                let count = ts.named_child_count();
                let operand = self.lower_child(ts.named_child(count.checked_sub(1)?));
                Some(self.make(
                    NodeKind::Send,
                    vec![operand, Child::Name(method), Child::Nodes(Vec::new())],
                    ts,
                ))
            }

            "call" => self.lower_call(ts),
            "element_reference" => {
                let (object, arguments) = self.element_reference_parts(ts);
                Some(self.make(
                    NodeKind::Send,
                    vec![object, Child::Name("[]".to_owned()), Child::Nodes(arguments)],
                    ts,
                ))
            }
            "lambda" => {
                let call = self.make(
                    NodeKind::Send,
                    vec![
                        Child::Null,
                        Child::Name("lambda".to_owned()),
                        Child::Nodes(Vec::new()),
                    ],
                    ts,
                );
                let body_field = ts.child_by_field_name("body");
                let (params_ts, body_ts) = match body_field {
                    Some(block) if matches!(block.kind(), "block" | "do_block") => (
                        ts.child_by_field_name("parameters")
                            .or_else(|| block.child_by_field_name("parameters")),
                        self.block_body_of(block),
                    ),
                    other => (ts.child_by_field_name("parameters"), other),
                };
                let params = self.lower_params(params_ts);
                let body = self.lower_body_field(body_ts);
                Some(self.make(
                    NodeKind::Block,
                    vec![Child::Node(call), params, body],
                    ts,
                ))
            }
            "super" => Some(self.make(NodeKind::Super, vec![Child::Nodes(Vec::new())], ts)),
            "yield" => {
                let arguments = match ts.named_child(0) {
                    Some(list) if list.kind() == "argument_list" => self.lower_all_named(list),
                    Some(_) => self.lower_all_named(ts),
                    None => Vec::new(),
                };
                Some(self.make(NodeKind::Yield, vec![Child::Nodes(arguments)], ts))
            }
            "return" | "break" | "next" => {
                let values = match ts.named_child(0) {
                    Some(list) if list.kind() == "argument_list" => self.lower_all_named(list),
                    Some(_) => self.lower_all_named(ts),
                    None => Vec::new(),
                };
                let kind = match ts.kind() {
                    "return" => NodeKind::Return,
                    "break" => NodeKind::Break,
                    _ => NodeKind::Next,
                };
                Some(self.make(kind, values.into_iter().map(Child::Node).collect(), ts))
            }

            "conditional" => {
                let condition = self.lower_child(ts.child_by_field_name("condition"));
                let consequence = self.lower_child(ts.child_by_field_name("consequence"));
                let alternative = self.lower_child(ts.child_by_field_name("alternative"));
                Some(self.make(
                    NodeKind::If,
                    vec![condition, consequence, alternative],
                    ts,
                ))
            }
            "if" | "unless" => {
                let condition = self.lower_child(ts.child_by_field_name("condition"));
                let consequence = self.lower_body_field(ts.child_by_field_name("consequence"));
                let alternative = self.lower_alternative(ts.child_by_field_name("alternative"));
                Some(self.make(
                    NodeKind::If,
                    vec![condition, consequence, alternative],
                    ts,
                ))
            }
            "elsif" => Some(self.lower_elsif(ts)),
            "if_modifier" | "unless_modifier" => {
                let condition = self.lower_child(ts.child_by_field_name("condition"));
                let body = self.lower_child(ts.child_by_field_name("body"));
                Some(self.make(NodeKind::If, vec![condition, body, Child::Null], ts))
            }
            "while" | "until" | "while_modifier" | "until_modifier" => {
                let condition = self.lower_child(ts.child_by_field_name("condition"));
                let body = self.lower_body_field(ts.child_by_field_name("body"));
                let kind = if ts.kind().starts_with("while") {
                    NodeKind::While
                } else {
                    NodeKind::Until
                };
                Some(self.make(kind, vec![condition, body], ts))
            }
            "for" => {
                let target = match ts.child_by_field_name("pattern") {
                    Some(pattern) => {
                        Child::Node(self.lower_assignment_target(pattern, Child::Null))
                    }
                    None => Child::Null,
                };
                let iterable = match ts.child_by_field_name("value") {
                    Some(value) if value.kind() == "in" => self.lower_child(value.named_child(0)),
                    other => self.lower_child(other),
                };
                let body = self.lower_body_field(ts.child_by_field_name("body"));
                Some(self.make(NodeKind::For, vec![target, iterable, body], ts))
            }
            "case" => {
                let subject = self.lower_child(ts.child_by_field_name("value"));
                let mut whens = Vec::new();
                let mut else_child = Child::Null;
                let mut cursor = ts.walk();
                for child in ts.named_children(&mut cursor) {
                    match child.kind() {
                        "when" => {
                            let mut pattern_cursor = child.walk();
                            let patterns: Vec<_> = child
                                .children_by_field_name("pattern", &mut pattern_cursor)
                                .collect();
                            let mut lowered = Vec::new();
                            for pattern in patterns {
                                if let Some(node) = self.lower(pattern) {
                                    lowered.push(node);
                                }
                            }
                            let body = self.lower_body_field(child.child_by_field_name("body"));
                            whens.push(self.make(
                                NodeKind::When,
                                vec![Child::Nodes(lowered), body],
                                child,
                            ));
                        }
                        "else" => else_child = self.seq_from(child),
                        _ => {}
                    }
                }
                Some(self.make(
                    NodeKind::Case,
                    vec![subject, Child::Nodes(whens), else_child],
                    ts,
                ))
            }
            "case_match" => {
                let subject = self.lower_child(ts.child_by_field_name("value"));
                let mut clauses = Vec::new();
                let mut else_child = Child::Null;
                let mut cursor = ts.walk();
                let children: Vec<_> = ts.named_children(&mut cursor).collect();
                for child in children {
                    match child.kind() {
                        "in_clause" => clauses.push(self.lower_in_clause(child)),
                        "else" => else_child = self.seq_from(child),
                        _ => {}
                    }
                }
                Some(self.make(
                    NodeKind::Case,
                    vec![subject, Child::Nodes(clauses), else_child],
                    ts,
                ))
            }
            "match_pattern" | "test_pattern" => {
                let value = self.lower_child(ts.child_by_field_name("value"));
                let mut parts = Vec::new();
                if let Child::Node(node) = value {
                    parts.push(node);
                }
                if let Some(pattern) = ts.child_by_field_name("pattern") {
                    parts.extend(self.pattern_binding_nodes(pattern));
                }
                Some(self.sequence(parts, ts))
            }

            "rescue_modifier" => {
                let body = self.lower_child(ts.child_by_field_name("body"));
                let handler_body = self.lower_child(ts.child_by_field_name("handler"));
                let handler = self.make(
                    NodeKind::Resbody,
                    vec![Child::Nodes(Vec::new()), Child::Null, handler_body],
                    ts,
                );
                Some(self.make(
                    NodeKind::Rescue,
                    vec![body, Child::Nodes(vec![handler]), Child::Null],
                    ts,
                ))
            }
            "alias" => {
                let mut names = Vec::new();
                let mut cursor = ts.walk();
                for child in ts.named_children(&mut cursor) {
                    let text = self.text(child);
                    let name = text.strip_prefix(':').unwrap_or(&text).to_owned();
                    names.push((name, child));
                }
                let arguments = names
                    .into_iter()
                    .map(|(name, child)| self.make(NodeKind::Sym, vec![Child::Name(name)], child))
                    .collect();
                Some(self.make(
                    NodeKind::Send,
                    vec![
                        Child::Null,
                        Child::Name("alias_method".to_owned()),
                        Child::Nodes(arguments),
                    ],
                    ts,
                ))
            }

            other => {
                log::debug!("skipping unsupported Ruby syntax node `{other}`");
                None
            }
        }
    }
}

fn parse_integer(text: &str) -> i64 {
    let cleaned: String = text.chars().filter(|c| *c != '_').collect();
    let (digits, radix) = if let Some(rest) = cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        (rest, 16)
    } else if let Some(rest) = cleaned
        .strip_prefix("0b")
        .or_else(|| cleaned.strip_prefix("0B"))
    {
        (rest, 2)
    } else if let Some(rest) = cleaned
        .strip_prefix("0o")
        .or_else(|| cleaned.strip_prefix("0O"))
    {
        (rest, 8)
    } else {
        (cleaned.as_str(), 10)
    };
    i64::from_str_radix(digits, radix).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::parse_integer;

    #[test]
    fn integer_literals_cover_every_radix() {
        assert_eq!(parse_integer("42"), 42);
        assert_eq!(parse_integer("1_000_000"), 1_000_000);
        assert_eq!(parse_integer("0xff"), 255);
        assert_eq!(parse_integer("0b1010"), 10);
        assert_eq!(parse_integer("0o17"), 15);
    }

    #[test]
    fn unparseable_integers_degrade_to_zero() {
        assert_eq!(parse_integer("0xzz"), 0);
    }
}
