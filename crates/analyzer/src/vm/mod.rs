//! The virtual machine that symbolically executes a lowered source file.
//!
//! One walk over the tree builds the whole definition graph. Scope
//! changing constructs are handled on their enter events, so children
//! are processed inside the scope they belong to; everything that needs
//! a child's resolved value is handled on leave events, where the
//! post-order guarantee means each child has already been resolved and
//! recorded in the association table.
//!
//! Name resolution failures are deliberately not errors here. The
//! machine only refuses trees whose shape is structurally wrong, for
//! example parameters appearing outside of a method; the first such
//! violation is remembered and surfaced when the walk finishes.

mod builders;

pub(crate) use builders::constant_path;

use rustc_hash::FxHashMap;

use crate::ast::{Child, Node, NodeId, NodeKind, Observer};
use crate::error::AnalyzerError;
use crate::graph::{DefKind, Definition, DefinitionGraph, DefinitionId, Visibility};
use crate::ruby::ParsedSource;
use crate::walker::{WalkState, Walker};

/// Whether `def` currently produces instance or class methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodContext {
    Instance,
    Class,
}

/// The outcome of a completed walk: the definition graph plus the
/// mapping from syntax nodes to the definitions they resolved to.
#[derive(Debug)]
pub struct Evaluation {
    pub graph: DefinitionGraph,
    associations: FxHashMap<NodeId, DefinitionId>,
}

impl Evaluation {
    pub fn association(&self, node: &Node) -> Option<DefinitionId> {
        self.associations.get(&node.id).copied()
    }
}

pub struct VirtualMachine {
    graph: DefinitionGraph,
    scopes: Vec<DefinitionId>,
    method_contexts: Vec<MethodContext>,
    visibilities: Vec<Visibility>,
    param_targets: Vec<DefinitionId>,
    associations: FxHashMap<NodeId, DefinitionId>,
    error: Option<AnalyzerError>,
}

impl VirtualMachine {
    /// The graph should already contain the built-in seed definitions;
    /// the machine itself only adds what the source defines.
    pub fn new(graph: DefinitionGraph) -> Self {
        let root = graph.root();
        Self {
            graph,
            scopes: vec![root],
            method_contexts: vec![MethodContext::Instance],
            visibilities: vec![Visibility::Public],
            param_targets: Vec::new(),
            associations: FxHashMap::default(),
            error: None,
        }
    }

    pub fn run(mut self, parsed: &ParsedSource) -> Result<Evaluation, AnalyzerError> {
        let mut state = WalkState::new(parsed.file.display().to_string());
        {
            let mut walker = Walker::new();
            walker.bind(&mut self);
            walker.walk(&parsed.root, &mut state);
        }

        if let Some(error) = self.error.take() {
            return Err(error);
        }
        Ok(Evaluation {
            graph: self.graph,
            associations: self.associations,
        })
    }

    fn current_scope(&self) -> DefinitionId {
        self.scopes
            .last()
            .copied()
            .unwrap_or_else(|| self.graph.root())
    }

    fn nearest_constant_scope(&self) -> DefinitionId {
        self.graph.nearest_constant_scope(&self.scopes)
    }

    fn method_context(&self) -> MethodContext {
        self.method_contexts
            .last()
            .copied()
            .unwrap_or(MethodContext::Instance)
    }

    fn current_visibility(&self) -> Visibility {
        self.visibilities
            .last()
            .copied()
            .unwrap_or(Visibility::Public)
    }

    fn associate(&mut self, node: &Node, id: DefinitionId) {
        self.associations.insert(node.id, id);
    }

    fn association_of(&self, node: &Node) -> Option<DefinitionId> {
        self.associations.get(&node.id).copied()
    }

    fn record_malformed(&mut self, node: &Node, reason: &str) {
        if self.error.is_none() {
            self.error = Some(AnalyzerError::MalformedNode {
                kind: node.kind.name(),
                line: node.location.line,
                column: node.location.column,
                reason: reason.to_owned(),
            });
        }
    }

    fn resolve_constant(&self, name: &str) -> Option<DefinitionId> {
        self.graph.resolve_constant(&self.scopes, name)
    }

    fn resolve_constant_path(&self, path: &[String]) -> Option<DefinitionId> {
        let (first, rest) = path.split_first()?;
        let mut id = self.resolve_constant(first)?;
        for segment in rest {
            id = self.graph.lookup(id, DefKind::Const, segment)?;
        }
        Some(id)
    }

    fn builtin(&self, name: &str) -> Option<DefinitionId> {
        let root = self.graph.root();
        self.graph.lookup(root, DefKind::Const, name)
    }

    /// Associates a literal node with the instance companion of the
    /// built-in class backing it.
    fn literal_instance(&mut self, node: &Node, class_name: &str) {
        if let Some(class) = self.builtin(class_name) {
            let companion = self.graph.instance_of(class);
            self.associate(node, companion);
        }
    }

    fn resolve_bare_method(&self, name: &str) -> Option<DefinitionId> {
        self.graph.resolve_bare_method(&self.scopes, name)
    }

    fn define_param(&mut self, node: &Node, kind: DefKind) {
        let Some(target) = self.param_targets.last().copied() else {
            self.record_malformed(node, "parameter outside of a parameter list");
            return;
        };
        // Anonymous rest and block parameters bind nothing.
        let Some(name) = node.name(0) else {
            return;
        };
        let definition = Definition::named(kind, name).with_location(node.location);
        let (id, _) = self.graph.define(target, definition);
        self.associate(node, id);
    }

    fn link_param_default(&mut self, node: &Node) {
        let Some(param) = self.association_of(node) else {
            return;
        };
        let Some(default) = node.node(1).and_then(|value| self.association_of(value)) else {
            return;
        };
        self.graph.get_mut(param).value = Some(default);
    }

    fn assign_variable(&mut self, node: &Node, kind: DefKind, scope: DefinitionId) {
        let Some(name) = node.name(0) else {
            self.record_malformed(node, "an assignment needs a target name");
            return;
        };
        let value = node.node(1).and_then(|value| self.association_of(value));
        let mut definition = Definition::named(kind, name).with_location(node.location);
        definition.value = value;
        let (id, _) = self.graph.define(scope, definition);
        self.associate(node, id);
    }

    fn read_variable(&mut self, node: &Node, kind: DefKind, scope: DefinitionId) {
        let Some(name) = node.name(0) else {
            return;
        };
        if let Some(id) = self.graph.lookup(scope, kind, name) {
            self.graph.add_reference(id);
            self.associate(node, id);
        }
    }

    /// Name of a symbol or string literal argument.
    fn literal_name<'n>(&self, node: &'n Node) -> Option<&'n str> {
        match node.kind {
            NodeKind::Sym => node.name(0),
            NodeKind::Str => match node.children.first() {
                Some(Child::Str(text)) => Some(text),
                _ => None,
            },
            _ => None,
        }
    }

    fn visibility_named(name: &str) -> Option<Visibility> {
        match name {
            "private" => Some(Visibility::Private),
            "protected" => Some(Visibility::Protected),
            "public" => Some(Visibility::Public),
            _ => None,
        }
    }

    fn define_attributes(&mut self, node: &Node, directive: &str) {
        let scope = self.nearest_constant_scope();
        let visibility = self.current_visibility();
        let reader = matches!(directive, "attr_reader" | "attr_accessor" | "attr");
        let writer = matches!(directive, "attr_writer" | "attr_accessor");

        for argument in node.nodes(2).unwrap_or(&[]) {
            let Some(attribute) = self.literal_name(argument).map(str::to_owned) else {
                continue;
            };
            if reader {
                let definition = Definition::named(DefKind::InstanceMethod, &attribute)
                    .with_location(argument.location)
                    .with_visibility(visibility);
                self.graph.define(scope, definition);
            }
            if writer {
                let definition =
                    Definition::named(DefKind::InstanceMethod, format!("{attribute}="))
                        .with_location(argument.location)
                        .with_visibility(visibility);
                let (setter, _) = self.graph.define(scope, definition);
                self.graph
                    .define(setter, Definition::named(DefKind::Arg, "value"));
            }
        }
    }

    fn mix_in(&mut self, node: &Node) {
        let scope = self.nearest_constant_scope();
        for argument in node.nodes(2).unwrap_or(&[]) {
            if argument.kind != NodeKind::Const {
                continue;
            }
            if let Some(module) = self.association_of(argument) {
                self.graph.prepend_parent(scope, module);
            }
        }
    }

    fn apply_visibility(&mut self, node: &Node, visibility: Visibility) {
        let arguments = node.nodes(2).unwrap_or(&[]);
        if arguments.is_empty() {
            if let Some(top) = self.visibilities.last_mut() {
                *top = visibility;
            }
            return;
        }

        let scope = self.nearest_constant_scope();
        for argument in arguments {
            match argument.kind {
                NodeKind::Sym | NodeKind::Str => {
                    if let Some(name) = self.literal_name(argument) {
                        if let Some(method) = self
                            .graph
                            .get(scope)
                            .lookup_child(DefKind::InstanceMethod, name)
                        {
                            self.graph.get_mut(method).visibility = visibility;
                        }
                    }
                }
                // `private def speak` and friends
                NodeKind::Def | NodeKind::Defs => {
                    if let Some(method) = self.association_of(argument) {
                        self.graph.get_mut(method).visibility = visibility;
                    }
                }
                _ => {}
            }
        }
    }

    fn alias_method(&mut self, node: &Node) {
        let arguments = node.nodes(2).unwrap_or(&[]);
        let new_name = arguments.first().and_then(|a| self.literal_name(a));
        let source_name = arguments.get(1).and_then(|a| self.literal_name(a));
        let (Some(new_name), Some(source_name)) = (
            new_name.map(str::to_owned),
            source_name.map(str::to_owned),
        ) else {
            return;
        };

        let scope = self.nearest_constant_scope();
        if let Some(source) = self.graph.lookup(scope, DefKind::InstanceMethod, &source_name) {
            let mut clone = self.graph.clone_method(source, &new_name);
            clone.location = Some(node.location);
            self.graph.define(scope, clone);
        }
    }

    /// Calls that manipulate definitions rather than resolving to one.
    /// Returns whether the call was consumed.
    fn handle_directive(&mut self, node: &Node, name: &str) -> bool {
        match name {
            "attr_reader" | "attr_writer" | "attr_accessor" | "attr" => {
                self.define_attributes(node, name);
                true
            }
            "include" | "prepend" | "extend" => {
                self.mix_in(node);
                true
            }
            "private" | "protected" | "public" => {
                if let Some(visibility) = Self::visibility_named(name) {
                    self.apply_visibility(node, visibility);
                }
                true
            }
            "alias_method" => {
                self.alias_method(node);
                true
            }
            _ => false,
        }
    }

    fn process_send(&mut self, node: &Node) {
        let Some(name) = node.name(1) else {
            self.record_malformed(node, "a call needs a method name");
            return;
        };

        if node.is_null(0) && self.handle_directive(node, name) {
            return;
        }

        let resolved = if node.is_null(0) {
            self.resolve_bare_method(name)
        } else {
            let Some(receiver) = node.node(0).and_then(|receiver| self.association_of(receiver))
            else {
                // Unresolvable receivers poison nothing; the call is
                // simply left unresolved.
                return;
            };
            let receiver = self.graph.resolve_value(receiver);
            let definition = self.graph.get(receiver);

            if definition.kind.is_method() {
                // The return value of a call is unknown.
                return;
            }

            if definition.is_instance {
                self.graph.lookup(receiver, DefKind::InstanceMethod, name)
            } else if definition.kind == DefKind::Const {
                if name == "new" {
                    if let Some(new_method) =
                        self.graph.lookup(receiver, DefKind::ClassMethod, "new")
                    {
                        self.graph.add_reference(new_method);
                    }
                    let companion = self.graph.instance_of(receiver);
                    self.associate(node, companion);
                    return;
                }
                self.graph
                    .lookup(receiver, DefKind::ClassMethod, name)
                    .or_else(|| self.graph.lookup(receiver, DefKind::InstanceMethod, name))
            } else {
                // Variables without a known value and other opaque
                // receivers resolve nothing.
                return;
            }
        };

        if let Some(method) = resolved {
            self.graph.add_reference(method);
            self.associate(node, method);
        }
    }
}

impl Observer for VirtualMachine {
    fn enter_class(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(path) = node.node(0).and_then(builders::constant_path) else {
            self.record_malformed(node, "a class needs a constant name");
            return;
        };
        // The superclass expression is resolved before the body opens;
        // anything unresolvable degrades to the default parent.
        let superclass = node
            .node(1)
            .and_then(builders::constant_path)
            .and_then(|path| self.resolve_constant_path(&path));

        let class = builders::define_class(
            &mut self.graph,
            &self.scopes,
            &path,
            superclass,
            node.location,
        );
        self.associate(node, class);
        self.scopes.push(class);
        self.visibilities.push(Visibility::Public);
    }

    fn leave_class(&mut self, node: &Node, _state: &mut WalkState) {
        if self.association_of(node).is_some() {
            self.scopes.pop();
            self.visibilities.pop();
        }
    }

    fn enter_module(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(path) = node.node(0).and_then(builders::constant_path) else {
            self.record_malformed(node, "a module needs a constant name");
            return;
        };
        let module = builders::define_module(&mut self.graph, &self.scopes, &path, node.location);
        self.associate(node, module);
        self.scopes.push(module);
        self.visibilities.push(Visibility::Public);
    }

    fn leave_module(&mut self, node: &Node, _state: &mut WalkState) {
        if self.association_of(node).is_some() {
            self.scopes.pop();
            self.visibilities.pop();
        }
    }

    fn enter_sclass(&mut self, node: &Node, _state: &mut WalkState) {
        // `class << self` reopens the current scope on its class side;
        // a constant target reopens that constant instead.
        let target = node
            .node(0)
            .filter(|expr| expr.kind == NodeKind::Const)
            .and_then(builders::constant_path)
            .and_then(|path| self.resolve_constant_path(&path))
            .unwrap_or_else(|| self.current_scope());

        self.associate(node, target);
        self.scopes.push(target);
        self.method_contexts.push(MethodContext::Class);
        self.visibilities.push(Visibility::Public);
    }

    fn leave_sclass(&mut self, node: &Node, _state: &mut WalkState) {
        if self.association_of(node).is_some() {
            self.scopes.pop();
            self.method_contexts.pop();
            self.visibilities.pop();
        }
    }

    fn enter_def(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(name) = node.name(0) else {
            self.record_malformed(node, "a method definition needs a name");
            return;
        };
        let kind = match self.method_context() {
            MethodContext::Instance => DefKind::InstanceMethod,
            MethodContext::Class => DefKind::ClassMethod,
        };
        // Filed on whatever scope is open, so a def inside a method or
        // block stays local to it instead of leaking to the class.
        let scope = self.current_scope();
        let visibility = self.current_visibility();
        let method = builders::define_method(
            &mut self.graph,
            scope,
            name,
            kind,
            visibility,
            node.location,
        );
        self.associate(node, method);
        self.scopes.push(method);
    }

    fn leave_def(&mut self, node: &Node, _state: &mut WalkState) {
        if self.association_of(node).is_some() {
            self.scopes.pop();
        }
    }

    fn enter_defs(&mut self, node: &Node, _state: &mut WalkState) {
        // The receiver puts the whole definition on the class side,
        // including its body.
        self.method_contexts.push(MethodContext::Class);

        let Some(name) = node.name(1) else {
            self.record_malformed(node, "a singleton method definition needs a name");
            return;
        };
        let scope = node
            .node(0)
            .filter(|receiver| receiver.kind == NodeKind::Const)
            .and_then(builders::constant_path)
            .and_then(|path| self.resolve_constant_path(&path))
            .unwrap_or_else(|| self.nearest_constant_scope());

        let method = builders::define_method(
            &mut self.graph,
            scope,
            name,
            DefKind::ClassMethod,
            Visibility::Public,
            node.location,
        );
        self.associate(node, method);
        self.scopes.push(method);
    }

    fn leave_defs(&mut self, node: &Node, _state: &mut WalkState) {
        self.method_contexts.pop();
        if self.association_of(node).is_some() {
            self.scopes.pop();
        }
    }

    fn enter_args(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.current_scope();
        let definition = self.graph.get(scope);
        if definition.kind.is_method() || definition.kind == DefKind::Unknown {
            self.associate(node, scope);
            self.param_targets.push(scope);
        } else {
            self.record_malformed(node, "parameters outside of a method or block");
        }
    }

    fn leave_args(&mut self, node: &Node, _state: &mut WalkState) {
        if self.association_of(node).is_some() {
            self.param_targets.pop();
        }
    }

    fn enter_arg(&mut self, node: &Node, _state: &mut WalkState) {
        self.define_param(node, DefKind::Arg);
    }

    fn enter_optarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.define_param(node, DefKind::Optarg);
    }

    fn leave_optarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.link_param_default(node);
    }

    fn enter_restarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.define_param(node, DefKind::Restarg);
    }

    fn enter_kwarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.define_param(node, DefKind::Kwarg);
    }

    fn enter_kwoptarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.define_param(node, DefKind::Kwoptarg);
    }

    fn leave_kwoptarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.link_param_default(node);
    }

    fn enter_kwrestarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.define_param(node, DefKind::Kwrestarg);
    }

    fn enter_blockarg(&mut self, node: &Node, _state: &mut WalkState) {
        self.define_param(node, DefKind::Blockarg);
    }

    fn enter_block(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.current_scope();
        let mut definition = Definition::anonymous().with_location(node.location);
        definition.parents.push(scope);
        let block = self.graph.add(definition);
        self.associate(node, block);
        self.scopes.push(block);
    }

    fn leave_block(&mut self, node: &Node, _state: &mut WalkState) {
        if self.association_of(node).is_some() {
            self.scopes.pop();
        }
    }

    fn leave_lvasgn(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(name) = node.name(0) else {
            self.record_malformed(node, "an assignment needs a target name");
            return;
        };
        let value = node.node(1).and_then(|value| self.association_of(value));

        // Rebinding an outer local keeps its definition.
        if let Some(existing) = self.graph.resolve_local(&self.scopes, name) {
            if let Some(value) = value {
                self.graph.get_mut(existing).value = Some(value);
            }
            self.associate(node, existing);
            return;
        }

        let mut definition = Definition::named(DefKind::Lvar, name).with_location(node.location);
        definition.value = value;
        let (id, _) = self.graph.define(self.current_scope(), definition);
        self.associate(node, id);
    }

    fn leave_ivasgn(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.nearest_constant_scope();
        self.assign_variable(node, DefKind::Ivar, scope);
    }

    fn leave_cvasgn(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.nearest_constant_scope();
        self.assign_variable(node, DefKind::Cvar, scope);
    }

    fn leave_gvasgn(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.graph.root();
        self.assign_variable(node, DefKind::Gvar, scope);
    }

    fn leave_casgn(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(name) = node.name(1) else {
            self.record_malformed(node, "a constant assignment needs a name");
            return;
        };
        let scope = match node.node(0) {
            Some(qualifier) => self
                .association_of(qualifier)
                .unwrap_or_else(|| self.current_scope()),
            None => self.current_scope(),
        };
        let value = node.node(2).and_then(|value| self.association_of(value));

        let mut definition = Definition::named(DefKind::Const, name).with_location(node.location);
        definition.value = value;
        let (id, _) = self.graph.define(scope, definition);
        self.associate(node, id);
    }

    fn leave_const(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(name) = node.name(1) else {
            self.record_malformed(node, "a constant reference needs a name");
            return;
        };
        let resolved = match node.node(0) {
            Some(qualifier) => match self.association_of(qualifier) {
                Some(base) => self.graph.lookup(base, DefKind::Const, name),
                // An unresolved qualifier falls back to lexical
                // resolution of the final segment.
                None => self.resolve_constant(name),
            },
            None => self.resolve_constant(name),
        };
        if let Some(id) = resolved {
            self.graph.add_reference(id);
            self.associate(node, id);
        }
    }

    fn leave_ident(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(name) = node.name(0) else {
            return;
        };

        // Local variables shadow method calls.
        if let Some(local) = self.graph.resolve_local(&self.scopes, name) {
            self.graph.add_reference(local);
            self.associate(node, local);
            return;
        }

        // A bare visibility keyword switches the default for the
        // definitions that follow in this body.
        if let Some(visibility) = Self::visibility_named(name) {
            if let Some(top) = self.visibilities.last_mut() {
                *top = visibility;
            }
            return;
        }

        if let Some(method) = self.resolve_bare_method(name) {
            self.graph.add_reference(method);
            self.associate(node, method);
        }
    }

    fn leave_ivar(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.nearest_constant_scope();
        self.read_variable(node, DefKind::Ivar, scope);
    }

    fn leave_cvar(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.nearest_constant_scope();
        self.read_variable(node, DefKind::Cvar, scope);
    }

    fn leave_gvar(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.graph.root();
        self.read_variable(node, DefKind::Gvar, scope);
    }

    fn leave_self(&mut self, node: &Node, _state: &mut WalkState) {
        let scope = self.nearest_constant_scope();
        let mut in_instance_method = false;
        for id in self.scopes.iter().rev() {
            match self.graph.get(*id).kind {
                DefKind::InstanceMethod => {
                    in_instance_method = true;
                    break;
                }
                DefKind::ClassMethod | DefKind::Const => break,
                _ => {}
            }
        }
        let resolved = if in_instance_method {
            self.graph.instance_of(scope)
        } else {
            scope
        };
        self.associate(node, resolved);
    }

    fn leave_send(&mut self, node: &Node, _state: &mut WalkState) {
        self.process_send(node);
    }

    fn leave_csend(&mut self, node: &Node, _state: &mut WalkState) {
        self.process_send(node);
    }

    fn leave_begin(&mut self, node: &Node, _state: &mut WalkState) {
        // A sequence takes the value of its last expression.
        let last = node.children.iter().rev().find_map(|child| match child {
            Child::Node(node) => Some(node),
            _ => None,
        });
        if let Some(id) = last.and_then(|last| self.association_of(last)) {
            self.associate(node, id);
        }
    }

    fn leave_int(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Integer");
    }

    fn leave_float(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Float");
    }

    fn leave_str(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "String");
    }

    fn leave_dstr(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "String");
    }

    fn leave_sym(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Symbol");
    }

    fn leave_regexp(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Regexp");
    }

    fn leave_array(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Array");
    }

    fn leave_hash(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Hash");
    }

    fn leave_irange(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Range");
    }

    fn leave_erange(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "Range");
    }

    fn leave_nil(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "NilClass");
    }

    fn leave_true(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "TrueClass");
    }

    fn leave_false(&mut self, node: &Node, _state: &mut WalkState) {
        self.literal_instance(node, "FalseClass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::SourceLocation;
    use crate::graph::builtins::BuiltinLibrary;
    use crate::ruby::parse_source;

    fn evaluate(source: &str) -> Evaluation {
        let mut graph = DefinitionGraph::new();
        BuiltinLibrary::standard().seed(&mut graph);
        let parsed = parse_source(source, "test.rb").unwrap();
        VirtualMachine::new(graph).run(&parsed).unwrap()
    }

    fn constant(evaluation: &Evaluation, name: &str) -> DefinitionId {
        let root = evaluation.graph.root();
        evaluation
            .graph
            .lookup(root, DefKind::Const, name)
            .unwrap_or_else(|| panic!("undefined constant {name}"))
    }

    #[test]
    fn classes_inherit_their_written_superclass() {
        let evaluation = evaluate("class Animal\nend\nclass Dog < Animal\nend\n");

        let animal = constant(&evaluation, "Animal");
        let dog = constant(&evaluation, "Dog");
        assert_eq!(evaluation.graph.get(dog).parents.first(), Some(&animal));
    }

    #[test]
    fn unresolved_superclasses_degrade_to_object() {
        let evaluation = evaluate("class Dog < Mammal\nend\n");

        let dog = constant(&evaluation, "Dog");
        let object = constant(&evaluation, "Object");
        assert_eq!(evaluation.graph.get(dog).parents.first(), Some(&object));
    }

    #[test]
    fn methods_land_on_the_side_their_definition_names() {
        let evaluation = evaluate(
            "class Calc\n  def add(a, b)\n  end\n  def self.build\n  end\n  class << self\n    def cached\n    end\n  end\nend\n",
        );

        let calc = constant(&evaluation, "Calc");
        let calc_def = evaluation.graph.get(calc);
        assert!(calc_def.lookup_child(DefKind::InstanceMethod, "add").is_some());
        assert!(calc_def.lookup_child(DefKind::ClassMethod, "build").is_some());
        assert!(calc_def.lookup_child(DefKind::ClassMethod, "cached").is_some());
    }

    #[test]
    fn visibility_switches_apply_to_following_methods() {
        let evaluation = evaluate(
            "class Safe\n  def open_one\n  end\n  private\n  def hidden\n  end\n  def also_hidden\n  end\n  public\n  def reopened\n  end\nend\n",
        );

        let safe = constant(&evaluation, "Safe");
        let graph = &evaluation.graph;
        let visibility = |name: &str| {
            let method = graph
                .get(safe)
                .lookup_child(DefKind::InstanceMethod, name)
                .unwrap();
            graph.get(method).visibility
        };
        assert_eq!(visibility("open_one"), Visibility::Public);
        assert_eq!(visibility("hidden"), Visibility::Private);
        assert_eq!(visibility("also_hidden"), Visibility::Private);
        assert_eq!(visibility("reopened"), Visibility::Public);
    }

    #[test]
    fn methods_defined_inside_methods_stay_local_to_them() {
        let evaluation = evaluate("def outer\n  def inner\n  end\n  inner\nend\n");

        let root = evaluation.graph.root();
        let graph = &evaluation.graph;
        let outer = graph.lookup(root, DefKind::InstanceMethod, "outer").unwrap();
        let inner = graph
            .get(outer)
            .lookup_child(DefKind::InstanceMethod, "inner")
            .unwrap();
        // The call after the definition resolved through the open method.
        assert_eq!(graph.get(inner).reference_amount, 1);
        assert!(graph.lookup(root, DefKind::InstanceMethod, "inner").is_none());
    }

    #[test]
    fn attribute_directives_define_accessors() {
        let evaluation = evaluate("class Person\n  attr_accessor :name\n  attr_reader :age\nend\n");

        let person = constant(&evaluation, "Person");
        let person_def = evaluation.graph.get(person);
        let writer = person_def.lookup_child(DefKind::InstanceMethod, "name=").unwrap();
        assert!(person_def.lookup_child(DefKind::InstanceMethod, "name").is_some());
        assert!(person_def.lookup_child(DefKind::InstanceMethod, "age").is_some());
        assert!(person_def.lookup_child(DefKind::InstanceMethod, "age=").is_none());
        assert_eq!(evaluation.graph.get(writer).parameters().count(), 1);
    }

    #[test]
    fn includes_put_module_methods_on_the_ancestor_chain() {
        let evaluation = evaluate(
            "module Walkable\n  def walk\n  end\nend\nclass Robot\n  include Walkable\nend\n",
        );

        let robot = constant(&evaluation, "Robot");
        assert!(evaluation
            .graph
            .lookup(robot, DefKind::InstanceMethod, "walk")
            .is_some());
    }

    #[test]
    fn local_variables_carry_their_assigned_value() {
        let evaluation = evaluate("count = 41\ntotal = count\n");

        let root = evaluation.graph.root();
        let count = evaluation.graph.get(root).local_binding("count").unwrap();
        let total = evaluation.graph.get(root).local_binding("total").unwrap();
        let value = evaluation.graph.resolve_value(total);
        assert!(evaluation.graph.get(value).is_instance);
        assert_eq!(evaluation.graph.get(count).reference_amount, 1);
    }

    #[test]
    fn instance_variables_file_on_the_enclosing_class() {
        let evaluation = evaluate(
            "class Counter\n  def bump\n    @count = 0\n    @count\n  end\nend\n",
        );

        let counter = constant(&evaluation, "Counter");
        let count = evaluation
            .graph
            .get(counter)
            .lookup_child(DefKind::Ivar, "@count")
            .unwrap();
        assert_eq!(evaluation.graph.get(count).reference_amount, 1);
    }

    #[test]
    fn construction_associates_an_instance_of_the_class() {
        let evaluation = evaluate(
            "class Dog\n  def bark\n  end\nend\nrex = Dog.new\nrex.bark\n",
        );

        let dog = constant(&evaluation, "Dog");
        let bark = evaluation
            .graph
            .get(dog)
            .lookup_child(DefKind::InstanceMethod, "bark")
            .unwrap();
        assert_eq!(evaluation.graph.get(bark).reference_amount, 1);
    }

    #[test]
    fn parameters_become_locals_of_their_method() {
        let evaluation = evaluate("def greet(name, greeting = \"hi\")\n  greeting\nend\n");

        let root = evaluation.graph.root();
        let greet = evaluation
            .graph
            .lookup(root, DefKind::InstanceMethod, "greet")
            .unwrap();
        let greet_def = evaluation.graph.get(greet);
        assert_eq!(greet_def.parameters().count(), 2);
        assert!(greet_def.lookup_child(DefKind::Arg, "name").is_some());

        let greeting = greet_def.lookup_child(DefKind::Optarg, "greeting").unwrap();
        assert_eq!(evaluation.graph.get(greeting).reference_amount, 1);
        assert!(evaluation.graph.get(greeting).value.is_some());
    }

    #[test]
    fn malformed_trees_are_refused() {
        let mut graph = DefinitionGraph::new();
        BuiltinLibrary::standard().seed(&mut graph);

        // An argument list outside of any method.
        let args = Node {
            id: NodeId(0),
            kind: NodeKind::Args,
            children: Vec::new(),
            location: SourceLocation { line: 3, column: 4 },
        };
        let parsed = ParsedSource {
            file: "broken.rb".into(),
            root: Node {
                id: NodeId(1),
                kind: NodeKind::Begin,
                children: vec![Child::Node(args)],
                location: SourceLocation { line: 1, column: 0 },
            },
        };

        let error = VirtualMachine::new(graph).run(&parsed).unwrap_err();
        match error {
            AnalyzerError::MalformedNode { kind, line, .. } => {
                assert_eq!(kind, "args");
                assert_eq!(line, 3);
            }
            other => panic!("expected a malformed node error, got {other}"),
        }
    }
}
