//! The definition graph: every class, module, method, constant, variable
//! and parameter discovered while symbolically executing a source, plus
//! the inheritance and lexical-nesting edges between them.
//!
//! Definitions live in one arena owned by [`DefinitionGraph`] and refer to
//! each other by [`DefinitionId`], which keeps an otherwise cyclic object
//! graph (classes point at ancestors, ancestors at their own children)
//! safely owned in one place. Redefining a `(kind, name)` pair in a scope
//! updates the existing slot instead of allocating, so references recorded
//! before a redefinition stay valid.

pub mod builtins;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::ast::SourceLocation;

/// Index of a definition within its graph's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefKind {
    Const,
    InstanceMethod,
    ClassMethod,
    Lvar,
    Ivar,
    Cvar,
    Gvar,
    Arg,
    Optarg,
    Restarg,
    Kwarg,
    Kwoptarg,
    Kwrestarg,
    Blockarg,
    Unknown,
}

impl DefKind {
    pub fn is_method(self) -> bool {
        matches!(self, DefKind::InstanceMethod | DefKind::ClassMethod)
    }

    pub fn is_parameter(self) -> bool {
        matches!(
            self,
            DefKind::Arg
                | DefKind::Optarg
                | DefKind::Restarg
                | DefKind::Kwarg
                | DefKind::Kwoptarg
                | DefKind::Kwrestarg
                | DefKind::Blockarg
        )
    }

    /// Kinds that a bare identifier in the same activation can refer to.
    pub fn binds_local(self) -> bool {
        self == DefKind::Lvar || self.is_parameter()
    }

    /// Kinds whose `value` link stands in for the definition when the
    /// definition is used as a receiver.
    pub fn forwards_value(self) -> bool {
        matches!(
            self,
            DefKind::Lvar | DefKind::Ivar | DefKind::Cvar | DefKind::Gvar
        ) || self.is_parameter()
    }

    pub fn describe(self) -> &'static str {
        match self {
            DefKind::Const => "constant",
            DefKind::InstanceMethod => "instance method",
            DefKind::ClassMethod => "class method",
            DefKind::Lvar => "local variable",
            DefKind::Ivar => "instance variable",
            DefKind::Cvar => "class variable",
            DefKind::Gvar => "global variable",
            DefKind::Arg => "argument",
            DefKind::Optarg => "optional argument",
            DefKind::Restarg => "rest argument",
            DefKind::Kwarg => "keyword argument",
            DefKind::Kwoptarg => "optional keyword argument",
            DefKind::Kwrestarg => "keyword rest argument",
            DefKind::Blockarg => "block argument",
            DefKind::Unknown => "value",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Protected,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        };
        f.write_str(name)
    }
}

/// A single entity in the graph. Scopes (classes, modules, methods,
/// blocks) and plain values are the same type, distinguished by `kind`.
#[derive(Debug, Clone)]
pub struct Definition {
    pub name: Option<String>,
    pub kind: DefKind,
    /// Ancestors in method resolution order, nearest first. Never empty
    /// for a class or module once its builder has run.
    pub parents: SmallVec<[DefinitionId; 2]>,
    /// Children keyed by name; a name can be bound once per kind.
    children: FxHashMap<String, SmallVec<[(DefKind, DefinitionId); 2]>>,
    /// How many lookups from code resolved to this definition.
    pub reference_amount: u32,
    pub visibility: Visibility,
    /// Computed value, such as an assignment's right-hand side or an
    /// optional parameter's default.
    pub value: Option<DefinitionId>,
    /// Lazily created companion representing one instance of this class,
    /// shared by everything that evaluates to such an instance.
    pub instance: Option<DefinitionId>,
    /// Whether this definition denotes an instance rather than the class
    /// object itself; method lookup on it targets instance methods.
    pub is_instance: bool,
    pub location: Option<SourceLocation>,
}

impl Definition {
    pub fn named(kind: DefKind, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            kind,
            parents: SmallVec::new(),
            children: FxHashMap::default(),
            reference_amount: 0,
            visibility: Visibility::Public,
            value: None,
            instance: None,
            is_instance: false,
            location: None,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            name: None,
            kind: DefKind::Unknown,
            parents: SmallVec::new(),
            children: FxHashMap::default(),
            reference_amount: 0,
            visibility: Visibility::Public,
            value: None,
            instance: None,
            is_instance: false,
            location: None,
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_value(mut self, value: DefinitionId) -> Self {
        self.value = Some(value);
        self
    }

    pub fn lookup_child(&self, kind: DefKind, name: &str) -> Option<DefinitionId> {
        self.children
            .get(name)?
            .iter()
            .find(|(child_kind, _)| *child_kind == kind)
            .map(|(_, id)| *id)
    }

    /// First child that a bare identifier could bind to, regardless of
    /// whether it was introduced as a local variable or a parameter.
    pub fn local_binding(&self, name: &str) -> Option<DefinitionId> {
        self.children
            .get(name)?
            .iter()
            .find(|(kind, _)| kind.binds_local())
            .map(|(_, id)| *id)
    }

    pub fn child_entries(&self) -> impl Iterator<Item = (DefKind, &str, DefinitionId)> {
        self.children.iter().flat_map(|(name, entries)| {
            entries
                .iter()
                .map(move |(kind, id)| (*kind, name.as_str(), *id))
        })
    }

    pub fn parameters(&self) -> impl Iterator<Item = (DefKind, DefinitionId)> {
        self.children.values().flatten().filter_map(|(kind, id)| {
            if kind.is_parameter() {
                Some((*kind, *id))
            } else {
                None
            }
        })
    }

    /// Whether bare-identifier resolution stops at this scope. Methods
    /// and constants open a fresh local table; blocks see through to the
    /// scope that defined them.
    pub fn confines_locals(&self) -> bool {
        self.kind == DefKind::Const || self.kind.is_method()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(anonymous)")
    }
}

#[derive(Debug, Clone)]
pub struct DefinitionGraph {
    definitions: Vec<Definition>,
    root: DefinitionId,
}

impl Default for DefinitionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionGraph {
    /// Creates a graph holding only the root scope. The root doubles as
    /// the global namespace and as the top-level activation for local
    /// variables.
    pub fn new() -> Self {
        let mut graph = Self {
            definitions: Vec::new(),
            root: DefinitionId(0),
        };
        graph.root = graph.add(Definition {
            name: None,
            kind: DefKind::Const,
            parents: SmallVec::new(),
            children: FxHashMap::default(),
            reference_amount: 1,
            visibility: Visibility::Public,
            value: None,
            instance: None,
            is_instance: false,
            location: None,
        });
        graph
    }

    pub fn root(&self) -> DefinitionId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Panics if `id` was produced by a different graph.
    pub fn get(&self, id: DefinitionId) -> &Definition {
        &self.definitions[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: DefinitionId) -> &mut Definition {
        &mut self.definitions[id.0 as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (DefinitionId, &Definition)> {
        self.definitions
            .iter()
            .enumerate()
            .map(|(index, def)| (DefinitionId(index as u32), def))
    }

    /// Adds a definition without filing it into any scope; used for
    /// anonymous values that are only reachable through the
    /// node-to-definition table.
    pub fn add(&mut self, definition: Definition) -> DefinitionId {
        let id = DefinitionId(self.definitions.len() as u32);
        self.definitions.push(definition);
        id
    }

    /// Files `definition` as a child of `scope`. When the scope already
    /// has a child with the same kind and name the existing slot is
    /// updated in place: location and visibility take the new values, a
    /// value link is adopted when present, and `reference_amount`,
    /// parents and existing children are preserved. Returns the id and
    /// whether a new definition was created.
    pub fn define(&mut self, scope: DefinitionId, definition: Definition) -> (DefinitionId, bool) {
        let name = match &definition.name {
            Some(name) => name.clone(),
            None => return (self.add(definition), true),
        };
        let kind = definition.kind;

        if let Some(existing) = self.get(scope).lookup_child(kind, &name) {
            let slot = self.get_mut(existing);
            slot.location = definition.location.or(slot.location);
            slot.visibility = definition.visibility;
            if definition.value.is_some() {
                slot.value = definition.value;
            }
            return (existing, false);
        }

        let id = self.add(definition);
        self.get_mut(scope)
            .children
            .entry(name)
            .or_default()
            .push((kind, id));
        (id, true)
    }

    /// The lookup protocol: the scope's own children first, then its
    /// parents in order, each searched recursively. Inheritance loops are
    /// cut by a visited set. Absence is an ordinary outcome.
    pub fn lookup(&self, from: DefinitionId, kind: DefKind, name: &str) -> Option<DefinitionId> {
        let mut visited = FxHashSet::default();
        self.lookup_visited(from, kind, name, &mut visited)
    }

    fn lookup_visited(
        &self,
        current: DefinitionId,
        kind: DefKind,
        name: &str,
        visited: &mut FxHashSet<DefinitionId>,
    ) -> Option<DefinitionId> {
        if !visited.insert(current) {
            return None;
        }
        let definition = self.get(current);
        if let Some(found) = definition.lookup_child(kind, name) {
            return Some(found);
        }
        for &parent in &definition.parents {
            if let Some(found) = self.lookup_visited(parent, kind, name, visited) {
                return Some(found);
            }
        }
        None
    }

    /// Resolves a bare identifier against a scope stack: innermost scope
    /// first, continuing outward through block scopes and stopping at the
    /// first method or constant scope, which owns the activation.
    pub fn resolve_local(&self, scopes: &[DefinitionId], name: &str) -> Option<DefinitionId> {
        for &scope in scopes.iter().rev() {
            let definition = self.get(scope);
            if let Some(found) = definition.local_binding(name) {
                return Some(found);
            }
            if definition.confines_locals() {
                return None;
            }
        }
        None
    }

    /// The innermost class, module or root scope on a scope stack.
    /// Methods and blocks never own constants, methods or instance
    /// variables; those always file here.
    pub fn nearest_constant_scope(&self, scopes: &[DefinitionId]) -> DefinitionId {
        scopes
            .iter()
            .rev()
            .copied()
            .find(|id| self.get(*id).kind == DefKind::Const)
            .unwrap_or_else(|| self.root())
    }

    /// Resolves a constant lexically: each enclosing scope is tried from
    /// the inside out, ancestors included.
    pub fn resolve_constant(&self, scopes: &[DefinitionId], name: &str) -> Option<DefinitionId> {
        scopes
            .iter()
            .rev()
            .find_map(|scope| self.lookup(*scope, DefKind::Const, name))
    }

    /// Resolves a receiverless call through each enclosing scope from
    /// the inside out, so methods defined inside a method or block are
    /// found before class-level ones. Instance methods win inside
    /// instance methods and at the top level; class methods win inside
    /// class methods and directly inside class or module bodies.
    pub fn resolve_bare_method(&self, scopes: &[DefinitionId], name: &str) -> Option<DefinitionId> {
        let [first, second] = self.bare_method_order(scopes);
        self.resolve_method_of_kind(scopes, first, name)
            .or_else(|| self.resolve_method_of_kind(scopes, second, name))
    }

    fn resolve_method_of_kind(
        &self,
        scopes: &[DefinitionId],
        kind: DefKind,
        name: &str,
    ) -> Option<DefinitionId> {
        scopes
            .iter()
            .rev()
            .find_map(|&scope| self.lookup(scope, kind, name))
    }

    fn bare_method_order(&self, scopes: &[DefinitionId]) -> [DefKind; 2] {
        for &id in scopes.iter().rev() {
            let definition = self.get(id);
            match definition.kind {
                DefKind::InstanceMethod => {
                    return [DefKind::InstanceMethod, DefKind::ClassMethod];
                }
                DefKind::ClassMethod => {
                    return [DefKind::ClassMethod, DefKind::InstanceMethod];
                }
                DefKind::Const => {
                    // A named constant scope is a class or module body;
                    // the root behaves like an instance.
                    return if definition.name.is_some() {
                        [DefKind::ClassMethod, DefKind::InstanceMethod]
                    } else {
                        [DefKind::InstanceMethod, DefKind::ClassMethod]
                    };
                }
                _ => {}
            }
        }
        [DefKind::InstanceMethod, DefKind::ClassMethod]
    }

    /// The shared "one instance of this class" companion, created on
    /// first use. Its parent chain is exactly the class, so instance
    /// method lookup on it follows the normal protocol.
    pub fn instance_of(&mut self, class: DefinitionId) -> DefinitionId {
        if let Some(existing) = self.get(class).instance {
            return existing;
        }
        let mut companion = Definition::anonymous();
        companion.name = self.get(class).name.clone();
        companion.is_instance = true;
        companion.parents.push(class);
        let id = self.add(companion);
        self.get_mut(class).instance = Some(id);
        id
    }

    /// Follows value links through variables and parameters so that a
    /// receiver like a local holding a string resolves methods against
    /// the string. Bounded to keep self-referential assignments finite.
    pub fn resolve_value(&self, id: DefinitionId) -> DefinitionId {
        let mut current = id;
        for _ in 0..8 {
            let definition = self.get(current);
            match definition.value {
                Some(value) if definition.kind.forwards_value() => current = value,
                _ => break,
            }
        }
        current
    }

    pub fn add_reference(&mut self, id: DefinitionId) {
        let definition = self.get_mut(id);
        definition.reference_amount = definition.reference_amount.saturating_add(1);
    }

    /// Drops every child of `id`; used when a method redefinition
    /// replaces the parameter list.
    pub fn clear_children(&mut self, id: DefinitionId) {
        self.get_mut(id).children.clear();
    }

    /// Inserts `parent` at the front of `id`'s ancestor chain, the
    /// position module inclusion takes in method resolution order.
    pub fn prepend_parent(&mut self, id: DefinitionId, parent: DefinitionId) {
        if id == parent {
            return;
        }
        let definition = self.get_mut(id);
        if let Some(position) = definition.parents.iter().position(|&p| p == parent) {
            definition.parents.remove(position);
        }
        definition.parents.insert(0, parent);
    }

    /// Replaces the primary ancestor, keeping the rest of the chain.
    pub fn set_primary_parent(&mut self, id: DefinitionId, parent: DefinitionId) {
        let definition = self.get_mut(id);
        if definition.parents.is_empty() {
            definition.parents.push(parent);
        } else {
            definition.parents[0] = parent;
        }
    }

    /// Copies a method under a new name in the same arena, sharing the
    /// parameter definitions. Backs `alias` and `alias_method`.
    pub fn clone_method(&mut self, source: DefinitionId, new_name: &str) -> Definition {
        let source = self.get(source);
        Definition {
            name: Some(new_name.to_string()),
            kind: source.kind,
            parents: source.parents.clone(),
            children: source.children.clone(),
            reference_amount: 0,
            visibility: source.visibility,
            value: source.value,
            instance: None,
            is_instance: false,
            location: source.location,
        }
    }
}
