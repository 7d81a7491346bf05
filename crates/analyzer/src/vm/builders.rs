//! Builders for the definitions that open scopes: classes and modules.
//!
//! These handle the parts of a definition that depend on the constant
//! path: resolving an explicit qualifier, creating empty modules for
//! path segments that do not exist yet, and wiring ancestry when a
//! definition is first created. Reopening an existing class or module
//! reuses its definition so previously attached children survive.

use smallvec::SmallVec;

use crate::ast::{Node, NodeKind, SourceLocation};
use crate::graph::{DefKind, Definition, DefinitionGraph, DefinitionId, Visibility};

/// Extracts the segments of a constant path, outermost first. Returns
/// `None` for anything that is not a chain of constants.
pub(crate) fn constant_path(node: &Node) -> Option<Vec<String>> {
    if node.kind != NodeKind::Const {
        return None;
    }
    let name = node.name(1)?.to_owned();
    match node.node(0) {
        Some(qualifier) => {
            let mut path = constant_path(qualifier)?;
            path.push(name);
            Some(path)
        }
        None => Some(vec![name]),
    }
}

pub(super) struct ScopedName {
    pub scope: DefinitionId,
    pub name: String,
}

/// Resolves where a definition with the given path lands. Qualifier
/// segments are resolved lexically from the scope stack; segments that
/// do not resolve are created as empty modules so `module A::B` works
/// without a prior `module A`.
pub(super) fn resolve_definition_path(
    graph: &mut DefinitionGraph,
    scopes: &[DefinitionId],
    path: &[String],
    location: SourceLocation,
) -> ScopedName {
    let current = scopes.last().copied().unwrap_or_else(|| graph.root());
    let name = path.last().cloned().unwrap_or_default();

    if path.len() < 2 {
        return ScopedName {
            scope: current,
            name,
        };
    }

    let first = &path[0];
    let mut scope = match graph.resolve_constant(scopes, first) {
        Some(id) => id,
        None => create_empty_module(graph, current, first, location),
    };
    for segment in &path[1..path.len() - 1] {
        scope = match graph.lookup(scope, DefKind::Const, segment) {
            Some(id) => id,
            None => create_empty_module(graph, scope, segment, location),
        };
    }

    ScopedName { scope, name }
}

fn create_empty_module(
    graph: &mut DefinitionGraph,
    scope: DefinitionId,
    name: &str,
    location: SourceLocation,
) -> DefinitionId {
    let mut definition = Definition::named(DefKind::Const, name).with_location(location);
    definition.reference_amount = 1;
    definition.parents.push(scope);
    let (id, _) = graph.define(scope, definition);
    id
}

/// Defines or reopens a class. New classes ancestor through their
/// superclass (`Object` when none is given) and then their enclosing
/// scope; reopening with an explicit superclass rewires the primary
/// parent but otherwise leaves the definition alone.
pub(super) fn define_class(
    graph: &mut DefinitionGraph,
    scopes: &[DefinitionId],
    path: &[String],
    superclass: Option<DefinitionId>,
    location: SourceLocation,
) -> DefinitionId {
    let target = resolve_definition_path(graph, scopes, path, location);

    let mut definition = Definition::named(DefKind::Const, target.name).with_location(location);
    definition.reference_amount = 1;
    let (id, created) = graph.define(target.scope, definition);

    if created {
        let root = graph.root();
        let default_parent = graph.lookup(root, DefKind::Const, "Object");
        let mut parents: SmallVec<[DefinitionId; 2]> = SmallVec::new();
        if let Some(parent) = superclass.or(default_parent).filter(|parent| *parent != id) {
            parents.push(parent);
        }
        parents.push(target.scope);
        graph.get_mut(id).parents = parents;
    } else if let Some(superclass) = superclass {
        graph.set_primary_parent(id, superclass);
    }

    id
}

/// Defines or reopens a module. Modules ancestor only through their
/// enclosing scope.
pub(super) fn define_module(
    graph: &mut DefinitionGraph,
    scopes: &[DefinitionId],
    path: &[String],
    location: SourceLocation,
) -> DefinitionId {
    let target = resolve_definition_path(graph, scopes, path, location);

    let mut definition = Definition::named(DefKind::Const, target.name).with_location(location);
    definition.reference_amount = 1;
    let (id, created) = graph.define(target.scope, definition);

    if created {
        graph.get_mut(id).parents = SmallVec::from_slice(&[target.scope]);
    }

    id
}

/// Defines a method in `scope`. Redefining an existing method drops its
/// previous parameter list; callers holding its id keep pointing at the
/// same definition.
pub(super) fn define_method(
    graph: &mut DefinitionGraph,
    scope: DefinitionId,
    name: &str,
    kind: DefKind,
    visibility: Visibility,
    location: SourceLocation,
) -> DefinitionId {
    let definition = Definition::named(kind, name)
        .with_location(location)
        .with_visibility(visibility);
    let (id, created) = graph.define(scope, definition);
    if !created {
        graph.clear_children(id);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_object() -> (DefinitionGraph, DefinitionId) {
        let mut graph = DefinitionGraph::new();
        let root = graph.root();
        let mut object = Definition::named(DefKind::Const, "Object");
        object.reference_amount = 1;
        let (object, _) = graph.define(root, object);
        (graph, object)
    }

    fn location() -> SourceLocation {
        SourceLocation { line: 1, column: 0 }
    }

    #[test]
    fn implicit_parent_classes_have_exactly_two_ancestors() {
        let (mut graph, object) = graph_with_object();
        let root = graph.root();

        let class = define_class(&mut graph, &[root], &["Foo".to_owned()], None, location());

        assert_eq!(graph.get(class).parents.as_slice(), &[object, root]);
        assert_eq!(graph.get(class).reference_amount, 1);
    }

    #[test]
    fn explicit_superclasses_come_before_the_enclosing_scope() {
        let (mut graph, _) = graph_with_object();
        let root = graph.root();

        let base = define_class(&mut graph, &[root], &["Base".to_owned()], None, location());
        let child = define_class(
            &mut graph,
            &[root],
            &["Child".to_owned()],
            Some(base),
            location(),
        );

        assert_eq!(graph.get(child).parents.first(), Some(&base));
        assert_eq!(graph.get(child).parents.last(), Some(&root));
    }

    #[test]
    fn qualified_paths_create_missing_outer_modules() {
        let (mut graph, _) = graph_with_object();
        let root = graph.root();

        let inner = define_class(
            &mut graph,
            &[root],
            &["A".to_owned(), "B".to_owned(), "C".to_owned()],
            None,
            location(),
        );

        let a = graph.lookup(root, DefKind::Const, "A").unwrap();
        let b = graph.get(a).lookup_child(DefKind::Const, "B").unwrap();
        assert_eq!(graph.get(a).parents.as_slice(), &[root]);
        assert_eq!(graph.get(a).reference_amount, 1);
        assert_eq!(graph.get(b).lookup_child(DefKind::Const, "C"), Some(inner));
        assert_eq!(graph.get(inner).parents.last(), Some(&b));
    }

    #[test]
    fn reopening_keeps_the_definition_and_its_children() {
        let (mut graph, _) = graph_with_object();
        let root = graph.root();
        let path = vec!["Foo".to_owned()];

        let first = define_class(&mut graph, &[root], &path, None, location());
        let method = define_method(
            &mut graph,
            first,
            "speak",
            DefKind::InstanceMethod,
            Visibility::Public,
            location(),
        );
        let second = define_class(&mut graph, &[root], &path, None, location());

        assert_eq!(first, second);
        assert_eq!(
            graph.get(second).lookup_child(DefKind::InstanceMethod, "speak"),
            Some(method)
        );
    }

    #[test]
    fn reopening_with_a_superclass_rewires_the_primary_parent() {
        let (mut graph, object) = graph_with_object();
        let root = graph.root();

        let class = define_class(&mut graph, &[root], &["Foo".to_owned()], None, location());
        assert_eq!(graph.get(class).parents.first(), Some(&object));

        let base = define_class(&mut graph, &[root], &["Base".to_owned()], None, location());
        define_class(&mut graph, &[root], &["Foo".to_owned()], Some(base), location());

        assert_eq!(graph.get(class).parents.first(), Some(&base));
    }

    #[test]
    fn modules_ancestor_only_through_their_scope() {
        let (mut graph, _) = graph_with_object();
        let root = graph.root();

        let module = define_module(&mut graph, &[root], &["Helpers".to_owned()], location());

        assert_eq!(graph.get(module).parents.as_slice(), &[root]);
    }

    #[test]
    fn redefining_a_method_drops_its_parameters() {
        let (mut graph, _) = graph_with_object();
        let root = graph.root();
        let class = define_class(&mut graph, &[root], &["Foo".to_owned()], None, location());

        let first = define_method(
            &mut graph,
            class,
            "speak",
            DefKind::InstanceMethod,
            Visibility::Public,
            location(),
        );
        graph.define(first, Definition::named(DefKind::Arg, "volume"));

        let second = define_method(
            &mut graph,
            class,
            "speak",
            DefKind::InstanceMethod,
            Visibility::Private,
            location(),
        );

        assert_eq!(first, second);
        assert_eq!(graph.get(second).parameters().count(), 0);
        assert_eq!(graph.get(second).visibility, Visibility::Private);
    }
}
