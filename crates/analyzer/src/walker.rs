//! Depth-first traversal of a syntax tree with pre and post order event
//! dispatch.
//!
//! The walker itself knows nothing about Ruby semantics. It recurses over
//! node children in declaration order, descending into single-node and
//! node-list children and skipping literal slots, and fires the matching
//! `enter_*`/`leave_*` handler on every bound observer. The virtual
//! machine and each analysis are observers; several can be bound to one
//! walker and they are notified independently, in binding order.

use crate::ast::{self, Child, Node};

pub use crate::ast::Observer;

/// Context threaded through every handler invocation. Carries the opaque
/// label of the source being walked; observers attach it to anything they
/// report.
#[derive(Debug, Clone)]
pub struct WalkState {
    pub source: String,
}

impl WalkState {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[derive(Default)]
pub struct Walker<'a> {
    observers: Vec<&'a mut dyn Observer>,
}

impl<'a> Walker<'a> {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Binds an observer for the duration of the walk. Returns `self` so
    /// bindings can be chained before calling [`Walker::walk`].
    pub fn bind(&mut self, observer: &'a mut dyn Observer) -> &mut Self {
        self.observers.push(observer);
        self
    }

    /// Walks the tree rooted at `node`. The enter event of a node fires
    /// exactly once before any of its children are visited and the leave
    /// event exactly once after all of them, even for childless nodes.
    pub fn walk(&mut self, node: &Node, state: &mut WalkState) {
        for observer in self.observers.iter_mut() {
            ast::dispatch_enter(&mut **observer, node, state);
        }

        for child in &node.children {
            match child {
                Child::Node(child) => self.walk(child, state),
                Child::Nodes(children) => {
                    for child in children {
                        self.walk(child, state);
                    }
                }
                _ => {}
            }
        }

        for observer in self.observers.iter_mut() {
            ast::dispatch_leave(&mut **observer, node, state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{NodeId, NodeKind, SourceLocation};
    use rustc_hash::FxHashMap;

    fn node(id: u32, kind: NodeKind, children: Vec<Child>) -> Node {
        Node {
            id: NodeId(id),
            kind,
            children,
            location: SourceLocation::default(),
        }
    }

    /// Records every event as `(phase, node id)` and counts per kind.
    #[derive(Default)]
    struct Recorder {
        events: Vec<(&'static str, u32)>,
        enters: FxHashMap<NodeKind, usize>,
        leaves: FxHashMap<NodeKind, usize>,
    }

    impl Recorder {
        fn record(&mut self, phase: &'static str, node: &Node) {
            self.events.push((phase, node.id.0));
            let map = if phase == "enter" {
                &mut self.enters
            } else {
                &mut self.leaves
            };
            *map.entry(node.kind).or_default() += 1;
        }
    }

    impl Observer for Recorder {
        fn enter_begin(&mut self, node: &Node, _state: &mut WalkState) {
            self.record("enter", node);
        }
        fn leave_begin(&mut self, node: &Node, _state: &mut WalkState) {
            self.record("leave", node);
        }
        fn enter_send(&mut self, node: &Node, _state: &mut WalkState) {
            self.record("enter", node);
        }
        fn leave_send(&mut self, node: &Node, _state: &mut WalkState) {
            self.record("leave", node);
        }
        fn enter_int(&mut self, node: &Node, _state: &mut WalkState) {
            self.record("enter", node);
        }
        fn leave_int(&mut self, node: &Node, _state: &mut WalkState) {
            self.record("leave", node);
        }
    }

    /// Only subscribes to integer literals; everything else must fall
    /// through the default no-op handlers.
    #[derive(Default)]
    struct IntsOnly {
        seen: Vec<i64>,
    }

    impl Observer for IntsOnly {
        fn leave_int(&mut self, node: &Node, _state: &mut WalkState) {
            if let Some(Child::Int(value)) = node.child(0) {
                self.seen.push(*value);
            }
        }
    }

    fn sample_tree() -> Node {
        // (begin (send nil :puts [(int 1) (int 2)]))
        node(
            1,
            NodeKind::Begin,
            vec![Child::Node(node(
                2,
                NodeKind::Send,
                vec![
                    Child::Null,
                    Child::Name("puts".into()),
                    Child::Nodes(vec![
                        node(3, NodeKind::Int, vec![Child::Int(1)]),
                        node(4, NodeKind::Int, vec![Child::Int(2)]),
                    ]),
                ],
            ))],
        )
    }

    #[test]
    fn every_enter_has_a_matching_leave() {
        let tree = sample_tree();
        let mut recorder = Recorder::default();
        let mut state = WalkState::new("test.rb");
        Walker::new().bind(&mut recorder).walk(&tree, &mut state);

        assert_eq!(recorder.enters, recorder.leaves);
        assert_eq!(recorder.events.len(), 8);
    }

    #[test]
    fn leave_fires_strictly_after_all_descendant_events() {
        let tree = sample_tree();
        let mut recorder = Recorder::default();
        let mut state = WalkState::new("test.rb");
        Walker::new().bind(&mut recorder).walk(&tree, &mut state);

        assert_eq!(
            recorder.events,
            vec![
                ("enter", 1),
                ("enter", 2),
                ("enter", 3),
                ("leave", 3),
                ("enter", 4),
                ("leave", 4),
                ("leave", 2),
                ("leave", 1),
            ]
        );
    }

    #[test]
    fn node_list_children_are_visited_in_order() {
        let tree = sample_tree();
        let mut ints = IntsOnly::default();
        let mut state = WalkState::new("test.rb");
        Walker::new().bind(&mut ints).walk(&tree, &mut state);

        assert_eq!(ints.seen, vec![1, 2]);
    }

    #[test]
    fn multiple_observers_are_notified_independently() {
        let tree = sample_tree();
        let mut recorder = Recorder::default();
        let mut ints = IntsOnly::default();
        let mut state = WalkState::new("test.rb");
        Walker::new()
            .bind(&mut recorder)
            .bind(&mut ints)
            .walk(&tree, &mut state);

        assert_eq!(ints.seen, vec![1, 2]);
        assert_eq!(recorder.events.len(), 8);
    }

    #[test]
    fn childless_nodes_still_fire_both_events() {
        let tree = node(7, NodeKind::Begin, vec![]);
        let mut recorder = Recorder::default();
        let mut state = WalkState::new("empty.rb");
        Walker::new().bind(&mut recorder).walk(&tree, &mut state);

        assert_eq!(recorder.events, vec![("enter", 7), ("leave", 7)]);
    }
}
