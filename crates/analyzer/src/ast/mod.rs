//! Syntax tree representation shared by the front end, the virtual machine
//! and the analyses.
//!
//! Nodes follow the shape produced by `ruby::parse_source`: a closed kind
//! tag plus an ordered list of children, where a child is either a nested
//! node, an ordered list of nodes, a literal (name, string, number) or an
//! explicit null slot for an omitted production. The per-kind child layouts
//! are documented in `ruby::lower`, which is the only place that builds
//! them.

use std::fmt::Write as _;

use crate::walker::WalkState;

/// Identity of a node within one parsed source. The virtual machine keys
/// its node-to-definition table by this, so two structurally equal nodes
/// stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A slot in a node's ordered child list.
#[derive(Debug, Clone)]
pub enum Child {
    Node(Node),
    Nodes(Vec<Node>),
    Name(String),
    Str(String),
    Int(i64),
    Float(f64),
    Null,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub children: Vec<Child>,
    pub location: SourceLocation,
}

impl Node {
    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    /// The child at `index` when it is a single node.
    pub fn node(&self, index: usize) -> Option<&Node> {
        match self.children.get(index) {
            Some(Child::Node(node)) => Some(node),
            _ => None,
        }
    }

    /// The child at `index` when it is a node list.
    pub fn nodes(&self, index: usize) -> Option<&[Node]> {
        match self.children.get(index) {
            Some(Child::Nodes(nodes)) => Some(nodes.as_slice()),
            _ => None,
        }
    }

    /// The child at `index` when it is a name literal.
    pub fn name(&self, index: usize) -> Option<&str> {
        match self.children.get(index) {
            Some(Child::Name(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.children.get(index), Some(Child::Null))
    }

    /// Renders the tree in the compact S-expression form used by
    /// `garnet dump-ast` and the lowering tests.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(self.kind.name());
        for child in &self.children {
            out.push(' ');
            match child {
                Child::Node(node) => node.write_sexp(out),
                Child::Nodes(nodes) => {
                    out.push('[');
                    for (index, node) in nodes.iter().enumerate() {
                        if index > 0 {
                            out.push(' ');
                        }
                        node.write_sexp(out);
                    }
                    out.push(']');
                }
                Child::Name(name) => {
                    out.push(':');
                    out.push_str(name);
                }
                Child::Str(text) => {
                    let _ = write!(out, "{text:?}");
                }
                Child::Int(value) => {
                    let _ = write!(out, "{value}");
                }
                Child::Float(value) => {
                    let _ = write!(out, "{value}");
                }
                Child::Null => out.push_str("nil"),
            }
        }
        out.push(')');
    }
}

/// Declares the closed set of node kinds once and derives everything that
/// hangs off it: the `NodeKind` enum, the kind names used in dumps, the
/// `Observer` trait with one defaulted enter/leave pair per kind, and the
/// dispatch used by `walker::Walker`. Adding a kind means adding one row
/// here and handling it in `ruby::lower`.
macro_rules! node_kinds {
    ($(($variant:ident, $name:literal, $enter:ident, $leave:ident)),+ $(,)?) => {
        /// The kind tag of a syntax node.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum NodeKind {
            $($variant),+
        }

        impl NodeKind {
            pub const fn name(self) -> &'static str {
                match self {
                    $(NodeKind::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for NodeKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }

        /// Receiver of traversal events. Every handler defaults to a
        /// no-op, so an observer implements only the node kinds it cares
        /// about; the walker invokes the enter handler before any child
        /// of the node is visited and the leave handler after all of
        /// them.
        pub trait Observer {
            $(
                fn $enter(&mut self, _node: &Node, _state: &mut WalkState) {}
                fn $leave(&mut self, _node: &Node, _state: &mut WalkState) {}
            )+
        }

        pub(crate) fn dispatch_enter(
            observer: &mut dyn Observer,
            node: &Node,
            state: &mut WalkState,
        ) {
            match node.kind {
                $(NodeKind::$variant => observer.$enter(node, state)),+
            }
        }

        pub(crate) fn dispatch_leave(
            observer: &mut dyn Observer,
            node: &Node,
            state: &mut WalkState,
        ) {
            match node.kind {
                $(NodeKind::$variant => observer.$leave(node, state)),+
            }
        }
    };
}

node_kinds! {
    (Begin, "begin", enter_begin, leave_begin),
    (Class, "class", enter_class, leave_class),
    (Sclass, "sclass", enter_sclass, leave_sclass),
    (Module, "module", enter_module, leave_module),
    (Def, "def", enter_def, leave_def),
    (Defs, "defs", enter_defs, leave_defs),
    (Args, "args", enter_args, leave_args),
    (Arg, "arg", enter_arg, leave_arg),
    (Optarg, "optarg", enter_optarg, leave_optarg),
    (Restarg, "restarg", enter_restarg, leave_restarg),
    (Kwarg, "kwarg", enter_kwarg, leave_kwarg),
    (Kwoptarg, "kwoptarg", enter_kwoptarg, leave_kwoptarg),
    (Kwrestarg, "kwrestarg", enter_kwrestarg, leave_kwrestarg),
    (Blockarg, "blockarg", enter_blockarg, leave_blockarg),
    (Block, "block", enter_block, leave_block),
    (BlockPass, "block_pass", enter_block_pass, leave_block_pass),
    (Lvasgn, "lvasgn", enter_lvasgn, leave_lvasgn),
    (Ivasgn, "ivasgn", enter_ivasgn, leave_ivasgn),
    (Cvasgn, "cvasgn", enter_cvasgn, leave_cvasgn),
    (Gvasgn, "gvasgn", enter_gvasgn, leave_gvasgn),
    (Casgn, "casgn", enter_casgn, leave_casgn),
    (Masgn, "masgn", enter_masgn, leave_masgn),
    (Mlhs, "mlhs", enter_mlhs, leave_mlhs),
    (Splat, "splat", enter_splat, leave_splat),
    (Kwsplat, "kwsplat", enter_kwsplat, leave_kwsplat),
    (Pair, "pair", enter_pair, leave_pair),
    (Const, "const", enter_const, leave_const),
    (Ident, "ident", enter_ident, leave_ident),
    (Ivar, "ivar", enter_ivar, leave_ivar),
    (Cvar, "cvar", enter_cvar, leave_cvar),
    (Gvar, "gvar", enter_gvar, leave_gvar),
    (Self_, "self", enter_self, leave_self),
    (Send, "send", enter_send, leave_send),
    (Csend, "csend", enter_csend, leave_csend),
    (Super, "super", enter_super, leave_super),
    (Yield, "yield", enter_yield, leave_yield),
    (Int, "int", enter_int, leave_int),
    (Float, "float", enter_float, leave_float),
    (Str, "str", enter_str, leave_str),
    (Dstr, "dstr", enter_dstr, leave_dstr),
    (Sym, "sym", enter_sym, leave_sym),
    (Regexp, "regexp", enter_regexp, leave_regexp),
    (Array, "array", enter_array, leave_array),
    (Hash, "hash", enter_hash, leave_hash),
    (Irange, "irange", enter_irange, leave_irange),
    (Erange, "erange", enter_erange, leave_erange),
    (Nil, "nil", enter_nil, leave_nil),
    (True, "true", enter_true, leave_true),
    (False, "false", enter_false, leave_false),
    (If, "if", enter_if, leave_if),
    (Case, "case", enter_case, leave_case),
    (When, "when", enter_when, leave_when),
    (While, "while", enter_while, leave_while),
    (Until, "until", enter_until, leave_until),
    (For, "for", enter_for, leave_for),
    (Return, "return", enter_return, leave_return),
    (Break, "break", enter_break, leave_break),
    (Next, "next", enter_next, leave_next),
    (And, "and", enter_and, leave_and),
    (Or, "or", enter_or, leave_or),
    (Rescue, "rescue", enter_rescue, leave_rescue),
    (Resbody, "resbody", enter_resbody, leave_resbody),
    (Ensure, "ensure", enter_ensure, leave_ensure),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, kind: NodeKind, children: Vec<Child>) -> Node {
        Node {
            id: NodeId(id),
            kind,
            children,
            location: SourceLocation::new(1, 0),
        }
    }

    #[test]
    fn kind_names_match_the_wire_tags() {
        assert_eq!(NodeKind::Class.name(), "class");
        assert_eq!(NodeKind::Self_.name(), "self");
        assert_eq!(NodeKind::BlockPass.name(), "block_pass");
        assert_eq!(NodeKind::Kwoptarg.to_string(), "kwoptarg");
    }

    #[test]
    fn sexp_rendering_covers_every_child_shape() {
        let send = node(
            2,
            NodeKind::Send,
            vec![
                Child::Null,
                Child::Name("puts".into()),
                Child::Nodes(vec![
                    node(3, NodeKind::Int, vec![Child::Int(1)]),
                    node(4, NodeKind::Str, vec![Child::Str("hi".into())]),
                ]),
            ],
        );
        let root = node(1, NodeKind::Begin, vec![Child::Node(send)]);

        assert_eq!(root.to_sexp(), r#"(begin (send nil :puts [(int 1) (str "hi")]))"#);
    }

    #[test]
    fn typed_child_accessors_reject_other_shapes() {
        let n = node(
            1,
            NodeKind::Def,
            vec![Child::Name("m".into()), Child::Null],
        );
        assert_eq!(n.name(0), Some("m"));
        assert!(n.node(0).is_none());
        assert!(n.is_null(1));
        assert!(!n.is_null(0));
        assert!(n.nodes(1).is_none());
    }
}
