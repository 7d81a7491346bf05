use rustc_hash::FxHashSet;

use crate::analyses::{track_scopes, Analysis, AnalysisKind, ScopeTracker};
use crate::ast::{Node, NodeId, NodeKind, Observer};
use crate::graph::{DefKind, DefinitionId};
use crate::report::Report;
use crate::ruby::ParsedSource;
use crate::vm::{constant_path, Evaluation};
use crate::walker::{WalkState, Walker};

/// Flags instance, class and global variable reads and constant
/// references that resolve to nothing in the finished graph.
///
/// Resolution runs against the completed evaluation rather than the
/// machine's walk-time associations, so a variable assigned further
/// down its class body still counts as defined.
pub struct UndefinedVariables;

impl Analysis for UndefinedVariables {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::UndefinedVariables
    }

    fn run(&self, parsed: &ParsedSource, evaluation: &Evaluation, report: &mut Report) {
        let mut visitor = Visitor {
            tracker: ScopeTracker::new(evaluation),
            report,
            suppressed: FxHashSet::default(),
        };
        let mut state = WalkState::new(parsed.file.display().to_string());
        let mut walker = Walker::new();
        walker.bind(&mut visitor);
        walker.walk(&parsed.root, &mut state);
    }
}

/// Globals the interpreter populates on its own: regexp captures such
/// as `$1` and the single-character specials like `$~` and `$;`.
fn is_special_global(name: &str) -> bool {
    let bare = name.strip_prefix('$').unwrap_or(name);
    bare.chars().all(|c| c.is_ascii_digit())
        || (bare.len() == 1 && bare.chars().next().is_some_and(|c| !c.is_alphanumeric()))
}

struct Visitor<'a> {
    tracker: ScopeTracker<'a>,
    report: &'a mut Report,
    /// Constant nodes whose failure was already reported or cannot be
    /// judged; their parents stay quiet instead of cascading.
    suppressed: FxHashSet<NodeId>,
}

impl Visitor<'_> {
    fn check_variable(&mut self, node: &Node, kind: DefKind, description: &str) {
        let Some(name) = node.name(0) else {
            return;
        };
        let graph = self.tracker.graph();
        let scope = match kind {
            DefKind::Gvar => graph.root(),
            _ => graph.nearest_constant_scope(self.tracker.scopes()),
        };
        if graph.lookup(scope, kind, name).is_none() {
            self.report
                .error(node, format!("undefined {description} {name}"));
        }
    }

    /// Re-resolves a constant chain against the finished graph,
    /// preferring what the machine already recorded.
    fn resolve_const_node(&self, node: &Node) -> Option<DefinitionId> {
        if let Some(id) = self.tracker.association(node) {
            return Some(id);
        }
        let name = node.name(1)?;
        match node.node(0) {
            None => self
                .tracker
                .graph()
                .resolve_constant(self.tracker.scopes(), name),
            Some(qualifier) if qualifier.kind == NodeKind::Const => {
                let base = self.resolve_const_node(qualifier)?;
                self.tracker.graph().lookup(base, DefKind::Const, name)
            }
            Some(_) => None,
        }
    }

    fn written_path(&self, node: &Node) -> String {
        match constant_path(node) {
            Some(path) => path.join("::"),
            None => node.name(1).unwrap_or_default().to_owned(),
        }
    }
}

impl Observer for Visitor<'_> {
    track_scopes!();

    fn leave_ivar(&mut self, node: &Node, _state: &mut WalkState) {
        self.check_variable(node, DefKind::Ivar, "instance variable");
    }

    fn leave_cvar(&mut self, node: &Node, _state: &mut WalkState) {
        self.check_variable(node, DefKind::Cvar, "class variable");
    }

    fn leave_gvar(&mut self, node: &Node, _state: &mut WalkState) {
        if node.name(0).is_some_and(is_special_global) {
            return;
        }
        self.check_variable(node, DefKind::Gvar, "global variable");
    }

    fn leave_const(&mut self, node: &Node, _state: &mut WalkState) {
        if self.resolve_const_node(node).is_some() {
            return;
        }

        let cascade = match node.node(0) {
            // Dynamic qualifiers make the whole path unknowable.
            Some(qualifier) if qualifier.kind != NodeKind::Const => true,
            Some(qualifier) => self.suppressed.contains(&qualifier.id),
            None => false,
        };
        self.suppressed.insert(node.id);
        if !cascade {
            let path = self.written_path(node);
            self.report
                .error(node, format!("undefined constant {path}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyses::tests_support::analyze_with;

    #[test]
    fn instance_variables_resolve_across_the_whole_class_body() {
        let report = analyze_with(
            &UndefinedVariables,
            "class Counter\n  def show\n    @count\n  end\n  def bump\n    @count = 1\n  end\nend\n",
        );

        assert!(report.is_empty());
    }

    #[test]
    fn variables_never_assigned_are_flagged() {
        let report = analyze_with(
            &UndefinedVariables,
            "class Counter\n  def show\n    @count\n  end\nend\n@@mode\n$custom\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"undefined instance variable @count"));
        assert!(messages.contains(&"undefined class variable @@mode"));
        assert!(messages.contains(&"undefined global variable $custom"));
    }

    #[test]
    fn interpreter_owned_globals_stay_quiet() {
        let report = analyze_with(&UndefinedVariables, "$stdout\n$PROGRAM_NAME\n");

        assert!(report.is_empty());
    }

    #[test]
    fn unknown_constants_are_reported_once_per_chain() {
        let report = analyze_with(&UndefinedVariables, "Missing::Inner.run\nString\n");

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["undefined constant Missing"]);
    }

    #[test]
    fn known_scopes_report_their_missing_children_by_path() {
        let report = analyze_with(
            &UndefinedVariables,
            "module Outer\nend\nOuter::Gone\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["undefined constant Outer::Gone"]);
    }

    #[test]
    fn class_definitions_do_not_trip_their_own_names() {
        let report = analyze_with(
            &UndefinedVariables,
            "module Billing\n  class Invoice\n  end\nend\nBilling::Invoice\n",
        );

        assert!(report.is_empty());
    }
}
