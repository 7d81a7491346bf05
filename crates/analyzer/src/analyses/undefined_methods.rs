use crate::analyses::{track_scopes, Analysis, AnalysisKind, ScopeTracker};
use crate::ast::{Node, Observer};
use crate::graph::DefKind;
use crate::report::Report;
use crate::ruby::ParsedSource;
use crate::vm::Evaluation;
use crate::walker::{WalkState, Walker};

/// Calls the machine consumed as definition directives rather than
/// resolving them as methods.
const DIRECTIVES: &[&str] = &[
    "attr",
    "attr_accessor",
    "attr_reader",
    "attr_writer",
    "include",
    "prepend",
    "extend",
    "private",
    "protected",
    "public",
    "alias_method",
];

/// Flags calls that cannot resolve to any method even in the finished
/// graph. Calls whose receiver is unknown, or whose receiver is the
/// result of another call, stay quiet; guessing there would drown real
/// findings in noise.
pub struct UndefinedMethods;

impl Analysis for UndefinedMethods {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::UndefinedMethods
    }

    fn run(&self, parsed: &ParsedSource, evaluation: &Evaluation, report: &mut Report) {
        let mut visitor = Visitor {
            tracker: ScopeTracker::new(evaluation),
            report,
        };
        let mut state = WalkState::new(parsed.file.display().to_string());
        let mut walker = Walker::new();
        walker.bind(&mut visitor);
        walker.walk(&parsed.root, &mut state);
    }
}

struct Visitor<'a> {
    tracker: ScopeTracker<'a>,
    report: &'a mut Report,
}

impl Visitor<'_> {
    fn check_send(&mut self, node: &Node) {
        if self.tracker.association(node).is_some() {
            return;
        }
        let Some(name) = node.name(1) else {
            return;
        };

        if node.is_null(0) {
            if DIRECTIVES.contains(&name) {
                return;
            }
            if self
                .tracker
                .graph()
                .resolve_bare_method(self.tracker.scopes(), name)
                .is_none()
            {
                self.report
                    .error(node, format!("undefined method '{name}'"));
            }
            return;
        }

        let Some(receiver) = node.node(0).and_then(|r| self.tracker.association(r)) else {
            return;
        };
        let graph = self.tracker.graph();
        let receiver = graph.resolve_value(receiver);
        let definition = graph.get(receiver);
        if definition.kind.is_method() {
            return;
        }

        let resolved = if definition.is_instance {
            graph.lookup(receiver, DefKind::InstanceMethod, name)
        } else if definition.kind == DefKind::Const {
            graph
                .lookup(receiver, DefKind::ClassMethod, name)
                .or_else(|| graph.lookup(receiver, DefKind::InstanceMethod, name))
        } else {
            return;
        };
        if resolved.is_some() {
            return;
        }

        let message = match (&definition.name, definition.is_instance) {
            (Some(receiver_name), true) => {
                format!("undefined method '{name}' for an instance of {receiver_name}")
            }
            (Some(receiver_name), false) => {
                format!("undefined method '{name}' for {receiver_name}")
            }
            (None, _) => format!("undefined method '{name}'"),
        };
        self.report.error(node, message);
    }
}

impl Observer for Visitor<'_> {
    track_scopes!();

    fn leave_ident(&mut self, node: &Node, _state: &mut WalkState) {
        if self.tracker.association(node).is_some() {
            return;
        }
        let Some(name) = node.name(0) else {
            return;
        };
        // Bare visibility keywords switch state instead of resolving.
        if matches!(name, "private" | "protected" | "public") {
            return;
        }
        if self
            .tracker
            .graph()
            .resolve_bare_method(self.tracker.scopes(), name)
            .is_some()
        {
            return;
        }
        self.report.error(
            node,
            format!("undefined local variable or method '{name}'"),
        );
    }

    fn leave_send(&mut self, node: &Node, _state: &mut WalkState) {
        self.check_send(node);
    }

    fn leave_csend(&mut self, node: &Node, _state: &mut WalkState) {
        self.check_send(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyses::tests_support::analyze_with;

    #[test]
    fn calls_to_methods_defined_later_resolve() {
        let report = analyze_with(
            &UndefinedMethods,
            "class Machine\n  def run\n    prepare\n  end\n  def prepare\n  end\nend\n",
        );

        assert!(report.is_empty());
    }

    #[test]
    fn misspelled_calls_on_instances_name_the_class() {
        let report = analyze_with(
            &UndefinedMethods,
            "class Dog\n  def bark\n  end\nend\nrex = Dog.new\nrex.barl\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["undefined method 'barl' for an instance of Dog"]
        );
    }

    #[test]
    fn class_side_calls_name_the_class() {
        let report = analyze_with(
            &UndefinedMethods,
            "class Dog\nend\nDog.fetch_all\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["undefined method 'fetch_all' for Dog"]);
    }

    #[test]
    fn bare_identifiers_read_as_locals_or_methods() {
        let report = analyze_with(&UndefinedMethods, "puts total\n");

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["undefined local variable or method 'total'"]
        );
    }

    #[test]
    fn locals_assigned_after_use_are_still_unresolved_at_the_use() {
        let report = analyze_with(&UndefinedMethods, "puts total\ntotal = 1\n");

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["undefined local variable or method 'total'"]
        );
    }

    #[test]
    fn chained_calls_and_unknown_receivers_stay_quiet() {
        let report = analyze_with(
            &UndefinedMethods,
            "def handle(payload)\n  payload.frobnicate\n  \"x\".upcase.something\nend\n",
        );

        assert!(report.is_empty());
    }

    #[test]
    fn literal_receivers_are_checked() {
        let report = analyze_with(&UndefinedMethods, "\"word\".upcasey\n");

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["undefined method 'upcasey' for an instance of String"]
        );
    }

    #[test]
    fn safe_navigation_is_checked_like_a_plain_call() {
        let report = analyze_with(
            &UndefinedMethods,
            "class Dog\n  def bark\n  end\nend\nDog.new&.bite\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["undefined method 'bite' for an instance of Dog"]
        );
    }

    #[test]
    fn directives_are_not_method_calls() {
        let report = analyze_with(
            &UndefinedMethods,
            "class Person\n  attr_reader :name\n  private\nend\n",
        );

        assert!(report.is_empty());
    }
}
