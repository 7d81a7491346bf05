use crate::analyses::{Analysis, AnalysisKind};
use crate::ast::{Node, NodeKind, Observer};
use crate::graph::{DefKind, DefinitionId};
use crate::report::Report;
use crate::ruby::ParsedSource;
use crate::vm::Evaluation;
use crate::walker::{WalkState, Walker};

/// Checks every resolved call against the callee's parameter list.
///
/// Only positional arity is judged. A splat argument makes the given
/// count unknowable and skips the call; keyword arguments passed to a
/// method without keyword parameters collapse into one trailing hash,
/// matching how the language delivers them.
pub struct ArgumentCount;

impl Analysis for ArgumentCount {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::ArgumentCount
    }

    fn run(&self, parsed: &ParsedSource, evaluation: &Evaluation, report: &mut Report) {
        let mut visitor = Visitor { evaluation, report };
        let mut state = WalkState::new(parsed.file.display().to_string());
        let mut walker = Walker::new();
        walker.bind(&mut visitor);
        walker.walk(&parsed.root, &mut state);
    }
}

struct Visitor<'a> {
    evaluation: &'a Evaluation,
    report: &'a mut Report,
}

impl Visitor<'_> {
    fn check_call(&mut self, node: &Node) {
        let Some(target) = self.evaluation.association(node) else {
            return;
        };
        let graph = &self.evaluation.graph;
        let target_def = graph.get(target);

        // A construction call associates the new instance; its arity is
        // the constructor's.
        let method = if target_def.kind.is_method() {
            target
        } else if target_def.is_instance && node.name(1) == Some("new") {
            let Some(&class) = target_def.parents.first() else {
                return;
            };
            match graph.lookup(class, DefKind::InstanceMethod, "initialize") {
                Some(initialize) => initialize,
                None => return,
            }
        } else {
            return;
        };

        let arguments = node.nodes(2).unwrap_or(&[]);
        if arguments.iter().any(|a| a.kind == NodeKind::Splat) {
            return;
        }

        let mut positional = 0usize;
        let mut keywords = false;
        for argument in arguments {
            match argument.kind {
                NodeKind::Pair | NodeKind::Kwsplat => keywords = true,
                NodeKind::BlockPass => {}
                _ => positional += 1,
            }
        }

        self.check_arity(node, method, positional, keywords);
    }

    fn check_arity(&mut self, node: &Node, method: DefinitionId, positional: usize, keywords: bool) {
        let graph = &self.evaluation.graph;
        let mut required = 0usize;
        let mut optional = 0usize;
        let mut rest = false;
        let mut keyword_params = false;
        for (kind, _) in graph.get(method).parameters() {
            match kind {
                DefKind::Arg => required += 1,
                DefKind::Optarg => optional += 1,
                DefKind::Restarg => rest = true,
                DefKind::Kwarg | DefKind::Kwoptarg | DefKind::Kwrestarg => keyword_params = true,
                _ => {}
            }
        }

        let given = positional + usize::from(keywords && !keyword_params);
        let maximum = required + optional;
        if given >= required && (rest || given <= maximum) {
            return;
        }

        let expected = if rest {
            format!("{required}+")
        } else if optional > 0 {
            format!("{required}..{maximum}")
        } else {
            required.to_string()
        };
        self.report.error(
            node,
            format!("wrong number of arguments (given {given}, expected {expected})"),
        );
    }
}

impl Observer for Visitor<'_> {
    fn leave_send(&mut self, node: &Node, _state: &mut WalkState) {
        self.check_call(node);
    }

    fn leave_csend(&mut self, node: &Node, _state: &mut WalkState) {
        self.check_call(node);
    }

    // A bare identifier that resolved to a method is a call without
    // arguments.
    fn leave_ident(&mut self, node: &Node, _state: &mut WalkState) {
        let Some(target) = self.evaluation.association(node) else {
            return;
        };
        if !self.evaluation.graph.get(target).kind.is_method() {
            return;
        }
        self.check_arity(node, target, 0, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyses::tests_support::analyze_with;

    fn messages(source: &str) -> Vec<String> {
        analyze_with(&ArgumentCount, source)
            .iter()
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn exact_arities_must_match() {
        let found = messages("def pair(a, b)\nend\npair(1)\n");

        assert_eq!(
            found,
            vec!["wrong number of arguments (given 1, expected 2)"]
        );
    }

    #[test]
    fn optional_parameters_widen_the_range() {
        let found = messages(
            "def greet(name, greeting = \"hi\")\nend\ngreet\ngreet(\"a\", \"b\", \"c\")\ngreet(\"a\")\n",
        );

        assert_eq!(
            found,
            vec![
                "wrong number of arguments (given 0, expected 1..2)",
                "wrong number of arguments (given 3, expected 1..2)",
            ]
        );
    }

    #[test]
    fn rest_parameters_remove_the_maximum() {
        let found = messages(
            "def tagged(tag, *values)\nend\ntagged(\"a\", 1, 2, 3)\ntagged\n",
        );

        assert_eq!(
            found,
            vec!["wrong number of arguments (given 0, expected 1+)"]
        );
    }

    #[test]
    fn splat_arguments_disable_the_check() {
        let found = messages("def pair(a, b)\nend\nvalues = [1, 2]\npair(*values)\n");

        assert!(found.is_empty());
    }

    #[test]
    fn construction_checks_the_constructor() {
        let found = messages(
            "class Point\n  def initialize(x, y)\n  end\nend\nPoint.new(1)\nPoint.new(1, 2)\n",
        );

        assert_eq!(
            found,
            vec!["wrong number of arguments (given 1, expected 2)"]
        );
    }

    #[test]
    fn keywords_collapse_into_a_trailing_hash() {
        let found = messages(
            "def connect(host, options = {})\nend\nconnect(\"db\", port: 5432, retries: 3)\n",
        );

        assert!(found.is_empty());
    }

    #[test]
    fn keyword_parameters_consume_their_keywords() {
        let found = messages("def fetch(key, mode:)\nend\nfetch(:a, mode: :fast)\n");

        assert!(found.is_empty());
    }

    #[test]
    fn builtin_signatures_are_enforced() {
        let found = messages("\"word\".upcase(1, 2)\nputs(1, 2, 3)\n");

        assert_eq!(
            found,
            vec!["wrong number of arguments (given 2, expected 0)"]
        );
    }
}
