use crate::analyses::{Analysis, AnalysisKind};
use crate::graph::DefKind;
use crate::report::Report;
use crate::ruby::ParsedSource;
use crate::vm::Evaluation;

/// Flags local variables and parameters that were bound in the source
/// but never read. Names starting with an underscore opt out, matching
/// the usual convention for deliberately ignored values.
pub struct UnusedVariables;

impl Analysis for UnusedVariables {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::UnusedVariables
    }

    fn run(&self, _parsed: &ParsedSource, evaluation: &Evaluation, report: &mut Report) {
        for (_, definition) in evaluation.graph.iter() {
            if definition.kind != DefKind::Lvar && !definition.kind.is_parameter() {
                continue;
            }
            if definition.reference_amount > 0 {
                continue;
            }
            // Definitions without a location came from the built-in
            // seeds, not from this file.
            let Some(location) = definition.location else {
                continue;
            };
            let Some(name) = definition.name.as_deref() else {
                continue;
            };
            if name.starts_with('_') {
                continue;
            }

            report.warning_at(
                location,
                format!("unused {} {name}", definition.kind.describe()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyses::tests_support::analyze_with;

    #[test]
    fn unread_locals_and_parameters_are_flagged() {
        let report = analyze_with(
            &UnusedVariables,
            "def greet(name, punctuation)\n  \"hi #{name}\"\nend\nleftover = 1\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert!(messages.contains(&"unused argument punctuation"));
        assert!(messages.contains(&"unused local variable leftover"));
        assert!(!messages.iter().any(|m| m.contains("name")));
    }

    #[test]
    fn underscore_names_opt_out() {
        let report = analyze_with(&UnusedVariables, "def on_event(_payload)\nend\n");

        assert!(report.is_empty());
    }

    #[test]
    fn block_parameters_are_covered() {
        let report = analyze_with(
            &UnusedVariables,
            "def each_pair(pairs)\n  pairs.each { |key, value| key }\nend\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["unused argument value"]);
    }

    #[test]
    fn builtin_seeds_never_surface() {
        let report = analyze_with(&UnusedVariables, "puts \"fine\"\n");

        assert!(report.is_empty());
    }
}
