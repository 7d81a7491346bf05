use crate::analyses::{Analysis, AnalysisKind};
use crate::ast::SourceLocation;
use crate::graph::DefKind;
use crate::report::Report;
use crate::ruby::ParsedSource;
use crate::vm::Evaluation;

/// Warns when a block parameter reuses the name of a variable that is
/// already bound in an enclosing activation, hiding it for the length
/// of the block.
///
/// The outer chain is walked through enclosing blocks up to and
/// including the method (or top level) that owns the activation. A
/// binding that only appears after the block in the source does not
/// count as shadowed.
pub struct Shadowing;

fn before(a: SourceLocation, b: SourceLocation) -> bool {
    (a.line, a.column) < (b.line, b.column)
}

impl Analysis for Shadowing {
    fn kind(&self) -> AnalysisKind {
        AnalysisKind::Shadowing
    }

    fn run(&self, _parsed: &ParsedSource, evaluation: &Evaluation, report: &mut Report) {
        let graph = &evaluation.graph;
        for (_, block) in graph.iter() {
            // Blocks are the anonymous scopes that carry a location.
            if block.kind != DefKind::Unknown || block.is_instance || block.location.is_none() {
                continue;
            }

            for (_, param) in block.parameters() {
                let param_def = graph.get(param);
                let (Some(name), Some(location)) = (param_def.name.as_deref(), param_def.location)
                else {
                    continue;
                };

                let mut scope = block.parents.first().copied();
                while let Some(outer) = scope {
                    let outer_def = graph.get(outer);
                    if let Some(binding) = outer_def.local_binding(name) {
                        let bound_at = graph.get(binding).location;
                        if bound_at.is_some_and(|at| before(at, location)) {
                            report.warning_at(
                                location,
                                format!("shadowing outer local variable - {name}"),
                            );
                        }
                        break;
                    }
                    if outer_def.confines_locals() {
                        break;
                    }
                    scope = outer_def.parents.first().copied();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyses::tests_support::analyze_with;

    #[test]
    fn block_parameters_shadowing_method_parameters_warn() {
        let report = analyze_with(
            &Shadowing,
            "def tally(items)\n  items.each { |items| items }\nend\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["shadowing outer local variable - items"]);
    }

    #[test]
    fn top_level_locals_count_as_outer_bindings() {
        let report = analyze_with(&Shadowing, "config = {}\n[1].each { |config| config }\n");

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["shadowing outer local variable - config"]);
    }

    #[test]
    fn nested_blocks_shadow_their_enclosing_block() {
        let report = analyze_with(
            &Shadowing,
            "[1].each do |x|\n  [2].map { |x| x }\nend\n",
        );

        let messages: Vec<_> = report.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["shadowing outer local variable - x"]);
    }

    #[test]
    fn bindings_created_after_the_block_do_not_shadow() {
        let report = analyze_with(&Shadowing, "[1].each { |x| x }\nx = 1\nx\n");

        assert!(report.is_empty());
    }

    #[test]
    fn sibling_methods_do_not_leak_their_locals() {
        let report = analyze_with(
            &Shadowing,
            "def fill\n  x = 1\n  x\nend\ndef drain\n  [1].each { |x| x }\nend\n",
        );

        assert!(report.is_empty());
    }
}
