//! The analyses that consume a completed evaluation.
//!
//! Each analysis runs after the virtual machine has fully walked a
//! file, so it sees the finished definition graph; a method defined at
//! the bottom of a class resolves for a call at the top. Analyses that
//! care about position walk the tree again with their own observer and
//! follow the scope chain through the node associations the machine
//! recorded. Analyses are independent of each other: every one gets
//! the same evaluation and appends to the same report.

mod argument_count;
mod shadowing;
mod undefined_methods;
mod undefined_variables;
mod unused_variables;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::ast::Node;
use crate::graph::{DefinitionGraph, DefinitionId};
use crate::report::Report;
use crate::ruby::ParsedSource;
use crate::vm::Evaluation;

pub use argument_count::ArgumentCount;
pub use shadowing::Shadowing;
pub use undefined_methods::UndefinedMethods;
pub use undefined_variables::UndefinedVariables;
pub use unused_variables::UnusedVariables;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisKind {
    UnusedVariables,
    UndefinedVariables,
    UndefinedMethods,
    ArgumentCount,
    Shadowing,
}

impl AnalysisKind {
    pub fn all() -> impl Iterator<Item = AnalysisKind> {
        Self::iter()
    }

    pub fn build(self) -> Box<dyn Analysis + Send + Sync> {
        match self {
            AnalysisKind::UnusedVariables => Box::new(UnusedVariables),
            AnalysisKind::UndefinedVariables => Box::new(UndefinedVariables),
            AnalysisKind::UndefinedMethods => Box::new(UndefinedMethods),
            AnalysisKind::ArgumentCount => Box::new(ArgumentCount),
            AnalysisKind::Shadowing => Box::new(Shadowing),
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            AnalysisKind::UnusedVariables => {
                "local variables and parameters that are never read"
            }
            AnalysisKind::UndefinedVariables => {
                "variable and constant references without a definition"
            }
            AnalysisKind::UndefinedMethods => {
                "calls on known receivers that resolve to no method"
            }
            AnalysisKind::ArgumentCount => {
                "calls whose argument count does not fit the method"
            }
            AnalysisKind::Shadowing => {
                "block parameters hiding a variable of an outer scope"
            }
        }
    }
}

/// Builds the requested analyses in a stable order.
pub fn build_analyses(kinds: &[AnalysisKind]) -> Vec<Box<dyn Analysis + Send + Sync>> {
    AnalysisKind::all()
        .filter(|kind| kinds.contains(kind))
        .map(AnalysisKind::build)
        .collect()
}

pub trait Analysis {
    fn kind(&self) -> AnalysisKind;

    fn run(&self, parsed: &ParsedSource, evaluation: &Evaluation, report: &mut Report);
}

/// Follows the machine's scope chain during a second walk by reusing
/// the node associations it recorded: every node that opened a scope
/// was associated with that scope's definition.
pub(crate) struct ScopeTracker<'a> {
    evaluation: &'a Evaluation,
    scopes: Vec<DefinitionId>,
}

impl<'a> ScopeTracker<'a> {
    pub(crate) fn new(evaluation: &'a Evaluation) -> Self {
        Self {
            evaluation,
            scopes: vec![evaluation.graph.root()],
        }
    }

    pub(crate) fn enter(&mut self, node: &Node) {
        if let Some(id) = self.evaluation.association(node) {
            self.scopes.push(id);
        }
    }

    pub(crate) fn leave(&mut self, node: &Node) {
        if self.evaluation.association(node).is_some() {
            self.scopes.pop();
        }
    }

    pub(crate) fn scopes(&self) -> &[DefinitionId] {
        &self.scopes
    }

    pub(crate) fn graph(&self) -> &DefinitionGraph {
        &self.evaluation.graph
    }

    pub(crate) fn association(&self, node: &Node) -> Option<DefinitionId> {
        self.evaluation.association(node)
    }
}

/// Observer methods that keep a `tracker` field in step with the scope
/// changing constructs. The using impl adds its own handlers next to
/// these.
macro_rules! track_scopes {
    () => {
        fn enter_class(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.enter(node);
        }

        fn leave_class(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.leave(node);
        }

        fn enter_module(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.enter(node);
        }

        fn leave_module(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.leave(node);
        }

        fn enter_sclass(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.enter(node);
        }

        fn leave_sclass(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.leave(node);
        }

        fn enter_def(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.enter(node);
        }

        fn leave_def(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.leave(node);
        }

        fn enter_defs(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.enter(node);
        }

        fn leave_defs(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.leave(node);
        }

        fn enter_block(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.enter(node);
        }

        fn leave_block(&mut self, node: &Node, _state: &mut WalkState) {
            self.tracker.leave(node);
        }
    };
}

pub(crate) use track_scopes;

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;
    use crate::graph::builtins::BuiltinLibrary;
    use crate::ruby::parse_source;
    use crate::vm::VirtualMachine;

    /// Runs one analysis over one source string and hands back its
    /// report.
    pub(crate) fn analyze_with(analysis: &dyn Analysis, source: &str) -> Report {
        let mut graph = DefinitionGraph::new();
        BuiltinLibrary::standard().seed(&mut graph);
        let parsed = parse_source(source, "test.rb").expect("test source should parse");
        let evaluation = VirtualMachine::new(graph)
            .run(&parsed)
            .expect("test source should evaluate");
        let mut report = Report::new();
        analysis.run(&parsed, &evaluation, &mut report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kinds_parse_from_their_kebab_case_names() {
        assert_eq!(
            AnalysisKind::from_str("unused-variables").unwrap(),
            AnalysisKind::UnusedVariables
        );
        assert_eq!(
            AnalysisKind::from_str("argument-count").unwrap(),
            AnalysisKind::ArgumentCount
        );
        assert!(AnalysisKind::from_str("made-up").is_err());
    }

    #[test]
    fn kinds_display_matches_their_parse_names() {
        for kind in AnalysisKind::all() {
            let rendered = kind.to_string();
            assert_eq!(AnalysisKind::from_str(&rendered).unwrap(), kind);
        }
    }

    #[test]
    fn building_keeps_a_stable_order() {
        let kinds = [AnalysisKind::Shadowing, AnalysisKind::UnusedVariables];
        let built = build_analyses(&kinds);
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].kind(), AnalysisKind::UnusedVariables);
        assert_eq!(built[1].kind(), AnalysisKind::Shadowing);
    }
}
