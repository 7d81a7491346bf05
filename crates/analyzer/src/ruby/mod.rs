//! Ruby source parsing.
//!
//! Files are parsed with tree-sitter and lowered into the analyzer's own
//! expression tree before anything downstream looks at them. A file that
//! does not parse is rejected here; analysis only ever sees well-formed
//! trees.

mod lower;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::{Language, Parser};

use crate::ast::Node;
use lower::Lowerer;

/// Why a file could not be parsed. The offending file stays available as
/// a field; messages leave it out so reporting layers can prefix paths
/// their own way.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("the Ruby grammar failed to load: {0}")]
    Language(#[from] tree_sitter::LanguageError),
    #[error("the parser produced no syntax tree")]
    Unavailable { file: PathBuf },
    #[error("invalid syntax at line {line}")]
    Syntax { file: PathBuf, line: u32 },
}

/// A lowered source file, ready to be walked.
#[derive(Debug)]
pub struct ParsedSource {
    pub file: PathBuf,
    pub root: Node,
}

pub fn parse_source(source: &str, file: impl AsRef<Path>) -> Result<ParsedSource, ParseError> {
    let file = file.as_ref().to_path_buf();

    let mut parser = Parser::new();
    parser.set_language(&Language::new(tree_sitter_ruby::LANGUAGE))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ParseError::Unavailable { file: file.clone() })?;

    let tree_root = tree.root_node();
    if tree_root.has_error() {
        let line = first_error_line(tree_root).unwrap_or(1);
        return Err(ParseError::Syntax { file, line });
    }

    let root = Lowerer::new(source).lower_program(tree_root);
    Ok(ParsedSource { file, root })
}

fn first_error_line(node: tree_sitter::Node<'_>) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row as u32 + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(line) = first_error_line(child) {
            return Some(line);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn parse(source: &str) -> ParsedSource {
        parse_source(source, "test.rb").unwrap()
    }

    #[test]
    fn classes_lower_with_name_superclass_and_body() {
        let parsed = parse("class Foo < Bar\n  def baz\n  end\nend\n");

        let class = parsed.root.node(0).unwrap();
        assert_eq!(class.kind, NodeKind::Class);

        let name = class.node(0).unwrap();
        assert_eq!(name.kind, NodeKind::Const);
        assert_eq!(name.name(1), Some("Foo"));

        let superclass = class.node(1).unwrap();
        assert_eq!(superclass.name(1), Some("Bar"));

        let body = class.node(2).unwrap();
        assert_eq!(body.kind, NodeKind::Def);
        assert_eq!(body.name(0), Some("baz"));
    }

    #[test]
    fn every_parameter_kind_keeps_its_shape() {
        let parsed = parse("def add(a, b = 1, *rest, key:, mode: :fast, **opts, &blk)\nend\n");

        let def = parsed.root.node(0).unwrap();
        let args = def.node(1).unwrap();
        assert_eq!(args.kind, NodeKind::Args);

        let kinds: Vec<_> = (0..args.children.len())
            .filter_map(|index| args.node(index))
            .map(|param| param.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Arg,
                NodeKind::Optarg,
                NodeKind::Restarg,
                NodeKind::Kwarg,
                NodeKind::Kwoptarg,
                NodeKind::Kwrestarg,
                NodeKind::Blockarg,
            ]
        );
        assert_eq!(args.node(1).unwrap().name(0), Some("b"));
        assert_eq!(args.node(1).unwrap().node(1).unwrap().kind, NodeKind::Int);
    }

    #[test]
    fn blocks_wrap_their_call() {
        let parsed = parse("items = [1, 2]\nitems.each do |item|\n  puts item\nend\n");

        let assignment = parsed.root.node(0).unwrap();
        assert_eq!(assignment.kind, NodeKind::Lvasgn);
        assert_eq!(assignment.name(0), Some("items"));
        assert_eq!(assignment.node(1).unwrap().kind, NodeKind::Array);

        let block = parsed.root.node(1).unwrap();
        assert_eq!(block.kind, NodeKind::Block);

        let call = block.node(0).unwrap();
        assert_eq!(call.kind, NodeKind::Send);
        assert_eq!(call.name(1), Some("each"));
        assert_eq!(call.node(0).unwrap().kind, NodeKind::Ident);

        let params = block.node(1).unwrap();
        assert_eq!(params.node(0).unwrap().name(0), Some("item"));

        let body = block.node(2).unwrap();
        assert_eq!(body.kind, NodeKind::Send);
        assert_eq!(body.name(1), Some("puts"));
    }

    #[test]
    fn compound_assignment_reads_the_target_first() {
        let parsed = parse("total = 0\ntotal += 1\n");

        let compound = parsed.root.node(1).unwrap();
        assert_eq!(compound.kind, NodeKind::Lvasgn);

        let value = compound.node(1).unwrap();
        assert_eq!(value.kind, NodeKind::Send);
        assert_eq!(value.name(1), Some("+"));
        assert_eq!(value.node(0).unwrap().kind, NodeKind::Ident);
    }

    #[test]
    fn or_assignment_lowers_without_a_self_read() {
        let parsed = parse("@cache ||= {}\n");

        let assignment = parsed.root.node(0).unwrap();
        assert_eq!(assignment.kind, NodeKind::Ivasgn);
        assert_eq!(assignment.name(0), Some("@cache"));
        assert_eq!(assignment.node(1).unwrap().kind, NodeKind::Hash);
    }

    #[test]
    fn interpolated_strings_keep_their_expressions() {
        let parsed = parse("name = \"ruby\"\nputs \"hi #{name}\"\n");

        let call = parsed.root.node(1).unwrap();
        let argument = call.nodes(2).unwrap().first().unwrap();
        assert_eq!(argument.kind, NodeKind::Dstr);

        let reads_name = (0..argument.children.len())
            .filter_map(|index| argument.node(index))
            .any(|part| part.kind == NodeKind::Ident && part.name(0) == Some("name"));
        assert!(reads_name);
    }

    #[test]
    fn elsif_chains_nest_as_conditionals() {
        let parsed = parse("if a\n  1\nelsif b\n  2\nelse\n  3\nend\n");

        let outer = parsed.root.node(0).unwrap();
        assert_eq!(outer.kind, NodeKind::If);

        let inner = outer.node(2).unwrap();
        assert_eq!(inner.kind, NodeKind::If);
        assert_eq!(inner.node(0).unwrap().name(0), Some("b"));
        assert!(inner.node(2).is_some());
    }

    #[test]
    fn multiple_assignment_lists_every_target() {
        let parsed = parse("a, b = 1, 2\n");

        let assignment = parsed.root.node(0).unwrap();
        assert_eq!(assignment.kind, NodeKind::Masgn);

        let targets = assignment.node(0).unwrap();
        assert_eq!(targets.kind, NodeKind::Mlhs);
        assert_eq!(targets.node(0).unwrap().name(0), Some("a"));
        assert_eq!(targets.node(1).unwrap().name(0), Some("b"));

        assert_eq!(assignment.node(1).unwrap().kind, NodeKind::Array);
    }

    #[test]
    fn qualified_constants_nest_left_to_right() {
        let parsed = parse("A::B::C\n");

        let outer = parsed.root.node(0).unwrap();
        assert_eq!(outer.kind, NodeKind::Const);
        assert_eq!(outer.name(1), Some("C"));

        let middle = outer.node(0).unwrap();
        assert_eq!(middle.name(1), Some("B"));
        assert_eq!(middle.node(0).unwrap().name(1), Some("A"));
    }

    #[test]
    fn singleton_class_bodies_lower_to_their_target() {
        let parsed = parse("class Foo\n  class << self\n    def build\n    end\n  end\nend\n");

        let class = parsed.root.node(0).unwrap();
        let sclass = class.node(2).unwrap();
        assert_eq!(sclass.kind, NodeKind::Sclass);
        assert_eq!(sclass.node(0).unwrap().kind, NodeKind::Self_);
        assert_eq!(sclass.node(1).unwrap().kind, NodeKind::Def);
    }

    #[test]
    fn aliases_become_alias_method_calls() {
        let parsed = parse("alias shout speak\n");

        let call = parsed.root.node(0).unwrap();
        assert_eq!(call.kind, NodeKind::Send);
        assert_eq!(call.name(1), Some("alias_method"));

        let arguments = call.nodes(2).unwrap();
        assert_eq!(arguments.len(), 2);
        assert_eq!(arguments[0].name(0), Some("shout"));
        assert_eq!(arguments[1].name(0), Some("speak"));
    }

    #[test]
    fn safe_navigation_is_distinguished() {
        let parsed = parse("user&.name\n");

        let call = parsed.root.node(0).unwrap();
        assert_eq!(call.kind, NodeKind::Csend);
        assert_eq!(call.name(1), Some("name"));
    }

    #[test]
    fn invalid_syntax_is_rejected_with_a_line() {
        let error = parse_source("class Foo\n  def broken(\nend\n", "bad.rb").unwrap_err();
        match error {
            ParseError::Syntax { file, line } => {
                assert_eq!(file, PathBuf::from("bad.rb"));
                assert!(line >= 1);
            }
            other => panic!("expected a syntax error, got {other}"),
        }
    }

    #[test]
    fn locations_are_one_based_lines() {
        let parsed = parse("x = 1\ny = 2\n");

        let second = parsed.root.node(1).unwrap();
        assert_eq!(second.location.line, 2);
        assert_eq!(second.location.column, 0);
    }
}
