pub mod analyses;
pub mod check;
pub mod dump_ast;
