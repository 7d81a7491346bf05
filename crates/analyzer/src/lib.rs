//! Static analysis for Ruby sources.
//!
//! Each file is parsed, lowered, and executed symbolically to build a
//! definition graph; the configured analyses then read that graph back
//! and report diagnostics.

pub mod analyses;
pub mod ast;
pub mod config;
pub mod error;
pub mod graph;
pub mod report;
pub mod ruby;
pub mod runner;
pub mod stats;
pub mod vm;
pub mod walker;
