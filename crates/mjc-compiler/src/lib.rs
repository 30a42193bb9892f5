//! MiniJava compiler front end and middle end.
//!
//! The pipeline is a straight line, each stage consuming the previous
//! stage's output:
//! - `parser` - lexer and recursive-descent parser producing the AST
//! - `analyze` - symbol tables and type checking
//! - `codegen` - lowering to MJIR control-flow graphs
//! - `dataflow` - reaching-definitions/liveness-driven optimization
//! - `diagnostics` - fatal, pinpointed error reporting
//!
//! The top-level functions run prefixes of the pipeline; every stage stops
//! at the first error.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod analyze;
pub mod codegen;
pub mod dataflow;
pub mod diagnostics;
pub mod parser;
pub mod source;

#[cfg(test)]
mod pipeline_tests;

pub use diagnostics::{Diagnostic, DiagnosticsPrinter, SemanticErrorKind};
pub use source::{Coord, LineIndex};

use mjc_ir::Module;

use analyze::Analysis;
use dataflow::OptimizeStats;
use parser::ast::Program;

/// Result type of every compiler stage.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Lex and parse.
pub fn parse(source: &str) -> Result<Program> {
    parser::parse_program(source)
}

/// Lex, parse, build symbol tables, and type check.
pub fn check(source: &str) -> Result<(Program, Analysis)> {
    let program = parse(source)?;
    let analysis = analyze::analyze(&program)?;
    Ok((program, analysis))
}

/// The full pipeline up to MJIR.
pub fn compile(source: &str) -> Result<Module> {
    let (program, analysis) = check(source)?;
    Ok(codegen::lower(&program, &analysis))
}

/// The full pipeline including the dataflow optimizer.
pub fn compile_optimized(source: &str) -> Result<(Module, OptimizeStats)> {
    let mut module = compile(source)?;
    let stats = dataflow::optimize(&mut module);
    Ok((module, stats))
}
