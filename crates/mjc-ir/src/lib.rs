//! MJIR: the three-address intermediate representation of the MiniJava
//! compiler.
//!
//! This crate holds the instruction set, basic blocks, per-method
//! control-flow graphs, and the whole-program [`Module`] that the compiler
//! emits and the interpreter consumes:
//! - `instr` - instructions, operand conventions, use/def accessors
//! - `block` - basic blocks and CFGs
//! - `module` - functions, class records, the global text section
//! - `dump` - the textual instruction format
//! - `verify` - structural well-formedness checks

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod block;
pub mod dump;
pub mod instr;
pub mod module;
pub mod verify;

#[cfg(test)]
mod block_tests;
#[cfg(test)]
mod dump_tests;

pub use block::{BasicBlock, BlockId, Cfg};
pub use instr::{BinOp, Instr, IrType, Lit};
pub use module::{ClassRecord, Function, Module};
pub use verify::{VerifyError, is_numbered_temp, verify_cfg, verify_temps};
