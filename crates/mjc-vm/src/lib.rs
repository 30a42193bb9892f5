//! Direct interpreter for MJIR.
//!
//! Consumes the flattened instruction list the compiler emits and executes
//! it: heap objects and arrays behind reference-counted cells, a call stack
//! of register-file frames, wrapping 32-bit arithmetic. Faults (division by
//! zero, index out of bounds, stack overflow) abort with a [`RuntimeError`].

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod engine;

pub use engine::{RuntimeError, Value, Vm};
