//! The execution engine.

mod error;
mod frame;
mod value;
mod vm;


pub use error::RuntimeError;
pub use frame::Frame;
pub use value::{Object, Value};
pub use vm::Vm;
