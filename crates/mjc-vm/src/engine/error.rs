//! Runtime faults. Every variant aborts execution with exit code 1.

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("array index out of bounds: {index} (length {len})")]
    IndexOutOfBounds { index: i32, len: usize },
    #[error("stack overflow")]
    StackOverflow,
    #[error("unknown label %{0}")]
    UnknownLabel(String),
    #[error("unknown method {0}")]
    UnknownMethod(String),
    #[error("no main method")]
    NoMain,
    #[error("read of unset register {0}")]
    UnsetRegister(String),
    #[error("type error: {0}")]
    TypeError(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
