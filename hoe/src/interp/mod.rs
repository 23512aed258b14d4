//! Tree-walking evaluator: values, frames, builtins, and the interpreter

mod builtin;
mod error;
mod eval;
mod frame;
mod value;

pub use error::{ErrorKind, InterpResult, RuntimeError};
pub use eval::Interpreter;
pub use frame::{Frame, CURSOR, PAYLOAD};
pub use value::Value;
