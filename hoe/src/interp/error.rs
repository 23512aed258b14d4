//! Runtime errors for the interpreter

use std::fmt;

/// Runtime error during interpretation
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Kinds of runtime errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed source reaching the evaluator through meta-eval
    Syntax,
    /// Undefined variable, unknown procedure, or missing `$` binding
    UnresolvedName,
    /// Operand or payload of the wrong value variant
    TypeMismatch,
    /// Array index out of bounds or missing object key
    IndexError,
    /// Division by numeric zero
    ArithmeticError,
    /// Malformed construct shape, e.g. an odd `cond` branch count
    StructuralError,
    /// Recursion exceeded the evaluator's depth limit
    StackOverflow,
    /// Builtin registered but not implemented
    Unimplemented,
    /// File access failure during import
    Io,
}

impl RuntimeError {
    pub fn syntax(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Syntax,
            message: message.into(),
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UnresolvedName,
            message: format!("undefined variable: {name}"),
        }
    }

    pub fn undefined_proc(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::UnresolvedName,
            message: format!("unknown proc: {name}"),
        }
    }

    pub fn no_payload() -> Self {
        RuntimeError {
            kind: ErrorKind::UnresolvedName,
            message: "no payload bound in any active frame".to_string(),
        }
    }

    pub fn type_mismatch(expected: &str, got: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::TypeMismatch,
            message: format!("type error: expected {expected}, got {got}"),
        }
    }

    pub fn index_out_of_bounds(index: i64, len: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexError,
            message: format!("index {index} out of bounds for length {len}"),
        }
    }

    pub fn missing_key(key: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::IndexError,
            message: format!("missing object key: {key}"),
        }
    }

    pub fn division_by_zero() -> Self {
        RuntimeError {
            kind: ErrorKind::ArithmeticError,
            message: "division by zero".to_string(),
        }
    }

    pub fn cond_branch_mismatch(count: usize) -> Self {
        RuntimeError {
            kind: ErrorKind::StructuralError,
            message: format!("cond branches not matched: {count} commands"),
        }
    }

    pub fn stack_overflow() -> Self {
        RuntimeError {
            kind: ErrorKind::StackOverflow,
            message: "stack overflow: too deep recursion".to_string(),
        }
    }

    pub fn unimplemented(name: &str) -> Self {
        RuntimeError {
            kind: ErrorKind::Unimplemented,
            message: format!("builtin not implemented: {name}"),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Io,
            message: format!("IO error: {}", message.into()),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Runtime error: {}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Result type for interpreter operations
pub type InterpResult<T> = Result<T, RuntimeError>;
