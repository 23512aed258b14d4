//! Hoe language library
//!
//! A tiny dynamically-typed scripting language evaluated by a
//! stack-of-frames tree-walking interpreter.

pub mod ast;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use error::{CompileError, Result};
