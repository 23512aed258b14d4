//! Abstract Syntax Tree definitions

mod span;

pub use span::*;

use serde::{Deserialize, Serialize};

/// A program is a sequence of statements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A statement: an optional `identifier:` label plus exactly one command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub label: Option<Spanned<String>>,
    pub command: Spanned<Command>,
}

/// A command, the unit of evaluation inside a statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    /// `value EXPR` / `quote EXPR`: evaluate one expression
    Value(Spanned<Expr>),

    /// `eval NAME [PAYLOAD]`: invoke a builtin or a registered procedure
    Eval {
        name: Spanned<String>,
        payload: Option<Spanned<Expr>>,
    },

    /// `begin ... end`: evaluate statements in a fresh frame
    Begin(Vec<Statement>),

    /// `cond (CONDITION BRANCH)* end`: alternating condition/branch commands
    Cond(Vec<Spanned<Command>>),

    /// `iter HEAD ... end`: repeat the body according to the head value
    Iter {
        head: Spanned<Expr>,
        body: Vec<Statement>,
    },

    /// `def NAME ... end` / `proc NAME ... end`: register a procedure body
    Def {
        name: Spanned<String>,
        body: Vec<Statement>,
    },
}

/// An expression, evaluated to a runtime value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal
    Int(i64),
    /// Float literal (a numeric literal containing `.`)
    Float(f64),
    /// String literal, quotes stripped, no escape processing
    Str(String),
    /// `true` / `false`
    Bool(bool),
    /// `null`
    Null,

    /// Array literal
    Array(Vec<Spanned<Expr>>),

    /// Object literal: `key: value` pairs in encounter order
    Object(Vec<(Spanned<Expr>, Spanned<Expr>)>),

    /// Variable reference with a trailing index chain
    Variable {
        name: String,
        indexes: Vec<Spanned<Expr>>,
    },

    /// Payload reference `$` with a trailing index chain
    Payload { indexes: Vec<Spanned<Expr>> },
}
