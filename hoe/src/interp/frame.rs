//! Namespace frames for the evaluation stack

use super::Value;
use crate::ast::Statement;
use std::collections::HashMap;
use std::rc::Rc;

/// The reserved identifier holding the most recent statement result
pub const CURSOR: &str = "^";

/// The reserved identifier holding a procedure invocation's payload
pub const PAYLOAD: &str = "$";

/// One scope record on the evaluation stack: identifier bindings, a
/// local procedure table, and the "current identifier" cursor.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    cursor: String,
    namespace: HashMap<String, Value>,
    procs: HashMap<String, Rc<Vec<Statement>>>,
}

impl Frame {
    /// Create an empty frame with the cursor reset to `^`
    pub fn new() -> Self {
        Frame {
            cursor: CURSOR.to_string(),
            namespace: HashMap::new(),
            procs: HashMap::new(),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.namespace.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.namespace.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.namespace.insert(name.into(), value);
    }

    /// Point the cursor at the statement's target identifier
    pub fn set_cursor(&mut self, name: impl Into<String>) {
        self.cursor = name.into();
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    /// Commit a statement result: bind the cursor identifier (when it is
    /// not `^`), always bind `^`, then reset the cursor
    pub fn commit(&mut self, value: Value) {
        let target = std::mem::replace(&mut self.cursor, CURSOR.to_string());
        if target != CURSOR {
            self.namespace.insert(target, value.clone());
        }
        self.namespace.insert(CURSOR.to_string(), value);
    }

    /// The frame's final value: whatever the cursor points at, or `Null`
    /// for a frame that never ran a statement
    pub fn present(&self) -> Value {
        self.namespace.get(&self.cursor).cloned().unwrap_or(Value::Null)
    }

    pub fn define_proc(&mut self, name: impl Into<String>, body: Rc<Vec<Statement>>) {
        self.procs.insert(name.into(), body);
    }

    pub fn proc(&self, name: &str) -> Option<Rc<Vec<Statement>>> {
        self.procs.get(name).cloned()
    }

    /// Absorb another frame's bindings and procedures (module import)
    pub fn merge(&mut self, other: Frame) {
        self.namespace.extend(other.namespace);
        self.procs.extend(other.procs);
    }
}
