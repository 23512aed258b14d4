//! Statement and expression evaluator driving the frame stack

use super::builtin;
use super::error::{InterpResult, RuntimeError};
use super::frame::{Frame, CURSOR, PAYLOAD};
use super::value::{object_get, object_insert, Value};
use crate::ast::{Command, Expr, Program, Spanned, Statement};
use std::rc::Rc;

/// Maximum command-evaluation nesting before the evaluator gives up.
/// Unbounded recursion must surface as a failure instead of taking the
/// host process down.
const MAX_RECURSION_DEPTH: usize = 10_000;

/// Stack growth parameters for deep recursion
const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// The interpreter: one frame stack, owned for the lifetime of a
/// top-level evaluation. Independent instances never share state.
pub struct Interpreter {
    /// Active namespace frames, innermost last
    stack: Vec<Frame>,
    /// Current command nesting depth
    depth: usize,
}

impl Interpreter {
    /// Create a new interpreter with an empty frame stack
    pub fn new() -> Self {
        Interpreter {
            stack: Vec::new(),
            depth: 0,
        }
    }

    /// Drop all frames, e.g. after an aborted evaluation
    pub fn reset(&mut self) {
        self.stack.clear();
        self.depth = 0;
    }

    /// Parse and evaluate top-level source, returning the program result
    pub fn eval_source(&mut self, source: &str) -> InterpResult<Value> {
        let program = parse_program(source)?;
        self.eval_program(&program)
    }

    /// Evaluate an already-parsed program
    pub fn eval_program(&mut self, program: &Program) -> InterpResult<Value> {
        self.eval_statements(&program.statements)
    }

    /// Evaluate source in a lasting session frame: the base frame is
    /// created once and never popped, so bindings and procedures
    /// accumulate across calls (interactive use)
    pub fn eval_interactive(&mut self, source: &str) -> InterpResult<Value> {
        let program = parse_program(source)?;
        if self.stack.is_empty() {
            self.stack.push(Frame::new());
        }
        for statement in &program.statements {
            self.eval_statement(statement)?;
        }
        Ok(self.top_frame().present())
    }

    /// Meta-evaluation: run source text in a fresh frame on top of the
    /// current stack (the `eval "eval"` path, also used by map/filter)
    pub(crate) fn eval_nested_source(&mut self, source: &str) -> InterpResult<Value> {
        let program = parse_program(source)?;
        self.stack.push(Frame::new());
        self.eval_statements(&program.statements)
    }

    /// Evaluate module source in its own frame and hand the finished
    /// frame back for merging (the `import` builtin)
    pub(crate) fn eval_module(&mut self, source: &str) -> InterpResult<Frame> {
        let program = parse_program(source)?;
        self.stack.push(Frame::new());
        for statement in &program.statements {
            self.eval_statement(statement)?;
        }
        Ok(self.pop_frame())
    }

    pub(crate) fn top_frame(&mut self) -> &mut Frame {
        self.stack
            .last_mut()
            .expect("frame stack is empty during evaluation")
    }

    fn pop_frame(&mut self) -> Frame {
        self.stack
            .pop()
            .expect("frame stack is empty during evaluation")
    }

    /// Evaluate a statement list as one block: run every statement, then
    /// pop the block's frame and yield its final `^`
    fn eval_statements(&mut self, statements: &[Statement]) -> InterpResult<Value> {
        for statement in statements {
            self.eval_statement(statement)?;
        }
        Ok(self
            .stack
            .pop()
            .map(|frame| frame.present())
            .unwrap_or(Value::Null))
    }

    fn eval_statement(&mut self, statement: &Statement) -> InterpResult<Value> {
        if self.stack.is_empty() {
            self.stack.push(Frame::new());
        }
        match &statement.label {
            Some(label) => self.top_frame().set_cursor(label.node.clone()),
            None => self.top_frame().set_cursor(CURSOR),
        }
        let value = self.eval_command(&statement.command)?;
        self.top_frame().commit(value.clone());
        Ok(value)
    }

    /// Evaluate a command with automatic stack growth for deep recursion
    fn eval_command(&mut self, command: &Spanned<Command>) -> InterpResult<Value> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(RuntimeError::stack_overflow());
        }
        self.depth += 1;
        let result =
            stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_command_inner(command));
        self.depth -= 1;
        result
    }

    fn eval_command_inner(&mut self, command: &Spanned<Command>) -> InterpResult<Value> {
        match &command.node {
            Command::Value(expr) => self.eval_expr(expr),
            Command::Eval { name, payload } => self.eval_invocation(name, payload),
            Command::Begin(body) => {
                self.stack.push(Frame::new());
                self.eval_statements(body)
            }
            Command::Cond(branches) => self.eval_cond(branches),
            Command::Iter { head, body } => self.eval_iter(head, body),
            Command::Def { name, body } => {
                let body = Rc::new(body.clone());
                self.top_frame().define_proc(name.node.clone(), body);
                Ok(Value::Null)
            }
        }
    }

    /// `eval NAME [PAYLOAD]` resolution: meta-eval, then builtin, then
    /// an innermost-first scan of the frame stack for a procedure
    fn eval_invocation(
        &mut self,
        name: &Spanned<String>,
        payload: &Option<Spanned<Expr>>,
    ) -> InterpResult<Value> {
        let payload = match payload {
            Some(expr) => self.eval_expr(expr)?,
            None => Value::Null,
        };
        let name = name.node.as_str();

        if name == "eval" {
            if let Value::Str(source) = &payload {
                let source = source.clone();
                return self.eval_nested_source(&source);
            }
        }

        if builtin::is_builtin(name) {
            return builtin::dispatch(self, name, payload);
        }

        let body = self
            .find_proc(name)
            .ok_or_else(|| RuntimeError::undefined_proc(name))?;
        let mut frame = Frame::new();
        frame.set(PAYLOAD, payload);
        self.stack.push(frame);
        self.eval_statements(&body)
    }

    /// Procedure lookup is dynamically scoped: scan every active frame
    /// from innermost to outermost, first hit wins
    fn find_proc(&self, name: &str) -> Option<Rc<Vec<Statement>>> {
        self.stack.iter().rev().find_map(|frame| frame.proc(name))
    }

    fn eval_cond(&mut self, branches: &[Spanned<Command>]) -> InterpResult<Value> {
        if branches.len() % 2 != 0 {
            return Err(RuntimeError::cond_branch_mismatch(branches.len()));
        }
        for pair in branches.chunks(2) {
            let condition = self.eval_command(&pair[0])?;
            if condition.is_truthy() {
                return self.eval_command(&pair[1]);
            }
        }
        Ok(Value::Null)
    }

    /// `iter` runs its body in the enclosing frame; the loop identifier
    /// is the statement's own target and persists past the loop
    fn eval_iter(&mut self, head: &Spanned<Expr>, body: &[Statement]) -> InterpResult<Value> {
        let subject = self.eval_expr(head)?;
        let target = self.top_frame().cursor().to_string();
        match subject {
            Value::Bool(false) => Ok(Value::Null),
            Value::Bool(true) => {
                // No break construct exists; this runs until an
                // evaluation error propagates out
                loop {
                    for statement in body {
                        self.eval_statement(statement)?;
                    }
                }
            }
            Value::Int(n) => {
                self.top_frame().set(target.clone(), Value::Int(0));
                let mut i = 0;
                while i < n {
                    for statement in body {
                        self.eval_statement(statement)?;
                    }
                    i += 1;
                    self.top_frame().set(target.clone(), Value::Int(i));
                }
                Ok(Value::Int(n))
            }
            Value::Array(elements) => {
                for element in &elements {
                    self.top_frame().set(target.clone(), element.clone());
                    for statement in body {
                        self.eval_statement(statement)?;
                    }
                }
                Ok(Value::Array(elements))
            }
            other => Err(RuntimeError::type_mismatch(
                "int, array, or bool iteration subject",
                other.type_name(),
            )),
        }
    }

    fn eval_expr(&mut self, expr: &Spanned<Expr>) -> InterpResult<Value> {
        match &expr.node {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(x) => Ok(Value::Float(*x)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element)?);
                }
                Ok(Value::Array(values))
            }
            Expr::Object(entries) => {
                let mut values = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match self.eval_expr(key)? {
                        Value::Str(key) => key,
                        other => {
                            return Err(RuntimeError::type_mismatch(
                                "str object key",
                                other.type_name(),
                            ));
                        }
                    };
                    let value = self.eval_expr(value)?;
                    object_insert(&mut values, key, value);
                }
                Ok(Value::Object(values))
            }
            Expr::Variable { name, indexes } => {
                // Plain identifiers are frame-local: only the top frame
                // is consulted, never the enclosing ones
                let base = self
                    .stack
                    .last()
                    .and_then(|frame| frame.get(name))
                    .cloned()
                    .ok_or_else(|| RuntimeError::undefined_variable(name))?;
                self.apply_indexes(base, indexes)
            }
            Expr::Payload { indexes } => {
                // `$` is dynamically scoped: innermost frame with a
                // payload binding wins
                let base = self
                    .stack
                    .iter()
                    .rev()
                    .find_map(|frame| frame.get(PAYLOAD))
                    .cloned()
                    .ok_or_else(RuntimeError::no_payload)?;
                self.apply_indexes(base, indexes)
            }
        }
    }

    fn apply_indexes(
        &mut self,
        mut value: Value,
        indexes: &[Spanned<Expr>],
    ) -> InterpResult<Value> {
        for index in indexes {
            let index = self.eval_expr(index)?;
            value = match (&value, &index) {
                (Value::Array(elements), Value::Int(i)) => usize::try_from(*i)
                    .ok()
                    .and_then(|i| elements.get(i))
                    .cloned()
                    .ok_or_else(|| RuntimeError::index_out_of_bounds(*i, elements.len()))?,
                (Value::Object(entries), Value::Str(key)) => object_get(entries, key)
                    .cloned()
                    .ok_or_else(|| RuntimeError::missing_key(key))?,
                (subject, index) => {
                    return Err(RuntimeError::type_mismatch(
                        "array[int] or object[str] index",
                        &format!("{}[{}]", subject.type_name(), index.type_name()),
                    ));
                }
            };
        }
        Ok(value)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse source for evaluation, mapping lexer/parser failures into a
/// syntax runtime error so meta-eval faults propagate like any other
fn parse_program(source: &str) -> InterpResult<Program> {
    let tokens =
        crate::lexer::tokenize(source).map_err(|e| RuntimeError::syntax(e.to_string()))?;
    crate::parser::parse("<eval>", source, tokens).map_err(|e| RuntimeError::syntax(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::ErrorKind;

    fn run(source: &str) -> InterpResult<Value> {
        Interpreter::new().eval_source(source)
    }

    #[test]
    fn test_value_statement() {
        assert_eq!(run("value 42").unwrap(), Value::Int(42));
        assert_eq!(run("quote 1.5").unwrap(), Value::Float(1.5));
        assert_eq!(run("value \"hi\"").unwrap(), Value::Str("hi".to_string()));
        assert_eq!(run("value null").unwrap(), Value::Null);
    }

    #[test]
    fn test_empty_program_is_null() {
        assert_eq!(run("").unwrap(), Value::Null);
    }

    #[test]
    fn test_program_yields_last_statement() {
        assert_eq!(run("value 1 value 2 value 3").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_labelled_binding_and_lookup() {
        assert_eq!(run("x: value 5 value x").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_cursor_is_not_a_source_identifier() {
        // `^` exists only as the internal cursor binding; source text
        // cannot lex it
        assert!(run("value ^").is_err());
    }

    #[test]
    fn test_undefined_variable_is_fatal() {
        let err = run("value missing").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedName);
    }

    #[test]
    fn test_array_and_object_literals() {
        assert_eq!(
            run("value [1, 2.5, \"a\"]").unwrap(),
            Value::Array(vec![
                Value::Int(1),
                Value::Float(2.5),
                Value::Str("a".to_string())
            ])
        );
        assert_eq!(
            run(r#"value {"a": 1, "b": 2}"#).unwrap(),
            Value::Object(vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn test_object_duplicate_keys_last_wins_first_position() {
        assert_eq!(
            run(r#"value {"a": 1, "b": 2, "a": 3}"#).unwrap(),
            Value::Object(vec![
                ("a".to_string(), Value::Int(3)),
                ("b".to_string(), Value::Int(2)),
            ])
        );
    }

    #[test]
    fn test_non_str_object_key_is_fatal() {
        let err = run("value {1: 2}").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_array_indexing() {
        assert_eq!(run("a: value [10, 20] value a[1]").unwrap(), Value::Int(20));
    }

    #[test]
    fn test_array_index_out_of_range() {
        let err = run("a: value [10] value a[3]").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexError);
    }

    #[test]
    fn test_negative_index_is_out_of_range() {
        let err = run("a: value [10] value a[-1]").unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexError);
    }

    #[test]
    fn test_object_indexing_and_missing_key() {
        assert_eq!(
            run(r#"o: value {"x": 7} value o["x"]"#).unwrap(),
            Value::Int(7)
        );
        let err = run(r#"o: value {"x": 7} value o["y"]"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IndexError);
    }

    #[test]
    fn test_index_type_mismatch() {
        let err = run(r#"a: value [1] value a["x"]"#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_begin_returns_block_value() {
        assert_eq!(run("begin value 1 value 2 end").unwrap(), Value::Int(2));
        assert_eq!(run("begin end").unwrap(), Value::Null);
    }

    #[test]
    fn test_begin_does_not_inherit_bindings() {
        let err = run("x: value 1 begin value x end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedName);
    }

    #[test]
    fn test_begin_does_not_leak_bindings() {
        let err = run("begin y: value 1 end value y").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedName);
    }

    #[test]
    fn test_proc_defined_outside_reachable_inside_begin() {
        let source = r#"
            proc "seven" value 7 end
            begin eval "seven" end
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(7));
    }

    #[test]
    fn test_def_returns_null() {
        assert_eq!(run("proc \"f\" value 1 end").unwrap(), Value::Null);
    }

    #[test]
    fn test_proc_invocation_with_payload() {
        let source = r#"
            proc "double" eval "*" [$, 2] end
            eval "double" 21
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_proc_payload_defaults_to_null() {
        let source = r#"
            proc "me" value $ end
            eval "me"
        "#;
        assert_eq!(run(source).unwrap(), Value::Null);
    }

    #[test]
    fn test_payload_without_binding_is_fatal() {
        let err = run("value $").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedName);
    }

    #[test]
    fn test_payload_indexing() {
        let source = r#"
            proc "first" value $[0] end
            eval "first" [9, 8]
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_payload_visible_through_nested_begin() {
        let source = r#"
            proc "inner" begin value $ end end
            eval "inner" 3
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_unknown_proc_is_fatal() {
        let err = run("eval \"nope\"").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedName);
    }

    #[test]
    fn test_proc_redefinition_overwrites() {
        let source = r#"
            proc "f" value 1 end
            proc "f" value 2 end
            eval "f"
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_innermost_proc_definition_wins() {
        let source = r#"
            proc "f" value 1 end
            begin
                proc "f" value 2 end
                eval "f"
            end
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_cond_first_truthy_branch() {
        let source = r#"
            cond
                value false
                value 1
                value true
                value 2
            end
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_cond_zero_is_truthy() {
        let source = r#"
            cond
                value 0
                value 1
            end
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(1));
    }

    #[test]
    fn test_cond_no_match_is_null() {
        assert_eq!(run("cond value false value 1 end").unwrap(), Value::Null);
        assert_eq!(run("cond end").unwrap(), Value::Null);
    }

    #[test]
    fn test_cond_odd_branch_count_is_fatal() {
        let err = run("cond value true end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::StructuralError);
    }

    #[test]
    fn test_cond_branches_may_be_blocks() {
        let source = r#"
            cond
                begin value true end
                begin value 1 value 2 end
            end
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_iter_int_counts_and_leaks_binding() {
        // After `x: iter 3 ... end`, x holds the command result Int(3)
        let source = r#"
            total: value 0
            x: iter 3
                total: eval "+" [total, x]
            end
            value total
        "#;
        // body sees x = 0, 1, 2
        assert_eq!(run(source).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_iter_returns_count() {
        assert_eq!(run("x: iter 3 value 9 end value x").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_iter_zero_runs_no_body() {
        let source = r#"
            hit: value false
            iter 0
                hit: value true
            end
            value hit
        "#;
        assert_eq!(run(source).unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_iter_array_binds_elements() {
        let source = r#"
            sum: value 0
            el: iter [1, 2, 3]
                sum: eval "+" [sum, el]
            end
            value sum
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(6));
    }

    #[test]
    fn test_iter_array_command_yields_original() {
        // The program result is the iter command's own value
        assert_eq!(
            run("iter [1, 2] value 0 end").unwrap(),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_iter_array_loop_identifier_keeps_last_element() {
        // Body commits reset the cursor, so the iter statement's result
        // binds only `^`; the loop identifier stays at the last element
        let source = "el: iter [1, 2] value el end value el";
        assert_eq!(run(source).unwrap(), Value::Int(2));
    }

    #[test]
    fn test_iter_body_bindings_persist() {
        // iter bodies run in the enclosing frame, so bindings survive
        let source = r#"
            iter 2
                y: value 9
            end
            value y
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_iter_false_is_noop() {
        assert_eq!(run("iter false value 1 end").unwrap(), Value::Null);
    }

    #[test]
    fn test_iter_unsupported_subject() {
        let err = run("iter \"s\" value 1 end").unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_meta_eval_runs_source() {
        assert_eq!(run(r#"eval "eval" "value 42""#).unwrap(), Value::Int(42));
    }

    #[test]
    fn test_meta_eval_sees_outer_procs() {
        // Strings cannot contain quotes, so the nested call is reached
        // through map, which synthesizes `eval "nine" 0` internally
        let source = r#"
            proc "nine" value 9 end
            eval "map" ["nine", [0]]
        "#;
        assert_eq!(run(source).unwrap(), Value::Array(vec![Value::Int(9)]));
    }

    #[test]
    fn test_meta_eval_syntax_error_propagates() {
        let err = run(r#"eval "eval" "begin value 1""#).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_recursive_proc_fibonacci() {
        let source = r#"
            proc "fib"
                cond
                    eval "=" [$, 0]
                    value 0
                    eval "=" [$, 1]
                    value 1
                    value true
                    begin
                        a: eval "-" [$, 1]
                        a: eval "fib" a
                        b: eval "-" [$, 2]
                        b: eval "fib" b
                        eval "+" [a, b]
                    end
                end
            end
            eval "fib" 10
        "#;
        assert_eq!(run(source).unwrap(), Value::Int(55));
    }

    #[test]
    fn test_unbounded_recursion_overflows() {
        let source = r#"
            proc "loop" eval "loop" end
            eval "loop"
        "#;
        let err = run(source).unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackOverflow);
    }

    #[test]
    fn test_interactive_bindings_persist() {
        let mut interp = Interpreter::new();
        assert_eq!(interp.eval_interactive("x: value 5").unwrap(), Value::Int(5));
        assert_eq!(interp.eval_interactive("value x").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_interactive_procs_persist() {
        let mut interp = Interpreter::new();
        interp.eval_interactive("proc \"nine\" value 9 end").unwrap();
        assert_eq!(interp.eval_interactive("eval \"nine\"").unwrap(), Value::Int(9));
    }

    #[test]
    fn test_reset_clears_stack() {
        let mut interp = Interpreter::new();
        assert!(interp.eval_source("begin value x end").is_err());
        interp.reset();
        assert_eq!(interp.eval_source("value 1").unwrap(), Value::Int(1));
    }
}
