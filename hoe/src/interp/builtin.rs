//! Builtin operation dispatch
//!
//! Every operation takes the interpreter (for the re-entrant ones) and
//! one payload value. Arithmetic payloads are arrays; `map`/`filter`
//! re-enter the evaluator by re-synthesizing one-line invocations from
//! the canonical rendering of each element.

use super::error::{InterpResult, RuntimeError};
use super::eval::Interpreter;
use super::value::Value;
use std::fs;

/// Names the evaluator treats as pre-resolved, bypassing procedure lookup
const BUILTINS: &[&str] = &[
    "+",
    "-",
    "*",
    "/",
    "=",
    "type",
    "abs",
    "all",
    "any",
    "bool",
    "bin",
    "eval",
    "filter",
    "len",
    "map",
    "str",
    "import",
    "io.puts",
    "socket._gethostname",
];

pub fn is_builtin(op: &str) -> bool {
    BUILTINS.contains(&op)
}

pub fn dispatch(interp: &mut Interpreter, op: &str, payload: Value) -> InterpResult<Value> {
    match op {
        "+" => plus(payload),
        "-" => fold_adjacent(payload, Value::Int(0), sub_atom),
        "*" => fold_adjacent(payload, Value::Int(1), mul_atom),
        "/" => fold_adjacent(payload, Value::Int(1), div_atom),
        "=" => equals(payload),
        "type" => Ok(Value::Str(payload.type_name().to_string())),
        "abs" => abs(payload),
        "all" => {
            let elements = expect_array(payload)?;
            Ok(Value::Bool(elements.iter().all(Value::is_truthy)))
        }
        "any" => {
            let elements = expect_array(payload)?;
            Ok(Value::Bool(elements.iter().any(Value::is_truthy)))
        }
        "bool" => Ok(Value::Bool(payload.is_truthy())),
        "len" => len(payload),
        "str" => Ok(Value::Str(payload.to_string())),
        "eval" => meta_eval(interp, payload),
        "map" => higher_order(interp, Mode::Map, payload),
        "filter" => higher_order(interp, Mode::Filter, payload),
        "import" => import(interp, payload),
        "io.puts" => {
            println!("{payload}");
            Ok(Value::Null)
        }
        "socket._gethostname" => Ok(Value::Str(hostname())),
        "bin" => Err(RuntimeError::unimplemented("bin")),
        other => Err(RuntimeError::undefined_proc(other)),
    }
}

fn expect_array(payload: Value) -> InterpResult<Vec<Value>> {
    match payload {
        Value::Array(elements) => Ok(elements),
        other => Err(RuntimeError::type_mismatch("array", other.type_name())),
    }
}

/// `+`: numeric elements accumulate into separate int and float sums;
/// a leading string element switches to concatenation instead
fn plus(payload: Value) -> InterpResult<Value> {
    let elements = expect_array(payload)?;
    match elements.first() {
        Some(Value::Int(_) | Value::Float(_)) => plus_number(&elements),
        Some(Value::Str(_)) => plus_string(&elements),
        Some(other) => Err(RuntimeError::type_mismatch(
            "number or str",
            other.type_name(),
        )),
        None => Err(RuntimeError::type_mismatch("non-empty array", "empty array")),
    }
}

fn plus_number(elements: &[Value]) -> InterpResult<Value> {
    let mut int_sum: i64 = 0;
    let mut float_sum: f64 = 0.0;
    let mut has_float = false;
    for element in elements {
        match element {
            Value::Int(n) => int_sum = int_sum.wrapping_add(*n),
            Value::Float(x) => {
                has_float = true;
                float_sum += x;
            }
            other => return Err(RuntimeError::type_mismatch("number", other.type_name())),
        }
    }
    if has_float {
        Ok(Value::Float(float_sum + int_sum as f64))
    } else {
        Ok(Value::Int(int_sum))
    }
}

fn plus_string(elements: &[Value]) -> InterpResult<Value> {
    let mut out = String::new();
    for element in elements {
        match element {
            Value::Str(s) => out.push_str(s),
            other => return Err(RuntimeError::type_mismatch("str", other.type_name())),
        }
    }
    Ok(Value::Str(out))
}

/// `- * /` walk adjacent pairs of the original array left to right and
/// return the last pair's result; an empty array yields the operation's
/// identity value and a singleton yields its element unchanged
fn fold_adjacent(
    payload: Value,
    empty: Value,
    atom: fn(&Value, &Value) -> InterpResult<Value>,
) -> InterpResult<Value> {
    let elements = expect_array(payload)?;
    match elements.len() {
        0 => Ok(empty),
        1 => Ok(elements.into_iter().next().unwrap()),
        _ => {
            let mut result = Value::Null;
            for pair in elements.windows(2) {
                result = atom(&pair[0], &pair[1])?;
            }
            Ok(result)
        }
    }
}

/// Each pairwise step promotes to float when either operand is a float
fn numeric_pair(left: &Value, right: &Value) -> InterpResult<Option<(f64, f64)>> {
    match (left, right) {
        (Value::Int(_), Value::Int(_)) => Ok(None),
        (Value::Int(a), Value::Float(b)) => Ok(Some((*a as f64, *b))),
        (Value::Float(a), Value::Int(b)) => Ok(Some((*a, *b as f64))),
        (Value::Float(a), Value::Float(b)) => Ok(Some((*a, *b))),
        (Value::Int(_) | Value::Float(_), other) | (other, _) => Err(
            RuntimeError::type_mismatch("number", other.type_name()),
        ),
    }
}

fn sub_atom(left: &Value, right: &Value) -> InterpResult<Value> {
    match numeric_pair(left, right)? {
        Some((a, b)) => Ok(Value::Float(a - b)),
        None => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
            _ => unreachable!("numeric_pair only returns None for int pairs"),
        },
    }
}

fn mul_atom(left: &Value, right: &Value) -> InterpResult<Value> {
    match numeric_pair(left, right)? {
        Some((a, b)) => Ok(Value::Float(a * b)),
        None => match (left, right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
            _ => unreachable!("numeric_pair only returns None for int pairs"),
        },
    }
}

fn div_atom(left: &Value, right: &Value) -> InterpResult<Value> {
    match right {
        Value::Int(0) => return Err(RuntimeError::division_by_zero()),
        Value::Float(x) if *x == 0.0 => return Err(RuntimeError::division_by_zero()),
        _ => {}
    }
    match numeric_pair(left, right)? {
        Some((a, b)) => Ok(Value::Float(a / b)),
        None => match (left, right) {
            // Integer division truncates toward zero
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_div(*b))),
            _ => unreachable!("numeric_pair only returns None for int pairs"),
        },
    }
}

/// `=` compares adjacent elements pairwise. For the first adjacent pair
/// of arrays it compares index by index and returns immediately, without
/// looking at any further payload elements; this short-circuit is
/// replicated from the reference behavior on purpose.
fn equals(payload: Value) -> InterpResult<Value> {
    let elements = expect_array(payload)?;
    let mut prev: Option<&Value> = None;
    for element in &elements {
        if let Some(previous) = prev {
            if let (Value::Array(left), Value::Array(right)) = (previous, element) {
                if left.len() != right.len() {
                    return Ok(Value::Bool(false));
                }
                for (l, r) in left.iter().zip(right.iter()) {
                    if !eq_atom(l, r) {
                        return Ok(Value::Bool(false));
                    }
                }
                return Ok(Value::Bool(true));
            }
            if !eq_atom(previous, element) {
                return Ok(Value::Bool(false));
            }
        }
        prev = Some(element);
    }
    Ok(Value::Bool(true))
}

/// Scalar equality; cross-numeric comparison coerces by numeric value.
/// Objects are unsupported and never compare equal.
fn eq_atom(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Int(a), Value::Float(b)) => *a as f64 == *b,
        (Value::Float(a), Value::Int(b)) => *a == *b as f64,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

/// `abs` negates its argument rather than taking the absolute value;
/// replicated from the reference behavior on purpose
fn abs(payload: Value) -> InterpResult<Value> {
    match payload {
        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
        Value::Float(x) => Ok(Value::Float(-x)),
        other => Err(RuntimeError::type_mismatch("number", other.type_name())),
    }
}

fn len(payload: Value) -> InterpResult<Value> {
    let count = match &payload {
        Value::Str(s) => s.chars().count(),
        Value::Array(elements) => elements.len(),
        Value::Object(entries) => entries.len(),
        other => {
            return Err(RuntimeError::type_mismatch(
                "str, array, or object",
                other.type_name(),
            ));
        }
    };
    Ok(Value::Int(count as i64))
}

fn meta_eval(interp: &mut Interpreter, payload: Value) -> InterpResult<Value> {
    match payload {
        Value::Str(source) => interp.eval_nested_source(&source),
        other => Err(RuntimeError::type_mismatch("str", other.type_name())),
    }
}

enum Mode {
    Map,
    Filter,
}

/// `map`/`filter` take `[procedureName, iterable]` and invoke the named
/// procedure once per element through re-synthesized source text
fn higher_order(interp: &mut Interpreter, mode: Mode, payload: Value) -> InterpResult<Value> {
    let mut elements = expect_array(payload)?;
    if elements.len() != 2 {
        return Err(RuntimeError::type_mismatch(
            "[proc name, array] payload",
            &format!("array of {}", elements.len()),
        ));
    }
    let iterable = elements.pop().unwrap();
    let name = elements.pop().unwrap();
    let name = match name {
        Value::Str(name) => name,
        other => return Err(RuntimeError::type_mismatch("str proc name", other.type_name())),
    };
    let items = match iterable {
        Value::Array(items) => items,
        other => return Err(RuntimeError::type_mismatch("array", other.type_name())),
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let source = format!("eval \"{name}\" {item}");
        let result = interp.eval_nested_source(&source)?;
        match mode {
            Mode::Map => out.push(result),
            Mode::Filter => {
                if result.is_truthy() {
                    out.push(item);
                }
            }
        }
    }
    Ok(Value::Array(out))
}

/// `import` evaluates a module file in its own frame and merges the
/// resulting bindings and procedures into the invoking frame
fn import(interp: &mut Interpreter, payload: Value) -> InterpResult<Value> {
    let path = match payload {
        Value::Str(path) => path,
        other => return Err(RuntimeError::type_mismatch("str path", other.type_name())),
    };
    let source = fs::read_to_string(&path).map_err(|e| RuntimeError::io(format!("{path}: {e}")))?;
    let module = interp.eval_module(&source)?;
    interp.top_frame().merge(module);
    Ok(Value::Null)
}

fn hostname() -> String {
    fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}
