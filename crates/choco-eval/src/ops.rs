//! Operator semantics on already-evaluated operands.
//!
//! Short-circuiting `and`/`or` needs the unevaluated right operand and lives
//! in the evaluator; everything here is strict.

use crate::error::EvalError;
use crate::value::Value;
use choco_types::ast::BinOp;

/// Integer division truncating toward zero.
pub fn floor_div(a: i32, b: i32) -> Result<i32, EvalError> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(a.wrapping_div(b))
}

/// Remainder carrying the sign of the divisor.
pub fn modulo(a: i32, b: i32) -> Result<i32, EvalError> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) {
        Ok(r.wrapping_add(b))
    } else {
        Ok(r)
    }
}

pub fn negate(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
        other => Err(EvalError::UnsupportedNegation(other.type_name())),
    }
}

/// Apply a strict binary operator. `and` / `or` short-circuit in the
/// evaluator and are rejected here.
pub fn binary(op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    if op == BinOp::Is {
        return Ok(Value::Bool(lhs.is_identical(rhs)));
    }

    let result = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => int_op(op, *a, *b)?,
        (Value::Str(a), Value::Str(b)) => str_op(op, a, b),
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinOp::Eq => Some(Value::Bool(a == b)),
            BinOp::NotEq => Some(Value::Bool(a != b)),
            _ => None,
        },
        (Value::List(a), Value::List(b)) if op == BinOp::Add => {
            let left = a.borrow();
            let right = b.borrow();
            let elements = left
                .elements
                .iter()
                .chain(right.elements.iter())
                .cloned()
                .collect();
            Some(Value::list(elements, left.element_type.clone()))
        }
        _ => None,
    };

    result.ok_or(EvalError::UnsupportedOperation {
        left: lhs.type_name(),
        op,
        right: rhs.type_name(),
    })
}

fn int_op(op: BinOp, a: i32, b: i32) -> Result<Option<Value>, EvalError> {
    let value = match op {
        BinOp::Add => Value::Int(a.wrapping_add(b)),
        BinOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinOp::Mul => Value::Int(a.wrapping_mul(b)),
        BinOp::FloorDiv => Value::Int(floor_div(a, b)?),
        BinOp::Mod => Value::Int(modulo(a, b)?),
        BinOp::Less => Value::Bool(a < b),
        BinOp::Greater => Value::Bool(a > b),
        BinOp::LessEq => Value::Bool(a <= b),
        BinOp::GreaterEq => Value::Bool(a >= b),
        BinOp::Eq => Value::Bool(a == b),
        BinOp::NotEq => Value::Bool(a != b),
        BinOp::Is | BinOp::And | BinOp::Or => return Ok(None),
    };
    Ok(Some(value))
}

fn str_op(op: BinOp, a: &str, b: &str) -> Option<Value> {
    let value = match op {
        BinOp::Add => Value::Str(format!("{a}{b}")),
        BinOp::Less => Value::Bool(a < b),
        BinOp::Greater => Value::Bool(a > b),
        BinOp::LessEq => Value::Bool(a <= b),
        BinOp::GreaterEq => Value::Bool(a >= b),
        BinOp::Eq => Value::Bool(a == b),
        BinOp::NotEq => Value::Bool(a != b),
        _ => return None,
    };
    Some(value)
}

/// Bounds-check an integer index against a length. No negative wraparound.
pub fn checked_index(index: i32, len: usize) -> Result<usize, EvalError> {
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i),
        _ => Err(EvalError::IndexOutOfBounds(index)),
    }
}

/// `target[index]` for strings and lists.
pub fn index(target: &Value, index: &Value) -> Result<Value, EvalError> {
    match target {
        Value::Str(s) => {
            let i = index.as_int().ok_or(EvalError::NonIntegerIndex)?;
            let len = s.chars().count();
            let i = checked_index(i, len)?;
            Ok(s.chars()
                .nth(i)
                .map(|c| Value::Str(c.to_string()))
                .unwrap_or(Value::None))
        }
        Value::List(list) => {
            let i = index.as_int().ok_or(EvalError::NonIntegerIndex)?;
            let data = list.borrow();
            let i = checked_index(i, data.elements.len())?;
            Ok(data.elements[i].clone())
        }
        other => Err(EvalError::NotIndexable(other.type_name())),
    }
}
