//! Tree-walking interpreter over a [`ConditionContext`].

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::parser::{BinaryOp, Expr, Literal, UnaryOp};
use super::{ConditionContext, ConditionError};

#[derive(Debug, Clone)]
enum Value<'a> {
    Int(i64),
    Bool(bool),
    Str(Cow<'a, str>),
    Stats(&'a BTreeMap<String, i32>),
    Set(&'a BTreeSet<String>),
}

impl Value<'_> {
    fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Stats(_) => "stats",
            Value::Set(_) => "set",
        }
    }
}

fn runtime(message: impl Into<String>) -> ConditionError {
    ConditionError::Runtime(message.into())
}

/// Evaluates a parsed expression; the result must be a boolean.
pub(crate) fn evaluate(expr: &Expr, ctx: &ConditionContext) -> Result<bool, ConditionError> {
    match eval(expr, ctx)? {
        Value::Bool(b) => Ok(b),
        other => Err(ConditionError::NotBoolean(other.type_name().to_string())),
    }
}

fn eval<'a>(expr: &'a Expr, ctx: &'a ConditionContext) -> Result<Value<'a>, ConditionError> {
    match expr {
        Expr::Literal(Literal::Int(n)) => Ok(Value::Int(*n)),
        Expr::Literal(Literal::Bool(b)) => Ok(Value::Bool(*b)),
        Expr::Literal(Literal::Str(s)) => Ok(Value::Str(Cow::Borrowed(s))),
        Expr::Var(name) => variable(name, ctx),
        Expr::Field(target, field) => {
            let target = eval(target, ctx)?;
            member(target, field)
        }
        Expr::Index(target, index) => {
            let target = eval(target, ctx)?;
            match eval(index, ctx)? {
                Value::Str(key) => member(target, &key),
                other => Err(runtime(format!(
                    "index must be a string, got {}",
                    other.type_name()
                ))),
            }
        }
        Expr::Call(name, args) => call(name, args, ctx),
        Expr::Unary(UnaryOp::Not, operand) => Ok(Value::Bool(!boolean(eval(operand, ctx)?)?)),
        Expr::Unary(UnaryOp::Neg, operand) => {
            let n = integer(eval(operand, ctx)?)?;
            n.checked_neg()
                .map(Value::Int)
                .ok_or_else(|| runtime("integer overflow"))
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            if !boolean(eval(left, ctx)?)? {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(boolean(eval(right, ctx)?)?))
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            if boolean(eval(left, ctx)?)? {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(boolean(eval(right, ctx)?)?))
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, ctx)?;
            let right = eval(right, ctx)?;
            binary(*op, left, right)
        }
    }
}

fn variable<'a>(name: &str, ctx: &'a ConditionContext) -> Result<Value<'a>, ConditionError> {
    Ok(match name {
        "stats" => Value::Stats(&ctx.stats),
        "tags" => Value::Set(&ctx.tags),
        "events" => Value::Set(&ctx.events),
        "npcs" => Value::Set(&ctx.npcs),
        "day" => Value::Int(ctx.day.into()),
        "season" => Value::Int(ctx.season.into()),
        "year" => Value::Int(ctx.year.into()),
        "elapsed_days" => Value::Int(ctx.elapsed_days),
        "turn" => Value::Int(i64::try_from(ctx.turn).unwrap_or(i64::MAX)),
        "life" | "current_life" => Value::Int(ctx.life.into()),
        "is_alive" => Value::Bool(ctx.is_alive),
        other => return Err(runtime(format!("unknown variable '{}'", other))),
    })
}

fn member<'a>(target: Value<'a>, key: &str) -> Result<Value<'a>, ConditionError> {
    match target {
        Value::Stats(stats) => stats
            .get(key)
            .map(|v| Value::Int((*v).into()))
            .ok_or_else(|| runtime(format!("unknown stat '{}'", key))),
        Value::Set(set) => Ok(Value::Bool(set.contains(key))),
        other => Err(runtime(format!(
            "cannot access '{}' on {}",
            key,
            other.type_name()
        ))),
    }
}

fn call<'a>(
    name: &str,
    args: &'a [Expr],
    ctx: &'a ConditionContext,
) -> Result<Value<'a>, ConditionError> {
    match (name, args) {
        ("len", [arg]) => {
            let len = match eval(arg, ctx)? {
                Value::Stats(stats) => stats.len(),
                Value::Set(set) => set.len(),
                Value::Str(s) => s.chars().count(),
                other => return Err(runtime(format!("len() of {}", other.type_name()))),
            };
            Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
        }
        _ => Err(runtime(format!("unknown function '{}'", name))),
    }
}

fn boolean(value: Value<'_>) -> Result<bool, ConditionError> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(runtime(format!("expected bool, got {}", other.type_name()))),
    }
}

fn integer(value: Value<'_>) -> Result<i64, ConditionError> {
    match value {
        Value::Int(n) => Ok(n),
        other => Err(runtime(format!("expected int, got {}", other.type_name()))),
    }
}

fn equals(left: &Value<'_>, right: &Value<'_>) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Stats(a), Value::Stats(b)) => a == b,
        (Value::Set(a), Value::Set(b)) => a == b,
        _ => false,
    }
}

fn order(left: &Value<'_>, right: &Value<'_>) -> Result<Ordering, ConditionError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => Err(runtime(format!(
            "cannot compare {} with {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn contains(needle: &Value<'_>, haystack: &Value<'_>) -> Result<bool, ConditionError> {
    match (needle, haystack) {
        (Value::Str(n), Value::Set(set)) => Ok(set.contains(n.as_ref())),
        (Value::Str(n), Value::Stats(stats)) => Ok(stats.contains_key(n.as_ref())),
        (Value::Str(n), Value::Str(s)) => Ok(s.contains(n.as_ref())),
        _ => Err(runtime(format!(
            "'in' needs a string and a collection, got {} and {}",
            needle.type_name(),
            haystack.type_name()
        ))),
    }
}

fn arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<i64, ConditionError> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Rem if b == 0 => return Err(runtime("division by zero")),
        BinaryOp::Div => a.checked_div_euclid(b),
        BinaryOp::Rem => a.checked_rem_euclid(b),
        _ => None,
    };
    result.ok_or_else(|| runtime("integer overflow"))
}

fn binary<'a>(op: BinaryOp, left: Value<'a>, right: Value<'a>) -> Result<Value<'a>, ConditionError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(equals(&left, &right))),
        BinaryOp::Ne => Ok(Value::Bool(!equals(&left, &right))),
        BinaryOp::Lt => Ok(Value::Bool(order(&left, &right)? == Ordering::Less)),
        BinaryOp::Le => Ok(Value::Bool(order(&left, &right)? != Ordering::Greater)),
        BinaryOp::Gt => Ok(Value::Bool(order(&left, &right)? == Ordering::Greater)),
        BinaryOp::Ge => Ok(Value::Bool(order(&left, &right)? != Ordering::Less)),
        BinaryOp::In => Ok(Value::Bool(contains(&left, &right)?)),
        BinaryOp::NotIn => Ok(Value::Bool(!contains(&left, &right)?)),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let (a, b) = (integer(left)?, integer(right)?);
            arithmetic(op, a, b).map(Value::Int)
        }
        BinaryOp::And => Ok(Value::Bool(boolean(left)? && boolean(right)?)),
        BinaryOp::Or => Ok(Value::Bool(boolean(left)? || boolean(right)?)),
    }
}
