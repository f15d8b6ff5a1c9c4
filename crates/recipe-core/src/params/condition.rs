//! Evaluación de condiciones de steps `Conditional`.
//!
//! Gramática soportada:
//! - `ref` — truthiness JSON del valor referenciado;
//! - `ref == literal` / `ref != literal`;
//! - el lado derecho puede ser otro `ref`.
//!
//! Literales: `null`, `true`/`false`, números, strings entre comillas dobles.
//! Una referencia ausente evalúa como `null` (así `ref == null` detecta
//! inputs opcionales no provistos, y un `ref` suelto ausente es falso).
use serde_json::Value;

use crate::errors::EngineError;
use crate::params::resolve::ResolveCtx;

pub fn eval_condition(expression: &str, ctx: &ResolveCtx<'_>) -> Result<bool, EngineError> {
    let expr = expression.trim();
    if expr.is_empty() {
        return Err(EngineError::InvalidRelease("empty condition expression".into()));
    }

    if let Some((lhs, rhs)) = split_operator(expr, "==") {
        return Ok(operand(lhs, ctx)? == operand(rhs, ctx)?);
    }
    if let Some((lhs, rhs)) = split_operator(expr, "!=") {
        return Ok(operand(lhs, ctx)? != operand(rhs, ctx)?);
    }

    Ok(truthy(&operand(expr, ctx)?))
}

/// Busca `op` fuera de literales entre comillas dobles, para que
/// `inputs.a == "x==y"` parta en el operador real y no dentro del string.
fn split_operator<'e>(expr: &'e str, op: &str) -> Option<(&'e str, &'e str)> {
    let bytes = expr.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            in_string = !in_string;
        } else if !in_string && bytes[i..].starts_with(op.as_bytes()) {
            return Some((expr[..i].trim(), expr[i + op.len()..].trim()));
        }
        i += 1;
    }
    None
}

/// Un operando es un literal o una referencia; referencias ausentes → null.
fn operand(token: &str, ctx: &ResolveCtx<'_>) -> Result<Value, EngineError> {
    match token {
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if token.starts_with('"') && token.ends_with('"') && token.len() >= 2 {
        return Ok(Value::String(token[1..token.len() - 1].to_string()));
    }
    if let Ok(number) = serde_json::from_str::<serde_json::Number>(token) {
        return Ok(Value::Number(number));
    }
    if token.starts_with("inputs.") || token.starts_with("results.") {
        return Ok(ctx.lookup(token).unwrap_or(Value::Null));
    }
    Err(EngineError::InvalidRelease(format!("invalid condition operand '{token}'")))
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
