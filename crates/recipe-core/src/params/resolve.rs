//! Plantillas `{{ inputs.x }}` / `{{ results.step.path }}`.
//!
//! Reglas:
//! - un string que es exactamente una plantilla resuelve al `Value`
//!   referenciado (de cualquier tipo JSON);
//! - plantillas embebidas en un string mayor se interpolan como texto
//!   (strings sin comillas, el resto en JSON canónico);
//! - arrays y objetos se resuelven recursivamente;
//! - una referencia que no existe es `UnresolvedReference` (fatal para el
//!   step — indica error de autoría, no condición transitoria).
use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::EngineError;
use crate::hashing::to_canonical_json;
use crate::model::StepResult;

/// Vista de sólo lectura del estado contra el que se resuelve.
pub struct ResolveCtx<'a> {
    pub inputs: &'a Value,
    pub results: &'a IndexMap<String, StepResult>,
}

impl<'a> ResolveCtx<'a> {
    pub fn new(inputs: &'a Value, results: &'a IndexMap<String, StepResult>) -> Self {
        Self { inputs, results }
    }

    /// Busca una referencia `inputs.a.b` / `results.step.a.b`.
    /// Devuelve `None` si la raíz o algún segmento no existe.
    pub fn lookup(&self, reference: &str) -> Option<Value> {
        let mut segments = reference.split('.');
        let root = segments.next()?;
        match root {
            "inputs" => walk(self.inputs, segments),
            "results" => {
                let step_key = segments.next()?;
                let result = self.results.get(step_key)?;
                walk(&result.value, segments)
            }
            _ => None,
        }
    }
}

fn walk<'s>(start: &Value, segments: impl Iterator<Item = &'s str>) -> Option<Value> {
    let mut current = start;
    for seg in segments {
        current = match current {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current.clone())
}

/// Resuelve recursivamente todas las plantillas de `value`.
pub fn resolve_value(value: &Value, ctx: &ResolveCtx<'_>) -> Result<Value, EngineError> {
    match value {
        Value::String(s) => resolve_string(s, ctx),
        Value::Array(items) => {
            let resolved: Result<Vec<Value>, EngineError> = items.iter().map(|v| resolve_value(v, ctx)).collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), resolve_value(v, ctx)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_string(input: &str, ctx: &ResolveCtx<'_>) -> Result<Value, EngineError> {
    let trimmed = input.trim();
    // Caso plantilla única: preserva el tipo del valor referenciado.
    if let Some(reference) = single_template(trimmed) {
        return ctx.lookup(reference)
                  .ok_or_else(|| EngineError::UnresolvedReference(reference.to_string()));
    }

    let mut rendered = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open..].find("}}") else {
            // "{{" sin cierre: se deja literal.
            break;
        };
        rendered.push_str(&rest[..open]);
        let reference = rest[open + 2..open + close].trim();
        let value = ctx.lookup(reference)
                       .ok_or_else(|| EngineError::UnresolvedReference(reference.to_string()))?;
        match value {
            Value::String(s) => rendered.push_str(&s),
            other => rendered.push_str(&to_canonical_json(&other)),
        }
        rest = &rest[open + close + 2..];
    }
    rendered.push_str(rest);
    Ok(Value::String(rendered))
}

/// Si `input` es exactamente `{{ ref }}`, devuelve `ref`.
fn single_template(input: &str) -> Option<&str> {
    let inner = input.strip_prefix("{{")?.strip_suffix("}}")?;
    // Una segunda apertura indica múltiples plantillas, no una única.
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn ctx_fixture() -> (Value, IndexMap<String, StepResult>) {
        let inputs = json!({"region": "us-east", "limit": 3});
        let mut results = IndexMap::new();
        results.insert("fetch_data".to_string(),
                       StepResult { value: json!({"rows": [{"id": 7}, {"id": 9}], "count": 2}),
                                    recorded_at: Utc::now() });
        (inputs, results)
    }

    #[test]
    fn single_template_preserves_value_type() {
        let (inputs, results) = ctx_fixture();
        let ctx = ResolveCtx::new(&inputs, &results);
        assert_eq!(resolve_value(&json!("{{ inputs.limit }}"), &ctx).unwrap(), json!(3));
        assert_eq!(resolve_value(&json!("{{ results.fetch_data.rows }}"), &ctx).unwrap(),
                   json!([{"id": 7}, {"id": 9}]));
    }

    #[test]
    fn embedded_templates_interpolate_as_text() {
        let (inputs, results) = ctx_fixture();
        let ctx = ResolveCtx::new(&inputs, &results);
        let out = resolve_value(&json!("{{ results.fetch_data.count }} rows in {{ inputs.region }}"), &ctx).unwrap();
        assert_eq!(out, json!("2 rows in us-east"));
    }

    #[test]
    fn arrays_and_objects_resolve_recursively() {
        let (inputs, results) = ctx_fixture();
        let ctx = ResolveCtx::new(&inputs, &results);
        let out = resolve_value(&json!({"q": {"region": "{{ inputs.region }}"}, "ids": ["{{ results.fetch_data.rows.0.id }}"]}),
                                &ctx).unwrap();
        assert_eq!(out, json!({"q": {"region": "us-east"}, "ids": [7]}));
    }

    #[test]
    fn missing_reference_is_an_unresolved_error() {
        let (inputs, results) = ctx_fixture();
        let ctx = ResolveCtx::new(&inputs, &results);
        let err = resolve_value(&json!("{{ results.nope.value }}"), &ctx).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedReference(ref r) if r == "results.nope.value"));
    }

    #[test]
    fn plain_strings_pass_through() {
        let (inputs, results) = ctx_fixture();
        let ctx = ResolveCtx::new(&inputs, &results);
        assert_eq!(resolve_value(&json!("no templates here"), &ctx).unwrap(), json!("no templates here"));
    }
}
