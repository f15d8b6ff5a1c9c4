//! Tools builtin deterministas.
//!
//! No tocan red ni disco: transforman sus parámetros ya resueltos. Sirven
//! para previews de recetas y para ejercitar el motor sin colaboradores
//! externos.
//!
//! - `json.echo`    devuelve sus parámetros tal cual.
//! - `json.select`  extrae un sub-valor por path (`a.b.0`) de `from`.
//! - `table.build`  arma un output item de tabla desde filas-objeto.
//! - `text.render`  emite un output item de texto.
use serde_json::{json, Value};

use recipe_core::{ToolError, ToolOutcome};
use recipe_domain::OutputItemKind;

use crate::registry::ToolRegistry;

pub fn install(registry: &mut ToolRegistry) {
    registry.register("json.echo", echo);
    registry.register("json.select", select);
    registry.register("table.build", build_table);
    registry.register("text.render", render_text);
}

fn echo(params: &Value) -> Result<ToolOutcome, ToolError> {
    Ok(ToolOutcome::value(params.clone()))
}

fn select(params: &Value) -> Result<ToolOutcome, ToolError> {
    let source = params.get("from")
                       .ok_or_else(|| ToolError::Fatal("json.select: missing 'from'".into()))?;
    let path = params.get("path")
                     .and_then(Value::as_str)
                     .ok_or_else(|| ToolError::Fatal("json.select: 'path' must be a string".into()))?;

    let mut current = source;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }.ok_or_else(|| ToolError::Fatal(format!("json.select: path '{path}' not found at '{segment}'")))?;
    }
    Ok(ToolOutcome::value(current.clone()))
}

fn build_table(params: &Value) -> Result<ToolOutcome, ToolError> {
    let rows = params.get("rows")
                     .and_then(Value::as_array)
                     .ok_or_else(|| ToolError::Fatal("table.build: 'rows' must be an array".into()))?;

    // Columnas explícitas, o las claves de la primera fila en orden.
    let columns: Vec<String> = match params.get("columns").and_then(Value::as_array) {
        Some(cols) => cols.iter()
                          .map(|c| c.as_str()
                                    .map(str::to_string)
                                    .ok_or_else(|| ToolError::Fatal("table.build: column names must be strings".into())))
                          .collect::<Result<_, _>>()?,
        None => rows.first()
                    .and_then(Value::as_object)
                    .map(|row| row.keys().cloned().collect())
                    .unwrap_or_default(),
    };

    let mut cells: Vec<Vec<Value>> = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(row) = row.as_object() else {
            return Err(ToolError::Fatal("table.build: each row must be an object".into()));
        };
        cells.push(columns.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Null)).collect());
    }

    let title = params.get("title").and_then(Value::as_str).map(str::to_string);
    Ok(ToolOutcome::with_output(json!({"count": rows.len(), "columns": columns}),
                                OutputItemKind::Table,
                                json!({"columns": columns, "rows": cells}),
                                title))
}

fn render_text(params: &Value) -> Result<ToolOutcome, ToolError> {
    let text = params.get("text")
                     .and_then(Value::as_str)
                     .ok_or_else(|| ToolError::Fatal("text.render: 'text' must be a string".into()))?;
    let title = params.get("title").and_then(Value::as_str).map(str::to_string);
    Ok(ToolOutcome::with_output(json!({"length": text.len()}),
                                OutputItemKind::Text,
                                json!(text),
                                title))
}
