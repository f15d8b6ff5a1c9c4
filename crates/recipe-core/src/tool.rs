//! Seam hacia las capacidades externas que un `ToolCall` invoca.
//!
//! El motor no sabe hablar con bases de datos ni APIs; recibe un
//! `ToolInvoker` y clasifica sus fallas: `Transient` se devuelve al caller
//! sin mutar estado (su política decide el reintento), `Fatal` termina la
//! ejecución en `Failed`.
use serde_json::{json, Value};
use thiserror::Error;

use recipe_domain::OutputItemKind;

/// Artefacto opcional que un tool adjunta a su resultado.
#[derive(Debug, Clone)]
pub struct OutputPayload {
    pub kind: OutputItemKind,
    pub payload: Value,
    pub display_name: Option<String>,
}

/// Resultado de invocar un tool: el valor que se registra como `StepResult`
/// y, a lo sumo, un output item que viaja en la misma escritura.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub value: Value,
    pub output_item: Option<OutputPayload>,
}

impl ToolOutcome {
    pub fn value(value: Value) -> Self {
        Self { value,
               output_item: None }
    }

    pub fn with_output(value: Value, kind: OutputItemKind, payload: Value, display_name: Option<String>) -> Self {
        Self { value,
               output_item: Some(OutputPayload { kind,
                                                 payload,
                                                 display_name }) }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// Condición transitoria (red, timeout): reintentable por el caller.
    #[error("transient: {0}")]
    Transient(String),
    /// Error de lógica/autoría: la ejecución falla.
    #[error("{0}")]
    Fatal(String),
}

impl ToolError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ToolError::Transient(_))
    }
}

/// Capacidad de invocar tools por nombre con parámetros ya resueltos.
pub trait ToolInvoker {
    fn invoke(&self, tool: &str, params: &Value) -> Result<ToolOutcome, ToolError>;
}

/// Invoker nulo: responde `{"status":"ok"}` a cualquier tool. Útil para
/// previews y tests del motor que no ejercitan tools reales.
#[derive(Debug, Default)]
pub struct NoopInvoker;

impl ToolInvoker for NoopInvoker {
    fn invoke(&self, tool: &str, _params: &Value) -> Result<ToolOutcome, ToolError> {
        Ok(ToolOutcome::value(json!({"tool": tool, "status": "ok"})))
    }
}
