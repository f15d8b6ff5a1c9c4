//! Descriptores de salida de una release.
//!
//! Una release declara qué artefactos visibles produce al completarse. El
//! `value` de cada binding es JSON con plantillas que el motor resuelve
//! contra `inputs`/`results` al emitir.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tipos de artefacto visibles para el usuario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputItemKind {
    Table,
    Chart,
    Markdown,
    KeyValue,
    Text,
}

/// Declaración de una salida computada al completar la ejecución.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputBinding {
    /// Nombre visible del artefacto.
    pub name: String,
    /// Tipo del artefacto emitido.
    pub kind: OutputItemKind,
    /// Payload (posiblemente con plantillas) a resolver al emitir.
    pub value: Value,
}
