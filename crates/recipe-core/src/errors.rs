//! Errores del motor. La taxonomía distingue errores de autoría (release
//! inválida, grafo irresoluble), errores de caller (not-found, estado
//! inválido, respuesta inválida), fallas de step (transitorias o fatales) y
//! conflictos de persistencia. La suspensión NO es un error: `waiting_input`
//! es un retorno normal.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::ExecutionStatus;

/// Un campo ofensivo dentro de una respuesta inválida.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { field: field.into(),
               reason: reason.into() }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineError {
    /// Defecto de autoría detectado al normalizar (clave duplicada/vacía,
    /// predecesor inexistente). Ocurre antes de crear cualquier ejecución.
    #[error("invalid release: {0}")]
    InvalidRelease(String),

    /// Ningún step es elegible y quedan steps sin resultado: ciclo o grafo
    /// roto. Fatal, no se reintenta.
    #[error("unresolvable step graph: no eligible step among {remaining:?}")]
    UnresolvableStepGraph { remaining: Vec<String> },

    #[error("execution not found: {0}")]
    ExecutionNotFound(Uuid),

    /// Operación incompatible con el estado actual (p. ej. respond sobre una
    /// ejecución que no está en `waiting_input`).
    #[error("execution {id} is in state {status:?}")]
    InvalidState { id: Uuid, status: ExecutionStatus },

    /// La release provista no es la que disparó la ejecución. Sin este
    /// chequeo un caller podría avanzar el run con steps de otra release.
    #[error("execution {id} belongs to release {expected}, got {found}")]
    ReleaseMismatch { id: Uuid, expected: Uuid, found: Uuid },

    /// Respuesta humana que no valida contra el `PendingInputConfig` vigente.
    #[error("invalid response: {}", format_fields(.fields))]
    InvalidResponse { fields: Vec<FieldError> },

    /// Referencia `{{ ... }}` que no resuelve contra inputs/results.
    #[error("unresolved reference '{0}'")]
    UnresolvedReference(String),

    /// Falla de un step. `retryable = true` indica condición transitoria:
    /// el caller decide la política de reintento; el motor no muta estado.
    #[error("step '{step_key}' failed{}: {message}", retry_suffix(.retryable))]
    StepFailed {
        step_key: String,
        retryable: bool,
        message: String,
    },

    /// Mutación concurrente de la misma ejecución; recargar y reintentar.
    #[error("conflict on execution {id}: expected version {expected}, found {found}")]
    Conflict { id: Uuid, expected: u64, found: u64 },

    /// Ya existe una ejecución activa para la receta en ese scope.
    #[error("recipe {recipe_id} already has active execution {existing}")]
    DuplicateActiveExecution { recipe_id: Uuid, existing: Uuid },

    #[error("internal: {0}")]
    Internal(String),
}

fn format_fields(fields: &[FieldError]) -> String {
    fields.iter().map(|f| f.to_string()).collect::<Vec<_>>().join("; ")
}

fn retry_suffix(retryable: &bool) -> &'static str {
    if *retryable {
        " (retryable)"
    } else {
        ""
    }
}

impl EngineError {
    /// Mapeo a status HTTP para la capa de routing (colaborador externo).
    pub fn http_status(&self) -> u16 {
        match self {
            EngineError::InvalidRelease(_) | EngineError::InvalidResponse { .. } => 400,
            EngineError::ExecutionNotFound(_) => 404,
            EngineError::InvalidState { .. }
            | EngineError::ReleaseMismatch { .. }
            | EngineError::Conflict { .. }
            | EngineError::DuplicateActiveExecution { .. } => 409,
            EngineError::UnresolvableStepGraph { .. }
            | EngineError::UnresolvedReference(_)
            | EngineError::StepFailed { .. }
            | EngineError::Internal(_) => 500,
        }
    }

    /// Si el caller puede reintentar la misma invocación sin recargar estado.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::StepFailed { retryable: true, .. })
    }
}
