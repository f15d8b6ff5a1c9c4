//! `RecipeExecution`: la unidad mutable de trabajo.
//!
//! Invariantes del registro:
//! - `pending_input` es `Some` **iff** `status == WaitingInput`.
//! - `current_step_key` refiere a un step del set normalizado de la release
//!   (`None` sólo para una release vacía).
//! - `results[k]` se escribe a lo sumo una vez por step; el step en curso
//!   puede reintentarse antes de quedar registrado.
//! - Una ejecución es terminal exactamente una vez; después no hay mutación
//!   (los output items del cierre viajan en la misma escritura terminal).
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::model::pending::PendingInputConfig;

/// Estado de una ejecución.
///
/// Transiciones válidas:
/// - `Running` -> `Running | WaitingInput | Completed | Failed`
/// - `WaitingInput` -> `Running` (sólo vía respond)
/// - `Completed` / `Failed` son terminales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    WaitingInput,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// Scope organizacional de una ejecución. Junto con `recipe_id` define la
/// unicidad de "a lo sumo una ejecución activa".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionScope {
    pub organization_id: Uuid,
    pub environment_id: Uuid,
}

/// Resultado registrado de un step. Append-only por clave.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub value: Value,
    pub recorded_at: DateTime<Utc>,
}

impl StepResult {
    pub fn new(value: Value) -> Self {
        Self { value,
               recorded_at: Utc::now() }
    }
}

/// Registro durable de una ejecución; única fuente de verdad del motor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeExecution {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub release_id: Uuid,
    pub organization_id: Uuid,
    pub environment_id: Uuid,
    pub status: ExecutionStatus,
    /// Step esperando ejecución o respuesta. `None` sólo en releases vacías.
    pub current_step_key: Option<String>,
    /// Inputs de disparo; inmutables tras la creación.
    pub inputs: Value,
    /// Resultados por step, en orden de inserción (replay determinista).
    pub results: IndexMap<String, StepResult>,
    /// No nulo únicamente mientras se espera a un humano.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_input: Option<PendingInputConfig>,
    /// Referencias ordenadas a artefactos emitidos.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_item_ids: Vec<Uuid>,
    /// Motivo de falla cuando `status == Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Token de concurrencia optimista; lo avanza el store en cada persist.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeExecution {
    /// Crea una ejecución recién disparada (`status = Running`).
    /// `first_step_key` es el primer step resoluble según el resolutor.
    pub fn new(recipe_id: Uuid,
               release_id: Uuid,
               scope: ExecutionScope,
               inputs: Value,
               first_step_key: Option<String>)
               -> Self {
        let now = Utc::now();
        Self { id: Uuid::new_v4(),
               recipe_id,
               release_id,
               organization_id: scope.organization_id,
               environment_id: scope.environment_id,
               status: ExecutionStatus::Running,
               current_step_key: first_step_key,
               inputs,
               results: IndexMap::new(),
               pending_input: None,
               output_item_ids: Vec::new(),
               failure_reason: None,
               version: 0,
               created_at: now,
               updated_at: now }
    }

    pub fn scope(&self) -> ExecutionScope {
        ExecutionScope { organization_id: self.organization_id,
                         environment_id: self.environment_id }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Chequeo del invariante de suspensión (usado por el store y en tests).
    pub fn suspension_consistent(&self) -> bool {
        self.pending_input.is_some() == (self.status == ExecutionStatus::WaitingInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> ExecutionScope {
        ExecutionScope { organization_id: Uuid::new_v4(),
                         environment_id: Uuid::new_v4() }
    }

    #[test]
    fn new_execution_starts_running_without_pending_input() {
        let exec = RecipeExecution::new(Uuid::new_v4(),
                                        Uuid::new_v4(),
                                        scope(),
                                        json!({"rows": 3}),
                                        Some("fetch_data".into()));
        assert_eq!(exec.status, ExecutionStatus::Running);
        assert!(exec.pending_input.is_none());
        assert!(exec.suspension_consistent());
        assert_eq!(exec.version, 0);
        assert!(exec.results.is_empty());
    }

    #[test]
    fn terminal_states_are_detected() {
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(!ExecutionStatus::WaitingInput.is_terminal());
    }

    #[test]
    fn results_preserve_insertion_order_through_serde() {
        let mut exec = RecipeExecution::new(Uuid::new_v4(), Uuid::new_v4(), scope(), json!({}), None);
        exec.results.insert("b_step".into(), StepResult::new(json!(1)));
        exec.results.insert("a_step".into(), StepResult::new(json!(2)));

        let round: RecipeExecution =
            serde_json::from_value(serde_json::to_value(&exec).expect("ser")).expect("de");
        let keys: Vec<&String> = round.results.keys().collect();
        assert_eq!(keys, ["b_step", "a_step"]);
    }
}
