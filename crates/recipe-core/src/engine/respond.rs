//! Handler de respond/resume: fusiona la respuesta humana y re-entra al loop.
//!
//! Protocolo (POST .../executions/:id/respond):
//! 1. cargar la ejecución (`ExecutionNotFound` si no existe) y exigir que
//!    `release` sea la que la disparó (`ReleaseMismatch` si no);
//! 2. exigir `status == waiting_input` (`InvalidState` si no);
//! 3. validar el payload contra `pending_input.fields` (`InvalidResponse`
//!    enumera los campos ofensivos, sin mutar estado);
//! 4. atómico: registrar la respuesta como resultado de `current_step_key`,
//!    anular `pending_input` y pasar a `running` — UNA sola escritura;
//! 5. re-entrar al step-loop y devolver el snapshot resultante (puede quedar
//!    `waiting_input` de nuevo si sigue otro step humano).
use log::info;
use serde_json::Value;
use uuid::Uuid;

use recipe_domain::RecipeRelease;

use crate::errors::EngineError;
use crate::model::{ExecutionStatus, RecipeExecution, StepResult};
use crate::store::ExecutionStore;
use crate::tool::ToolInvoker;

use super::core::RecipeEngine;

impl<S, T> RecipeEngine<S, T>
    where S: ExecutionStore,
          T: ToolInvoker
{
    pub fn respond(&mut self,
                   execution_id: Uuid,
                   release: &RecipeRelease,
                   response: &Value)
                   -> Result<RecipeExecution, EngineError> {
        let Some(mut execution) = self.store.load(execution_id)? else {
            return Err(EngineError::ExecutionNotFound(execution_id));
        };
        super::core::check_release(&execution, release)?;
        if execution.status != ExecutionStatus::WaitingInput {
            return Err(EngineError::InvalidState { id: execution.id,
                                                   status: execution.status });
        }

        let config = execution.pending_input
                              .clone()
                              .ok_or_else(|| EngineError::Internal("waiting_input without pending_input".into()))?;
        let validated = config.validate(response)?;

        let step_key = execution.current_step_key
                                .clone()
                                .ok_or_else(|| EngineError::Internal("waiting_input without current step".into()))?;

        // La escritura que anula pending_input es la misma que registra la
        // respuesta; nunca dos llamadas separadas.
        execution.results.insert(step_key.clone(), StepResult::new(validated));
        execution.pending_input = None;
        execution.status = ExecutionStatus::Running;
        self.store.persist(&mut execution, &[])?;
        info!("execution {} resumed from step '{}'", execution.id, step_key);

        let normalized = self.releases.get_or_normalize(release)?;
        self.run_loop(&mut execution, &normalized)?;
        Ok(execution)
    }
}
