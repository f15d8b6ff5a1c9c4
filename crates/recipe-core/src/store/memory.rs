//! Implementación en memoria del `ExecutionStore`.
//!
//! Además de las tablas, mantiene un `journal` con el snapshot exacto de cada
//! llamada a `persist` — el gancho que usan los tests para verificar que una
//! transición de fase es exactamente una escritura y que ninguna escritura
//! anula `pending_input` antes de registrar la respuesta.
use std::collections::HashMap;

use chrono::Utc;
use log::warn;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::model::{ExecutionScope, ExecutionStatus, OutputItem, RecipeExecution};
use crate::store::ExecutionStore;

#[derive(Default)]
pub struct InMemoryExecutionStore {
    executions: HashMap<Uuid, RecipeExecution>,
    output_items: HashMap<Uuid, OutputItem>,
    journal: Vec<RecipeExecution>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots de cada `persist`, en orden de escritura.
    pub fn journal(&self) -> &[RecipeExecution] {
        &self.journal
    }

    /// Escrituras registradas para una ejecución puntual.
    pub fn journal_for(&self, execution_id: Uuid) -> Vec<&RecipeExecution> {
        self.journal.iter().filter(|e| e.id == execution_id).collect()
    }

    pub fn output_items_for(&self, execution: &RecipeExecution) -> Vec<&OutputItem> {
        execution.output_item_ids
                 .iter()
                 .filter_map(|id| self.output_items.get(id))
                 .collect()
    }
}

impl ExecutionStore for InMemoryExecutionStore {
    fn insert(&mut self, execution: &RecipeExecution) -> Result<(), EngineError> {
        let scope = execution.scope();
        if let Some(existing) = self.executions
                                    .values()
                                    .find(|e| e.recipe_id == execution.recipe_id && e.scope() == scope && !e.is_terminal())
        {
            return Err(EngineError::DuplicateActiveExecution { recipe_id: execution.recipe_id,
                                                               existing: existing.id });
        }
        self.executions.insert(execution.id, execution.clone());
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Option<RecipeExecution>, EngineError> {
        Ok(self.executions.get(&id).cloned())
    }

    fn persist(&mut self, execution: &mut RecipeExecution, items: &[OutputItem]) -> Result<(), EngineError> {
        let Some(stored) = self.executions.get(&execution.id) else {
            return Err(EngineError::ExecutionNotFound(execution.id));
        };
        if stored.version != execution.version {
            warn!("persist conflict on execution {}: expected v{}, found v{}",
                  execution.id, execution.version, stored.version);
            return Err(EngineError::Conflict { id: execution.id,
                                               expected: execution.version,
                                               found: stored.version });
        }
        if stored.is_terminal() {
            return Err(EngineError::InvalidState { id: execution.id,
                                                   status: stored.status });
        }
        debug_assert!(execution.suspension_consistent(),
                      "pending_input must be Some iff status is WaitingInput");

        execution.version += 1;
        execution.updated_at = Utc::now();
        for item in items {
            self.output_items.insert(item.id, item.clone());
        }
        self.executions.insert(execution.id, execution.clone());
        self.journal.push(execution.clone());
        Ok(())
    }

    fn find_pending(&self, recipe_id: Uuid, scope: &ExecutionScope) -> Result<Option<RecipeExecution>, EngineError> {
        Ok(self.executions
               .values()
               .find(|e| {
                   e.recipe_id == recipe_id
                   && e.scope() == *scope
                   && matches!(e.status, ExecutionStatus::Running | ExecutionStatus::WaitingInput)
               })
               .cloned())
    }

    fn output_item(&self, id: Uuid) -> Result<Option<OutputItem>, EngineError> {
        Ok(self.output_items.get(&id).cloned())
    }

    fn delete(&mut self, id: Uuid) -> Result<bool, EngineError> {
        Ok(self.executions.remove(&id).is_some())
    }
}
