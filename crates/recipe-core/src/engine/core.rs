//! `RecipeEngine`: la máquina de estados central.
//!
//! Estados de una ejecución: `running -> {running, waiting_input, completed,
//! failed}`; `waiting_input -> running` sólo vía respond; `completed`/`failed`
//! son terminales.
//!
//! Regla de persistencia (invariante testeado): cada transición de fase es
//! exactamente UNA llamada a `ExecutionStore::persist`. Las escrituras
//! intermedias que registran resultados nunca tocan `pending_input`; la
//! escritura que lo anula es la misma que registra la respuesta (respond) y
//! la que fija una nueva suspensión o un cierre es una sola llamada atómica.
//!
//! El motor corre sincrónico dentro de la request lógica (start o respond):
//! cada invocación avanza hasta suspender, completar o fallar. La exclusión
//! entre invocaciones concurrentes la da el chequeo de versión del store.
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::{json, Value};
use uuid::Uuid;

use recipe_domain::{InputField, RecipeRelease, StepKind};

use crate::errors::EngineError;
use crate::model::{ExecutionScope, ExecutionStatus, PendingInputConfig, RecipeExecution, StepResult};
use crate::outputs;
use crate::params::{eval_condition, resolve_value, ResolveCtx};
use crate::release::{next_step, NormalizedRelease, ReleaseCache};
use crate::store::{ExecutionStore, InMemoryExecutionStore};
use crate::tool::{ToolInvoker, ToolOutcome};

pub struct RecipeEngine<S, T>
    where S: ExecutionStore,
          T: ToolInvoker
{
    pub(crate) store: S,
    pub(crate) tools: T,
    pub(crate) releases: ReleaseCache,
}

impl<T> RecipeEngine<InMemoryExecutionStore, T> where T: ToolInvoker
{
    /// Motor con store en memoria; útil en tests y previews.
    pub fn in_memory(tools: T) -> Self {
        Self::new(InMemoryExecutionStore::new(), tools)
    }
}

impl<S, T> RecipeEngine<S, T>
    where S: ExecutionStore,
          T: ToolInvoker
{
    pub fn new(store: S, tools: T) -> Self {
        Self { store,
               tools,
               releases: ReleaseCache::new() }
    }

    /// Variante con cache compartido/inyectado de releases normalizadas.
    pub fn with_cache(store: S, tools: T, releases: ReleaseCache) -> Self {
        Self { store,
               tools,
               releases }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Inicia una ejecución para `release` en `scope`, o se adhiere a la
    /// activa existente (nunca duplica un run en curso).
    pub fn start(&mut self,
                 release: &RecipeRelease,
                 scope: ExecutionScope,
                 inputs: Value)
                 -> Result<RecipeExecution, EngineError> {
        let normalized = self.releases.get_or_normalize(release)?;

        if let Some(existing) = self.store.find_pending(release.recipe_id, &scope)? {
            debug!("attaching to active execution {} for recipe {}", existing.id, release.recipe_id);
            return Ok(existing);
        }

        let first_step = next_step(&normalized, &IndexMap::new())?.map(|s| s.key.clone());
        let mut execution = RecipeExecution::new(release.recipe_id, release.id, scope, inputs, first_step);
        self.store.insert(&execution)?;
        info!("started execution {} (recipe {}, release v{})",
              execution.id, release.recipe_id, release.version);

        self.run_loop(&mut execution, &normalized)?;
        Ok(execution)
    }

    /// Re-entra al loop para una ejecución existente. Idempotente: una
    /// ejecución borrada devuelve `None` (cancelación externa tolerada) y una
    /// terminal o suspendida se devuelve sin mutar.
    pub fn resume(&mut self, execution_id: Uuid, release: &RecipeRelease) -> Result<Option<RecipeExecution>, EngineError> {
        let Some(mut execution) = self.store.load(execution_id)? else {
            debug!("resume on missing execution {execution_id}: no-op");
            return Ok(None);
        };
        check_release(&execution, release)?;
        if execution.is_terminal() || execution.status == ExecutionStatus::WaitingInput {
            return Ok(Some(execution));
        }

        let normalized = self.releases.get_or_normalize(release)?;
        self.run_loop(&mut execution, &normalized)?;
        Ok(Some(execution))
    }

    /// Localiza la ejecución no-terminal del scope (lectura advisory; la
    /// restricción de unicidad vive en el insert del store). `None` si no
    /// hay ninguna activa.
    pub fn pending_execution(&self, recipe_id: Uuid, scope: &ExecutionScope) -> Result<Option<RecipeExecution>, EngineError> {
        self.store.find_pending(recipe_id, scope)
    }

    /// Borrado/cancelación explícita. `true` si la ejecución existía.
    pub fn delete_execution(&mut self, execution_id: Uuid) -> Result<bool, EngineError> {
        self.store.delete(execution_id)
    }

    /// El step-loop: corre steps en orden hasta completar, fallar o
    /// suspender en un step de input humano.
    pub(crate) fn run_loop(&mut self,
                           execution: &mut RecipeExecution,
                           release: &NormalizedRelease)
                           -> Result<(), EngineError> {
        loop {
            let step = match next_step(release, &execution.results) {
                Ok(found) => found,
                Err(err) => {
                    // Ciclo o grafo roto: defecto de autoría, fatal y visible.
                    execution.failure_reason = Some(err.to_string());
                    execution.status = ExecutionStatus::Failed;
                    self.store.persist(execution, &[])?;
                    return Err(err);
                }
            };

            let Some(step) = step else {
                // No quedan steps: computar salidas finales y cerrar, todo en
                // una única escritura terminal.
                let items = match outputs::compute_final_outputs(execution, release) {
                    Ok(items) => items,
                    Err(err) => return self.fail(execution, format!("output binding failed: {err}")),
                };
                for item in &items {
                    execution.output_item_ids.push(item.id);
                }
                execution.status = ExecutionStatus::Completed;
                self.store.persist(execution, &items)?;
                info!("execution {} completed with {} results, {} output items",
                      execution.id,
                      execution.results.len(),
                      execution.output_item_ids.len());
                return Ok(());
            };

            execution.current_step_key = Some(step.key.clone());

            match &step.kind {
                StepKind::HumanInput { fields } => {
                    let config = {
                        let ctx = ResolveCtx::new(&execution.inputs, &execution.results);
                        match build_pending_config(fields, &ctx) {
                            Ok(config) => config,
                            Err(err) => return self.fail(execution, format!("step '{}': {err}", step.key)),
                        }
                    };
                    // Suspensión: sin resultado para este step, para que el
                    // respond retome exactamente aquí.
                    execution.pending_input = Some(config);
                    execution.status = ExecutionStatus::WaitingInput;
                    self.store.persist(execution, &[])?;
                    info!("execution {} waiting for input at step '{}'", execution.id, step.key);
                    return Ok(());
                }
                StepKind::ToolCall { tool, params } => {
                    let resolved = {
                        let ctx = ResolveCtx::new(&execution.inputs, &execution.results);
                        resolve_value(params, &ctx)
                    };
                    let resolved = match resolved {
                        Ok(value) => value,
                        Err(err) => return self.fail(execution, format!("step '{}': {err}", step.key)),
                    };

                    match self.tools.invoke(tool, &resolved) {
                        Ok(outcome) => self.record_step(execution, &step.key, outcome)?,
                        Err(err) if err.is_transient() => {
                            // Sin mutación: el step en curso puede reintentarse
                            // antes de quedar registrado.
                            warn!("execution {} step '{}' transient failure: {err}", execution.id, step.key);
                            return Err(EngineError::StepFailed { step_key: step.key.clone(),
                                                                 retryable: true,
                                                                 message: err.to_string() });
                        }
                        Err(err) => return self.fail(execution, format!("step '{}': {err}", step.key)),
                    }
                }
                StepKind::Conditional { condition } => {
                    let outcome = {
                        let ctx = ResolveCtx::new(&execution.inputs, &execution.results);
                        eval_condition(condition, &ctx)
                    };
                    match outcome {
                        Ok(verdict) => self.record_step(execution, &step.key, ToolOutcome::value(json!(verdict)))?,
                        Err(err) => return self.fail(execution, format!("step '{}': {err}", step.key)),
                    }
                }
            }
        }
    }

    /// Registra el resultado de un step y su output item opcional en una
    /// sola escritura, y deja el loop continuar.
    fn record_step(&mut self,
                   execution: &mut RecipeExecution,
                   step_key: &str,
                   outcome: ToolOutcome)
                   -> Result<(), EngineError> {
        execution.results.insert(step_key.to_string(), StepResult::new(outcome.value));
        let mut items = Vec::new();
        if let Some(output) = outcome.output_item {
            let item = outputs::emit(execution.id, output.kind, output.payload, output.display_name);
            execution.output_item_ids.push(item.id);
            items.push(item);
        }
        self.store.persist(execution, &items)?;
        debug!("execution {} recorded step '{}'", execution.id, step_key);
        Ok(())
    }

    /// Falla fatal de step: una escritura terminal, retorno normal (el estado
    /// `failed` es la señal visible; no se lanza error).
    fn fail(&mut self, execution: &mut RecipeExecution, reason: String) -> Result<(), EngineError> {
        warn!("execution {} failed: {reason}", execution.id);
        execution.failure_reason = Some(reason);
        execution.pending_input = None;
        execution.status = ExecutionStatus::Failed;
        self.store.persist(execution, &[])?;
        Ok(())
    }
}

/// Exige que `release` sea la que disparó la ejecución. Las claves de
/// `current_step_key`/`results` sólo tienen sentido contra el set normalizado
/// de esa release.
pub(crate) fn check_release(execution: &RecipeExecution, release: &RecipeRelease) -> Result<(), EngineError> {
    if execution.release_id != release.id {
        return Err(EngineError::ReleaseMismatch { id: execution.id,
                                                  expected: execution.release_id,
                                                  found: release.id });
    }
    Ok(())
}

/// Construye el `PendingInputConfig` resolviendo defaults plantillados contra
/// `inputs`/`results` en el momento de la suspensión.
fn build_pending_config(fields: &[InputField], ctx: &ResolveCtx<'_>) -> Result<PendingInputConfig, EngineError> {
    let mut resolved = Vec::with_capacity(fields.len());
    for field in fields {
        let mut field = field.clone();
        if let Some(default) = &field.default {
            field.default = Some(resolve_value(default, ctx)?);
        }
        resolved.push(field);
    }
    Ok(PendingInputConfig::new(resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::NoopInvoker;

    fn scope() -> ExecutionScope {
        ExecutionScope { organization_id: Uuid::new_v4(),
                         environment_id: Uuid::new_v4() }
    }

    #[test]
    fn empty_release_completes_in_one_invocation() {
        let release = RecipeRelease::new(Uuid::new_v4(), 1, vec![]);
        let mut engine = RecipeEngine::in_memory(NoopInvoker);

        let execution = engine.start(&release, scope(), json!({})).expect("start");
        assert_eq!(execution.status, ExecutionStatus::Completed);
        assert!(execution.current_step_key.is_none());
        assert!(execution.results.is_empty());
    }

    #[test]
    fn start_attaches_to_existing_active_execution() {
        let release = RecipeRelease::new(Uuid::new_v4(),
                                         1,
                                         vec![recipe_domain::ReleaseStep::new(
                                             "gate",
                                             StepKind::HumanInput { fields: vec![InputField::required(
                                                 "ok",
                                                 "Continue?",
                                                 recipe_domain::FieldType::Boolean)] })]);
        let shared = scope();
        let mut engine = RecipeEngine::in_memory(NoopInvoker);

        let first = engine.start(&release, shared, json!({})).expect("first start");
        assert_eq!(first.status, ExecutionStatus::WaitingInput);

        let second = engine.start(&release, shared, json!({"other": true})).expect("second start");
        assert_eq!(second.id, first.id, "second start must attach, not duplicate");
    }
}
