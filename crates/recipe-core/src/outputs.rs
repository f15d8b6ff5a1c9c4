//! Emisor de output items.
//!
//! Construye artefactos visibles y computa las salidas finales declaradas por
//! la release. La escritura de los items SIEMPRE viaja en la misma llamada de
//! persistencia que el resultado del step (o la transición terminal) que los
//! produjo — así un crash tras una escritura parcial no deja items huérfanos.
use serde_json::Value;
use uuid::Uuid;

use recipe_domain::OutputItemKind;

use crate::errors::EngineError;
use crate::model::{OutputItem, RecipeExecution};
use crate::params::{resolve_value, ResolveCtx};
use crate::release::NormalizedRelease;

/// Crea un item listo para encolar en la próxima escritura.
pub fn emit(execution_id: Uuid, kind: OutputItemKind, payload: Value, display_name: Option<String>) -> OutputItem {
    OutputItem::new(execution_id, kind, payload, display_name)
}

/// Computa las salidas finales resolviendo cada `OutputBinding` contra
/// `inputs`/`results`. Se invoca cuando no quedan steps por ejecutar.
pub fn compute_final_outputs(execution: &RecipeExecution,
                             release: &NormalizedRelease)
                             -> Result<Vec<OutputItem>, EngineError> {
    let ctx = ResolveCtx::new(&execution.inputs, &execution.results);
    let mut items = Vec::with_capacity(release.outputs.len());
    for binding in &release.outputs {
        let payload = resolve_value(&binding.value, &ctx)?;
        items.push(OutputItem::new(execution.id, binding.kind, payload, Some(binding.name.clone())));
    }
    Ok(items)
}
