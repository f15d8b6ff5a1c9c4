//! Resolutor de orden de ejecución.
//!
//! Un step es elegible cuando todos sus predecesores tienen entrada en
//! `results` y él mismo aún no la tiene. Entre elegibles gana el primero en
//! orden de declaración — estable y determinista, requisito para reanudar de
//! forma reproducible tras un crash.
use indexmap::IndexMap;

use crate::errors::EngineError;
use crate::model::StepResult;
use crate::release::normalize::{NormalizedRelease, NormalizedStep};

/// Próximo step a ejecutar, o `None` si todos están hechos.
///
/// Si ningún step es elegible pero quedan pendientes, el grafo tiene un ciclo
/// o está roto: `UnresolvableStepGraph` (fatal, defecto de autoría).
pub fn next_step<'r>(release: &'r NormalizedRelease,
                     results: &IndexMap<String, StepResult>)
                     -> Result<Option<&'r NormalizedStep>, EngineError> {
    let mut remaining = false;
    for step in release.steps.values() {
        if results.contains_key(&step.key) {
            continue;
        }
        remaining = true;
        if step.after.iter().all(|p| results.contains_key(p)) {
            return Ok(Some(step));
        }
    }

    if remaining {
        let stuck: Vec<String> = release.steps
                                        .values()
                                        .filter(|s| !results.contains_key(&s.key))
                                        .map(|s| s.key.clone())
                                        .collect();
        return Err(EngineError::UnresolvableStepGraph { remaining: stuck });
    }
    Ok(None)
}
