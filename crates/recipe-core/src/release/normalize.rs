//! Normalizador de releases.
//!
//! Convierte la lista cruda de steps de una release en un mapa ordenado
//! `step_key -> NormalizedStep` con las aristas de dependencia validadas.
//! Corre una vez por release (el resultado se cachea por `release_id`); es
//! puro, de modo que llamadas repetidas para la misma release son
//! referencialmente estables.
use indexmap::IndexMap;
use serde_json::json;
use uuid::Uuid;

use recipe_domain::{OutputBinding, RecipeRelease, StepKind};

use crate::errors::EngineError;
use crate::hashing::hash_value;

/// Step validado dentro de una release normalizada.
#[derive(Debug, Clone)]
pub struct NormalizedStep {
    pub key: String,
    pub kind: StepKind,
    /// Claves predecesoras (todas existen en el set).
    pub after: Vec<String>,
    /// Posición de declaración; desempata la elegibilidad.
    pub index: usize,
}

/// Resultado del normalizador: mapa ordenado por declaración + outputs.
#[derive(Debug, Clone)]
pub struct NormalizedRelease {
    pub release_id: Uuid,
    pub recipe_id: Uuid,
    pub steps: IndexMap<String, NormalizedStep>,
    pub outputs: Vec<OutputBinding>,
    /// Identidad estable de la definición (canonical JSON + blake3).
    pub definition_hash: String,
}

impl NormalizedRelease {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Valida y normaliza los steps de `release`.
///
/// Falla con `InvalidRelease` si una clave está vacía o duplicada, o si un
/// predecesor referencia una clave inexistente (incluida la propia).
pub fn normalize_release(release: &RecipeRelease) -> Result<NormalizedRelease, EngineError> {
    let mut steps: IndexMap<String, NormalizedStep> = IndexMap::with_capacity(release.steps.len());

    for (index, step) in release.steps.iter().enumerate() {
        let key = step.key.trim();
        if key.is_empty() {
            return Err(EngineError::InvalidRelease(format!("step at position {index} has an empty key")));
        }
        if steps.contains_key(key) {
            return Err(EngineError::InvalidRelease(format!("duplicate step key '{key}'")));
        }
        steps.insert(key.to_string(),
                     NormalizedStep { key: key.to_string(),
                                      kind: step.kind.clone(),
                                      after: step.after.clone(),
                                      index });
    }

    for step in steps.values() {
        for predecessor in &step.after {
            if predecessor == &step.key {
                return Err(EngineError::InvalidRelease(format!("step '{}' lists itself as predecessor", step.key)));
            }
            if !steps.contains_key(predecessor) {
                return Err(EngineError::InvalidRelease(format!("step '{}' references unknown predecessor '{}'",
                                                               step.key, predecessor)));
            }
        }
    }

    let identity = json!({
        "engine_version": crate::constants::ENGINE_VERSION,
        "release_id": release.id,
        "steps": steps.values().map(|s| json!({"key": s.key, "after": s.after})).collect::<Vec<_>>(),
    });

    Ok(NormalizedRelease { release_id: release.id,
                           recipe_id: release.recipe_id,
                           steps,
                           outputs: release.outputs.clone(),
                           definition_hash: hash_value(&identity) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_domain::ReleaseStep;
    use serde_json::json;

    fn tool(key: &str) -> ReleaseStep {
        ReleaseStep::new(key,
                         StepKind::ToolCall { tool: "json.echo".into(),
                                              params: json!({}) })
    }

    #[test]
    fn steps_keep_declaration_order_and_edges() {
        let release = RecipeRelease::new(Uuid::new_v4(),
                                         1,
                                         vec![tool("fetch_data"),
                                              tool("write_record").after(&["fetch_data"])]);
        let normalized = normalize_release(&release).expect("normalize");
        let keys: Vec<&String> = normalized.steps.keys().collect();
        assert_eq!(keys, ["fetch_data", "write_record"]);
        assert_eq!(normalized.steps["write_record"].after, vec!["fetch_data"]);
        assert_eq!(normalized.steps["write_record"].index, 1);
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let release = RecipeRelease::new(Uuid::new_v4(), 1, vec![tool("a"), tool("a")]);
        let err = normalize_release(&release).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRelease(ref m) if m.contains("duplicate")));
    }

    #[test]
    fn empty_key_is_rejected() {
        let release = RecipeRelease::new(Uuid::new_v4(), 1, vec![tool("  ")]);
        assert!(matches!(normalize_release(&release), Err(EngineError::InvalidRelease(_))));
    }

    #[test]
    fn unknown_predecessor_is_rejected_before_any_execution() {
        let release = RecipeRelease::new(Uuid::new_v4(), 1, vec![tool("a").after(&["ghost"])]);
        let err = normalize_release(&release).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRelease(ref m) if m.contains("ghost")));
    }

    #[test]
    fn self_predecessor_is_rejected() {
        let release = RecipeRelease::new(Uuid::new_v4(), 1, vec![tool("a").after(&["a"])]);
        assert!(matches!(normalize_release(&release), Err(EngineError::InvalidRelease(_))));
    }

    #[test]
    fn normalization_is_referentially_stable() {
        let release = RecipeRelease::new(Uuid::new_v4(), 1, vec![tool("a"), tool("b").after(&["a"])]);
        let first = normalize_release(&release).expect("first");
        let second = normalize_release(&release).expect("second");
        assert_eq!(first.definition_hash, second.definition_hash);
    }
}
