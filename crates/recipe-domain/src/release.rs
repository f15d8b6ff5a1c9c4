//! Release inmutable de una receta: lista ordenada de steps + outputs.
//!
//! Una `RecipeRelease` se crea al publicar y nunca se muta. Los steps pueden
//! declararse fuera de orden de dependencia; el orden real de ejecución lo
//! decide el resolutor del motor a partir de `after`.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::DomainError;
use crate::field::InputField;
use crate::output::OutputBinding;

/// Clase de un step. Unión cerrada: el motor hace dispatch exhaustivo, de
/// modo que agregar una variante obliga a manejarla en todos los sitios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Invoca una capacidad externa (tool, query de recurso, sub-receta).
    /// `params` puede contener plantillas `{{ inputs.x }}` / `{{ results.s.y }}`.
    ToolCall { tool: String, params: Value },
    /// Suspende la ejecución hasta que un humano responda los `fields`.
    HumanInput { fields: Vec<InputField> },
    /// Evalúa una condición sobre `inputs`/`results` y registra el booleano
    /// como resultado del step.
    Conditional { condition: String },
}

/// Un step tal como lo declara el autor dentro de una release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseStep {
    /// Clave única dentro de la release.
    pub key: String,
    /// Clase y parámetros del step.
    #[serde(flatten)]
    pub kind: StepKind,
    /// Claves de steps predecesores (orden de ejecución declarado).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub after: Vec<String>,
}

impl ReleaseStep {
    pub fn new(key: impl Into<String>, kind: StepKind) -> Self {
        Self { key: key.into(),
               kind,
               after: Vec::new() }
    }

    /// Declara predecesores del step.
    pub fn after(mut self, keys: &[&str]) -> Self {
        self.after = keys.iter().map(|k| k.to_string()).collect();
        self
    }
}

/// Versión publicada e inmutable de una receta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRelease {
    pub id: Uuid,
    pub recipe_id: Uuid,
    /// Número de versión asignado al publicar.
    pub version: u32,
    /// Steps en orden de declaración.
    pub steps: Vec<ReleaseStep>,
    /// Salidas computadas al completar una ejecución.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputBinding>,
}

impl RecipeRelease {
    pub fn new(recipe_id: Uuid, version: u32, steps: Vec<ReleaseStep>) -> Self {
        Self { id: Uuid::new_v4(),
               recipe_id,
               version,
               steps,
               outputs: Vec::new() }
    }

    pub fn with_outputs(mut self, outputs: Vec<OutputBinding>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Validación autoral al publicar: claves no vacías y únicas,
    /// predecesores existentes. El motor re-valida al normalizar; esto
    /// permite rechazar una release antes de persistirla.
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut seen: HashSet<&str> = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            let key = step.key.trim();
            if key.is_empty() {
                return Err(DomainError::ValidationError("step with empty key".into()));
            }
            if !seen.insert(key) {
                return Err(DomainError::ValidationError(format!("duplicate step key '{key}'")));
            }
        }
        for step in &self.steps {
            for predecessor in &step.after {
                if !seen.contains(predecessor.as_str()) {
                    return Err(DomainError::ValidationError(format!("step '{}' references unknown predecessor '{}'",
                                                                    step.key, predecessor)));
                }
            }
        }
        Ok(())
    }
}
