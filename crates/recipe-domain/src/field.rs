//! Campos de entrada que un step de tipo humano presenta al usuario.
//!
//! Un `InputField` describe una pregunta: clave, prompt, tipo esperado y un
//! default opcional. El default puede contener plantillas (`{{ inputs.x }}`)
//! que el motor resuelve en el momento de la suspensión; este crate no las
//! interpreta.
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tipo esperado del valor que responde el humano.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Texto libre.
    Text,
    /// Número (entero o flotante JSON).
    Number,
    /// Booleano.
    Boolean,
    /// JSON arbitrario (no se valida estructura interna).
    Json,
}

impl FieldType {
    /// Indica si `value` es aceptable para este tipo.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Json => true,
        }
    }

    /// Nombre estable usado en mensajes de validación.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Json => "json",
        }
    }
}

/// Una pregunta individual dentro de un step de input humano.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputField {
    /// Clave del campo dentro del payload de respuesta.
    pub key: String,
    /// Texto que la consola presenta al usuario.
    pub prompt: String,
    /// Tipo esperado de la respuesta.
    pub field_type: FieldType,
    /// Si el campo debe estar presente en la respuesta.
    #[serde(default = "default_required")]
    pub required: bool,
    /// Default opcional; puede ser una plantilla a resolver por el motor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl InputField {
    /// Campo requerido sin default.
    pub fn required(key: impl Into<String>, prompt: impl Into<String>, field_type: FieldType) -> Self {
        Self { key: key.into(),
               prompt: prompt.into(),
               field_type,
               required: true,
               default: None }
    }

    /// Campo opcional con default.
    pub fn optional(key: impl Into<String>,
                    prompt: impl Into<String>,
                    field_type: FieldType,
                    default: Value)
                    -> Self {
        Self { key: key.into(),
               prompt: prompt.into(),
               field_type,
               required: false,
               default: Some(default) }
    }
}
