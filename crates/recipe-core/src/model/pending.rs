//! `PendingInputConfig`: las preguntas que un humano debe responder antes de
//! que la ejecución continúe. Se construye al suspender (con defaults ya
//! resueltos contra inputs/results) y valida la respuesta en el respond.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use recipe_domain::InputField;

use crate::errors::{EngineError, FieldError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInputConfig {
    /// Campos a presentar, en el orden en que se declararon.
    pub fields: Vec<InputField>,
}

impl PendingInputConfig {
    pub fn new(fields: Vec<InputField>) -> Self {
        Self { fields }
    }

    /// Valida `response` contra los campos pendientes.
    ///
    /// Reglas:
    /// - el payload debe ser un objeto JSON;
    /// - campos requeridos deben estar presentes y no-null;
    /// - el tipo de cada valor debe coincidir con `field_type`;
    /// - claves desconocidas se rechazan (la respuesta es el resultado del
    ///   step, no un contenedor libre);
    /// - campos opcionales ausentes toman su default resuelto.
    ///
    /// Devuelve el objeto normalizado que se registra como `StepResult`.
    pub fn validate(&self, response: &Value) -> Result<Value, EngineError> {
        let Some(body) = response.as_object() else {
            return Err(EngineError::InvalidResponse { fields: vec![FieldError::new("$", "response must be a JSON object")] });
        };

        let mut errors: Vec<FieldError> = Vec::new();
        let mut normalized: Map<String, Value> = Map::new();

        for field in &self.fields {
            match body.get(&field.key) {
                Some(Value::Null) | None => {
                    if field.required {
                        errors.push(FieldError::new(&field.key, "missing required field"));
                    } else if let Some(default) = &field.default {
                        normalized.insert(field.key.clone(), default.clone());
                    }
                }
                Some(value) => {
                    if field.field_type.accepts(value) {
                        normalized.insert(field.key.clone(), value.clone());
                    } else {
                        errors.push(FieldError::new(&field.key,
                                                    format!("expected {}", field.field_type.name())));
                    }
                }
            }
        }

        for key in body.keys() {
            if !self.fields.iter().any(|f| &f.key == key) {
                errors.push(FieldError::new(key, "unknown field"));
            }
        }

        if errors.is_empty() {
            Ok(Value::Object(normalized))
        } else {
            Err(EngineError::InvalidResponse { fields: errors })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_domain::FieldType;
    use serde_json::json;

    fn config() -> PendingInputConfig {
        PendingInputConfig::new(vec![InputField::required("confirmed", "Proceed?", FieldType::Boolean),
                                     InputField::optional("note", "Note", FieldType::Text, json!("n/a"))])
    }

    #[test]
    fn valid_response_applies_defaults_for_omitted_optionals() {
        let validated = config().validate(&json!({"confirmed": true})).expect("valid");
        assert_eq!(validated, json!({"confirmed": true, "note": "n/a"}));
    }

    #[test]
    fn missing_required_and_wrong_type_are_listed_together() {
        let err = config().validate(&json!({"note": 42})).unwrap_err();
        match err {
            EngineError::InvalidResponse { fields } => {
                assert_eq!(fields.len(), 2);
                assert!(fields.iter().any(|f| f.field == "confirmed" && f.reason.contains("missing")));
                assert!(fields.iter().any(|f| f.field == "note" && f.reason.contains("text")));
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = config().validate(&json!({"confirmed": true, "extra": 1})).unwrap_err();
        match err {
            EngineError::InvalidResponse { fields } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "extra");
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let err = config().validate(&json!([true])).unwrap_err();
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn explicit_null_counts_as_missing_for_required_fields() {
        let err = config().validate(&json!({"confirmed": null})).unwrap_err();
        match err {
            EngineError::InvalidResponse { fields } => assert_eq!(fields[0].field, "confirmed"),
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }
}
