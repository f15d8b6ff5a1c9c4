//! Artefacto visible para el usuario, producido durante la ejecución.
//!
//! Append-only: se crea una vez y se referencia por id desde
//! `RecipeExecution::output_item_ids`. El payload es JSON opaco; el motor no
//! interpreta su semántica.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use recipe_domain::OutputItemKind;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputItem {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub kind: OutputItemKind,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl OutputItem {
    pub fn new(execution_id: Uuid, kind: OutputItemKind, payload: Value, display_name: Option<String>) -> Self {
        Self { id: Uuid::new_v4(),
               execution_id,
               kind,
               payload,
               display_name,
               created_at: Utc::now() }
    }
}
