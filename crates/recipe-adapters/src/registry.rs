//! `ToolRegistry`: despacho de tools por nombre.
//!
//! Cada tool es un closure `Fn(&Value) -> Result<ToolOutcome, ToolError>`;
//! el registry implementa `ToolInvoker` buscando por nombre exacto. Un tool
//! desconocido es `Fatal` (defecto de autoría de la release, no condición
//! transitoria).
use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use recipe_core::{ToolError, ToolInvoker, ToolOutcome};

type BoxedTool = Box<dyn Fn(&Value) -> Result<ToolOutcome, ToolError> + Send + Sync>;

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, BoxedTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry con los tools builtin ya cargados.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtin::install(&mut registry);
        registry
    }

    /// Registra (o reemplaza) un tool bajo `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, tool: F)
        where F: Fn(&Value) -> Result<ToolOutcome, ToolError> + Send + Sync + 'static
    {
        self.tools.insert(name.into(), Box::new(tool));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ToolInvoker for ToolRegistry {
    fn invoke(&self, tool: &str, params: &Value) -> Result<ToolOutcome, ToolError> {
        let Some(handler) = self.tools.get(tool) else {
            return Err(ToolError::Fatal(format!("unknown tool '{tool}'")));
        };
        debug!("invoking tool '{tool}'");
        handler(params)
    }
}
