//! recipe-adapters: capa de adaptación entre el motor y los tools concretos.
//!
//! Este crate provee:
//! - `ToolRegistry`: un `ToolInvoker` por tabla de despacho, donde cada tool
//!   se registra por nombre como un closure.
//! - Tools builtin deterministas (`json.echo`, `json.select`, `table.build`,
//!   `text.render`) para previews, demos y tests del motor.
//!
//! El core sólo conoce el trait `ToolInvoker`; aquí viven los nombres.

pub mod builtin;
pub mod registry;

pub use registry::ToolRegistry;
