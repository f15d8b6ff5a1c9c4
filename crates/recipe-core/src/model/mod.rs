//! Modelo de ejecución: el registro mutable que el motor lee y escribe.
pub mod execution;
pub mod output_item;
pub mod pending;

pub use execution::{ExecutionScope, ExecutionStatus, RecipeExecution, StepResult};
pub use output_item::OutputItem;
pub use pending::PendingInputConfig;
