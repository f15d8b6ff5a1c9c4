//! recipe-core: motor de ejecución de recetas.
//!
//! El motor convierte una release normalizada + estado acumulado en la
//! siguiente acción: ejecutar un tool step, suspender esperando input humano,
//! completar o fallar. Todo avance se persiste vía `ExecutionStore`; una
//! transición de fase = una llamada de persistencia.
pub mod constants;
pub mod engine;
pub mod errors;
pub mod hashing;
pub mod model;
pub mod outputs;
pub mod params;
pub mod release;
pub mod store;
pub mod tool;

pub use engine::RecipeEngine;
pub use errors::{EngineError, FieldError};
pub use model::{ExecutionScope, ExecutionStatus, OutputItem, PendingInputConfig, RecipeExecution, StepResult};
pub use release::{normalize_release, NormalizedRelease, NormalizedStep, ReleaseCache};
pub use store::{ExecutionStore, InMemoryExecutionStore};
pub use tool::{NoopInvoker, OutputPayload, ToolError, ToolInvoker, ToolOutcome};
