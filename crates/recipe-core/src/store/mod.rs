//! Persistencia de ejecuciones: contrato + implementación en memoria.
//!
//! La tecnología concreta (fila durable, KV) queda detrás del trait; el
//! motor sólo exige que `persist` sea atómico (ejecución + output items en
//! una transacción) y que el chequeo de versión rechace escritores
//! concurrentes.
pub mod memory;

pub use memory::InMemoryExecutionStore;

use uuid::Uuid;

use crate::errors::EngineError;
use crate::model::{ExecutionScope, OutputItem, RecipeExecution};

pub trait ExecutionStore {
    /// Inserta una ejecución nueva. Debe rechazar con
    /// `DuplicateActiveExecution` si ya existe una no-terminal para el mismo
    /// `(recipe_id, scope)` — esta restricción, no el locator, es la fuente
    /// de verdad frente a starts concurrentes.
    fn insert(&mut self, execution: &RecipeExecution) -> Result<(), EngineError>;

    /// Carga por id; `None` si fue borrada/cancelada.
    fn load(&self, id: Uuid) -> Result<Option<RecipeExecution>, EngineError>;

    /// Escribe el estado mutado junto con los output items encolados por esa
    /// misma transición, como una única transacción. Chequea la versión
    /// optimista (`Conflict` si otro escritor avanzó la fila) y rechaza
    /// escrituras sobre filas ya terminales. Avanza `execution.version`.
    fn persist(&mut self, execution: &mut RecipeExecution, items: &[OutputItem]) -> Result<(), EngineError>;

    /// Localiza la (a lo sumo una) ejecución no-terminal del scope.
    /// Lectura advisory: el entry-point la usa para adherirse a un run
    /// existente en vez de duplicarlo.
    fn find_pending(&self, recipe_id: Uuid, scope: &ExecutionScope) -> Result<Option<RecipeExecution>, EngineError>;

    fn output_item(&self, id: Uuid) -> Result<Option<OutputItem>, EngineError>;

    /// Borrado explícito (cancelación externa). `true` si existía.
    fn delete(&mut self, id: Uuid) -> Result<bool, EngineError>;
}
