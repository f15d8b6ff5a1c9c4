//! Resolución de expresiones de parámetros y condiciones contra el estado
//! acumulado (`inputs` + `results`).
pub mod condition;
pub mod resolve;

pub use condition::eval_condition;
pub use resolve::{resolve_value, ResolveCtx};
