//! Motor de ejecución: step-loop + respond/resume.
pub mod core;
pub mod respond;

pub use core::RecipeEngine;
