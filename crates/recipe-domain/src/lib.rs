//! recipe-domain: modelo autoral de recetas (releases, steps, campos).
//!
//! Este crate contiene únicamente datos + serde. Toda la lógica de ejecución
//! vive en `recipe-core`; aquí se describe lo que un autor publica.
pub mod error;
pub mod field;
pub mod output;
pub mod release;

pub use error::DomainError;
pub use field::{FieldType, InputField};
pub use output::{OutputBinding, OutputItemKind};
pub use release::{RecipeRelease, ReleaseStep, StepKind};
