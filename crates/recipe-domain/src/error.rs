use thiserror::Error;

/// Error de validación autoral, detectable al publicar (antes de que el
/// motor vea la release).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    ValidationError(String),
}
