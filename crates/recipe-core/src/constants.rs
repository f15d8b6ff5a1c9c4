//! Constantes del motor core.
//!
//! `ENGINE_VERSION` participa en el hash de definición de releases
//! normalizadas: un cambio incompatible del motor invalida de forma
//! determinista las identidades cacheadas aunque la release no cambie.

/// Versión lógica del motor. Mantener estable mientras no haya cambios
/// incompatibles en la semántica de normalización u ordenamiento.
pub const ENGINE_VERSION: &str = "R1.0";
