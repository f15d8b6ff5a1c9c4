//! Cache explícito e inyectable de releases normalizadas.
//!
//! Las releases son inmutables una vez publicadas, de modo que las entradas
//! nunca necesitan invalidación más allá de la vida del proceso. Nunca un
//! singleton a nivel de módulo: el engine recibe (o crea) su instancia.
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use recipe_domain::RecipeRelease;

use crate::errors::EngineError;
use crate::release::normalize::{normalize_release, NormalizedRelease};

#[derive(Debug, Default)]
pub struct ReleaseCache {
    inner: DashMap<Uuid, Arc<NormalizedRelease>>,
}

impl ReleaseCache {
    pub fn new() -> Self {
        Self { inner: DashMap::new() }
    }

    /// Devuelve la forma normalizada de `release`, normalizando la primera
    /// vez y sirviendo desde cache después.
    pub fn get_or_normalize(&self, release: &RecipeRelease) -> Result<Arc<NormalizedRelease>, EngineError> {
        if let Some(found) = self.inner.get(&release.id) {
            return Ok(Arc::clone(found.value()));
        }
        let normalized = Arc::new(normalize_release(release)?);
        self.inner.insert(release.id, Arc::clone(&normalized));
        Ok(normalized)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_domain::{ReleaseStep, StepKind};
    use serde_json::json;

    #[test]
    fn second_lookup_hits_the_cache() {
        let release = RecipeRelease::new(Uuid::new_v4(),
                                         1,
                                         vec![ReleaseStep::new("only",
                                                               StepKind::ToolCall { tool: "json.echo".into(),
                                                                                    params: json!({}) })]);
        let cache = ReleaseCache::new();
        let first = cache.get_or_normalize(&release).expect("first");
        let second = cache.get_or_normalize(&release).expect("second");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalid_release_is_not_cached() {
        let release = RecipeRelease::new(Uuid::new_v4(),
                                         1,
                                         vec![ReleaseStep::new("", StepKind::Conditional { condition: "true".into() })]);
        let cache = ReleaseCache::new();
        assert!(cache.get_or_normalize(&release).is_err());
        assert!(cache.is_empty());
    }
}
