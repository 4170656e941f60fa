//! Null catalog provider.
//!
//! Used when no catalog service is configured. Every lookup reports the
//! provider as unavailable, so every result is synthesized.

use super::{CatalogProvider, CatalogRecord, ProviderError};
use async_trait::async_trait;

pub struct NullCatalogProvider;

#[async_trait]
impl CatalogProvider for NullCatalogProvider {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn lookup_artist(&self, _name: &str) -> Result<CatalogRecord, ProviderError> {
        Err(ProviderError::Unavailable(
            "no catalog provider configured".to_string(),
        ))
    }
}
