//! Momentum Server Library
//!
//! Ranks artists by momentum: growth of streams and social engagement,
//! playlist placements and viral content, served through a single-flight
//! TTL cache with a synthetic fallback when the catalog is unreachable.

pub mod cache;
pub mod catalog_provider;
pub mod config;
pub mod momentum;
pub mod server;

// Re-export commonly used types for convenience
pub use cache::{CacheSettings, FileCacheStore, MomentumCache};
pub use catalog_provider::{CatalogProvider, HttpCatalogProvider, NullCatalogProvider};
pub use config::{AppConfig, CliConfig, FileConfig};
pub use momentum::{MomentumError, MomentumPipeline, MomentumResult};
pub use server::{run_server, RequestsLoggingLevel};

use anyhow::Result;
use momentum::{CompositeScorer, Synthesizer};
use std::sync::Arc;
use tracing::{info, warn};

/// Wires provider, pipeline and cache together from a resolved config.
pub fn build_momentum_cache(config: &AppConfig) -> Result<MomentumCache> {
    let provider: Arc<dyn CatalogProvider> = match &config.catalog_url {
        Some(url) => {
            info!("Using catalog service at {}", url);
            Arc::new(HttpCatalogProvider::new(url, config.fetch_timeout)?)
        }
        None => {
            warn!("No catalog URL configured, every result will be synthetic");
            Arc::new(NullCatalogProvider)
        }
    };

    let scorer = CompositeScorer::new(config.weights, config.scoring)?;
    let pipeline = MomentumPipeline::new(
        provider,
        Synthesizer::new(config.synthesizer_seed),
        scorer,
    )
    .with_fetch_timeout(config.fetch_timeout)
    .with_history_days(config.history_days);

    let cache = match &config.cache_dir {
        Some(dir) => {
            info!("Persisting momentum results under {:?}", dir);
            MomentumCache::with_store(pipeline, config.cache.clone(), FileCacheStore::new(dir)?)
        }
        None => MomentumCache::new(pipeline, config.cache.clone()),
    };
    Ok(cache)
}
