use axum::extract::FromRef;

use crate::cache::MomentumCache;
use std::time::Instant;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub cache: MomentumCache,
}

impl ServerState {
    pub fn new(config: ServerConfig, cache: MomentumCache) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            cache,
        }
    }
}

impl FromRef<ServerState> for MomentumCache {
    fn from_ref(input: &ServerState) -> Self {
        input.cache.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
