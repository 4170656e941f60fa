use super::RequestsLoggingLevel;
use crate::config::{DEFAULT_METRICS_PORT, DEFAULT_PORT, DEFAULT_WINDOW_DAYS};

pub const DEFAULT_RANKING_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Window used when a request doesn't name one.
    pub default_window_days: usize,
    /// Artists considered by the ranking route.
    pub tracked_artists: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            default_window_days: DEFAULT_WINDOW_DAYS,
            tracked_artists: Vec::new(),
        }
    }
}
