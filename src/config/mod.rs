mod file_config;

pub use file_config::FileConfig;

pub use crate::cache::DEFAULT_SWEEP_MULTIPLIER;
pub use crate::momentum::pipeline::{DEFAULT_HISTORY_DAYS, MAX_HISTORY_DAYS};

use crate::cache::CacheSettings;
use crate::momentum::{
    validate_window_days, MomentumWeights, ScoringOptions, DEFAULT_SYNTHESIZER_SEED,
};
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3003;
pub const DEFAULT_METRICS_PORT: u16 = 9093;
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CACHE_TTL_SEC: u64 = 3600;
pub const DEFAULT_FALLBACK_TTL_SEC: u64 = 300;
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// Artists ranked by `/v1/ranking` when the config names none.
pub const DEFAULT_TRACKED_ARTISTS: [&str; 10] = [
    "Taylor Swift",
    "Drake",
    "Billie Eilish",
    "The Weeknd",
    "Dua Lipa",
    "Post Malone",
    "Ariana Grande",
    "Bad Bunny",
    "Justin Bieber",
    "BTS",
];

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub catalog_url: Option<String>,
    pub fetch_timeout_ms: u64,
    pub cache_ttl_sec: u64,
    pub fallback_ttl_sec: u64,
    pub sweep_multiplier: u32,
    pub wait_timeout_ms: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    pub window_days: usize,
    pub history_days: usize,
    pub synthesizer_seed: u64,
    pub minimum_display_score: Option<f64>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
            logging_level: RequestsLoggingLevel::default(),
            catalog_url: None,
            fetch_timeout_ms: DEFAULT_FETCH_TIMEOUT_MS,
            cache_ttl_sec: DEFAULT_CACHE_TTL_SEC,
            fallback_ttl_sec: DEFAULT_FALLBACK_TTL_SEC,
            sweep_multiplier: DEFAULT_SWEEP_MULTIPLIER,
            wait_timeout_ms: None,
            cache_dir: None,
            window_days: DEFAULT_WINDOW_DAYS,
            history_days: DEFAULT_HISTORY_DAYS,
            synthesizer_seed: DEFAULT_SYNTHESIZER_SEED,
            minimum_display_score: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    /// Catalog service base URL. Without it every result is synthetic.
    pub catalog_url: Option<String>,
    pub fetch_timeout: Duration,
    pub cache: CacheSettings,
    pub cache_dir: Option<PathBuf>,
    pub window_days: usize,
    pub history_days: usize,
    pub synthesizer_seed: u64,
    pub weights: MomentumWeights,
    pub scoring: ScoringOptions,
    pub tracked_artists: Vec<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let catalog_url = file.catalog_url.or_else(|| cli.catalog_url.clone());

        let fetch_timeout_ms = file.fetch_timeout_ms.unwrap_or(cli.fetch_timeout_ms);
        if fetch_timeout_ms == 0 {
            bail!("fetch_timeout_ms must be greater than 0");
        }

        let cache_ttl_sec = file.cache_ttl_sec.unwrap_or(cli.cache_ttl_sec);
        if cache_ttl_sec == 0 {
            bail!("cache_ttl_sec must be greater than 0");
        }
        let fallback_ttl_sec = file.fallback_ttl_sec.unwrap_or(cli.fallback_ttl_sec);
        let cache = CacheSettings {
            ttl: Duration::from_secs(cache_ttl_sec),
            fallback_ttl: Duration::from_secs(fallback_ttl_sec),
            sweep_multiplier: file.sweep_multiplier.unwrap_or(cli.sweep_multiplier),
            wait_timeout: file
                .wait_timeout_ms
                .or(cli.wait_timeout_ms)
                .map(Duration::from_millis),
        };

        let cache_dir = file
            .cache_dir
            .map(PathBuf::from)
            .or_else(|| cli.cache_dir.clone());
        if let Some(dir) = &cache_dir {
            if dir.exists() && !dir.is_dir() {
                bail!("cache_dir is not a directory: {:?}", dir);
            }
        }

        let window_days = file.window_days.unwrap_or(cli.window_days);
        validate_window_days(window_days)?;
        let history_days = file.history_days.unwrap_or(cli.history_days);
        if history_days > MAX_HISTORY_DAYS {
            bail!(
                "history_days must be at most {}, got {}",
                MAX_HISTORY_DAYS,
                history_days
            );
        }
        let synthesizer_seed = file.synthesizer_seed.unwrap_or(cli.synthesizer_seed);

        let weights = match &file.weights {
            Some(map) => MomentumWeights::from_map(map)?,
            None => MomentumWeights::default(),
        };
        let scoring = ScoringOptions {
            minimum_display_score: file.minimum_display_score.or(cli.minimum_display_score),
        };

        let tracked_artists = file.tracked_artists.unwrap_or_else(|| {
            DEFAULT_TRACKED_ARTISTS
                .iter()
                .map(|name| name.to_string())
                .collect()
        });

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            catalog_url,
            fetch_timeout: Duration::from_millis(fetch_timeout_ms),
            cache,
            cache_dir,
            window_days,
            history_days,
            synthesizer_seed,
            weights,
            scoring,
            tracked_artists,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
