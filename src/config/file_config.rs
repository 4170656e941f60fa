use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub catalog_url: Option<String>,
    pub fetch_timeout_ms: Option<u64>,

    // Cache
    pub cache_ttl_sec: Option<u64>,
    pub fallback_ttl_sec: Option<u64>,
    pub sweep_multiplier: Option<u32>,
    pub wait_timeout_ms: Option<u64>,
    pub cache_dir: Option<String>,

    // Scoring
    pub window_days: Option<usize>,
    pub history_days: Option<usize>,
    pub synthesizer_seed: Option<u64>,
    pub minimum_display_score: Option<f64>,
    /// Component name -> weight. Missing components keep their default.
    pub weights: Option<HashMap<String, f64>>,

    pub tracked_artists: Option<Vec<String>>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
