use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use momentum_server::config::{
    DEFAULT_CACHE_TTL_SEC, DEFAULT_FALLBACK_TTL_SEC, DEFAULT_FETCH_TIMEOUT_MS,
    DEFAULT_HISTORY_DAYS, DEFAULT_METRICS_PORT, DEFAULT_PORT, DEFAULT_SWEEP_MULTIPLIER,
    DEFAULT_WINDOW_DAYS,
};
use momentum_server::momentum::DEFAULT_SYNTHESIZER_SEED;
use momentum_server::server::{metrics, ServerConfig};
use momentum_server::{
    build_momentum_cache, run_server, AppConfig, CliConfig, FileConfig, RequestsLoggingLevel,
};

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Base URL of the catalog service. Without it every result is synthetic.
    #[clap(long)]
    pub catalog_url: Option<String>,

    /// Timeout in milliseconds for a single catalog lookup.
    #[clap(long, default_value_t = DEFAULT_FETCH_TIMEOUT_MS)]
    pub fetch_timeout_ms: u64,

    /// How long a momentum result stays fresh, in seconds.
    #[clap(long, default_value_t = DEFAULT_CACHE_TTL_SEC)]
    pub cache_ttl_sec: u64,

    /// How long a synthetic fallback result stays fresh, in seconds.
    #[clap(long, default_value_t = DEFAULT_FALLBACK_TTL_SEC)]
    pub fallback_ttl_sec: u64,

    /// Entries older than this many TTLs are swept from memory. 0 disables the sweep.
    #[clap(long, default_value_t = DEFAULT_SWEEP_MULTIPLIER)]
    pub sweep_multiplier: u32,

    /// Maximum time in milliseconds a request waits for a refresh in progress.
    #[clap(long)]
    pub wait_timeout_ms: Option<u64>,

    /// Directory where cached results are persisted.
    #[clap(long)]
    pub cache_dir: Option<PathBuf>,

    /// Default growth window in days.
    #[clap(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: usize,

    /// Days of history synthesized when the catalog provides none.
    #[clap(long, default_value_t = DEFAULT_HISTORY_DAYS)]
    pub history_days: usize,

    /// Seed for synthetic data.
    #[clap(long, default_value_t = DEFAULT_SYNTHESIZER_SEED)]
    pub synthesizer_seed: u64,

    /// Floor applied to presented momentum scores. Disabled by default.
    #[clap(long)]
    pub minimum_display_score: Option<f64>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            catalog_url: self.catalog_url.clone(),
            fetch_timeout_ms: self.fetch_timeout_ms,
            cache_ttl_sec: self.cache_ttl_sec,
            fallback_ttl_sec: self.fallback_ttl_sec,
            sweep_multiplier: self.sweep_multiplier,
            wait_timeout_ms: self.wait_timeout_ms,
            cache_dir: self.cache_dir.clone(),
            window_days: self.window_days,
            history_days: self.history_days,
            synthesizer_seed: self.synthesizer_seed,
            minimum_display_score: self.minimum_display_score,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    metrics::init_metrics();

    let cache = build_momentum_cache(&app_config)?;
    if cache.spawn_sweeper().is_some() {
        info!(
            "Sweeping entries older than {} x {:?}",
            app_config.cache.sweep_multiplier, app_config.cache.ttl
        );
    }

    info!(
        "Tracking {} artists for ranking",
        app_config.tracked_artists.len()
    );
    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level.clone(),
        port: app_config.port,
        metrics_port: app_config.metrics_port,
        default_window_days: app_config.window_days,
        tracked_artists: app_config.tracked_artists.clone(),
    };
    run_server(server_config, cache).await
}
