//! Computes momentum for a handful of artists and prints them ranked.

use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use momentum_server::config::DEFAULT_WINDOW_DAYS;
use momentum_server::momentum::{MomentumResult, DEFAULT_SYNTHESIZER_SEED};
use momentum_server::{build_momentum_cache, AppConfig, CliConfig};

#[derive(Parser, Debug)]
#[command(name = "cli-momentum", about = "Rank artists by momentum")]
struct CliArgs {
    /// Artist names.
    #[clap(required = true)]
    pub names: Vec<String>,

    /// Growth window in days.
    #[clap(long, default_value_t = DEFAULT_WINDOW_DAYS)]
    pub window_days: usize,

    /// Seed for synthetic data.
    #[clap(long, default_value_t = DEFAULT_SYNTHESIZER_SEED)]
    pub seed: u64,

    /// Base URL of the catalog service. Without it every result is synthetic.
    #[clap(long)]
    pub catalog_url: Option<String>,

    /// Print the ranked results as JSON.
    #[clap(long)]
    pub json: bool,
}

fn print_table(results: &[std::sync::Arc<MomentumResult>]) {
    println!(
        "{:>4}  {:<24} {:>9} {:>10} {:>9} {:>9} {:>7}",
        "#", "ARTIST", "MOMENTUM", "STREAMING", "SOCIAL", "PLAYLIST", "VIRAL"
    );
    for (i, result) in results.iter().enumerate() {
        let c = &result.components;
        println!(
            "{:>4}  {:<24} {:>9.3} {:>10.3} {:>9.3} {:>9.2} {:>7.2}{}",
            i + 1,
            result.artist.name,
            result.momentum_score,
            c.streaming_growth,
            c.social_growth,
            c.playlist_score,
            c.viral_score,
            if result.is_synthetic { "  (synthetic)" } else { "" }
        );
        for insight in &result.insights {
            println!("      - {}", insight);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let cli_config = CliConfig {
        catalog_url: cli_args.catalog_url.clone(),
        window_days: cli_args.window_days,
        synthesizer_seed: cli_args.seed,
        ..CliConfig::default()
    };
    let config = AppConfig::resolve(&cli_config, None)?;
    let cache = build_momentum_cache(&config)?;

    let results = cache
        .rank(&cli_args.names, config.window_days, cli_args.names.len())
        .await?;

    if cli_args.json {
        let plain: Vec<&MomentumResult> = results.iter().map(|r| &**r).collect();
        println!("{}", serde_json::to_string_pretty(&plain)?);
    } else {
        print_table(&results);
    }
    Ok(())
}
