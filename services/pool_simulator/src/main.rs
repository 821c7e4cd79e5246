//! Pool simulator - plays a scripted session against a fresh position pool
//!
//! Usage:
//!   pool_simulator
//!   pool_simulator --config config/pool.toml --environment production
//!   pool_simulator --swaps 10 --swap-amount 2500 --output journal.json

mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use pool_config::PoolConfig;
use scenario::ScenarioSettings;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "pool_simulator")]
#[command(about = "Scripted StableSwap position pool session")]
#[command(version)]
struct Args {
    /// Path to pool configuration file (defaults to config/pool.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Environment overlay under <config dir>/environments/
    #[arg(short, long)]
    environment: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,

    /// Whole tokens each provider deposits per side
    #[arg(long, default_value_t = 50_000)]
    liquidity: u64,

    /// Whole tokens sold per swap
    #[arg(long, default_value_t = 100)]
    swap_amount: u64,

    /// Number of swaps, alternating direction
    #[arg(long, default_value_t = 4)]
    swaps: u32,

    /// Write the journal here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting pool simulator");

    let config = PoolConfig::load(args.config.as_deref(), args.environment.as_deref()).map_err(|e| {
        error!("Failed to load configuration: {:#}", e);
        e
    })?;

    info!(
        swap_fee_bps = config.swap_fee_bps,
        max_price_deviation_permille = config.max_price_deviation_permille,
        amplification = config.amplification,
        token_decimals = config.token_decimals,
        "Loaded pool configuration"
    );

    let settings = ScenarioSettings {
        liquidity: args.liquidity,
        swap_amount: args.swap_amount,
        swaps: args.swaps,
    };
    let report = scenario::run(&config, &settings)?;
    let journal = serde_json::to_string_pretty(&report).context("Failed to encode journal")?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, journal)
                .with_context(|| format!("Failed to write journal to {}", path.display()))?;
            info!("Journal written to {}", path.display());
        }
        None => println!("{journal}"),
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    // Journal owns stdout
    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}
