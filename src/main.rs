//! Pair screener entry point
//!
//! Loads the token allowlist for the chain, fetches the top Uniswap V2 pairs
//! by USD reserve from the subgraph, and logs the pairs that clear the
//! liquidity floor with both tokens supported.
//!
//! Usage:
//!   pair-screener --assets-root ../assets --min-liquidity 1000000
//!   RUST_LOG=debug pair-screener --config screener.toml
//!
//! Created: 2026-10-19

use anyhow::Result;
use clap::Parser;
use pair_screener::config::load_config;
use pair_screener::filters::{EmptyPairGuard, PairFilter, TokenAllowlist};
use pair_screener::repo::{AssetsRepo, CachedLogoCheck, Chain};
use pair_screener::screener::run_screen;
use pair_screener::subgraph::SubgraphClient;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Screen Uniswap V2 pairs against a liquidity floor and a token allowlist
#[derive(Parser)]
#[command(name = "pair-screener")]
struct Args {
    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chain whose allowlist and logos are used (ethereum, smartchain, polygon, base)
    #[arg(long)]
    chain: Option<Chain>,

    /// Root of the assets repository checkout
    #[arg(long)]
    assets_root: Option<PathBuf>,

    /// Minimum pair reserve in USD (pairs exactly at the floor are kept)
    #[arg(long)]
    min_liquidity: Option<f64>,

    /// Subgraph endpoint
    #[arg(long)]
    subgraph_url: Option<String>,

    /// Emptiness guard: any-missing (default) or all-missing
    #[arg(long)]
    empty_pair_guard: Option<EmptyPairGuard>,

    /// Log output format
    #[arg(long, value_parser = ["text", "json"])]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(chain) = args.chain {
        config.chain = chain;
    }
    if let Some(root) = args.assets_root {
        config.assets_root = root;
    }
    if let Some(min) = args.min_liquidity {
        config.min_liquidity_usd = min;
    }
    if let Some(url) = args.subgraph_url {
        config.subgraph_url = url;
    }
    if let Some(guard) = args.empty_pair_guard {
        config.empty_pair_guard = guard;
    }
    if let Some(format) = args.log_format {
        config.log_format = format;
    }
    config.validate()?;

    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_format == "json" {
        fmt().with_env_filter(env_filter).with_target(false).json().init();
    } else {
        fmt().with_env_filter(env_filter).with_target(false).init();
    }

    info!("Pair screener starting, chain: {}", config.chain);
    info!("Subgraph: {}", config.subgraph_url);
    info!("Assets root: {}", config.assets_root.display());
    debug!("Empty pair guard: {}", config.empty_pair_guard);

    // Prepare phase: allowlist is required, nothing to screen against without it
    let repo = AssetsRepo::new(&config.assets_root);
    let allowlist = TokenAllowlist::load(repo.allowlist_path(config.chain))?;
    let logos = CachedLogoCheck::new(repo);

    let filter = PairFilter::new(&allowlist, &logos, config.chain, config.min_liquidity_usd)
        .with_guard(config.empty_pair_guard);

    let client = SubgraphClient::new(
        &config.subgraph_url,
        &config.query,
        Duration::from_secs(config.request_timeout_secs),
    )?;

    let report = run_screen(&client, &filter).await?;
    report.log_summary();
    debug!(
        "Screened {} records: {} retained, {} rejected, {} malformed, {} logo probes",
        report.total,
        report.retained.len(),
        report.rejected.len(),
        report.malformed.len(),
        logos.probe_count()
    );

    Ok(())
}
