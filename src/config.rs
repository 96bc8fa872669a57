//! Configuration management
//!
//! Layered, later layers win:
//!   1. built-in defaults (Uniswap V2 on Ethereum, USD 1,000,000 floor)
//!   2. optional TOML file
//!   3. `.env` file + environment (SUBGRAPH_URL, MIN_LIQUIDITY_USD, ASSETS_ROOT, CHAIN, EMPTY_PAIR_GUARD)
//!   4. CLI flags (applied by the binary)

use crate::filters::EmptyPairGuard;
use crate::repo::Chain;
use crate::subgraph::{pairs_query, PAIRS_PAGE_SIZE, UNISWAP_V2_SUBGRAPH_URL};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default liquidity floor in USD
pub const DEFAULT_MIN_LIQUIDITY_USD: f64 = 1_000_000.0;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenerConfig {
    /// Subgraph endpoint
    pub subgraph_url: String,
    /// GraphQL query; must select a `pairs` collection
    pub query: String,
    pub min_liquidity_usd: f64,
    pub chain: Chain,
    /// Root of the local assets repository checkout
    pub assets_root: PathBuf,
    pub empty_pair_guard: EmptyPairGuard,
    pub request_timeout_secs: u64,
    /// "text" or "json"
    pub log_format: String,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            subgraph_url: UNISWAP_V2_SUBGRAPH_URL.to_string(),
            query: pairs_query(PAIRS_PAGE_SIZE),
            min_liquidity_usd: DEFAULT_MIN_LIQUIDITY_USD,
            chain: Chain::Ethereum,
            assets_root: PathBuf::from("."),
            empty_pair_guard: EmptyPairGuard::AnyMissing,
            request_timeout_secs: 30,
            log_format: "text".to_string(),
        }
    }
}

impl ScreenerConfig {
    /// Load from a TOML file; missing keys keep their defaults
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Overlay values from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("SUBGRAPH_URL") {
            self.subgraph_url = url;
        }
        if let Some(min) = var("MIN_LIQUIDITY_USD") {
            self.min_liquidity_usd = min
                .trim()
                .parse()
                .with_context(|| format!("MIN_LIQUIDITY_USD is not a number: {}", min))?;
        }
        if let Some(root) = var("ASSETS_ROOT") {
            self.assets_root = PathBuf::from(root);
        }
        if let Some(chain) = var("CHAIN") {
            self.chain = chain.parse()?;
        }
        if let Some(guard) = var("EMPTY_PAIR_GUARD") {
            self.empty_pair_guard = guard.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.subgraph_url.trim().is_empty() {
            anyhow::bail!("subgraph_url must not be empty");
        }
        if self.query.trim().is_empty() {
            anyhow::bail!("query must not be empty");
        }
        if !self.min_liquidity_usd.is_finite() || self.min_liquidity_usd < 0.0 {
            anyhow::bail!(
                "min_liquidity_usd must be a non-negative number, got {}",
                self.min_liquidity_usd
            );
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("log_format must be 'text' or 'json', got '{}'", other),
        }
        Ok(())
    }
}

/// Defaults → optional TOML file → `.env` / environment, then validated.
pub fn load_config(path: Option<&Path>) -> Result<ScreenerConfig> {
    dotenv::dotenv().ok();

    let mut config = match path {
        Some(p) => ScreenerConfig::from_toml_file(p)?,
        None => ScreenerConfig::default(),
    };
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}
