//! Token assets repository layout
//!
//! Resolves where a chain's allowlist and per-token logo files live inside a
//! local checkout of the assets repository:
//!
//!   <root>/blockchains/<chain>/allowlist.json
//!   <root>/blockchains/<chain>/assets/<token_id>/logo.png
//!
//! Logo existence is probed through the `LogoCheck` trait so the pair filter
//! can run against an in-memory set in tests.
//!
//! Created: 2026-10-19

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Chains with an assets directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    Smartchain,
    Polygon,
    Base,
}

impl Chain {
    /// Directory name under `blockchains/`
    pub fn dir_name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Smartchain => "smartchain",
            Chain::Polygon => "polygon",
            Chain::Base => "base",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Chain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Chain::Ethereum),
            "smartchain" | "bsc" => Ok(Chain::Smartchain),
            "polygon" => Ok(Chain::Polygon),
            "base" => Ok(Chain::Base),
            other => anyhow::bail!(
                "Unsupported chain: '{}'. Supported: ethereum, smartchain, polygon, base",
                other
            ),
        }
    }
}

/// Answers "does this token have a logo on this chain?"
pub trait LogoCheck {
    fn logo_exists(&self, chain: Chain, token_id: &str) -> bool;
}

/// Local checkout of the assets repository
#[derive(Debug, Clone)]
pub struct AssetsRepo {
    root: PathBuf,
}

impl AssetsRepo {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn chain_path(&self, chain: Chain) -> PathBuf {
        self.root.join("blockchains").join(chain.dir_name())
    }

    /// Path of the chain's token allowlist (JSON array of ids)
    pub fn allowlist_path(&self, chain: Chain) -> PathBuf {
        self.chain_path(chain).join("allowlist.json")
    }

    /// Expected logo location for a token
    pub fn logo_path(&self, chain: Chain, token_id: &str) -> PathBuf {
        self.chain_path(chain)
            .join("assets")
            .join(token_id)
            .join("logo.png")
    }
}

impl LogoCheck for AssetsRepo {
    fn logo_exists(&self, chain: Chain, token_id: &str) -> bool {
        // An empty id would resolve to the assets directory itself
        if token_id.trim().is_empty() {
            return false;
        }
        let path = self.logo_path(chain, token_id);
        let exists = path.is_file();
        if !exists {
            debug!("Logo missing: {}", path.display());
        }
        exists
    }
}

/// Memoizes logo probes for the duration of a run.
///
/// The allowlist and the logo set do not change while a batch is screened, so
/// a token that appears in many pairs is only probed once.
pub struct CachedLogoCheck<L> {
    inner: L,
    probes: DashMap<(Chain, String), bool>,
}

impl<L: LogoCheck> CachedLogoCheck<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            probes: DashMap::new(),
        }
    }

    /// Number of distinct tokens probed so far
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }
}

impl<L: LogoCheck> LogoCheck for CachedLogoCheck<L> {
    fn logo_exists(&self, chain: Chain, token_id: &str) -> bool {
        let key = (chain, token_id.to_string());
        if let Some(hit) = self.probes.get(&key) {
            return *hit;
        }
        let exists = self.inner.logo_exists(chain, token_id);
        self.probes.insert(key, exists);
        exists
    }
}
