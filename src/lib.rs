//! Uniswap pair screener
//!
//! Pulls the top pairs from a Uniswap V2 subgraph and keeps the ones with
//! enough USD liquidity whose tokens are both supported by the local assets
//! repository (allowlisted and with a logo on disk).

pub mod config;
pub mod filters;
pub mod repo;
pub mod screener;
pub mod subgraph;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, ScreenerConfig};
pub use filters::{EmptyPairGuard, PairFilter, TokenAllowlist};
pub use repo::{AssetsRepo, CachedLogoCheck, Chain, LogoCheck};
pub use screener::{run_screen, ScreeningReport};
pub use subgraph::{PairSource, SubgraphClient};
pub use types::{PairInfo, TokenInfo};
