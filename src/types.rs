//! Subgraph wire records
//!
//! Pair and token shapes as returned by the Uniswap V2 subgraph `pairs` query.
//! Every field is optional on the wire; the filter decides what a usable pair is.
//!
//! The Graph serializes `BigDecimal` fields as JSON strings ("1234.56"), older
//! mirrors return plain numbers. Both are accepted.
//!
//! Created: 2026-10-19

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Token side of a pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// On-chain address, compared case-insensitively
    #[serde(default, deserialize_with = "de_null_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de_null_string")]
    pub symbol: String,
    #[serde(default, deserialize_with = "de_null_string")]
    pub name: String,
}

impl TokenInfo {
    pub fn new(id: &str, symbol: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
        }
    }
}

/// Trading pair as reported by the subgraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "reserveUSD", default, deserialize_with = "de_opt_decimal")]
    pub reserve_usd: Option<f64>,
    #[serde(rename = "trackedReserveETH", default, deserialize_with = "de_opt_decimal")]
    pub tracked_reserve_eth: Option<f64>,
    #[serde(rename = "volumeUSD", default, deserialize_with = "de_opt_decimal")]
    pub volume_usd: Option<f64>,
    #[serde(rename = "untrackedVolumeUSD", default, deserialize_with = "de_opt_decimal")]
    pub untracked_volume_usd: Option<f64>,
    #[serde(default)]
    pub token0: Option<TokenInfo>,
    #[serde(default)]
    pub token1: Option<TokenInfo>,
}

impl PairInfo {
    /// Symbol of token0, or "?" when the side is absent
    pub fn symbol0(&self) -> &str {
        self.token0.as_ref().map(|t| t.symbol.as_str()).unwrap_or("?")
    }

    pub fn symbol1(&self) -> &str {
        self.token1.as_ref().map(|t| t.symbol.as_str()).unwrap_or("?")
    }

    /// "SYM0 -- SYM1"
    pub fn label(&self) -> String {
        format!("{} -- {}", self.symbol0(), self.symbol1())
    }
}

impl fmt::Display for PairInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \t USD {}",
            self.label(),
            self.reserve_usd.unwrap_or(0.0).round()
        )
    }
}

/// Token metadata is nullable on some subgraph mirrors; null reads as ""
fn de_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Numeric fields: number | decimal string | null
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum Decimalish {
    Number(f64),
    Text(String),
}

fn de_opt_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Decimalish>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Decimalish::Number(n)) => Ok(Some(n)),
        Some(Decimalish::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid decimal '{}': {}", s, e)))
        }
    }
}
