//! Pair admissibility filter
//!
//! A pair is kept when it is structurally present, its USD reserve is at or
//! above the liquidity floor, and both tokens are supported. A token is
//! supported when it has a logo in the assets repository AND is on the
//! allowlist; allowlist membership alone is not enough.
//!
//! Checks run in this order and the first failure decides the verdict:
//!   1. emptiness guard (see `EmptyPairGuard`)
//!   2. reserveUSD < min_liquidity (strict, the floor itself is admissible)
//!   3. token0 support ("unsupported 1st coin")
//!   4. token1 support ("unsupported 2nd coin")
//!
//! Created: 2026-10-19

use super::allowlist::TokenAllowlist;
use crate::repo::{Chain, LogoCheck};
use crate::types::{PairInfo, TokenInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// How the structural-emptiness guard combines its four fields
/// (`id`, `reserveUSD`, `token0`, `token1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPairGuard {
    /// Reject when ANY field is missing. Records lacking a token or the
    /// reserve never reach field access.
    #[default]
    AnyMissing,
    /// Reject only when ALL fields are missing (a zero reserve counts as
    /// missing here). A record with no reserve skips the liquidity floor and
    /// goes straight to the token checks; a record that passes with no
    /// token0/token1 is reported as malformed once that side is read.
    AllMissing,
}

impl fmt::Display for EmptyPairGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyPairGuard::AnyMissing => f.write_str("any-missing"),
            EmptyPairGuard::AllMissing => f.write_str("all-missing"),
        }
    }
}

impl FromStr for EmptyPairGuard {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any-missing" | "any" => Ok(EmptyPairGuard::AnyMissing),
            "all-missing" | "all" => Ok(EmptyPairGuard::AllMissing),
            other => anyhow::bail!(
                "Invalid empty pair guard '{}'. Expected any-missing or all-missing",
                other
            ),
        }
    }
}

/// Why a token is not supported
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenRejection {
    #[error("no logo asset")]
    MissingLogo,
    #[error("not in allowlist")]
    NotAllowlisted,
}

/// Normal filtering outcomes, not errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("structurally empty pair")]
    Empty,
    #[error("low liquidity: USD {reserve} < {min}")]
    LowLiquidity { reserve: f64, min: f64 },
    #[error("unsupported 1st coin ({0})")]
    UnsupportedToken0(TokenRejection),
    #[error("unsupported 2nd coin ({0})")]
    UnsupportedToken1(TokenRejection),
}

/// A record that could not be inspected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("undecodable record: {0}")]
    Decode(String),
    #[error("missing field '{0}'")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Admitted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Verdict::Admitted)
    }
}

/// Borrowing filter over a loaded allowlist and a logo source.
pub struct PairFilter<'a> {
    allowlist: &'a TokenAllowlist,
    logos: &'a dyn LogoCheck,
    chain: Chain,
    min_liquidity: f64,
    guard: EmptyPairGuard,
}

impl<'a> PairFilter<'a> {
    pub fn new(
        allowlist: &'a TokenAllowlist,
        logos: &'a dyn LogoCheck,
        chain: Chain,
        min_liquidity: f64,
    ) -> Self {
        Self {
            allowlist,
            logos,
            chain,
            min_liquidity,
            guard: EmptyPairGuard::default(),
        }
    }

    pub fn with_guard(mut self, guard: EmptyPairGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn min_liquidity(&self) -> f64 {
        self.min_liquidity
    }

    pub fn guard(&self) -> EmptyPairGuard {
        self.guard
    }

    // ------------------------------------------------------------------
    // Token support
    // ------------------------------------------------------------------

    /// Logo present AND allowlisted.
    pub fn token_support(&self, token_id: &str) -> Result<(), TokenRejection> {
        // Asset directories use the allowlist's (checksummed) spelling
        let probe_id = self.allowlist.canonical(token_id).unwrap_or(token_id);
        if !self.logos.logo_exists(self.chain, probe_id) {
            return Err(TokenRejection::MissingLogo);
        }
        if !self.allowlist.contains(token_id) {
            return Err(TokenRejection::NotAllowlisted);
        }
        Ok(())
    }

    pub fn token_supported(&self, token_id: &str) -> bool {
        self.token_support(token_id).is_ok()
    }

    // ------------------------------------------------------------------
    // Pair admissibility
    // ------------------------------------------------------------------

    /// Classify a pair. `Err` means the record itself is unusable.
    pub fn check_pair(&self, pair: &PairInfo) -> Result<Verdict, RecordError> {
        if self.is_structurally_empty(pair) {
            debug!("Pair rejected: structurally empty ({:?})", pair.id);
            return Ok(Verdict::Rejected(Rejection::Empty));
        }

        // Only reachable without a reserve under AllMissing; an unknown
        // reserve is not below the floor there.
        if let Some(reserve) = pair.reserve_usd {
            if reserve.is_nan() || reserve < self.min_liquidity {
                debug!(
                    "pair with low liquidity: {} \t USD {}",
                    pair.label(),
                    reserve.round()
                );
                return Ok(Verdict::Rejected(Rejection::LowLiquidity {
                    reserve,
                    min: self.min_liquidity,
                }));
            }
        }

        let token0 = side(&pair.token0, "token0")?;
        let token1 = side(&pair.token1, "token1")?;

        if let Err(why) = self.token_support(&token0.id) {
            info!(
                "pair with unsupported 1st coin: {} -- {} ({})",
                token0.symbol, token1.symbol, why
            );
            return Ok(Verdict::Rejected(Rejection::UnsupportedToken0(why)));
        }
        if let Err(why) = self.token_support(&token1.id) {
            info!(
                "pair with unsupported 2nd coin: {} -- {} ({})",
                token0.symbol, token1.symbol, why
            );
            return Ok(Verdict::Rejected(Rejection::UnsupportedToken1(why)));
        }

        Ok(Verdict::Admitted)
    }

    /// True only for pairs that pass every check. Malformed records are not
    /// admissible.
    pub fn is_admissible(&self, pair: &PairInfo) -> bool {
        matches!(self.check_pair(pair), Ok(Verdict::Admitted))
    }

    fn is_structurally_empty(&self, pair: &PairInfo) -> bool {
        let id_missing = pair.id.as_deref().map_or(true, str::is_empty);
        let tokens_missing = [pair.token0.is_none(), pair.token1.is_none()];
        match self.guard {
            // A present reserve of 0 is a value; the floor check decides it
            EmptyPairGuard::AnyMissing => {
                id_missing || pair.reserve_usd.is_none() || tokens_missing.iter().any(|m| *m)
            }
            // Legacy falsiness: 0 and NaN reserves count as missing
            EmptyPairGuard::AllMissing => {
                id_missing
                    && pair.reserve_usd.map_or(true, |r| r == 0.0 || r.is_nan())
                    && tokens_missing.iter().all(|m| *m)
            }
        }
    }
}

fn side<'p>(token: &'p Option<TokenInfo>, field: &'static str) -> Result<&'p TokenInfo, RecordError> {
    token.as_ref().ok_or(RecordError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    /// Logo set held in memory, ids compared exactly like a filesystem would
    struct Logos(HashSet<String>);

    impl LogoCheck for Logos {
        fn logo_exists(&self, _chain: Chain, token_id: &str) -> bool {
            self.0.contains(token_id)
        }
    }

    const AAA: &str = "0xAAA0000000000000000000000000000000000001";
    const BBB: &str = "0xBBB0000000000000000000000000000000000002";
    const CCC: &str = "0xCCC0000000000000000000000000000000000003";

    fn fixtures() -> (TokenAllowlist, Logos) {
        let allowlist = TokenAllowlist::from_entries([AAA, BBB]);
        let logos = Logos([AAA, BBB, CCC].iter().map(|s| s.to_string()).collect());
        (allowlist, logos)
    }

    fn pair(reserve: f64, id0: &str, id1: &str) -> PairInfo {
        PairInfo {
            id: Some("0xpair".to_string()),
            reserve_usd: Some(reserve),
            token0: Some(TokenInfo::new(id0, "AAA", "Token A")),
            token1: Some(TokenInfo::new(id1, "BBB", "Token B")),
            ..Default::default()
        }
    }

    #[test]
    fn test_floor_is_admissible() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1_000_000.0);
        let p = pair(1_000_000.0, &AAA.to_lowercase(), &BBB.to_lowercase());
        assert!(f.is_admissible(&p));
    }

    #[test]
    fn test_below_floor_rejected() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1_000_000.0);
        let p = pair(999_999.99, &AAA.to_lowercase(), &BBB.to_lowercase());
        assert_eq!(
            f.check_pair(&p).unwrap(),
            Verdict::Rejected(Rejection::LowLiquidity {
                reserve: 999_999.99,
                min: 1_000_000.0
            })
        );
    }

    #[test]
    fn test_allowlist_match_any_casing() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 0.0);
        assert!(f.token_supported(AAA));
        assert!(f.token_supported(&AAA.to_lowercase()));
        assert!(f.token_supported(&AAA.to_uppercase().replacen("0X", "0x", 1)));
    }

    #[test]
    fn test_logo_required_even_when_allowlisted() {
        let allowlist = TokenAllowlist::from_entries([AAA, BBB]);
        let logos = Logos([AAA].iter().map(|s| s.to_string()).collect());
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 0.0);
        assert_eq!(f.token_support(BBB), Err(TokenRejection::MissingLogo));
    }

    #[test]
    fn test_logo_alone_not_enough() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 0.0);
        assert_eq!(f.token_support(CCC), Err(TokenRejection::NotAllowlisted));
    }

    #[test]
    fn test_unsupported_second_coin() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1_000_000.0);
        let p = pair(5_000_000.0, AAA, CCC);
        assert_eq!(
            f.check_pair(&p).unwrap(),
            Verdict::Rejected(Rejection::UnsupportedToken1(TokenRejection::NotAllowlisted))
        );
    }

    #[test]
    fn test_unsupported_first_coin_checked_first() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1_000_000.0);
        let p = pair(5_000_000.0, CCC, CCC);
        assert!(matches!(
            f.check_pair(&p).unwrap(),
            Verdict::Rejected(Rejection::UnsupportedToken0(_))
        ));
    }

    #[test]
    fn test_empty_object_rejected_by_guard_in_both_modes() {
        let (allowlist, logos) = fixtures();
        let empty: PairInfo = serde_json::from_str("{}").unwrap();
        for guard in [EmptyPairGuard::AnyMissing, EmptyPairGuard::AllMissing] {
            let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1.0).with_guard(guard);
            assert_eq!(f.check_pair(&empty), Ok(Verdict::Rejected(Rejection::Empty)));
        }
    }

    #[test]
    fn test_missing_token_any_missing_guard_rejects() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1.0);
        let mut p = pair(5_000_000.0, AAA, BBB);
        p.token0 = None;
        assert_eq!(f.check_pair(&p), Ok(Verdict::Rejected(Rejection::Empty)));
    }

    #[test]
    fn test_missing_token_all_missing_guard_is_malformed() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1.0)
            .with_guard(EmptyPairGuard::AllMissing);
        let mut p = pair(5_000_000.0, AAA, BBB);
        p.token0 = None;
        assert_eq!(f.check_pair(&p), Err(RecordError::MissingField("token0")));
        assert!(!f.is_admissible(&p));
    }

    #[test]
    fn test_zero_floor_keeps_zero_reserve() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 0.0);
        let p = pair(0.0, AAA, BBB);
        assert_eq!(f.check_pair(&p), Ok(Verdict::Admitted));
        assert!(f.is_admissible(&p));
    }

    #[test]
    fn test_nan_reserve_fails_floor() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1_000_000.0);
        let p = pair(f64::NAN, AAA, BBB);
        assert!(matches!(
            f.check_pair(&p),
            Ok(Verdict::Rejected(Rejection::LowLiquidity { .. }))
        ));
    }

    #[test]
    fn test_missing_reserve_any_missing_guard_rejects() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1.0);
        let mut p = pair(5_000_000.0, AAA, BBB);
        p.reserve_usd = None;
        assert_eq!(f.check_pair(&p), Ok(Verdict::Rejected(Rejection::Empty)));
    }

    #[test]
    fn test_missing_reserve_all_missing_guard_reaches_token_checks() {
        let (allowlist, logos) = fixtures();
        let f = PairFilter::new(&allowlist, &logos, Chain::Ethereum, 1_000_000.0)
            .with_guard(EmptyPairGuard::AllMissing);

        let mut p = pair(5_000_000.0, AAA, BBB);
        p.reserve_usd = None;
        assert_eq!(f.check_pair(&p), Ok(Verdict::Admitted));

        let mut q = pair(5_000_000.0, AAA, CCC);
        q.reserve_usd = None;
        assert_eq!(
            f.check_pair(&q),
            Ok(Verdict::Rejected(Rejection::UnsupportedToken1(
                TokenRejection::NotAllowlisted
            )))
        );
    }

    #[test]
    fn test_guard_parse() {
        assert_eq!("all-missing".parse::<EmptyPairGuard>().unwrap(), EmptyPairGuard::AllMissing);
        assert_eq!("ANY".parse::<EmptyPairGuard>().unwrap(), EmptyPairGuard::AnyMissing);
        assert!("or".parse::<EmptyPairGuard>().is_err());
    }
}
