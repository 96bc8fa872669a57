//! Pair filtering
//!
//! Token allowlist loaded from the assets repository at startup, and the
//! per-pair admissibility checks built on top of it.

pub mod allowlist;
pub mod pair_filter;

pub use allowlist::TokenAllowlist;
pub use pair_filter::{
    EmptyPairGuard, PairFilter, RecordError, Rejection, TokenRejection, Verdict,
};
