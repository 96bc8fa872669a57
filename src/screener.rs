//! Pair screening run
//!
//! One fetch, then a synchronous pass over the records. Every record is
//! classified on its own: a record that cannot be decoded or inspected becomes
//! a `Malformed` outcome and the rest of the batch carries on.

use crate::filters::{PairFilter, RecordError, Rejection, Verdict};
use crate::subgraph::PairSource;
use crate::types::PairInfo;
use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{info, warn};

/// Result of screening one record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Retained(PairInfo),
    Rejected { pair: PairInfo, reason: Rejection },
    Malformed { index: usize, error: RecordError },
}

/// Per-run tally, retained pairs in subgraph order
#[derive(Debug, Clone, Default)]
pub struct ScreeningReport {
    pub total: usize,
    pub retained: Vec<PairInfo>,
    pub rejected: Vec<(PairInfo, Rejection)>,
    pub malformed: Vec<(usize, RecordError)>,
}

impl ScreeningReport {
    fn push(&mut self, outcome: RecordOutcome) {
        self.total += 1;
        match outcome {
            RecordOutcome::Retained(pair) => self.retained.push(pair),
            RecordOutcome::Rejected { pair, reason } => self.rejected.push((pair, reason)),
            RecordOutcome::Malformed { index, error } => self.malformed.push((index, error)),
        }
    }

    /// Rejections matching a predicate, e.g. only low-liquidity ones
    pub fn rejected_count<F>(&self, pred: F) -> usize
    where
        F: Fn(&Rejection) -> bool,
    {
        self.rejected.iter().filter(|(_, r)| pred(r)).count()
    }

    /// Summary line followed by one line per retained pair
    pub fn log_summary(&self) {
        info!("Retrieved & filtered {} pairs:", self.retained.len());
        for pair in &self.retained {
            info!("pair:  {}", pair);
        }
        if !self.malformed.is_empty() {
            warn!(
                "{} of {} records were malformed and skipped",
                self.malformed.len(),
                self.total
            );
        }
    }
}

/// Decode and check one raw record. Never fails; problems become outcomes.
pub fn classify_record(filter: &PairFilter<'_>, index: usize, raw: &Value) -> RecordOutcome {
    if !raw.is_object() {
        return RecordOutcome::Malformed {
            index,
            error: RecordError::NotAnObject,
        };
    }

    let pair: PairInfo = match serde_json::from_value(raw.clone()) {
        Ok(pair) => pair,
        Err(e) => {
            return RecordOutcome::Malformed {
                index,
                error: RecordError::Decode(e.to_string()),
            }
        }
    };

    match filter.check_pair(&pair) {
        Ok(Verdict::Admitted) => RecordOutcome::Retained(pair),
        Ok(Verdict::Rejected(reason)) => RecordOutcome::Rejected { pair, reason },
        Err(error) => RecordOutcome::Malformed { index, error },
    }
}

/// Classify a whole batch
pub fn screen_records(filter: &PairFilter<'_>, records: &[Value]) -> ScreeningReport {
    let mut report = ScreeningReport::default();
    for (index, raw) in records.iter().enumerate() {
        let outcome = classify_record(filter, index, raw);
        if let RecordOutcome::Malformed { index, error } = &outcome {
            warn!("Skipping record #{}: {}", index, error);
        }
        report.push(outcome);
    }
    report
}

/// Fetch from `source` and screen the result. Fetch failures are fatal.
pub async fn run_screen<S>(source: &S, filter: &PairFilter<'_>) -> Result<ScreeningReport>
where
    S: PairSource + ?Sized,
{
    info!(
        "Retrieving pairs from Uniswap, liquidity limit USD {}",
        filter.min_liquidity()
    );

    let records = source
        .fetch_pairs()
        .await
        .context("Failed to fetch trading pairs")?;

    Ok(screen_records(filter, &records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{EmptyPairGuard, TokenAllowlist, TokenRejection};
    use crate::repo::{Chain, LogoCheck};
    use crate::subgraph::SubgraphError;
    use async_trait::async_trait;
    use serde_json::json;

    struct AllLogos;

    impl LogoCheck for AllLogos {
        fn logo_exists(&self, _chain: Chain, _token_id: &str) -> bool {
            true
        }
    }

    struct FixedSource(Vec<Value>);

    #[async_trait]
    impl PairSource for FixedSource {
        async fn fetch_pairs(&self) -> Result<Vec<Value>, SubgraphError> {
            Ok(self.0.clone())
        }
    }

    struct DownSource;

    #[async_trait]
    impl PairSource for DownSource {
        async fn fetch_pairs(&self) -> Result<Vec<Value>, SubgraphError> {
            Err(SubgraphError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
        }
    }

    fn record(reserve: &str, id0: &str, sym0: &str, id1: &str, sym1: &str) -> Value {
        json!({
            "id": "0xpair",
            "reserveUSD": reserve,
            "token0": {"id": id0, "symbol": sym0, "name": sym0},
            "token1": {"id": id1, "symbol": sym1, "name": sym1},
        })
    }

    fn allowlist() -> TokenAllowlist {
        TokenAllowlist::from_entries(["0xAAA", "0xBBB"])
    }

    #[test]
    fn test_malformed_records_do_not_abort_batch() {
        let allowlist = allowlist();
        let filter = PairFilter::new(&allowlist, &AllLogos, Chain::Ethereum, 1_000_000.0);
        let records = vec![
            record("2000000", "0xaaa", "AAA", "0xbbb", "BBB"),
            json!("not a pair"),
            json!({"id": "0xbad", "reserveUSD": "n/a", "token0": {}, "token1": {}}),
            record("500", "0xaaa", "AAA", "0xbbb", "BBB"),
            record("3000000", "0xbbb", "BBB", "0xaaa", "AAA"),
        ];

        let report = screen_records(&filter, &records);
        assert_eq!(report.total, 5);
        assert_eq!(report.retained.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.malformed.len(), 2);
        assert_eq!(report.malformed[0], (1, RecordError::NotAnObject));
        assert_eq!(report.malformed[1].0, 2);
        assert_eq!(
            report.rejected_count(|r| matches!(r, Rejection::LowLiquidity { .. })),
            1
        );
    }

    #[test]
    fn test_empty_object_rejected_not_malformed() {
        let allowlist = allowlist();
        let filter = PairFilter::new(&allowlist, &AllLogos, Chain::Ethereum, 1_000_000.0);
        assert_eq!(
            classify_record(&filter, 0, &json!({})),
            RecordOutcome::Rejected {
                pair: PairInfo::default(),
                reason: Rejection::Empty
            }
        );
    }

    #[test]
    fn test_legacy_guard_missing_token_is_malformed() {
        let allowlist = allowlist();
        let filter = PairFilter::new(&allowlist, &AllLogos, Chain::Ethereum, 1.0)
            .with_guard(EmptyPairGuard::AllMissing);
        let raw = json!({"id": "0xpair", "reserveUSD": "10", "token1": {"id": "0xbbb"}});
        assert_eq!(
            classify_record(&filter, 4, &raw),
            RecordOutcome::Malformed {
                index: 4,
                error: RecordError::MissingField("token0")
            }
        );
    }

    #[test]
    fn test_null_symbol_still_classified() {
        let allowlist = allowlist();
        let filter = PairFilter::new(&allowlist, &AllLogos, Chain::Ethereum, 1_000_000.0);
        let raw = json!({
            "id": "0xpair",
            "reserveUSD": "2000000",
            "token0": {"id": "0xaaa", "symbol": null, "name": null},
            "token1": {"id": "0xbbb", "symbol": "BBB", "name": "BBB"},
        });
        assert!(matches!(
            classify_record(&filter, 0, &raw),
            RecordOutcome::Retained(_)
        ));
    }

    #[test]
    fn test_run_screen_with_fixed_source() {
        let allowlist = allowlist();
        let filter = PairFilter::new(&allowlist, &AllLogos, Chain::Ethereum, 1_000_000.0);
        let source = FixedSource(vec![
            record("1000000", "0xAAA", "AAA", "0xBBB", "BBB"),
            record("999999.99", "0xaaa", "AAA", "0xbbb", "BBB"),
            record("8000000", "0xaaa", "AAA", "0xccc", "CCC"),
        ]);

        let report = tokio_test::block_on(run_screen(&source, &filter)).unwrap();
        assert_eq!(report.retained.len(), 1);
        assert_eq!(report.retained[0].label(), "AAA -- BBB");
        assert_eq!(
            report.rejected[1].1,
            Rejection::UnsupportedToken1(TokenRejection::NotAllowlisted)
        );
    }

    #[test]
    fn test_fetch_failure_is_fatal() {
        let allowlist = allowlist();
        let filter = PairFilter::new(&allowlist, &AllLogos, Chain::Ethereum, 1.0);
        let err = tokio_test::block_on(run_screen(&DownSource, &filter)).unwrap_err();
        assert!(err.to_string().contains("Failed to fetch trading pairs"));
    }
}
