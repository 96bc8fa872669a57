//! Subgraph query client
//!
//! Posts one GraphQL query to a subgraph endpoint and hands back the raw
//! `pairs` records. Records are left as `serde_json::Value` so that a single
//! bad record is dealt with by the screener instead of failing the whole
//! response decode.
//!
//! Created: 2026-10-19

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Uniswap V2 subgraph (The Graph hosted service)
pub const UNISWAP_V2_SUBGRAPH_URL: &str =
    "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v2";

/// Page size of the single fetch, ordered by reserveUSD descending
pub const PAIRS_PAGE_SIZE: usize = 200;

/// Top pairs by USD reserve, with the fields the filter reads.
/// `{first}` is filled in by `pairs_query`.
const PAIRS_QUERY_TEMPLATE: &str = r#"query pairs {
  pairs(first: {first}, orderBy: reserveUSD, orderDirection: desc) {
    id
    reserveUSD
    trackedReserveETH
    volumeUSD
    untrackedVolumeUSD
    __typename
    token0 {
      id
      symbol
      name
      __typename
    }
    token1 {
      id
      symbol
      name
      __typename
    }
  }
}
"#;

/// The `pairs` query for a page of `first` records
pub fn pairs_query(first: usize) -> String {
    PAIRS_QUERY_TEMPLATE.replace("{first}", &first.to_string())
}

#[derive(Debug, Error)]
pub enum SubgraphError {
    #[error("subgraph request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("subgraph returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("subgraph returned errors: {0}")]
    GraphQl(String),
    #[error("subgraph response has no '{0}' field")]
    MissingData(String),
}

/// Anything that can produce the raw pair records for a run
#[async_trait]
pub trait PairSource {
    async fn fetch_pairs(&self) -> Result<Vec<Value>, SubgraphError>;
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    #[serde(default)]
    message: String,
}

/// HTTP client for a single subgraph endpoint
pub struct SubgraphClient {
    url: String,
    query: String,
    client: reqwest::Client,
}

impl SubgraphClient {
    pub fn new(url: &str, query: &str, timeout: Duration) -> Result<Self, SubgraphError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.to_string(),
            query: query.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Run an arbitrary query and return the array under `data.<collection>`.
    pub async fn query_collection(
        &self,
        query: &str,
        collection: &str,
    ) -> Result<Vec<Value>, SubgraphError> {
        debug!("POST {} ({} byte query)", self.url, query.len());
        let response = self
            .client
            .post(&self.url)
            .json(&GraphQlRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubgraphError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body: GraphQlResponse = response.json().await?;
        extract_collection(body, collection)
    }
}

#[async_trait]
impl PairSource for SubgraphClient {
    async fn fetch_pairs(&self) -> Result<Vec<Value>, SubgraphError> {
        let pairs = self.query_collection(&self.query, "pairs").await?;
        info!("Subgraph returned {} pair records", pairs.len());
        Ok(pairs)
    }
}

fn extract_collection(body: GraphQlResponse, collection: &str) -> Result<Vec<Value>, SubgraphError> {
    if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(SubgraphError::GraphQl(messages.join("; ")));
    }

    match body.data.and_then(|mut d| d.get_mut(collection).map(Value::take)) {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(SubgraphError::MissingData(format!("data.{}", collection))),
    }
}
