// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::parse_address_hex;
use crate::domain::types::PoolReference;
use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// A pool-creation record as reported by an indexer. Fields are optional
/// because indexers return partial rows; validation happens in
/// [`discover_newest_pool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolCreatedEvent {
    pub pool: Option<Address>,
    pub token0: Option<Address>,
    pub token1: Option<Address>,
    pub created_at: u64,
}

#[async_trait]
pub trait PoolIndex: Send + Sync {
    /// Newest-first pool creations where `asset` is one of the two tokens.
    async fn newest_pools(
        &self,
        asset: Address,
        limit: usize,
    ) -> Result<Vec<PoolCreatedEvent>, AppError>;
}

/// Find the most recently created pool that pairs `reference_asset` with
/// another token.
pub async fn discover_newest_pool(
    index: &dyn PoolIndex,
    reference_asset: Address,
) -> Result<PoolReference, AppError> {
    let mut events = index
        .newest_pools(reference_asset, 1)
        .await
        .map_err(|e| AppError::Discovery(format!("indexer query failed: {e}")))?;

    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let newest = events.into_iter().next().ok_or_else(|| {
        AppError::Discovery(format!(
            "no pools found for reference asset {reference_asset:#x}"
        ))
    })?;

    let (Some(token0), Some(token1)) = (newest.token0, newest.token1) else {
        return Err(AppError::Discovery(format!(
            "newest pool {} is missing a constituent token address",
            newest
                .pool
                .map(|p| format!("{p:#x}"))
                .unwrap_or_else(|| "<unknown>".to_string())
        )));
    };
    if token0 != reference_asset && token1 != reference_asset {
        return Err(AppError::Discovery(format!(
            "indexer returned pool {token0:#x}/{token1:#x} that does not contain {reference_asset:#x}"
        )));
    }

    let pool = PoolReference {
        pool: newest.pool,
        token0,
        token1,
        created_at: newest.created_at,
    };
    tracing::info!(
        target: "discovery",
        pool = %pool.pool.map(|p| format!("{p:#x}")).unwrap_or_default(),
        token0 = %format!("{token0:#x}"),
        token1 = %format!("{token1:#x}"),
        created_at = pool.created_at,
        "Discovered newest pool"
    );
    Ok(pool)
}

const NEWEST_POOLS_QUERY: &str = r#"
query NewestPools($asset: String!, $first: Int!) {
  asToken0: pools(first: $first, orderBy: createdAtTimestamp, orderDirection: desc, where: { token0: $asset }) {
    ...PoolFields
  }
  asToken1: pools(first: $first, orderBy: createdAtTimestamp, orderDirection: desc, where: { token1: $asset }) {
    ...PoolFields
  }
}
fragment PoolFields on Pool {
  id
  createdAtTimestamp
  token0 { id }
  token1 { id }
}
"#;

/// GraphQL client for a Uniswap-style subgraph, authenticated with a bearer key.
pub struct SubgraphIndex {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl SubgraphIndex {
    pub fn new(url: String, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| AppError::Initialization(format!("indexer http client: {e}")))?;
        Ok(Self {
            client,
            url,
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: Option<NewestPoolsData>,
    #[serde(default)]
    errors: Vec<GraphError>,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewestPoolsData {
    #[serde(default)]
    as_token0: Vec<PoolRow>,
    #[serde(default)]
    as_token1: Vec<PoolRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolRow {
    id: Option<String>,
    created_at_timestamp: Option<String>,
    token0: Option<TokenRef>,
    token1: Option<TokenRef>,
}

#[derive(Debug, Deserialize)]
struct TokenRef {
    id: Option<String>,
}

fn token_address(token: Option<&TokenRef>) -> Option<Address> {
    token
        .and_then(|t| t.id.as_deref())
        .and_then(parse_address_hex)
}

fn events_from_response(resp: GraphResponse, limit: usize) -> Result<Vec<PoolCreatedEvent>, AppError> {
    if !resp.errors.is_empty() {
        let messages = resp
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Discovery(format!("indexer errors: {messages}")));
    }
    let data = resp
        .data
        .ok_or_else(|| AppError::Discovery("indexer response has no data".into()))?;

    let mut events: Vec<PoolCreatedEvent> = data
        .as_token0
        .iter()
        .chain(data.as_token1.iter())
        .map(|row| PoolCreatedEvent {
            pool: row.id.as_deref().and_then(parse_address_hex),
            token0: token_address(row.token0.as_ref()),
            token1: token_address(row.token1.as_ref()),
            created_at: row
                .created_at_timestamp
                .as_deref()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
        })
        .collect();
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    events.truncate(limit);
    Ok(events)
}

#[async_trait]
impl PoolIndex for SubgraphIndex {
    async fn newest_pools(
        &self,
        asset: Address,
        limit: usize,
    ) -> Result<Vec<PoolCreatedEvent>, AppError> {
        // Subgraph ids are lowercase hex.
        let body = json!({
            "query": NEWEST_POOLS_QUERY,
            "variables": {
                "asset": format!("{asset:#x}"),
                "first": limit.max(1),
            },
        });

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("indexer request failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(AppError::ApiCall {
                provider: "indexer".into(),
                status: resp.status().as_u16(),
            });
        }
        let parsed: GraphResponse = resp
            .json()
            .await
            .map_err(|e| AppError::Discovery(format!("indexer response decode failed: {e}")))?;
        events_from_response(parsed, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";
    const TOKEN: &str = "0x1111111111111111111111111111111111111111";

    struct FixedIndex(Vec<PoolCreatedEvent>);

    #[async_trait]
    impl PoolIndex for FixedIndex {
        async fn newest_pools(
            &self,
            _asset: Address,
            _limit: usize,
        ) -> Result<Vec<PoolCreatedEvent>, AppError> {
            Ok(self.0.clone())
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl PoolIndex for FailingIndex {
        async fn newest_pools(
            &self,
            _asset: Address,
            _limit: usize,
        ) -> Result<Vec<PoolCreatedEvent>, AppError> {
            Err(AppError::ApiCall {
                provider: "indexer".into(),
                status: 401,
            })
        }
    }

    fn weth() -> Address {
        parse_address_hex(WETH).unwrap()
    }

    fn token() -> Address {
        parse_address_hex(TOKEN).unwrap()
    }

    fn event(created_at: u64, token0: Option<Address>, token1: Option<Address>) -> PoolCreatedEvent {
        PoolCreatedEvent {
            pool: Some(Address::from([9u8; 20])),
            token0,
            token1,
            created_at,
        }
    }

    #[tokio::test]
    async fn empty_index_is_a_discovery_failure() {
        let err = discover_newest_pool(&FixedIndex(Vec::new()), weth())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Discovery(msg) if msg.contains("no pools")));
    }

    #[tokio::test]
    async fn query_error_is_a_discovery_failure() {
        let err = discover_newest_pool(&FailingIndex, weth()).await.unwrap_err();
        assert!(matches!(err, AppError::Discovery(msg) if msg.contains("401")));
    }

    #[tokio::test]
    async fn missing_constituent_is_a_discovery_failure() {
        let index = FixedIndex(vec![event(10, Some(weth()), None)]);
        let err = discover_newest_pool(&index, weth()).await.unwrap_err();
        assert!(matches!(err, AppError::Discovery(msg) if msg.contains("missing")));
    }

    #[tokio::test]
    async fn newest_event_wins() {
        let other = Address::from([2u8; 20]);
        let index = FixedIndex(vec![
            event(10, Some(weth()), Some(other)),
            event(20, Some(token()), Some(weth())),
        ]);
        let pool = discover_newest_pool(&index, weth()).await.expect("pool");
        assert_eq!(pool.token0, token());
        assert_eq!(pool.token1, weth());
        assert_eq!(pool.created_at, 20);
    }

    #[tokio::test]
    async fn pool_without_reference_asset_is_rejected() {
        let index = FixedIndex(vec![event(
            10,
            Some(token()),
            Some(Address::from([2u8; 20])),
        )]);
        assert!(discover_newest_pool(&index, weth()).await.is_err());
    }

    #[test]
    fn merges_both_sides_of_the_graph_response() {
        let raw = serde_json::json!({
            "data": {
                "asToken0": [{
                    "id": "0x00000000000000000000000000000000000000aa",
                    "createdAtTimestamp": "1700000000",
                    "token0": { "id": WETH },
                    "token1": { "id": TOKEN }
                }],
                "asToken1": [{
                    "id": "0x00000000000000000000000000000000000000bb",
                    "createdAtTimestamp": "1700000500",
                    "token0": { "id": TOKEN },
                    "token1": { "id": WETH }
                }]
            }
        });
        let resp: GraphResponse = serde_json::from_value(raw).expect("decode");
        let events = events_from_response(resp, 1).expect("events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].created_at, 1_700_000_500);
        assert_eq!(events[0].token0, Some(token()));
    }

    #[test]
    fn graph_errors_surface_as_discovery_failure() {
        let raw = serde_json::json!({ "errors": [{ "message": "auth error: invalid key" }] });
        let resp: GraphResponse = serde_json::from_value(raw).expect("decode");
        let err = events_from_response(resp, 1).unwrap_err();
        assert!(matches!(err, AppError::Discovery(msg) if msg.contains("invalid key")));
    }
}
