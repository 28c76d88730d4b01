// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::{parse_hex_bytes, parse_u256_flexible};
use crate::domain::types::RouteQuote;
use crate::services::swap::intent::SwapIntent;
use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeType {
    #[serde(rename = "EXACT_INPUT")]
    ExactInput,
}

/// Which router contract the calldata must target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouterVariant {
    #[serde(rename = "SWAP_ROUTER_02")]
    SwapRouter02,
}

/// Request shape sent to the routing optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub chain_id: u64,
    pub token_in: Address,
    pub token_out: Address,
    /// Base units, decimal string.
    pub amount: String,
    pub trade_type: TradeType,
    pub recipient: Address,
    /// Percent, e.g. `"0.5"`.
    pub slippage_tolerance: String,
    pub deadline: u64,
    pub router_variant: RouterVariant,
}

impl RouteRequest {
    pub fn exact_input(intent: &SwapIntent, chain_id: u64) -> Self {
        Self {
            chain_id,
            token_in: intent.input.address(),
            token_out: intent.output.address(),
            amount: intent.amount_in.to_string(),
            trade_type: TradeType::ExactInput,
            recipient: intent.caller,
            slippage_tolerance: bps_to_percent(intent.slippage_bps),
            deadline: intent.deadline,
            router_variant: RouterVariant::SwapRouter02,
        }
    }
}

/// Raw optimizer answer before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCandidate {
    pub quote: U256,
    pub calldata: Bytes,
    pub value: U256,
    pub path: Vec<String>,
}

#[async_trait]
pub trait RouteOptimizer: Send + Sync {
    /// `Ok(None)` means the optimizer found no path.
    async fn best_route(&self, request: &RouteRequest) -> Result<Option<RouteCandidate>, AppError>;
}

/// `500` -> `"5"`, `50` -> `"0.5"`, `1` -> `"0.01"`.
pub fn bps_to_percent(bps: u64) -> String {
    let whole = bps / 100;
    let frac = bps % 100;
    if frac == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{frac:02}").trim_end_matches('0').to_string()
    }
}

/// Ask the optimizer for an exact-input route and reject anything unusable.
/// No retry happens here; a missing route ends the run.
pub async fn plan_route(
    optimizer: &dyn RouteOptimizer,
    intent: &SwapIntent,
    chain_id: u64,
) -> Result<RouteQuote, AppError> {
    let request = RouteRequest::exact_input(intent, chain_id);
    let no_route = || AppError::NoRouteFound {
        from: intent.input.symbol().to_string(),
        to: intent.output.symbol().to_string(),
    };

    let Some(candidate) = optimizer.best_route(&request).await? else {
        tracing::warn!(target: "routing", swap = %intent.describe(), "Optimizer returned no route");
        return Err(no_route());
    };
    if candidate.calldata.is_empty() || candidate.quote.is_zero() {
        tracing::warn!(
            target: "routing",
            swap = %intent.describe(),
            quote = %candidate.quote,
            calldata_len = candidate.calldata.len(),
            "Optimizer returned an unusable route"
        );
        return Err(no_route());
    }

    let path = if candidate.path.is_empty() {
        vec![
            intent.input.symbol().to_string(),
            intent.output.symbol().to_string(),
        ]
    } else {
        candidate.path
    };

    let quote = RouteQuote {
        expected_out: candidate.quote,
        calldata: candidate.calldata,
        value: candidate.value,
        path,
        deadline: intent.deadline,
    };
    tracing::info!(
        target: "routing",
        "Swapping {} {} for {} {} via {}",
        intent.input.format_amount(intent.amount_in),
        intent.input.symbol(),
        intent.output.format_amount(quote.expected_out),
        intent.output.symbol(),
        quote.path_display()
    );
    Ok(quote)
}

/// HTTP client for a routing API returning Uniswap-style `methodParameters`.
pub struct RoutingApiClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl RoutingApiClient {
    pub fn new(url: String, api_key: Option<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Initialization(format!("routing http client: {e}")))?;
        Ok(Self {
            client,
            url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    quote: Option<String>,
    method_parameters: Option<MethodParameters>,
    #[serde(default)]
    route: Vec<Vec<RouteLeg>>,
    error_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MethodParameters {
    calldata: String,
    #[serde(default)]
    value: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteLeg {
    token_in: Option<LegToken>,
    token_out: Option<LegToken>,
}

#[derive(Debug, Deserialize)]
struct LegToken {
    symbol: Option<String>,
}

fn symbol_of(token: Option<&LegToken>) -> Option<String> {
    token.and_then(|t| t.symbol.clone())
}

fn candidate_from_response(resp: QuoteResponse) -> Result<Option<RouteCandidate>, AppError> {
    if resp
        .error_code
        .as_deref()
        .is_some_and(|code| code.eq_ignore_ascii_case("NO_ROUTE"))
    {
        return Ok(None);
    }
    let (Some(raw_quote), Some(params)) = (resp.quote, resp.method_parameters) else {
        return Ok(None);
    };

    let quote = parse_u256_flexible(&raw_quote).ok_or_else(|| {
        AppError::Validation {
            field: "quote".into(),
            message: format!("routing API returned non-numeric quote '{raw_quote}'"),
        }
    })?;
    let calldata = parse_hex_bytes(&params.calldata).ok_or_else(|| AppError::Validation {
        field: "methodParameters.calldata".into(),
        message: "not hex".into(),
    })?;
    let value = match params.value.as_deref() {
        Some(raw) => parse_u256_flexible(raw).ok_or_else(|| AppError::Validation {
            field: "methodParameters.value".into(),
            message: format!("'{raw}' is not a number"),
        })?,
        None => U256::ZERO,
    };

    // Symbols of the first split: tokenIn of the first hop, then every tokenOut.
    let mut path = Vec::new();
    if let Some(legs) = resp.route.first() {
        if let Some(first) = legs.first().and_then(|l| symbol_of(l.token_in.as_ref())) {
            path.push(first);
        }
        path.extend(legs.iter().filter_map(|l| symbol_of(l.token_out.as_ref())));
    }

    Ok(Some(RouteCandidate {
        quote,
        calldata: Bytes::from(calldata),
        value,
        path,
    }))
}

#[async_trait]
impl RouteOptimizer for RoutingApiClient {
    async fn best_route(&self, request: &RouteRequest) -> Result<Option<RouteCandidate>, AppError> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("routing API request failed: {e}")))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(AppError::ApiCall {
                provider: "routing API".into(),
                status: status.as_u16(),
            });
        }
        let parsed: QuoteResponse = resp.json().await.map_err(|e| {
            AppError::Initialization(format!("routing API response decode failed: {e}"))
        })?;
        candidate_from_response(parsed)
    }
}
