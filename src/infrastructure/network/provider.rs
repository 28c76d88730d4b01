// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::{Provider, RootProvider};
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = RootProvider::new_http(url);
        Ok(provider)
    }

    /// Connect over HTTP and make sure the node serves the configured chain.
    pub async fn http_for_chain(rpc_url: &str, chain_id: u64) -> Result<HttpProvider, AppError> {
        let provider = Self::http(rpc_url)?;
        let remote = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("chain_id lookup failed: {e}")))?;
        if remote != chain_id {
            return Err(AppError::Config(format!(
                "RPC {rpc_url} serves chain {remote}, but chain_id is configured as {chain_id}"
            )));
        }
        tracing::info!(target: "rpc", chain_id, "Connected to RPC");
        Ok(provider)
    }
}
