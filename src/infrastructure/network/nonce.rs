// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::time::Duration;

/// Reads the caller's pending nonce before every send.
///
/// The pipeline never has two transactions in flight (approval is confirmed
/// before the swap is signed), so the node's pending count is authoritative
/// and nothing is cached between sends.
#[derive(Clone)]
pub struct NonceManager {
    provider: HttpProvider,
    address: Address,
}

impl NonceManager {
    pub fn new(provider: HttpProvider, address: Address) -> Self {
        Self { provider, address }
    }

    pub async fn next_nonce(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        let address = self.address;
        let nonce: u64 = retry_async(
            "pending_nonce",
            move |_| {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).pending().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))?;

        tracing::debug!(target: "rpc", address = %address, nonce, "Fetched pending nonce");
        Ok(nonce)
    }
}
