// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::{DEFAULT_PRIORITY_FEE_WEI, FALLBACK_BASE_FEE_WEI};
use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::providers::Provider;
use alloy::rpc::types::BlockNumberOrTag;
use alloy::rpc::types::eth::FeeHistory;
use std::time::Duration;

#[derive(Clone)]
pub struct GasOracle {
    provider: HttpProvider,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasFees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub next_base_fee_per_gas: u128,
}

impl GasOracle {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }

    pub async fn estimate_eip1559_fees(&self) -> Result<GasFees, AppError> {
        match self.with_retry_history().await {
            Ok(history) => Self::fees_from_history(&history),
            Err(e) => {
                tracing::debug!(target: "gas", error = %e, "feeHistory unavailable; using latest block");
                self.fallback_estimate().await
            }
        }
    }

    async fn with_retry_history(&self) -> Result<FeeHistory, AppError> {
        let provider = self.provider.clone();
        retry_async(
            "fee_history",
            move |_| {
                let provider = provider.clone();
                async move {
                    provider
                        .get_fee_history(5, BlockNumberOrTag::Latest, &[50.0f64])
                        .await
                }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Fee History failed: {}", e)))
    }

    pub(crate) fn fees_from_history(history: &FeeHistory) -> Result<GasFees, AppError> {
        let latest_base_fee = history
            .latest_block_base_fee()
            .or_else(|| history.base_fee_per_gas.iter().rev().nth(1).copied())
            .ok_or(AppError::Initialization("No base fee history".into()))?;

        let raw_next_base = history.next_block_base_fee().unwrap_or(latest_base_fee);
        // 12.5% is the protocol's max per-block increase.
        let next_base_fee = if raw_next_base == 0 {
            latest_base_fee.saturating_mul(1125) / 1000
        } else {
            raw_next_base
        };

        let tips: Vec<u128> = history
            .reward
            .as_ref()
            .map(|rewards| rewards.iter().filter_map(|r| r.first().copied()).collect())
            .unwrap_or_default();
        let priority = if tips.is_empty() {
            DEFAULT_PRIORITY_FEE_WEI
        } else {
            tips.iter().sum::<u128>() / tips.len() as u128
        };

        Ok(Self::fees_with_headroom(next_base_fee, priority))
    }

    async fn fallback_estimate(&self) -> Result<GasFees, AppError> {
        // Some public RPCs disable feeHistory.
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| AppError::Connection(format!("Latest block fetch failed: {}", e)))?;

        let base: u128 = block
            .as_ref()
            .and_then(|b| b.header.base_fee_per_gas)
            .map(|v| v as u128)
            .unwrap_or(FALLBACK_BASE_FEE_WEI);

        let priority: u128 = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .unwrap_or(DEFAULT_PRIORITY_FEE_WEI);

        let next_base = base.saturating_mul(1125) / 1000;
        Ok(Self::fees_with_headroom(next_base, priority))
    }

    /// The cap tolerates the base fee doubling while we wait for inclusion.
    fn fees_with_headroom(next_base_fee: u128, priority: u128) -> GasFees {
        GasFees {
            max_fee_per_gas: next_base_fee.saturating_mul(2).saturating_add(priority),
            max_priority_fee_per_gas: priority,
            next_base_fee_per_gas: next_base_fee,
        }
    }
}
