// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use alloy::primitives::{Address, B256, Bytes, U256};
use serde::Deserialize;

/// Newest pool involving the reference asset, as reported by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolReference {
    /// Pool contract, when the indexer reports it.
    pub pool: Option<Address>,
    pub token0: Address,
    pub token1: Address,
    /// Unix seconds of the pool-creation block.
    pub created_at: u64,
}

/// Best-effort route returned by the routing optimizer for one exact-input trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteQuote {
    pub expected_out: U256,
    pub calldata: Bytes,
    pub value: U256,
    /// Token symbols from input to output, e.g. `["WETH", "USDC"]`.
    pub path: Vec<String>,
    /// Unix seconds after which the quote must not be submitted.
    pub deadline: u64,
}

impl RouteQuote {
    pub fn is_expired_at(&self, now: u64) -> bool {
        now > self.deadline
    }

    pub fn path_display(&self) -> String {
        self.path.join(" -> ")
    }
}

/// A fully priced transaction ready to be signed and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub from: Address,
    pub input: Bytes,
    pub value: U256,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl TxRequest {
    /// Worst-case native spend: every unit of gas at the fee cap, plus value.
    pub fn gas_budget(&self) -> U256 {
        U256::from(self.gas_limit)
            .saturating_mul(U256::from(self.max_fee_per_gas))
            .saturating_add(self.value)
    }
}

/// How much allowance to grant the swap router when the current one falls short.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPolicy {
    /// Approve `U256::MAX` so later swaps of the same token skip approval.
    #[default]
    Unlimited,
    Exact,
}

impl ApprovalPolicy {
    pub fn amount_for(self, required: U256) -> U256 {
        match self {
            ApprovalPolicy::Unlimited => U256::MAX,
            ApprovalPolicy::Exact => required,
        }
    }
}

/// Terminal result of one pipeline run.
#[derive(Debug)]
pub enum SwapOutcome {
    Confirmed {
        tx_hash: B256,
        block_number: u64,
        approval_tx: Option<B256>,
    },
    /// Everything up to submission ran; nothing was sent.
    DryRun {
        approval_needed: bool,
        swap: TxRequest,
    },
    Failed {
        reason: AppError,
    },
}

impl SwapOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SwapOutcome::Confirmed { .. })
    }
}
