// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::services::swap::token::TokenHandle;
use alloy::primitives::{Address, U256};

/// One exact-input trade, fixed once the balance check has passed.
#[derive(Debug, Clone)]
pub struct SwapIntent {
    pub input: TokenHandle,
    pub output: TokenHandle,
    /// Base units of `input`.
    pub amount_in: U256,
    pub caller: Address,
    pub slippage_bps: u64,
    /// Unix seconds.
    pub deadline: u64,
}

impl SwapIntent {
    pub fn describe(&self) -> String {
        format!(
            "{} {} -> {}",
            self.input.format_amount(self.amount_in),
            self.input.symbol(),
            self.output.symbol()
        )
    }
}
