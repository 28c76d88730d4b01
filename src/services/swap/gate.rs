// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::services::swap::token::TokenHandle;
use alloy::primitives::{Address, U256};

/// Fail with [`AppError::InsufficientBalance`] unless `owner` holds at least
/// `required` of `token`. Returns the observed balance.
pub async fn ensure_balance(
    token: &TokenHandle,
    owner: Address,
    required: U256,
) -> Result<U256, AppError> {
    let available = token.balance_of(owner).await?;
    if available < required {
        tracing::warn!(
            target: "gate",
            token = %token.symbol(),
            required = %token.format_amount(required),
            available = %token.format_amount(available),
            "Balance too low for swap"
        );
        return Err(AppError::InsufficientBalance {
            symbol: token.symbol().to_string(),
            required,
            available,
        });
    }
    tracing::info!(
        target: "gate",
        token = %token.symbol(),
        balance = %token.format_amount(available),
        "Balance check passed"
    );
    Ok(available)
}

/// Whether `spender` may already move `required` of `owner`'s tokens.
/// A short allowance is an expected branch, not an error.
pub async fn allowance_sufficient(
    token: &TokenHandle,
    owner: Address,
    spender: Address,
    required: U256,
) -> Result<bool, AppError> {
    let allowance = token.allowance(owner, spender).await?;
    let sufficient = allowance >= required;
    tracing::debug!(
        target: "gate",
        token = %token.symbol(),
        spender = %spender,
        allowance = %allowance,
        required = %required,
        sufficient,
        "Allowance checked"
    );
    Ok(sufficient)
}
