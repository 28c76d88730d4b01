// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use alloy::primitives::utils::{ParseUnits, format_units, parse_units};
use alloy::primitives::{Address, U256};
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(s)).ok()
}

pub fn parse_address_hex(s: &str) -> Option<Address> {
    Address::from_str(strip_0x(s.trim())).ok()
}

/// Accepts either a decimal string or a `0x`-prefixed hex string.
pub fn parse_u256_flexible(s: &str) -> Option<U256> {
    let trimmed = s.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        U256::from_str_radix(strip_0x(trimmed), 16).ok()
    } else {
        U256::from_str_radix(trimmed, 10).ok()
    }
}

/// Parse a human amount such as `1.5` into base units of a token with
/// `decimals` precision. Zero, negative and over-precise amounts are rejected.
pub fn parse_token_amount(raw: &str, decimals: u8) -> Result<U256, AppError> {
    let trimmed = raw.trim();
    // parse_units truncates extra fractional digits; refuse instead.
    if let Some((_, fraction)) = trimmed.split_once('.')
        && fraction.len() > decimals as usize
    {
        return Err(AppError::Validation {
            field: "amount".into(),
            message: format!(
                "'{raw}' has {} fractional digits, token supports {decimals}",
                fraction.len()
            ),
        });
    }
    let parsed = parse_units(trimmed, decimals).map_err(|e| AppError::Validation {
        field: "amount".into(),
        message: format!("'{raw}' is not a valid amount with {decimals} decimals: {e}"),
    })?;
    let amount = match parsed {
        ParseUnits::U256(v) => v,
        ParseUnits::I256(_) => {
            return Err(AppError::Validation {
                field: "amount".into(),
                message: format!("'{raw}' is negative"),
            });
        }
    };
    if amount.is_zero() {
        return Err(AppError::Validation {
            field: "amount".into(),
            message: "amount must be greater than zero".into(),
        });
    }
    Ok(amount)
}

/// Render base units as a trimmed decimal string (`1500000` @ 6 -> `1.5`).
pub fn format_token_amount(amount: U256, decimals: u8) -> String {
    match format_units(amount, decimals) {
        Ok(s) if s.contains('.') => s.trim_end_matches('0').trim_end_matches('.').to_string(),
        Ok(s) => s,
        Err(_) => amount.to_string(),
    }
}
