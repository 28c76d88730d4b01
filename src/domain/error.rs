// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    #[error("External API error: {provider} responded with {status}")]
    ApiCall { provider: String, status: u16 },

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    // Swap failures. Every one of these ends the run.
    #[error("Token {address:#x} could not be resolved: {reason}")]
    Resolution { address: Address, reason: String },

    #[error("Pool discovery failed: {0}")]
    Discovery(String),

    #[error("Not enough {symbol}. Needs {required}, but balance is {available}")]
    InsufficientBalance {
        symbol: String,
        required: U256,
        available: U256,
    },

    #[error("No route found for the swap {from} -> {to}")]
    NoRouteFound { from: String, to: String },

    #[error("Insufficient native balance for gas. Required: {required}, Available: {available}")]
    InsufficientGas { required: U256, available: U256 },

    #[error("Approval of {symbol} failed: {reason}")]
    ApprovalFailed { symbol: String, reason: String },

    #[error("Swap transaction {hash} reverted: {reason}")]
    SubmissionReverted { hash: String, reason: String },

    #[error("Timed out after {waited_ms}ms waiting for confirmation of {hash:#x}")]
    ConfirmationTimeout { hash: B256, waited_ms: u64 },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    /// True for the terminal swap failures, false for plumbing errors
    /// (configuration, connectivity, upstream APIs).
    pub fn is_swap_failure(&self) -> bool {
        matches!(
            self,
            AppError::Resolution { .. }
                | AppError::Discovery(_)
                | AppError::InsufficientBalance { .. }
                | AppError::NoRouteFound { .. }
                | AppError::InsufficientGas { .. }
                | AppError::ApprovalFailed { .. }
                | AppError::SubmissionReverted { .. }
                | AppError::ConfirmationTimeout { .. }
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
