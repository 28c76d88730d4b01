// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants;
use crate::domain::error::AppError;
use crate::domain::types::ApprovalPolicy;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize, Clone)]
pub struct SwapSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    pub rpc_url: String,

    // Identity
    pub wallet_key: String,
    pub wallet_address: Option<Address>,

    // Swap
    pub swap_router_address: Address,
    /// Percent, e.g. `5` or `0.5`.
    #[serde(default = "default_slippage_tolerance")]
    pub slippage_tolerance: f64,
    #[serde(default = "default_deadline_in_minutes")]
    pub deadline_in_minutes: u64,
    pub reference_asset: Option<Address>,
    #[serde(default)]
    pub approval_policy: ApprovalPolicy,
    #[serde(default = "default_approval_gas_limit")]
    pub approval_gas_limit: u64,
    pub swap_gas_limit: Option<u64>,

    // External services
    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,
    pub indexer_api_key: String,
    pub routing_api_url: String,
    pub routing_api_key: Option<String>,

    // Receipts
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
    #[serde(default = "default_receipt_confirm_blocks")]
    pub receipt_confirm_blocks: u64,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_chain_id() -> u64 {
    constants::CHAIN_ETHEREUM
}
fn default_slippage_tolerance() -> f64 {
    5.0
}
fn default_deadline_in_minutes() -> u64 {
    30
}
fn default_approval_gas_limit() -> u64 {
    constants::DEFAULT_APPROVAL_GAS_LIMIT
}
fn default_indexer_url() -> String {
    constants::DEFAULT_INDEXER_URL.to_string()
}
fn default_receipt_poll_ms() -> u64 {
    1_000
}
fn default_receipt_timeout_ms() -> u64 {
    180_000
}
fn default_receipt_confirm_blocks() -> u64 {
    2
}

impl SwapSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Precedence: CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default().try_parsing(true));

        let settings: SwapSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }
        if self.indexer_api_key.trim().is_empty() {
            return Err(AppError::Config("INDEXER_API_KEY is missing".to_string()));
        }
        for (field, raw) in [
            ("rpc_url", self.rpc_url.as_str()),
            ("indexer_url", self.indexer_url.as_str()),
            ("routing_api_url", self.routing_api_url.as_str()),
        ] {
            Url::parse(raw).map_err(|e| AppError::Validation {
                field: field.to_string(),
                message: format!("invalid URL '{raw}': {e}"),
            })?;
        }
        if !(self.slippage_tolerance > 0.0 && self.slippage_tolerance <= 100.0) {
            return Err(AppError::Validation {
                field: "slippage_tolerance".into(),
                message: format!(
                    "expected a percentage in (0, 100], got {}",
                    self.slippage_tolerance
                ),
            });
        }
        if self.deadline_in_minutes == 0 {
            return Err(AppError::Validation {
                field: "deadline_in_minutes".into(),
                message: "must be at least 1 minute".into(),
            });
        }
        if let Some(limit) = self.swap_gas_limit
            && !(21_000..=constants::MAX_GAS_LIMIT).contains(&limit)
        {
            return Err(AppError::Validation {
                field: "swap_gas_limit".into(),
                message: format!("{limit} is outside 21000..={}", constants::MAX_GAS_LIMIT),
            });
        }
        Ok(())
    }

    /// Parse the wallet key and check it against `wallet_address` when one is configured.
    pub fn signer(&self) -> Result<PrivateKeySigner, AppError> {
        let signer = PrivateKeySigner::from_str(self.wallet_key.trim())
            .map_err(|e| AppError::Config(format!("Invalid wallet key: {}", e)))?;
        if let Some(expected) = self.wallet_address
            && expected != signer.address()
        {
            return Err(AppError::Config(format!(
                "wallet_address {} does not match wallet_key address {}",
                expected,
                signer.address()
            )));
        }
        Ok(signer)
    }

    /// Slippage tolerance in basis points, rounded to the nearest bps.
    pub fn slippage_bps(&self) -> u64 {
        (self.slippage_tolerance * 100.0).round() as u64
    }

    pub fn reference_asset_or_default(&self) -> Address {
        self.reference_asset
            .unwrap_or_else(|| constants::wrapped_native_for_chain(self.chain_id))
    }

    pub fn receipt_poll_ms_value(&self) -> u64 {
        self.receipt_poll_ms.max(100)
    }

    pub fn receipt_timeout_ms_value(&self) -> u64 {
        self.receipt_timeout_ms.max(self.receipt_poll_ms_value())
    }

    pub fn receipt_confirm_blocks_value(&self) -> u64 {
        self.receipt_confirm_blocks.max(1)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms_value())
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_millis(self.receipt_timeout_ms_value())
    }
}
