// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::{format_token_amount, parse_token_amount};
use crate::common::retry::retry_async;
use crate::data::erc20::ERC20;
use crate::network::ledger::LedgerReader;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Metadata reads are idempotent, so one local retry is allowed.
const METADATA_READ_ATTEMPTS: usize = 2;
const METADATA_RETRY_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub address: Address,
    pub chain_id: u64,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A resolved ERC20 plus the ledger view used to query it.
#[derive(Clone)]
pub struct TokenHandle {
    meta: TokenMetadata,
    ledger: Arc<dyn LedgerReader>,
}

impl fmt::Debug for TokenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenHandle")
            .field("address", &self.meta.address)
            .field("symbol", &self.meta.symbol)
            .field("decimals", &self.meta.decimals)
            .finish()
    }
}

impl TokenHandle {
    pub fn metadata(&self) -> &TokenMetadata {
        &self.meta
    }

    pub fn address(&self) -> Address {
        self.meta.address
    }

    pub fn symbol(&self) -> &str {
        &self.meta.symbol
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }

    pub fn decimals(&self) -> u8 {
        self.meta.decimals
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256, AppError> {
        self.ledger.erc20_balance(self.meta.address, owner).await
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, AppError> {
        self.ledger
            .erc20_allowance(self.meta.address, owner, spender)
            .await
    }

    /// Calldata for `approve(spender, amount)` on this token.
    pub fn approve_calldata(&self, spender: Address, amount: U256) -> Bytes {
        Bytes::from(ERC20::approveCall { spender, amount }.abi_encode())
    }

    pub fn parse_amount(&self, raw: &str) -> Result<U256, AppError> {
        parse_token_amount(raw, self.meta.decimals)
    }

    pub fn format_amount(&self, amount: U256) -> String {
        format_token_amount(amount, self.meta.decimals)
    }
}

pub struct TokenResolver {
    ledger: Arc<dyn LedgerReader>,
    chain_id: u64,
}

impl TokenResolver {
    pub fn new(ledger: Arc<dyn LedgerReader>, chain_id: u64) -> Self {
        Self { ledger, chain_id }
    }

    /// Read name/symbol/decimals for `address`. Any unreadable field, or an
    /// address without bytecode, is a hard [`AppError::Resolution`].
    pub async fn resolve(&self, address: Address) -> Result<TokenHandle, AppError> {
        let has_code = self
            .read_field(address, "code", move |l| async move {
                l.has_code(address).await
            })
            .await?;
        if !has_code {
            return Err(AppError::Resolution {
                address,
                reason: "no contract code at address".into(),
            });
        }

        let (name, symbol, decimals) = futures::try_join!(
            self.read_field(address, "name()", move |l| async move {
                l.erc20_name(address).await
            }),
            self.read_field(address, "symbol()", move |l| async move {
                l.erc20_symbol(address).await
            }),
            self.read_field(address, "decimals()", move |l| async move {
                l.erc20_decimals(address).await
            }),
        )?;

        tracing::debug!(
            target: "token",
            address = %format!("{address:#x}"),
            %symbol,
            decimals,
            "Resolved token"
        );

        Ok(TokenHandle {
            meta: TokenMetadata {
                address,
                chain_id: self.chain_id,
                name,
                symbol,
                decimals,
            },
            ledger: self.ledger.clone(),
        })
    }

    async fn read_field<T, F, Fut>(
        &self,
        address: Address,
        field: &'static str,
        read: F,
    ) -> Result<T, AppError>
    where
        F: Fn(Arc<dyn LedgerReader>) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        retry_async(
            field,
            |_| read(self.ledger.clone()),
            METADATA_READ_ATTEMPTS,
            METADATA_RETRY_DELAY,
        )
        .await
        .map_err(|e| AppError::Resolution {
            address,
            reason: format!("{field} unreadable: {e}"),
        })
    }
}
