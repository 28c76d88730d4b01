// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Narrow read/write views of the chain.
//!
//! Pipeline stages only see [`LedgerReader`] and [`LedgerWriter`], which keeps
//! the swap state machine testable against in-memory doubles. [`RpcLedger`]
//! and [`SignedSender`] are the JSON-RPC implementations used by the binary.

use crate::common::error::AppError;
use crate::data::erc20::ERC20;
use crate::domain::types::TxRequest;
use crate::network::gas::{GasFees, GasOracle};
use crate::network::nonce::NonceManager;
use crate::network::provider::HttpProvider;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::{TransactionBuilder, TxSignerSync};
use alloy::primitives::{Address, B256, TxKind, U256};
use alloy::providers::Provider;
use alloy::rpc::types::eth::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;

/// What the pipeline needs to know about a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub block_number: Option<u64>,
    pub success: bool,
}

#[async_trait]
pub trait LedgerReader: Send + Sync {
    async fn has_code(&self, address: Address) -> Result<bool, AppError>;
    async fn erc20_name(&self, token: Address) -> Result<String, AppError>;
    async fn erc20_symbol(&self, token: Address) -> Result<String, AppError>;
    async fn erc20_decimals(&self, token: Address) -> Result<u8, AppError>;
    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, AppError>;
    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AppError>;
    async fn native_balance(&self, owner: Address) -> Result<U256, AppError>;
    async fn block_number(&self) -> Result<u64, AppError>;
    async fn receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError>;
    async fn fees(&self) -> Result<GasFees, AppError>;
    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, AppError>;
}

#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Address whose nonce and balance pay for submitted transactions.
    fn sender(&self) -> Address;

    /// Sign and broadcast exactly once. Never retried: a failed broadcast
    /// may still have reached the mempool.
    async fn submit(&self, tx: &TxRequest) -> Result<B256, AppError>;
}

#[derive(Clone)]
pub struct RpcLedger {
    provider: HttpProvider,
    gas_oracle: GasOracle,
}

impl RpcLedger {
    pub fn new(provider: HttpProvider) -> Self {
        let gas_oracle = GasOracle::new(provider.clone());
        Self {
            provider,
            gas_oracle,
        }
    }

    fn erc20(&self, token: Address) -> ERC20::ERC20Instance<HttpProvider> {
        ERC20::new(token, self.provider.clone())
    }
}

fn rpc_err(what: &str, token: Address) -> impl FnOnce(alloy::contract::Error) -> AppError + '_ {
    move |e| AppError::Connection(format!("{what} call on {token:#x} failed: {e}"))
}

#[async_trait]
impl LedgerReader for RpcLedger {
    async fn has_code(&self, address: Address) -> Result<bool, AppError> {
        let code = self
            .provider
            .get_code_at(address)
            .await
            .map_err(|e| AppError::Connection(format!("eth_getCode {address:#x} failed: {e}")))?;
        Ok(!code.is_empty())
    }

    async fn erc20_name(&self, token: Address) -> Result<String, AppError> {
        self.erc20(token)
            .name()
            .call()
            .await
            .map_err(rpc_err("name()", token))
    }

    async fn erc20_symbol(&self, token: Address) -> Result<String, AppError> {
        self.erc20(token)
            .symbol()
            .call()
            .await
            .map_err(rpc_err("symbol()", token))
    }

    async fn erc20_decimals(&self, token: Address) -> Result<u8, AppError> {
        self.erc20(token)
            .decimals()
            .call()
            .await
            .map_err(rpc_err("decimals()", token))
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        self.erc20(token)
            .balanceOf(owner)
            .call()
            .await
            .map_err(rpc_err("balanceOf()", token))
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AppError> {
        self.erc20(token)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(rpc_err("allowance()", token))
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, AppError> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| AppError::Connection(format!("eth_getBalance failed: {e}")))
    }

    async fn block_number(&self) -> Result<u64, AppError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| AppError::Connection(format!("Failed to fetch block: {e}")))
    }

    async fn receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        let rcpt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| AppError::Connection(format!("Receipt lookup failed: {e}")))?;
        Ok(rcpt.map(|r| ReceiptSummary {
            block_number: r.block_number,
            success: r.status(),
        }))
    }

    async fn fees(&self) -> Result<GasFees, AppError> {
        self.gas_oracle.estimate_eip1559_fees().await
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, AppError> {
        let request = TransactionRequest::default()
            .with_from(tx.from)
            .with_to(tx.to)
            .with_input(tx.input.clone())
            .with_value(tx.value);
        self.provider
            .estimate_gas(request)
            .await
            .map_err(|e| AppError::Connection(format!("eth_estimateGas failed: {e}")))
    }
}

/// Signs EIP-1559 transactions locally and broadcasts them raw.
pub struct SignedSender {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    chain_id: u64,
    nonce_manager: NonceManager,
}

impl SignedSender {
    pub fn new(provider: HttpProvider, signer: PrivateKeySigner, chain_id: u64) -> Self {
        let nonce_manager = NonceManager::new(provider.clone(), signer.address());
        Self {
            provider,
            signer,
            chain_id,
            nonce_manager,
        }
    }

    fn sign(&self, tx: &TxRequest, nonce: u64) -> Result<(Vec<u8>, B256), AppError> {
        let mut unsigned = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            max_priority_fee_per_gas: tx.max_priority_fee_per_gas,
            max_fee_per_gas: tx.max_fee_per_gas,
            gas_limit: tx.gas_limit,
            to: TxKind::Call(tx.to),
            value: tx.value,
            access_list: Default::default(),
            input: tx.input.clone(),
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut unsigned)
            .map_err(|e| AppError::Initialization(format!("Sign tx failed: {}", e)))?;
        let signed: TxEnvelope = unsigned.into_signed(sig).into();
        Ok((signed.encoded_2718(), *signed.tx_hash()))
    }
}

/// The node must echo the hash of the envelope we signed; anything else means
/// the receipt wait would track the wrong transaction.
fn check_broadcast_hash(signed: B256, reported: B256) -> Result<B256, AppError> {
    if signed != reported {
        tracing::error!(
            target: "rpc",
            signed = %format!("{signed:#x}"),
            reported = %format!("{reported:#x}"),
            "Node reported a different transaction hash"
        );
        return Err(AppError::Connection(format!(
            "eth_sendRawTransaction returned {reported:#x} for locally signed {signed:#x}"
        )));
    }
    Ok(signed)
}

#[async_trait]
impl LedgerWriter for SignedSender {
    fn sender(&self) -> Address {
        self.signer.address()
    }

    async fn submit(&self, tx: &TxRequest) -> Result<B256, AppError> {
        if tx.from != self.signer.address() {
            return Err(AppError::Validation {
                field: "from".into(),
                message: format!(
                    "transaction sender {} is not the configured wallet {}",
                    tx.from,
                    self.signer.address()
                ),
            });
        }
        let nonce = self.nonce_manager.next_nonce().await?;
        let (raw, hash) = self.sign(tx, nonce)?;
        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| AppError::Connection(format!("eth_sendRawTransaction failed: {e}")))?;
        let hash = check_broadcast_hash(hash, *pending.tx_hash())?;
        tracing::debug!(target: "rpc", hash = %format!("{hash:#x}"), nonce, "Broadcast raw transaction");
        Ok(hash)
    }
}
