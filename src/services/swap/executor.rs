// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Allowance → approval → gas → submission → confirmation.
//!
//! At most one state-mutating transaction is in flight per run: the approval
//! (when needed) is confirmed to the configured depth before the swap is
//! built and sent. Nothing here is retried; a revert or timeout is terminal.

use crate::app::config::SwapSettings;
use crate::common::constants::{BPS_DENOMINATOR, DEFAULT_SWAP_GAS_LIMIT, GAS_ESTIMATE_HEADROOM_BPS, MAX_GAS_LIMIT};
use crate::common::error::AppError;
use crate::common::time_utils::current_unix;
use crate::domain::types::{ApprovalPolicy, RouteQuote, SwapOutcome, TxRequest};
use crate::network::gas::GasFees;
use crate::network::ledger::{LedgerReader, LedgerWriter};
use crate::services::swap::gate::allowance_sufficient;
use crate::services::swap::intent::SwapIntent;
use alloy::primitives::{Address, B256, U256};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Start,
    AllowanceChecked,
    ApprovalPending(B256),
    ApprovalConfirmed,
    GasChecked,
    Submitted(B256),
    Confirmed,
    Reverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    ConfirmedSuccess { block: u64 },
    ConfirmedRevert,
    UnknownTimeout,
}

#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub router: Address,
    pub approval_policy: ApprovalPolicy,
    pub approval_gas_limit: u64,
    /// Fixed swap gas limit; estimated when `None`.
    pub swap_gas_limit: Option<u64>,
    pub receipt_poll: Duration,
    pub receipt_timeout: Duration,
    pub confirm_blocks: u64,
    pub dry_run: bool,
}

impl ExecutorSettings {
    pub fn from_config(settings: &SwapSettings, dry_run: bool) -> Self {
        Self {
            router: settings.swap_router_address,
            approval_policy: settings.approval_policy,
            approval_gas_limit: settings.approval_gas_limit,
            swap_gas_limit: settings.swap_gas_limit,
            receipt_poll: settings.receipt_poll_interval(),
            receipt_timeout: settings.receipt_timeout(),
            confirm_blocks: settings.receipt_confirm_blocks_value(),
            dry_run,
        }
    }
}

pub struct SwapExecutor {
    reader: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    settings: ExecutorSettings,
    clock: fn() -> u64,
    state: ExecutorState,
    trail: Vec<ExecutorState>,
}

fn receipt_is_confirmed(current_head: u64, receipt_block: u64, confirm_blocks: u64) -> bool {
    let needed_head = receipt_block.saturating_add(confirm_blocks.saturating_sub(1));
    current_head >= needed_head
}

fn with_headroom(estimate: u64) -> u64 {
    let padded = (estimate as u128) * (GAS_ESTIMATE_HEADROOM_BPS as u128) / (BPS_DENOMINATOR as u128);
    (padded.min(MAX_GAS_LIMIT as u128)) as u64
}

impl SwapExecutor {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            reader,
            writer,
            settings,
            clock: current_unix,
            state: ExecutorState::Start,
            trail: vec![ExecutorState::Start],
        }
    }

    /// Replace the unix-seconds clock used for the stale-quote check.
    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Every state visited so far, starting with `Start`.
    pub fn trail(&self) -> &[ExecutorState] {
        &self.trail
    }

    fn advance(&mut self, next: ExecutorState) {
        tracing::debug!(target: "executor", from = ?self.state, to = ?next, "State transition");
        self.state = next;
        self.trail.push(next);
    }

    pub async fn execute(
        &mut self,
        intent: &SwapIntent,
        quote: &RouteQuote,
    ) -> Result<SwapOutcome, AppError> {
        let owner = self.writer.sender();
        let router = self.settings.router;

        let sufficient = allowance_sufficient(&intent.input, owner, router, intent.amount_in).await?;
        self.advance(ExecutorState::AllowanceChecked);

        let fees = self.reader.fees().await?;

        if self.settings.dry_run {
            let swap = self.build_swap_tx(owner, quote, fees).await;
            tracing::info!(
                target: "executor",
                approval_needed = !sufficient,
                to = %swap.to,
                gas_limit = swap.gas_limit,
                max_fee_per_gas = swap.max_fee_per_gas,
                value = %swap.value,
                calldata_len = swap.input.len(),
                "Dry run: not submitting"
            );
            return Ok(SwapOutcome::DryRun {
                approval_needed: !sufficient,
                swap,
            });
        }

        let approval_tx = if sufficient {
            None
        } else {
            Some(self.approve(intent, owner, fees).await?)
        };
        // Approval confirmation can span several blocks; re-price the swap.
        let fees = match approval_tx {
            Some(_) => self.reader.fees().await?,
            None => fees,
        };

        let swap = self.build_swap_tx(owner, quote, fees).await;
        self.ensure_gas(&swap).await?;
        self.advance(ExecutorState::GasChecked);

        let now = (self.clock)();
        if quote.is_expired_at(now) {
            self.advance(ExecutorState::Reverted);
            return Err(AppError::SubmissionReverted {
                hash: "unsent".into(),
                reason: format!(
                    "route quote expired at {} (now {now}); re-run to fetch a fresh route",
                    quote.deadline
                ),
            });
        }

        let hash = self.writer.submit(&swap).await?;
        self.advance(ExecutorState::Submitted(hash));
        tracing::info!(
            target: "executor",
            hash = %format!("{hash:#x}"),
            swap = %intent.describe(),
            gas_limit = swap.gas_limit,
            "Swap submitted"
        );

        match self.await_receipt(hash).await {
            ReceiptStatus::ConfirmedSuccess { block } => {
                self.advance(ExecutorState::Confirmed);
                tracing::info!(
                    target: "executor",
                    hash = %format!("{hash:#x}"),
                    block,
                    "Swap confirmed"
                );
                Ok(SwapOutcome::Confirmed {
                    tx_hash: hash,
                    block_number: block,
                    approval_tx,
                })
            }
            ReceiptStatus::ConfirmedRevert => {
                self.advance(ExecutorState::Reverted);
                Err(AppError::SubmissionReverted {
                    hash: format!("{hash:#x}"),
                    reason: "execution reverted on-chain".into(),
                })
            }
            ReceiptStatus::UnknownTimeout => {
                self.advance(ExecutorState::Reverted);
                Err(AppError::ConfirmationTimeout {
                    hash,
                    waited_ms: self.settings.receipt_timeout.as_millis() as u64,
                })
            }
        }
    }

    async fn approve(
        &mut self,
        intent: &SwapIntent,
        owner: Address,
        fees: GasFees,
    ) -> Result<B256, AppError> {
        let token = &intent.input;
        let router = self.settings.router;
        let amount = self.settings.approval_policy.amount_for(intent.amount_in);
        let approval_failed = |reason: String| AppError::ApprovalFailed {
            symbol: token.symbol().to_string(),
            reason,
        };

        let tx = TxRequest {
            to: token.address(),
            from: owner,
            input: token.approve_calldata(router, amount),
            value: U256::ZERO,
            gas_limit: self.settings.approval_gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        };
        self.ensure_gas(&tx).await?;

        let hash = self
            .writer
            .submit(&tx)
            .await
            .map_err(|e| approval_failed(format!("submission failed: {e}")))?;
        self.advance(ExecutorState::ApprovalPending(hash));
        tracing::info!(
            target: "executor",
            token = %token.symbol(),
            spender = %router,
            policy = ?self.settings.approval_policy,
            hash = %format!("{hash:#x}"),
            "Approval submitted"
        );

        match self.await_receipt(hash).await {
            ReceiptStatus::ConfirmedSuccess { block } => {
                self.advance(ExecutorState::ApprovalConfirmed);
                tracing::info!(
                    target: "executor",
                    token = %token.symbol(),
                    hash = %format!("{hash:#x}"),
                    block,
                    "Approval confirmed"
                );
                Ok(hash)
            }
            ReceiptStatus::ConfirmedRevert => {
                Err(approval_failed(format!("approval {hash:#x} reverted")))
            }
            ReceiptStatus::UnknownTimeout => Err(approval_failed(format!(
                "approval {hash:#x} not confirmed within {}ms",
                self.settings.receipt_timeout.as_millis()
            ))),
        }
    }

    async fn build_swap_tx(&self, owner: Address, quote: &RouteQuote, fees: GasFees) -> TxRequest {
        let mut tx = TxRequest {
            to: self.settings.router,
            from: owner,
            input: quote.calldata.clone(),
            value: quote.value,
            gas_limit: 0,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        };
        tx.gas_limit = match self.settings.swap_gas_limit {
            Some(limit) => limit,
            None => match self.reader.estimate_gas(&tx).await {
                Ok(estimate) => with_headroom(estimate),
                Err(e) => {
                    tracing::debug!(
                        target: "executor",
                        error = %e,
                        fallback = DEFAULT_SWAP_GAS_LIMIT,
                        "Gas estimation failed; using default limit"
                    );
                    DEFAULT_SWAP_GAS_LIMIT
                }
            },
        };
        tx
    }

    async fn ensure_gas(&self, tx: &TxRequest) -> Result<(), AppError> {
        let required = tx.gas_budget();
        let available = self.reader.native_balance(tx.from).await?;
        if available < required {
            tracing::warn!(
                target: "executor",
                required = %required,
                available = %available,
                "Native balance does not cover gas budget"
            );
            return Err(AppError::InsufficientGas {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Poll until the receipt is `confirm_blocks` deep, it reverts, or the
    /// timeout elapses. Lookup errors are treated as "not yet"; a lookup that
    /// hangs past the deadline ends the wait.
    async fn await_receipt(&self, hash: B256) -> ReceiptStatus {
        let poll = self.settings.receipt_poll.max(Duration::from_millis(1));
        let confirm_blocks = self.settings.confirm_blocks.max(1);
        let deadline = tokio::time::Instant::now() + self.settings.receipt_timeout;

        loop {
            let now = tokio::time::Instant::now();
            if now >= deadline {
                break;
            }

            let head = match tokio::time::timeout_at(deadline, self.reader.block_number()).await {
                Err(_) => break,
                Ok(Ok(head)) => head,
                Ok(Err(e)) => {
                    tracing::debug!(target: "executor", error = %e, "Head lookup failed");
                    0
                }
            };

            match tokio::time::timeout_at(deadline, self.reader.receipt(hash)).await {
                Err(_) => break,
                Ok(Ok(Some(rcpt))) => {
                    if !rcpt.success {
                        return ReceiptStatus::ConfirmedRevert;
                    }
                    if let Some(block) = rcpt.block_number
                        && receipt_is_confirmed(head.max(block), block, confirm_blocks)
                    {
                        return ReceiptStatus::ConfirmedSuccess { block };
                    }
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    tracing::debug!(
                        target: "executor",
                        error = %e,
                        hash = %format!("{hash:#x}"),
                        "Receipt lookup error; retrying"
                    );
                }
            }

            tokio::time::sleep_until((tokio::time::Instant::now() + poll).min(deadline)).await;
        }

        tracing::warn!(
            target: "executor",
            hash = %format!("{hash:#x}"),
            waited_ms = self.settings.receipt_timeout.as_millis() as u64,
            "No confirmation before timeout"
        );
        ReceiptStatus::UnknownTimeout
    }
}
