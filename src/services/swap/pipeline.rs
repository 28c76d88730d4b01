// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::app::config::SwapSettings;
use crate::common::error::AppError;
use crate::common::time_utils::{current_unix, deadline_after};
use crate::domain::types::SwapOutcome;
use crate::network::ledger::{LedgerReader, LedgerWriter};
use crate::services::swap::discovery::{PoolIndex, discover_newest_pool};
use crate::services::swap::executor::{ExecutorSettings, SwapExecutor};
use crate::services::swap::gate::ensure_balance;
use crate::services::swap::intent::SwapIntent;
use crate::services::swap::routing::{RouteOptimizer, plan_route};
use crate::services::swap::token::TokenResolver;
use alloy::primitives::Address;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub chain_id: u64,
    pub reference_asset: Address,
    pub slippage_bps: u64,
    pub deadline_in_minutes: u64,
    /// Trade `token1 -> token0` instead of `token0 -> token1`.
    pub reverse: bool,
    pub executor: ExecutorSettings,
}

impl PipelineSettings {
    pub fn from_config(settings: &SwapSettings, dry_run: bool, reverse: bool) -> Self {
        Self {
            chain_id: settings.chain_id,
            reference_asset: settings.reference_asset_or_default(),
            slippage_bps: settings.slippage_bps(),
            deadline_in_minutes: settings.deadline_in_minutes,
            reverse,
            executor: ExecutorSettings::from_config(settings, dry_run),
        }
    }
}

/// One swap per run: discovery, resolution, balance gate, routing, execution.
pub struct SwapPipeline {
    reader: Arc<dyn LedgerReader>,
    writer: Arc<dyn LedgerWriter>,
    index: Arc<dyn PoolIndex>,
    optimizer: Arc<dyn RouteOptimizer>,
    settings: PipelineSettings,
    clock: fn() -> u64,
}

impl SwapPipeline {
    pub fn new(
        reader: Arc<dyn LedgerReader>,
        writer: Arc<dyn LedgerWriter>,
        index: Arc<dyn PoolIndex>,
        optimizer: Arc<dyn RouteOptimizer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            reader,
            writer,
            index,
            optimizer,
            settings,
            clock: current_unix,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> u64) -> Self {
        self.clock = clock;
        self
    }

    /// Run to a terminal outcome; failures are folded into [`SwapOutcome::Failed`].
    pub async fn run(&self, amount: &str) -> SwapOutcome {
        match self.execute(amount).await {
            Ok(outcome) => outcome,
            Err(reason) => {
                tracing::error!(target: "pipeline", error = %reason, "Swap failed");
                SwapOutcome::Failed { reason }
            }
        }
    }

    pub async fn execute(&self, amount: &str) -> Result<SwapOutcome, AppError> {
        let chain_id = self.settings.chain_id;
        let pool = discover_newest_pool(self.index.as_ref(), self.settings.reference_asset).await?;

        let resolver = TokenResolver::new(self.reader.clone(), chain_id);
        let (token0, token1) =
            futures::try_join!(resolver.resolve(pool.token0), resolver.resolve(pool.token1))?;
        let (input, output) = if self.settings.reverse {
            (token1, token0)
        } else {
            (token0, token1)
        };
        tracing::info!(
            target: "pipeline",
            input = %input.symbol(),
            input_name = %input.name(),
            output = %output.symbol(),
            output_name = %output.name(),
            "Tokens resolved"
        );

        let amount_in = input.parse_amount(amount)?;
        let caller = self.writer.sender();
        ensure_balance(&input, caller, amount_in).await?;

        let intent = SwapIntent {
            input,
            output,
            amount_in,
            caller,
            slippage_bps: self.settings.slippage_bps,
            deadline: deadline_after((self.clock)(), self.settings.deadline_in_minutes),
        };
        let quote = plan_route(self.optimizer.as_ref(), &intent, chain_id).await?;

        let mut executor = SwapExecutor::new(
            self.reader.clone(),
            self.writer.clone(),
            self.settings.executor.clone(),
        )
        .with_clock(self.clock);
        executor.execute(&intent, &quote).await
    }
}
