// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use poolswap::app::config::SwapSettings;
use poolswap::app::logging::setup_logging;
use poolswap::domain::error::AppError;
use poolswap::domain::types::SwapOutcome;
use poolswap::infrastructure::network::ledger::{LedgerWriter, RpcLedger, SignedSender};
use poolswap::infrastructure::network::provider::ConnectionFactory;
use poolswap::services::swap::discovery::SubgraphIndex;
use poolswap::services::swap::routing::RoutingApiClient;
use poolswap::services::swap::{PipelineSettings, SwapPipeline};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about = "Swap into the newest pool of a reference asset")]
struct Cli {
    /// Amount of the input token to swap, in whole units (e.g. 1.5)
    amount: String,

    /// Path to config file (default: config.toml if present)
    #[arg(long)]
    config: Option<String>,

    /// Plan and check everything, but do not submit transactions
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Swap token1 -> token0 instead of token0 -> token1
    #[arg(long, default_value_t = false)]
    reverse: bool,

    /// Emit logs as JSON (overrides config/env)
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = SwapSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(
        if settings.debug { "debug" } else { "info" },
        cli.json_logs || settings.log_json,
    );

    let signer = settings.signer()?;
    let provider = ConnectionFactory::http_for_chain(&settings.rpc_url, settings.chain_id).await?;

    let reader = Arc::new(RpcLedger::new(provider.clone()));
    let writer = Arc::new(SignedSender::new(provider, signer, settings.chain_id));
    let index = Arc::new(SubgraphIndex::new(
        settings.indexer_url.clone(),
        settings.indexer_api_key.clone(),
    )?);
    let optimizer = Arc::new(RoutingApiClient::new(
        settings.routing_api_url.clone(),
        settings.routing_api_key.clone(),
    )?);

    tracing::info!(
        target: "config",
        chain_id = settings.chain_id,
        wallet = %writer.sender(),
        router = %settings.swap_router_address,
        reference_asset = %settings.reference_asset_or_default(),
        slippage_bps = settings.slippage_bps(),
        deadline_minutes = settings.deadline_in_minutes,
        dry_run = cli.dry_run,
        "Starting swap"
    );

    let pipeline = SwapPipeline::new(
        reader,
        writer,
        index,
        optimizer,
        PipelineSettings::from_config(&settings, cli.dry_run, cli.reverse),
    );

    match pipeline.run(&cli.amount).await {
        SwapOutcome::Confirmed {
            tx_hash,
            block_number,
            approval_tx,
        } => {
            tracing::info!(
                target: "pipeline",
                tx = %format!("{tx_hash:#x}"),
                block = block_number,
                approval = %approval_tx.map(|h| format!("{h:#x}")).unwrap_or_else(|| "none".into()),
                "Swap complete"
            );
            Ok(())
        }
        SwapOutcome::DryRun {
            approval_needed,
            swap,
        } => {
            tracing::info!(
                target: "pipeline",
                approval_needed,
                gas_budget_wei = %swap.gas_budget(),
                "Dry run complete; nothing submitted"
            );
            Ok(())
        }
        SwapOutcome::Failed { reason } => Err(reason),
    }
}
