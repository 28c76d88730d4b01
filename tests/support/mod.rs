// SPDX-License-Identifier: MIT
// In-memory stand-ins for the chain, the pool indexer and the routing API.
// Every call is recorded so tests can assert ordering and absence of calls.
#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use poolswap::data::erc20::ERC20;
use poolswap::domain::error::AppError;
use poolswap::domain::types::TxRequest;
use poolswap::network::gas::GasFees;
use poolswap::network::ledger::{LedgerReader, LedgerWriter, ReceiptSummary};
use poolswap::services::swap::discovery::{PoolCreatedEvent, PoolIndex};
use poolswap::services::swap::executor::ExecutorSettings;
use poolswap::services::swap::routing::{RouteCandidate, RouteOptimizer, RouteRequest};
use poolswap::services::swap::{PipelineSettings, SwapPipeline};
use poolswap::domain::types::ApprovalPolicy;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const ONE_ETHER: u128 = 1_000_000_000_000_000_000;
pub const MAX_FEE: u128 = 30_000_000_000;
pub const PRIORITY_FEE: u128 = 1_000_000_000;
pub const ESTIMATED_SWAP_GAS: u64 = 200_000;

pub fn token0() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn token1() -> Address {
    Address::repeat_byte(0xbb)
}

pub fn wallet() -> Address {
    Address::repeat_byte(0x11)
}

pub fn router() -> Address {
    Address::repeat_byte(0x68)
}

pub fn ether(units: u128) -> U256 {
    U256::from(units * ONE_ETHER)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Approval,
    Swap,
}

/// `at` is the ledger's call sequence number, so events can be ordered
/// even when the head did not move between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Submitted { hash: B256, kind: TxKind, head: u64, at: u64 },
    ReceiptSeen { hash: B256, head: u64, block: u64, at: u64 },
}

#[derive(Debug, Clone)]
struct MockToken {
    name: String,
    symbol: String,
    decimals: u8,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    mined_at: u64,
    success: bool,
}

#[derive(Default)]
struct LedgerState {
    head: u64,
    tokens: HashMap<Address, MockToken>,
    native: HashMap<Address, U256>,
    pending: HashMap<B256, Pending>,
    submitted: Vec<(TxKind, TxRequest)>,
    events: Vec<LedgerEvent>,
    calls: HashMap<&'static str, usize>,
    tick: u64,
    flaky: HashMap<(Address, &'static str), usize>,
    revert_approvals: bool,
    revert_swaps: bool,
    never_mine: bool,
    next_hash: u64,
}

/// Chain double: the head advances by one every time it is read, and a
/// submitted transaction is mined in the block after submission.
pub struct MockLedger {
    sender: Address,
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new(sender: Address) -> Self {
        let state = LedgerState {
            head: 100,
            ..Default::default()
        };
        Self {
            sender,
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_token(self, address: Address, symbol: &str, decimals: u8) -> Self {
        self.lock().tokens.insert(
            address,
            MockToken {
                name: format!("{symbol} Token"),
                symbol: symbol.to_string(),
                decimals,
                balances: HashMap::new(),
                allowances: HashMap::new(),
            },
        );
        self
    }

    pub fn with_balance(self, token: Address, owner: Address, amount: U256) -> Self {
        if let Some(t) = self.lock().tokens.get_mut(&token) {
            t.balances.insert(owner, amount);
        }
        self
    }

    pub fn with_allowance(self, token: Address, owner: Address, spender: Address, amount: U256) -> Self {
        if let Some(t) = self.lock().tokens.get_mut(&token) {
            t.allowances.insert((owner, spender), amount);
        }
        self
    }

    pub fn with_native(self, owner: Address, amount: U256) -> Self {
        self.lock().native.insert(owner, amount);
        self
    }

    /// Fail the next `times` reads of `field` on `token`.
    pub fn with_flaky_read(self, token: Address, field: &'static str, times: usize) -> Self {
        self.lock().flaky.insert((token, field), times);
        self
    }

    pub fn reverting_approvals(self) -> Self {
        self.lock().revert_approvals = true;
        self
    }

    pub fn reverting_swaps(self) -> Self {
        self.lock().revert_swaps = true;
        self
    }

    pub fn never_mining(self) -> Self {
        self.lock().never_mine = true;
        self
    }

    pub fn submitted(&self) -> Vec<(TxKind, TxRequest)> {
        self.lock().submitted.clone()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.lock().events.clone()
    }

    pub fn calls(&self, method: &str) -> usize {
        self.lock().calls.get(method).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    pub fn allowance_of(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.lock()
            .tokens
            .get(&token)
            .and_then(|t| t.allowances.get(&(owner, spender)).copied())
            .unwrap_or_default()
    }

    fn record(&self, method: &'static str) {
        let mut state = self.lock();
        state.tick += 1;
        *state.calls.entry(method).or_insert(0) += 1;
    }

    fn token_read<T>(
        &self,
        token: Address,
        field: &'static str,
        read: impl FnOnce(&MockToken) -> T,
    ) -> Result<T, AppError> {
        self.record(field);
        let mut state = self.lock();
        if let Some(left) = state.flaky.get_mut(&(token, field))
            && *left > 0
        {
            *left -= 1;
            return Err(AppError::Connection(format!("{field} call on {token:#x} timed out")));
        }
        state
            .tokens
            .get(&token)
            .map(read)
            .ok_or_else(|| AppError::Connection(format!("{field} call on {token:#x} reverted")))
    }
}

#[async_trait]
impl LedgerReader for MockLedger {
    async fn has_code(&self, address: Address) -> Result<bool, AppError> {
        self.record("has_code");
        Ok(self.lock().tokens.contains_key(&address))
    }

    async fn erc20_name(&self, token: Address) -> Result<String, AppError> {
        self.token_read(token, "name", |t| t.name.clone())
    }

    async fn erc20_symbol(&self, token: Address) -> Result<String, AppError> {
        self.token_read(token, "symbol", |t| t.symbol.clone())
    }

    async fn erc20_decimals(&self, token: Address) -> Result<u8, AppError> {
        self.token_read(token, "decimals", |t| t.decimals)
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        self.token_read(token, "balance", |t| {
            t.balances.get(&owner).copied().unwrap_or_default()
        })
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AppError> {
        self.token_read(token, "allowance", |t| {
            t.allowances.get(&(owner, spender)).copied().unwrap_or_default()
        })
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, AppError> {
        self.record("native_balance");
        Ok(self.lock().native.get(&owner).copied().unwrap_or_default())
    }

    async fn block_number(&self) -> Result<u64, AppError> {
        self.record("block_number");
        let mut state = self.lock();
        state.head += 1;
        Ok(state.head)
    }

    async fn receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        self.record("receipt");
        let mut state = self.lock();
        if state.never_mine {
            return Ok(None);
        }
        let head = state.head;
        let Some(pending) = state.pending.get(&hash).copied() else {
            return Ok(None);
        };
        if head < pending.mined_at {
            return Ok(None);
        }
        let at = state.tick;
        state.events.push(LedgerEvent::ReceiptSeen {
            hash,
            head,
            block: pending.mined_at,
            at,
        });
        Ok(Some(ReceiptSummary {
            block_number: Some(pending.mined_at),
            success: pending.success,
        }))
    }

    async fn fees(&self) -> Result<GasFees, AppError> {
        self.record("fees");
        Ok(GasFees {
            max_fee_per_gas: MAX_FEE,
            max_priority_fee_per_gas: PRIORITY_FEE,
            next_base_fee_per_gas: (MAX_FEE - PRIORITY_FEE) / 2,
        })
    }

    async fn estimate_gas(&self, _tx: &TxRequest) -> Result<u64, AppError> {
        self.record("estimate_gas");
        Ok(ESTIMATED_SWAP_GAS)
    }
}

#[async_trait]
impl LedgerWriter for MockLedger {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn submit(&self, tx: &TxRequest) -> Result<B256, AppError> {
        self.record("submit");
        let mut state = self.lock();
        state.next_hash += 1;
        let hash = B256::from(U256::from(state.next_hash));
        let head = state.head;

        let is_approval = tx.input.len() >= 68 && tx.input[..4] == ERC20::approveCall::SELECTOR;
        let kind = if is_approval { TxKind::Approval } else { TxKind::Swap };
        let success = match kind {
            TxKind::Approval => !state.revert_approvals,
            TxKind::Swap => !state.revert_swaps,
        };

        if is_approval && success {
            let spender = Address::from_slice(&tx.input[16..36]);
            let amount = U256::from_be_slice(&tx.input[36..68]);
            if let Some(t) = state.tokens.get_mut(&tx.to) {
                t.allowances.insert((tx.from, spender), amount);
            }
        }

        state.pending.insert(
            hash,
            Pending {
                mined_at: head + 1,
                success,
            },
        );
        state.submitted.push((kind, tx.clone()));
        let at = state.tick;
        state.events.push(LedgerEvent::Submitted { hash, kind, head, at });
        Ok(hash)
    }
}

/// Reader whose receipt lookups never complete, like an RPC endpoint that
/// accepts the request and then goes silent. Everything else is served by
/// the wrapped ledger.
pub struct StalledReceipts(pub Arc<MockLedger>);

#[async_trait]
impl LedgerReader for StalledReceipts {
    async fn has_code(&self, address: Address) -> Result<bool, AppError> {
        self.0.has_code(address).await
    }

    async fn erc20_name(&self, token: Address) -> Result<String, AppError> {
        self.0.erc20_name(token).await
    }

    async fn erc20_symbol(&self, token: Address) -> Result<String, AppError> {
        self.0.erc20_symbol(token).await
    }

    async fn erc20_decimals(&self, token: Address) -> Result<u8, AppError> {
        self.0.erc20_decimals(token).await
    }

    async fn erc20_balance(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        self.0.erc20_balance(token, owner).await
    }

    async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AppError> {
        self.0.erc20_allowance(token, owner, spender).await
    }

    async fn native_balance(&self, owner: Address) -> Result<U256, AppError> {
        self.0.native_balance(owner).await
    }

    async fn block_number(&self) -> Result<u64, AppError> {
        self.0.block_number().await
    }

    async fn receipt(&self, _hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        self.0.record("receipt");
        std::future::pending().await
    }

    async fn fees(&self) -> Result<GasFees, AppError> {
        self.0.fees().await
    }

    async fn estimate_gas(&self, tx: &TxRequest) -> Result<u64, AppError> {
        self.0.estimate_gas(tx).await
    }
}

pub struct MockIndex {
    events: Vec<PoolCreatedEvent>,
    pub calls: AtomicUsize,
}

impl MockIndex {
    pub fn new(events: Vec<PoolCreatedEvent>) -> Self {
        Self {
            events,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn single(token0: Address, token1: Address) -> Self {
        Self::new(vec![PoolCreatedEvent {
            pool: Some(Address::repeat_byte(0xcc)),
            token0: Some(token0),
            token1: Some(token1),
            created_at: 1_700_000_000,
        }])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PoolIndex for MockIndex {
    async fn newest_pools(
        &self,
        _asset: Address,
        limit: usize,
    ) -> Result<Vec<PoolCreatedEvent>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.events.iter().take(limit).cloned().collect())
    }
}

pub struct MockOptimizer {
    route: Option<RouteCandidate>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<RouteRequest>>,
}

impl MockOptimizer {
    pub fn with_route(route: Option<RouteCandidate>) -> Self {
        Self {
            route,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Direct route quoting 2712.03 units of a 6-decimal token.
    pub fn quoting() -> Self {
        Self::with_route(Some(RouteCandidate {
            quote: U256::from(2_712_030_000u64),
            calldata: Bytes::from(vec![0x5a, 0xe4, 0x01, 0xdc, 0x00]),
            value: U256::ZERO,
            path: Vec::new(),
        }))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RouteOptimizer for MockOptimizer {
    async fn best_route(&self, request: &RouteRequest) -> Result<Option<RouteCandidate>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap_or_else(|e| e.into_inner()) = Some(request.clone());
        Ok(self.route.clone())
    }
}

pub fn executor_settings(dry_run: bool) -> ExecutorSettings {
    ExecutorSettings {
        router: router(),
        approval_policy: ApprovalPolicy::Unlimited,
        approval_gas_limit: 70_000,
        swap_gas_limit: None,
        receipt_poll: Duration::from_millis(1),
        receipt_timeout: Duration::from_secs(2),
        confirm_blocks: 2,
        dry_run,
    }
}

pub fn pipeline_settings(dry_run: bool) -> PipelineSettings {
    PipelineSettings {
        chain_id: 1,
        reference_asset: token1(),
        slippage_bps: 50,
        deadline_in_minutes: 30,
        reverse: false,
        executor: executor_settings(dry_run),
    }
}

/// Ledger with an 18-decimal input token (`token0`) and a 6-decimal output
/// token (`token1`), plus 1 ETH of native balance for gas.
pub fn funded_ledger(input_balance: U256) -> MockLedger {
    MockLedger::new(wallet())
        .with_token(token0(), "WETH", 18)
        .with_token(token1(), "USDC", 6)
        .with_balance(token0(), wallet(), input_balance)
        .with_native(wallet(), ether(1))
}

pub fn pipeline(
    ledger: &Arc<MockLedger>,
    index: &Arc<MockIndex>,
    optimizer: &Arc<MockOptimizer>,
    settings: PipelineSettings,
) -> SwapPipeline {
    SwapPipeline::new(
        ledger.clone(),
        ledger.clone(),
        index.clone(),
        optimizer.clone(),
        settings,
    )
}
