// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};

// Common assets
pub const WETH_MAINNET: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const WETH_OPTIMISM: Address = address!("4200000000000000000000000000000000000006");
pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");
pub const WETH_ARBITRUM: Address = address!("82aF49447D8a07e3bd95BD0d56f35241523fBab1");
pub const WETH_POLYGON: Address = address!("7ceB23fD6bC0adD59E62ac25578270cFf1b9f619");
pub const WBNB_BSC: Address = address!("BB4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_ETHEREUM: u64 = 1;
pub const CHAIN_OPTIMISM: u64 = 10;
pub const CHAIN_BSC: u64 = 56;
pub const CHAIN_POLYGON: u64 = 137;
pub const CHAIN_BASE: u64 = 8453;
pub const CHAIN_ARBITRUM: u64 = 42161;

/// Uniswap v3 subgraph on The Graph's decentralized network (Ethereum mainnet).
pub const DEFAULT_INDEXER_URL: &str =
    "https://gateway.thegraph.com/api/subgraphs/id/5zvR82QoaXYFyDEKLZ9t6v9adgnptxYpKpSbxtgVENFV";

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

/// ERC20 approve with a cold allowance slot stays well under this.
pub const DEFAULT_APPROVAL_GAS_LIMIT: u64 = 70_000;
/// Used when the node cannot estimate the swap call.
pub const DEFAULT_SWAP_GAS_LIMIT: u64 = 350_000;
pub const MAX_GAS_LIMIT: u64 = 8_000_000;
/// Headroom applied on top of `eth_estimateGas` (basis points).
pub const GAS_ESTIMATE_HEADROOM_BPS: u64 = 12_000;

pub const DEFAULT_PRIORITY_FEE_WEI: u128 = 2_000_000_000;
pub const FALLBACK_BASE_FEE_WEI: u128 = 1_500_000_000;

pub const BPS_DENOMINATOR: u64 = 10_000;

pub fn wrapped_native_for_chain(chain_id: u64) -> Address {
    match chain_id {
        CHAIN_OPTIMISM => WETH_OPTIMISM,
        CHAIN_BASE => WETH_BASE,
        CHAIN_ARBITRUM => WETH_ARBITRUM,
        CHAIN_POLYGON => WETH_POLYGON,
        CHAIN_BSC => WBNB_BSC,
        _ => WETH_MAINNET,
    }
}
