// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain identifiers, network endpoints and unit conversion.

use std::fmt;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

/// The three chains a wallet session holds credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainId {
    Ethereum,
    Solana,
    Bitcoin,
}

impl ChainId {
    /// Display order used by the dashboard.
    pub const ALL: [ChainId; 3] = [ChainId::Ethereum, ChainId::Solana, ChainId::Bitcoin];

    pub fn name(self) -> &'static str {
        match self {
            ChainId::Ethereum => "Ethereum",
            ChainId::Solana => "Solana",
            ChainId::Bitcoin => "Bitcoin",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ChainId::Ethereum => "ETH",
            ChainId::Solana => "SOL",
            ChainId::Bitcoin => "BTC",
        }
    }

    /// Decimals of the smallest on-chain unit (wei, lamports, satoshis).
    pub fn decimals(self) -> u8 {
        match self {
            ChainId::Ethereum => 18,
            ChainId::Solana => 9,
            ChainId::Bitcoin => 8,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match self {
            ChainId::Ethereum => "ethereum",
            ChainId::Solana => "solana",
            ChainId::Bitcoin => "bitcoin",
        };
        f.write_str(id)
    }
}

/// Endpoint configuration for one chain backend.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    pub chain: ChainId,
    /// RPC or REST base URL
    pub rpc_url: String,
}

pub const ETHEREUM_MAINNET_RPC: &str = "https://ethereum-rpc.publicnode.com";
pub const SOLANA_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
pub const BITCOIN_ESPLORA_API: &str = "https://blockstream.info/api";

impl NetworkConfig {
    pub fn ethereum_mainnet() -> Self {
        Self {
            name: "Ethereum Mainnet",
            chain: ChainId::Ethereum,
            rpc_url: ETHEREUM_MAINNET_RPC.to_string(),
        }
    }

    pub fn solana_mainnet() -> Self {
        Self {
            name: "Solana Mainnet Beta",
            chain: ChainId::Solana,
            rpc_url: SOLANA_MAINNET_RPC.to_string(),
        }
    }

    pub fn bitcoin_mainnet() -> Self {
        Self {
            name: "Bitcoin Mainnet (Esplora)",
            chain: ChainId::Bitcoin,
            rpc_url: BITCOIN_ESPLORA_API.to_string(),
        }
    }

    /// Same network, different endpoint.
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }
}

/// Maximum fractional digits kept when formatting a balance.
const MAX_FRACTION_DIGITS: usize = 9;

/// Format a raw integer balance with the specified number of decimals.
///
/// Trailing zeros are trimmed and the fraction is truncated (not rounded) to
/// nine digits, which is exact for lamports and satoshis.
pub fn format_balance(balance: U256, decimals: u8) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = balance / divisor;
    let remainder = balance % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let kept = &decimal_str[..decimal_str.len().min(MAX_FRACTION_DIGITS)];
        let trimmed = kept.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

/// Convert a raw on-chain amount into the chain's display unit.
///
/// Uses every decimal the chain has; only [`format_balance`] truncates.
pub fn to_display_units(raw: U256, chain: ChainId) -> f64 {
    let decimals = chain.decimals() as usize;
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = (raw / divisor).to_string();
    let fraction = (raw % divisor).to_string();

    // Digits and one '.', so parsing cannot fail.
    format!("{whole}.{fraction:0>decimals$}")
        .parse::<f64>()
        .unwrap_or(0.0)
}
