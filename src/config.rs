// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ETH_RPC_URL` | Ethereum JSON-RPC endpoint | `https://ethereum-rpc.publicnode.com` |
//! | `SOL_RPC_URL` | Solana JSON-RPC endpoint | `https://api.mainnet-beta.solana.com` |
//! | `BTC_ESPLORA_URL` | Esplora REST base URL | `https://blockstream.info/api` |
//! | `BALANCE_REFRESH_SECS` | Periodic balance refresh interval | `30` |
//! | `BTC_BALANCE_TIMEOUT_MS` | Bitcoin balance fetch timeout | `8000` |
//! | `WALLET_MNEMONIC` | Phrase to import at startup (binary only) | unset: generate |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::aggregator::{AggregatorConfig, DEFAULT_BITCOIN_TIMEOUT};
use crate::blockchain::{
    NetworkConfig, BITCOIN_ESPLORA_API, ETHEREUM_MAINNET_RPC, SOLANA_MAINNET_RPC,
};
use crate::mnemonic::Mnemonic;
use crate::refresher::DEFAULT_REFRESH_INTERVAL;

/// Environment variable name for the Ethereum JSON-RPC endpoint.
pub const ETH_RPC_URL_ENV: &str = "ETH_RPC_URL";

/// Environment variable name for the Solana JSON-RPC endpoint.
pub const SOL_RPC_URL_ENV: &str = "SOL_RPC_URL";

/// Environment variable name for the Esplora base URL, including any path
/// prefix such as `/api`.
pub const BTC_ESPLORA_URL_ENV: &str = "BTC_ESPLORA_URL";

/// Environment variable name for the refresh interval in whole seconds.
pub const BALANCE_REFRESH_SECS_ENV: &str = "BALANCE_REFRESH_SECS";

/// Environment variable name for the Bitcoin fetch timeout in milliseconds.
pub const BTC_BALANCE_TIMEOUT_MS_ENV: &str = "BTC_BALANCE_TIMEOUT_MS";

/// Environment variable name for a phrase to import instead of generating one.
///
/// Only read by the binary. Never logged.
pub const WALLET_MNEMONIC_ENV: &str = "WALLET_MNEMONIC";

/// Environment variable name selecting the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} does not hold a 12-word phrase")]
    InvalidMnemonic { var: &'static str },
}

/// Settings for the wallet core and its chain clients.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub ethereum: NetworkConfig,
    pub solana: NetworkConfig,
    pub bitcoin: NetworkConfig,
    pub refresh_interval: Duration,
    pub bitcoin_timeout: Duration,
    pub mnemonic: Option<Mnemonic>,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            ethereum: NetworkConfig::ethereum_mainnet(),
            solana: NetworkConfig::solana_mainnet(),
            bitcoin: NetworkConfig::bitcoin_mainnet(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            bitcoin_timeout: DEFAULT_BITCOIN_TIMEOUT,
            mnemonic: None,
        }
    }
}

impl WalletConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable lookup. Unset and blank values take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let ethereum = NetworkConfig::ethereum_mainnet().with_rpc_url(url_or(
            ETH_RPC_URL_ENV,
            get(ETH_RPC_URL_ENV),
            ETHEREUM_MAINNET_RPC,
        )?);
        let solana = NetworkConfig::solana_mainnet().with_rpc_url(url_or(
            SOL_RPC_URL_ENV,
            get(SOL_RPC_URL_ENV),
            SOLANA_MAINNET_RPC,
        )?);
        let bitcoin = NetworkConfig::bitcoin_mainnet().with_rpc_url(url_or(
            BTC_ESPLORA_URL_ENV,
            get(BTC_ESPLORA_URL_ENV),
            BITCOIN_ESPLORA_API,
        )?);

        let refresh_interval = match get(BALANCE_REFRESH_SECS_ENV) {
            Some(value) => Duration::from_secs(positive(BALANCE_REFRESH_SECS_ENV, value)?),
            None => DEFAULT_REFRESH_INTERVAL,
        };
        let bitcoin_timeout = match get(BTC_BALANCE_TIMEOUT_MS_ENV) {
            Some(value) => Duration::from_millis(positive(BTC_BALANCE_TIMEOUT_MS_ENV, value)?),
            None => DEFAULT_BITCOIN_TIMEOUT,
        };

        let mnemonic = match get(WALLET_MNEMONIC_ENV) {
            Some(phrase) => Some(Mnemonic::parse(&phrase).map_err(|_| {
                ConfigError::InvalidMnemonic {
                    var: WALLET_MNEMONIC_ENV,
                }
            })?),
            None => None,
        };

        Ok(Self {
            ethereum,
            solana,
            bitcoin,
            refresh_interval,
            bitcoin_timeout,
            mnemonic,
        })
    }

    /// Per-chain deadlines for the aggregator.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            bitcoin_timeout: Some(self.bitcoin_timeout),
            ..AggregatorConfig::default()
        }
    }
}

fn url_or(var: &'static str, value: Option<String>, default: &str) -> Result<String, ConfigError> {
    let raw = value.unwrap_or_else(|| default.to_string());
    let parsed = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        var,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim().to_string()),
        other => Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn positive(var: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber { var, value }),
    }
}
