// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bitcoin balance client backed by an Esplora REST API.
//!
//! Public Esplora instances are the slowest and least reliable of the three
//! backends. This client does not bound its own latency; callers wrap it in a
//! timeout (see [`crate::aggregator`]).

use std::str::FromStr;

use alloy::primitives::U256;
use async_trait::async_trait;
use bitcoin::{address::NetworkUnchecked, Address};
use serde::Deserialize;

use super::client::{BalanceClient, ChainClientError};
use super::types::*;

pub struct BitcoinClient {
    network: NetworkConfig,
    client: reqwest::Client,
}

/// Subset of `GET /address/{address}`.
#[derive(Debug, Deserialize)]
struct AddressInfo {
    chain_stats: ChainStats,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

impl AddressInfo {
    /// Confirmed balance in satoshis.
    fn confirmed_sats(&self) -> Result<u64, ChainClientError> {
        self.chain_stats
            .funded_txo_sum
            .checked_sub(self.chain_stats.spent_txo_sum)
            .ok_or_else(|| {
                ChainClientError::InvalidResponse("spent exceeds funded".to_string())
            })
    }
}

impl BitcoinClient {
    pub fn new(network: NetworkConfig) -> Result<Self, ChainClientError> {
        url::Url::parse(&network.rpc_url)
            .map_err(|e| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChainClientError::Network(e.to_string()))?;

        Ok(Self { network, client })
    }

    /// Create a client for the Blockstream mainnet Esplora API.
    pub fn mainnet() -> Result<Self, ChainClientError> {
        Self::new(NetworkConfig::bitcoin_mainnet())
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    fn address_url(&self, address: &str) -> String {
        format!(
            "{}/address/{}",
            self.network.rpc_url.trim_end_matches('/'),
            address
        )
    }
}

#[async_trait]
impl BalanceClient for BitcoinClient {
    fn chain(&self) -> ChainId {
        ChainId::Bitcoin
    }

    async fn fetch_balance(&self, address: &str) -> Result<f64, ChainClientError> {
        Address::<NetworkUnchecked>::from_str(address)
            .map_err(|e| ChainClientError::InvalidAddress(e.to_string()))?;

        let response = self.client.get(self.address_url(address)).send().await?;

        if !response.status().is_success() {
            return Err(ChainClientError::Network(format!(
                "HTTP {} from Esplora",
                response.status()
            )));
        }

        let info: AddressInfo = response.json().await?;
        let sats = info.confirmed_sats()?;
        Ok(to_display_units(U256::from(sats), ChainId::Bitcoin))
    }
}
