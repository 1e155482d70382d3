// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ethereum client for native ETH balance queries.

use std::str::FromStr;

use alloy::{
    network::Ethereum,
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
};
use async_trait::async_trait;

use super::client::{BalanceClient, ChainClientError};
use super::types::*;

/// Ethereum JSON-RPC client.
pub struct EthereumClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider (type-erased, read-only use)
    provider: DynProvider<Ethereum>,
}

impl EthereumClient {
    /// Create a new client for the specified network.
    pub fn new(network: NetworkConfig) -> Result<Self, ChainClientError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self { network, provider })
    }

    /// Create a client for Ethereum mainnet.
    pub fn mainnet() -> Result<Self, ChainClientError> {
        Self::new(NetworkConfig::ethereum_mainnet())
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

#[async_trait]
impl BalanceClient for EthereumClient {
    fn chain(&self) -> ChainId {
        ChainId::Ethereum
    }

    async fn fetch_balance(&self, address: &str) -> Result<f64, ChainClientError> {
        let addr = Address::from_str(address)
            .map_err(|e| ChainClientError::InvalidAddress(e.to_string()))?;

        let wei = self
            .provider
            .get_balance(addr)
            .await
            .map_err(|e| ChainClientError::Network(e.to_string()))?;

        Ok(to_display_units(wei, ChainId::Ethereum))
    }
}
