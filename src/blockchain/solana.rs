// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Solana JSON-RPC client for native SOL balance queries.

use alloy::primitives::U256;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::client::{BalanceClient, ChainClientError};
use super::types::*;

/// Solana public keys are 32 bytes; base58 renders them in 32..=44 chars.
const PUBKEY_LEN: usize = 32;

/// Solana JSON-RPC client.
pub struct SolanaClient {
    network: NetworkConfig,
    /// HTTP client (no request timeout: the aggregator owns deadlines)
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<BalanceResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    /// Balance in lamports
    value: u64,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl SolanaClient {
    pub fn new(network: NetworkConfig) -> Result<Self, ChainClientError> {
        url::Url::parse(&network.rpc_url)
            .map_err(|e| ChainClientError::InvalidRpcUrl(e.to_string()))?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ChainClientError::Network(e.to_string()))?;

        Ok(Self { network, client })
    }

    /// Create a client for Solana mainnet-beta.
    pub fn mainnet() -> Result<Self, ChainClientError> {
        Self::new(NetworkConfig::solana_mainnet())
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }
}

/// Reject anything that is not a base58-encoded 32-byte key.
fn validate_address(address: &str) -> Result<(), ChainClientError> {
    let bytes = bitcoin::base58::decode(address)
        .map_err(|e| ChainClientError::InvalidAddress(e.to_string()))?;
    if bytes.len() != PUBKEY_LEN {
        return Err(ChainClientError::InvalidAddress(format!(
            "expected {PUBKEY_LEN} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

/// Extract the lamport balance from a `getBalance` response body.
fn parse_balance(response: RpcResponse) -> Result<u64, ChainClientError> {
    if let Some(err) = response.error {
        return Err(ChainClientError::InvalidResponse(format!(
            "RPC error {}: {}",
            err.code, err.message
        )));
    }
    response
        .result
        .map(|r| r.value)
        .ok_or_else(|| ChainClientError::InvalidResponse("missing result".to_string()))
}

#[async_trait]
impl BalanceClient for SolanaClient {
    fn chain(&self) -> ChainId {
        ChainId::Solana
    }

    async fn fetch_balance(&self, address: &str) -> Result<f64, ChainClientError> {
        validate_address(address)?;

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [address],
        });

        let response = self
            .client
            .post(&self.network.rpc_url)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ChainClientError::Network(format!(
                "HTTP {} from Solana RPC",
                response.status()
            )));
        }

        let lamports = parse_balance(response.json::<RpcResponse>().await?)?;
        Ok(to_display_units(U256::from(lamports), ChainId::Solana))
    }
}
