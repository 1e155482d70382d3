// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Balance client abstraction shared by the three chain adapters.
//!
//! Adapters never apply their own deadline. The caller bounds a fetch with
//! `tokio::time::timeout`; dropping the future aborts the HTTP request, so a
//! timed-out fetch stops consuming resources instead of running to completion
//! in the background.

use async_trait::async_trait;

use super::types::ChainId;

/// "Fetch balance for address" for one chain.
#[async_trait]
pub trait BalanceClient: Send + Sync {
    /// Chain this client talks to.
    fn chain(&self) -> ChainId;

    /// Balance of `address` in the chain's display unit (ETH, SOL, BTC).
    async fn fetch_balance(&self, address: &str) -> Result<f64, ChainClientError>;
}

/// Errors that can occur while fetching a balance.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainClientError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ChainClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ChainClientError::Timeout(_))
    }
}

impl From<reqwest::Error> for ChainClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ChainClientError::InvalidResponse(e.to_string())
        } else {
            ChainClientError::Network(e.to_string())
        }
    }
}
