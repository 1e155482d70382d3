// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Aggregator
//!
//! Produces one [`BalanceSnapshot`] from three concurrent, independently
//! fallible balance fetches.
//!
//! ## Policy
//!
//! 1. All three fetches are polled together, so a cycle takes as long as the
//!    slowest chain, not the sum of the three.
//! 2. A chain may have a deadline (by default only Bitcoin, 8 s). When it
//!    elapses the fetch future is dropped, which aborts the request; its late
//!    result cannot reach any snapshot.
//! 3. The snapshot is built only after every chain has settled. A failed or
//!    timed-out chain contributes `0` with an explicit [`BalanceStatus`];
//!    aggregation itself never fails.
//! 4. A malformed session yields an all-zero snapshot without touching the
//!    network.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, warn};

use crate::blockchain::{BalanceClient, ChainClientError, ChainId};
use crate::models::{BalanceSnapshot, BalanceStatus, ChainBalance, WalletSession};

/// Default deadline for the Bitcoin backend.
pub const DEFAULT_BITCOIN_TIMEOUT: Duration = Duration::from_millis(8000);

/// Per-chain deadlines. `None` means the fetch is awaited until it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    pub ethereum_timeout: Option<Duration>,
    pub solana_timeout: Option<Duration>,
    pub bitcoin_timeout: Option<Duration>,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            ethereum_timeout: None,
            solana_timeout: None,
            bitcoin_timeout: Some(DEFAULT_BITCOIN_TIMEOUT),
        }
    }
}

impl AggregatorConfig {
    fn timeout_for(&self, chain: ChainId) -> Option<Duration> {
        match chain {
            ChainId::Ethereum => self.ethereum_timeout,
            ChainId::Solana => self.solana_timeout,
            ChainId::Bitcoin => self.bitcoin_timeout,
        }
    }
}

/// Fan-out over the three chain clients.
pub struct BalanceAggregator {
    ethereum: Arc<dyn BalanceClient>,
    solana: Arc<dyn BalanceClient>,
    bitcoin: Arc<dyn BalanceClient>,
    config: AggregatorConfig,
}

impl BalanceAggregator {
    pub fn new(
        ethereum: Arc<dyn BalanceClient>,
        solana: Arc<dyn BalanceClient>,
        bitcoin: Arc<dyn BalanceClient>,
    ) -> Self {
        Self {
            ethereum,
            solana,
            bitcoin,
            config: AggregatorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    fn client(&self, chain: ChainId) -> &dyn BalanceClient {
        match chain {
            ChainId::Ethereum => self.ethereum.as_ref(),
            ChainId::Solana => self.solana.as_ref(),
            ChainId::Bitcoin => self.bitcoin.as_ref(),
        }
    }

    /// Run one aggregation cycle for `session`.
    pub async fn aggregate(&self, session: &WalletSession) -> BalanceSnapshot {
        let session_id = session.id();

        if let Err(e) = session.ensure_complete() {
            error!(
                session_id = %session_id,
                error = ?e.detail(),
                "Refusing to fetch balances for malformed session"
            );
            return BalanceSnapshot::unavailable(session_id);
        }

        let started = Instant::now();

        let (ethereum, solana, bitcoin) = tokio::join!(
            self.fetch_one(session, ChainId::Ethereum),
            self.fetch_one(session, ChainId::Solana),
            self.fetch_one(session, ChainId::Bitcoin),
        );

        let snapshot = BalanceSnapshot {
            session_id,
            ethereum,
            solana,
            bitcoin,
            refreshed_at: Utc::now(),
        };

        debug!(
            session_id = %session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            complete = snapshot.is_complete(),
            "Balance aggregation cycle finished"
        );

        snapshot
    }

    /// Fetch one chain and fold every outcome into a [`ChainBalance`].
    async fn fetch_one(&self, session: &WalletSession, chain: ChainId) -> ChainBalance {
        let address = session.address(chain);
        let fetch = self.client(chain).fetch_balance(address);

        let outcome = match self.config.timeout_for(chain) {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                // The fetch future is dropped here, aborting the request.
                Err(_) => Err(ChainClientError::Timeout(limit.as_millis() as u64)),
            },
            None => fetch.await,
        };

        match outcome {
            Ok(amount) => ChainBalance::fetched(amount),
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    chain = %chain,
                    error = %e,
                    "Balance fetch failed, using zero"
                );
                let status = if e.is_timeout() {
                    BalanceStatus::TimedOut
                } else {
                    BalanceStatus::Failed
                };
                ChainBalance::fallback(status)
            }
        }
    }
}
