// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Balance Refresher
//!
//! Background task that re-runs the balance aggregation for one wallet
//! session on a fixed interval (default 30 s) while the session is logged in.
//!
//! ## Lifecycle
//!
//! The session manager spawns one refresher per login and cancels its
//! `CancellationToken` on logout. Cancellation is observed both while waiting
//! for the next tick and while a cycle is in flight, so no cycle starts or
//! publishes after logout.
//!
//! The first cycle runs immediately, so the dashboard has balances right
//! after login. Cycles start on a fixed interval measured from that first
//! one, however long each cycle takes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::aggregator::BalanceAggregator;
use crate::models::{BalanceSnapshot, WalletSession};

/// Default interval between refresh cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic aggregation for one session.
///
/// `publish` receives every finished snapshot and returns `false` once the
/// session it belongs to is gone, which stops the loop.
pub struct BalanceRefresher<P> {
    aggregator: Arc<BalanceAggregator>,
    session: Arc<WalletSession>,
    poll_interval: Duration,
    publish: P,
}

impl<P> BalanceRefresher<P>
where
    P: Fn(BalanceSnapshot) -> bool + Send + Sync + 'static,
{
    pub fn new(aggregator: Arc<BalanceAggregator>, session: Arc<WalletSession>, publish: P) -> Self {
        Self {
            aggregator,
            session,
            poll_interval: DEFAULT_REFRESH_INTERVAL,
            publish,
        }
    }

    pub fn with_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run the refresh loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(refresher.run(token.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        let session_id = self.session.id();
        info!(
            session_id = %session_id,
            interval_secs = self.poll_interval.as_secs(),
            "Balance refresher starting"
        );

        // Fixed cadence: a slow cycle delays the next tick instead of
        // stretching every period after it.
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {},
                _ = shutdown.cancelled() => {
                    info!(session_id = %session_id, "Balance refresher shutting down");
                    return;
                }
            }

            tokio::select! {
                snapshot = self.aggregator.aggregate(&self.session) => {
                    if !(self.publish)(snapshot) {
                        info!(session_id = %session_id, "Session ended, balance refresher stopping");
                        return;
                    }
                }
                _ = shutdown.cancelled() => {
                    info!(session_id = %session_id, "Balance refresher shutting down");
                    return;
                }
            }
        }
    }
}
