// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Session Manager
//!
//! Owns the wallet session and its lifecycle, and is the only writer of both
//! the session and the published balance snapshot.
//!
//! ## Guarantees
//!
//! - The mnemonic service is never asked to derive credentials for a phrase
//!   that failed the 12-word structural check.
//! - A session is either absent or complete; partial sessions are rejected
//!   with `MalformedSession` before they become visible.
//! - After `logout()` returns, no snapshot is published for the old session,
//!   even if a cycle for it is still running (epoch guard, see [`crate::state`]).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::aggregator::BalanceAggregator;
use crate::error::{WalletError, WalletResult};
use crate::mnemonic::{Mnemonic, MnemonicService};
use crate::models::{BalanceSnapshot, WalletSession};
use crate::refresher::{BalanceRefresher, DEFAULT_REFRESH_INTERVAL};
use crate::state::{ActiveSession, Guarded, SessionState, SessionStatus};

/// Entry point for the presentation layer.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

struct Inner {
    mnemonic_service: Arc<dyn MnemonicService>,
    aggregator: Arc<BalanceAggregator>,
    refresh_interval: Duration,
    guarded: Mutex<Guarded>,
    snapshot_tx: watch::Sender<Option<BalanceSnapshot>>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Guarded> {
        // No invariant spans a panic inside the lock; keep serving.
        self.guarded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish `snapshot` if the session it was computed for is still active.
    fn publish(&self, epoch: u64, snapshot: BalanceSnapshot) -> bool {
        let guarded = self.lock();
        if guarded.active_at(epoch).is_none() {
            debug!(
                session_id = %snapshot.session_id,
                "Discarding balance snapshot for a session that has ended"
            );
            return false;
        }
        self.snapshot_tx.send_replace(Some(snapshot));
        true
    }
}

impl SessionManager {
    pub fn new(mnemonic_service: Arc<dyn MnemonicService>, aggregator: BalanceAggregator) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                mnemonic_service,
                aggregator: Arc::new(aggregator),
                refresh_interval: DEFAULT_REFRESH_INTERVAL,
                guarded: Mutex::new(Guarded::new()),
                snapshot_tx,
            }),
        }
    }

    /// Override the periodic refresh interval.
    ///
    /// Only applies before the manager is cloned; on a shared manager the
    /// override is ignored with a warning.
    pub fn with_refresh_interval(mut self, refresh_interval: Duration) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.refresh_interval = refresh_interval,
            None => warn!(
                requested_secs = refresh_interval.as_secs(),
                current_secs = self.inner.refresh_interval.as_secs(),
                "Refresh interval override ignored on a shared session manager"
            ),
        }
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        self.inner.refresh_interval
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock().state.status()
    }

    /// The active session, if logged in.
    pub fn session(&self) -> Option<Arc<WalletSession>> {
        match &self.inner.lock().state {
            SessionState::LoggedIn(active) => Some(active.session.clone()),
            _ => None,
        }
    }

    /// The generated phrase waiting for confirmation, if any.
    pub fn pending_mnemonic(&self) -> Option<Mnemonic> {
        match &self.inner.lock().state {
            SessionState::AwaitingConfirmation { mnemonic } => Some(mnemonic.clone()),
            _ => None,
        }
    }

    /// Import an existing wallet.
    ///
    /// The phrase is checked for 12 words before any derivation. On failure
    /// the state is left as it was.
    pub async fn login(&self, phrase: &str) -> WalletResult<()> {
        let mnemonic = Mnemonic::parse(phrase).inspect_err(|e| {
            debug!(error = %e, "Rejected mnemonic before derivation");
        })?;

        let epoch = {
            let guarded = self.inner.lock();
            if matches!(guarded.state, SessionState::LoggedIn(_)) {
                return Err(WalletError::SessionActive);
            }
            guarded.epoch
        };

        self.establish(mnemonic, epoch).await
    }

    /// Generate a new phrase and hold it for confirmation.
    ///
    /// No credentials are derived until [`Self::confirm_and_login`].
    pub fn create_new(&self) -> WalletResult<Mnemonic> {
        let mut guarded = self.inner.lock();
        if matches!(guarded.state, SessionState::LoggedIn(_)) {
            return Err(WalletError::SessionActive);
        }

        let mnemonic = self.inner.mnemonic_service.generate()?;
        guarded.transition(SessionState::AwaitingConfirmation {
            mnemonic: mnemonic.clone(),
        });
        info!("Generated new mnemonic, awaiting confirmation");
        Ok(mnemonic)
    }

    /// Log in with the phrase produced by [`Self::create_new`].
    pub async fn confirm_and_login(&self) -> WalletResult<()> {
        let (mnemonic, epoch) = {
            let guarded = self.inner.lock();
            match &guarded.state {
                SessionState::AwaitingConfirmation { mnemonic } => {
                    (mnemonic.clone(), guarded.epoch)
                }
                _ => return Err(WalletError::NoPendingMnemonic),
            }
        };

        self.establish(mnemonic, epoch).await
    }

    /// End the session: stop refreshing, drop the snapshot and the keys.
    pub fn logout(&self) {
        let previous = {
            let mut guarded = self.inner.lock();
            let previous = guarded.transition(SessionState::LoggedOut);
            self.inner.snapshot_tx.send_replace(None);
            previous
        };

        if let SessionState::LoggedIn(active) = &previous {
            info!(session_id = %active.session.id(), "Wallet session logged out");
        }
        // Dropping the previous state cancels the refresher.
        drop(previous);
    }

    /// Latest published snapshot, possibly up to one refresh interval old.
    pub fn snapshot(&self) -> Option<BalanceSnapshot> {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Change notifications for re-rendering. `None` means logged out or no
    /// cycle has finished yet.
    pub fn subscribe(&self) -> watch::Receiver<Option<BalanceSnapshot>> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Run one aggregation cycle now, e.g. after a completed transfer.
    ///
    /// Fails with `NotLoggedIn` if there is no session, or if the session
    /// ended while the cycle was running (its result is discarded).
    pub async fn refresh_now(&self) -> WalletResult<()> {
        let (session, epoch) = {
            let guarded = self.inner.lock();
            match &guarded.state {
                SessionState::LoggedIn(active) => (active.session.clone(), guarded.epoch),
                _ => return Err(WalletError::NotLoggedIn),
            }
        };

        let snapshot = self.inner.aggregator.aggregate(&session).await;
        if self.inner.publish(epoch, snapshot) {
            Ok(())
        } else {
            Err(WalletError::NotLoggedIn)
        }
    }

    /// Derive, validate and commit a session started under `epoch`.
    async fn establish(&self, mnemonic: Mnemonic, epoch: u64) -> WalletResult<()> {
        let service = self.inner.mnemonic_service.clone();
        let to_derive = mnemonic.clone();
        let credentials = tokio::task::spawn_blocking(move || service.derive_credentials(&to_derive))
            .await
            .map_err(|e| WalletError::Internal(format!("derivation task failed: {e}")))?
            .inspect_err(|e| {
                debug!(error = ?e.detail(), "Mnemonic rejected by derivation");
            })?;

        let session = WalletSession::new(mnemonic, credentials);
        session.ensure_complete().inspect_err(|e| {
            warn!(error = ?e.detail(), "Derived session is incomplete");
        })?;
        let session = Arc::new(session);

        let token = CancellationToken::new();
        let committed_epoch = {
            let mut guarded = self.inner.lock();
            if guarded.epoch != epoch {
                return Err(WalletError::LoginSuperseded);
            }
            let previous = guarded.transition(SessionState::LoggedIn(ActiveSession::new(
                session.clone(),
                token.clone(),
            )));
            self.inner.snapshot_tx.send_replace(None);
            drop(previous);
            guarded.epoch
        };

        info!(session_id = %session.id(), "Wallet session logged in");
        self.spawn_refresher(session, committed_epoch, token);
        Ok(())
    }

    fn spawn_refresher(&self, session: Arc<WalletSession>, epoch: u64, token: CancellationToken) {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let publish = move |snapshot: BalanceSnapshot| match inner.upgrade() {
            Some(inner) => inner.publish(epoch, snapshot),
            None => false,
        };

        let refresher = BalanceRefresher::new(self.inner.aggregator.clone(), session, publish)
            .with_interval(self.inner.refresh_interval);
        tokio::spawn(refresher.run(token));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ChainId;
    use crate::error::{MSG_INVALID_MNEMONIC, MSG_WRONG_WORD_COUNT};
    use crate::models::BalanceStatus;
    use crate::testing::{
        CountingMnemonicService, GatedMnemonicService, ScriptedClient, TEST_MNEMONIC,
    };

    struct Harness {
        manager: SessionManager,
        service: Arc<CountingMnemonicService>,
        eth: Arc<ScriptedClient>,
        sol: Arc<ScriptedClient>,
        btc: Arc<ScriptedClient>,
    }

    impl Harness {
        fn new(eth: Arc<ScriptedClient>, sol: Arc<ScriptedClient>, btc: Arc<ScriptedClient>) -> Self {
            let service = Arc::new(CountingMnemonicService::new());
            let aggregator = BalanceAggregator::new(eth.clone(), sol.clone(), btc.clone());
            let manager = SessionManager::new(service.clone(), aggregator);
            Self {
                manager,
                service,
                eth,
                sol,
                btc,
            }
        }

        fn healthy() -> Self {
            Self::new(
                ScriptedClient::ok(ChainId::Ethereum, 1.5, 10),
                ScriptedClient::ok(ChainId::Solana, 3.0, 10),
                ScriptedClient::ok(ChainId::Bitcoin, 0.5, 10),
            )
        }

        fn fetches_started(&self) -> usize {
            self.eth.started() + self.sol.started() + self.btc.started()
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn login_with_known_vector() {
        let h = Harness::healthy();
        h.manager.login(TEST_MNEMONIC).await.unwrap();

        assert_eq!(h.manager.status(), SessionStatus::LoggedIn);
        let session = h.manager.session().unwrap();
        for chain in ChainId::ALL {
            assert!(!session.address(chain).is_empty());
        }
        assert_eq!(
            session.address(ChainId::Ethereum),
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        );

        settle().await;
        let snapshot = h.manager.snapshot().unwrap();
        assert_eq!(snapshot.session_id, session.id());
        assert_eq!(snapshot.amount(ChainId::Ethereum), 1.5);
        assert_eq!(snapshot.amount(ChainId::Solana), 3.0);
        assert_eq!(snapshot.amount(ChainId::Bitcoin), 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn eleven_words_never_reach_derivation() {
        let h = Harness::healthy();
        let eleven = TEST_MNEMONIC.rsplit_once(' ').unwrap().0;

        let err = h.manager.login(eleven).await.unwrap_err();
        assert!(err.is_invalid_mnemonic());
        assert_eq!(err.user_message(), MSG_WRONG_WORD_COUNT);

        settle().await;
        assert_eq!(h.service.derive_calls(), 0);
        assert_eq!(h.fetches_started(), 0);
        assert_eq!(h.manager.status(), SessionStatus::LoggedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_and_oversized_input_never_reach_derivation() {
        let h = Harness::healthy();
        let thirteen = format!("{TEST_MNEMONIC} about");
        for phrase in ["", "   ", thirteen.as_str()] {
            let err = h.manager.login(phrase).await.unwrap_err();
            assert!(err.is_invalid_mnemonic());
        }
        assert_eq!(h.service.derive_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn bad_checksum_stays_logged_out_with_generic_message() {
        let h = Harness::healthy();
        let phrase = TEST_MNEMONIC.replace("about", "abandon");

        let err = h.manager.login(&phrase).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic { .. }));
        assert_eq!(err.user_message(), MSG_INVALID_MNEMONIC);

        settle().await;
        assert_eq!(h.service.derive_calls(), 1);
        assert_eq!(h.manager.status(), SessionStatus::LoggedOut);
        assert!(h.manager.session().is_none());
        assert_eq!(h.fetches_started(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn create_then_confirm() {
        let h = Harness::healthy();

        let phrase = h.manager.create_new().unwrap();
        assert_eq!(h.manager.status(), SessionStatus::AwaitingConfirmation);
        assert_eq!(h.manager.pending_mnemonic(), Some(phrase.clone()));
        assert!(h.manager.session().is_none());
        assert_eq!(h.service.generate_calls(), 1);
        assert_eq!(h.service.derive_calls(), 0);

        h.manager.confirm_and_login().await.unwrap();
        assert_eq!(h.manager.status(), SessionStatus::LoggedIn);
        assert!(h.manager.pending_mnemonic().is_none());

        let session = h.manager.session().unwrap();
        assert_eq!(session.mnemonic(), &phrase);
        assert_eq!(h.service.derive_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_without_pending_phrase() {
        let h = Harness::healthy();
        assert!(matches!(
            h.manager.confirm_and_login().await,
            Err(WalletError::NoPendingMnemonic)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn import_while_awaiting_confirmation_replaces_pending_phrase() {
        let h = Harness::healthy();
        h.manager.create_new().unwrap();

        h.manager.login(TEST_MNEMONIC).await.unwrap();
        assert_eq!(h.manager.status(), SessionStatus::LoggedIn);
        assert_eq!(
            h.manager.session().unwrap().mnemonic().as_str(),
            TEST_MNEMONIC
        );
    }

    #[tokio::test(start_paused = true)]
    async fn creation_overtaking_login_supersedes_it() {
        let h = Harness::healthy();
        let phrase = h.manager.create_new().unwrap();

        // Regenerating bumps the epoch the pending confirmation was read at.
        let epoch = h.manager.inner.lock().epoch;
        h.manager.create_new().unwrap();

        let err = h.manager.establish(phrase, epoch).await.unwrap_err();
        assert!(matches!(err, WalletError::LoginSuperseded));
        assert_eq!(h.manager.status(), SessionStatus::AwaitingConfirmation);
    }

    #[tokio::test]
    async fn logout_during_login_derivation_supersedes_it() {
        let service = Arc::new(GatedMnemonicService::new());
        let eth = ScriptedClient::ok(ChainId::Ethereum, 1.0, 0);
        let aggregator = BalanceAggregator::new(
            eth.clone(),
            ScriptedClient::ok(ChainId::Solana, 1.0, 0),
            ScriptedClient::ok(ChainId::Bitcoin, 1.0, 0),
        );
        let manager = SessionManager::new(service.clone(), aggregator);

        let login = tokio::spawn({
            let manager = manager.clone();
            async move { manager.login(TEST_MNEMONIC).await }
        });

        service.entered().await;
        manager.logout();
        service.release();

        assert!(matches!(
            login.await.unwrap(),
            Err(WalletError::LoginSuperseded)
        ));
        assert_eq!(manager.status(), SessionStatus::LoggedOut);
        assert!(manager.session().is_none());
        assert!(manager.snapshot().is_none());

        tokio::task::yield_now().await;
        assert_eq!(eth.started(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_misuse_is_rejected() {
        let h = Harness::healthy();
        h.manager.login(TEST_MNEMONIC).await.unwrap();

        assert!(matches!(
            h.manager.login(TEST_MNEMONIC).await,
            Err(WalletError::SessionActive)
        ));
        assert!(matches!(
            h.manager.create_new(),
            Err(WalletError::SessionActive)
        ));

        h.manager.logout();
        assert!(matches!(
            h.manager.refresh_now().await,
            Err(WalletError::NotLoggedIn)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_refresh_stops_at_logout() {
        let h = Harness::healthy();
        h.manager.login(TEST_MNEMONIC).await.unwrap();

        settle().await;
        assert_eq!(h.eth.started(), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(h.eth.started(), 2);

        h.manager.logout();
        assert_eq!(h.manager.status(), SessionStatus::LoggedOut);
        assert!(h.manager.snapshot().is_none());
        assert!(h.manager.session().is_none());

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(h.eth.started(), 2);
        assert!(h.manager.snapshot().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_refresh_is_not_applied_after_logout() {
        let h = Harness::new(
            ScriptedClient::ok(ChainId::Ethereum, 1.0, 2_000),
            ScriptedClient::ok(ChainId::Solana, 1.0, 2_000),
            ScriptedClient::ok(ChainId::Bitcoin, 1.0, 2_000),
        );
        h.manager.login(TEST_MNEMONIC).await.unwrap();
        let mut updates = h.manager.subscribe();

        let manager = h.manager.clone();
        let manual = tokio::spawn(async move { manager.refresh_now().await });

        tokio::time::sleep(Duration::from_millis(500)).await;
        h.manager.logout();
        updates.mark_unchanged();

        assert!(matches!(
            manual.await.unwrap(),
            Err(WalletError::NotLoggedIn)
        ));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.manager.snapshot().is_none());
        assert!(!updates.has_changed().unwrap());
        // The manual cycle ran to completion; its result was discarded.
        assert_eq!(h.eth.completed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_reflects_new_balance() {
        let h = Harness::healthy();
        h.manager.login(TEST_MNEMONIC).await.unwrap();
        settle().await;
        assert_eq!(h.manager.snapshot().unwrap().amount(ChainId::Ethereum), 1.5);

        h.eth.set_amount(0.75);
        h.manager.refresh_now().await.unwrap();
        assert_eq!(h.manager.snapshot().unwrap().amount(ChainId::Ethereum), 0.75);
    }

    #[tokio::test(start_paused = true)]
    async fn degraded_chains_publish_zero_with_status() {
        let h = Harness::new(
            ScriptedClient::ok(ChainId::Ethereum, 1.5, 10),
            ScriptedClient::failing(ChainId::Solana, 10),
            ScriptedClient::ok(ChainId::Bitcoin, 2.0, 20_000),
        );
        h.manager.login(TEST_MNEMONIC).await.unwrap();
        h.manager.refresh_now().await.unwrap();

        let snapshot = h.manager.snapshot().unwrap();
        assert_eq!(snapshot.amount(ChainId::Ethereum), 1.5);
        assert_eq!(snapshot.amount(ChainId::Solana), 0.0);
        assert_eq!(snapshot.amount(ChainId::Bitcoin), 0.0);
        assert_eq!(snapshot.status(ChainId::Bitcoin), BalanceStatus::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_derivation_is_malformed_session() {
        let service = Arc::new(CountingMnemonicService::dropping_solana());
        let aggregator = BalanceAggregator::new(
            ScriptedClient::ok(ChainId::Ethereum, 1.0, 10),
            ScriptedClient::ok(ChainId::Solana, 1.0, 10),
            ScriptedClient::ok(ChainId::Bitcoin, 1.0, 10),
        );
        let manager = SessionManager::new(service, aggregator);

        let err = manager.login(TEST_MNEMONIC).await.unwrap_err();
        assert!(matches!(err, WalletError::MalformedSession { .. }));
        assert_eq!(manager.status(), SessionStatus::LoggedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn relogin_after_logout_starts_fresh_session() {
        let h = Harness::healthy();
        h.manager.login(TEST_MNEMONIC).await.unwrap();
        let first = h.manager.session().unwrap().id();
        h.manager.logout();

        h.manager.login(TEST_MNEMONIC).await.unwrap();
        let second = h.manager.session().unwrap();
        assert_ne!(first, second.id());

        settle().await;
        assert_eq!(h.manager.snapshot().unwrap().session_id, second.id());
    }

    #[test]
    fn refresh_interval_override_applies_only_before_sharing() {
        let h = Harness::healthy();
        assert_eq!(h.manager.refresh_interval(), DEFAULT_REFRESH_INTERVAL);

        let shared = h.manager.clone();
        let manager = h.manager.with_refresh_interval(Duration::from_secs(5));
        assert_eq!(manager.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
        assert_eq!(shared.refresh_interval(), DEFAULT_REFRESH_INTERVAL);

        drop(shared);
        let manager = manager.with_refresh_interval(Duration::from_secs(5));
        assert_eq!(manager.refresh_interval(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_refresh_interval_is_used() {
        let service = Arc::new(CountingMnemonicService::new());
        let eth = ScriptedClient::ok(ChainId::Ethereum, 1.0, 10);
        let aggregator = BalanceAggregator::new(
            eth.clone(),
            ScriptedClient::ok(ChainId::Solana, 1.0, 10),
            ScriptedClient::ok(ChainId::Bitcoin, 1.0, 10),
        );
        let manager =
            SessionManager::new(service, aggregator).with_refresh_interval(Duration::from_secs(5));

        manager.login(TEST_MNEMONIC).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(eth.started(), 3);
        manager.logout();
    }
}
