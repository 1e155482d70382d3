// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session state machine.
//!
//! ```text
//! LoggedOut --create_new--> AwaitingConfirmation --confirm_and_login--> LoggedIn
//!     |                                                                   ^
//!     +------------------------------login--------------------------------+
//! LoggedIn --logout--> LoggedOut
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::mnemonic::Mnemonic;
use crate::models::WalletSession;

/// Secret-free view of the current state, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    LoggedOut,
    AwaitingConfirmation,
    LoggedIn,
}

/// A logged-in session and the token of its refresh task.
pub(crate) struct ActiveSession {
    pub session: Arc<WalletSession>,
    refresh: CancellationToken,
}

impl ActiveSession {
    pub fn new(session: Arc<WalletSession>, refresh: CancellationToken) -> Self {
        Self { session, refresh }
    }
}

impl Drop for ActiveSession {
    // Leaving LoggedIn by any path stops the refresher.
    fn drop(&mut self) {
        self.refresh.cancel();
    }
}

pub(crate) enum SessionState {
    LoggedOut,
    AwaitingConfirmation { mnemonic: Mnemonic },
    LoggedIn(ActiveSession),
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::LoggedOut => SessionStatus::LoggedOut,
            SessionState::AwaitingConfirmation { .. } => SessionStatus::AwaitingConfirmation,
            SessionState::LoggedIn(_) => SessionStatus::LoggedIn,
        }
    }
}

/// State plus the epoch that guards against stale results.
///
/// The epoch is bumped by every transition. Work started under one epoch
/// (a derivation, an aggregation cycle) may only commit if the epoch is
/// unchanged when it finishes.
pub(crate) struct Guarded {
    pub state: SessionState,
    pub epoch: u64,
}

impl Guarded {
    pub fn new() -> Self {
        Self {
            state: SessionState::LoggedOut,
            epoch: 0,
        }
    }

    /// Replace the state and bump the epoch. Returns the previous state so
    /// the caller decides when it is dropped.
    pub fn transition(&mut self, next: SessionState) -> SessionState {
        self.epoch += 1;
        std::mem::replace(&mut self.state, next)
    }

    /// The active session if it still belongs to `epoch`.
    pub fn active_at(&self, epoch: u64) -> Option<&ActiveSession> {
        match &self.state {
            SessionState::LoggedIn(active) if self.epoch == epoch => Some(active),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::logged_in_session;

    #[test]
    fn transitions_bump_epoch() {
        let mut guarded = Guarded::new();
        assert_eq!(guarded.state.status(), SessionStatus::LoggedOut);

        let token = CancellationToken::new();
        let previous = guarded.transition(SessionState::LoggedIn(ActiveSession::new(
            Arc::new(logged_in_session()),
            token.clone(),
        )));
        assert!(matches!(previous, SessionState::LoggedOut));
        assert_eq!(guarded.epoch, 1);
        assert!(guarded.active_at(1).is_some());
        assert!(guarded.active_at(0).is_none());

        drop(guarded.transition(SessionState::LoggedOut));
        assert_eq!(guarded.epoch, 2);
        assert!(guarded.active_at(1).is_none());
    }

    #[test]
    fn dropping_active_session_cancels_refresh() {
        let token = CancellationToken::new();
        let active = ActiveSession::new(Arc::new(logged_in_session()), token.clone());
        assert!(!token.is_cancelled());
        drop(active);
        assert!(token.is_cancelled());
    }
}
