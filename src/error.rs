// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session-level error type.
//!
//! Variants carry internal detail for logs, but `Display` and
//! [`WalletError::user_message`] only ever produce text that is safe to show
//! to the user. Chain fetch errors live in [`crate::blockchain::ChainClientError`]
//! and never reach this type.

use thiserror::Error;

/// Shown when the phrase does not split into 12 words.
pub const MSG_WRONG_WORD_COUNT: &str = "Please enter a valid 12-word mnemonic phrase.";

/// Shown when derivation rejects the phrase (wordlist or checksum).
pub const MSG_INVALID_MNEMONIC: &str = "Invalid mnemonic phrase. Please check and try again.";

/// Shown when a session is missing one or more chain credentials.
pub const MSG_MALFORMED_SESSION: &str = "There was a problem loading your wallet data. \
     Please try logging out and importing your wallet again.";

#[derive(Debug, Error)]
pub enum WalletError {
    /// Structural (word count) failure. Derivation was never attempted.
    #[error("{}", MSG_WRONG_WORD_COUNT)]
    WrongWordCount { found: usize },

    /// Wordlist or checksum failure reported by the mnemonic service.
    #[error("{}", MSG_INVALID_MNEMONIC)]
    InvalidMnemonic { reason: String },

    #[error("{}", MSG_MALFORMED_SESSION)]
    MalformedSession { reason: String },

    #[error("A wallet session is already active. Log out first.")]
    SessionActive,

    #[error("No wallet session is active.")]
    NotLoggedIn,

    #[error("No newly generated phrase is waiting for confirmation.")]
    NoPendingMnemonic,

    /// Another transition happened while this login was deriving keys.
    #[error("Login was interrupted. Please try again.")]
    LoginSuperseded,

    #[error("Internal wallet error.")]
    Internal(String),
}

impl WalletError {
    pub fn invalid_mnemonic(reason: impl Into<String>) -> Self {
        Self::InvalidMnemonic {
            reason: reason.into(),
        }
    }

    pub fn malformed_session(reason: impl Into<String>) -> Self {
        Self::MalformedSession {
            reason: reason.into(),
        }
    }

    /// Both structural and checksum failures count as an invalid mnemonic.
    pub fn is_invalid_mnemonic(&self) -> bool {
        matches!(
            self,
            Self::WrongWordCount { .. } | Self::InvalidMnemonic { .. }
        )
    }

    /// Text for the presentation layer. Never contains internal detail.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Internal detail for `debug!` logs only.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::InvalidMnemonic { reason } | Self::MalformedSession { reason } => Some(reason),
            Self::Internal(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
