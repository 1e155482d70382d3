// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Data Models
//!
//! Credentials, the wallet session that owns them, and the balance snapshot
//! published for it.
//!
//! ## Invariants
//!
//! - A [`WalletSession`] is only handed out by the session manager after
//!   [`WalletSession::ensure_complete`] succeeded: every slot holds a
//!   credential for its own chain with a non-empty address.
//! - A [`BalanceSnapshot`] is built whole by one aggregation cycle and never
//!   edited afterwards.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::blockchain::ChainId;
use crate::error::{WalletError, WalletResult};
use crate::mnemonic::Mnemonic;

// =============================================================================
// Credentials
// =============================================================================

/// Signature scheme a [`SigningHandle`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Secp256k1,
    Ed25519,
}

impl Curve {
    /// Scheme each chain signs with.
    pub fn for_chain(chain: ChainId) -> Self {
        match chain {
            ChainId::Ethereum | ChainId::Bitcoin => Curve::Secp256k1,
            ChainId::Solana => Curve::Ed25519,
        }
    }
}

/// Opaque signing capability for transaction code.
///
/// Holds the raw 32-byte private key. Zeroized on drop and redacted in
/// `Debug`; nothing in the session core reads the secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningHandle {
    #[zeroize(skip)]
    curve: Curve,
    secret: [u8; 32],
}

impl SigningHandle {
    pub fn new(curve: Curve, secret: [u8; 32]) -> Self {
        Self { curve, secret }
    }

    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// Raw private key for signing code. Never log or persist this.
    pub fn expose_secret(&self) -> &[u8; 32] {
        &self.secret
    }
}

impl fmt::Debug for SigningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningHandle")
            .field("curve", &self.curve)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Address plus signing capability for one chain.
#[derive(Debug, Clone)]
pub struct ChainCredential {
    chain: ChainId,
    address: String,
    signing_handle: SigningHandle,
}

impl ChainCredential {
    pub fn new(chain: ChainId, address: impl Into<String>, signing_handle: SigningHandle) -> Self {
        Self {
            chain,
            address: address.into(),
            signing_handle,
        }
    }

    pub fn chain(&self) -> ChainId {
        self.chain
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn signing_handle(&self) -> &SigningHandle {
        &self.signing_handle
    }
}

/// The three credentials produced from one mnemonic.
#[derive(Debug, Clone)]
pub struct DerivedCredentials {
    pub ethereum: ChainCredential,
    pub solana: ChainCredential,
    pub bitcoin: ChainCredential,
}

// =============================================================================
// Session
// =============================================================================

/// An authenticated wallet: the phrase and its three credentials.
#[derive(Debug)]
pub struct WalletSession {
    id: Uuid,
    mnemonic: Mnemonic,
    ethereum: ChainCredential,
    solana: ChainCredential,
    bitcoin: ChainCredential,
}

impl WalletSession {
    pub fn new(mnemonic: Mnemonic, credentials: DerivedCredentials) -> Self {
        Self {
            id: Uuid::new_v4(),
            mnemonic,
            ethereum: credentials.ethereum,
            solana: credentials.solana,
            bitcoin: credentials.bitcoin,
        }
    }

    /// Random id for log correlation. Not derived from key material.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The phrase, for the "keep it secret" reveal on the dashboard.
    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    pub fn credential(&self, chain: ChainId) -> &ChainCredential {
        match chain {
            ChainId::Ethereum => &self.ethereum,
            ChainId::Solana => &self.solana,
            ChainId::Bitcoin => &self.bitcoin,
        }
    }

    pub fn address(&self, chain: ChainId) -> &str {
        self.credential(chain).address()
    }

    /// Fail with `MalformedSession` unless every slot holds a usable
    /// credential for its own chain.
    pub fn ensure_complete(&self) -> WalletResult<()> {
        for chain in ChainId::ALL {
            let credential = self.credential(chain);
            if credential.chain() != chain {
                return Err(WalletError::malformed_session(format!(
                    "{chain} slot holds a {} credential",
                    credential.chain()
                )));
            }
            if credential.address().trim().is_empty() {
                return Err(WalletError::malformed_session(format!(
                    "{chain} credential has no address"
                )));
            }
            if credential.signing_handle().curve() != Curve::for_chain(chain) {
                return Err(WalletError::malformed_session(format!(
                    "{chain} credential has a {:?} signing handle",
                    credential.signing_handle().curve()
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Balances
// =============================================================================

/// How a chain's entry in a snapshot was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStatus {
    /// The backend answered.
    Fetched,
    /// The backend returned an error.
    Failed,
    /// The backend did not answer within the chain's deadline.
    TimedOut,
    /// No fetch was attempted (malformed session).
    Unavailable,
}

/// One chain's balance within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChainBalance {
    amount: f64,
    status: BalanceStatus,
}

impl ChainBalance {
    pub fn fetched(amount: f64) -> Self {
        Self {
            amount,
            status: BalanceStatus::Fetched,
        }
    }

    /// Zero-valued entry for a chain whose balance is unknown.
    pub fn fallback(status: BalanceStatus) -> Self {
        Self { amount: 0.0, status }
    }

    /// Display amount. Zero whenever the balance is unknown.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn status(&self) -> BalanceStatus {
        self.status
    }

    pub fn is_known(&self) -> bool {
        self.status == BalanceStatus::Fetched
    }
}

/// A consistent read of all three balances from one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSnapshot {
    pub session_id: Uuid,
    pub ethereum: ChainBalance,
    pub solana: ChainBalance,
    pub bitcoin: ChainBalance,
    pub refreshed_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    /// All-zero snapshot used when no fetch could be attempted.
    pub fn unavailable(session_id: Uuid) -> Self {
        let entry = ChainBalance::fallback(BalanceStatus::Unavailable);
        Self {
            session_id,
            ethereum: entry,
            solana: entry,
            bitcoin: entry,
            refreshed_at: Utc::now(),
        }
    }

    pub fn get(&self, chain: ChainId) -> &ChainBalance {
        match chain {
            ChainId::Ethereum => &self.ethereum,
            ChainId::Solana => &self.solana,
            ChainId::Bitcoin => &self.bitcoin,
        }
    }

    /// Display amount for `chain` (zero when unknown).
    pub fn amount(&self, chain: ChainId) -> f64 {
        self.get(chain).amount()
    }

    pub fn status(&self, chain: ChainId) -> BalanceStatus {
        self.get(chain).status()
    }

    /// True when every chain answered.
    pub fn is_complete(&self) -> bool {
        ChainId::ALL.iter().all(|chain| self.get(*chain).is_known())
    }
}
