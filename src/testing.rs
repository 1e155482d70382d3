// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::blockchain::{BalanceClient, ChainClientError, ChainId};
use crate::error::WalletResult;
use crate::mnemonic::{Bip39MnemonicService, Mnemonic, MnemonicService};
use crate::models::{ChainCredential, Curve, DerivedCredentials, SigningHandle, WalletSession};

/// BIP-39 test vector with well-known addresses.
pub const TEST_MNEMONIC: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

pub fn logged_in_session() -> WalletSession {
    let mnemonic = Mnemonic::parse(TEST_MNEMONIC).unwrap();
    let credentials = Bip39MnemonicService::new()
        .derive_credentials(&mnemonic)
        .unwrap();
    WalletSession::new(mnemonic, credentials)
}

/// A session whose Solana credential has no address.
pub fn malformed_session() -> WalletSession {
    let mnemonic = Mnemonic::parse(TEST_MNEMONIC).unwrap();
    let mut credentials = Bip39MnemonicService::new()
        .derive_credentials(&mnemonic)
        .unwrap();
    credentials.solana = blank_solana();
    WalletSession::new(mnemonic, credentials)
}

fn blank_solana() -> ChainCredential {
    ChainCredential::new(
        ChainId::Solana,
        "",
        SigningHandle::new(Curve::Ed25519, [7u8; 32]),
    )
}

// =============================================================================
// Balance client
// =============================================================================

/// Balance client with a fixed outcome and latency, counting what happened
/// to each fetch.
pub struct ScriptedClient {
    chain: ChainId,
    outcome: Mutex<Result<f64, ChainClientError>>,
    delay: Duration,
    started: AtomicUsize,
    completed: AtomicUsize,
    cancelled: AtomicUsize,
}

impl ScriptedClient {
    fn new(chain: ChainId, outcome: Result<f64, ChainClientError>, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            chain,
            outcome: Mutex::new(outcome),
            delay: Duration::from_millis(delay_ms),
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
        })
    }

    pub fn ok(chain: ChainId, amount: f64, delay_ms: u64) -> Arc<Self> {
        Self::new(chain, Ok(amount), delay_ms)
    }

    pub fn failing(chain: ChainId, delay_ms: u64) -> Arc<Self> {
        Self::new(
            chain,
            Err(ChainClientError::Network("connection refused".to_string())),
            delay_ms,
        )
    }

    pub fn set_amount(&self, amount: f64) {
        *self.outcome.lock().unwrap() = Ok(amount);
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Fetches dropped before they finished.
    pub fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Counts a fetch as cancelled if dropped while still armed.
struct CancelGuard<'a> {
    counter: &'a AtomicUsize,
    armed: bool,
}

impl Drop for CancelGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl BalanceClient for ScriptedClient {
    fn chain(&self) -> ChainId {
        self.chain
    }

    async fn fetch_balance(&self, _address: &str) -> Result<f64, ChainClientError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let mut guard = CancelGuard {
            counter: &self.cancelled,
            armed: true,
        };

        tokio::time::sleep(self.delay).await;

        guard.armed = false;
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().unwrap().clone()
    }
}

// =============================================================================
// Mnemonic service
// =============================================================================

/// Wraps the real service and counts calls. Can be told to lose the Solana
/// credential to simulate a broken derivation.
pub struct CountingMnemonicService {
    inner: Bip39MnemonicService,
    drop_solana: bool,
    generate_calls: AtomicUsize,
    derive_calls: AtomicUsize,
}

impl CountingMnemonicService {
    pub fn new() -> Self {
        Self {
            inner: Bip39MnemonicService::new(),
            drop_solana: false,
            generate_calls: AtomicUsize::new(0),
            derive_calls: AtomicUsize::new(0),
        }
    }

    pub fn dropping_solana() -> Self {
        Self {
            drop_solana: true,
            ..Self::new()
        }
    }

    pub fn generate_calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn derive_calls(&self) -> usize {
        self.derive_calls.load(Ordering::SeqCst)
    }
}

impl MnemonicService for CountingMnemonicService {
    fn generate(&self) -> WalletResult<Mnemonic> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.generate()
    }

    fn derive_credentials(&self, mnemonic: &Mnemonic) -> WalletResult<DerivedCredentials> {
        self.derive_calls.fetch_add(1, Ordering::SeqCst);
        let mut credentials = self.inner.derive_credentials(mnemonic)?;
        if self.drop_solana {
            credentials.solana = blank_solana();
        }
        Ok(credentials)
    }
}

/// Real derivation that parks on a gate until [`Self::release`], so a test
/// can act while a login is mid-derivation.
pub struct GatedMnemonicService {
    inner: Bip39MnemonicService,
    entered: tokio::sync::Notify,
    release_tx: Mutex<Option<mpsc::Sender<()>>>,
    release_rx: Mutex<mpsc::Receiver<()>>,
}

impl GatedMnemonicService {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            inner: Bip39MnemonicService::new(),
            entered: tokio::sync::Notify::new(),
            release_tx: Mutex::new(Some(tx)),
            release_rx: Mutex::new(rx),
        }
    }

    /// Resolves once a derivation has started and is waiting on the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let every waiting and future derivation through.
    pub fn release(&self) {
        self.release_tx.lock().unwrap().take();
    }
}

impl MnemonicService for GatedMnemonicService {
    fn generate(&self) -> WalletResult<Mnemonic> {
        self.inner.generate()
    }

    fn derive_credentials(&self, mnemonic: &Mnemonic) -> WalletResult<DerivedCredentials> {
        self.entered.notify_one();
        // Returns Err once the sender is dropped by `release`.
        let _ = self.release_rx.lock().unwrap().recv();
        self.inner.derive_credentials(mnemonic)
    }
}
