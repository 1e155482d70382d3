// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Multichain Wallet - Wallet Session Core
//!
//! Non-custodial wallet core: a single BIP-39 phrase yields Ethereum, Solana
//! and Bitcoin credentials, and a session manager keeps an aggregated balance
//! snapshot fresh while the wallet is logged in.
//!
//! ## Modules
//!
//! - `mnemonic` - Phrase generation, validation and per-chain key derivation
//! - `blockchain` - Balance clients (Ethereum JSON-RPC, Solana JSON-RPC, Esplora)
//! - `aggregator` - Concurrent per-chain fetches with deadlines and fallbacks
//! - `session` - Login/logout state machine and the published snapshot
//! - `refresher` - Periodic background refresh for a logged-in session
//! - `config` - Environment configuration
//! - `logging` - Tracing subscriber setup

pub mod aggregator;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod mnemonic;
pub mod models;
pub mod refresher;
pub mod session;
pub mod state;

#[cfg(test)]
mod testing;

pub use aggregator::{AggregatorConfig, BalanceAggregator};
pub use error::{WalletError, WalletResult};
pub use mnemonic::{Bip39MnemonicService, Mnemonic, MnemonicService};
pub use models::{BalanceSnapshot, BalanceStatus, ChainBalance, WalletSession};
pub use session::SessionManager;
pub use state::SessionStatus;
