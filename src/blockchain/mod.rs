// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain balance clients.
//!
//! One independent adapter per chain, no shared state between them:
//! - `ethereum` - native ETH via JSON-RPC (alloy)
//! - `solana` - native SOL via JSON-RPC `getBalance`
//! - `esplora` - confirmed BTC via an Esplora REST API

pub mod client;
pub mod esplora;
pub mod ethereum;
pub mod solana;
pub mod types;

pub use client::{BalanceClient, ChainClientError};
pub use esplora::BitcoinClient;
pub use ethereum::EthereumClient;
pub use solana::SolanaClient;
pub use types::*;
