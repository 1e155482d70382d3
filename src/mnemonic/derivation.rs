// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! BIP-39 mnemonic service with per-chain key derivation.
//!
//! | Chain    | Scheme                    | Path               | Address                |
//! |----------|---------------------------|--------------------|------------------------|
//! | Ethereum | BIP-32 secp256k1          | `m/44'/60'/0'/0/0` | EIP-55 `0x…`           |
//! | Solana   | SLIP-0010 ed25519         | `m/44'/501'/0'/0'` | base58 public key      |
//! | Bitcoin  | BIP-32 secp256k1 (BIP-84) | `m/84'/0'/0'/0/0`  | P2WPKH `bc1…`          |
//!
//! The BIP-39 seed uses an empty passphrase.

use std::str::FromStr;

use alloy::signers::local::PrivateKeySigner;
use bip39::Language;
use bitcoin::bip32::{DerivationPath, Xpriv};
use bitcoin::secp256k1::{Secp256k1, SecretKey};
use bitcoin::{Address, CompressedPublicKey, Network};
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use super::{slip10, Mnemonic, MnemonicService};
use crate::blockchain::ChainId;
use crate::error::{WalletError, WalletResult};
use crate::models::{ChainCredential, Curve, DerivedCredentials, SigningHandle};

pub const ETHEREUM_PATH: &str = "m/44'/60'/0'/0/0";
pub const SOLANA_PATH: &str = "m/44'/501'/0'/0'";
pub const BITCOIN_PATH: &str = "m/84'/0'/0'/0/0";

/// 128 bits of entropy encode to 12 BIP-39 words.
const ENTROPY_BYTES: usize = 16;

/// Default [`MnemonicService`]: English BIP-39 wordlist, mainnet addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bip39MnemonicService;

impl Bip39MnemonicService {
    pub fn new() -> Self {
        Self
    }
}

impl MnemonicService for Bip39MnemonicService {
    fn generate(&self) -> WalletResult<Mnemonic> {
        let mut entropy = [0u8; ENTROPY_BYTES];
        OsRng.fill_bytes(&mut entropy);

        let generated = bip39::Mnemonic::from_entropy_in(Language::English, &entropy)
            .map_err(|e| WalletError::Internal(format!("mnemonic generation failed: {e}")));
        entropy.zeroize();

        let phrase = Zeroizing::new(generated?.to_string());
        Mnemonic::parse(&phrase)
    }

    fn derive_credentials(&self, mnemonic: &Mnemonic) -> WalletResult<DerivedCredentials> {
        let parsed = bip39::Mnemonic::parse_in_normalized(Language::English, mnemonic.as_str())
            .map_err(|e| WalletError::invalid_mnemonic(e.to_string()))?;
        let seed = Zeroizing::new(parsed.to_seed(""));

        Ok(DerivedCredentials {
            ethereum: derive_ethereum(&seed[..])?,
            solana: derive_solana(&seed[..])?,
            bitcoin: derive_bitcoin(&seed[..])?,
        })
    }
}

/// BIP-32 secp256k1 private key at `path`.
fn derive_secp256k1(seed: &[u8], path: &str) -> WalletResult<SecretKey> {
    let secp = Secp256k1::new();
    let path = DerivationPath::from_str(path)
        .map_err(|e| WalletError::Internal(format!("bad derivation path {path}: {e}")))?;
    let master = Xpriv::new_master(Network::Bitcoin, seed)
        .map_err(|e| WalletError::Internal(format!("master key derivation failed: {e}")))?;
    let child = master
        .derive_priv(&secp, &path)
        .map_err(|e| WalletError::Internal(format!("child key derivation failed: {e}")))?;
    Ok(child.private_key)
}

fn derive_ethereum(seed: &[u8]) -> WalletResult<ChainCredential> {
    let secret = Zeroizing::new(derive_secp256k1(seed, ETHEREUM_PATH)?.secret_bytes());
    let signer = PrivateKeySigner::from_slice(&secret[..])
        .map_err(|e| WalletError::Internal(format!("invalid ethereum key: {e}")))?;

    Ok(ChainCredential::new(
        ChainId::Ethereum,
        signer.address().to_checksum(None),
        SigningHandle::new(Curve::Secp256k1, *secret),
    ))
}

fn derive_solana(seed: &[u8]) -> WalletResult<ChainCredential> {
    let secret = slip10::derive_ed25519_secret(seed, SOLANA_PATH)?;
    let public = SigningKey::from_bytes(&secret).verifying_key().to_bytes();

    Ok(ChainCredential::new(
        ChainId::Solana,
        bitcoin::base58::encode(&public),
        SigningHandle::new(Curve::Ed25519, *secret),
    ))
}

fn derive_bitcoin(seed: &[u8]) -> WalletResult<ChainCredential> {
    let secp = Secp256k1::new();
    let secret_key = derive_secp256k1(seed, BITCOIN_PATH)?;
    let public_key = CompressedPublicKey(secret_key.public_key(&secp));
    let address = Address::p2wpkh(&public_key, Network::Bitcoin);

    Ok(ChainCredential::new(
        ChainId::Bitcoin,
        address.to_string(),
        SigningHandle::new(Curve::Secp256k1, secret_key.secret_bytes()),
    ))
}
