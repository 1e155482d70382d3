// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SLIP-0010 ed25519 key derivation (hardened-only).
//!
//! BIP-32 does not define ed25519, so Solana keys follow SLIP-0010:
//!
//! ```text
//! master: I = HMAC-SHA512(key = "ed25519 seed", data = seed)
//! child:  I = HMAC-SHA512(key = chain_code, data = 0x00 || key || ser32(i | 2^31))
//! key = I[0..32], chain_code = I[32..64]
//! ```

use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{WalletError, WalletResult};

type HmacSha512 = Hmac<Sha512>;

const HARDENED_OFFSET: u32 = 0x8000_0000;

const MASTER_HMAC_KEY: &[u8] = b"ed25519 seed";

/// Parse `m/44'/501'/0'/0'` into raw indices. Every segment must be hardened.
pub fn parse_hardened_path(path: &str) -> WalletResult<Vec<u32>> {
    let mut segments = path.split('/');
    if segments.next() != Some("m") {
        return Err(WalletError::Internal(format!(
            "derivation path must start with 'm': {path}"
        )));
    }

    segments
        .map(|segment| {
            let raw = segment
                .strip_suffix('\'')
                .or_else(|| segment.strip_suffix('h'))
                .ok_or_else(|| {
                    WalletError::Internal(format!("ed25519 segment must be hardened: {segment}"))
                })?;
            let index: u32 = raw
                .parse()
                .map_err(|_| WalletError::Internal(format!("bad path segment: {segment}")))?;
            if index >= HARDENED_OFFSET {
                return Err(WalletError::Internal(format!(
                    "path index out of range: {segment}"
                )));
            }
            Ok(index)
        })
        .collect()
}

/// Derive the 32-byte ed25519 secret at `path` from a BIP-39 seed.
pub fn derive_ed25519_secret(seed: &[u8], path: &str) -> WalletResult<Zeroizing<[u8; 32]>> {
    let indices = parse_hardened_path(path)?;

    let (mut key, mut chain_code) = split(hmac_sha512(MASTER_HMAC_KEY, seed)?);

    for index in indices {
        let mut data = Zeroizing::new([0u8; 37]);
        data[1..33].copy_from_slice(&key[..]);
        data[33..].copy_from_slice(&(index | HARDENED_OFFSET).to_be_bytes());

        let (child_key, child_chain) = split(hmac_sha512(&chain_code[..], &data[..])?);
        key = child_key;
        chain_code = child_chain;
    }

    Ok(key)
}

fn split(mut i: [u8; 64]) -> (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>) {
    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&i[..32]);
    chain_code.copy_from_slice(&i[32..]);
    i.zeroize();
    (key, chain_code)
}

fn hmac_sha512(key: &[u8], data: &[u8]) -> WalletResult<[u8; 64]> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| WalletError::Internal(format!("HMAC-SHA512 key init failed: {e}")))?;
    mac.update(data);

    let mut output = [0u8; 64];
    output.copy_from_slice(&mac.finalize().into_bytes());
    Ok(output)
}
