// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Mnemonic phrases and the service that turns them into credentials.
//!
//! [`Mnemonic::parse`] is the structural gate (exactly 12 whitespace-separated
//! words). Wordlist and checksum validation belong to the
//! [`MnemonicService`], which the session manager only calls with phrases that
//! already passed the structural check.

pub mod derivation;
pub mod slip10;

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{WalletError, WalletResult};
use crate::models::DerivedCredentials;

pub use derivation::Bip39MnemonicService;

/// A 12-word phrase, normalized to single spaces. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Mnemonic(String);

impl Mnemonic {
    pub const WORD_COUNT: usize = 12;

    /// Structural check only: trims the input and requires exactly
    /// [`Self::WORD_COUNT`] non-empty tokens.
    pub fn parse(phrase: &str) -> WalletResult<Self> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.len() != Self::WORD_COUNT {
            return Err(WalletError::WrongWordCount { found: words.len() });
        }
        Ok(Self(words.join(" ")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ')
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mnemonic(<redacted>)")
    }
}

/// Generates phrases and derives per-chain credentials from them.
///
/// Implementations must be deterministic in `derive_credentials`: the same
/// phrase always yields the same addresses, which is what makes recovery work.
pub trait MnemonicService: Send + Sync {
    /// A fresh phrase from a cryptographically secure entropy source.
    fn generate(&self) -> WalletResult<Mnemonic>;

    /// Fails with `InvalidMnemonic` when the wordlist or checksum rejects
    /// the phrase.
    fn derive_credentials(&self, mnemonic: &Mnemonic) -> WalletResult<DerivedCredentials>;
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn parse_normalizes_whitespace() {
        let padded = format!("  {}\n", TEST_MNEMONIC.replace(' ', "   "));
        let mnemonic = Mnemonic::parse(&padded).unwrap();
        assert_eq!(mnemonic.as_str(), TEST_MNEMONIC);
        assert_eq!(mnemonic.words().count(), 12);
    }

    #[test]
    fn parse_rejects_wrong_word_counts() {
        let eleven = TEST_MNEMONIC.rsplit_once(' ').unwrap().0;
        assert!(matches!(
            Mnemonic::parse(eleven),
            Err(WalletError::WrongWordCount { found: 11 })
        ));

        let thirteen = format!("{TEST_MNEMONIC} about");
        assert!(matches!(
            Mnemonic::parse(&thirteen),
            Err(WalletError::WrongWordCount { found: 13 })
        ));

        assert!(matches!(
            Mnemonic::parse("   "),
            Err(WalletError::WrongWordCount { found: 0 })
        ));
    }

    #[test]
    fn debug_does_not_leak_words() {
        let mnemonic = Mnemonic::parse(TEST_MNEMONIC).unwrap();
        assert!(!format!("{mnemonic:?}").contains("abandon"));
    }
}
