//! BIP39 mnemonic handling.
//!
//! Wallets created here always get 24 words (256 bits of entropy). Imports
//! accept every word count BIP39 defines. The phrase is held in a zeroizing
//! buffer and is never printed by `Debug`.

use crate::error::CryptoError;
use bip39::Language;
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroizing;

/// Word count of freshly generated mnemonics
pub const GENERATED_WORD_COUNT: usize = 24;

/// Word counts accepted on import
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

/// A validated English BIP39 mnemonic.
pub struct Mnemonic {
    phrase: Zeroizing<String>,
}

impl Mnemonic {
    /// Generate a new 24-word mnemonic from OS entropy.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut entropy = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut entropy[..]);
        Self::from_entropy(&entropy[..])
    }

    /// Build a mnemonic from raw entropy (16, 20, 24, 28 or 32 bytes).
    pub fn from_entropy(entropy: &[u8]) -> Result<Self, CryptoError> {
        let inner = bip39::Mnemonic::from_entropy_in(Language::English, entropy)
            .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
        Ok(Self {
            phrase: Zeroizing::new(inner.to_string()),
        })
    }

    /// Parse and validate a user-supplied phrase.
    ///
    /// Whitespace and case are normalised first. The word count is checked
    /// before the words themselves so the user gets the more useful error.
    pub fn parse(phrase: &str) -> Result<Self, CryptoError> {
        let normalized = Zeroizing::new(normalize(phrase));
        let count = word_count(&normalized);
        if !VALID_WORD_COUNTS.contains(&count) {
            return Err(CryptoError::InvalidWordCount(count));
        }
        bip39::Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
        Ok(Self { phrase: normalized })
    }

    /// The normalised phrase (CAUTION: sensitive)
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.phrase)
    }

    /// BIP39 seed (PBKDF2-HMAC-SHA512, 2048 rounds, salt "mnemonic" + passphrase)
    pub fn to_seed(&self, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, CryptoError> {
        let inner = bip39::Mnemonic::parse_in_normalized(Language::English, &self.phrase)
            .map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))?;
        Ok(Zeroizing::new(inner.to_seed_normalized(passphrase)))
    }
}

impl fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mnemonic({} words)", self.word_count())
    }
}

impl Clone for Mnemonic {
    fn clone(&self) -> Self {
        Self {
            phrase: self.phrase.clone(),
        }
    }
}

/// Count words the same way `parse` does, for form validation before a full
/// parse.
pub fn word_count(phrase: &str) -> usize {
    phrase.split_whitespace().count()
}

fn normalize(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
