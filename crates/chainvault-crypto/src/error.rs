use chainvault_types::Chain;
use thiserror::Error;

/// Errors that can occur in cryptographic operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid private key")]
    InvalidPrivateKey,

    #[error("Signature verification failed")]
    VerificationFailed,

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Invalid seed phrase: {0}")]
    InvalidMnemonic(String),

    #[error("Invalid word count: expected one of 12, 15, 18, 21 or 24, got {0}")]
    InvalidWordCount(usize),

    #[error("Invalid derivation path: {0}")]
    InvalidPath(String),

    #[error("Non-hardened derivation is not defined for ed25519 (segment {0})")]
    NonHardenedEd25519(u32),

    #[error("Chain {0} uses a different curve")]
    WrongCurve(Chain),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Keystore error: {0}")]
    KeystoreError(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

// Also covers `k256::ecdsa::Error`: both are `signature::Error`
impl From<ed25519_dalek::SignatureError> for CryptoError {
    fn from(_: ed25519_dalek::SignatureError) -> Self {
        CryptoError::InvalidSignature
    }
}

impl From<bip32::Error> for CryptoError {
    fn from(e: bip32::Error) -> Self {
        CryptoError::KeyDerivationFailed(e.to_string())
    }
}

impl From<serde_json::Error> for CryptoError {
    fn from(e: serde_json::Error) -> Self {
        CryptoError::Serialization(e.to_string())
    }
}
