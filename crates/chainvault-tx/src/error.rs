use chainvault_crypto::CryptoError;
use thiserror::Error;

/// Errors that can occur while building or signing transactions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TxError {
    #[error("Insufficient {asset} balance: need {needed}, have {available}")]
    InsufficientBalance {
        asset: String,
        needed: u128,
        available: u128,
    },

    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Amount {amount} is below the rent-exempt minimum {minimum} for a new account")]
    BelowRentExemption { amount: u64, minimum: u64 },

    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error("Fee estimate invalid: {0}")]
    InvalidFeeEstimate(String),

    #[error("Too many accounts in message: {0}")]
    TooManyAccounts(usize),

    #[error("Missing signer for {0}")]
    MissingSigner(String),

    #[error("No valid program address found")]
    NoProgramAddress,

    #[error("Seed too long: max 32 bytes, got {0}")]
    SeedTooLong(usize),

    #[error("Transaction id mismatch: node sent {claimed}, raw data hashes to {computed}")]
    TxIdMismatch { claimed: String, computed: String },

    #[error("Transaction is not owned by {0}")]
    OwnerMismatch(String),

    #[error("Transaction does not match the requested transfer: {0}")]
    IntentMismatch(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl From<hex::FromHexError> for TxError {
    fn from(e: hex::FromHexError) -> Self {
        TxError::InvalidTransaction(format!("invalid hex: {}", e))
    }
}
