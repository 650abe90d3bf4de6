use chainvault_crypto::CryptoError;
use chainvault_tx::TxError;
use chainvault_types::{Chain, TypesError};
use thiserror::Error;

/// Errors surfaced by wallet operations. Messages are shown to the user
/// as-is.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WalletError {
    #[error("Wallet is not set up yet")]
    NotInitialized,

    #[error("A wallet already exists on this device")]
    AlreadyInitialized,

    #[error("Incorrect PIN")]
    InvalidPin,

    #[error("PIN must be exactly {expected} digits")]
    InvalidPinFormat { expected: usize },

    #[error("PINs do not match")]
    PinMismatch,

    #[error("Invalid seed phrase: {0}")]
    InvalidSeedPhrase(String),

    #[error("Seed phrase must have 12, 15, 18, 21 or 24 words, got {0}")]
    InvalidWordCount(usize),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Cannot send to your own address")]
    SelfTransfer,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient {asset} balance: need {needed}, have {available}")]
    InsufficientBalance {
        asset: String,
        needed: u128,
        available: u128,
    },

    #[error("No {chain} address stored for account {index}")]
    AccountNotFound { chain: Chain, index: u32 },

    #[error("No imported key for {0}")]
    ImportedKeyNotFound(String),

    #[error("Wallet is locked")]
    Locked,

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),

    #[error("Transaction error: {0}")]
    Transaction(TxError),

    #[error("Crypto error: {0}")]
    Crypto(CryptoError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<CryptoError> for WalletError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidPin => WalletError::InvalidPin,
            CryptoError::InvalidMnemonic(msg) => WalletError::InvalidSeedPhrase(msg),
            CryptoError::InvalidWordCount(n) => WalletError::InvalidWordCount(n),
            other => WalletError::Crypto(other),
        }
    }
}

impl From<TxError> for WalletError {
    fn from(e: TxError) -> Self {
        match e {
            TxError::InsufficientBalance {
                asset,
                needed,
                available,
            } => WalletError::InsufficientBalance {
                asset,
                needed,
                available,
            },
            TxError::ZeroAmount => WalletError::InvalidAmount("amount must be greater than zero".to_string()),
            TxError::Crypto(c) => c.into(),
            other => WalletError::Transaction(other),
        }
    }
}

impl From<TypesError> for WalletError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InvalidAmount(_)
            | TypesError::TooManyDecimals { .. }
            | TypesError::AmountOverflow => WalletError::InvalidAmount(e.to_string()),
            other => WalletError::InvalidAddress(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(e: serde_json::Error) -> Self {
        WalletError::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for WalletError {
    fn from(e: std::io::Error) -> Self {
        WalletError::Storage(e.to_string())
    }
}
