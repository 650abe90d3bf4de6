use crate::chain::Chain;
use thiserror::Error;

/// Errors that can occur in type operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesError {
    #[error("Invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("Invalid address length: expected {expected}, got {actual}")]
    InvalidAddressLength { expected: usize, actual: usize },

    #[error("Address checksum mismatch: {0}")]
    ChecksumMismatch(String),

    #[error("Invalid {chain} address: {reason}")]
    InvalidChainAddress { chain: Chain, reason: String },

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Too many decimal places: max {max}, got {actual}")]
    TooManyDecimals { max: u8, actual: usize },

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid base58: {0}")]
    InvalidBase58(String),
}

impl From<hex::FromHexError> for TypesError {
    fn from(e: hex::FromHexError) -> Self {
        TypesError::InvalidHex(e.to_string())
    }
}

impl From<bs58::decode::Error> for TypesError {
    fn from(e: bs58::decode::Error) -> Self {
        TypesError::InvalidBase58(e.to_string())
    }
}
