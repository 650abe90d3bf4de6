//! Chainvault Types - Core type definitions for the Chainvault wallet.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - Supported chains and their native-asset parameters
//! - Addresses (EVM hex with EIP-55 checksum, Solana base58, Tron base58check)
//! - Amounts in base units with exact decimal parsing

pub mod chain;
pub mod address;
pub mod amount;
pub mod error;

#[cfg(feature = "serde")]
mod serialization;

pub use chain::Chain;
pub use address::{Address, EvmAddress, SolanaAddress, TronAddress};
pub use amount::Amount;
pub use error::TypesError;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Address, Amount, Chain, EvmAddress, SolanaAddress, TronAddress, TypesError,
    };
}
