//! Chainvault Wallet - on-device wallet state.
//!
//! - [`store`]: string key-value persistence (`MemoryStore`, `FileStore`)
//! - [`vault`]: onboarding, accounts, PIN lifecycle
//! - [`unlocked`]: signing with a decrypted wallet
//! - [`validation`]: form checks that gate user actions
//! - [`settings`]: persisted user preferences

pub mod error;
pub mod settings;
pub mod store;
pub mod unlocked;
pub mod validation;
pub mod vault;

pub use error::WalletError;
pub use settings::{NetworkSettings, WalletSettings};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use unlocked::{Erc20Transfer, EvmTransfer, KeySource, SolTransfer, SplTokenTransfer, UnlockedVault};
pub use vault::{AccountAddresses, CreatedWallet, ImportedAccount, Vault};
