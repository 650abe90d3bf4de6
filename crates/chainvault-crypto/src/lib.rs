//! Chainvault Crypto - Key material for the Chainvault wallet.
//!
//! This crate provides:
//! - BIP39 mnemonics (generation, validation, seed derivation)
//! - HD derivation: BIP32 on secp256k1 (EVM, Tron), SLIP-10 on ed25519 (Solana)
//! - Per-chain keypairs and signing
//! - PIN-encrypted secret storage (argon2id + AES-256-GCM)
//! - Hash helpers (keccak256, sha256)

pub mod error;
pub mod hash;
pub mod mnemonic;
pub mod hd;
pub mod keys;
pub mod keystore;

pub use error::CryptoError;
pub use hd::{derive_ed25519, derive_secp256k1, ChildIndex, HdPath};
pub use keys::{
    recover_evm_address, verify_ed25519, Ed25519Keypair, RecoverableSignature, Secp256k1Keypair,
};
pub use keystore::{decrypt_secret, encrypt_secret, EncryptedSecret, KdfParams};
pub use mnemonic::Mnemonic;

use chainvault_types::Chain;
use zeroize::Zeroizing;

/// Derive the secp256k1 keypair for `chain` (EVM or Tron) at `index`.
pub fn secp256k1_for_account(
    mnemonic: &Mnemonic,
    chain: Chain,
    index: u32,
) -> Result<Secp256k1Keypair, CryptoError> {
    let path = match chain {
        Chain::Evm => HdPath::evm(index),
        Chain::Tron => HdPath::tron(index),
        Chain::Solana => return Err(CryptoError::WrongCurve(chain)),
    };
    let seed = mnemonic.to_seed("")?;
    let secret: Zeroizing<[u8; 32]> = derive_secp256k1(&seed[..], &path)?;
    Secp256k1Keypair::from_bytes(&secret)
}

/// Derive the Solana keypair at `index`.
pub fn ed25519_for_account(mnemonic: &Mnemonic, index: u32) -> Result<Ed25519Keypair, CryptoError> {
    let seed = mnemonic.to_seed("")?;
    let secret = derive_ed25519(&seed[..], &HdPath::solana(index))?;
    Ok(Ed25519Keypair::from_seed(&secret))
}
