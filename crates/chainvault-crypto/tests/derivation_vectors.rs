//! Published derivation vectors and cross-chain derivation properties.

use chainvault_crypto::{
    ed25519_for_account, secp256k1_for_account, CryptoError, HdPath, Mnemonic,
};
use chainvault_types::{Chain, SolanaAddress, TronAddress};
use proptest::prelude::*;

const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon \
                             abandon abandon abandon abandon abandon about";

#[test]
fn test_abandon_about_first_evm_address() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    let kp = secp256k1_for_account(&mnemonic, Chain::Evm, 0).unwrap();
    assert_eq!(
        kp.evm_address().to_string(),
        "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
    );
}

#[test]
fn test_abandon_about_first_solana_address() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    let kp = ed25519_for_account(&mnemonic, 0).unwrap();
    assert_eq!(
        kp.address().to_string(),
        "HAgk14JpMQLgt6rVgv7cBQFJWFto5Dqxi472uT3DKpqk"
    );
}

#[test]
fn test_abandon_about_first_tron_address() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    let kp = secp256k1_for_account(&mnemonic, Chain::Tron, 0).unwrap();
    assert_eq!(
        kp.tron_address().to_string(),
        "TUEZSdKsoDHQMeZwihtdoBiN46zxhGWYdH"
    );
}

#[test]
fn test_evm_and_tron_use_different_paths() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    let evm = secp256k1_for_account(&mnemonic, Chain::Evm, 0).unwrap();
    let tron = secp256k1_for_account(&mnemonic, Chain::Tron, 0).unwrap();
    assert_ne!(evm.evm_address().as_bytes(), tron.tron_address().as_bytes());
}

#[test]
fn test_tron_address_format() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    let tron = secp256k1_for_account(&mnemonic, Chain::Tron, 0).unwrap();
    let encoded = tron.tron_address().to_string();
    assert!(encoded.starts_with('T'));
    assert_eq!(encoded.len(), 34);
    assert_eq!(encoded.parse::<TronAddress>().unwrap(), tron.tron_address());
}

#[test]
fn test_solana_address_is_public_key() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    let kp = ed25519_for_account(&mnemonic, 0).unwrap();
    let parsed: SolanaAddress = kp.address().to_string().parse().unwrap();
    assert_eq!(parsed.as_bytes(), &kp.public_key());
}

#[test]
fn test_solana_requested_through_secp_helper() {
    let mnemonic = Mnemonic::parse(ABANDON_ABOUT).unwrap();
    assert_eq!(
        secp256k1_for_account(&mnemonic, Chain::Solana, 0).unwrap_err(),
        CryptoError::WrongCurve(Chain::Solana)
    );
}

#[test]
fn test_paths_for_chain() {
    assert_eq!(HdPath::for_chain(Chain::Solana, 1).to_string(), "m/44'/501'/1'/0'");
    assert_eq!(HdPath::for_chain(Chain::Tron, 1).to_string(), "m/44'/195'/0'/0/1");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Same mnemonic + path + index always yields the same address
    #[test]
    fn prop_derivation_is_deterministic(entropy in proptest::array::uniform16(any::<u8>()), index in 0u32..8) {
        let m1 = Mnemonic::from_entropy(&entropy).unwrap();
        let m2 = Mnemonic::parse(m1.phrase()).unwrap();

        let a = secp256k1_for_account(&m1, Chain::Evm, index).unwrap();
        let b = secp256k1_for_account(&m2, Chain::Evm, index).unwrap();
        prop_assert_eq!(a.evm_address(), b.evm_address());

        let s1 = ed25519_for_account(&m1, index).unwrap();
        let s2 = ed25519_for_account(&m2, index).unwrap();
        prop_assert_eq!(s1.address(), s2.address());
    }

    #[test]
    fn prop_indices_give_distinct_accounts(entropy in proptest::array::uniform16(any::<u8>())) {
        let m = Mnemonic::from_entropy(&entropy).unwrap();
        let a0 = ed25519_for_account(&m, 0).unwrap();
        let a1 = ed25519_for_account(&m, 1).unwrap();
        prop_assert_ne!(a0.address(), a1.address());
    }
}
