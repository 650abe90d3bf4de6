//! Onboarding through signing against a file-backed store.

use chainvault_crypto::KdfParams;
use chainvault_tx::Eip1559Fees;
use chainvault_types::{Chain, EvmAddress};
use chainvault_wallet::store::keys;
use chainvault_wallet::{
    EvmTransfer, FileStore, KeySource, KeyValueStore, Vault, WalletError, WalletSettings,
};
use std::sync::Arc;
use tempfile::TempDir;

const PIN: &str = "482913";

fn open(dir: &TempDir) -> Vault<FileStore> {
    let store = FileStore::open(dir.path().join("wallet.json")).unwrap();
    Vault::new(store).with_kdf_params(KdfParams::light())
}

#[test]
fn test_create_reopen_unlock_sign() {
    let dir = TempDir::new().unwrap();
    let created = {
        let vault = open(&dir);
        vault.create(PIN).unwrap()
    };
    assert_eq!(created.mnemonic.word_count(), 24);

    // a fresh process sees the same wallet without the PIN
    let vault = open(&dir);
    assert!(vault.is_initialized().unwrap());
    assert_eq!(vault.addresses(0).unwrap(), created.addresses);

    let unlocked = vault.unlock(PIN).unwrap();
    let addr = unlocked.address(Chain::Evm, &KeySource::Account(0)).unwrap();
    assert_eq!(addr, created.addresses.get(Chain::Evm));

    let signed = unlocked
        .sign_evm_transfer(
            &KeySource::Account(0),
            &EvmTransfer {
                chain_id: 1,
                nonce: 0,
                to: EvmAddress::from_bytes([9u8; 20]),
                value: 1,
                gas_limit: 21_000,
                fees: Eip1559Fees {
                    max_fee_per_gas: 1,
                    max_priority_fee_per_gas: 1,
                },
                balance: 21_001,
            },
        )
        .unwrap();
    assert!(signed.raw_hex().starts_with("0x02"));
}

#[test]
fn test_store_file_never_contains_plaintext_seed() {
    let dir = TempDir::new().unwrap();
    let vault = open(&dir);
    let created = vault.create(PIN).unwrap();

    let on_disk = std::fs::read_to_string(dir.path().join("wallet.json")).unwrap();
    assert!(!on_disk.contains(created.mnemonic.phrase()));
    assert!(on_disk.contains(keys::ENCRYPTED_SEED));
}

#[test]
fn test_pin_length_follows_settings() {
    let dir = TempDir::new().unwrap();
    let vault = open(&dir);
    let mut settings = WalletSettings::default();
    settings.set_field("pin_length", "4").unwrap();
    vault.save_settings(&settings).unwrap();

    assert_eq!(
        vault.create(PIN).map(|_| ()),
        Err(WalletError::InvalidPinFormat { expected: 4 })
    );
    assert!(vault.create("1234").is_ok());
}

#[test]
fn test_shared_store_between_vault_handles() {
    let store = Arc::new(chainvault_wallet::MemoryStore::new());
    let a = Vault::new(Arc::clone(&store)).with_kdf_params(KdfParams::light());
    let b = Vault::new(Arc::clone(&store)).with_kdf_params(KdfParams::light());

    a.create(PIN).unwrap();
    let added = b.add_account(PIN).unwrap();
    assert_eq!(added.index, 1);
    assert_eq!(a.accounts().unwrap(), vec![0, 1]);
    assert!(store.get(&keys::address(Chain::Solana, 1)).unwrap().is_some());
}

#[test]
fn test_reset_then_reimport() {
    let dir = TempDir::new().unwrap();
    let vault = open(&dir);
    let created = vault.create(PIN).unwrap();
    let phrase = created.mnemonic.phrase().to_string();

    vault.reset().unwrap();
    assert!(!vault.is_initialized().unwrap());

    let restored = vault.import(&phrase, "000111").unwrap();
    assert_eq!(restored, created.addresses);
}
