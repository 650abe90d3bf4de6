//! Wallet lifecycle: onboarding, account derivation, PIN management.
//!
//! The mnemonic only exists in plaintext inside [`Mnemonic`] and
//! [`UnlockedVault`] values. The store holds the encrypted blob and the
//! public addresses derived from it, so reading addresses never needs the
//! PIN.

use crate::error::WalletError;
use crate::settings::WalletSettings;
use crate::store::{keys, KeyValueStore};
use crate::unlocked::{ImportedSecret, UnlockedVault};
use crate::validation::validate_pin;
use chainvault_crypto::{
    decrypt_secret, ed25519_for_account, encrypt_secret, secp256k1_for_account, Ed25519Keypair,
    EncryptedSecret, KdfParams, Mnemonic, Secp256k1Keypair,
};
use chainvault_types::{Address, Chain, EvmAddress, SolanaAddress, TronAddress};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use zeroize::Zeroizing;

/// Public addresses of one HD account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAddresses {
    pub index: u32,
    pub evm: EvmAddress,
    pub solana: SolanaAddress,
    pub tron: TronAddress,
}

impl AccountAddresses {
    pub fn derive(mnemonic: &Mnemonic, index: u32) -> Result<Self, WalletError> {
        Ok(Self {
            index,
            evm: secp256k1_for_account(mnemonic, Chain::Evm, index)?.evm_address(),
            solana: ed25519_for_account(mnemonic, index)?.address(),
            tron: secp256k1_for_account(mnemonic, Chain::Tron, index)?.tron_address(),
        })
    }

    pub fn get(&self, chain: Chain) -> Address {
        match chain {
            Chain::Evm => self.evm.into(),
            Chain::Solana => self.solana.into(),
            Chain::Tron => self.tron.into(),
        }
    }

    fn store_entries(&self) -> Vec<(String, String)> {
        Chain::ALL
            .iter()
            .map(|chain| (keys::address(*chain, self.index), self.get(*chain).to_string()))
            .collect()
    }
}

/// Result of [`Vault::create`]. The mnemonic is handed out exactly once for
/// the user to write down.
#[derive(Debug)]
pub struct CreatedWallet {
    pub mnemonic: Mnemonic,
    pub addresses: AccountAddresses,
}

/// A standalone key imported from another wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedAccount {
    pub chain: Chain,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredImportedKey {
    chain: Chain,
    address: String,
    secret: EncryptedSecret,
}

/// PIN-protected wallet over a key-value store.
pub struct Vault<S: KeyValueStore> {
    store: S,
    kdf: KdfParams,
}

impl<S: KeyValueStore> Vault<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            kdf: KdfParams::default(),
        }
    }

    /// Argon2 cost used for newly encrypted blobs. Existing blobs carry
    /// their own parameters.
    pub fn with_kdf_params(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> Result<WalletSettings, WalletError> {
        WalletSettings::load(&self.store)
    }

    pub fn save_settings(&self, settings: &WalletSettings) -> Result<(), WalletError> {
        settings.save(&self.store)
    }

    pub fn is_initialized(&self) -> Result<bool, WalletError> {
        self.store.contains(keys::ENCRYPTED_SEED)
    }

    /// Generate a 24-word wallet, encrypt it under `pin` and store the
    /// addresses of account 0.
    pub fn create(&self, pin: &str) -> Result<CreatedWallet, WalletError> {
        let mnemonic = Mnemonic::generate()?;
        let addresses = self.onboard(&mnemonic, pin)?;
        tracing::info!(evm = %addresses.evm, "Created new wallet");
        Ok(CreatedWallet { mnemonic, addresses })
    }

    /// Restore a wallet from an existing seed phrase.
    pub fn import(&self, phrase: &str, pin: &str) -> Result<AccountAddresses, WalletError> {
        crate::validation::validate_word_count(phrase)?;
        let mnemonic = Mnemonic::parse(phrase)?;
        let addresses = self.onboard(&mnemonic, pin)?;
        tracing::info!(evm = %addresses.evm, words = mnemonic.word_count(), "Imported wallet");
        Ok(addresses)
    }

    fn onboard(&self, mnemonic: &Mnemonic, pin: &str) -> Result<AccountAddresses, WalletError> {
        if self.is_initialized()? {
            return Err(WalletError::AlreadyInitialized);
        }
        validate_pin(pin, self.settings()?.pin_length)?;

        let blob = encrypt_secret(mnemonic.phrase().as_bytes(), pin, &self.kdf)?;
        let addresses = AccountAddresses::derive(mnemonic, 0)?;

        let mut entries = addresses.store_entries();
        entries.push((keys::ENCRYPTED_SEED.to_string(), blob.to_json()?));
        entries.push((keys::ACCOUNTS.to_string(), serde_json::to_string(&[0u32])?));
        self.store.set_many(&entries)?;
        Ok(addresses)
    }

    /// Account indices that have stored addresses, ascending.
    pub fn accounts(&self) -> Result<Vec<u32>, WalletError> {
        match self.store.get(keys::ACCOUNTS)? {
            Some(json) => {
                let mut indices: Vec<u32> = serde_json::from_str(&json)?;
                indices.sort_unstable();
                indices.dedup();
                Ok(indices)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Stored addresses of account `index`. Never decrypts anything.
    pub fn addresses(&self, index: u32) -> Result<AccountAddresses, WalletError> {
        let read = |chain: Chain| -> Result<Address, WalletError> {
            let raw = self
                .store
                .get(&keys::address(chain, index))?
                .ok_or(WalletError::AccountNotFound { chain, index })?;
            Ok(Address::parse_for(chain, &raw)?)
        };
        let (Address::Evm(evm), Address::Solana(solana), Address::Tron(tron)) =
            (read(Chain::Evm)?, read(Chain::Solana)?, read(Chain::Tron)?)
        else {
            return Err(WalletError::Storage(format!("address kinds mismatch for account {}", index)));
        };
        Ok(AccountAddresses {
            index,
            evm,
            solana,
            tron,
        })
    }

    pub fn all_addresses(&self) -> Result<Vec<AccountAddresses>, WalletError> {
        self.accounts()?.into_iter().map(|i| self.addresses(i)).collect()
    }

    /// Derive and persist the next account index.
    pub fn add_account(&self, pin: &str) -> Result<AccountAddresses, WalletError> {
        let mnemonic = self.decrypt_mnemonic(pin)?;
        let mut accounts = self.accounts()?;
        let next = match accounts.last() {
            Some(last) => last
                .checked_add(1)
                .ok_or_else(|| WalletError::Storage("account index exhausted".to_string()))?,
            None => 0,
        };
        let addresses = AccountAddresses::derive(&mnemonic, next)?;
        accounts.push(next);

        let mut entries = addresses.store_entries();
        entries.push((keys::ACCOUNTS.to_string(), serde_json::to_string(&accounts)?));
        self.store.set_many(&entries)?;
        tracing::info!(index = next, "Added account");
        Ok(addresses)
    }

    fn load_blob(&self) -> Result<EncryptedSecret, WalletError> {
        let json = self
            .store
            .get(keys::ENCRYPTED_SEED)?
            .ok_or(WalletError::NotInitialized)?;
        Ok(EncryptedSecret::from_json(&json)?)
    }

    fn decrypt_mnemonic(&self, pin: &str) -> Result<Mnemonic, WalletError> {
        let plaintext = decrypt_secret(&self.load_blob()?, pin)?;
        let phrase = std::str::from_utf8(&plaintext)
            .map_err(|_| WalletError::Storage("encrypted seed is not UTF-8".to_string()))?;
        Ok(Mnemonic::parse(phrase)?)
    }

    /// Decrypt the wallet for signing. The returned handle zeroizes its
    /// secrets on drop and stops signing after the configured lock timeout.
    pub fn unlock(&self, pin: &str) -> Result<UnlockedVault, WalletError> {
        let mnemonic = self.decrypt_mnemonic(pin)?;
        let imported = self
            .load_imported()?
            .into_iter()
            .map(|key| {
                Ok(ImportedSecret {
                    chain: key.chain,
                    address: key.address,
                    secret: decrypt_secret(&key.secret, pin)?,
                })
            })
            .collect::<Result<Vec<_>, WalletError>>()?;
        let timeout = Duration::from_secs(self.settings()?.lock_timeout_secs);
        tracing::debug!(imported = imported.len(), "Wallet unlocked");
        Ok(UnlockedVault::new(mnemonic, imported, timeout))
    }

    /// Decrypt the seed phrase for display.
    pub fn reveal_mnemonic(&self, pin: &str) -> Result<Mnemonic, WalletError> {
        let mnemonic = self.decrypt_mnemonic(pin)?;
        tracing::warn!("Seed phrase revealed");
        Ok(mnemonic)
    }

    /// Re-encrypt the seed and every imported key under `new_pin`.
    pub fn change_pin(&self, old_pin: &str, new_pin: &str) -> Result<(), WalletError> {
        let mnemonic = self.decrypt_mnemonic(old_pin)?;
        validate_pin(new_pin, self.settings()?.pin_length)?;

        let blob = encrypt_secret(mnemonic.phrase().as_bytes(), new_pin, &self.kdf)?;
        let imported = self
            .load_imported()?
            .into_iter()
            .map(|key| {
                let secret = decrypt_secret(&key.secret, old_pin)?;
                Ok(StoredImportedKey {
                    secret: encrypt_secret(&secret, new_pin, &self.kdf)?,
                    ..key
                })
            })
            .collect::<Result<Vec<_>, WalletError>>()?;

        let mut entries = vec![(keys::ENCRYPTED_SEED.to_string(), blob.to_json()?)];
        if !imported.is_empty() {
            entries.push((keys::IMPORTED.to_string(), serde_json::to_string(&imported)?));
        }
        self.store.set_many(&entries)?;
        tracing::info!("PIN changed");
        Ok(())
    }

    /// Remove every wallet entry from the store.
    pub fn reset(&self) -> Result<(), WalletError> {
        let keys = self.store.keys_with_prefix(keys::PREFIX)?;
        self.store.remove_many(&keys)?;
        tracing::warn!(removed = keys.len(), "Wallet reset");
        Ok(())
    }

    /// Import a single private key, encrypted under the wallet PIN.
    ///
    /// EVM and Tron take a 32-byte hex secret; Solana takes the base58
    /// keypair export of common Solana wallets.
    pub fn import_private_key(&self, chain: Chain, secret: &str, pin: &str) -> Result<Address, WalletError> {
        // proves the PIN before anything is written
        self.decrypt_mnemonic(pin)?;

        let (address, raw): (Address, Zeroizing<Vec<u8>>) = match chain {
            Chain::Evm | Chain::Tron => {
                let kp = Secp256k1Keypair::from_hex(secret)?;
                let address = if chain == Chain::Evm {
                    kp.evm_address().into()
                } else {
                    kp.tron_address().into()
                };
                (address, Zeroizing::new(kp.to_bytes().to_vec()))
            }
            Chain::Solana => {
                let kp = Ed25519Keypair::from_base58(secret)?;
                (kp.address().into(), Zeroizing::new(kp.to_bytes().to_vec()))
            }
        };

        let mut imported = self.load_imported()?;
        let address_str = address.to_string();
        imported.retain(|k| !(k.chain == chain && k.address == address_str));
        imported.push(StoredImportedKey {
            chain,
            address: address_str,
            secret: encrypt_secret(&raw, pin, &self.kdf)?,
        });
        self.store.set(keys::IMPORTED, &serde_json::to_string(&imported)?)?;
        tracing::info!(chain = %chain, address = %address, "Imported private key");
        Ok(address)
    }

    pub fn imported_accounts(&self) -> Result<Vec<ImportedAccount>, WalletError> {
        self.load_imported()?
            .into_iter()
            .map(|k| {
                Ok(ImportedAccount {
                    chain: k.chain,
                    address: Address::parse_for(k.chain, &k.address)?,
                })
            })
            .collect()
    }

    fn load_imported(&self) -> Result<Vec<StoredImportedKey>, WalletError> {
        match self.store.get(keys::IMPORTED)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }
}
