use crate::error::WalletError;
use crate::store::{keys, KeyValueStore};
use crate::validation::DEFAULT_PIN_LENGTH;
use chainvault_tx::FeeSpeed;
use serde::{Deserialize, Serialize};

/// Network selection per chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// EIP-155 chain id used when signing EVM transactions
    pub evm_chain_id: u64,
    pub solana_cluster: String,
    pub tron_network: String,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            evm_chain_id: 1,
            solana_cluster: "mainnet-beta".to_string(),
            tron_network: "mainnet".to_string(),
        }
    }
}

/// User preferences persisted under `wallet.settings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSettings {
    /// Fiat currency for portfolio valuation (lowercase ISO code)
    pub currency: String,
    pub fee_speed: FeeSpeed,
    pub default_account: u32,
    /// Seconds an unlocked vault stays usable
    pub lock_timeout_secs: u64,
    pub pin_length: usize,
    pub network: NetworkSettings,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            fee_speed: FeeSpeed::Standard,
            default_account: 0,
            lock_timeout_secs: 300,
            pin_length: DEFAULT_PIN_LENGTH,
            network: NetworkSettings::default(),
        }
    }
}

impl WalletSettings {
    /// Keys accepted by [`WalletSettings::set_field`]
    pub const FIELDS: &'static [&'static str] = &[
        "currency",
        "fee_speed",
        "default_account",
        "lock_timeout_secs",
        "pin_length",
        "network.evm_chain_id",
        "network.solana_cluster",
        "network.tron_network",
    ];

    /// Load settings, falling back to defaults when none are stored.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, WalletError> {
        match store.get(keys::SETTINGS)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Self::default()),
        }
    }

    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<(), WalletError> {
        store.set(keys::SETTINGS, &serde_json::to_string(self)?)
    }

    /// Update one field from its string form.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), WalletError> {
        let invalid = |e: &dyn std::fmt::Display| WalletError::Serialization(format!("{}: {}", key, e));
        match key {
            "currency" => {
                let code = value.trim().to_ascii_lowercase();
                if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(invalid(&"expected a 3-letter currency code"));
                }
                self.currency = code;
            }
            "fee_speed" => self.fee_speed = value.parse().map_err(|e| invalid(&e))?,
            "default_account" => self.default_account = value.parse().map_err(|e| invalid(&e))?,
            "lock_timeout_secs" => self.lock_timeout_secs = value.parse().map_err(|e| invalid(&e))?,
            "pin_length" => {
                let len: usize = value.parse().map_err(|e| invalid(&e))?;
                if !(4..=12).contains(&len) {
                    return Err(invalid(&"PIN length must be between 4 and 12"));
                }
                self.pin_length = len;
            }
            "network.evm_chain_id" => self.network.evm_chain_id = value.parse().map_err(|e| invalid(&e))?,
            "network.solana_cluster" => self.network.solana_cluster = value.to_string(),
            "network.tron_network" => self.network.tron_network = value.to_string(),
            other => return Err(WalletError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_defaults_when_missing() {
        let store = MemoryStore::new();
        let settings = WalletSettings::load(&store).unwrap();
        assert_eq!(settings, WalletSettings::default());
        assert_eq!(settings.pin_length, 6);
        assert_eq!(settings.network.evm_chain_id, 1);
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let mut settings = WalletSettings::default();
        settings.set_field("currency", "EUR").unwrap();
        settings.set_field("fee_speed", "fast").unwrap();
        settings.set_field("network.evm_chain_id", "137").unwrap();
        settings.save(&store).unwrap();

        let loaded = WalletSettings::load(&store).unwrap();
        assert_eq!(loaded.currency, "eur");
        assert_eq!(loaded.fee_speed, FeeSpeed::Fast);
        assert_eq!(loaded.network.evm_chain_id, 137);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let store = MemoryStore::new();
        store.set(keys::SETTINGS, r#"{"currency":"gbp"}"#).unwrap();
        let loaded = WalletSettings::load(&store).unwrap();
        assert_eq!(loaded.currency, "gbp");
        assert_eq!(loaded.lock_timeout_secs, 300);
    }

    #[test]
    fn test_set_field_rejects_bad_values() {
        let mut settings = WalletSettings::default();
        assert!(settings.set_field("currency", "euro").is_err());
        assert!(settings.set_field("pin_length", "3").is_err());
        assert!(settings.set_field("default_account", "-1").is_err());
        assert_eq!(
            settings.set_field("theme", "dark"),
            Err(WalletError::UnknownSetting("theme".to_string()))
        );
        for field in WalletSettings::FIELDS {
            assert!(!matches!(
                settings.clone().set_field(field, "x"),
                Err(WalletError::UnknownSetting(_))
            ));
        }
    }
}
