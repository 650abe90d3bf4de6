//! Persistent key-value storage of wallet strings.
//!
//! Everything the wallet persists is a string under a `wallet.` key: the
//! encrypted seed blob, derived addresses, the account list, imported keys
//! and settings. Plaintext secrets are never written.

use crate::error::WalletError;
use chainvault_types::Chain;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Well-known store keys
pub mod keys {
    use chainvault_types::Chain;

    pub const PREFIX: &str = "wallet.";
    pub const ENCRYPTED_SEED: &str = "wallet.encrypted_seed";
    pub const ACCOUNTS: &str = "wallet.accounts";
    pub const IMPORTED: &str = "wallet.imported";
    pub const SETTINGS: &str = "wallet.settings";

    /// `wallet.address.<chain>.<index>`
    pub fn address(chain: Chain, index: u32) -> String {
        format!("wallet.address.{}.{}", chain, index)
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError>;

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError>;

    fn remove(&self, key: &str) -> Result<(), WalletError>;

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, WalletError>;

    /// Write several entries. Implementations that persist should do so once.
    fn set_many(&self, entries: &[(String, String)]) -> Result<(), WalletError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several keys, persisting at most once.
    fn remove_many(&self, keys: &[String]) -> Result<(), WalletError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> Result<bool, WalletError> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), WalletError> {
        (**self).remove(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, WalletError> {
        (**self).keys_with_prefix(prefix)
    }

    fn set_many(&self, entries: &[(String, String)]) -> Result<(), WalletError> {
        (**self).set_many(entries)
    }

    fn remove_many(&self, keys: &[String]) -> Result<(), WalletError> {
        (**self).remove_many(keys)
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), WalletError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, WalletError> {
        Ok(prefixed(&self.entries.read(), prefix))
    }
}

/// JSON file store. The whole map is rewritten through a temporary file in
/// the same directory and atomically renamed over the target.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, WalletError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)
                    .map_err(|e| WalletError::Storage(format!("corrupt store {}: {}", path.display(), e)))?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened wallet store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), WalletError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let json = serde_json::to_string_pretty(entries)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| WalletError::Storage(e.error.to_string()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, WalletError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WalletError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), WalletError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, WalletError> {
        Ok(prefixed(&self.entries.lock(), prefix))
    }

    fn set_many(&self, batch: &[(String, String)]) -> Result<(), WalletError> {
        let mut entries = self.entries.lock();
        for (key, value) in batch {
            entries.insert(key.clone(), value.clone());
        }
        self.persist(&entries)
    }

    fn remove_many(&self, keys: &[String]) -> Result<(), WalletError> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        for key in keys {
            entries.remove(key);
        }
        if entries.len() != before {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

fn prefixed(entries: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
    entries
        .range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, _)| k.clone())
        .collect()
}

/// Parse a stored address key back into `(chain, index)`.
pub fn parse_address_key(key: &str) -> Option<(Chain, u32)> {
    let rest = key.strip_prefix("wallet.address.")?;
    let (chain, index) = rest.split_once('.')?;
    Some((chain.parse().ok()?, index.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_address_key_format() {
        assert_eq!(keys::address(Chain::Evm, 0), "wallet.address.evm.0");
        assert_eq!(keys::address(Chain::Solana, 12), "wallet.address.solana.12");
        assert_eq!(parse_address_key("wallet.address.tron.3"), Some((Chain::Tron, 3)));
        assert_eq!(parse_address_key("wallet.accounts"), None);
        assert_eq!(parse_address_key("wallet.address.doge.1"), None);
    }

    #[test]
    fn test_memory_store_basic() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("wallet.a", "1").unwrap();
        store.set("wallet.b", "2").unwrap();
        store.set("other", "3").unwrap();
        assert_eq!(store.get("wallet.a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.keys_with_prefix(keys::PREFIX).unwrap(), vec!["wallet.a", "wallet.b"]);

        store.remove("wallet.a").unwrap();
        assert!(!store.contains("wallet.a").unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set(keys::ACCOUNTS, "[0]").unwrap();
        store
            .set_many(&[
                (keys::address(Chain::Evm, 0), "0xabc".to_string()),
                (keys::address(Chain::Tron, 0), "Tabc".to_string()),
            ])
            .unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(keys::ACCOUNTS).unwrap().as_deref(), Some("[0]"));
        assert_eq!(reopened.keys_with_prefix("wallet.address.").unwrap().len(), 2);
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn test_file_store_remove_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).unwrap();
        store.set("wallet.x", "1").unwrap();
        store.remove("wallet.x").unwrap();
        store.remove("wallet.missing").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.get("wallet.x").unwrap().is_none());
    }

    #[test]
    fn test_file_store_remove_many() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        let store = FileStore::open(&path).unwrap();
        store
            .set_many(&[
                ("wallet.a".to_string(), "1".to_string()),
                ("wallet.b".to_string(), "2".to_string()),
                ("other".to_string(), "3".to_string()),
            ])
            .unwrap();
        let keys = store.keys_with_prefix(keys::PREFIX).unwrap();
        store.remove_many(&keys).unwrap();
        store.remove_many(&["wallet.missing".to_string()]).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.keys_with_prefix(keys::PREFIX).unwrap().is_empty());
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(WalletError::Storage(_))));
    }

    #[test]
    fn test_arc_store_shares_state() {
        let store = Arc::new(MemoryStore::new());
        let clone = Arc::clone(&store);
        clone.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }
}
