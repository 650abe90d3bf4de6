use crate::error::CryptoError;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use argon2::Argon2;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

const VERSION: u32 = 1;
const CIPHER: &str = "aes-256-gcm";
const KDF: &str = "argon2id";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

// Upper bounds accepted from a stored blob
const MAX_MEMORY_COST: u32 = 1024 * 1024; // 1 GiB in KiB
const MAX_TIME_COST: u32 = 16;
const MAX_PARALLELISM: u32 = 16;

/// PIN-encrypted secret (a mnemonic phrase or an imported private key).
/// Uses argon2id for key derivation, AES-256-GCM for encryption.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EncryptedSecret {
    pub version: u32,  // 1
    pub id: String,    // UUID
    pub crypto: SecretCrypto,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SecretCrypto {
    pub cipher: String,         // "aes-256-gcm"
    pub ciphertext: String,     // hex
    pub cipherparams: CipherParams,
    pub kdf: String,            // "argon2id"
    pub kdfparams: StoredKdfParams,
    pub mac: String,            // hex, blake3(derived_key[16..32] || ciphertext)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CipherParams {
    pub iv: String,  // hex, 12 bytes nonce
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredKdfParams {
    pub salt: String,           // hex, 16 bytes
    pub parallelism: u32,
    pub memory_cost: u32,       // KiB
    pub time_cost: u32,
    pub output_len: u32,        // 32
}

/// Argon2id cost parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB
    pub memory_cost: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, 4 lanes
    fn default() -> Self {
        Self {
            memory_cost: 65536,
            time_cost: 3,
            parallelism: 4,
        }
    }
}

impl KdfParams {
    /// Cheap profile for constrained devices and test suites.
    pub const fn light() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, CryptoError> {
        let params = argon2::Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
        Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
    }
}

fn derive_key(pin: &str, salt: &[u8], params: &KdfParams) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    params
        .argon2()?
        .hash_password_into(pin.as_bytes(), salt, key.as_mut_slice())
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    Ok(key)
}

fn compute_mac(derived_key: &[u8; KEY_LEN], ciphertext: &[u8]) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&derived_key[16..32]);
    hasher.update(ciphertext);
    hasher.finalize()
}

/// Encrypt `plaintext` under a key derived from `pin`.
pub fn encrypt_secret(
    plaintext: &[u8],
    pin: &str,
    params: &KdfParams,
) -> Result<EncryptedSecret, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let derived_key = derive_key(pin, &salt, params)?;

    let key: &Key<Aes256Gcm> = Key::<Aes256Gcm>::from_slice(derived_key.as_slice());
    let cipher = Aes256Gcm::new(key);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(format!("{:?}", e)))?;

    let mac = compute_mac(&derived_key, &ciphertext);

    tracing::debug!(
        memory_cost = params.memory_cost,
        time_cost = params.time_cost,
        "Encrypted secret"
    );

    Ok(EncryptedSecret {
        version: VERSION,
        id: uuid::Uuid::new_v4().to_string(),
        crypto: SecretCrypto {
            cipher: CIPHER.to_string(),
            ciphertext: hex::encode(&ciphertext),
            cipherparams: CipherParams {
                iv: hex::encode(nonce_bytes),
            },
            kdf: KDF.to_string(),
            kdfparams: StoredKdfParams {
                salt: hex::encode(salt),
                parallelism: params.parallelism,
                memory_cost: params.memory_cost,
                time_cost: params.time_cost,
                output_len: KEY_LEN as u32,
            },
            mac: mac.to_hex().to_string(),
        },
    })
}

/// Decrypt a secret with a PIN.
///
/// A wrong PIN is detected through the MAC and reported as
/// [`CryptoError::InvalidPin`] before any decryption is attempted.
pub fn decrypt_secret(blob: &EncryptedSecret, pin: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if blob.version != VERSION {
        return Err(CryptoError::KeystoreError(format!(
            "Unsupported keystore version: {}",
            blob.version
        )));
    }
    if blob.crypto.cipher != CIPHER || blob.crypto.kdf != KDF {
        return Err(CryptoError::KeystoreError(format!(
            "Unsupported scheme: {}/{}",
            blob.crypto.cipher, blob.crypto.kdf
        )));
    }
    let kdf = &blob.crypto.kdfparams;
    if kdf.output_len as usize != KEY_LEN {
        return Err(CryptoError::KeystoreError(format!(
            "Invalid key length: {}",
            kdf.output_len
        )));
    }
    if kdf.memory_cost > MAX_MEMORY_COST || kdf.time_cost > MAX_TIME_COST || kdf.parallelism > MAX_PARALLELISM {
        return Err(CryptoError::KeystoreError(format!(
            "KDF cost out of range: m={} t={} p={}",
            kdf.memory_cost, kdf.time_cost, kdf.parallelism
        )));
    }

    let salt = hex::decode(&kdf.salt)
        .map_err(|_| CryptoError::KeystoreError("Invalid salt".to_string()))?;
    let ciphertext = hex::decode(&blob.crypto.ciphertext)
        .map_err(|_| CryptoError::KeystoreError("Invalid ciphertext".to_string()))?;
    let nonce_bytes = hex::decode(&blob.crypto.cipherparams.iv)
        .map_err(|_| CryptoError::KeystoreError("Invalid IV".to_string()))?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(CryptoError::KeystoreError("Invalid IV".to_string()));
    }
    let actual_mac = blake3::Hash::from_hex(&blob.crypto.mac)
        .map_err(|_| CryptoError::KeystoreError("Invalid MAC".to_string()))?;

    let params = KdfParams {
        memory_cost: kdf.memory_cost,
        time_cost: kdf.time_cost,
        parallelism: kdf.parallelism,
    };
    let derived_key = derive_key(pin, &salt, &params)?;

    // blake3::Hash equality is constant-time
    if compute_mac(&derived_key, &ciphertext) != actual_mac {
        return Err(CryptoError::InvalidPin);
    }

    let key: &Key<Aes256Gcm> = Key::<Aes256Gcm>::from_slice(derived_key.as_slice());
    let cipher = Aes256Gcm::new(key);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| CryptoError::DecryptionFailed("Decryption failed".to_string()))?;

    Ok(Zeroizing::new(plaintext))
}

impl EncryptedSecret {
    pub fn to_json(&self) -> Result<String, CryptoError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(json)
            .map_err(|e| CryptoError::KeystoreError(format!("Parse error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIN: &str = "123456";

    #[test]
    fn test_encrypt_decrypt_secret() {
        let secret = b"abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let blob = encrypt_secret(secret, PIN, &KdfParams::light()).unwrap();

        let decrypted = decrypt_secret(&blob, PIN).unwrap();
        assert_eq!(decrypted.as_slice(), secret.as_slice());
    }

    #[test]
    fn test_decrypt_wrong_pin() {
        let blob = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        assert_eq!(decrypt_secret(&blob, "654321").unwrap_err(), CryptoError::InvalidPin);
    }

    #[test]
    fn test_tampered_ciphertext_detected() {
        let mut blob = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        let mut ct = hex::decode(&blob.crypto.ciphertext).unwrap();
        ct[0] ^= 0x01;
        blob.crypto.ciphertext = hex::encode(ct);
        // The MAC covers the ciphertext, so tampering reads as a bad PIN
        assert!(decrypt_secret(&blob, PIN).is_err());
    }

    #[test]
    fn test_tampered_nonce_fails_decryption() {
        let mut blob = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        blob.crypto.cipherparams.iv = hex::encode([0u8; NONCE_LEN]);
        assert!(matches!(
            decrypt_secret(&blob, PIN),
            Err(CryptoError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_fresh_salt_and_nonce_each_time() {
        let a = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        let b = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        assert_ne!(a.crypto.kdfparams.salt, b.crypto.kdfparams.salt);
        assert_ne!(a.crypto.ciphertext, b.crypto.ciphertext);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_json_roundtrip_then_decrypt() {
        let blob = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        let json = blob.to_json().unwrap();
        let parsed = EncryptedSecret::from_json(&json).unwrap();
        assert_eq!(parsed, blob);
        assert_eq!(decrypt_secret(&parsed, PIN).unwrap().as_slice(), b"seed");
    }

    #[test]
    fn test_unsupported_version() {
        let mut blob = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        blob.version = 2;
        assert!(matches!(
            decrypt_secret(&blob, PIN),
            Err(CryptoError::KeystoreError(_))
        ));
    }

    #[test]
    fn test_excessive_kdf_cost_refused() {
        let mut blob = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        blob.crypto.kdfparams.memory_cost = u32::MAX;
        assert!(matches!(
            decrypt_secret(&blob, PIN),
            Err(CryptoError::KeystoreError(_))
        ));

        let mut blob = encrypt_secret(b"seed", PIN, &KdfParams::light()).unwrap();
        blob.crypto.kdfparams.time_cost = 1_000;
        assert!(matches!(
            decrypt_secret(&blob, PIN),
            Err(CryptoError::KeystoreError(_))
        ));
    }

    #[test]
    fn test_from_json_invalid() {
        assert!(EncryptedSecret::from_json("invalid json").is_err());
    }

    #[test]
    fn test_default_params_match_interactive_profile() {
        let p = KdfParams::default();
        assert_eq!((p.memory_cost, p.time_cost, p.parallelism), (65536, 3, 4));
    }
}
