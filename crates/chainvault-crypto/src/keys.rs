use crate::error::CryptoError;
use crate::hash::keccak256;
use chainvault_types::{EvmAddress, SolanaAddress, TronAddress};
use ed25519_dalek::{Signer, Verifier};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use std::fmt;
use zeroize::Zeroizing;

/// secp256k1 ECDSA signature with its public-key recovery id.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// 0 or 1
    pub recovery_id: u8,
}

impl RecoverableSignature {
    /// `r || s || recovery_id`, the layout Tron expects
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.recovery_id;
        out
    }

    /// `r || s || (27 + recovery_id)`, the layout of EVM personal signatures
    pub fn to_eth_bytes(&self) -> [u8; 65] {
        let mut out = self.to_bytes();
        out[64] += 27;
        out
    }

    fn to_k256(self) -> Result<(Signature, RecoveryId), CryptoError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let sig = Signature::from_slice(&rs)?;
        let recid = RecoveryId::from_byte(self.recovery_id).ok_or(CryptoError::InvalidSignature)?;
        Ok((sig, recid))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecoverableSignature(0x{}..., v={})", hex::encode(&self.r[..8]), self.recovery_id)
    }
}

/// secp256k1 keypair used for EVM and Tron accounts.
/// The signing key zeroizes its scalar on drop.
pub struct Secp256k1Keypair {
    signing_key: SigningKey,
}

impl Secp256k1Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Create from a 32-byte private scalar
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_slice(secret).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Parse a hex private key, with or without `0x`
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(
            hex::decode(s.trim().trim_start_matches("0x")).map_err(|_| CryptoError::InvalidPrivateKey)?,
        );
        let secret: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidPrivateKey)?;
        let secret = Zeroizing::new(secret);
        Self::from_bytes(&secret)
    }

    /// Uncompressed public key without the SEC1 `0x04` prefix
    pub fn public_key(&self) -> [u8; 64] {
        uncompressed(self.signing_key.verifying_key())
    }

    pub fn evm_address(&self) -> EvmAddress {
        EvmAddress::from_public_key(&self.public_key())
    }

    pub fn tron_address(&self) -> TronAddress {
        TronAddress::from_public_key(&self.public_key())
    }

    /// Sign a 32-byte digest (RFC 6979 nonce, low-s normalised).
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> Result<RecoverableSignature, CryptoError> {
        let (sig, recid) = self.signing_key.sign_prehash_recoverable(digest)?;
        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(RecoverableSignature {
            r,
            s,
            recovery_id: recid.to_byte(),
        })
    }

    /// EIP-191 `personal_sign`: keccak256("\x19Ethereum Signed Message:\n" + len + message)
    pub fn sign_personal_message(&self, message: &[u8]) -> Result<RecoverableSignature, CryptoError> {
        self.sign_prehash(&personal_message_hash(message))
    }

    /// Export private key bytes (CAUTION: sensitive)
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        let mut out = Zeroizing::new([0u8; 32]);
        out.copy_from_slice(&self.signing_key.to_bytes());
        out
    }
}

impl fmt::Debug for Secp256k1Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secp256k1Keypair({})", self.evm_address())
    }
}

impl Clone for Secp256k1Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
        }
    }
}

/// Digest signed by `personal_sign`
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut data = format!("\x19Ethereum Signed Message:\n{}", message.len()).into_bytes();
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Recover the EVM address that produced `signature` over `digest`.
pub fn recover_evm_address(
    digest: &[u8; 32],
    signature: &RecoverableSignature,
) -> Result<EvmAddress, CryptoError> {
    let (sig, recid) = signature.to_k256()?;
    let vk = VerifyingKey::recover_from_prehash(digest, &sig, recid)
        .map_err(|_| CryptoError::VerificationFailed)?;
    Ok(EvmAddress::from_public_key(&uncompressed(&vk)))
}

fn uncompressed(vk: &VerifyingKey) -> [u8; 64] {
    let point = vk.to_encoded_point(false);
    let mut out = [0u8; 64];
    // SEC1 uncompressed encoding is 0x04 || x || y
    out.copy_from_slice(&point.as_bytes()[1..]);
    out
}

/// Ed25519 keypair used for Solana accounts.
/// Private key is zeroized on drop.
pub struct Ed25519Keypair {
    signing_key: ed25519_dalek::SigningKey,
}

impl Ed25519Keypair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create from a 32-byte seed
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(seed),
        }
    }

    /// Import a secret in the form Solana wallets export it: base58 of
    /// the 64-byte `secret || public` keypair. A bare 32-byte seed is also
    /// accepted.
    pub fn from_base58(s: &str) -> Result<Self, CryptoError> {
        let raw = Zeroizing::new(
            bs58::decode(s.trim())
                .into_vec()
                .map_err(|_| CryptoError::InvalidPrivateKey)?,
        );
        match raw.len() {
            64 => {
                let mut bytes = Zeroizing::new([0u8; 64]);
                bytes.copy_from_slice(&raw);
                let signing_key = ed25519_dalek::SigningKey::from_keypair_bytes(&bytes)
                    .map_err(|_| CryptoError::InvalidPrivateKey)?;
                Ok(Self { signing_key })
            }
            32 => {
                let mut seed = Zeroizing::new([0u8; 32]);
                seed.copy_from_slice(&raw);
                Ok(Self::from_seed(&seed))
            }
            _ => Err(CryptoError::InvalidPrivateKey),
        }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn address(&self) -> SolanaAddress {
        SolanaAddress::from_bytes(self.public_key())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Export private key bytes (CAUTION: sensitive)
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes())
    }

    /// Base58 `secret || public` export (CAUTION: sensitive)
    pub fn to_base58(&self) -> Zeroizing<String> {
        let bytes = Zeroizing::new(self.signing_key.to_keypair_bytes());
        Zeroizing::new(bs58::encode(bytes.as_slice()).into_string())
    }
}

impl fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ed25519Keypair({})", self.address())
    }
}

impl Clone for Ed25519Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.to_bytes())
    }
}

/// Verify an ed25519 signature.
pub fn verify_ed25519(
    public_key: &[u8; 32],
    message: &[u8],
    signature: &[u8; 64],
) -> Result<(), CryptoError> {
    let pk = ed25519_dalek::VerifyingKey::from_bytes(public_key)?;
    let sig = ed25519_dalek::Signature::from_bytes(signature);
    pk.verify(message, &sig)?;
    Ok(())
}
