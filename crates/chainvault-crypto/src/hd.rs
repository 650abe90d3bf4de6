//! Hierarchical deterministic key derivation.
//!
//! secp256k1 chains (EVM, Tron) use BIP32 via the `bip32` crate. Solana
//! uses SLIP-10 over ed25519, which only defines hardened children.

use crate::error::CryptoError;
use chainvault_types::Chain;
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, Zeroizing};

type HmacSha512 = Hmac<Sha512>;

const HARDENED_BIT: u32 = 0x8000_0000;
const ED25519_CURVE_KEY: &[u8] = b"ed25519 seed";

/// One segment of a derivation path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChildIndex {
    index: u32,
    hardened: bool,
}

impl ChildIndex {
    pub fn normal(index: u32) -> Result<Self, CryptoError> {
        Self::checked(index, false)
    }

    pub fn hardened(index: u32) -> Result<Self, CryptoError> {
        Self::checked(index, true)
    }

    fn checked(index: u32, hardened: bool) -> Result<Self, CryptoError> {
        if index & HARDENED_BIT != 0 {
            return Err(CryptoError::InvalidPath(format!("index {} out of range", index)));
        }
        Ok(Self { index, hardened })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn is_hardened(&self) -> bool {
        self.hardened
    }

    /// Index as serialized in derivation (hardened bit set when hardened)
    pub fn raw(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_BIT
        } else {
            self.index
        }
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// A derivation path such as `m/44'/60'/0'/0/0`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HdPath {
    segments: Vec<ChildIndex>,
}

impl HdPath {
    /// `m/44'/60'/0'/0/{index}`
    pub fn evm(index: u32) -> Self {
        Self::bip44_external(Chain::Evm, index)
    }

    /// `m/44'/195'/0'/0/{index}`
    pub fn tron(index: u32) -> Self {
        Self::bip44_external(Chain::Tron, index)
    }

    /// `m/44'/501'/{index}'/0'`, the layout used by common Solana wallets.
    pub fn solana(index: u32) -> Self {
        let index = index & !HARDENED_BIT;
        Self {
            segments: vec![
                ChildIndex { index: 44, hardened: true },
                ChildIndex { index: Chain::Solana.coin_type(), hardened: true },
                ChildIndex { index, hardened: true },
                ChildIndex { index: 0, hardened: true },
            ],
        }
    }

    /// Default path of `chain` for account `index`
    pub fn for_chain(chain: Chain, index: u32) -> Self {
        match chain {
            Chain::Evm => Self::evm(index),
            Chain::Tron => Self::tron(index),
            Chain::Solana => Self::solana(index),
        }
    }

    fn bip44_external(chain: Chain, index: u32) -> Self {
        let index = index & !HARDENED_BIT;
        Self {
            segments: vec![
                ChildIndex { index: 44, hardened: true },
                ChildIndex { index: chain.coin_type(), hardened: true },
                ChildIndex { index: 0, hardened: true },
                ChildIndex { index: 0, hardened: false },
                ChildIndex { index, hardened: false },
            ],
        }
    }

    pub fn segments(&self) -> &[ChildIndex] {
        &self.segments
    }
}

impl fmt::Display for HdPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for seg in &self.segments {
            write!(f, "/{}", seg)?;
        }
        Ok(())
    }
}

impl FromStr for HdPath {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        if parts.next() != Some("m") {
            return Err(CryptoError::InvalidPath(s.to_string()));
        }
        let mut segments = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix(['\'', 'h', 'H']) {
                Some(d) => (d, true),
                None => (part, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| CryptoError::InvalidPath(s.to_string()))?;
            segments.push(ChildIndex::checked(index, hardened)?);
        }
        Ok(Self { segments })
    }
}

/// BIP32 derivation of a secp256k1 private key.
pub fn derive_secp256k1(seed: &[u8], path: &HdPath) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let bip32_path: bip32::DerivationPath = path
        .to_string()
        .parse()
        .map_err(|e: bip32::Error| CryptoError::InvalidPath(e.to_string()))?;
    let xprv = bip32::XPrv::derive_from_path(seed, &bip32_path)?;
    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&xprv.private_key().to_bytes());
    Ok(out)
}

/// SLIP-10 derivation of an ed25519 private key (hardened segments only).
pub fn derive_ed25519(seed: &[u8], path: &HdPath) -> Result<Zeroizing<[u8; 32]>, CryptoError> {
    let (mut key, mut chain_code) = slip10_master(seed)?;
    for seg in path.segments() {
        if !seg.is_hardened() {
            return Err(CryptoError::NonHardenedEd25519(seg.index()));
        }
        let (k, c) = slip10_child(&key, &chain_code, seg.raw())?;
        key = k;
        chain_code = c;
    }
    Ok(key)
}

type KeyAndChainCode = (Zeroizing<[u8; 32]>, Zeroizing<[u8; 32]>);

fn slip10_master(seed: &[u8]) -> Result<KeyAndChainCode, CryptoError> {
    let mut mac = HmacSha512::new_from_slice(ED25519_CURVE_KEY)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    mac.update(seed);
    Ok(split_hmac(mac))
}

fn slip10_child(key: &[u8; 32], chain_code: &[u8; 32], raw_index: u32) -> Result<KeyAndChainCode, CryptoError> {
    let mut mac = HmacSha512::new_from_slice(chain_code)
        .map_err(|e| CryptoError::KeyDerivationFailed(e.to_string()))?;
    mac.update(&[0u8]);
    mac.update(key);
    mac.update(&raw_index.to_be_bytes());
    Ok(split_hmac(mac))
}

fn split_hmac(mac: HmacSha512) -> KeyAndChainCode {
    let mut i = mac.finalize().into_bytes();
    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&i[..32]);
    chain_code.copy_from_slice(&i[32..]);
    i.as_mut_slice().zeroize();
    (key, chain_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_paths() {
        assert_eq!(HdPath::evm(0).to_string(), "m/44'/60'/0'/0/0");
        assert_eq!(HdPath::tron(3).to_string(), "m/44'/195'/0'/0/3");
        assert_eq!(HdPath::solana(2).to_string(), "m/44'/501'/2'/0'");
    }

    #[test]
    fn test_path_parse_roundtrip() {
        let p: HdPath = "m/44h/60H/0'/0/7".parse().unwrap();
        assert_eq!(p, HdPath::evm(7));
        assert_eq!(p.to_string().parse::<HdPath>().unwrap(), p);
    }

    #[test]
    fn test_path_parse_invalid() {
        assert!("44'/60'".parse::<HdPath>().is_err());
        assert!("m/abc".parse::<HdPath>().is_err());
        assert!("m/2147483648".parse::<HdPath>().is_err());
        assert!("m/1''".parse::<HdPath>().is_err());
    }

    #[test]
    fn test_master_path_parses_empty() {
        let p: HdPath = "m".parse().unwrap();
        assert!(p.segments().is_empty());
    }

    // SLIP-0010 test vector 1 for ed25519
    #[test]
    fn test_slip10_vector_1() {
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();

        let (key, chain_code) = slip10_master(&seed).unwrap();
        assert_eq!(
            hex::encode(key.as_slice()),
            "2b4be7f19ee27bbf30c667b642d5f4aa69fd169872f8fc3059c08ebae2eb19e7"
        );
        assert_eq!(
            hex::encode(chain_code.as_slice()),
            "90046a93de5380a72b5e45010748567d5ea02bbf6522f979e05c0d8d8ca9fffb"
        );

        let child = derive_ed25519(&seed, &"m/0'".parse().unwrap()).unwrap();
        assert_eq!(
            hex::encode(child.as_slice()),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
    }

    #[test]
    fn test_ed25519_rejects_normal_segment() {
        let seed = [1u8; 64];
        let err = derive_ed25519(&seed, &HdPath::evm(0)).unwrap_err();
        assert_eq!(err, CryptoError::NonHardenedEd25519(0));
    }

    #[test]
    fn test_secp256k1_distinct_indices() {
        let seed = [9u8; 64];
        let a = derive_secp256k1(&seed, &HdPath::evm(0)).unwrap();
        let b = derive_secp256k1(&seed, &HdPath::evm(1)).unwrap();
        let a2 = derive_secp256k1(&seed, &HdPath::evm(0)).unwrap();
        assert_ne!(a.as_slice(), b.as_slice());
        assert_eq!(a.as_slice(), a2.as_slice());
    }
}
