use crate::chain::Chain;
use crate::error::TypesError;
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// 20-byte EVM account address.
/// Display format: `0x`-prefixed hex with EIP-55 mixed-case checksum.
///
/// # Derivation
/// `address = keccak256(uncompressed_pubkey[1..])[12..32]`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EvmAddress([u8; 20]);

impl EvmAddress {
    pub const ZERO: Self = Self([0u8; 20]);
    pub const LEN: usize = 20;

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Create from a byte slice
    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        let bytes: [u8; 20] = slice.try_into().map_err(|_| TypesError::InvalidAddressLength {
            expected: 20,
            actual: slice.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Derive the address from a 64-byte uncompressed public key
    /// (the SEC1 encoding without its leading `0x04`).
    pub fn from_public_key(pubkey: &[u8; 64]) -> Self {
        let hash = Keccak256::digest(pubkey);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..32]);
        Self(addr)
    }

    pub fn is_zero(&self) -> bool {
        self == &Self::ZERO
    }

    /// Lowercase hex without 0x prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// EIP-55 checksummed form, `0x`-prefixed
    pub fn to_checksum(&self) -> String {
        let lower = self.to_hex();
        let hash = Keccak256::digest(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl fmt::Debug for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvmAddress({})", self.to_checksum())
    }
}

impl FromStr for EvmAddress {
    type Err = TypesError;

    /// Accepts all-lowercase or all-uppercase hex without checksum
    /// validation; mixed case must match EIP-55.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| TypesError::InvalidAddressFormat(s.to_string()))?;
        if body.len() != 40 {
            return Err(TypesError::InvalidAddressLength {
                expected: 40,
                actual: body.len(),
            });
        }
        let bytes = hex::decode(body)?;
        let addr = Self::from_slice(&bytes)?;

        let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
        if has_lower && has_upper && addr.to_checksum()[2..] != *body {
            return Err(TypesError::ChecksumMismatch(s.to_string()));
        }
        Ok(addr)
    }
}

impl AsRef<[u8]> for EvmAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 32-byte Solana account address (an ed25519 public key or a
/// program-derived address). Display format: base58.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SolanaAddress([u8; 32]);

impl SolanaAddress {
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, TypesError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| TypesError::InvalidAddressLength {
            expected: 32,
            actual: slice.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for SolanaAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolanaAddress({})", self.to_base58())
    }
}

impl FromStr for SolanaAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 32 bytes never encode to more than 44 base58 characters
        if s.is_empty() || s.len() > 44 {
            return Err(TypesError::InvalidAddressFormat(s.to_string()));
        }
        let bytes = bs58::decode(s).into_vec()?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for SolanaAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Tron account address: the same 20-byte hash as an EVM address,
/// prefixed with the mainnet version byte `0x41` and base58check encoded.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TronAddress([u8; 20]);

impl TronAddress {
    /// Mainnet address version byte
    pub const PREFIX: u8 = 0x41;

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive from a 64-byte uncompressed secp256k1 public key
    pub fn from_public_key(pubkey: &[u8; 64]) -> Self {
        Self(*EvmAddress::from_public_key(pubkey).as_bytes())
    }

    /// 21-byte form with the version prefix, as used in Tron transactions
    pub fn to_prefixed_bytes(&self) -> [u8; 21] {
        let mut out = [0u8; 21];
        out[0] = Self::PREFIX;
        out[1..].copy_from_slice(&self.0);
        out
    }

    /// Hex form with the `41` prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_prefixed_bytes())
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.to_prefixed_bytes()).with_check().into_string()
    }

    fn from_prefixed(bytes: &[u8]) -> Result<Self, TypesError> {
        if bytes.len() != 21 {
            return Err(TypesError::InvalidAddressLength {
                expected: 21,
                actual: bytes.len(),
            });
        }
        if bytes[0] != Self::PREFIX {
            return Err(TypesError::InvalidChainAddress {
                chain: Chain::Tron,
                reason: format!("unexpected version byte 0x{:02x}", bytes[0]),
            });
        }
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes[1..]);
        Ok(Self(addr))
    }
}

impl From<EvmAddress> for TronAddress {
    fn from(addr: EvmAddress) -> Self {
        Self(*addr.as_bytes())
    }
}

impl fmt::Display for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for TronAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TronAddress({})", self.to_base58())
    }
}

impl FromStr for TronAddress {
    type Err = TypesError;

    /// Accepts base58check (`T...`) or hex with the `41` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with('T') && s.len() == 34 {
            let bytes = bs58::decode(s).with_check(None).into_vec().map_err(|e| {
                TypesError::ChecksumMismatch(format!("{}: {}", s, e))
            })?;
            Self::from_prefixed(&bytes)
        } else if s.len() == 42 && s.starts_with("41") {
            let bytes = hex::decode(s)?;
            Self::from_prefixed(&bytes)
        } else {
            Err(TypesError::InvalidAddressFormat(s.to_string()))
        }
    }
}

/// An address on any supported chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Address {
    Evm(EvmAddress),
    Solana(SolanaAddress),
    Tron(TronAddress),
}

impl Address {
    /// Parse `s` as an address of `chain`.
    pub fn parse_for(chain: Chain, s: &str) -> Result<Self, TypesError> {
        let s = s.trim();
        let wrap = |e: TypesError| TypesError::InvalidChainAddress {
            chain,
            reason: e.to_string(),
        };
        match chain {
            Chain::Evm => s.parse().map(Address::Evm).map_err(wrap),
            Chain::Solana => s.parse().map(Address::Solana).map_err(wrap),
            Chain::Tron => s.parse().map(Address::Tron).map_err(wrap),
        }
    }

    pub fn chain(&self) -> Chain {
        match self {
            Address::Evm(_) => Chain::Evm,
            Address::Solana(_) => Chain::Solana,
            Address::Tron(_) => Chain::Tron,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Evm(a) => a.fmt(f),
            Address::Solana(a) => a.fmt(f),
            Address::Tron(a) => a.fmt(f),
        }
    }
}

impl From<EvmAddress> for Address {
    fn from(a: EvmAddress) -> Self {
        Address::Evm(a)
    }
}

impl From<SolanaAddress> for Address {
    fn from(a: SolanaAddress) -> Self {
        Address::Solana(a)
    }
}

impl From<TronAddress> for Address {
    fn from(a: TronAddress) -> Self {
        Address::Tron(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EIP55_VECTORS: [&str; 4] = [
        "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
        "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
        "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
        "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
    ];

    #[test]
    fn test_eip55_checksum_vectors() {
        for vector in EIP55_VECTORS {
            let lower = vector.to_lowercase();
            let addr: EvmAddress = lower.parse().unwrap();
            assert_eq!(addr.to_checksum(), vector);
            assert_eq!(vector.parse::<EvmAddress>().unwrap(), addr);
        }
    }

    #[test]
    fn test_evm_bad_checksum_rejected() {
        // Flip the case of one letter in a valid checksummed address
        let bad = "0x5AAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert!(matches!(
            bad.parse::<EvmAddress>(),
            Err(TypesError::ChecksumMismatch(_))
        ));
    }

    #[test]
    fn test_evm_address_invalid() {
        assert!("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".parse::<EvmAddress>().is_err());
        assert!("0x1234".parse::<EvmAddress>().is_err());
        assert!("0xzzzzb6053f3e94c9b9a09f33669435e7ef1beaed".parse::<EvmAddress>().is_err());
    }

    #[test]
    fn test_solana_system_program_address() {
        let addr = SolanaAddress::from_bytes([0u8; 32]);
        assert_eq!(addr.to_string(), "11111111111111111111111111111111");
        let parsed: SolanaAddress = "11111111111111111111111111111111".parse().unwrap();
        assert_eq!(parsed, addr);
    }

    #[test]
    fn test_solana_address_wrong_length() {
        // 0x00 0x01 decodes to two bytes
        assert!("12".parse::<SolanaAddress>().is_err());
        assert!("0OIl".parse::<SolanaAddress>().is_err());
    }

    #[test]
    fn test_tron_usdt_contract_address() {
        let addr: TronAddress = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".parse().unwrap();
        assert_eq!(addr.to_hex(), "41a614f803b6fd780986a42c78ec9c7f77e6ded13c");

        let from_hex: TronAddress = "41a614f803b6fd780986a42c78ec9c7f77e6ded13c".parse().unwrap();
        assert_eq!(from_hex.to_base58(), "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t");
    }

    #[test]
    fn test_tron_corrupted_checksum() {
        assert!("TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6u".parse::<TronAddress>().is_err());
    }

    #[test]
    fn test_tron_shares_evm_hash() {
        let evm = EvmAddress::from_bytes([7u8; 20]);
        let tron = TronAddress::from(evm);
        assert_eq!(tron.as_bytes(), evm.as_bytes());
        assert!(tron.to_base58().starts_with('T'));
    }

    #[test]
    fn test_parse_for_chain() {
        let a = Address::parse_for(Chain::Evm, " 0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed ").unwrap();
        assert_eq!(a.chain(), Chain::Evm);

        let err = Address::parse_for(Chain::Solana, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert!(matches!(err, Err(TypesError::InvalidChainAddress { chain: Chain::Solana, .. })));

        let t = Address::parse_for(Chain::Tron, "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t").unwrap();
        assert_eq!(t.to_string(), "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t");
    }
}
