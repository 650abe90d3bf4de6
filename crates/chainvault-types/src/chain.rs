use crate::error::TypesError;
use std::fmt;
use std::str::FromStr;

/// Chains the wallet derives keys for and signs transactions on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Chain {
    /// Ethereum and EVM-compatible networks
    Evm,
    /// Solana
    Solana,
    /// Tron
    Tron,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Evm, Chain::Solana, Chain::Tron];

    /// SLIP-44 coin type used in the BIP44 derivation path
    pub const fn coin_type(&self) -> u32 {
        match self {
            Chain::Evm => 60,
            Chain::Solana => 501,
            Chain::Tron => 195,
        }
    }

    /// Decimals of the native asset (wei, lamports, sun)
    pub const fn native_decimals(&self) -> u8 {
        match self {
            Chain::Evm => 18,
            Chain::Solana => 9,
            Chain::Tron => 6,
        }
    }

    /// Ticker of the native asset
    pub const fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Evm => "ETH",
            Chain::Solana => "SOL",
            Chain::Tron => "TRX",
        }
    }

    /// Stable lowercase identifier, used as storage key segment and in
    /// backend requests
    pub const fn as_str(&self) -> &'static str {
        match self {
            Chain::Evm => "evm",
            Chain::Solana => "solana",
            Chain::Tron => "tron",
        }
    }

    /// Whether keys on this chain live on secp256k1 (as opposed to ed25519)
    pub const fn is_secp256k1(&self) -> bool {
        matches!(self, Chain::Evm | Chain::Tron)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" | "eth" | "ethereum" => Ok(Chain::Evm),
            "solana" | "sol" => Ok(Chain::Solana),
            "tron" | "trx" => Ok(Chain::Tron),
            other => Err(TypesError::UnknownChain(other.to_string())),
        }
    }
}
