//! Action-tagged request bodies and their typed responses.
//!
//! Every request is a JSON object whose `action` field selects the
//! operation, e.g. `{"action":"get_balance","chain":"evm","address":"0x.."}`.

use crate::error::ClientError;
use chainvault_tx::{FeeEstimate, UnsignedTronTransaction};
use chainvault_types::{Amount, Chain};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    GetBalance {
        chain: Chain,
        address: String,
    },
    GetTokenBalances {
        chain: Chain,
        address: String,
    },
    GetHistory {
        chain: Chain,
        address: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        limit: Option<u32>,
    },
    EstimateFees {
        chain: Chain,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        chain_id: Option<u64>,
    },
    EstimateGas {
        chain_id: u64,
        from: String,
        to: String,
        /// `0x`-prefixed call data
        data: String,
        /// Decimal wei
        value: String,
    },
    GetPrices {
        symbols: Vec<String>,
        currency: String,
    },
    GetNonce {
        chain_id: u64,
        address: String,
    },
    GetRecentBlockhash,
    AccountExists {
        address: String,
    },
    BuildTronTransfer {
        owner: String,
        to: String,
        /// Sun
        amount: u64,
    },
    BuildTrc20Transfer {
        owner: String,
        contract: String,
        function_selector: String,
        /// Hex ABI-encoded arguments
        parameter: String,
        fee_limit: u64,
    },
    Broadcast {
        chain: Chain,
        /// Hex (EVM), base64 (Solana) or JSON (Tron) signed transaction
        signed_tx: String,
    },
}

impl Action {
    /// Backend function serving this action
    pub fn function(&self) -> &'static str {
        match self {
            Action::GetBalance { .. } | Action::GetTokenBalances { .. } => "wallet-balance",
            Action::GetHistory { .. } => "wallet-history",
            Action::GetPrices { .. } => "crypto-prices",
            Action::Broadcast { .. } => "wallet-broadcast",
            Action::EstimateFees { .. }
            | Action::EstimateGas { .. }
            | Action::GetNonce { .. }
            | Action::GetRecentBlockhash
            | Action::AccountExists { .. }
            | Action::BuildTronTransfer { .. }
            | Action::BuildTrc20Transfer { .. } => "wallet-rpc",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::GetBalance { .. } => "get_balance",
            Action::GetTokenBalances { .. } => "get_token_balances",
            Action::GetHistory { .. } => "get_history",
            Action::EstimateFees { .. } => "estimate_fees",
            Action::EstimateGas { .. } => "estimate_gas",
            Action::GetPrices { .. } => "get_prices",
            Action::GetNonce { .. } => "get_nonce",
            Action::GetRecentBlockhash => "get_recent_blockhash",
            Action::AccountExists { .. } => "account_exists",
            Action::BuildTronTransfer { .. } => "build_tron_transfer",
            Action::BuildTrc20Transfer { .. } => "build_trc20_transfer",
            Action::Broadcast { .. } => "broadcast",
        }
    }
}

/// Accept integers either as JSON numbers or decimal strings.
fn u128_from_str_or_num<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }
    match Raw::deserialize(d)? {
        Raw::Num(n) => Ok(n as u128),
        Raw::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid integer: {}", s))),
    }
}

/// Token decimals, bounded so amounts stay representable.
fn token_decimals<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let decimals = u8::deserialize(d)?;
    if decimals > Amount::MAX_DECIMALS {
        return Err(serde::de::Error::custom(format!(
            "unsupported decimals: {}",
            decimals
        )));
    }
    Ok(decimals)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalanceResponse {
    /// Base units
    #[serde(deserialize_with = "u128_from_str_or_num")]
    pub balance: u128,
    #[serde(deserialize_with = "token_decimals")]
    pub decimals: u8,
    pub symbol: String,
}

impl BalanceResponse {
    pub fn amount(&self) -> Amount {
        Amount::from_base_units(self.balance, self.decimals)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenBalance {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    /// Contract address (EVM, Tron) or mint (Solana)
    pub contract: String,
    #[serde(deserialize_with = "u128_from_str_or_num")]
    pub balance: u128,
    #[serde(deserialize_with = "token_decimals")]
    pub decimals: u8,
    /// Owning token program for Solana mints
    #[serde(default)]
    pub token_program: Option<String>,
}

impl TokenBalance {
    pub fn amount(&self) -> Amount {
        Amount::from_base_units(self.balance, self.decimals)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HistoryEntry {
    pub hash: String,
    pub from: String,
    pub to: String,
    #[serde(deserialize_with = "u128_from_str_or_num")]
    pub amount: u128,
    #[serde(deserialize_with = "token_decimals")]
    pub decimals: u8,
    pub symbol: String,
    /// Unix seconds
    pub timestamp: i64,
    pub status: TxStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriorityFees {
    #[serde(deserialize_with = "u128_from_str_or_num")]
    pub slow: u128,
    #[serde(deserialize_with = "u128_from_str_or_num")]
    pub standard: u128,
    #[serde(deserialize_with = "u128_from_str_or_num")]
    pub fast: u128,
}

/// EVM fee data in wei
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EvmFeeResponse {
    #[serde(deserialize_with = "u128_from_str_or_num")]
    pub base_fee_per_gas: u128,
    pub priority_fees: PriorityFees,
}

impl From<EvmFeeResponse> for FeeEstimate {
    fn from(r: EvmFeeResponse) -> Self {
        FeeEstimate {
            base_fee_per_gas: r.base_fee_per_gas,
            slow_priority_fee: r.priority_fees.slow,
            standard_priority_fee: r.priority_fees.standard,
            fast_priority_fee: r.priority_fees.fast,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SolanaFeeResponse {
    #[serde(default)]
    pub compute_unit_price_micro_lamports: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PricesResponse {
    pub currency: String,
    /// Uppercase symbol to unit price
    pub prices: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NonceResponse {
    pub nonce: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GasResponse {
    pub gas: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockhashResponse {
    pub blockhash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AccountExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TronBuildResponse {
    pub transaction: UnsignedTronTransaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastResponse {
    /// Transaction hash, signature or id depending on chain
    pub hash: String,
}

/// Interpret a backend reply. Non-2xx statuses and bodies carrying an
/// `error` field are failures.
pub fn decode_response<T: serde::de::DeserializeOwned>(status: u16, body: &str) -> Result<T, ClientError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        if (200..300).contains(&status) {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Backend {
                status,
                message: body.trim().to_string(),
            }
        }
    })?;

    let error_message = match value.get("error") {
        Some(serde_json::Value::String(msg)) => Some(msg.clone()),
        Some(serde_json::Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    };
    if let Some(message) = error_message {
        return Err(ClientError::Backend { status, message });
    }
    if !(200..300).contains(&status) {
        return Err(ClientError::Backend {
            status,
            message: value.to_string(),
        });
    }

    Ok(serde_json::from_value(value)?)
}
