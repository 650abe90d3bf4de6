//! Tron transaction signing.
//!
//! Tron transactions are built by a full node (`createtransaction`,
//! `triggersmartcontract`) and returned unsigned. Before signing, the wallet
//! checks that the node-supplied id hashes the raw bytes and decodes the raw
//! protobuf to confirm it encodes exactly the transfer the user asked for.

use crate::error::TxError;
use crate::evm::{abi_address, abi_uint, ERC20_TRANSFER_SELECTOR};
use chainvault_crypto::hash::sha256;
use chainvault_crypto::Secp256k1Keypair;
use chainvault_types::TronAddress;
use prost::Message;
use serde::{Deserialize, Serialize};

/// Function selector string passed to `triggersmartcontract`
pub const TRC20_TRANSFER_SELECTOR: &str = "transfer(address,uint256)";

/// `Transaction.Contract.ContractType` values
const TRANSFER_CONTRACT: i32 = 1;
const TRIGGER_SMART_CONTRACT: i32 = 31;

/// Unsigned transaction as returned by the node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTronTransaction {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub raw_data_hex: String,
    #[serde(default)]
    pub raw_data: serde_json::Value,
    #[serde(default)]
    pub visible: bool,
}

/// Signed transaction in the shape `broadcasttransaction` accepts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedTronTransaction {
    #[serde(rename = "txID")]
    pub tx_id: String,
    pub raw_data_hex: String,
    #[serde(default)]
    pub raw_data: serde_json::Value,
    #[serde(default)]
    pub visible: bool,
    /// Hex `r || s || v` signatures
    pub signature: Vec<String>,
}

/// The transfer a node-built transaction must encode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TronTransferIntent {
    Trx {
        to: TronAddress,
        amount_sun: u64,
    },
    Trc20 {
        contract: TronAddress,
        to: TronAddress,
        amount: u128,
    },
}

// Subset of `Transaction.raw` from Tron's protocol definitions. Fields not
// listed here are skipped on decode.
#[derive(Clone, PartialEq, Message)]
struct RawData {
    #[prost(bytes = "vec", tag = "1")]
    ref_block_bytes: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    ref_block_hash: Vec<u8>,
    #[prost(int64, tag = "8")]
    expiration: i64,
    #[prost(message, repeated, tag = "11")]
    contract: Vec<Contract>,
    #[prost(int64, tag = "14")]
    timestamp: i64,
    #[prost(int64, tag = "18")]
    fee_limit: i64,
}

#[derive(Clone, PartialEq, Message)]
struct Contract {
    #[prost(int32, tag = "1")]
    r#type: i32,
    #[prost(message, optional, tag = "2")]
    parameter: Option<AnyParameter>,
}

/// `google.protobuf.Any`
#[derive(Clone, PartialEq, Message)]
struct AnyParameter {
    #[prost(string, tag = "1")]
    type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
struct TransferContract {
    #[prost(bytes = "vec", tag = "1")]
    owner_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    to_address: Vec<u8>,
    #[prost(int64, tag = "3")]
    amount: i64,
}

#[derive(Clone, PartialEq, Message)]
struct TriggerSmartContract {
    #[prost(bytes = "vec", tag = "1")]
    owner_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    contract_address: Vec<u8>,
    #[prost(int64, tag = "3")]
    call_value: i64,
    #[prost(bytes = "vec", tag = "4")]
    data: Vec<u8>,
}

impl UnsignedTronTransaction {
    pub fn raw_bytes(&self) -> Result<Vec<u8>, TxError> {
        Ok(hex::decode(self.raw_data_hex.trim_start_matches("0x"))?)
    }

    /// `sha256(raw_data)`, checked against the node-supplied `txID`.
    pub fn verified_id(&self) -> Result<[u8; 32], TxError> {
        let computed = sha256(&self.raw_bytes()?);
        let claimed = self.tx_id.trim_start_matches("0x").to_ascii_lowercase();
        if hex::encode(computed) != claimed {
            return Err(TxError::TxIdMismatch {
                claimed: self.tx_id.clone(),
                computed: hex::encode(computed),
            });
        }
        Ok(computed)
    }

    /// Decode the raw bytes and compare the single contract they carry with
    /// `owner` and `intent`.
    pub fn check_transfer(&self, owner: &TronAddress, intent: &TronTransferIntent) -> Result<(), TxError> {
        let raw = RawData::decode(self.raw_bytes()?.as_slice()).map_err(decode_error)?;
        let contract = match raw.contract.as_slice() {
            [only] => only,
            other => {
                return Err(TxError::InvalidTransaction(format!(
                    "expected one contract, found {}",
                    other.len()
                )))
            }
        };
        let param = contract
            .parameter
            .as_ref()
            .ok_or_else(|| TxError::InvalidTransaction("contract has no parameter".to_string()))?;
        let owner_bytes = owner.to_prefixed_bytes();

        match *intent {
            TronTransferIntent::Trx { to, amount_sun } => {
                expect_type(contract.r#type, TRANSFER_CONTRACT)?;
                let transfer = TransferContract::decode(param.value.as_slice()).map_err(decode_error)?;
                if transfer.owner_address != owner_bytes {
                    return Err(TxError::OwnerMismatch(owner.to_base58()));
                }
                if transfer.to_address != to.to_prefixed_bytes() {
                    return Err(TxError::IntentMismatch(format!(
                        "recipient is {}, expected {}",
                        hex::encode(&transfer.to_address),
                        to
                    )));
                }
                if u64::try_from(transfer.amount).ok() != Some(amount_sun) {
                    return Err(TxError::IntentMismatch(format!(
                        "amount is {} sun, expected {}",
                        transfer.amount, amount_sun
                    )));
                }
            }
            TronTransferIntent::Trc20 { contract: token, to, amount } => {
                expect_type(contract.r#type, TRIGGER_SMART_CONTRACT)?;
                let call = TriggerSmartContract::decode(param.value.as_slice()).map_err(decode_error)?;
                if call.owner_address != owner_bytes {
                    return Err(TxError::OwnerMismatch(owner.to_base58()));
                }
                if call.contract_address != token.to_prefixed_bytes() {
                    return Err(TxError::IntentMismatch(format!(
                        "token contract is {}, expected {}",
                        hex::encode(&call.contract_address),
                        token
                    )));
                }
                if call.call_value != 0 {
                    return Err(TxError::IntentMismatch(format!(
                        "call carries {} sun",
                        call.call_value
                    )));
                }
                if call.data != trc20_transfer_data(&to, amount) {
                    return Err(TxError::IntentMismatch(
                        "call data does not encode the requested transfer".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn expect_type(actual: i32, expected: i32) -> Result<(), TxError> {
    if actual != expected {
        return Err(TxError::IntentMismatch(format!(
            "contract type {}, expected {}",
            actual, expected
        )));
    }
    Ok(())
}

fn decode_error(e: prost::DecodeError) -> TxError {
    TxError::InvalidTransaction(format!("raw data: {}", e))
}

/// Sign a node-built transaction with `keypair` after checking it encodes
/// `intent`.
pub fn sign_tron_transaction(
    unsigned: &UnsignedTronTransaction,
    keypair: &Secp256k1Keypair,
    intent: &TronTransferIntent,
) -> Result<SignedTronTransaction, TxError> {
    let id = unsigned.verified_id()?;
    let owner = keypair.tron_address();
    unsigned.check_transfer(&owner, intent)?;
    let sig = keypair.sign_prehash(&id)?;
    tracing::debug!(tx_id = %unsigned.tx_id, owner = %owner, "Signed Tron transaction");
    Ok(SignedTronTransaction {
        tx_id: unsigned.tx_id.clone(),
        raw_data_hex: unsigned.raw_data_hex.clone(),
        raw_data: unsigned.raw_data.clone(),
        visible: unsigned.visible,
        signature: vec![hex::encode(sig.to_bytes())],
    })
}

fn trc20_transfer_words(recipient: &TronAddress, amount: u128) -> Vec<u8> {
    let mut param = Vec::with_capacity(64);
    param.extend_from_slice(&abi_address(recipient.as_bytes()));
    param.extend_from_slice(&abi_uint(amount));
    param
}

/// Full call data: selector followed by the ABI words.
pub fn trc20_transfer_data(recipient: &TronAddress, amount: u128) -> Vec<u8> {
    let mut data = ERC20_TRANSFER_SELECTOR.to_vec();
    data.extend_from_slice(&trc20_transfer_words(recipient, amount));
    data
}

/// Hex ABI parameter for `transfer(address,uint256)`; the address word
/// holds the 20 bytes without the `0x41` prefix.
pub fn trc20_transfer_parameter(recipient: &TronAddress, amount: u128) -> String {
    hex::encode(trc20_transfer_words(recipient, amount))
}
