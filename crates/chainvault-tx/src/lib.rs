//! Chainvault Tx - Transaction construction and signing.
//!
//! - [`rlp`]: Recursive Length Prefix encoding for EVM payloads
//! - [`evm`]: EIP-1559 and EIP-155 legacy transactions, ERC-20 call data
//! - [`fees`]: EIP-1559 fee selection and balance-sufficiency checks
//! - [`solana`]: instructions, associated token accounts, legacy messages
//! - [`tron`]: signing of node-built transactions, TRC-20 call parameters

pub mod error;
pub mod rlp;
pub mod evm;
pub mod fees;
pub mod solana;
pub mod tron;

pub use error::TxError;
pub use evm::{
    erc20_transfer_data, AccessListEntry, Eip1559Transaction, LegacyTransaction, SignedEvmTransaction,
};
pub use fees::{
    buffered_gas_limit, select_eip1559_fees, Eip1559Fees, FeeEstimate, FeeSpeed, SolanaFeeParams,
};
pub use solana::{
    associated_token_address, build_sol_transfer, ComputeBudget, Instruction, Message,
    SignedSolanaTransaction, SplTransfer,
};
pub use tron::{
    sign_tron_transaction, trc20_transfer_data, trc20_transfer_parameter, SignedTronTransaction,
    TronTransferIntent, UnsignedTronTransaction,
};
