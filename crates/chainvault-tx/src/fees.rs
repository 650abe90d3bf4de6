//! Fee selection and balance-sufficiency checks.

use crate::error::TxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Gas used by a plain native-asset transfer
pub const NATIVE_TRANSFER_GAS: u64 = 21_000;
/// Fallback gas limit for ERC-20 `transfer` when no estimate is available
pub const ERC20_TRANSFER_GAS: u64 = 65_000;
/// Gas limit buffer applied on top of node estimates, in percent
pub const GAS_BUFFER_PERCENT: u64 = 20;

/// Base fee charged per transaction signature
pub const LAMPORTS_PER_SIGNATURE: u64 = 5_000;
/// Rent-exempt balance of a 165-byte SPL token account
pub const TOKEN_ACCOUNT_RENT_LAMPORTS: u64 = 2_039_280;
/// Rent-exempt minimum of a data-less system account
pub const RENT_EXEMPT_MINIMUM_LAMPORTS: u64 = 890_880;

/// Default TRC-20 `fee_limit` (100 TRX)
pub const DEFAULT_TRON_FEE_LIMIT_SUN: u64 = 100_000_000;
/// Reserve for a TRX transfer without staked bandwidth: bandwidth burn plus
/// activation of a new recipient account
pub const TRON_TRANSFER_FEE_SUN: u64 = 1_100_000;
/// Compute-unit limits requested alongside a priority fee
pub const SOL_TRANSFER_COMPUTE_UNITS: u32 = 1_000;
pub const SPL_TRANSFER_COMPUTE_UNITS: u32 = 60_000;

/// User-selected confirmation speed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeSpeed {
    Slow,
    #[default]
    Standard,
    Fast,
}

impl FeeSpeed {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FeeSpeed::Slow => "slow",
            FeeSpeed::Standard => "standard",
            FeeSpeed::Fast => "fast",
        }
    }
}

impl fmt::Display for FeeSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeSpeed {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "slow" => Ok(FeeSpeed::Slow),
            "standard" | "normal" => Ok(FeeSpeed::Standard),
            "fast" => Ok(FeeSpeed::Fast),
            other => Err(TxError::InvalidFeeEstimate(format!("unknown fee speed: {}", other))),
        }
    }
}

/// EIP-1559 fee data as reported by the backend, all values in wei.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    pub base_fee_per_gas: u128,
    pub slow_priority_fee: u128,
    pub standard_priority_fee: u128,
    pub fast_priority_fee: u128,
}

impl FeeEstimate {
    pub fn priority_fee(&self, speed: FeeSpeed) -> u128 {
        match speed {
            FeeSpeed::Slow => self.slow_priority_fee,
            FeeSpeed::Standard => self.standard_priority_fee,
            FeeSpeed::Fast => self.fast_priority_fee,
        }
    }

    /// Tiers must be ordered `slow <= standard <= fast`.
    pub fn validate(&self) -> Result<(), TxError> {
        if self.slow_priority_fee > self.standard_priority_fee
            || self.standard_priority_fee > self.fast_priority_fee
        {
            return Err(TxError::InvalidFeeEstimate(format!(
                "priority tiers out of order: {}/{}/{}",
                self.slow_priority_fee, self.standard_priority_fee, self.fast_priority_fee
            )));
        }
        Ok(())
    }
}

/// Fee fields of a type-2 transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip1559Fees {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl Eip1559Fees {
    /// Upper bound on the fee paid for `gas_limit` gas
    pub fn max_total(&self, gas_limit: u64) -> Result<u128, TxError> {
        (gas_limit as u128)
            .checked_mul(self.max_fee_per_gas)
            .ok_or(TxError::Overflow("max fee"))
    }
}

/// `max_priority = tier`, `max_fee = 2 * base_fee + max_priority`.
///
/// Doubling the base fee keeps the transaction includable through six
/// consecutive full blocks.
pub fn select_eip1559_fees(estimate: &FeeEstimate, speed: FeeSpeed) -> Result<Eip1559Fees, TxError> {
    estimate.validate()?;
    let priority = estimate.priority_fee(speed);
    let max_fee = estimate
        .base_fee_per_gas
        .checked_mul(2)
        .and_then(|b| b.checked_add(priority))
        .ok_or(TxError::Overflow("max_fee_per_gas"))?;
    Ok(Eip1559Fees {
        max_fee_per_gas: max_fee,
        max_priority_fee_per_gas: priority,
    })
}

/// Node gas estimate plus [`GAS_BUFFER_PERCENT`], never below a plain transfer.
pub fn buffered_gas_limit(estimate: u64) -> u64 {
    let buffered = estimate.saturating_add(estimate.saturating_mul(GAS_BUFFER_PERCENT) / 100);
    buffered.max(NATIVE_TRANSFER_GAS)
}

fn ensure(asset: &str, needed: u128, available: u128) -> Result<(), TxError> {
    if needed > available {
        return Err(TxError::InsufficientBalance {
            asset: asset.to_string(),
            needed,
            available,
        });
    }
    Ok(())
}

fn non_zero(amount: u128) -> Result<(), TxError> {
    if amount == 0 {
        return Err(TxError::ZeroAmount);
    }
    Ok(())
}

/// Native EVM transfer: `value + gas_limit * max_fee_per_gas` must be covered.
pub fn check_evm_native(
    balance: u128,
    value: u128,
    gas_limit: u64,
    fees: &Eip1559Fees,
) -> Result<(), TxError> {
    non_zero(value)?;
    let needed = fees
        .max_total(gas_limit)?
        .checked_add(value)
        .ok_or(TxError::Overflow("evm cost"))?;
    ensure("ETH", needed, balance)
}

/// ERC-20 transfer: token balance covers `amount`, native balance covers gas.
pub fn check_evm_token(
    symbol: &str,
    token_balance: u128,
    amount: u128,
    native_balance: u128,
    gas_limit: u64,
    fees: &Eip1559Fees,
) -> Result<(), TxError> {
    non_zero(amount)?;
    ensure(symbol, amount, token_balance)?;
    ensure("ETH", fees.max_total(gas_limit)?, native_balance)
}

/// Parameters that determine the lamport cost of a Solana transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolanaFeeParams {
    pub signatures: u64,
    /// Recipient token account is created as part of the transaction
    pub creates_token_account: bool,
    pub compute_unit_limit: u32,
    pub compute_unit_price_micro_lamports: u64,
}

impl SolanaFeeParams {
    pub fn single_signer() -> Self {
        Self {
            signatures: 1,
            ..Default::default()
        }
    }

    pub fn priority_fee(&self) -> u64 {
        let micro = (self.compute_unit_limit as u128) * (self.compute_unit_price_micro_lamports as u128);
        // round up to whole lamports
        micro.div_ceil(1_000_000).min(u64::MAX as u128) as u64
    }

    /// Total lamports debited from the fee payer besides the transferred amount
    pub fn total(&self) -> u64 {
        let rent = if self.creates_token_account {
            TOKEN_ACCOUNT_RENT_LAMPORTS
        } else {
            0
        };
        self.signatures
            .saturating_mul(LAMPORTS_PER_SIGNATURE)
            .saturating_add(self.priority_fee())
            .saturating_add(rent)
    }
}

/// Native SOL transfer. A transfer to a non-existent account must fund it
/// up to the rent-exempt minimum.
pub fn check_solana_native(
    balance: u64,
    amount: u64,
    fee: &SolanaFeeParams,
    recipient_exists: bool,
) -> Result<(), TxError> {
    non_zero(amount as u128)?;
    if !recipient_exists && amount < RENT_EXEMPT_MINIMUM_LAMPORTS {
        return Err(TxError::BelowRentExemption {
            amount,
            minimum: RENT_EXEMPT_MINIMUM_LAMPORTS,
        });
    }
    let needed = (amount as u128) + (fee.total() as u128);
    ensure("SOL", needed, balance as u128)
}

/// SPL transfer: token balance covers `amount`, SOL balance covers fees and
/// any token account rent.
pub fn check_solana_token(
    symbol: &str,
    token_balance: u64,
    amount: u64,
    sol_balance: u64,
    fee: &SolanaFeeParams,
) -> Result<(), TxError> {
    non_zero(amount as u128)?;
    ensure(symbol, amount as u128, token_balance as u128)?;
    ensure("SOL", fee.total() as u128, sol_balance as u128)
}

/// Native TRX transfer; `estimated_fee` covers bandwidth not paid by staking.
pub fn check_tron_native(balance: u64, amount: u64, estimated_fee: u64) -> Result<(), TxError> {
    non_zero(amount as u128)?;
    ensure("TRX", amount as u128 + estimated_fee as u128, balance as u128)
}

/// TRC-20 transfer: the TRX balance must cover the full `fee_limit`.
pub fn check_trc20(
    symbol: &str,
    token_balance: u128,
    amount: u128,
    trx_balance: u64,
    fee_limit: u64,
) -> Result<(), TxError> {
    non_zero(amount)?;
    ensure(symbol, amount, token_balance)?;
    ensure("TRX", fee_limit as u128, trx_balance as u128)
}
