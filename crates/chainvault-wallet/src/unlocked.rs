//! Signing with a decrypted wallet.

use crate::error::WalletError;
use chainvault_crypto::{ed25519_for_account, secp256k1_for_account, Ed25519Keypair, Mnemonic, Secp256k1Keypair};
use chainvault_tx::fees::{
    check_evm_native, check_evm_token, check_solana_native, check_solana_token, SolanaFeeParams,
};
use chainvault_tx::solana::SplTransfer;
use chainvault_tx::{
    build_sol_transfer, sign_tron_transaction, ComputeBudget, Eip1559Fees, Eip1559Transaction,
    SignedEvmTransaction, SignedSolanaTransaction, SignedTronTransaction, TronTransferIntent,
    UnsignedTronTransaction,
};
use chainvault_types::{Address, Chain, EvmAddress, SolanaAddress};
use std::time::{Duration, Instant};
use zeroize::Zeroizing;

/// Which key signs: an HD account index or an imported key by address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Account(u32),
    Imported(String),
}

pub(crate) struct ImportedSecret {
    pub(crate) chain: Chain,
    pub(crate) address: String,
    pub(crate) secret: Zeroizing<Vec<u8>>,
}

/// Native EVM transfer with the balance it is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmTransfer {
    pub chain_id: u64,
    pub nonce: u64,
    pub to: EvmAddress,
    /// Wei
    pub value: u128,
    pub gas_limit: u64,
    pub fees: Eip1559Fees,
    pub balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Transfer {
    pub chain_id: u64,
    pub nonce: u64,
    pub token: EvmAddress,
    pub symbol: String,
    pub recipient: EvmAddress,
    /// Token base units
    pub amount: u128,
    pub gas_limit: u64,
    pub fees: Eip1559Fees,
    pub token_balance: u128,
    pub native_balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransfer {
    pub to: SolanaAddress,
    pub lamports: u64,
    pub recent_blockhash: [u8; 32],
    pub compute: Option<ComputeBudget>,
    pub balance: u64,
    pub recipient_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplTokenTransfer {
    pub recipient: SolanaAddress,
    pub mint: SolanaAddress,
    pub token_program: SolanaAddress,
    pub symbol: String,
    pub amount: u64,
    pub decimals: u8,
    /// Whether the recipient's associated token account already exists
    pub recipient_account_exists: bool,
    pub recent_blockhash: [u8; 32],
    pub compute: Option<ComputeBudget>,
    pub token_balance: u64,
    pub sol_balance: u64,
}

/// Decrypted wallet. Secrets are zeroized when this value drops.
pub struct UnlockedVault {
    mnemonic: Mnemonic,
    imported: Vec<ImportedSecret>,
    unlocked_at: Instant,
    timeout: Duration,
}

impl std::fmt::Debug for UnlockedVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockedVault")
            .field("imported", &self.imported.len())
            .field("expired", &self.is_expired())
            .finish_non_exhaustive()
    }
}

impl UnlockedVault {
    pub(crate) fn new(mnemonic: Mnemonic, imported: Vec<ImportedSecret>, timeout: Duration) -> Self {
        Self {
            mnemonic,
            imported,
            unlocked_at: Instant::now(),
            timeout,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.unlocked_at.elapsed() >= self.timeout
    }

    pub fn imported_count(&self) -> usize {
        self.imported.len()
    }

    fn ensure_unlocked(&self) -> Result<(), WalletError> {
        if self.is_expired() {
            return Err(WalletError::Locked);
        }
        Ok(())
    }

    fn imported_secret(&self, chain: Chain, address: &str) -> Result<&[u8], WalletError> {
        let wanted = Address::parse_for(chain, address)?.to_string();
        self.imported
            .iter()
            .find(|k| k.chain == chain && k.address == wanted)
            .map(|k| k.secret.as_slice())
            .ok_or(WalletError::ImportedKeyNotFound(wanted))
    }

    fn secp256k1(&self, chain: Chain, source: &KeySource) -> Result<Secp256k1Keypair, WalletError> {
        self.ensure_unlocked()?;
        match source {
            KeySource::Account(index) => Ok(secp256k1_for_account(&self.mnemonic, chain, *index)?),
            KeySource::Imported(address) => {
                let secret: [u8; 32] = self
                    .imported_secret(chain, address)?
                    .try_into()
                    .map_err(|_| WalletError::Storage("imported key has wrong length".to_string()))?;
                let secret = Zeroizing::new(secret);
                Ok(Secp256k1Keypair::from_bytes(&secret)?)
            }
        }
    }

    fn ed25519(&self, source: &KeySource) -> Result<Ed25519Keypair, WalletError> {
        self.ensure_unlocked()?;
        match source {
            KeySource::Account(index) => Ok(ed25519_for_account(&self.mnemonic, *index)?),
            KeySource::Imported(address) => {
                let secret: [u8; 32] = self
                    .imported_secret(Chain::Solana, address)?
                    .try_into()
                    .map_err(|_| WalletError::Storage("imported key has wrong length".to_string()))?;
                let secret = Zeroizing::new(secret);
                Ok(Ed25519Keypair::from_seed(&secret))
            }
        }
    }

    /// Address of `source` on `chain`
    pub fn address(&self, chain: Chain, source: &KeySource) -> Result<Address, WalletError> {
        Ok(match chain {
            Chain::Evm => self.secp256k1(chain, source)?.evm_address().into(),
            Chain::Tron => self.secp256k1(chain, source)?.tron_address().into(),
            Chain::Solana => self.ed25519(source)?.address().into(),
        })
    }

    pub fn sign_evm_transfer(&self, source: &KeySource, req: &EvmTransfer) -> Result<SignedEvmTransaction, WalletError> {
        check_evm_native(req.balance, req.value, req.gas_limit, &req.fees)?;
        let kp = self.secp256k1(Chain::Evm, source)?;
        let tx = Eip1559Transaction::transfer(req.chain_id, req.nonce, req.to, req.value, req.gas_limit, req.fees);
        let signed = tx.sign(&kp)?;
        tracing::info!(hash = %signed.hash_hex(), "Signed EVM transfer");
        Ok(signed)
    }

    pub fn sign_erc20_transfer(&self, source: &KeySource, req: &Erc20Transfer) -> Result<SignedEvmTransaction, WalletError> {
        check_evm_token(
            &req.symbol,
            req.token_balance,
            req.amount,
            req.native_balance,
            req.gas_limit,
            &req.fees,
        )?;
        let kp = self.secp256k1(Chain::Evm, source)?;
        let tx = Eip1559Transaction::erc20_transfer(
            req.chain_id,
            req.nonce,
            req.token,
            &req.recipient,
            req.amount,
            req.gas_limit,
            req.fees,
        );
        let signed = tx.sign(&kp)?;
        tracing::info!(hash = %signed.hash_hex(), token = %req.symbol, "Signed ERC-20 transfer");
        Ok(signed)
    }

    pub fn sign_solana_transfer(&self, source: &KeySource, req: &SolTransfer) -> Result<SignedSolanaTransaction, WalletError> {
        let fee = SolanaFeeParams {
            signatures: 1,
            creates_token_account: false,
            compute_unit_limit: req.compute.map(|c| c.unit_limit).unwrap_or(0),
            compute_unit_price_micro_lamports: req.compute.map(|c| c.unit_price_micro_lamports).unwrap_or(0),
        };
        check_solana_native(req.balance, req.lamports, &fee, req.recipient_exists)?;
        let kp = self.ed25519(source)?;
        let message = build_sol_transfer(&kp.address(), &req.to, req.lamports, req.recent_blockhash, req.compute)?;
        let signed = message.sign(&[&kp])?;
        tracing::info!(signature = %signed.signature(), "Signed SOL transfer");
        Ok(signed)
    }

    pub fn sign_spl_transfer(&self, source: &KeySource, req: &SplTokenTransfer) -> Result<SignedSolanaTransaction, WalletError> {
        let kp = self.ed25519(source)?;
        let transfer = SplTransfer {
            owner: kp.address(),
            recipient: req.recipient,
            mint: req.mint,
            token_program: req.token_program,
            amount: req.amount,
            decimals: req.decimals,
            create_recipient_account: !req.recipient_account_exists,
            recent_blockhash: req.recent_blockhash,
            compute: req.compute,
        };
        check_solana_token(&req.symbol, req.token_balance, req.amount, req.sol_balance, &transfer.fee_params())?;
        let signed = transfer.build()?.sign(&[&kp])?;
        tracing::info!(signature = %signed.signature(), token = %req.symbol, "Signed SPL transfer");
        Ok(signed)
    }

    /// Sign a node-built Tron transaction (TRX or TRC-20) once its raw data
    /// is confirmed to encode `intent`.
    pub fn sign_tron_transaction(
        &self,
        source: &KeySource,
        unsigned: &UnsignedTronTransaction,
        intent: &TronTransferIntent,
    ) -> Result<SignedTronTransaction, WalletError> {
        let kp = self.secp256k1(Chain::Tron, source)?;
        Ok(sign_tron_transaction(unsigned, &kp, intent)?)
    }

    /// EIP-191 `personal_sign`; returns `0x`-prefixed `r || s || v`.
    pub fn sign_evm_message(&self, source: &KeySource, message: &[u8]) -> Result<String, WalletError> {
        let kp = self.secp256k1(Chain::Evm, source)?;
        let sig = kp.sign_personal_message(message)?;
        Ok(format!("0x{}", hex::encode(sig.to_eth_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainvault_crypto::keys::personal_message_hash;
    use chainvault_crypto::{recover_evm_address, RecoverableSignature};
    use chainvault_tx::solana::TOKEN_PROGRAM_ID;

    const PHRASE: &str = "abandon abandon abandon abandon abandon abandon \
                          abandon abandon abandon abandon abandon about";

    fn unlocked(timeout: Duration) -> UnlockedVault {
        UnlockedVault::new(Mnemonic::parse(PHRASE).unwrap(), Vec::new(), timeout)
    }

    fn fees() -> Eip1559Fees {
        Eip1559Fees {
            max_fee_per_gas: 30,
            max_priority_fee_per_gas: 2,
        }
    }

    #[test]
    fn test_account_address_matches_derivation() {
        let v = unlocked(Duration::from_secs(60));
        let addr = v.address(Chain::Evm, &KeySource::Account(0)).unwrap();
        assert_eq!(addr.to_string(), "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    }

    #[test]
    fn test_expired_vault_refuses_to_sign() {
        let v = unlocked(Duration::ZERO);
        assert!(v.is_expired());
        assert_eq!(
            v.sign_evm_message(&KeySource::Account(0), b"hi"),
            Err(WalletError::Locked)
        );
    }

    #[test]
    fn test_sign_evm_transfer_checks_balance() {
        let v = unlocked(Duration::from_secs(60));
        let mut req = EvmTransfer {
            chain_id: 1,
            nonce: 0,
            to: EvmAddress::from_bytes([1u8; 20]),
            value: 1_000,
            gas_limit: 21_000,
            fees: fees(),
            balance: 1_000 + 21_000 * 30,
        };
        assert!(v.sign_evm_transfer(&KeySource::Account(0), &req).is_ok());

        req.balance -= 1;
        assert!(matches!(
            v.sign_evm_transfer(&KeySource::Account(0), &req),
            Err(WalletError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_sign_erc20_transfer() {
        let v = unlocked(Duration::from_secs(60));
        let req = Erc20Transfer {
            chain_id: 1,
            nonce: 3,
            token: EvmAddress::from_bytes([0xaa; 20]),
            symbol: "USDC".to_string(),
            recipient: EvmAddress::from_bytes([0xbb; 20]),
            amount: 500,
            gas_limit: 65_000,
            fees: fees(),
            token_balance: 500,
            native_balance: 65_000 * 30,
        };
        let signed = v.sign_erc20_transfer(&KeySource::Account(0), &req).unwrap();
        assert_eq!(signed.raw[0], 0x02);
    }

    #[test]
    fn test_sign_solana_transfers() {
        let v = unlocked(Duration::from_secs(60));
        let sol = SolTransfer {
            to: SolanaAddress::from_bytes([3u8; 32]),
            lamports: 1_000_000,
            recent_blockhash: [1u8; 32],
            compute: None,
            balance: 2_000_000,
            recipient_exists: true,
        };
        assert_eq!(v.sign_solana_transfer(&KeySource::Account(0), &sol).unwrap().signatures.len(), 1);

        let spl = SplTokenTransfer {
            recipient: SolanaAddress::from_bytes([3u8; 32]),
            mint: SolanaAddress::from_bytes([4u8; 32]),
            token_program: TOKEN_PROGRAM_ID,
            symbol: "USDC".to_string(),
            amount: 10,
            decimals: 6,
            recipient_account_exists: false,
            recent_blockhash: [1u8; 32],
            compute: None,
            token_balance: 10,
            sol_balance: 1_000_000,
        };
        // new recipient token account needs rent
        assert!(matches!(
            v.sign_spl_transfer(&KeySource::Account(0), &spl),
            Err(WalletError::InsufficientBalance { .. })
        ));
        let spl = SplTokenTransfer {
            sol_balance: 3_000_000,
            ..spl
        };
        assert!(v.sign_spl_transfer(&KeySource::Account(0), &spl).is_ok());
    }

    #[test]
    fn test_sign_evm_message_recovers() {
        let v = unlocked(Duration::from_secs(60));
        let sig_hex = v.sign_evm_message(&KeySource::Account(0), b"hello").unwrap();
        let bytes = hex::decode(sig_hex.trim_start_matches("0x")).unwrap();
        assert_eq!(bytes.len(), 65);
        assert!(bytes[64] == 27 || bytes[64] == 28);
        let sig = RecoverableSignature {
            r: bytes[..32].try_into().unwrap(),
            s: bytes[32..64].try_into().unwrap(),
            recovery_id: bytes[64] - 27,
        };
        let recovered = recover_evm_address(&personal_message_hash(b"hello"), &sig).unwrap();
        assert_eq!(recovered.to_string(), "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    }

    #[test]
    fn test_imported_key_lookup() {
        let kp = Secp256k1Keypair::from_bytes(&[7u8; 32]).unwrap();
        let address = kp.evm_address().to_string();
        let v = UnlockedVault::new(
            Mnemonic::parse(PHRASE).unwrap(),
            vec![ImportedSecret {
                chain: Chain::Evm,
                address: address.clone(),
                secret: Zeroizing::new(vec![7u8; 32]),
            }],
            Duration::from_secs(60),
        );
        let source = KeySource::Imported(address.to_lowercase());
        assert_eq!(v.address(Chain::Evm, &source).unwrap().to_string(), address);

        let missing = KeySource::Imported("0x000000000000000000000000000000000000dEaD".to_string());
        assert!(matches!(
            v.address(Chain::Evm, &missing),
            Err(WalletError::ImportedKeyNotFound(_))
        ));
    }
}
