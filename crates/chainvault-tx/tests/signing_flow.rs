//! End-to-end signing from mnemonic-derived keys.

use chainvault_crypto::{ed25519_for_account, secp256k1_for_account, verify_ed25519, Mnemonic};
use chainvault_tx::fees::{check_evm_native, check_solana_token, NATIVE_TRANSFER_GAS};
use chainvault_tx::solana::TOKEN_PROGRAM_ID;
use chainvault_tx::{
    build_sol_transfer, select_eip1559_fees, sign_tron_transaction, Eip1559Transaction,
    FeeEstimate, FeeSpeed, SplTransfer, TronTransferIntent, TxError, UnsignedTronTransaction,
};
use chainvault_types::{Chain, EvmAddress, SolanaAddress, TronAddress};

const PHRASE: &str = "abandon abandon abandon abandon abandon abandon \
                      abandon abandon abandon abandon abandon about";

#[test]
fn test_evm_transfer_from_mnemonic() {
    let mnemonic = Mnemonic::parse(PHRASE).unwrap();
    let kp = secp256k1_for_account(&mnemonic, Chain::Evm, 0).unwrap();

    let estimate = FeeEstimate {
        base_fee_per_gas: 20_000_000_000,
        slow_priority_fee: 100_000_000,
        standard_priority_fee: 1_000_000_000,
        fast_priority_fee: 2_000_000_000,
    };
    let fees = select_eip1559_fees(&estimate, FeeSpeed::Standard).unwrap();
    let value = 10u128.pow(16);
    let balance = 10u128.pow(18);
    check_evm_native(balance, value, NATIVE_TRANSFER_GAS, &fees).unwrap();

    let to: EvmAddress = "0x000000000000000000000000000000000000dEaD".parse().unwrap();
    let tx = Eip1559Transaction::transfer(1, 0, to, value, NATIVE_TRANSFER_GAS, fees);
    let signed = tx.sign(&kp).unwrap();
    assert!(signed.raw_hex().starts_with("0x02"));
    assert_eq!(signed.hash_hex().len(), 66);

    // deterministic RFC 6979 nonces make signing reproducible
    assert_eq!(tx.sign(&kp).unwrap(), signed);
}

#[test]
fn test_solana_transfer_from_mnemonic() {
    let mnemonic = Mnemonic::parse(PHRASE).unwrap();
    let kp = ed25519_for_account(&mnemonic, 0).unwrap();
    let to = SolanaAddress::from_bytes([7u8; 32]);

    let msg = build_sol_transfer(&kp.address(), &to, 2_000_000, [1u8; 32], None).unwrap();
    let signed = msg.sign(&[&kp]).unwrap();
    verify_ed25519(&kp.public_key(), &signed.message, &signed.signatures[0]).unwrap();
}

#[test]
fn test_spl_transfer_fee_check_and_sign() {
    let mnemonic = Mnemonic::parse(PHRASE).unwrap();
    let kp = ed25519_for_account(&mnemonic, 1).unwrap();
    let transfer = SplTransfer {
        owner: kp.address(),
        recipient: SolanaAddress::from_bytes([8u8; 32]),
        mint: SolanaAddress::from_bytes([9u8; 32]),
        token_program: TOKEN_PROGRAM_ID,
        amount: 500,
        decimals: 6,
        create_recipient_account: true,
        recent_blockhash: [2u8; 32],
        compute: None,
    };
    let fee = transfer.fee_params();
    assert!(matches!(
        check_solana_token("USDC", 1_000, 500, 10_000, &fee),
        Err(TxError::InsufficientBalance { .. })
    ));
    check_solana_token("USDC", 1_000, 500, 3_000_000, &fee).unwrap();

    let signed = transfer.build().unwrap().sign(&[&kp]).unwrap();
    assert_eq!(signed.signatures.len(), 1);
}

fn varint(mut v: u64, out: &mut Vec<u8>) {
    while v >= 0x80 {
        out.push((v as u8) | 0x80);
        v >>= 7;
    }
    out.push(v as u8);
}

fn field_bytes(tag: u8, bytes: &[u8], out: &mut Vec<u8>) {
    out.push(tag << 3 | 2);
    varint(bytes.len() as u64, out);
    out.extend_from_slice(bytes);
}

/// Hand-encoded `createtransaction` raw data for a TRX transfer.
fn node_built_transfer(owner: &TronAddress, to: &TronAddress, sun: u64) -> UnsignedTronTransaction {
    let mut transfer = Vec::new();
    field_bytes(1, &owner.to_prefixed_bytes(), &mut transfer);
    field_bytes(2, &to.to_prefixed_bytes(), &mut transfer);
    transfer.push(3 << 3);
    varint(sun, &mut transfer);

    let mut any = Vec::new();
    field_bytes(1, b"type.googleapis.com/protocol.TransferContract", &mut any);
    field_bytes(2, &transfer, &mut any);

    let mut contract = vec![1 << 3, 1];
    field_bytes(2, &any, &mut contract);

    let mut raw = Vec::new();
    field_bytes(1, &[0x4b, 0x2a], &mut raw);
    raw.push(8 << 3);
    varint(1_700_000_060_000, &mut raw);
    field_bytes(11, &contract, &mut raw);

    UnsignedTronTransaction {
        tx_id: hex::encode(chainvault_crypto::hash::sha256(&raw)),
        raw_data_hex: hex::encode(&raw),
        raw_data: serde_json::Value::Null,
        visible: false,
    }
}

#[test]
fn test_tron_signing_checks_owner_and_transfer() {
    let mnemonic = Mnemonic::parse(PHRASE).unwrap();
    let kp = secp256k1_for_account(&mnemonic, Chain::Tron, 0).unwrap();
    let other = secp256k1_for_account(&mnemonic, Chain::Tron, 1).unwrap();
    let to: TronAddress = "TR7NHqjeKQxGTCi8q8ZY4pL8otSzgjLj6t".parse().unwrap();
    let intent = TronTransferIntent::Trx {
        to,
        amount_sun: 1_500_000,
    };

    let unsigned = node_built_transfer(&kp.tron_address(), &to, 1_500_000);
    assert!(sign_tron_transaction(&unsigned, &kp, &intent).is_ok());
    assert!(matches!(
        sign_tron_transaction(&unsigned, &other, &intent),
        Err(TxError::OwnerMismatch(_))
    ));

    let redirected = node_built_transfer(&kp.tron_address(), &other.tron_address(), 1_500_000);
    assert!(matches!(
        sign_tron_transaction(&redirected, &kp, &intent),
        Err(TxError::IntentMismatch(_))
    ));
}
