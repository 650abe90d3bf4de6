//! Wire format of backend requests and replies.

use chainvault_client::actions::{BalanceResponse, EvmFeeResponse, TronBuildResponse};
use chainvault_client::{decode_response, value_portfolio, Action, ClientError, Holding, PricesResponse};
use chainvault_tx::FeeSpeed;
use chainvault_types::Chain;
use serde_json::json;

#[test]
fn test_broadcast_request_body() {
    let action = Action::Broadcast {
        chain: Chain::Solana,
        signed_tx: "AQID".into(),
    };
    assert_eq!(action.function(), "wallet-broadcast");
    assert_eq!(
        serde_json::to_value(&action).unwrap(),
        json!({"action": "broadcast", "chain": "solana", "signed_tx": "AQID"})
    );
}

#[test]
fn test_balance_reply_with_string_amount() {
    let body = r#"{"balance":"2500000000","decimals":9,"symbol":"SOL"}"#;
    let r: BalanceResponse = decode_response(200, body).unwrap();
    assert_eq!(r.amount().to_string(), "2.5");
}

#[test]
fn test_fee_reply_feeds_fee_selection() {
    let body = json!({
        "base_fee_per_gas": "30000000000",
        "priority_fees": {"slow": 1000000000u64, "standard": 2000000000u64, "fast": 3000000000u64}
    })
    .to_string();
    let r: EvmFeeResponse = decode_response(200, &body).unwrap();
    let estimate: chainvault_tx::FeeEstimate = r.into();
    let fees = chainvault_tx::select_eip1559_fees(&estimate, FeeSpeed::Fast).unwrap();
    assert_eq!(fees.max_priority_fee_per_gas, 3_000_000_000);
    assert_eq!(fees.max_fee_per_gas, 63_000_000_000);
}

#[test]
fn test_error_field_is_failure_even_on_200() {
    let err = decode_response::<BalanceResponse>(200, r#"{"error":"rate limited"}"#).unwrap_err();
    assert_eq!(
        err,
        ClientError::Backend {
            status: 200,
            message: "rate limited".into()
        }
    );
}

#[test]
fn test_tron_build_reply() {
    let body = json!({
        "transaction": {
            "txID": "00",
            "raw_data_hex": "0a02",
            "raw_data": {"contract": []},
            "visible": false
        }
    })
    .to_string();
    let r: TronBuildResponse = decode_response(200, &body).unwrap();
    assert_eq!(r.transaction.raw_data_hex, "0a02");
}

#[test]
fn test_portfolio_from_reply() {
    let prices: PricesResponse =
        decode_response(200, r#"{"currency":"eur","prices":{"TRX":0.5}}"#).unwrap();
    let balance: BalanceResponse =
        decode_response(200, r#"{"balance":4000000,"decimals":6,"symbol":"TRX"}"#).unwrap();
    let v = value_portfolio(&[Holding::native(Chain::Tron, balance.amount())], &prices);
    assert_eq!(v.currency, "eur");
    assert!((v.total - 2.0).abs() < 1e-9);
}
