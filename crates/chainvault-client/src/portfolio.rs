//! Fiat valuation of wallet balances.

use crate::actions::{PricesResponse, TokenBalance};
use chainvault_types::{Amount, Chain};
use serde::Serialize;

/// One asset held on one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub chain: Chain,
    pub symbol: String,
    pub amount: Amount,
}

impl Holding {
    /// Native coin balance of a chain.
    pub fn native(chain: Chain, amount: Amount) -> Self {
        Self {
            chain,
            symbol: chain.native_symbol().to_string(),
            amount,
        }
    }

    pub fn token(chain: Chain, token: &TokenBalance) -> Self {
        Self {
            chain,
            symbol: token.symbol.clone(),
            amount: token.amount(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuedHolding {
    pub chain: Chain,
    pub symbol: String,
    pub amount: String,
    /// Unit price, `None` when the backend has no quote for the symbol
    pub price: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioValue {
    pub currency: String,
    pub total: f64,
    pub holdings: Vec<ValuedHolding>,
}

impl PortfolioValue {
    /// Symbols that could not be priced.
    pub fn unpriced(&self) -> Vec<&str> {
        self.holdings
            .iter()
            .filter(|h| h.price.is_none())
            .map(|h| h.symbol.as_str())
            .collect()
    }
}

/// Value `holdings` with the quoted prices. Symbols match case-insensitively.
/// Holdings without a price are listed but do not count toward the total.
pub fn value_portfolio(holdings: &[Holding], prices: &PricesResponse) -> PortfolioValue {
    let mut total = 0.0;
    let valued = holdings
        .iter()
        .map(|h| {
            let price = lookup_price(prices, &h.symbol);
            let value = price.map(|p| p * h.amount.to_f64());
            if let Some(v) = value {
                total += v;
            }
            ValuedHolding {
                chain: h.chain,
                symbol: h.symbol.clone(),
                amount: h.amount.to_string(),
                price,
                value,
            }
        })
        .collect();

    PortfolioValue {
        currency: prices.currency.clone(),
        total,
        holdings: valued,
    }
}

fn lookup_price(prices: &PricesResponse, symbol: &str) -> Option<f64> {
    prices
        .prices
        .get(&symbol.to_ascii_uppercase())
        .or_else(|| prices.prices.iter().find(|(k, _)| k.eq_ignore_ascii_case(symbol)).map(|(_, v)| v))
        .copied()
        .filter(|p| p.is_finite() && *p >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn prices(entries: &[(&str, f64)]) -> PricesResponse {
        PricesResponse {
            currency: "usd".into(),
            prices: entries
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_values_native_holdings() {
        let holdings = vec![
            Holding::native(Chain::Evm, Amount::parse("2", 18).unwrap()),
            Holding::native(Chain::Solana, Amount::parse("10", 9).unwrap()),
        ];
        let v = value_portfolio(&holdings, &prices(&[("ETH", 3000.0), ("SOL", 150.0)]));
        assert_eq!(v.currency, "usd");
        assert!((v.total - 7500.0).abs() < 1e-6);
        assert_eq!(v.holdings[0].amount, "2");
        assert!(v.unpriced().is_empty());
    }

    #[test]
    fn test_symbol_match_ignores_case() {
        let holdings = vec![Holding {
            chain: Chain::Evm,
            symbol: "usdc".into(),
            amount: Amount::parse("5", 6).unwrap(),
        }];
        let v = value_portfolio(&holdings, &prices(&[("USDC", 1.0)]));
        assert!((v.total - 5.0).abs() < 1e-9);

        let v = value_portfolio(&holdings, &prices(&[("UsDc", 2.0)]));
        assert!((v.total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_price_excluded_from_total() {
        let holdings = vec![
            Holding::native(Chain::Tron, Amount::parse("100", 6).unwrap()),
            Holding {
                chain: Chain::Solana,
                symbol: "BONK".into(),
                amount: Amount::parse("1000", 5).unwrap(),
            },
        ];
        let v = value_portfolio(&holdings, &prices(&[("TRX", 0.1)]));
        assert!((v.total - 10.0).abs() < 1e-9);
        assert_eq!(v.unpriced(), vec!["BONK"]);
        assert_eq!(v.holdings[1].value, None);
    }

    #[test]
    fn test_negative_price_ignored() {
        let holdings = vec![Holding::native(Chain::Evm, Amount::parse("1", 18).unwrap())];
        let v = value_portfolio(&holdings, &prices(&[("ETH", -1.0)]));
        assert_eq!(v.total, 0.0);
        assert_eq!(v.unpriced(), vec!["ETH"]);
    }
}
