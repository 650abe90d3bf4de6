//! HTTP client for the wallet's backend functions.
//!
//! Each [`Action`] is POSTed as JSON to `<base>/functions/v1/<function>`
//! with the project key as bearer token. Failures are returned to the
//! caller as-is; nothing is retried here.

use crate::actions::*;
use crate::error::ClientError;
use chainvault_tx::{FeeEstimate, UnsignedTronTransaction};
use chainvault_types::{Amount, Chain};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!("backend URL must be http(s): {}", base_url)));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self {
            base_url,
            api_key: api_key.into(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of a backend function
    pub fn endpoint(&self, function: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, function)
    }

    /// Send an action and decode its reply.
    pub async fn invoke<T: DeserializeOwned>(&self, action: &Action) -> Result<T, ClientError> {
        let url = self.endpoint(action.function());
        tracing::debug!(action = action.name(), %url, "Invoking backend function");

        let mut request = self.http.post(&url).json(action);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key).header("apikey", &self.api_key);
        }
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        let result = decode_response(status, &body);
        if let Err(e) = &result {
            tracing::warn!(action = action.name(), error = %e, "Backend call failed");
        }
        result
    }

    // ============ Convenience Methods ============

    /// Native balance of `address`.
    pub async fn balance(&self, chain: Chain, address: &str) -> Result<Amount, ClientError> {
        let r: BalanceResponse = self
            .invoke(&Action::GetBalance {
                chain,
                address: address.to_string(),
            })
            .await?;
        if r.decimals != chain.native_decimals() {
            return Err(ClientError::InvalidResponse(format!(
                "{} balance reported with {} decimals",
                chain, r.decimals
            )));
        }
        Ok(r.amount())
    }

    pub async fn token_balances(&self, chain: Chain, address: &str) -> Result<Vec<TokenBalance>, ClientError> {
        self.invoke(&Action::GetTokenBalances {
            chain,
            address: address.to_string(),
        })
        .await
    }

    pub async fn history(&self, chain: Chain, address: &str, limit: Option<u32>) -> Result<Vec<HistoryEntry>, ClientError> {
        self.invoke(&Action::GetHistory {
            chain,
            address: address.to_string(),
            limit,
        })
        .await
    }

    pub async fn evm_fees(&self, chain_id: u64) -> Result<FeeEstimate, ClientError> {
        let r: EvmFeeResponse = self
            .invoke(&Action::EstimateFees {
                chain: Chain::Evm,
                chain_id: Some(chain_id),
            })
            .await?;
        Ok(r.into())
    }

    /// Suggested compute-unit price for Solana priority fees
    pub async fn solana_priority_fee(&self) -> Result<u64, ClientError> {
        let r: SolanaFeeResponse = self
            .invoke(&Action::EstimateFees {
                chain: Chain::Solana,
                chain_id: None,
            })
            .await?;
        Ok(r.compute_unit_price_micro_lamports)
    }

    pub async fn estimate_gas(
        &self,
        chain_id: u64,
        from: &str,
        to: &str,
        data: &[u8],
        value: u128,
    ) -> Result<u64, ClientError> {
        let r: GasResponse = self
            .invoke(&Action::EstimateGas {
                chain_id,
                from: from.to_string(),
                to: to.to_string(),
                data: format!("0x{}", hex::encode(data)),
                value: value.to_string(),
            })
            .await?;
        Ok(r.gas)
    }

    pub async fn prices(&self, symbols: &[&str], currency: &str) -> Result<PricesResponse, ClientError> {
        self.invoke(&Action::GetPrices {
            symbols: symbols.iter().map(|s| s.to_ascii_uppercase()).collect(),
            currency: currency.to_string(),
        })
        .await
    }

    pub async fn nonce(&self, chain_id: u64, address: &str) -> Result<u64, ClientError> {
        let r: NonceResponse = self
            .invoke(&Action::GetNonce {
                chain_id,
                address: address.to_string(),
            })
            .await?;
        Ok(r.nonce)
    }

    pub async fn recent_blockhash(&self) -> Result<String, ClientError> {
        let r: BlockhashResponse = self.invoke(&Action::GetRecentBlockhash).await?;
        Ok(r.blockhash)
    }

    pub async fn account_exists(&self, address: &str) -> Result<bool, ClientError> {
        let r: AccountExistsResponse = self
            .invoke(&Action::AccountExists {
                address: address.to_string(),
            })
            .await?;
        Ok(r.exists)
    }

    pub async fn build_tron_transfer(&self, owner: &str, to: &str, amount_sun: u64) -> Result<UnsignedTronTransaction, ClientError> {
        let r: TronBuildResponse = self
            .invoke(&Action::BuildTronTransfer {
                owner: owner.to_string(),
                to: to.to_string(),
                amount: amount_sun,
            })
            .await?;
        Ok(r.transaction)
    }

    pub async fn build_trc20_transfer(
        &self,
        owner: &str,
        contract: &str,
        parameter: &str,
        fee_limit: u64,
    ) -> Result<UnsignedTronTransaction, ClientError> {
        let r: TronBuildResponse = self
            .invoke(&Action::BuildTrc20Transfer {
                owner: owner.to_string(),
                contract: contract.to_string(),
                function_selector: chainvault_tx::tron::TRC20_TRANSFER_SELECTOR.to_string(),
                parameter: parameter.to_string(),
                fee_limit,
            })
            .await?;
        Ok(r.transaction)
    }

    /// Submit a signed transaction. Returns the chain's transaction id.
    pub async fn broadcast(&self, chain: Chain, signed_tx: String) -> Result<String, ClientError> {
        let r: BroadcastResponse = self.invoke(&Action::Broadcast { chain, signed_tx }).await?;
        tracing::info!(chain = %chain, hash = %r.hash, "Transaction broadcast");
        Ok(r.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let client = BackendClient::new("https://abc.example.co/", "key").unwrap();
        assert_eq!(client.base_url(), "https://abc.example.co");
        assert_eq!(
            client.endpoint("wallet-balance"),
            "https://abc.example.co/functions/v1/wallet-balance"
        );
    }

    #[test]
    fn test_rejects_non_http_url() {
        assert!(matches!(
            BackendClient::new("ftp://example.com", "key"),
            Err(ClientError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client =
            BackendClient::with_timeout("http://127.0.0.1:9", "", Duration::from_millis(500)).unwrap();
        let err = client.nonce(1, "0x0").await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_) | ClientError::Timeout));
    }
}
