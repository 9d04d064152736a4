// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Etherscan-compatible explorer signals.
//!
//! Two lookups feed the risk score: whether the address has contract code
//! and when its first transaction happened. Both are plain `GET /api` calls
//! against the chain's explorer host.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::blockchain::Chain;

/// Explorer request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Message Etherscan returns (with status "0") for an address with no history.
const NO_TRANSACTIONS_MESSAGE: &str = "No transactions found";

/// Upstream signal failure. Always recovered into a finding by the scorer.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("explorer API key is not configured")]
    MissingApiKey,

    #[error("explorer request failed: {0}")]
    Request(String),

    #[error("explorer returned HTTP {0}")]
    Status(u16),

    #[error("explorer response was malformed: {0}")]
    Malformed(String),

    #[error("explorer returned no data: {0}")]
    NoData(String),
}

/// Transaction history summary for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxHistory {
    /// The address has never transacted.
    Empty,
    /// Timestamp of the earliest transaction.
    FirstSeenAt(DateTime<Utc>),
}

/// Source of explorer signals.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// Whether contract bytecode is deployed at `address`.
    async fn has_code(&self, chain: Chain, address: &str) -> Result<bool, SignalError>;

    /// Earliest-transaction summary for `address`.
    async fn transaction_history(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<TxHistory, SignalError>;
}

/// Etherscan / Polygonscan HTTP client.
#[derive(Clone)]
pub struct EtherscanClient {
    api_key: Option<String>,
    /// Overrides the per-chain host (used by tests and self-hosted mirrors).
    base_url: Option<String>,
    http: reqwest::Client,
}

impl std::fmt::Debug for EtherscanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtherscanClient")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    result: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct TxListResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct TxEntry {
    #[serde(rename = "timeStamp")]
    time_stamp: String,
}

impl EtherscanClient {
    /// Create a client. Without an API key every lookup fails with
    /// [`SignalError::MissingApiKey`] and no request is sent.
    pub fn new(api_key: Option<String>) -> Result<Self, SignalError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SignalError::Request(e.to_string()))?;

        Ok(Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: None,
            http,
        })
    }

    /// Send every chain's requests to `base_url` instead of the public host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self, chain: Chain) -> String {
        match &self.base_url {
            Some(base) => format!("{}/api", base.trim_end_matches('/')),
            None => format!("https://{}/api", chain.network().explorer_api_host),
        }
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        chain: Chain,
        params: &[(&str, &str)],
    ) -> Result<T, SignalError> {
        let api_key = self.api_key.as_deref().ok_or(SignalError::MissingApiKey)?;

        let response = self
            .http
            .get(self.endpoint(chain))
            .query(params)
            .query(&[("apikey", api_key)])
            .send()
            .await
            // Strip the URL so the API key never reaches logs or findings.
            .map_err(|e| SignalError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(SignalError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| SignalError::Malformed(e.without_url().to_string()))
    }
}

#[async_trait]
impl ExplorerApi for EtherscanClient {
    async fn has_code(&self, chain: Chain, address: &str) -> Result<bool, SignalError> {
        let response: ProxyResponse = self
            .query(
                chain,
                &[
                    ("module", "proxy"),
                    ("action", "eth_getCode"),
                    ("address", address),
                    ("tag", "latest"),
                ],
            )
            .await?;

        match response.result {
            Some(Value::String(code)) if code.starts_with("0x") => Ok(code != "0x"),
            Some(other) => Err(SignalError::Malformed(format!(
                "unexpected eth_getCode result: {other}"
            ))),
            None => Err(SignalError::Malformed("missing eth_getCode result".to_string())),
        }
    }

    async fn transaction_history(
        &self,
        chain: Chain,
        address: &str,
    ) -> Result<TxHistory, SignalError> {
        let response: TxListResponse = self
            .query(
                chain,
                &[
                    ("module", "account"),
                    ("action", "txlist"),
                    ("address", address),
                    ("startblock", "0"),
                    ("endblock", "99999999"),
                    ("page", "1"),
                    ("offset", "1"),
                    ("sort", "asc"),
                ],
            )
            .await?;

        if response.status != "1" {
            if response.message == NO_TRANSACTIONS_MESSAGE {
                return Ok(TxHistory::Empty);
            }
            return Err(SignalError::NoData(response.message));
        }

        let entries: Vec<TxEntry> = serde_json::from_value(response.result)
            .map_err(|e| SignalError::Malformed(e.to_string()))?;

        let Some(first) = entries.first() else {
            return Ok(TxHistory::Empty);
        };

        let seconds: i64 = first
            .time_stamp
            .parse()
            .map_err(|_| SignalError::Malformed(format!("bad timeStamp `{}`", first.time_stamp)))?;
        let first_seen = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| SignalError::Malformed(format!("timeStamp out of range: {seconds}")))?;

        Ok(TxHistory::FirstSeenAt(first_seen))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ADDR: &str = "0x1111111111111111111111111111111111111111";

    fn client(server: &MockServer) -> EtherscanClient {
        EtherscanClient::new(Some("test-key".into()))
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn missing_api_key_sends_nothing() {
        let server = MockServer::start().await;
        let explorer = EtherscanClient::new(None).unwrap().with_base_url(server.uri());

        assert!(!explorer.is_configured());
        assert!(matches!(
            explorer.has_code(Chain::Sepolia, ADDR).await,
            Err(SignalError::MissingApiKey)
        ));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        assert!(!EtherscanClient::new(Some("  ".into())).unwrap().is_configured());
    }

    #[tokio::test]
    async fn has_code_detects_contract_bytecode() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("action", "eth_getCode"))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0", "id": 1, "result": "0x6080604052"
            })))
            .mount(&server)
            .await;

        assert!(client(&server).has_code(Chain::Mainnet, ADDR).await.unwrap());
    }

    #[tokio::test]
    async fn has_code_false_for_externally_owned_account() {
        let server = MockServer::start().await;
        Mock::given(query_param("action", "eth_getCode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "0x" })))
            .mount(&server)
            .await;

        assert!(!client(&server).has_code(Chain::Sepolia, ADDR).await.unwrap());
    }

    #[tokio::test]
    async fn has_code_rejects_error_strings() {
        let server = MockServer::start().await;
        Mock::given(query_param("action", "eth_getCode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0", "message": "NOTOK", "result": "Invalid API Key"
            })))
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).has_code(Chain::Sepolia, ADDR).await,
            Err(SignalError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn http_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).has_code(Chain::Sepolia, ADDR).await,
            Err(SignalError::Status(502))
        ));
    }

    #[tokio::test]
    async fn history_returns_first_transaction_time() {
        let server = MockServer::start().await;
        Mock::given(query_param("action", "txlist"))
            .and(query_param("sort", "asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1", "message": "OK",
                "result": [{ "timeStamp": "1700000000", "hash": "0xabc" }]
            })))
            .mount(&server)
            .await;

        let history = client(&server)
            .transaction_history(Chain::Sepolia, ADDR)
            .await
            .unwrap();
        assert_eq!(
            history,
            TxHistory::FirstSeenAt(DateTime::from_timestamp(1_700_000_000, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn history_empty_list_and_no_transactions_message() {
        let server = MockServer::start().await;
        Mock::given(query_param("address", ADDR))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "1", "message": "OK", "result": []
            })))
            .mount(&server)
            .await;
        assert_eq!(
            client(&server).transaction_history(Chain::Sepolia, ADDR).await.unwrap(),
            TxHistory::Empty
        );

        let server = MockServer::start().await;
        Mock::given(query_param("address", ADDR))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0", "message": "No transactions found", "result": []
            })))
            .mount(&server)
            .await;
        assert_eq!(
            client(&server).transaction_history(Chain::Sepolia, ADDR).await.unwrap(),
            TxHistory::Empty
        );
    }

    #[tokio::test]
    async fn history_other_failures_are_no_data() {
        let server = MockServer::start().await;
        Mock::given(query_param("action", "txlist"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "0", "message": "NOTOK", "result": "Max rate limit reached"
            })))
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).transaction_history(Chain::Sepolia, ADDR).await,
            Err(SignalError::NoData(msg)) if msg == "NOTOK"
        ));
    }

    #[tokio::test]
    async fn history_garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(query_param("action", "txlist"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).transaction_history(Chain::Sepolia, ADDR).await,
            Err(SignalError::Malformed(_))
        ));
    }
}
