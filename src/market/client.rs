// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! CoinGecko `simple/price` client.

use std::time::Duration;

use super::{PriceQuery, PriceTable};

/// Public CoinGecko API host.
pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com";

/// Header carrying the CoinGecko API key.
pub const API_KEY_HEADER: &str = "x-cg-pro-api-key";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// CoinGecko answered with a non-success status.
    #[error("coingecko returned HTTP {status}")]
    Upstream { status: u16 },

    #[error("market request failed: {0}")]
    Request(String),

    #[error("market response was malformed: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl std::fmt::Debug for CoinGeckoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoinGeckoClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, MarketError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MarketError::Request(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            http,
        })
    }

    /// Fetch current prices for `query`.
    pub async fn simple_price(&self, query: &PriceQuery) -> Result<PriceTable, MarketError> {
        let change = if query.include_change { "true" } else { "false" };
        let mut request = self
            .http
            .get(format!("{}/api/v3/simple/price", self.base_url))
            .query(&[
                ("ids", query.ids.as_str()),
                ("vs_currencies", query.vs.as_str()),
                ("include_24hr_change", change),
            ]);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarketError::Request(e.without_url().to_string()))?;

        if !response.status().is_success() {
            return Err(MarketError::Upstream {
                status: response.status().as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| MarketError::Malformed(e.without_url().to_string()))
    }
}
