// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cached market price proxy.

pub mod cache;
pub mod client;

use std::collections::BTreeMap;
use std::time::Duration;

use tracing::debug;

pub use cache::PriceCache;
pub use client::{CoinGeckoClient, MarketError, DEFAULT_COINGECKO_BASE_URL};

/// `{ <id>: { <vs>: price, <vs>_24h_change: pct } }` as returned upstream.
pub type PriceTable = BTreeMap<String, BTreeMap<String, Option<f64>>>;

pub const DEFAULT_IDS: &str = "bitcoin,ethereum";
pub const DEFAULT_VS_CURRENCY: &str = "usd";

/// How long a successful answer is served from cache.
pub const PRICE_CACHE_TTL: Duration = Duration::from_secs(60);
const PRICE_CACHE_CAPACITY: usize = 256;

/// Normalized price request, also used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PriceQuery {
    /// Comma-separated lowercase coin ids.
    pub ids: String,
    pub vs: String,
    pub include_change: bool,
}

impl PriceQuery {
    /// Build a query from raw request parameters, applying defaults for
    /// anything missing or blank.
    pub fn from_params(ids: Option<&str>, vs: Option<&str>, change: Option<&str>) -> Self {
        let ids = ids
            .map(|raw| {
                raw.split(',')
                    .map(|id| id.trim().to_ascii_lowercase())
                    .filter(|id| !id.is_empty())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .filter(|ids| !ids.is_empty())
            .unwrap_or_else(|| DEFAULT_IDS.to_string());

        let vs = vs
            .map(|raw| raw.trim().to_ascii_lowercase())
            .filter(|vs| !vs.is_empty())
            .unwrap_or_else(|| DEFAULT_VS_CURRENCY.to_string());

        let include_change = !matches!(
            change.map(|raw| raw.trim().to_ascii_lowercase()).as_deref(),
            Some("false" | "0" | "no")
        );

        Self {
            ids,
            vs,
            include_change,
        }
    }
}

/// Price lookups with a short-lived cache in front of CoinGecko.
pub struct MarketService {
    client: CoinGeckoClient,
    cache: PriceCache,
}

impl MarketService {
    pub fn new(client: CoinGeckoClient) -> Self {
        Self {
            client,
            cache: PriceCache::new(PRICE_CACHE_CAPACITY, PRICE_CACHE_TTL),
        }
    }

    /// Prices for `query`, from cache when fresh. Failures are never cached.
    pub async fn prices(&self, query: &PriceQuery) -> Result<PriceTable, MarketError> {
        if let Some(prices) = self.cache.get(query) {
            debug!(ids = %query.ids, vs = %query.vs, "price cache hit");
            return Ok(prices);
        }

        let prices = self.client.simple_price(query).await?;
        self.cache.put(query.clone(), prices.clone());
        Ok(prices)
    }
}
