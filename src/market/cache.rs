// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! LRU cache for price lookups.
//!
//! Successful upstream answers are kept per normalized query for a short
//! TTL so a burst of identical requests costs one CoinGecko call.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use super::{PriceQuery, PriceTable};

struct CacheEntry {
    prices: PriceTable,
    inserted_at: Instant,
}

/// In-process LRU cache keyed by normalized price query.
pub struct PriceCache {
    cache: Mutex<LruCache<PriceQuery, CacheEntry>>,
    ttl: Duration,
}

impl PriceCache {
    /// - `capacity`: max number of distinct queries kept.
    /// - `ttl`: time-to-live for each entry.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Cached table for `query`, or `None` if absent or expired.
    pub fn get(&self, query: &PriceQuery) -> Option<PriceTable> {
        let mut cache = self.cache.lock().ok()?;
        if let Some(entry) = cache.get(query) {
            if entry.inserted_at.elapsed() < self.ttl {
                return Some(entry.prices.clone());
            }
            cache.pop(query);
        }
        None
    }

    pub fn put(&self, query: PriceQuery, prices: PriceTable) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                query,
                CacheEntry {
                    prices,
                    inserted_at: Instant::now(),
                },
            );
        }
    }
}
