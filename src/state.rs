// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::api::cors::CorsPolicy;
use crate::config::Config;
use crate::market::{CoinGeckoClient, MarketError, MarketService};
use crate::risk::{EtherscanClient, ExplorerApi, RiskLists, RiskScorer, SignalError};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Explorer(#[from] SignalError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error("invalid CORS default origin: {0}")]
    Cors(String),
}

#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<RiskScorer>,
    pub market: Arc<MarketService>,
    pub cors: Arc<CorsPolicy>,
    /// Whether explorer lookups can run (API key present).
    pub explorer_configured: bool,
}

impl AppState {
    pub fn new(
        explorer: Arc<dyn ExplorerApi>,
        explorer_configured: bool,
        market: MarketService,
        cors: CorsPolicy,
    ) -> Self {
        Self {
            scorer: Arc::new(RiskScorer::new(explorer, RiskLists::default())),
            market: Arc::new(market),
            cors: Arc::new(cors),
            explorer_configured,
        }
    }

    /// Wire the production clients from `config`.
    pub fn from_config(config: &Config) -> Result<Self, StateError> {
        let explorer = EtherscanClient::new(config.etherscan_api_key.clone())?;
        let configured = explorer.is_configured();

        let market = MarketService::new(CoinGeckoClient::new(
            config.coingecko_base_url.clone(),
            config.coingecko_api_key.clone(),
        )?);

        let cors = CorsPolicy::new(
            config.cors_allowed_origins.iter().cloned(),
            &config.cors_default_origin,
        )
        .ok_or_else(|| StateError::Cors(config.cors_default_origin.clone()))?;

        Ok(Self::new(Arc::new(explorer), configured, market, cors))
    }
}
