// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    http::{header::CACHE_CONTROL, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::market::{MarketError, PriceQuery};
use crate::state::AppState;

/// Matches the price cache TTL.
pub const PRICE_CACHE_CONTROL: &str = "public, max-age=60";

#[derive(Debug, Deserialize, IntoParams)]
pub struct PriceParams {
    /// Comma-separated CoinGecko coin ids. Defaults to `bitcoin,ethereum`.
    pub ids: Option<String>,
    /// Quote currency. Defaults to `usd`.
    pub vs: Option<String>,
    /// Include 24h change (`true`/`false`). Defaults to `true`.
    pub change: Option<String>,
}

/// CoinGecko answered with an error status.
#[derive(Debug, Serialize, ToSchema)]
pub struct UpstreamFailure {
    pub error: String,
    pub status: u16,
}

/// CoinGecko could not be reached or returned garbage.
#[derive(Debug, Serialize, ToSchema)]
pub struct FetchFailure {
    pub error: String,
    pub message: String,
}

/// Current prices, proxied from CoinGecko and cached briefly.
#[utoipa::path(
    get,
    path = "/market/price",
    tag = "Market",
    params(PriceParams),
    responses(
        (
            status = 200,
            description = "Price table keyed by coin id",
            body = std::collections::HashMap<String, std::collections::HashMap<String, f64>>
        ),
        (status = 500, description = "Upstream unreachable", body = FetchFailure),
        (status = "default", description = "Upstream error status passed through", body = UpstreamFailure)
    )
)]
pub async fn price(State(state): State<AppState>, Query(params): Query<PriceParams>) -> Response {
    let query = PriceQuery::from_params(
        params.ids.as_deref(),
        params.vs.as_deref(),
        params.change.as_deref(),
    );

    match state.market.prices(&query).await {
        Ok(prices) => ([(CACHE_CONTROL, PRICE_CACHE_CONTROL)], Json(prices)).into_response(),
        Err(MarketError::Upstream { status }) => {
            warn!(status, ids = %query.ids, "CoinGecko returned an error");
            let code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (
                code,
                Json(UpstreamFailure {
                    error: "coingecko_failed".to_string(),
                    status,
                }),
            )
                .into_response()
        }
        Err(e) => {
            warn!(error = %e, "market fetch failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FetchFailure {
                    error: "market_fetch_failed".to_string(),
                    message: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
