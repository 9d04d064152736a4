// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::any::Any;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};
use utoipa::IntoParams;

use crate::blockchain::Chain;
use crate::error::ApiError;
use crate::risk::scorer::FINDING_INTERNAL_ERROR;
use crate::risk::RiskAssessment;
use crate::state::AppState;

#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CheckQuery {
    /// Destination address, `0x` + 40 hex characters.
    pub address: Option<String>,
    /// `sepolia` (default), `mainnet` or `polygon`.
    pub chain: Option<String>,
}

impl CheckQuery {
    /// Parse a raw query string. A repeated key keeps its first value and
    /// unknown keys are ignored, so parsing never fails.
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "address" => &mut query.address,
                "chain" => &mut query.chain,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }
}

/// Score a destination address before sending funds to it.
#[utoipa::path(
    get,
    path = "/check",
    tag = "SafeSend",
    params(CheckQuery),
    responses(
        (status = 200, description = "Risk assessment", body = RiskAssessment),
        (status = 400, description = "Missing or malformed address"),
        (status = 500, description = "Internal failure; medium-risk default", body = RiskAssessment)
    )
)]
pub async fn check(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<RiskAssessment>, ApiError> {
    let query = CheckQuery::parse(raw.as_deref());
    let chain = Chain::from_query(query.chain.as_deref());
    let address = query.address.as_deref().unwrap_or_default();

    let assessment = state.scorer.assess(address, chain).await?;
    info!(
        %chain,
        score = assessment.score,
        findings = assessment.findings.len(),
        "SafeSend check"
    );
    Ok(Json(assessment))
}

/// Response served when the check handler panics.
pub fn fail_safe_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "SafeSend check handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(RiskAssessment::fail_safe(FINDING_INTERNAL_ERROR)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let query =
            CheckQuery::parse(Some("address=0xaa&chain=polygon&address=0xbb&chain=mainnet"));
        assert_eq!(query.address.as_deref(), Some("0xaa"));
        assert_eq!(query.chain.as_deref(), Some("polygon"));
    }

    #[test]
    fn missing_or_odd_query_strings_parse_to_empty() {
        for raw in [None, Some(""), Some("&&"), Some("foo=bar"), Some("address")] {
            let query = CheckQuery::parse(raw);
            assert!(query.chain.is_none());
            assert!(query.address.as_deref().unwrap_or_default().is_empty());
        }
    }

    #[test]
    fn values_are_percent_decoded() {
        let query = CheckQuery::parse(Some("address=%200x12+&chain=Sepolia"));
        assert_eq!(query.address.as_deref(), Some(" 0x12 "));
        assert_eq!(query.chain.as_deref(), Some("Sepolia"));
    }
}
