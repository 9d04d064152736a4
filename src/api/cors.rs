// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Allow-list CORS.
//!
//! Every response, including errors and the 404 fallback, carries CORS
//! headers. A caller whose origin is not on the list gets the configured
//! default origin echoed back, never `*`. Preflight requests are answered
//! here without reaching a handler.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const ALLOWED_METHODS: &str = "GET,OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";
pub const MAX_AGE_SECS: &str = "86400";

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed: HashSet<String>,
    default_origin: HeaderValue,
}

impl CorsPolicy {
    /// Returns `None` if `default_origin` is not a valid header value.
    pub fn new(allowed: impl IntoIterator<Item = String>, default_origin: &str) -> Option<Self> {
        Some(Self {
            allowed: allowed.into_iter().collect(),
            default_origin: HeaderValue::from_str(default_origin).ok()?,
        })
    }

    /// Origin to echo for a request carrying `origin`.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        origin
            .filter(|origin| {
                origin
                    .to_str()
                    .map(|origin| self.allowed.contains(origin))
                    .unwrap_or(false)
            })
            .cloned()
            .unwrap_or_else(|| self.default_origin.clone())
    }
}

/// Middleware applying [`CorsPolicy`] to every response.
pub async fn cors(State(policy): State<Arc<CorsPolicy>>, request: Request, next: Next) -> Response {
    let allow_origin = policy.allow_origin(request.headers().get(ORIGIN));

    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, allow_origin);
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE_SECS));
    response
}
