// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{http::StatusCode, middleware, routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    blockchain::Chain,
    risk::RiskAssessment,
    state::AppState,
};

pub mod check;
pub mod cors;
pub mod health;
pub mod market;

pub fn router(state: AppState) -> Router {
    let cors_policy = state.cors.clone();

    Router::new()
        .route(
            "/check",
            get(check::check).layer(CatchPanicLayer::custom(check::fail_safe_response)),
        )
        .route("/market/price", get(market::price))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(middleware::from_fn_with_state(cors_policy, cors::cors))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

#[derive(OpenApi)]
#[openapi(
    paths(
        check::check,
        market::price,
        health::health,
        health::readiness
    ),
    components(
        schemas(
            RiskAssessment,
            Chain,
            market::UpstreamFailure,
            market::FetchFailure,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "SafeSend", description = "Destination address risk scoring"),
        (name = "Market", description = "Cached price proxy"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::cors::CorsPolicy;
    use crate::market::{CoinGeckoClient, MarketService};
    use crate::risk::scorer::tests::FakeExplorer;
    use crate::risk::{ExplorerApi, TxHistory};

    const DEFAULT_ORIGIN: &str = "https://agethejedi.github.io";

    fn state_with(explorer: Arc<dyn ExplorerApi>, market_url: &str) -> AppState {
        AppState::new(
            explorer,
            true,
            MarketService::new(CoinGeckoClient::new(market_url, None).unwrap()),
            CorsPolicy::new([DEFAULT_ORIGIN.to_string()], DEFAULT_ORIGIN).unwrap(),
        )
    }

    fn quiet_explorer() -> Arc<dyn ExplorerApi> {
        Arc::new(FakeExplorer {
            code: || Ok(false),
            history: || Ok(TxHistory::Empty),
        })
    }

    /// URL of a local port nothing listens on.
    fn closed_port_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}")
    }

    fn app() -> Router {
        router(state_with(quiet_explorer(), "http://127.0.0.1:9"))
    }

    async fn send_get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let _ = app().into_make_service();
    }

    #[tokio::test]
    async fn check_scores_new_account() {
        let response = send_get(
            app(),
            "/check?address=0x5555555555555555555555555555555555555555&chain=mainnet",
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            DEFAULT_ORIGIN
        );
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(
            json_body(response).await,
            json!({ "score": 50, "findings": ["No transactions (new account)"] })
        );
    }

    #[tokio::test]
    async fn check_blocklisted_address() {
        let response = send_get(
            app(),
            "/check?address=0x000000000000000000000000000000000000dead",
        )
        .await;

        assert_eq!(
            json_body(response).await,
            json!({ "score": 95, "findings": ["Blocklist match: known scam"] })
        );
    }

    #[tokio::test]
    async fn check_rejects_missing_or_malformed_address() {
        for uri in ["/check", "/check?address=0x123", "/check?address=hello&chain=polygon"] {
            let response = send_get(app(), uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await, json!({ "error": "address required" }));
        }
    }

    #[tokio::test]
    async fn check_uses_first_of_repeated_parameters() {
        let response = send_get(
            app(),
            "/check?address=0x000000000000000000000000000000000000dead\
             &address=0x6666666666666666666666666666666666666666",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["score"], 95);

        let response = send_get(
            app(),
            "/check?address=0x123&address=0x000000000000000000000000000000000000dead",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "address required" }));
    }

    #[tokio::test]
    async fn check_panic_fails_safe_with_cors() {
        let explorer = Arc::new(FakeExplorer {
            code: || panic!("explorer exploded"),
            history: || Ok(TxHistory::Empty),
        });
        let app = router(state_with(explorer, "http://127.0.0.1:9"));

        let response = send_get(app, "/check?address=0x5555555555555555555555555555555555555555").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            DEFAULT_ORIGIN
        );

        let body = json_body(response).await;
        assert_eq!(body["score"], 50);
        assert_eq!(body["findings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_path_is_404_with_cors() {
        let response = send_get(app(), "/nope").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            DEFAULT_ORIGIN
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"Not Found");
    }

    #[tokio::test]
    async fn preflight_is_answered_for_any_path() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/check")
                    .header(header::ORIGIN, "https://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            DEFAULT_ORIGIN
        );
    }

    #[tokio::test]
    async fn health_reports_build() {
        let response = send_get(app(), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({ "ok": true, "build": "safesend-rust-v1" })
        );
    }

    #[tokio::test]
    async fn readiness_degrades_without_explorer_key() {
        let mut state = state_with(quiet_explorer(), "http://127.0.0.1:9");
        state.explorer_configured = false;

        let response = send_get(router(state), "/health/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["checks"]["explorer"], "unconfigured");
    }

    #[tokio::test]
    async fn market_price_is_cached_and_marked_cacheable() {
        let server = MockServer::start().await;
        Mock::given(path("/api/v3/simple/price"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bitcoin": { "usd": 65000.0, "usd_24h_change": 1.5 }
            })))
            .expect(1)
            .mount(&server)
            .await;
        let app = router(state_with(quiet_explorer(), &server.uri()));

        for _ in 0..2 {
            let response = send_get(app.clone(), "/market/price?ids=bitcoin").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.headers()[header::CACHE_CONTROL],
                "public, max-age=60"
            );
            assert_eq!(json_body(response).await["bitcoin"]["usd"], 65000.0);
        }
    }

    #[tokio::test]
    async fn market_upstream_status_is_passed_through() {
        let server = MockServer::start().await;
        Mock::given(path("/api/v3/simple/price"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let response = send_get(router(state_with(quiet_explorer(), &server.uri())), "/market/price").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "coingecko_failed", "status": 429 })
        );
    }

    #[tokio::test]
    async fn market_unreachable_is_500() {
        let uri = closed_port_url();
        let response = send_get(router(state_with(quiet_explorer(), &uri)), "/market/price").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "market_fetch_failed");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = send_get(app(), "/api-doc/openapi.json").await;
        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"].get("/check").is_some());
    }
}
