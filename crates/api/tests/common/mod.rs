//! Shared fixtures for API boundary tests.
//!
//! These tests run against a lazily-connecting pool pointing at an
//! unreachable database: any handler path that touches the database fails,
//! so a clean 401/422 response proves the rejection happened before any
//! record was read or written.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

use leasevault_api::config::ServerConfig;
use leasevault_api::router::build_app_router;
use leasevault_api::state::AppState;
use leasevault_core::cache::TtlCache;
use leasevault_notify::LogMailer;
use leasevault_storage::LocalStorage;

/// Shared secret the test webhook deliveries are signed with.
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Bearer token accepted by the scan trigger in tests.
pub const TEST_SCAN_TOKEN: &str = "test-scan-token";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        payment_webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        scan_token: TEST_SCAN_TOKEN.to_string(),
        stats_cache_ttl_secs: 60,
    }
}

/// A pool that only fails once a handler actually touches the database.
pub fn unreachable_pool() -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(1))
        .connect_lazy("postgres://localhost:1/leasevault_unreachable")
        .expect("lazy pool construction cannot fail")
}

/// Build the full application router with all middleware layers, using the
/// given database pool. Mirrors the router construction in `main.rs` so the
/// tests exercise the same stack production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: Arc::new(LogMailer),
        storage: Arc::new(LocalStorage::new(std::env::temp_dir().join("leasevault-api-tests"))),
        stats_cache: Arc::new(TtlCache::new(Duration::from_secs(60))),
    };
    build_app_router(state, &config)
}

/// Send a GET request to the app.
pub async fn get(app: Router, path: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(path)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body and optional extra headers.
pub async fn post(app: Router, path: &str, headers: &[(&str, &str)], body: &str) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

/// Collect a response body into JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
