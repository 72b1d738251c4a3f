use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use tower::ServiceExt;

use rentflow_core::config::AppConfig;
use rentflow_core::traits::ManualClock;
use rentflow_core::types::TenantId;
use rentflow_database::Persistence;

use crate::{AppState, build_router};

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
    tenant: String,
}

impl TestApp {
    fn new() -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 6, 10, 0, 0).unwrap(),
        ));
        let state = AppState::new(AppConfig::default(), Persistence::memory(), clock.clone());
        Self {
            router: build_router(state),
            clock,
            tenant: TenantId::new().to_string(),
        }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(Some(&self.tenant), method, uri, body).await
    }

    async fn send_as(
        &self,
        tenant: Option<&str>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tenant) = tenant {
            builder = builder.header("x-tenant-id", tenant);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create_asset(&self, name: &str) -> String {
        let (status, body) = self
            .send(Method::POST, "/api/v1/assets", Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn create_hourly_rule(&self, price: &str) {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/v1/pricing/rules",
                Some(json!({ "name": "Standard", "billing_type": "per_hour", "price": price })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn start(&self, asset_id: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/sessions/start",
            Some(json!({ "asset_id": asset_id })),
        )
        .await
    }
}

fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, body) = app.send_as(None, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");

    let (status, body) = app
        .send_as(None, Method::GET, "/api/v1/health/detailed", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["backend"], "memory");
}

#[tokio::test]
async fn test_missing_tenant_header_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app.send_as(None, Method::GET, "/api/v1/assets", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION");

    let (status, _) = app
        .send_as(Some("not-a-uuid"), Method::GET, "/api/v1/assets", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_lifecycle_over_http() {
    let app = TestApp::new();
    let asset_id = app.create_asset("Table 1").await;
    app.create_hourly_rule("10000").await;

    let (status, body) = app.start(&asset_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "active");
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app.start(&asset_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ASSET_ALREADY_OCCUPIED");

    let (_, body) = app
        .send(Method::GET, &format!("/api/v1/assets/{asset_id}"), None)
        .await;
    assert_eq!(body["data"]["active_session"]["id"], session_id.as_str());

    app.clock.advance(Duration::minutes(30));
    let (status, body) = app
        .send(Method::GET, &format!("/api/v1/sessions/{session_id}/cost"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decimal(&body["data"]["cost"]), dec!(5000));

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/stop"),
            Some(json!({ "payment_type": "cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["session"]["status"], "completed");
    assert_eq!(decimal(&body["data"]["session"]["total_cost"]), dec!(5000));

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/stop"),
            Some(json!({ "payment_type": "cash" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "SESSION_ALREADY_CLOSED");

    let (status, body) = app.start(&asset_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "active");
}

#[tokio::test]
async fn test_start_without_rate_is_unprocessable() {
    let app = TestApp::new();
    let asset_id = app.create_asset("Lane 3").await;

    let (status, body) = app.start(&asset_id).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "NO_APPLICABLE_RATE");
}

#[tokio::test]
async fn test_invalid_bodies_are_rejected() {
    let app = TestApp::new();
    let asset_id = app.create_asset("Console 2").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/sessions/start",
            Some(json!({ "asset_id": asset_id, "planned_duration": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION");

    let (status, _) = app
        .send(Method::POST, "/api/v1/sessions/start", Some(json!({ "asset": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(Method::POST, "/api/v1/assets", Some(json!({ "name": "" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_promotion_code_is_not_an_error() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/promotions/validate",
            Some(json!({ "code": "NOPE" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["applied"], false);
    assert_eq!(body["data"]["reason"], "PROMOTION_NOT_FOUND");
}

#[tokio::test]
async fn test_promotion_applies_on_stop() {
    let app = TestApp::new();
    let asset_id = app.create_asset("Room A").await;
    app.create_hourly_rule("10000").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/promotions",
            Some(json!({
                "name": "Spring",
                "code": "spring10",
                "discount_type": "percentage",
                "discount_value": "10",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.start(&asset_id).await;
    let session_id = body["data"]["id"].as_str().unwrap().to_string();
    app.clock.advance(Duration::minutes(60));

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/stop"),
            Some(json!({ "payment_type": "card", "promotion_code": "SPRING10" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["promotion"]["applied"], true);
    assert_eq!(decimal(&body["data"]["session"]["total_cost"]), dec!(9000));
}

#[tokio::test]
async fn test_sessions_are_tenant_scoped() {
    let app = TestApp::new();
    let asset_id = app.create_asset("Table 9").await;
    app.create_hourly_rule("6000").await;
    let (_, body) = app.start(&asset_id).await;
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    let other = TenantId::new().to_string();
    let (status, _) = app
        .send_as(
            Some(&other),
            Method::GET,
            &format!("/api/v1/sessions/{session_id}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .send(Method::GET, "/api/v1/sessions?status=active", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_items"], 1);

    let (_, body) = app
        .send(Method::GET, "/api/v1/sessions?status=completed", None)
        .await;
    assert_eq!(body["data"]["total_items"], 0);
}

#[tokio::test]
async fn test_cancel_and_delete_asset() {
    let app = TestApp::new();
    let asset_id = app.create_asset("Kart 4").await;
    app.create_hourly_rule("8000").await;
    let (_, body) = app.start(&asset_id).await;
    let session_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/v1/assets/{asset_id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "ASSET_ALREADY_OCCUPIED");

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/v1/sessions/{session_id}/cancel"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");

    let (status, body) = app
        .send(
            Method::GET,
            &format!("/api/v1/assets/{asset_id}/sessions"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tenant_settings_round_trip() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::PUT,
            "/api/v1/tenant/settings",
            Some(json!({ "currency": "VND", "default_price": "12000" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["currency"], "VND");

    let (_, body) = app.send(Method::GET, "/api/v1/tenant/settings", None).await;
    assert_eq!(decimal(&body["data"]["default_price"]), dec!(12000));
}
