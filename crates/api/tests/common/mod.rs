#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::{TimeZone, Utc};
use cowork_api::auth::jwt::{generate_access_token, JwtConfig};
use cowork_api::config::ServerConfig;
use cowork_api::engine::{BookingEngine, EngineConfig};
use cowork_api::middleware::auth::AuthUser;
use cowork_api::router::build_app_router;
use cowork_api::state::AppState;
use cowork_core::promo::DiscountKind;
use cowork_core::roles::{ROLE_ADMIN, ROLE_MEMBER};
use cowork_core::types::{DbId, Money, Timestamp};
use cowork_db::models::promo_code::{CreatePromoCode, PromoCode};
use cowork_db::models::space::{CreateSpace, Space};
use cowork_db::repositories::{PromoCodeRepo, SpaceRepo};
use cowork_events::EventBus;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        engine: EngineConfig {
            lock_timeout: Duration::from_secs(2),
        },
    }
}

/// Engine over `pool` publishing to `events`.
pub fn build_engine(pool: PgPool, events: Arc<EventBus>) -> BookingEngine {
    BookingEngine::new(pool, test_config().engine, events)
}

/// Build the full application router, with the production middleware
/// stack, over the given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let engine = Arc::new(build_engine(pool.clone(), Arc::new(EventBus::default())));

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        engine,
    };

    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

pub fn member(user_id: DbId) -> AuthUser {
    AuthUser {
        user_id,
        role: ROLE_MEMBER.to_string(),
    }
}

pub fn admin(user_id: DbId) -> AuthUser {
    AuthUser {
        user_id,
        role: ROLE_ADMIN.to_string(),
    }
}

pub fn member_token(user_id: DbId) -> String {
    generate_access_token(user_id, ROLE_MEMBER, &test_config().jwt).unwrap()
}

pub fn admin_token(user_id: DbId) -> String {
    generate_access_token(user_id, ROLE_ADMIN, &test_config().jwt).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A fixed instant on 2030-01-`day` (UTC), far enough ahead to be bookable.
pub fn at(day: u32, hour: u32, minute: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2030, 1, day, hour, minute, 0).unwrap()
}

/// A desk at 500/hour, 1000/day, 6000/week for up to 4 people.
pub async fn seed_space(pool: &PgPool, category: &str) -> Space {
    SpaceRepo::create(
        pool,
        &CreateSpace {
            name: format!("{category} test space"),
            category: category.to_string(),
            capacity: 4,
            per_hour: dec!(500),
            per_half_day: Some(dec!(1800)),
            per_day: dec!(1000),
            per_week: Some(dec!(6000)),
            is_available: Some(true),
        },
    )
    .await
    .unwrap()
}

/// An active promo code valid from yesterday for a year.
pub async fn seed_promo(
    pool: &PgPool,
    code: &str,
    kind: DiscountKind,
    value: Money,
    max_usage: Option<i32>,
) -> PromoCode {
    seed_promo_with(pool, code, kind, value, max_usage, Decimal::ZERO, Vec::new()).await
}

pub async fn seed_promo_with(
    pool: &PgPool,
    code: &str,
    kind: DiscountKind,
    value: Money,
    max_usage: Option<i32>,
    minimum_amount: Money,
    applicable_categories: Vec<String>,
) -> PromoCode {
    let now = Utc::now();
    PromoCodeRepo::create(
        pool,
        &CreatePromoCode {
            code: code.to_string(),
            discount_type: kind,
            discount_value: value,
            valid_from: now - chrono::Duration::days(1),
            valid_until: now + chrono::Duration::days(365),
            max_usage,
            minimum_amount: Some(minimum_amount),
            applicable_categories,
            is_active: Some(true),
        },
    )
    .await
    .unwrap()
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Parse a money field serialized as a decimal string.
pub fn money(value: &serde_json::Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body, None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::POST, uri, body, Some(token)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send_json(app, Method::PUT, uri, body, Some(token)).await
}

async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
