//! HTTP-level integration tests for reservation endpoints.
//!
//! Uses `tower::ServiceExt` to send requests directly to the router without
//! a TCP listener.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, build_test_app, get, get_auth, member_token, money, post_json,
    post_json_auth, put_json_auth, seed_promo, seed_space,
};
use cowork_core::promo::DiscountKind;
use rust_decimal_macros::dec;
use serde_json::json;
use sqlx::PgPool;

/// Create a reservation over HTTP and return its id.
async fn book(pool: &PgPool, token: &str, body: serde_json::Value) -> i64 {
    let response = post_json_auth(build_test_app(pool.clone()), "/api/v1/reservations", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_missing_token_is_401(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    let response = post_json(
        build_test_app(pool),
        "/api/v1/reservations",
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

// ---------------------------------------------------------------------------
// POST /reservations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_reservation_returns_201_with_server_price(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/reservations",
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:30:00Z",
            "participant_count": 2,
            "notes": "standup",
        }),
        &member_token(7),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["user_id"], 7);
    assert_eq!(data["status"], "pending");
    assert_eq!(data["pricing_unit"], "hour");
    assert_eq!(money(&data["gross_amount"]), dec!(1000));
    assert_eq!(money(&data["discount_amount"]), dec!(0));
    assert_eq!(data["space_name"], "desk test space");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_client_supplied_amount_is_ignored(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/reservations",
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
            "gross_amount": "1.00",
            "discount_amount": "500.00",
        }),
        &member_token(7),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(money(&json["data"]["gross_amount"]), dec!(500));
    assert_eq!(money(&json["data"]["discount_amount"]), dec!(0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_invalid_window_returns_400(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/reservations",
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T10:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
        }),
        &member_token(7),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_WINDOW");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_double_booking_returns_409(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    let window = json!({
        "space_id": space.id,
        "starts_at": "2030-01-07T09:00:00Z",
        "ends_at": "2030-01-07T12:00:00Z",
    });
    book(&pool, &member_token(1), window.clone()).await;

    let response = post_json_auth(
        build_test_app(pool),
        "/api/v1/reservations",
        window,
        &member_token(2),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "RESOURCE_UNAVAILABLE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_promo_rejection_fails_booking(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    seed_promo(&pool, "ONE", DiscountKind::FixedAmount, dec!(50), Some(1)).await;
    let body = |start: &str, end: &str| {
        json!({
            "space_id": space.id,
            "starts_at": start,
            "ends_at": end,
            "promo_code": "one",
        })
    };
    book(
        &pool,
        &member_token(1),
        body("2030-01-07T09:00:00Z", "2030-01-07T10:00:00Z"),
    )
    .await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/reservations",
        body("2030-01-07T11:00:00Z", "2030-01-07T12:00:00Z"),
        &member_token(2),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "PROMO_CODE_EXHAUSTED");

    let response = get_auth(
        build_test_app(pool),
        "/api/v1/reservations",
        &member_token(2),
    )
    .await;
    let json = body_json(response).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// PUT /reservations/{id}/window
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_window_reprices(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    let id = book(
        &pool,
        &member_token(7),
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
        }),
    )
    .await;

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/v1/reservations/{id}/window"),
        json!({"starts_at": "2030-01-07T09:00:00Z", "ends_at": "2030-01-09T09:00:00Z"}),
        &member_token(7),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["pricing_unit"], "day");
    assert_eq!(money(&json["data"]["gross_amount"]), dec!(2000));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_window_by_stranger_is_403(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    let id = book(
        &pool,
        &member_token(7),
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
        }),
    )
    .await;

    let response = put_json_auth(
        build_test_app(pool),
        &format!("/api/v1/reservations/{id}/window"),
        json!({"ends_at": "2030-01-07T11:00:00Z"}),
        &member_token(8),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_missing_reservation_is_404(pool: PgPool) {
    let response = put_json_auth(
        build_test_app(pool),
        "/api/v1/reservations/999999/window",
        json!({"ends_at": "2030-01-07T11:00:00Z"}),
        &member_token(8),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "BOOKING_NOT_FOUND");
}

// ---------------------------------------------------------------------------
// POST /reservations/{id}/cancel
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancel_twice_returns_same_reservation(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    let id = book(
        &pool,
        &member_token(7),
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
        }),
    )
    .await;
    let uri = format!("/api/v1/reservations/{id}/cancel");

    let first = post_json_auth(build_test_app(pool.clone()), &uri, json!({}), &member_token(7)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;

    let second = post_json_auth(build_test_app(pool), &uri, json!({}), &admin_token(1)).await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_json(second).await;

    assert_eq!(first["data"]["status"], "cancelled");
    assert_eq!(first["data"], second["data"]);
}

// ---------------------------------------------------------------------------
// Quotes and reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_quote_applies_promo_without_redeeming(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    seed_promo(&pool, "QUOTE10", DiscountKind::Percentage, dec!(10), Some(1)).await;
    let quote_body = json!({
        "space_id": space.id,
        "starts_at": "2030-01-07T09:00:00Z",
        "ends_at": "2030-01-07T11:00:00Z",
        "promo_code": "quote10",
    });

    for _ in 0..2 {
        let response = post_json_auth(
            build_test_app(pool.clone()),
            "/api/v1/reservations/quote",
            quote_body.clone(),
            &member_token(7),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(money(&json["data"]["gross_amount"]), dec!(1000));
        assert_eq!(money(&json["data"]["discount_amount"]), dec!(100));
        assert_eq!(money(&json["data"]["amount_due"]), dec!(900));
        assert_eq!(json["data"]["pricing_unit"], "hour");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_members_see_only_their_reservations(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    for (user, start, end) in [
        (1, "2030-01-07T09:00:00Z", "2030-01-07T10:00:00Z"),
        (2, "2030-01-07T10:00:00Z", "2030-01-07T11:00:00Z"),
        (2, "2030-01-07T11:00:00Z", "2030-01-07T12:00:00Z"),
    ] {
        book(
            &pool,
            &member_token(user),
            json!({"space_id": space.id, "starts_at": start, "ends_at": end}),
        )
        .await;
    }

    let response = get_auth(build_test_app(pool.clone()), "/api/v1/reservations", &member_token(2)).await;
    let json = body_json(response).await;
    let rows = json["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r["user_id"] == 2));

    let response = get_auth(build_test_app(pool.clone()), "/api/v1/reservations", &admin_token(99)).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 3);

    let response = get_auth(
        build_test_app(pool),
        "/api/v1/reservations?user_id=1&limit=10",
        &admin_token(99),
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_reservation_is_owner_or_admin_only(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;
    let id = book(
        &pool,
        &member_token(7),
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
        }),
    )
    .await;
    let uri = format!("/api/v1/reservations/{id}");

    let owner = get_auth(build_test_app(pool.clone()), &uri, &member_token(7)).await;
    assert_eq!(owner.status(), StatusCode::OK);

    let admin = get_auth(build_test_app(pool.clone()), &uri, &admin_token(1)).await;
    assert_eq!(admin.status(), StatusCode::OK);

    let stranger = get_auth(build_test_app(pool.clone()), &uri, &member_token(8)).await;
    assert_eq!(stranger.status(), StatusCode::FORBIDDEN);

    let anonymous = get(build_test_app(pool), &uri).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_oversized_body_is_rejected_before_booking(pool: PgPool) {
    let space = seed_space(&pool, "desk").await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/reservations",
        json!({
            "space_id": space.id,
            "starts_at": "2030-01-07T09:00:00Z",
            "ends_at": "2030-01-07T10:00:00Z",
            "notes": "x".repeat(32 * 1024),
        }),
        &member_token(7),
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(response.headers().contains_key("x-request-id"));
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reservations")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 0);
}
