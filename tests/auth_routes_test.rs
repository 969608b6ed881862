// ABOUTME: Integration tests for registration, login, sessions, and coach approval
// ABOUTME: Exercises the auth and admin routers through the full middleware stack
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{create_admin, create_test_app, create_test_database, token_for, TEST_PASSWORD};
use fitplan_server::config::ServerConfig;
use fitplan_server::resources::ServerResources;
use fitplan_server::routes::build_router;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

// ============================================================================
// Registration and Login
// ============================================================================

#[tokio::test]
async fn test_register_user_starts_a_session() {
    let (app, _resources) = create_test_app(None).await.unwrap();

    let response = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "Ana@Example.com",
            "password": "secret123",
        }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::CREATED);

    let cookie = response.header("set-cookie").unwrap();
    assert!(cookie.starts_with("auth="));
    assert!(cookie.contains("HttpOnly"));

    let body: Value = response.json();
    assert_eq!(body["user"]["email"], "ana@example.com");
    assert_eq!(body["user"]["name"], "ana");
    assert_eq!(body["user"]["role"], "USER");

    let token = body["token"].as_str().unwrap();
    let me: Value = AxumTestRequest::get("/api/me")
        .bearer(token)
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(me["user"]["email"], "ana@example.com");
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_short_passwords() {
    let (app, _resources) = create_test_app(None).await.unwrap();
    let form = json!({ "email": "dup@example.com", "password": "secret123" });

    AxumTestRequest::post("/api/auth/register")
        .json(&form)
        .send(app.clone())
        .await
        .assert_status(StatusCode::CREATED);

    AxumTestRequest::post("/api/auth/register")
        .json(&form)
        .send(app.clone())
        .await
        .assert_status(StatusCode::CONFLICT);

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "short@example.com", "password": "12345" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "not-an-email", "password": "secret123" }))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let (app, _resources) = create_test_app(None).await.unwrap();

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "bo@example.com", "password": "secret123" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "bo@example.com", "password": "wrong-pass" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::UNAUTHORIZED)
        .json();
    assert_eq!(body["error"]["code"], "AUTH_INVALID");
    assert_eq!(body["error"]["message"], "Invalid email or password");

    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "bo@example.com" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "BO@example.com", "password": "secret123" }))
        .send(app)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_session_cookie_authenticates_and_logout_clears_it() {
    let (app, _resources) = create_test_app(None).await.unwrap();

    let login = AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "cy@example.com", "password": "secret123" }))
        .send(app.clone())
        .await;
    let cookie = login.header("set-cookie").unwrap();
    let pair = cookie.split(';').next().unwrap().to_owned();

    AxumTestRequest::get("/api/me")
        .header("cookie", &pair)
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK);

    let logout = AxumTestRequest::post("/api/auth/logout")
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK);
    assert!(logout.header("set-cookie").unwrap().contains("Max-Age=0"));

    AxumTestRequest::get("/api/me")
        .send(app.clone())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    AxumTestRequest::get("/api/me")
        .bearer("not-a-token")
        .send(app)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Coach Approval
// ============================================================================

#[tokio::test]
async fn test_coach_must_be_approved_before_login() {
    let (app, resources) = create_test_app(None).await.unwrap();
    let admin = create_admin(&resources.database).await.unwrap();
    let admin_token = token_for(&resources, &admin).unwrap();

    let registered: Value = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "coach@example.com",
            "password": TEST_PASSWORD,
            "name": "Coach Kim",
            "role": "COACH",
        }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert!(registered.get("token").is_none());
    assert_eq!(registered["user"]["coachStatus"], "PENDING");
    let coach_id = registered["user"]["id"].as_str().unwrap().to_owned();

    let credentials = json!({ "email": "coach@example.com", "password": TEST_PASSWORD });
    AxumTestRequest::post("/api/auth/login")
        .json(&credentials)
        .send(app.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let applications: Value = AxumTestRequest::get("/api/admin/applications")
        .bearer(&admin_token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(applications["applications"].as_array().unwrap().len(), 1);

    let decision: Value = AxumTestRequest::post("/api/admin/approve")
        .bearer(&admin_token)
        .json(&json!({ "userId": coach_id }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(decision["success"], true);
    assert_eq!(decision["application"]["coachStatus"], "APPROVED");

    AxumTestRequest::post("/api/auth/login")
        .json(&credentials)
        .send(app)
        .await
        .assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_rejected_coach_stays_locked_out() {
    let (app, resources) = create_test_app(None).await.unwrap();
    let admin = create_admin(&resources.database).await.unwrap();
    let admin_token = token_for(&resources, &admin).unwrap();

    let registered: Value = AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "nope@example.com",
            "password": TEST_PASSWORD,
            "role": "COACH",
        }))
        .send(app.clone())
        .await
        .json();
    let coach_id = registered["user"]["id"].as_str().unwrap();

    AxumTestRequest::post("/api/admin/approve")
        .bearer(&admin_token)
        .json(&json!({ "userId": coach_id, "action": "reject" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK);

    AxumTestRequest::post("/api/auth/login")
        .json(&json!({ "email": "nope@example.com", "password": TEST_PASSWORD }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::post("/api/admin/approve")
        .bearer(&admin_token)
        .json(&json!({ "userId": coach_id, "action": "maybe" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::post("/api/admin/approve")
        .bearer(&admin_token)
        .json(&json!({}))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_routes_require_admin_role() {
    let (app, resources) = create_test_app(None).await.unwrap();

    let registered: Value = AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "plain@example.com", "password": "secret123" }))
        .send(app.clone())
        .await
        .json();
    let token = registered["token"].as_str().unwrap();

    AxumTestRequest::get("/api/admin/users")
        .bearer(token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    AxumTestRequest::get("/api/admin/users")
        .send(app.clone())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let admin = create_admin(&resources.database).await.unwrap();
    let users: Value = AxumTestRequest::get("/api/admin/users")
        .bearer(&token_for(&resources, &admin).unwrap())
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(users["users"].as_array().unwrap().len(), 2);
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let (app, _resources) = create_test_app(None).await.unwrap();

    let health = AxumTestRequest::get("/health")
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK);
    assert!(health.header("x-request-id").is_some());
    let health: Value = health.json();
    assert_eq!(health["status"], "healthy");

    let ready: Value = AxumTestRequest::get("/ready")
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(ready["aiConfigured"], false);
    assert!(ready["aiProvider"].is_null());
}

#[tokio::test]
async fn test_oversized_bodies_are_rejected() {
    let mut config = ServerConfig::for_testing();
    config.http.body_limit_bytes = 1024;
    let database = create_test_database().await.unwrap();
    let app = build_router(Arc::new(ServerResources::new(database, config, None)));

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({
            "email": "big@example.com",
            "password": "secret123",
            "name": "x".repeat(4096),
        }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    AxumTestRequest::post("/api/auth/register")
        .json(&json!({ "email": "small@example.com", "password": "secret123" }))
        .send(app)
        .await
        .assert_status(StatusCode::CREATED);
}
