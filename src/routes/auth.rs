// ABOUTME: Authentication route handlers for registration, login, logout, and session identity
// ABOUTME: Issues the auth cookie for members and approved coaches; coaches register as pending
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Authentication routes
//!
//! Successful logins set the `auth` cookie and also return the token in the
//! body so non-browser clients can send it as a `Bearer` header.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fitplan_core::errors::AppError;
use fitplan_core::models::{CoachStatus, Role, User};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::resources::ServerResources;
use crate::security::cookies::{clear_session_cookie, session_cookie};
use crate::services::accounts::{self, Registration};

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Login email
    pub email: Option<String>,
    /// Plain password
    pub password: Option<String>,
}

/// Identity returned by the session endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// User id
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Account role
    pub role: Role,
    /// Approval state, coaches only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coach_status: Option<CoachStatus>,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            coach_status: user.coach_status,
        }
    }
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::handle_register))
            .route("/api/auth/login", post(Self::handle_login))
            .route("/api/auth/logout", post(Self::handle_logout))
            .route("/api/me", get(Self::handle_me))
            .with_state(resources)
    }

    /// Build a response that starts a session for `user`
    fn with_session(
        resources: &ServerResources,
        user: &User,
        status: StatusCode,
    ) -> Result<Response, AppError> {
        let token = resources.auth_manager.generate_token(user)?;
        let cookie = session_cookie(
            &token,
            resources.auth_manager.token_lifetime_secs(),
            resources.config.auth.secure_cookies,
        )?;
        let body = json!({ "user": SessionUser::from(user), "token": token });
        Ok((status, [(header::SET_COOKIE, cookie)], Json(body)).into_response())
    }

    /// Handle POST /api/auth/register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(form): Json<Registration>,
    ) -> Result<Response, AppError> {
        let user = accounts::register(
            &resources.database,
            form,
            resources.config.auth.bcrypt_cost,
        )
        .await?;

        if user.role == Role::Coach {
            let body = json!({
                "message": "Coach application submitted. Please wait for admin approval.",
                "user": SessionUser::from(&user),
            });
            return Ok((StatusCode::CREATED, Json(body)).into_response());
        }

        Self::with_session(&resources, &user, StatusCode::CREATED)
    }

    /// Handle POST /api/auth/login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let (Some(email), Some(password)) = (request.email, request.password) else {
            return Err(AppError::invalid_input("Email and password are required"));
        };
        let user = accounts::login(&resources.database, &email, &password).await?;
        Self::with_session(&resources, &user, StatusCode::OK)
    }

    /// Handle POST /api/auth/logout
    async fn handle_logout(State(resources): State<Arc<ServerResources>>) -> Response {
        let cookie = clear_session_cookie(resources.config.auth.secure_cookies);
        (
            StatusCode::OK,
            [(header::SET_COOKIE, cookie)],
            Json(json!({ "success": true })),
        )
            .into_response()
    }

    /// Handle GET /api/me
    async fn handle_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let body = json!({ "user": SessionUser::from(&user) });
        Ok((StatusCode::OK, Json(body)).into_response())
    }
}
