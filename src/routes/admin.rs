// ABOUTME: Administration route handlers for coach approval and user listing
// ABOUTME: Every endpoint requires an admin session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fitplan_core::errors::AppError;
use fitplan_core::models::{CoachStatus, Role, User};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::parse_id;
use crate::middleware::require_role;
use crate::resources::ServerResources;
use crate::services::accounts::{decide_coach_application, parse_decision};

/// Approval request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    /// Coach account to decide on
    pub user_id: Option<String>,
    /// `approve` (default) or `reject`
    pub action: Option<String>,
}

/// Pending or decided coach application
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachApplication {
    /// Coach id
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Approval state
    pub coach_status: Option<CoachStatus>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl From<User> for CoachApplication {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            coach_status: user.coach_status,
            created_at: user.created_at,
        }
    }
}

/// Account row in the admin user list
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListing {
    /// User id
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Account role
    pub role: Role,
    /// Point balance
    pub points: i64,
    /// Redeemed bronze badges
    pub bronze_badges: i64,
    /// Redeemed silver badges
    pub silver_badges: i64,
    /// Redeemed gold badges
    pub gold_badges: i64,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserListing {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            points: user.points,
            bronze_badges: user.bronze_badges,
            silver_badges: user.silver_badges,
            gold_badges: user.gold_badges,
            created_at: user.created_at,
        }
    }
}

/// Admin routes implementation
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/applications", get(Self::handle_applications))
            .route("/api/admin/approve", post(Self::handle_approve))
            .route("/api/admin/users", get(Self::handle_users))
            .with_state(resources)
    }

    async fn authenticate_admin(
        resources: &ServerResources,
        headers: &HeaderMap,
    ) -> Result<User, AppError> {
        let user = resources.authenticator.authenticate(headers).await?;
        require_role(&user, Role::Admin)?;
        Ok(user)
    }

    /// Handle GET /api/admin/applications
    async fn handle_applications(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::authenticate_admin(&resources, &headers).await?;
        let applications: Vec<CoachApplication> = resources
            .database
            .list_coach_applications()
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok((StatusCode::OK, Json(json!({ "applications": applications }))).into_response())
    }

    /// Handle POST /api/admin/approve
    async fn handle_approve(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ApproveRequest>,
    ) -> Result<Response, AppError> {
        let admin = Self::authenticate_admin(&resources, &headers).await?;
        let user_id = request
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::invalid_input("User ID is required"))?;
        let coach_id = parse_id(&user_id, "Coach")?;
        let status = parse_decision(request.action.as_deref())?;

        let coach =
            decide_coach_application(&resources.database, admin.id, coach_id, status).await?;
        let body = json!({
            "success": true,
            "application": CoachApplication::from(coach),
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /api/admin/users
    async fn handle_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        Self::authenticate_admin(&resources, &headers).await?;
        let users: Vec<UserListing> = resources
            .database
            .list_users()
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok((StatusCode::OK, Json(json!({ "users": users }))).into_response())
    }
}
