// ABOUTME: Profile route handlers for viewing and editing body measurements
// ABOUTME: Partial updates leave absent fields unchanged
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use fitplan_core::errors::AppError;
use fitplan_core::models::{Role, User};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::resources::ServerResources;
use crate::services::accounts::{self, ProfileInput};

/// Profile fields returned to the owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// User id
    pub id: Uuid,
    /// Login email
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Account role
    pub role: Role,
    /// Height in centimetres
    pub height_cm: Option<i64>,
    /// Weight in kilograms
    pub weight_kg: Option<i64>,
    /// Free-text sex
    pub sex: Option<String>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
    /// Point balance
    pub points: i64,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            height_cm: user.height_cm,
            weight_kg: user.weight_kg,
            sex: user.sex,
            birth_date: user.birth_date,
            points: user.points,
            created_at: user.created_at,
        }
    }
}

/// Profile routes implementation
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create profile routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/profile",
                get(Self::handle_get).put(Self::handle_update),
            )
            .with_state(resources)
    }

    /// Handle GET /api/profile
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let body = json!({ "user": ProfileResponse::from(user) });
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle PUT /api/profile
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(input): Json<ProfileInput>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let updated = accounts::update_profile(&resources.database, user.id, input).await?;
        let body = json!({ "user": ProfileResponse::from(updated) });
        Ok((StatusCode::OK, Json(body)).into_response())
    }
}
