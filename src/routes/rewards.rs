// ABOUTME: Reward route handlers for the point balance, badge redemption, and ledger history
// ABOUTME: Redemption is guarded in the database so a balance can never go negative
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fitplan_core::errors::AppError;
use serde::Deserialize;
use serde_json::json;

use crate::resources::ServerResources;
use crate::services::rewards::{redeem, RewardSummary};

/// Redemption request
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    /// Badge display name, e.g. `Bronze Badge`
    pub kind: Option<String>,
}

/// Reward routes implementation
pub struct RewardRoutes;

impl RewardRoutes {
    /// Create reward routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/reward",
                get(Self::handle_summary).post(Self::handle_redeem),
            )
            .route("/api/reward/history", get(Self::handle_history))
            .with_state(resources)
    }

    /// Handle GET /api/reward
    async fn handle_summary(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        Ok((StatusCode::OK, Json(RewardSummary::for_user(&user))).into_response())
    }

    /// Handle POST /api/reward
    async fn handle_redeem(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<RedeemRequest>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let updated = redeem(&resources.database, user.id, request.kind.as_deref()).await?;

        let body = json!({
            "success": true,
            "rewards": RewardSummary::for_user(&updated),
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /api/reward/history
    async fn handle_history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let entries = resources.database.list_rewards(user.id).await?;
        Ok((StatusCode::OK, Json(json!({ "history": entries }))).into_response())
    }
}
