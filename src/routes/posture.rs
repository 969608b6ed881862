// ABOUTME: Posture route handlers for photo upload and analysis history
// ABOUTME: Upload runs the vision model synchronously and returns the new analysis id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fitplan_core::errors::AppError;
use fitplan_core::models::PostureAnalysis;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use super::parse_id;
use crate::resources::ServerResources;
use crate::services::posture::{analyze_posture, get_owned_analysis, PostureImages};

/// Listing entry without the report body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureSummary {
    /// Analysis id
    pub id: Uuid,
    /// Upload time
    pub created_at: DateTime<Utc>,
    /// Front photo preview
    pub front_url: String,
    /// Side photo preview
    pub side_url: String,
    /// Back photo preview
    pub back_url: String,
}

impl From<PostureAnalysis> for PostureSummary {
    fn from(analysis: PostureAnalysis) -> Self {
        Self {
            id: analysis.id,
            created_at: analysis.created_at,
            front_url: analysis.front_url,
            side_url: analysis.side_url,
            back_url: analysis.back_url,
        }
    }
}

/// Posture routes implementation
pub struct PostureRoutes;

impl PostureRoutes {
    /// Create posture routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/posture/upload", post(Self::handle_upload))
            .route("/api/posture/list", get(Self::handle_list))
            .route("/api/posture/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle POST /api/posture/upload
    async fn handle_upload(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(images): Json<PostureImages>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let analysis =
            analyze_posture(&resources.database, resources.llm()?, user.id, &images).await?;

        let body = json!({
            "id": analysis.id,
            "message": "Analysis completed successfully",
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /api/posture/list
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let analyses: Vec<PostureSummary> = resources
            .database
            .list_posture_analyses(user.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok((StatusCode::OK, Json(json!({ "analyses": analyses }))).into_response())
    }

    /// Handle GET /api/posture/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let analysis_id = parse_id(&id, "Posture analysis")?;
        let analysis = get_owned_analysis(&resources.database, user.id, analysis_id).await?;
        Ok((StatusCode::OK, Json(analysis)).into_response())
    }
}
