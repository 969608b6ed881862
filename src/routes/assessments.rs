// ABOUTME: Constitution questionnaire route handlers
// ABOUTME: Scores submitted answers and lists the caller's past assessments
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fitplan_core::errors::AppError;
use fitplan_core::models::{Assessment, Constitution, ConstitutionScores};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resources::ServerResources;
use crate::services::assessment::submit_assessment;

/// Questionnaire submission
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    /// `<bucket>_<question>` to answer value
    pub answers: Option<BTreeMap<String, i64>>,
    /// Questionnaire revision, defaults to 1
    pub questionnaire_version: Option<i64>,
}

/// Stored assessment without the raw answers
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    /// Assessment id
    pub id: Uuid,
    /// Chosen constitution
    pub constitution: Constitution,
    /// Per-bucket sums
    pub scores: ConstitutionScores,
    /// Questionnaire revision
    pub questionnaire_version: i64,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

impl From<Assessment> for AssessmentResponse {
    fn from(assessment: Assessment) -> Self {
        Self {
            id: assessment.id,
            constitution: assessment.constitution,
            scores: assessment.scores,
            questionnaire_version: assessment.questionnaire_version,
            created_at: assessment.created_at,
        }
    }
}

/// Assessment routes implementation
pub struct AssessmentRoutes;

impl AssessmentRoutes {
    /// Create assessment routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/assessment",
                get(Self::handle_list).post(Self::handle_submit),
            )
            .with_state(resources)
    }

    /// Handle POST /api/assessment
    async fn handle_submit(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AssessmentRequest>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let answers = request
            .answers
            .ok_or_else(|| AppError::invalid_input("Invalid payload"))?;

        let assessment = submit_assessment(
            &resources.database,
            user.id,
            answers,
            request.questionnaire_version,
        )
        .await?;

        Ok((StatusCode::CREATED, Json(AssessmentResponse::from(assessment))).into_response())
    }

    /// Handle GET /api/assessment
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let assessments: Vec<AssessmentResponse> = resources
            .database
            .list_assessments(user.id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok((StatusCode::OK, Json(assessments)).into_response())
    }
}
