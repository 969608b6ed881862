// ABOUTME: Coach route handlers for student reports, AI analysis, and report chat
// ABOUTME: Every endpoint requires an approved coach session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fitplan_core::errors::AppError;
use fitplan_core::models::{Role, User};
use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_id;
use crate::middleware::require_role;
use crate::resources::ServerResources;
use crate::services::coach::{self, ChatTurn, NewReport};

/// Report creation request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    /// Report title
    pub title: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Free-form student data, text or JSON
    pub student_data: Option<Value>,
    /// Linked student account
    pub student_id: Option<String>,
}

/// Analysis request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Report to analyse
    pub report_id: Option<String>,
}

/// Report chat request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportChatRequest {
    /// Report under discussion
    pub report_id: Option<String>,
    /// Coach question
    pub message: Option<String>,
    /// Earlier turns of this conversation
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
}

/// Coach routes implementation
pub struct CoachRoutes;

impl CoachRoutes {
    /// Create coach routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/coach/reports",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/coach/reports/:id", get(Self::handle_get))
            .route("/api/coach/analyze", post(Self::handle_analyze))
            .route("/api/coach/chat", post(Self::handle_chat))
            .with_state(resources)
    }

    async fn authenticate_coach(
        resources: &ServerResources,
        headers: &HeaderMap,
    ) -> Result<User, AppError> {
        let user = resources.authenticator.authenticate(headers).await?;
        require_role(&user, Role::Coach)?;
        Ok(user)
    }

    /// Handle GET /api/coach/reports
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let coach = Self::authenticate_coach(&resources, &headers).await?;
        let reports = resources.database.list_coach_reports(coach.id).await?;
        Ok((StatusCode::OK, Json(json!({ "reports": reports }))).into_response())
    }

    /// Handle POST /api/coach/reports
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateReportRequest>,
    ) -> Result<Response, AppError> {
        let coach = Self::authenticate_coach(&resources, &headers).await?;
        let student_id = request
            .student_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .map(|id| parse_id(id, "Student"))
            .transpose()?;

        let report = coach::create_report(
            &resources.database,
            coach.id,
            NewReport {
                title: request.title,
                description: request.description,
                student_data: request.student_data,
                student_id,
            },
        )
        .await?;

        let body = json!({
            "success": true,
            "report": {
                "id": report.id,
                "title": report.title,
                "status": report.status,
                "createdAt": report.created_at,
            }
        });
        Ok((StatusCode::CREATED, Json(body)).into_response())
    }

    /// Handle GET /api/coach/reports/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let coach = Self::authenticate_coach(&resources, &headers).await?;
        let report_id = parse_id(&id, "Report")?;
        let report = coach::get_report(&resources.database, coach.id, report_id).await?;
        Ok((StatusCode::OK, Json(json!({ "report": report }))).into_response())
    }

    /// Handle POST /api/coach/analyze
    async fn handle_analyze(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<AnalyzeRequest>,
    ) -> Result<Response, AppError> {
        let coach = Self::authenticate_coach(&resources, &headers).await?;
        let report_id = request
            .report_id
            .ok_or_else(|| AppError::invalid_input("Report ID is required"))?;
        let report_id = parse_id(&report_id, "Report")?;

        let report =
            coach::analyze_report(&resources.database, resources.llm()?, coach.id, report_id)
                .await?;
        Ok((StatusCode::OK, Json(json!({ "success": true, "report": report }))).into_response())
    }

    /// Handle POST /api/coach/chat
    async fn handle_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<ReportChatRequest>,
    ) -> Result<Response, AppError> {
        let coach = Self::authenticate_coach(&resources, &headers).await?;
        let (Some(report_id), Some(message)) = (
            request.report_id,
            request.message.filter(|message| !message.trim().is_empty()),
        ) else {
            return Err(AppError::invalid_input("Report ID and message are required"));
        };
        let report_id = parse_id(&report_id, "Report")?;

        let response = coach::chat_about_report(
            &resources.database,
            resources.llm()?,
            coach.id,
            report_id,
            &message,
            &request.chat_history,
        )
        .await?;
        Ok((StatusCode::OK, Json(json!({ "success": true, "response": response }))).into_response())
    }
}
