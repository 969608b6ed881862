// ABOUTME: Weekly report route handler
// ABOUTME: Reads an optional weekStart query parameter; malformed dates fall back to the latest week
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fitplan_core::errors::AppError;
use serde::Deserialize;

use crate::resources::ServerResources;
use crate::services::weekly_report::{parse_week_start, weekly_report};

/// Weekly report query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReportQuery {
    /// `YYYY-MM-DD` or `YYYY/MM/DD`
    pub week_start: Option<String>,
}

/// Report routes implementation
pub struct ReportRoutes;

impl ReportRoutes {
    /// Create report routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/reports/weekly", get(Self::handle_weekly))
            .with_state(resources)
    }

    /// Handle GET /api/reports/weekly
    async fn handle_weekly(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<WeeklyReportQuery>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let week_start = query.week_start.as_deref().and_then(parse_week_start);
        let report = weekly_report(&resources.database, user.id, week_start).await?;
        Ok((StatusCode::OK, Json(report)).into_response())
    }
}
