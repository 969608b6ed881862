// ABOUTME: Route module organization for the FitPlan HTTP API
// ABOUTME: Merges every domain router and wraps it in tracing, limits, CORS, and security headers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the FitPlan server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that authenticate, parse the request, and delegate to
//! [`crate::services`].

/// Coach approval and user listing
pub mod admin;
/// Constitution questionnaire
pub mod assessments;
/// Registration, login, logout, and session identity
pub mod auth;
/// Coach reports, AI analysis, and chat
pub mod coach;
/// Health and readiness probes
pub mod health;
/// Plan generation, retrieval, and chat revision
pub mod plans;
/// Posture photo upload and analysis history
pub mod posture;
/// Profile view and edit
pub mod profile;
/// Weekly completion report
pub mod reports;
/// Point balance, badge redemption, and ledger history
pub mod rewards;
/// Weekly checklists and item toggles
pub mod todos;

pub use admin::AdminRoutes;
pub use assessments::AssessmentRoutes;
pub use auth::AuthRoutes;
pub use coach::CoachRoutes;
pub use health::HealthRoutes;
pub use plans::PlanRoutes;
pub use posture::PostureRoutes;
pub use profile::ProfileRoutes;
pub use reports::ReportRoutes;
pub use rewards::RewardRoutes;
pub use todos::TodoRoutes;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::Router;
use fitplan_core::errors::{AppError, AppResult};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::middleware::{make_request_span, setup_cors};
use crate::resources::ServerResources;
use crate::security::apply_security_headers;

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let config = Arc::clone(&resources.config);

    let api = Router::new()
        .merge(HealthRoutes::routes())
        .merge(HealthRoutes::readiness(Arc::clone(&resources)))
        .merge(AuthRoutes::routes(Arc::clone(&resources)))
        .merge(ProfileRoutes::routes(Arc::clone(&resources)))
        .merge(AssessmentRoutes::routes(Arc::clone(&resources)))
        .merge(PostureRoutes::routes(Arc::clone(&resources)))
        .merge(PlanRoutes::routes(Arc::clone(&resources)))
        .merge(TodoRoutes::routes(Arc::clone(&resources)))
        .merge(RewardRoutes::routes(Arc::clone(&resources)))
        .merge(ReportRoutes::routes(Arc::clone(&resources)))
        .merge(CoachRoutes::routes(Arc::clone(&resources)))
        .merge(AdminRoutes::routes(resources));

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.http.request_timeout_secs),
        ))
        .layer(DefaultBodyLimit::max(config.http.body_limit_bytes));

    let router = api.layer(middleware).layer(setup_cors(&config));
    apply_security_headers(router, config.environment)
}

/// Parse an identifier from a path segment or body field
///
/// A malformed identifier can never match a row, so it is reported as
/// `ResourceNotFound` for `resource`.
pub(crate) fn parse_id(raw: &str, resource: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::not_found(resource))
}
