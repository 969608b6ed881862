// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Provides liveness and database readiness endpoints for load balancers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::warn;

use crate::resources::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Liveness route; readiness is added by [`Self::readiness`]
    pub fn routes() -> Router {
        async fn health_handler() -> Json<serde_json::Value> {
            Json(json!({
                "status": "healthy",
                "service": fitplan_core::constants::service_names::FITPLAN_SERVER,
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        Router::new().route("/health", get(health_handler))
    }

    /// Readiness route that checks the database connection
    pub fn readiness(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/ready", get(Self::handle_ready))
            .with_state(resources)
    }

    async fn handle_ready(State(resources): State<Arc<ServerResources>>) -> Response {
        let database_ok = sqlx::query("SELECT 1")
            .execute(resources.database.pool())
            .await
            .map_err(|e| warn!(error = %e, "Readiness check failed"))
            .is_ok();

        let status = if database_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        let body = json!({
            "status": if database_ok { "ready" } else { "unavailable" },
            "database": database_ok,
            "aiConfigured": resources.llm().is_ok(),
            "aiProvider": resources.llm().ok().map(|llm| llm.display_name()),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        (status, Json(body)).into_response()
    }
}
