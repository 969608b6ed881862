// ABOUTME: Weekly checklist route handlers: listing, creation, item toggles, and week completion
// ABOUTME: Item toggles move points through the ledger; completion rolls over to a new week
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Checklist routes
//!
//! `PATCH` and `POST` on `/api/todos/:todoId/:itemId` are equivalent. A
//! missing `completed` flag is read as `false`, i.e. an uncheck.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use fitplan_core::errors::AppError;
use serde::Deserialize;
use serde_json::json;

use super::parse_id;
use crate::resources::ServerResources;
use crate::services::todos;

/// Item toggle request
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    /// Desired item state
    pub completed: Option<bool>,
}

/// Todo routes implementation
pub struct TodoRoutes;

impl TodoRoutes {
    /// Create checklist routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/todos", get(Self::handle_list))
            .route("/api/todos/create", post(Self::handle_create))
            .route("/api/todos/latest", get(Self::handle_latest))
            .route("/api/todos/:todo_id", get(Self::handle_get))
            .route("/api/todos/:todo_id/complete", post(Self::handle_complete))
            .route(
                "/api/todos/:todo_id/:item_id",
                patch(Self::handle_toggle).post(Self::handle_toggle),
            )
            .with_state(resources)
    }

    /// Handle GET /api/todos
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let todos = todos::list_todos(&resources.database, user.id).await?;
        Ok((StatusCode::OK, Json(json!({ "todos": todos }))).into_response())
    }

    /// Handle POST /api/todos/create
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let todo = todos::create_from_latest_plan(&resources.database, user.id).await?;
        Ok((StatusCode::CREATED, Json(json!({ "todo": todo }))).into_response())
    }

    /// Handle GET /api/todos/latest
    async fn handle_latest(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let todo = todos::latest_open_todo(&resources.database, user.id).await?;
        Ok((StatusCode::OK, Json(json!({ "todo": todo }))).into_response())
    }

    /// Handle GET /api/todos/:todo_id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(todo_id): Path<String>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let todo_id = parse_id(&todo_id, "Todo")?;
        let todo = todos::get_todo(&resources.database, user.id, todo_id).await?;
        Ok((StatusCode::OK, Json(json!({ "todo": todo }))).into_response())
    }

    /// Handle PATCH|POST /api/todos/:todo_id/:item_id
    async fn handle_toggle(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path((todo_id, item_id)): Path<(String, String)>,
        Json(request): Json<ToggleRequest>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let todo_id = parse_id(&todo_id, "Todo")?;
        let item_id = parse_id(&item_id, "Checklist item")?;

        let outcome = todos::toggle_item(
            &resources.database,
            user.id,
            todo_id,
            item_id,
            request.completed.unwrap_or(false),
        )
        .await?;
        Ok((StatusCode::OK, Json(outcome)).into_response())
    }

    /// Handle POST /api/todos/:todo_id/complete
    async fn handle_complete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(todo_id): Path<String>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let todo_id = parse_id(&todo_id, "Todo")?;
        let rollover = todos::complete_and_roll_over(&resources.database, user.id, todo_id).await?;

        let body = json!({
            "completed": true,
            "newTodo": rollover.next,
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }
}
