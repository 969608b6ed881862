// ABOUTME: Plan route handlers for AI generation, retrieval, listing, and chat revision
// ABOUTME: Plan views carry the constitution of the assessment the plan was built from
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{Constitution, Plan};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::parse_id;
use crate::database::Database;
use crate::resources::ServerResources;
use crate::services::plans::{generate_plan, get_owned_plan, revise_plan};

/// Chat revision request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanChatRequest {
    /// Plan to revise
    pub plan_id: Option<String>,
    /// What the user wants changed
    pub message: Option<String>,
}

/// Constitution of the source assessment
#[derive(Debug, Serialize)]
pub struct AssessmentRef {
    /// Constitution chosen by that assessment
    pub constitution: Constitution,
}

/// Plan as returned to its owner
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    /// Plan id
    pub id: Uuid,
    /// Plan document
    pub content: Value,
    /// Generation time
    pub created_at: DateTime<Utc>,
    /// Source assessment, if it still exists
    pub assessment: Option<AssessmentRef>,
}

/// Resolve plan views, loading each source assessment once
async fn plan_views(database: &Database, plans: Vec<Plan>) -> AppResult<Vec<PlanView>> {
    let mut constitutions: HashMap<Uuid, Option<Constitution>> = HashMap::new();
    let mut views = Vec::with_capacity(plans.len());

    for plan in plans {
        let constitution = match plan.assessment_id {
            Some(id) => {
                if let Some(cached) = constitutions.get(&id) {
                    *cached
                } else {
                    let found = database
                        .get_assessment(id)
                        .await?
                        .map(|assessment| assessment.constitution);
                    constitutions.insert(id, found);
                    found
                }
            }
            None => None,
        };
        views.push(PlanView {
            id: plan.id,
            content: plan.content,
            created_at: plan.created_at,
            assessment: constitution.map(|constitution| AssessmentRef { constitution }),
        });
    }

    Ok(views)
}

/// Plan routes implementation
pub struct PlanRoutes;

impl PlanRoutes {
    /// Create plan routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/plan/generate", post(Self::handle_generate))
            .route("/api/plan/userplan", get(Self::handle_list))
            .route("/api/plan/chat", post(Self::handle_chat))
            .route("/api/plan/:id", get(Self::handle_get))
            .with_state(resources)
    }

    /// Handle POST /api/plan/generate
    async fn handle_generate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let generated = generate_plan(&resources.database, resources.llm()?, &user).await?;

        let body = json!({
            "id": generated.plan.id,
            "content": generated.plan.content,
            "createdAt": generated.plan.created_at,
            "message": generated.message,
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /api/plan/:id
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let plan_id = parse_id(&id, "Plan")?;
        let plan = get_owned_plan(&resources.database, user.id, plan_id).await?;

        let view = plan_views(&resources.database, vec![plan])
            .await?
            .pop()
            .ok_or_else(|| AppError::not_found("Plan"))?;
        Ok((StatusCode::OK, Json(view)).into_response())
    }

    /// Handle GET /api/plan/userplan
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let plans = resources.database.list_plans(user.id).await?;
        let views = plan_views(&resources.database, plans).await?;
        Ok((StatusCode::OK, Json(json!({ "plans": views }))).into_response())
    }

    /// Handle POST /api/plan/chat
    async fn handle_chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<PlanChatRequest>,
    ) -> Result<Response, AppError> {
        let user = resources.authenticator.authenticate(&headers).await?;
        let (Some(plan_id), Some(message)) = (
            request.plan_id,
            request.message.filter(|message| !message.trim().is_empty()),
        ) else {
            return Err(AppError::invalid_input("planId and message required"));
        };
        let plan_id = parse_id(&plan_id, "Plan")?;

        let revision = revise_plan(
            &resources.database,
            resources.llm()?,
            user.id,
            plan_id,
            &message,
        )
        .await?;

        let body = json!({
            "content": revision.content,
            "message": revision.message,
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }
}
