// ABOUTME: Generated plan persistence
// ABOUTME: Stores the plan document as JSON text with links to its source assessment and posture
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::Plan;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid, Database};

const PLAN_COLUMNS: &str = "id, user_id, assessment_id, posture_id, content, created_at, updated_at";

impl Database {
    pub(super) async fn migrate_plans(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS plans (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                assessment_id TEXT REFERENCES assessments(id) ON DELETE SET NULL,
                posture_id TEXT REFERENCES posture_analyses(id) ON DELETE SET NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_plans_user ON plans(user_id, created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store a generated plan
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails
    pub async fn create_plan(&self, plan: &Plan) -> AppResult<()> {
        let content = serde_json::to_string(&plan.content)?;

        sqlx::query(
            r"
            INSERT INTO plans (id, user_id, assessment_id, posture_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(plan.id.to_string())
        .bind(plan.user_id.to_string())
        .bind(plan.assessment_id.map(|id| id.to_string()))
        .bind(plan.posture_id.map(|id| id.to_string()))
        .bind(content)
        .bind(format_timestamp(plan.created_at))
        .bind(format_timestamp(plan.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create plan: {e}")))?;

        Ok(())
    }

    /// Get a plan by ID regardless of owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn get_plan(&self, plan_id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = $1"))
            .bind(plan_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_plan).transpose()
    }

    /// A user's plans, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn list_plans(&self, user_id: Uuid) -> AppResult<Vec<Plan>> {
        let rows = sqlx::query(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_plan).collect()
    }

    /// The user's most recent plan
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn latest_plan(&self, user_id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE user_id = $1 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_plan).transpose()
    }

    /// Replace a plan's document and bump `updated_at`
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the plan does not exist
    pub async fn update_plan_content(
        &self,
        plan_id: Uuid,
        content: &serde_json::Value,
    ) -> AppResult<()> {
        let result = sqlx::query("UPDATE plans SET content = $1, updated_at = $2 WHERE id = $3")
            .bind(serde_json::to_string(content)?)
            .bind(format_timestamp(Utc::now()))
            .bind(plan_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update plan: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Plan"));
        }
        Ok(())
    }
}

fn row_to_plan(row: &SqliteRow) -> AppResult<Plan> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let content: String = row.get("content");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Plan {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        assessment_id: parse_optional_uuid(row.get("assessment_id"))?,
        posture_id: parse_optional_uuid(row.get("posture_id"))?,
        content: serde_json::from_str(&content)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
