// ABOUTME: Constitution questionnaire persistence
// ABOUTME: Stores answers, bucket scores, and the derived constitution per submission
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{Assessment, Constitution, ConstitutionScores};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};

impl Database {
    pub(super) async fn migrate_assessments(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS assessments (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                answers TEXT NOT NULL,
                scores TEXT NOT NULL,
                constitution TEXT NOT NULL,
                questionnaire_version INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_assessments_user ON assessments(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a submitted questionnaire
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the insert fails
    pub async fn create_assessment(&self, assessment: &Assessment) -> AppResult<()> {
        let answers = serde_json::to_string(&assessment.answers)?;
        let scores = serde_json::to_string(&assessment.scores)?;

        sqlx::query(
            r"
            INSERT INTO assessments (id, user_id, answers, scores, constitution, questionnaire_version, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(assessment.id.to_string())
        .bind(assessment.user_id.to_string())
        .bind(answers)
        .bind(scores)
        .bind(assessment.constitution.as_str())
        .bind(assessment.questionnaire_version)
        .bind(format_timestamp(assessment.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create assessment: {e}")))?;

        Ok(())
    }

    /// A user's assessments, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn list_assessments(&self, user_id: Uuid) -> AppResult<Vec<Assessment>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, answers, scores, constitution, questionnaire_version, created_at
            FROM assessments
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_assessment).collect()
    }

    /// Get an assessment by ID regardless of owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn get_assessment(&self, assessment_id: Uuid) -> AppResult<Option<Assessment>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, answers, scores, constitution, questionnaire_version, created_at
            FROM assessments
            WHERE id = $1
            ",
        )
        .bind(assessment_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_assessment).transpose()
    }

    /// The user's most recent assessment
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn latest_assessment(&self, user_id: Uuid) -> AppResult<Option<Assessment>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, answers, scores, constitution, questionnaire_version, created_at
            FROM assessments
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_assessment).transpose()
    }
}

fn row_to_assessment(row: &SqliteRow) -> AppResult<Assessment> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let answers: String = row.get("answers");
    let scores: String = row.get("scores");
    let constitution: String = row.get("constitution");
    let created_at: String = row.get("created_at");

    Ok(Assessment {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        answers: serde_json::from_str(&answers)?,
        scores: serde_json::from_str::<ConstitutionScores>(&scores)?,
        constitution: constitution.parse::<Constitution>()?,
        questionnaire_version: row.get("questionnaire_version"),
        created_at: parse_timestamp(&created_at)?,
    })
}
