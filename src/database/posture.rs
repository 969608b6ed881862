// ABOUTME: Posture analysis persistence
// ABOUTME: Stores truncated photo previews and the Markdown report per upload
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::PostureAnalysis;
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};

const POSTURE_COLUMNS: &str = "id, user_id, front_url, side_url, back_url, analysis_md, created_at";

impl Database {
    pub(super) async fn migrate_posture(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS posture_analyses (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                front_url TEXT NOT NULL,
                side_url TEXT NOT NULL,
                back_url TEXT NOT NULL,
                analysis_md TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posture_user ON posture_analyses(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a posture analysis
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_posture_analysis(&self, analysis: &PostureAnalysis) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO posture_analyses (id, user_id, front_url, side_url, back_url, analysis_md, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(analysis.id.to_string())
        .bind(analysis.user_id.to_string())
        .bind(&analysis.front_url)
        .bind(&analysis.side_url)
        .bind(&analysis.back_url)
        .bind(&analysis.analysis_md)
        .bind(format_timestamp(analysis.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create posture analysis: {e}")))?;

        Ok(())
    }

    /// Get a posture analysis by ID regardless of owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn get_posture_analysis(&self, id: Uuid) -> AppResult<Option<PostureAnalysis>> {
        let row = sqlx::query(&format!(
            "SELECT {POSTURE_COLUMNS} FROM posture_analyses WHERE id = $1"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_posture).transpose()
    }

    /// A user's posture analyses, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn list_posture_analyses(&self, user_id: Uuid) -> AppResult<Vec<PostureAnalysis>> {
        let rows = sqlx::query(&format!(
            "SELECT {POSTURE_COLUMNS} FROM posture_analyses WHERE user_id = $1 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_posture).collect()
    }

    /// The user's most recent posture analysis
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn latest_posture_analysis(&self, user_id: Uuid) -> AppResult<Option<PostureAnalysis>> {
        let row = sqlx::query(&format!(
            "SELECT {POSTURE_COLUMNS} FROM posture_analyses WHERE user_id = $1 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_posture).transpose()
    }
}

fn row_to_posture(row: &SqliteRow) -> AppResult<PostureAnalysis> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");

    Ok(PostureAnalysis {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        front_url: row.get("front_url"),
        side_url: row.get("side_url"),
        back_url: row.get("back_url"),
        analysis_md: row.get("analysis_md"),
        created_at: parse_timestamp(&created_at)?,
    })
}
