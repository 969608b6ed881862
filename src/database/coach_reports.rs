// ABOUTME: Coach report persistence with analysis lifecycle updates
// ABOUTME: Reports are scoped to their authoring coach and joined to the linked student for listings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{
    CoachReport, KnowledgeLink, ReportAnalysis, ReportStatus, StudentSummary,
};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid, Database};

const REPORT_SELECT: &str = r"
    SELECT r.id, r.coach_id, r.student_id, r.title, r.description, r.student_data, r.status,
           r.analysis, r.risk_analysis, r.recommendations, r.knowledge_links,
           r.created_at, r.updated_at,
           s.name AS student_name, s.email AS student_email
    FROM coach_reports r
    LEFT JOIN users s ON s.id = r.student_id
";

impl Database {
    pub(super) async fn migrate_coach_reports(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS coach_reports (
                id TEXT PRIMARY KEY,
                coach_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                student_id TEXT REFERENCES users(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                description TEXT,
                student_data TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'PENDING'
                    CHECK (status IN ('PENDING', 'PROCESSING', 'COMPLETED', 'FAILED')),
                analysis TEXT,
                risk_analysis TEXT,
                recommendations TEXT,
                knowledge_links TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_coach_reports_coach ON coach_reports(coach_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a new report
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_coach_report(&self, report: &CoachReport) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO coach_reports (
                id, coach_id, student_id, title, description, student_data, status,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(report.id.to_string())
        .bind(report.coach_id.to_string())
        .bind(report.student_id.map(|id| id.to_string()))
        .bind(&report.title)
        .bind(&report.description)
        .bind(&report.student_data)
        .bind(report.status.as_str())
        .bind(format_timestamp(report.created_at))
        .bind(format_timestamp(report.updated_at))
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create coach report: {e}")))?;

        Ok(())
    }

    /// A coach's reports, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn list_coach_reports(&self, coach_id: Uuid) -> AppResult<Vec<CoachReport>> {
        let rows = sqlx::query(&format!(
            "{REPORT_SELECT} WHERE r.coach_id = $1 ORDER BY r.created_at DESC, r.rowid DESC"
        ))
        .bind(coach_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_report).collect()
    }

    /// One of a coach's reports
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn get_coach_report(
        &self,
        coach_id: Uuid,
        report_id: Uuid,
    ) -> AppResult<Option<CoachReport>> {
        let row = sqlx::query(&format!(
            "{REPORT_SELECT} WHERE r.id = $1 AND r.coach_id = $2"
        ))
        .bind(report_id.to_string())
        .bind(coach_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_report).transpose()
    }

    /// Move a report to a new lifecycle state
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the report does not exist
    pub async fn set_report_status(&self, report_id: Uuid, status: ReportStatus) -> AppResult<()> {
        let result =
            sqlx::query("UPDATE coach_reports SET status = $1, updated_at = $2 WHERE id = $3")
                .bind(status.as_str())
                .bind(format_timestamp(Utc::now()))
                .bind(report_id.to_string())
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to update report status: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Report"));
        }
        Ok(())
    }

    /// Store the analysis and mark the report completed
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the report does not exist
    pub async fn store_report_analysis(
        &self,
        report_id: Uuid,
        analysis: &ReportAnalysis,
    ) -> AppResult<()> {
        let links = serde_json::to_string(&analysis.knowledge_links)?;

        let result = sqlx::query(
            r"
            UPDATE coach_reports SET
                status = $1,
                analysis = $2,
                risk_analysis = $3,
                recommendations = $4,
                knowledge_links = $5,
                updated_at = $6
            WHERE id = $7
            ",
        )
        .bind(ReportStatus::Completed.as_str())
        .bind(&analysis.analysis)
        .bind(&analysis.risk_analysis)
        .bind(&analysis.recommendations)
        .bind(links)
        .bind(format_timestamp(Utc::now()))
        .bind(report_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to store report analysis: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Report"));
        }
        Ok(())
    }
}

fn row_to_report(row: &SqliteRow) -> AppResult<CoachReport> {
    let id: String = row.get("id");
    let coach_id: String = row.get("coach_id");
    let student_id = parse_optional_uuid(row.get("student_id"))?;
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let analysis = match row.get::<Option<String>, _>("analysis") {
        Some(analysis) => {
            let links: Option<String> = row.get("knowledge_links");
            let knowledge_links = match links {
                Some(links) => serde_json::from_str::<Vec<KnowledgeLink>>(&links)?,
                None => Vec::new(),
            };
            Some(ReportAnalysis {
                analysis,
                risk_analysis: row.get::<Option<String>, _>("risk_analysis").unwrap_or_default(),
                recommendations: row
                    .get::<Option<String>, _>("recommendations")
                    .unwrap_or_default(),
                knowledge_links,
            })
        }
        None => None,
    };

    let student_email: Option<String> = row.get("student_email");
    let student = match (student_id, student_email) {
        (Some(id), Some(email)) => Some(StudentSummary {
            id,
            name: row.get("student_name"),
            email,
        }),
        _ => None,
    };

    Ok(CoachReport {
        id: parse_uuid(&id)?,
        coach_id: parse_uuid(&coach_id)?,
        student_id,
        title: row.get("title"),
        description: row.get("description"),
        student_data: row.get("student_data"),
        status: status.parse::<ReportStatus>()?,
        analysis,
        student,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}
