// ABOUTME: Coach-authored student reports and their AI analysis
// ABOUTME: Tracks the PENDING -> PROCESSING -> COMPLETED|FAILED analysis lifecycle
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Analysis lifecycle of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Created, not yet analysed
    Pending,
    /// Analysis in flight
    Processing,
    /// Analysis stored
    Completed,
    /// Last analysis attempt failed
    Failed,
}

impl ReportStatus {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl Display for ReportStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            other => Err(AppError::invalid_input(format!(
                "Unknown report status: {other}"
            ))),
        }
    }
}

/// Reference material suggested by the analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeLink {
    /// Link title
    #[serde(default)]
    pub title: String,
    /// Target URL
    #[serde(default)]
    pub url: String,
    /// Why the link is relevant
    #[serde(default)]
    pub description: String,
}

/// Structured analysis produced by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAnalysis {
    /// Overall assessment
    pub analysis: String,
    /// Identified risks
    pub risk_analysis: String,
    /// Suggested actions
    pub recommendations: String,
    /// Further reading
    #[serde(default)]
    pub knowledge_links: Vec<KnowledgeLink>,
}

/// Student identity shown alongside a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentSummary {
    /// Student account id
    pub id: Uuid,
    /// Student display name
    pub name: Option<String>,
    /// Student email
    pub email: String,
}

/// A report written by a coach about a student
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoachReport {
    /// Unique identifier
    pub id: Uuid,
    /// Authoring coach
    pub coach_id: Uuid,
    /// Linked student account, if any
    pub student_id: Option<Uuid>,
    /// Report title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Free-form student data supplied by the coach
    pub student_data: String,
    /// Analysis lifecycle state
    pub status: ReportStatus,
    /// Stored analysis once completed
    #[serde(flatten)]
    pub analysis: Option<ReportAnalysis>,
    /// Linked student identity, filled for listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student: Option<StudentSummary>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}
