// ABOUTME: Constitution assessments, posture analyses, and generated wellness plans
// ABOUTME: Records produced by the questionnaire, the vision model, and the plan generator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Body constitution derived from the questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Constitution {
    /// No dominant imbalance
    #[default]
    Balanced,
    /// Yang deficiency
    YangDeficiency,
    /// Yin deficiency
    YinDeficiency,
    /// Qi deficiency
    QiDeficiency,
    /// Phlegm dampness
    PhlegmDampness,
    /// Blood stasis
    BloodStasis,
}

impl Constitution {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "BALANCED",
            Self::YangDeficiency => "YANG_DEFICIENCY",
            Self::YinDeficiency => "YIN_DEFICIENCY",
            Self::QiDeficiency => "QI_DEFICIENCY",
            Self::PhlegmDampness => "PHLEGM_DAMPNESS",
            Self::BloodStasis => "BLOOD_STASIS",
        }
    }
}

impl Display for Constitution {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Constitution {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BALANCED" => Ok(Self::Balanced),
            "YANG_DEFICIENCY" => Ok(Self::YangDeficiency),
            "YIN_DEFICIENCY" => Ok(Self::YinDeficiency),
            "QI_DEFICIENCY" => Ok(Self::QiDeficiency),
            "PHLEGM_DAMPNESS" => Ok(Self::PhlegmDampness),
            "BLOOD_STASIS" => Ok(Self::BloodStasis),
            other => Err(AppError::invalid_input(format!(
                "Unknown constitution: {other}"
            ))),
        }
    }
}

/// Per-bucket questionnaire totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConstitutionScores {
    /// Yang bucket
    pub yang: i64,
    /// Yin bucket
    pub yin: i64,
    /// Qi bucket
    pub qi: i64,
    /// Phlegm bucket
    pub phlegm: i64,
    /// Stasis bucket
    pub stasis: i64,
}

/// A submitted questionnaire and its outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Raw answers keyed `<bucket>_<question>`
    pub answers: BTreeMap<String, i64>,
    /// Bucket totals
    pub scores: ConstitutionScores,
    /// Chosen constitution
    pub constitution: Constitution,
    /// Questionnaire revision the answers belong to
    pub questionnaire_version: i64,
    /// Submission time
    pub created_at: DateTime<Utc>,
}

/// A stored posture review
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostureAnalysis {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Truncated preview of the front photo
    pub front_url: String,
    /// Truncated preview of the side photo
    pub side_url: String,
    /// Truncated preview of the back photo
    pub back_url: String,
    /// Markdown report returned by the vision model
    pub analysis_md: String,
    /// Upload time
    pub created_at: DateTime<Utc>,
}

/// A generated weekly diet and exercise plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Assessment the plan was generated from
    pub assessment_id: Option<Uuid>,
    /// Posture analysis the plan was generated from
    pub posture_id: Option<Uuid>,
    /// Plan document as produced by the model
    pub content: serde_json::Value,
    /// Generation time
    pub created_at: DateTime<Utc>,
    /// Last revision time
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Title declared by the plan document, if any
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.content
            .get("title")
            .and_then(serde_json::Value::as_str)
            .filter(|title| !title.trim().is_empty())
    }
}
