// ABOUTME: Weekly checklist models derived from a plan
// ABOUTME: Todo headers, per-day checklist items, and the outcome of toggling an item
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// What a checklist item tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemKind {
    /// The day's meals
    Diet,
    /// One exercise of the day
    Exercise,
    /// Whole-day item for plans without a diet/exercise split
    Daily,
}

impl ItemKind {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Diet => "DIET",
            Self::Exercise => "EXERCISE",
            Self::Daily => "DAILY",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DIET" => Ok(Self::Diet),
            "EXERCISE" => Ok(Self::Exercise),
            "DAILY" => Ok(Self::Daily),
            other => Err(AppError::invalid_input(format!("Unknown item kind: {other}"))),
        }
    }
}

/// Checklist header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    /// Unique identifier
    pub id: Uuid,
    /// Owner
    pub user_id: Uuid,
    /// Plan the checklist was generated from
    pub plan_id: Option<Uuid>,
    /// Display title
    pub title: String,
    /// True iff no item remains incomplete
    pub completed: bool,
    /// Creation time, the start of the checklist week
    pub created_at: DateTime<Utc>,
}

/// One box on the checklist
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    /// Unique identifier
    pub id: Uuid,
    /// Owning checklist
    pub todo_id: Uuid,
    /// Day of the week, 1 (Monday) through 7
    pub day_index: i64,
    /// Position within the day, 0 for the diet item
    pub slot: i64,
    /// What the item tracks
    pub kind: ItemKind,
    /// Checked state
    pub completed: bool,
    /// Text resolved from the plan at read time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A checklist with its items ordered by day and slot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoWithItems {
    /// Header fields
    #[serde(flatten)]
    pub todo: Todo,
    /// Items in (`day_index`, `slot`) order
    pub items: Vec<ChecklistItem>,
}

impl TodoWithItems {
    /// Number of checked items
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|item| item.completed).count()
    }
}

/// Result of toggling a checklist item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    /// The item after the update
    pub item: ChecklistItem,
    /// Whether the item actually changed state
    pub changed: bool,
    /// Points applied to the balance (0 for a no-op)
    pub points_delta: i64,
    /// Balance after the update
    pub points: i64,
    /// Completion flag of the parent checklist after the update
    pub todo_completed: bool,
}
