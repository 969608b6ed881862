// ABOUTME: Core data models for the FitPlan wellness API
// ABOUTME: Re-exports users, wellness records, checklists, rewards, and coach reports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Plain data carried between the database layer, the services, and the HTTP
//! routes. Models serialize with camelCase field names, which is the wire
//! format of the REST API.
//!
//! Enumerations stored in the database expose `as_str()` and implement
//! `FromStr` so row mapping can reject unknown values with `?`.

mod coach;
mod reward;
mod todo;
mod user;
mod wellness;

pub use coach::{CoachReport, KnowledgeLink, ReportAnalysis, ReportStatus, StudentSummary};
pub use reward::{Badge, RewardEntry, RewardKind, RewardTier};
pub use todo::{ChecklistItem, ItemKind, Todo, TodoWithItems, ToggleOutcome};
pub use user::{CoachStatus, Role, User};
pub use wellness::{Assessment, Constitution, ConstitutionScores, Plan, PostureAnalysis};
