// ABOUTME: User account model with role and coach approval state
// ABOUTME: Holds profile measurements, point balance, and badge counters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular member tracking their own plan
    #[default]
    User,
    /// Coach writing student reports
    Coach,
    /// Administrator approving coaches
    Admin,
}

impl Role {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Coach => "COACH",
            Self::Admin => "ADMIN",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "COACH" => Ok(Self::Coach),
            "ADMIN" => Ok(Self::Admin),
            other => Err(AppError::invalid_input(format!("Unknown role: {other}"))),
        }
    }
}

/// Approval state of a coach account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoachStatus {
    /// Waiting for an administrator
    Pending,
    /// Allowed to log in
    Approved,
    /// Application declined
    Rejected,
}

impl CoachStatus {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Check if a coach in this state can log in
    #[must_use]
    pub const fn can_login(&self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Get user-friendly status message
    #[must_use]
    pub const fn to_message(&self) -> &'static str {
        match self {
            Self::Pending => "Coach application is pending admin approval",
            Self::Approved => "Coach application approved",
            Self::Rejected => "Coach application was rejected",
        }
    }
}

impl Display for CoachStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoachStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(AppError::invalid_input(format!(
                "Unknown coach status: {other}"
            ))),
        }
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,
    /// Login email, unique
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// bcrypt hash of the password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// Approval state, only set for coaches
    pub coach_status: Option<CoachStatus>,
    /// Height in centimetres
    pub height_cm: Option<i64>,
    /// Weight in kilograms
    pub weight_kg: Option<i64>,
    /// Free-text sex, `male`/`female` drive the calorie formula
    pub sex: Option<String>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
    /// Current point balance
    pub points: i64,
    /// Redeemed bronze badges
    pub bronze_badges: i64,
    /// Redeemed silver badges
    pub silver_badges: i64,
    /// Redeemed gold badges
    pub gold_badges: i64,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a fresh account with a zero balance
    #[must_use]
    pub fn new(email: String, password_hash: String, name: Option<String>, role: Role) -> Self {
        let coach_status = (role == Role::Coach).then_some(CoachStatus::Pending);
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash,
            role,
            coach_status,
            height_cm: None,
            weight_kg: None,
            sex: None,
            birth_date: None,
            points: 0,
            bronze_badges: 0,
            silver_badges: 0,
            gold_badges: 0,
            created_at: Utc::now(),
        }
    }

    /// Reason this account may not log in, if any
    ///
    /// Only coaches are gated; a coach without a recorded status is treated
    /// as pending.
    #[must_use]
    pub fn login_denial(&self) -> Option<&'static str> {
        if self.role != Role::Coach {
            return None;
        }
        let status = self.coach_status.unwrap_or(CoachStatus::Pending);
        (!status.can_login()).then(|| status.to_message())
    }

    /// Name shown in prompts and greetings
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("User")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_coach_starts_pending() {
        let coach = User::new("c@x.io".into(), "hash".into(), None, Role::Coach);
        assert_eq!(coach.coach_status, Some(CoachStatus::Pending));
        assert_eq!(
            coach.login_denial(),
            Some("Coach application is pending admin approval")
        );

        let user = User::new("u@x.io".into(), "hash".into(), None, Role::User);
        assert_eq!(user.coach_status, None);
        assert_eq!(user.login_denial(), None);
    }

    #[test]
    fn test_rejected_and_approved_coaches() {
        let mut coach = User::new("c@x.io".into(), "hash".into(), None, Role::Coach);
        coach.coach_status = Some(CoachStatus::Rejected);
        assert_eq!(coach.login_denial(), Some("Coach application was rejected"));
        coach.coach_status = Some(CoachStatus::Approved);
        assert_eq!(coach.login_denial(), None);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [Role::User, Role::Coach, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let user = User::new("u@x.io".into(), "secret-hash".into(), None, Role::User);
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"bronzeBadges\":0"));
    }
}
