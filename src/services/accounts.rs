// ABOUTME: Account registration, credential checks, profile validation, and coach approval
// ABOUTME: Validates request fields before they reach the users table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::LazyLock;

use chrono::NaiveDate;
use fitplan_core::constants::limits::{
    HEIGHT_CM_RANGE, NAME_MAX_LEN, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN, SEX_MAX_LEN,
    WEIGHT_KG_RANGE,
};
use fitplan_core::errors::{AppError, AppResult, ErrorCode};
use fitplan_core::models::{CoachStatus, Role, User};
use regex::Regex;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::database::{Database, ProfileUpdate};
use crate::logging::AppLogger;

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Registration form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    /// Login email
    pub email: Option<String>,
    /// Plain password
    pub password: Option<String>,
    /// Display name, defaults to the email local part
    pub name: Option<String>,
    /// `USER` or `COACH`
    pub role: Option<String>,
}

/// Profile edit form; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    /// Display name
    pub name: Option<String>,
    /// Height in centimetres
    pub height_cm: Option<i64>,
    /// Weight in kilograms
    pub weight_kg: Option<i64>,
    /// Free-text sex
    pub sex: Option<String>,
    /// Date of birth as `YYYY-MM-DD`
    pub birth_date: Option<String>,
}

fn valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|re| re.is_match(email))
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > NAME_MAX_LEN {
        return Err(AppError::invalid_input(format!(
            "Name must be between 1 and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name.to_owned())
}

fn check_range(value: i64, (min, max): (i64, i64), field: &str) -> AppResult<i64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(AppError::new(
            ErrorCode::ValueOutOfRange,
            format!("{field} must be between {min} and {max}"),
        ))
    }
}

/// Create an account
///
/// Coach accounts start in `PENDING` and cannot log in until approved.
///
/// # Errors
///
/// Returns `InvalidInput` for a malformed field, or `ResourceAlreadyExists`
/// if the email is taken
pub async fn register(database: &Database, form: Registration, bcrypt_cost: u32) -> AppResult<User> {
    let email = form
        .email
        .map(|email| email.trim().to_lowercase())
        .filter(|email| valid_email(email))
        .ok_or_else(|| AppError::invalid_input("A valid email is required"))?;

    let password = form.password.unwrap_or_default();
    let password_len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&password_len) {
        return Err(AppError::invalid_input(format!(
            "Password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
        )));
    }

    let name = match form.name.as_deref() {
        Some(name) => validate_name(name)?,
        None => validate_name(email.split('@').next().unwrap_or_default())?,
    };

    let role = match form.role.as_deref() {
        None | Some("USER") => Role::User,
        Some("COACH") => Role::Coach,
        Some(other) => {
            return Err(AppError::invalid_input(format!("Role must be USER or COACH, got {other}")))
        }
    };

    let password_hash = hash_password(&password, bcrypt_cost).await?;
    let user = User::new(email, password_hash, Some(name), role);
    database.create_user(&user).await?;

    AppLogger::log_auth_event(&user.email, "register", true, Some(user.role.as_str()));
    Ok(user)
}

/// Check credentials and the coach approval gate
///
/// # Errors
///
/// Returns `AuthInvalid` for an unknown email or wrong password, and
/// `PermissionDenied` for a coach that is not approved
pub async fn login(database: &Database, email: &str, password: &str) -> AppResult<User> {
    let email = email.trim().to_lowercase();
    let Some(user) = database.get_user_by_email(&email).await? else {
        AppLogger::log_auth_event(&email, "login", false, Some("unknown email"));
        return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
    };

    if !verify_password(password, &user.password_hash).await? {
        AppLogger::log_auth_event(&email, "login", false, Some("wrong password"));
        return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
    }

    if let Some(reason) = user.login_denial() {
        AppLogger::log_auth_event(&email, "login", false, Some(reason));
        return Err(AppError::forbidden(reason));
    }

    AppLogger::log_auth_event(&email, "login", true, None);
    Ok(user)
}

/// Validate a profile edit
///
/// # Errors
///
/// Returns `InvalidInput` or `ValueOutOfRange` for the first bad field
pub fn validate_profile(input: ProfileInput) -> AppResult<ProfileUpdate> {
    let sex = input
        .sex
        .map(|sex| {
            let sex = sex.trim().to_owned();
            let len = sex.chars().count();
            if len == 0 || len > SEX_MAX_LEN {
                Err(AppError::invalid_input(format!(
                    "sex must be between 1 and {SEX_MAX_LEN} characters"
                )))
            } else {
                Ok(sex)
            }
        })
        .transpose()?;

    let birth_date = input
        .birth_date
        .map(|date| {
            NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
                AppError::new(ErrorCode::InvalidFormat, "birthDate must be YYYY-MM-DD")
            })
        })
        .transpose()?;

    Ok(ProfileUpdate {
        name: input.name.as_deref().map(validate_name).transpose()?,
        height_cm: input
            .height_cm
            .map(|h| check_range(h, HEIGHT_CM_RANGE, "heightCm"))
            .transpose()?,
        weight_kg: input
            .weight_kg
            .map(|w| check_range(w, WEIGHT_KG_RANGE, "weightKg"))
            .transpose()?,
        sex,
        birth_date,
    })
}

/// Validate and store a profile edit
///
/// # Errors
///
/// Returns a validation error or `ResourceNotFound` for a deleted account
pub async fn update_profile(database: &Database, user_id: Uuid, input: ProfileInput) -> AppResult<User> {
    let update = validate_profile(input)?;
    database.update_profile(user_id, &update).await
}

/// Approve or reject a coach application
///
/// # Errors
///
/// Returns `ResourceNotFound` if the id does not belong to a coach
pub async fn decide_coach_application(
    database: &Database,
    admin_id: Uuid,
    coach_id: Uuid,
    status: CoachStatus,
) -> AppResult<User> {
    let coach = database.set_coach_status(coach_id, status).await?;
    info!(admin.id = %admin_id, coach.id = %coach_id, status = %status, "Coach application decided");
    Ok(coach)
}

/// Parse the admin decision, approving when no action is given
///
/// # Errors
///
/// Returns `InvalidInput` for anything other than `approve` or `reject`
pub fn parse_decision(action: Option<&str>) -> AppResult<CoachStatus> {
    match action {
        None | Some("approve") => Ok(CoachStatus::Approved),
        Some("reject") => Ok(CoachStatus::Rejected),
        Some(other) => Err(AppError::invalid_input(format!(
            "Action must be approve or reject, got {other}"
        ))),
    }
}
