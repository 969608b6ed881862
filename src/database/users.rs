// ABOUTME: User account persistence: registration, lookup, profile edits, and coach approval
// ABOUTME: Maps the users table to the core User model
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::NaiveDate;
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{CoachStatus, Role, User};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid, Database};

/// Column list shared by every user query
const USER_COLUMNS: &str = "id, email, name, password_hash, role, coach_status, height_cm, \
     weight_kg, sex, birth_date, points, bronze_badges, silver_badges, gold_badges, created_at";

/// Profile fields a user may edit; `None` leaves the stored value unchanged
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Display name
    pub name: Option<String>,
    /// Height in centimetres
    pub height_cm: Option<i64>,
    /// Weight in kilograms
    pub weight_kg: Option<i64>,
    /// Free-text sex
    pub sex: Option<String>,
    /// Date of birth
    pub birth_date: Option<NaiveDate>,
}

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'USER' CHECK (role IN ('USER', 'COACH', 'ADMIN')),
                coach_status TEXT CHECK (coach_status IN ('PENDING', 'APPROVED', 'REJECTED')),
                height_cm INTEGER,
                weight_kg INTEGER,
                sex TEXT,
                birth_date TEXT,
                points INTEGER NOT NULL DEFAULT 0,
                bronze_badges INTEGER NOT NULL DEFAULT 0,
                silver_badges INTEGER NOT NULL DEFAULT 0,
                gold_badges INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role, coach_status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new account
    ///
    /// # Errors
    ///
    /// Returns `ResourceAlreadyExists` if the email is taken, or a database error
    pub async fn create_user(&self, user: &User) -> AppResult<Uuid> {
        sqlx::query(
            r"
            INSERT INTO users (
                id, email, name, password_hash, role, coach_status, height_cm, weight_kg,
                sex, birth_date, points, bronze_badges, silver_badges, gold_badges, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.coach_status.map(|status| status.as_str()))
        .bind(user.height_cm)
        .bind(user.weight_kg)
        .bind(&user.sex)
        .bind(user.birth_date.map(|date| date.to_string()))
        .bind(user.points)
        .bind(user.bronze_badges)
        .bind(user.silver_badges)
        .bind(user.gold_badges)
        .bind(format_timestamp(user.created_at))
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::already_exists("Email already registered")
            }
            _ => AppError::database(format!("Failed to create user: {e}")),
        })?;

        Ok(user.id)
    }

    /// Get a user by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a user by email (exact match)
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Apply a partial profile update and return the stored result
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the user does not exist
    pub async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> AppResult<User> {
        let result = sqlx::query(
            r"
            UPDATE users SET
                name = COALESCE($1, name),
                height_cm = COALESCE($2, height_cm),
                weight_kg = COALESCE($3, weight_kg),
                sex = COALESCE($4, sex),
                birth_date = COALESCE($5, birth_date)
            WHERE id = $6
            ",
        )
        .bind(&update.name)
        .bind(update.height_cm)
        .bind(update.weight_kg)
        .bind(&update.sex)
        .bind(update.birth_date.map(|date| date.to_string()))
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User"));
        }

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// All accounts, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    /// Coach accounts with an application status, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn list_coach_applications(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE role = 'COACH' AND coach_status IS NOT NULL \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_user).collect()
    }

    /// Set the approval state of a coach account
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if no coach with this ID exists
    pub async fn set_coach_status(&self, user_id: Uuid, status: CoachStatus) -> AppResult<User> {
        let result = sqlx::query("UPDATE users SET coach_status = $1 WHERE id = $2 AND role = 'COACH'")
            .bind(status.as_str())
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Coach {user_id}")));
        }

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Coach {user_id}")))
    }

    /// Overwrite the point balance directly, bypassing the ledger
    ///
    /// Used by the demo seeder to give an account a starting balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails
    pub async fn set_points(&self, user_id: Uuid, points: i64) -> AppResult<()> {
        sqlx::query("UPDATE users SET points = $1 WHERE id = $2")
            .bind(points)
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Convert a database row to a `User`
pub(super) fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.get("id");
    let role: String = row.get("role");
    let coach_status: Option<String> = row.get("coach_status");
    let birth_date: Option<String> = row.get("birth_date");
    let created_at: String = row.get("created_at");

    Ok(User {
        id: parse_uuid(&id)?,
        email: row.get("email"),
        name: row.get("name"),
        password_hash: row.get("password_hash"),
        role: role.parse::<Role>()?,
        coach_status: coach_status
            .as_deref()
            .map(str::parse::<CoachStatus>)
            .transpose()?,
        height_cm: row.get("height_cm"),
        weight_kg: row.get("weight_kg"),
        sex: row.get("sex"),
        birth_date: birth_date
            .as_deref()
            .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| AppError::internal(format!("Invalid birth date: {e}")))?,
        points: row.get("points"),
        bronze_badges: row.get("bronze_badges"),
        silver_badges: row.get("silver_badges"),
        gold_badges: row.get("gold_badges"),
        created_at: parse_timestamp(&created_at)?,
    })
}
