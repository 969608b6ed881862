// ABOUTME: SQLite persistence layer for accounts, wellness records, checklists, and rewards
// ABOUTME: Owns the connection pool, schema migrations, and shared row-mapping helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! A single [`Database`] handle wraps the `SQLite` pool. Each domain lives in
//! its own file as an `impl Database` block with a matching `migrate_*`
//! function, so the schema for a table sits next to the queries that use it.
//!
//! Identifiers are stored as hyphenated UUID text and timestamps as RFC 3339
//! text with microsecond precision, which keeps `ORDER BY created_at`
//! chronological. Ties are broken by `rowid` (insertion order).

mod assessments;
mod coach_reports;
mod plans;
mod posture;
mod rewards;
mod todos;
/// Transaction retry helper for `SQLite` lock contention
pub mod transactions;
mod users;

pub use todos::ItemSpec;
pub use users::ProfileUpdate;

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use fitplan_core::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool size for file-backed databases
const FILE_POOL_SIZE: u32 = 8;

/// Database manager for all persistent state
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to `database_url` and run migrations
    ///
    /// `sqlite::memory:` URLs get a single never-recycled connection so the
    /// in-memory database lives as long as the pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the file cannot be created,
    /// or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL {database_url}: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            Self::ensure_parent_dir(options.get_filename())?;
            options = options.journal_mode(SqliteJournalMode::Wal);
            SqlitePoolOptions::new().max_connections(FILE_POOL_SIZE)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;

        info!(database.url = %database_url, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any `CREATE TABLE` or `CREATE INDEX` fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_assessments().await?;
        self.migrate_posture().await?;
        self.migrate_plans().await?;
        self.migrate_todos().await?;
        self.migrate_rewards().await?;
        self.migrate_coach_reports().await?;
        Ok(())
    }

    fn ensure_parent_dir(path: &Path) -> AppResult<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .map_err(|e| {
                    AppError::config(format!(
                        "Cannot create database directory {}: {e}",
                        parent.display()
                    ))
                }),
            _ => Ok(()),
        }
    }
}

/// Format a timestamp for storage
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime {value}: {e}")))
}

/// Parse a stored identifier
pub(crate) fn parse_uuid(value: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value).map_err(|e| AppError::internal(format!("Invalid UUID {value}: {e}")))
}

/// Parse an optional stored identifier
pub(crate) fn parse_optional_uuid(value: Option<String>) -> AppResult<Option<Uuid>> {
    value.as_deref().map(parse_uuid).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let later = earlier + chrono::Duration::microseconds(1500);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(parse_timestamp(&format_timestamp(later)).unwrap(), later);
    }

    #[tokio::test]
    async fn test_in_memory_database_migrates() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        // Running migrations twice is a no-op
        db.migrate().await.unwrap();
    }
}
