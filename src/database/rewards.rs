// ABOUTME: Point ledger persistence and badge redemption
// ABOUTME: Every balance change writes an append-only ledger row in the same transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{Badge, RewardEntry, RewardKind, User};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use uuid::Uuid;

use super::transactions::{retry_transaction, DEFAULT_MAX_ATTEMPTS};
use super::{format_timestamp, parse_timestamp, parse_uuid, Database};

impl Database {
    pub(super) async fn migrate_rewards(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS reward_entries (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                points INTEGER NOT NULL,
                kind TEXT NOT NULL,
                note TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_reward_entries_user ON reward_entries(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// A user's ledger, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row mapping fails
    pub async fn list_rewards(&self, user_id: Uuid) -> AppResult<Vec<RewardEntry>> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, points, kind, note, created_at
            FROM reward_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_reward).collect()
    }

    /// Count ledger rows of one kind for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn count_rewards(&self, user_id: Uuid, kind: RewardKind) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM reward_entries WHERE user_id = $1 AND kind = $2")
                .bind(user_id.to_string())
                .bind(kind.as_str())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Spend points on a badge
    ///
    /// The balance check and the debit are one guarded `UPDATE`, so two
    /// concurrent redemptions can never overdraw the balance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` ("Insufficient points") if the balance is below
    /// the badge cost, or `ResourceNotFound` if the user does not exist
    pub async fn redeem_badge(&self, user_id: Uuid, badge: Badge) -> AppResult<User> {
        retry_transaction(
            || self.redeem_badge_once(user_id, badge),
            DEFAULT_MAX_ATTEMPTS,
        )
        .await?;

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn redeem_badge_once(&self, user_id: Uuid, badge: Badge) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        let column = badge.counter_column();

        let result = sqlx::query(&format!(
            "UPDATE users SET points = points - $1, {column} = {column} + 1 \
             WHERE id = $2 AND points >= $1"
        ))
        .bind(badge.cost())
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to redeem badge: {e}")))?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = $1")
                .bind(user_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
            return Err(match exists {
                Some(_) => AppError::invalid_input("Insufficient points"),
                None => AppError::not_found("User"),
            });
        }

        let entry = RewardEntry {
            id: Uuid::new_v4(),
            user_id,
            points: -badge.cost(),
            kind: badge.reward_kind(),
            note: Some(badge.display_name().to_owned()),
            created_at: Utc::now(),
        };
        insert_reward_entry(&mut *tx, &entry).await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Append a ledger row on an open connection or transaction
pub(super) async fn insert_reward_entry(
    conn: &mut SqliteConnection,
    entry: &RewardEntry,
) -> AppResult<()> {
    sqlx::query(
        r"
        INSERT INTO reward_entries (id, user_id, points, kind, note, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ",
    )
    .bind(entry.id.to_string())
    .bind(entry.user_id.to_string())
    .bind(entry.points)
    .bind(entry.kind.as_str())
    .bind(&entry.note)
    .bind(format_timestamp(entry.created_at))
    .execute(conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to record reward: {e}")))?;

    Ok(())
}

fn row_to_reward(row: &SqliteRow) -> AppResult<RewardEntry> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let kind: String = row.get("kind");
    let created_at: String = row.get("created_at");

    Ok(RewardEntry {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        points: row.get("points"),
        kind: kind.parse::<RewardKind>()?,
        note: row.get("note"),
        created_at: parse_timestamp(&created_at)?,
    })
}
