// ABOUTME: Weekly checklist persistence and the transactional item toggle
// ABOUTME: Keeps item state, the owner's point balance, the ledger, and todo completion in step
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use fitplan_core::constants::points::CHECK_ITEM_POINTS;
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{
    ChecklistItem, ItemKind, RewardEntry, RewardKind, Todo, TodoWithItems, ToggleOutcome,
};
use sqlx::{sqlite::SqliteRow, Row};
use tracing::debug;
use uuid::Uuid;

use super::rewards::insert_reward_entry;
use super::transactions::{retry_transaction, DEFAULT_MAX_ATTEMPTS};
use super::{format_timestamp, parse_optional_uuid, parse_timestamp, parse_uuid, Database};

const TODO_COLUMNS: &str = "id, user_id, plan_id, title, completed, created_at";

const ITEM_COLUMNS: &str = "id, todo_id, day_index, slot, kind, completed";

/// Position and kind of an item to create; text comes from the plan at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSpec {
    /// Day of the week, 1 through 7
    pub day_index: i64,
    /// Position within the day
    pub slot: i64,
    /// What the item tracks
    pub kind: ItemKind,
}

impl Database {
    pub(super) async fn migrate_todos(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                plan_id TEXT REFERENCES plans(id) ON DELETE SET NULL,
                title TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS checklist_items (
                id TEXT PRIMARY KEY,
                todo_id TEXT NOT NULL REFERENCES todos(id) ON DELETE CASCADE,
                day_index INTEGER NOT NULL CHECK (day_index BETWEEN 1 AND 7),
                slot INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('DIET', 'EXERCISE', 'DAILY')),
                completed INTEGER NOT NULL DEFAULT 0,
                UNIQUE (todo_id, day_index, slot)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id, created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a todo header and its items in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is stored in that case
    pub async fn create_todo_with_items(
        &self,
        todo: &Todo,
        items: &[ItemSpec],
    ) -> AppResult<TodoWithItems> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO todos (id, user_id, plan_id, title, completed, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(todo.id.to_string())
        .bind(todo.user_id.to_string())
        .bind(todo.plan_id.map(|id| id.to_string()))
        .bind(&todo.title)
        .bind(todo.completed)
        .bind(format_timestamp(todo.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create todo: {e}")))?;

        let mut created = Vec::with_capacity(items.len());
        for spec in items {
            let item = ChecklistItem {
                id: Uuid::new_v4(),
                todo_id: todo.id,
                day_index: spec.day_index,
                slot: spec.slot,
                kind: spec.kind,
                completed: false,
                label: None,
            };

            sqlx::query(
                r"
                INSERT INTO checklist_items (id, todo_id, day_index, slot, kind, completed)
                VALUES ($1, $2, $3, $4, $5, 0)
                ",
            )
            .bind(item.id.to_string())
            .bind(item.todo_id.to_string())
            .bind(item.day_index)
            .bind(item.slot)
            .bind(item.kind.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to create checklist item: {e}")))?;

            created.push(item);
        }

        tx.commit().await?;

        created.sort_by_key(|item| (item.day_index, item.slot));
        Ok(TodoWithItems {
            todo: todo.clone(),
            items: created,
        })
    }

    /// Get one of the user's todos with its items
    ///
    /// # Errors
    ///
    /// Returns an error if a query or row mapping fails
    pub async fn get_todo_with_items(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
    ) -> AppResult<Option<TodoWithItems>> {
        let row = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE id = $1 AND user_id = $2"
        ))
        .bind(todo_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_items(row_to_todo(&row)?).await?)),
            None => Ok(None),
        }
    }

    /// All of the user's todos, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if a query or row mapping fails
    pub async fn list_todos(&self, user_id: Uuid) -> AppResult<Vec<TodoWithItems>> {
        let rows = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut todos = Vec::with_capacity(rows.len());
        for row in &rows {
            todos.push(self.attach_items(row_to_todo(row)?).await?);
        }
        Ok(todos)
    }

    /// Newest todo that still has unchecked items
    ///
    /// # Errors
    ///
    /// Returns an error if a query or row mapping fails
    pub async fn latest_open_todo(&self, user_id: Uuid) -> AppResult<Option<TodoWithItems>> {
        let row = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 AND completed = 0 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_items(row_to_todo(&row)?).await?)),
            None => Ok(None),
        }
    }

    /// Newest todo regardless of completion
    ///
    /// # Errors
    ///
    /// Returns an error if a query or row mapping fails
    pub async fn latest_todo(&self, user_id: Uuid) -> AppResult<Option<TodoWithItems>> {
        let row = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todos WHERE user_id = $1 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_items(row_to_todo(&row)?).await?)),
            None => Ok(None),
        }
    }

    /// Newest todo created in `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns an error if a query or row mapping fails
    pub async fn latest_todo_in_window(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Option<TodoWithItems>> {
        let row = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todos \
             WHERE user_id = $1 AND created_at >= $2 AND created_at < $3 \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(user_id.to_string())
        .bind(format_timestamp(start))
        .bind(format_timestamp(end))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_items(row_to_todo(&row)?).await?)),
            None => Ok(None),
        }
    }

    /// The todo created immediately before `todo`
    ///
    /// # Errors
    ///
    /// Returns an error if a query or row mapping fails
    pub async fn previous_todo(&self, todo: &Todo) -> AppResult<Option<TodoWithItems>> {
        let row = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todos \
             WHERE user_id = $1 AND id != $3 AND (created_at < $2 OR (created_at = $2 \
                 AND rowid < (SELECT rowid FROM todos WHERE id = $3))) \
             ORDER BY created_at DESC, rowid DESC LIMIT 1"
        ))
        .bind(todo.user_id.to_string())
        .bind(format_timestamp(todo.created_at))
        .bind(todo.id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_items(row_to_todo(&row)?).await?)),
            None => Ok(None),
        }
    }

    /// Set the completion flag of a todo directly, without touching points
    ///
    /// Returns whether the stored flag changed.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the todo does not belong to the user
    pub async fn set_todo_completed(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        completed: bool,
    ) -> AppResult<bool> {
        let current: Option<bool> =
            sqlx::query_scalar("SELECT completed FROM todos WHERE id = $1 AND user_id = $2")
                .bind(todo_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        match current {
            None => Err(AppError::not_found("Todo")),
            Some(current) if current == completed => Ok(false),
            Some(_) => {
                sqlx::query("UPDATE todos SET completed = $1 WHERE id = $2")
                    .bind(completed)
                    .bind(todo_id.to_string())
                    .execute(&self.pool)
                    .await
                    .map_err(|e| AppError::database(format!("Failed to update todo: {e}")))?;
                Ok(true)
            }
        }
    }

    /// Check or uncheck an item and settle points atomically
    ///
    /// In a single transaction: the item flag is written, the owner's balance
    /// moves by the item value, a ledger row records the move, and the parent
    /// todo is marked complete iff no unchecked item remains. Requesting the
    /// state the item already has changes nothing except the completion
    /// recompute.
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` if the item is not on the user's todo, or a
    /// database error after retries are exhausted
    pub async fn toggle_item(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        item_id: Uuid,
        completed: bool,
    ) -> AppResult<ToggleOutcome> {
        retry_transaction(
            || self.toggle_item_once(user_id, todo_id, item_id, completed),
            DEFAULT_MAX_ATTEMPTS,
        )
        .await
    }

    async fn toggle_item_once(
        &self,
        user_id: Uuid,
        todo_id: Uuid,
        item_id: Uuid,
        completed: bool,
    ) -> AppResult<ToggleOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r"
            SELECT i.id, i.todo_id, i.day_index, i.slot, i.kind, i.completed
            FROM checklist_items i
            JOIN todos t ON t.id = i.todo_id
            WHERE i.id = $1 AND i.todo_id = $2 AND t.user_id = $3
            ",
        )
        .bind(item_id.to_string())
        .bind(todo_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Checklist item"))?;

        let mut item = row_to_item(&row)?;
        let changed = item.completed != completed;
        let points_delta = match (changed, completed) {
            (false, _) => 0,
            (true, true) => CHECK_ITEM_POINTS,
            (true, false) => -CHECK_ITEM_POINTS,
        };

        if changed {
            sqlx::query("UPDATE checklist_items SET completed = $1 WHERE id = $2")
                .bind(completed)
                .bind(item_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to update checklist item: {e}")))?;

            sqlx::query("UPDATE users SET points = points + $1 WHERE id = $2")
                .bind(points_delta)
                .bind(user_id.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::database(format!("Failed to update points: {e}")))?;

            let (kind, note) = if completed {
                (RewardKind::CheckItem, format!("item:{item_id}"))
            } else {
                (RewardKind::CheckItemRevoke, format!("item:{item_id}:undo"))
            };
            let entry = RewardEntry {
                id: Uuid::new_v4(),
                user_id,
                points: points_delta,
                kind,
                note: Some(note),
                created_at: Utc::now(),
            };
            insert_reward_entry(&mut *tx, &entry).await?;

            item.completed = completed;
        }

        let remaining: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checklist_items WHERE todo_id = $1 AND completed = 0",
        )
        .bind(todo_id.to_string())
        .fetch_one(&mut *tx)
        .await?;
        let todo_completed = remaining == 0;

        sqlx::query("UPDATE todos SET completed = $1 WHERE id = $2")
            .bind(todo_completed)
            .bind(todo_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to update todo completion: {e}")))?;

        let points: i64 = sqlx::query_scalar("SELECT points FROM users WHERE id = $1")
            .bind(user_id.to_string())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(%user_id, %todo_id, %item_id, changed, points_delta, todo_completed, "Checklist item toggled");

        Ok(ToggleOutcome {
            item,
            changed,
            points_delta,
            points,
            todo_completed,
        })
    }

    async fn attach_items(&self, todo: Todo) -> AppResult<TodoWithItems> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM checklist_items WHERE todo_id = $1 ORDER BY day_index, slot"
        ))
        .bind(todo.id.to_string())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.iter().map(row_to_item).collect::<AppResult<Vec<_>>>()?;
        Ok(TodoWithItems { todo, items })
    }
}

fn row_to_todo(row: &SqliteRow) -> AppResult<Todo> {
    let id: String = row.get("id");
    let user_id: String = row.get("user_id");
    let created_at: String = row.get("created_at");

    Ok(Todo {
        id: parse_uuid(&id)?,
        user_id: parse_uuid(&user_id)?,
        plan_id: parse_optional_uuid(row.get("plan_id"))?,
        title: row.get("title"),
        completed: row.get("completed"),
        created_at: parse_timestamp(&created_at)?,
    })
}

fn row_to_item(row: &SqliteRow) -> AppResult<ChecklistItem> {
    let id: String = row.get("id");
    let todo_id: String = row.get("todo_id");
    let kind: String = row.get("kind");

    Ok(ChecklistItem {
        id: parse_uuid(&id)?,
        todo_id: parse_uuid(&todo_id)?,
        day_index: row.get("day_index"),
        slot: row.get("slot"),
        kind: kind.parse::<ItemKind>()?,
        completed: row.get("completed"),
        label: None,
    })
}
