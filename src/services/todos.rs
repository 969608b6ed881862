// ABOUTME: Weekly checklist generation, labelling, and point-settled item toggles
// ABOUTME: Lays out diet and exercise items from a plan and resolves their text at read time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Weekly Checklists
//!
//! A checklist ("todo") stores only positions: `day_index` 1..=7 and a
//! `slot` within the day. A structured plan yields one diet item (slot 0)
//! followed by one exercise item per listed exercise; anything else yields
//! one daily item per day. Item text is looked up in the linked plan every
//! time the checklist is read, so plan revisions show up immediately.

use std::collections::HashMap;

use chrono::Utc;
use fitplan_core::constants::schedule::{DAYS_PER_WEEK, DAY_KEYS, DEFAULT_TODO_TITLE};
use fitplan_core::errors::{AppError, AppResult, ErrorCode};
use fitplan_core::models::{ChecklistItem, ItemKind, Plan, Todo, TodoWithItems, ToggleOutcome};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::{Database, ItemSpec};
use crate::logging::AppLogger;

/// Meal fields rendered into a diet label, in display order
const MEALS: [(&str, &str); 4] = [
    ("breakfast", "Breakfast"),
    ("lunch", "Lunch"),
    ("dinner", "Dinner"),
    ("snacks", "Snacks"),
];

/// Result of the "mark week complete" operation
#[derive(Debug, Clone)]
pub struct WeekRollover {
    /// Whether the completion flag changed
    pub changed: bool,
    /// Checklist generated for the following week
    pub next: TodoWithItems,
}

/// Plan key for a 1-based day index
fn day_key(day_index: i64) -> Option<&'static str> {
    usize::try_from(day_index - 1)
        .ok()
        .and_then(|i| DAY_KEYS.get(i).copied())
}

/// True when the plan has both a `diet` and an `exercise` object
fn is_structured(content: &Value) -> bool {
    content.get("diet").is_some_and(Value::is_object)
        && content.get("exercise").is_some_and(Value::is_object)
}

/// Item positions for a new checklist
#[must_use]
pub fn layout_items(content: Option<&Value>) -> Vec<ItemSpec> {
    let mut items = Vec::new();

    for day_index in 1..=i64::from(DAYS_PER_WEEK) {
        match content.filter(|content| is_structured(content)) {
            Some(content) => {
                items.push(ItemSpec {
                    day_index,
                    slot: 0,
                    kind: ItemKind::Diet,
                });

                let exercises = day_key(day_index)
                    .and_then(|key| content["exercise"].get(key))
                    .and_then(Value::as_array)
                    .map_or(0, Vec::len);

                items.extend((1..=exercises as i64).map(|slot| ItemSpec {
                    day_index,
                    slot,
                    kind: ItemKind::Exercise,
                }));
            }
            None => items.push(ItemSpec {
                day_index,
                slot: 0,
                kind: ItemKind::Daily,
            }),
        }
    }

    items
}

/// Render a meal entry that may be a string or a list of strings
fn meal_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(text) => text.trim().to_owned(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Text for one item, looked up in the plan document
#[must_use]
pub fn item_label(content: &Value, item: &ChecklistItem) -> Option<String> {
    let key = day_key(item.day_index)?;

    match item.kind {
        ItemKind::Diet => {
            let meals = content.get("diet")?.get(key)?;
            let lines: Vec<String> = MEALS
                .iter()
                .filter_map(|(field, name)| {
                    meals
                        .get(*field)
                        .and_then(meal_text)
                        .map(|text| format!("{name}: {text}"))
                })
                .collect();
            (!lines.is_empty()).then(|| lines.join("; "))
        }
        ItemKind::Exercise => {
            let index = usize::try_from(item.slot - 1).ok()?;
            content
                .get("exercise")?
                .get(key)?
                .get(index)?
                .as_str()
                .map(str::to_owned)
        }
        ItemKind::Daily => {
            let index = usize::try_from(item.day_index - 1).ok()?;
            content
                .get("days")?
                .get(index)?
                .get("todo")?
                .as_str()
                .map(str::to_owned)
        }
    }
}

/// Fill item labels from the plan
pub fn apply_labels(todo: &mut TodoWithItems, plan: Option<&Plan>) {
    let Some(plan) = plan else {
        return;
    };
    for item in &mut todo.items {
        item.label = item_label(&plan.content, item);
    }
}

/// Load the checklist's plan and fill its labels
async fn label(database: &Database, mut todo: TodoWithItems) -> AppResult<TodoWithItems> {
    if let Some(plan_id) = todo.todo.plan_id {
        let plan = database.get_plan(plan_id).await?;
        apply_labels(&mut todo, plan.as_ref());
    }
    Ok(todo)
}

/// Generate a checklist, optionally from one of the user's plans
///
/// # Errors
///
/// Returns `ResourceNotFound` if `plan_id` names a plan the user does not own
pub async fn create_todo(
    database: &Database,
    user_id: Uuid,
    plan_id: Option<Uuid>,
    title: Option<&str>,
) -> AppResult<TodoWithItems> {
    let plan = match plan_id {
        Some(plan_id) => Some(
            database
                .get_plan(plan_id)
                .await?
                .filter(|plan| plan.user_id == user_id)
                .ok_or_else(|| AppError::not_found("Plan"))?,
        ),
        None => None,
    };

    let title = plan
        .as_ref()
        .and_then(Plan::title)
        .or_else(|| title.map(str::trim).filter(|title| !title.is_empty()))
        .unwrap_or(DEFAULT_TODO_TITLE)
        .to_owned();

    let todo = Todo {
        id: Uuid::new_v4(),
        user_id,
        plan_id: plan.as_ref().map(|plan| plan.id),
        title,
        completed: false,
        created_at: Utc::now(),
    };
    let specs = layout_items(plan.as_ref().map(|plan| &plan.content));

    let mut created = database.create_todo_with_items(&todo, &specs).await?;
    apply_labels(&mut created, plan.as_ref());

    info!(
        user.id = %user_id,
        todo.id = %todo.id,
        items = specs.len(),
        "Checklist created"
    );
    Ok(created)
}

/// All of the user's checklists, newest first, with labels
///
/// # Errors
///
/// Returns an error if a query fails
pub async fn list_todos(database: &Database, user_id: Uuid) -> AppResult<Vec<TodoWithItems>> {
    let mut todos = database.list_todos(user_id).await?;
    let mut plans: HashMap<Uuid, Option<Plan>> = HashMap::new();

    for todo in &mut todos {
        let Some(plan_id) = todo.todo.plan_id else {
            continue;
        };
        if !plans.contains_key(&plan_id) {
            plans.insert(plan_id, database.get_plan(plan_id).await?);
        }
        apply_labels(todo, plans.get(&plan_id).and_then(Option::as_ref));
    }

    Ok(todos)
}

/// One of the user's checklists with labels
///
/// # Errors
///
/// Returns `ResourceNotFound` if the checklist does not belong to the user
pub async fn get_todo(database: &Database, user_id: Uuid, todo_id: Uuid) -> AppResult<TodoWithItems> {
    let todo = database
        .get_todo_with_items(user_id, todo_id)
        .await?
        .ok_or_else(|| AppError::not_found("Todo"))?;
    label(database, todo).await
}

/// Newest unfinished checklist, generating one when none is open
///
/// # Errors
///
/// Returns an error if a query or the generation fails
pub async fn latest_open_todo(database: &Database, user_id: Uuid) -> AppResult<TodoWithItems> {
    if let Some(todo) = database.latest_open_todo(user_id).await? {
        return label(database, todo).await;
    }

    let plan = database.latest_plan(user_id).await?;
    debug!(user.id = %user_id, has_plan = plan.is_some(), "No open checklist, generating one");
    create_todo(database, user_id, plan.map(|plan| plan.id), None).await
}

/// Generate a checklist from the user's newest plan
///
/// # Errors
///
/// Returns `ResourceNotFound` ("No plan found") if the user has no plan
pub async fn create_from_latest_plan(database: &Database, user_id: Uuid) -> AppResult<TodoWithItems> {
    let plan = database
        .latest_plan(user_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ResourceNotFound, "No plan found"))?;
    create_todo(database, user_id, Some(plan.id), None).await
}

/// Check or uncheck an item, settling points
///
/// # Errors
///
/// Returns `ResourceNotFound` if the item is not on the user's checklist
pub async fn toggle_item(
    database: &Database,
    user_id: Uuid,
    todo_id: Uuid,
    item_id: Uuid,
    completed: bool,
) -> AppResult<ToggleOutcome> {
    let outcome = database
        .toggle_item(user_id, todo_id, item_id, completed)
        .await?;

    if outcome.changed {
        let kind = if outcome.points_delta > 0 {
            "CHECK_ITEM"
        } else {
            "CHECK_ITEM_REVOKE"
        };
        AppLogger::log_points_change(
            &user_id.to_string(),
            kind,
            outcome.points_delta,
            outcome.points,
        );
    }
    info!(
        user.id = %user_id,
        todo.id = %todo_id,
        item.id = %item_id,
        changed = outcome.changed,
        todo_completed = outcome.todo_completed,
        "Checklist item toggled"
    );

    Ok(outcome)
}

/// Set the completion flag of a checklist directly; points are untouched
///
/// # Errors
///
/// Returns `ResourceNotFound` if the checklist does not belong to the user
pub async fn complete_todo(
    database: &Database,
    user_id: Uuid,
    todo_id: Uuid,
    completed: bool,
) -> AppResult<bool> {
    let changed = database
        .set_todo_completed(user_id, todo_id, completed)
        .await?;
    debug!(user.id = %user_id, todo.id = %todo_id, completed, changed, "Checklist completion set");
    Ok(changed)
}

/// Mark a week complete and start the next one from the newest plan
///
/// # Errors
///
/// Returns `ResourceNotFound` if the checklist is not the user's, or
/// `ResourceNotFound` with `{"completed": true}` details when the week was
/// closed but no plan exists to start the next one
pub async fn complete_and_roll_over(
    database: &Database,
    user_id: Uuid,
    todo_id: Uuid,
) -> AppResult<WeekRollover> {
    let changed = complete_todo(database, user_id, todo_id, true).await?;

    let next = create_from_latest_plan(database, user_id)
        .await
        .map_err(|e| {
            if e.code == ErrorCode::ResourceNotFound {
                AppError::new(
                    ErrorCode::ResourceNotFound,
                    "No plan found to generate new todo",
                )
                .with_details(serde_json::json!({ "completed": true }))
            } else {
                e
            }
        })?;

    Ok(WeekRollover { changed, next })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured_plan() -> Value {
        json!({
            "diet": {
                "monday": { "breakfast": "Oats", "lunch": ["Rice", "Fish"], "dinner": "Soup" },
                "tips": ["Drink water"]
            },
            "exercise": {
                "monday": ["Squats 3x10", "Plank 3x30s"],
                "tuesday": ["Walk 30 min"],
                "tips": []
            }
        })
    }

    fn item(day_index: i64, slot: i64, kind: ItemKind) -> ChecklistItem {
        ChecklistItem {
            id: Uuid::new_v4(),
            todo_id: Uuid::new_v4(),
            day_index,
            slot,
            kind,
            completed: false,
            label: None,
        }
    }

    #[test]
    fn test_structured_layout_has_diet_then_exercises() {
        let plan = structured_plan();
        let specs = layout_items(Some(&plan));

        // 7 diet items + 2 Monday + 1 Tuesday exercises
        assert_eq!(specs.len(), 10);
        assert_eq!(specs[0], ItemSpec { day_index: 1, slot: 0, kind: ItemKind::Diet });
        assert_eq!(specs[2], ItemSpec { day_index: 1, slot: 2, kind: ItemKind::Exercise });
        assert_eq!(specs[3], ItemSpec { day_index: 2, slot: 0, kind: ItemKind::Diet });
        assert_eq!(specs.last().map(|s| s.day_index), Some(7));
    }

    #[test]
    fn test_unstructured_or_missing_plan_gets_daily_items() {
        for content in [None, Some(json!({ "days": [] })), Some(json!({ "diet": {} }))] {
            let specs = layout_items(content.as_ref());
            assert_eq!(specs.len(), 7);
            assert!(specs.iter().all(|s| s.kind == ItemKind::Daily && s.slot == 0));
        }
    }

    #[test]
    fn test_labels_come_from_plan() {
        let plan = structured_plan();
        assert_eq!(
            item_label(&plan, &item(1, 0, ItemKind::Diet)).as_deref(),
            Some("Breakfast: Oats; Lunch: Rice, Fish; Dinner: Soup")
        );
        assert_eq!(
            item_label(&plan, &item(1, 2, ItemKind::Exercise)).as_deref(),
            Some("Plank 3x30s")
        );
        assert_eq!(item_label(&plan, &item(2, 0, ItemKind::Diet)), None);
        assert_eq!(item_label(&plan, &item(9, 1, ItemKind::Exercise)), None);
    }

    #[test]
    fn test_daily_label_uses_days_array() {
        let plan = json!({ "days": [{ "todo": "Stretch" }, { "todo": "Swim" }] });
        assert_eq!(
            item_label(&plan, &item(2, 0, ItemKind::Daily)).as_deref(),
            Some("Swim")
        );
        assert_eq!(item_label(&plan, &item(3, 0, ItemKind::Daily)), None);
    }
}
