// ABOUTME: Weekly progress report computed from a checklist and the one before it
// ABOUTME: Totals, per-day counts, streak, diet/exercise breakdown, and week-over-week deltas
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{Duration, NaiveDate, NaiveTime};
use fitplan_core::constants::schedule::DAYS_PER_WEEK;
use fitplan_core::errors::AppResult;
use fitplan_core::models::{ItemKind, TodoWithItems};
use serde::Serialize;
use uuid::Uuid;

use crate::database::Database;

/// Placeholder window labels when the user has no checklist yet
const NO_WEEK_START: &str = "week-start";
const NO_WEEK_END: &str = "week-end";

/// Headline counts for one checklist
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    /// Checked items
    pub completed_count: usize,
    /// Checklists included (0 or 1)
    pub todos_touched: usize,
    /// All items
    pub scheduled_count: usize,
    /// `completed / scheduled`, 0 when nothing is scheduled
    pub completion_rate: f64,
}

/// Checked items on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    /// `day1` through `day7`
    pub date: String,
    /// Checked items with this day index
    pub completed_count: usize,
}

/// A checklist and its checked count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopTodo {
    /// Checklist ID
    pub todo_id: Uuid,
    /// Checklist title
    pub title: String,
    /// Checked items
    pub completed_count: usize,
}

/// Diet versus exercise items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Breakdown {
    /// Diet items
    pub diet_scheduled: usize,
    /// Exercise items
    pub exercise_scheduled: usize,
    /// Checked diet items
    pub diet_completed: usize,
    /// Checked exercise items
    pub exercise_completed: usize,
}

/// Previous week's headline numbers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousWeek {
    /// Checked items
    pub completed_count: usize,
    /// All items
    pub scheduled_count: usize,
    /// Completion rate
    pub completion_rate: f64,
}

/// Week-over-week comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekOverWeek {
    /// This week's checked count minus last week's
    pub completed_count_delta: i64,
    /// This week's completion rate minus last week's
    pub completion_rate_delta: f64,
    /// Last week's numbers
    pub prev_week: PreviousWeek,
}

/// The weekly report document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyReport {
    /// First day of the window, `YYYY-MM-DD`
    pub week_start: String,
    /// Last day of the window, `YYYY-MM-DD`
    pub week_end: String,
    /// Headline counts
    pub totals: ReportTotals,
    /// Seven per-day counts
    pub daily: Vec<DailyCount>,
    /// The checklist the report covers
    pub top_todos: Vec<TopTodo>,
    /// Consecutive days with a check, counting back from day 7
    pub streak_days: usize,
    /// Diet versus exercise
    pub breakdown: Breakdown,
    /// Comparison with the previous checklist
    pub wow: WeekOverWeek,
}

/// Parse a `weekStart` query value in `YYYY-MM-DD` or `YYYY/MM/DD` form
#[must_use]
pub fn parse_week_start(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y/%m/%d"))
        .ok()
}

fn totals(todo: Option<&TodoWithItems>) -> ReportTotals {
    let Some(todo) = todo else {
        return ReportTotals::default();
    };
    let scheduled_count = todo.items.len();
    let completed_count = todo.completed_count();
    ReportTotals {
        completed_count,
        todos_touched: 1,
        scheduled_count,
        completion_rate: if scheduled_count == 0 {
            0.0
        } else {
            completed_count as f64 / scheduled_count as f64
        },
    }
}

fn daily_counts(todo: Option<&TodoWithItems>) -> Vec<usize> {
    let mut counts = vec![0; usize::from(DAYS_PER_WEEK)];
    for item in todo.into_iter().flat_map(|todo| todo.items.iter()) {
        if !item.completed {
            continue;
        }
        if let Some(slot) = usize::try_from(item.day_index - 1)
            .ok()
            .and_then(|i| counts.get_mut(i))
        {
            *slot += 1;
        }
    }
    counts
}

fn streak(daily: &[usize]) -> usize {
    daily.iter().rev().take_while(|count| **count > 0).count()
}

fn breakdown(todo: Option<&TodoWithItems>) -> Breakdown {
    let mut breakdown = Breakdown::default();
    for item in todo.into_iter().flat_map(|todo| todo.items.iter()) {
        match item.kind {
            ItemKind::Diet => {
                breakdown.diet_scheduled += 1;
                breakdown.diet_completed += usize::from(item.completed);
            }
            ItemKind::Exercise => {
                breakdown.exercise_scheduled += 1;
                breakdown.exercise_completed += usize::from(item.completed);
            }
            ItemKind::Daily => {}
        }
    }
    breakdown
}

/// Build the report for `current`, comparing against `previous`
#[must_use]
pub fn compute_report(
    current: Option<&TodoWithItems>,
    previous: Option<&TodoWithItems>,
) -> WeeklyReport {
    let totals = totals(current);
    let prev = totals_for_previous(previous);
    let daily = daily_counts(current);

    let (week_start, week_end) = current.map_or_else(
        || (NO_WEEK_START.to_owned(), NO_WEEK_END.to_owned()),
        |todo| {
            let start = todo.todo.created_at.date_naive();
            let end = start + Duration::days(i64::from(DAYS_PER_WEEK) - 1);
            (start.to_string(), end.to_string())
        },
    );

    WeeklyReport {
        week_start,
        week_end,
        totals,
        streak_days: streak(&daily),
        daily: daily
            .iter()
            .enumerate()
            .map(|(i, count)| DailyCount {
                date: format!("day{}", i + 1),
                completed_count: *count,
            })
            .collect(),
        top_todos: current
            .map(|todo| TopTodo {
                todo_id: todo.todo.id,
                title: todo.todo.title.clone(),
                completed_count: totals.completed_count,
            })
            .into_iter()
            .collect(),
        breakdown: breakdown(current),
        wow: WeekOverWeek {
            completed_count_delta: totals.completed_count as i64 - prev.completed_count as i64,
            completion_rate_delta: totals.completion_rate - prev.completion_rate,
            prev_week: prev,
        },
    }
}

fn totals_for_previous(previous: Option<&TodoWithItems>) -> PreviousWeek {
    let totals = totals(previous);
    PreviousWeek {
        completed_count: totals.completed_count,
        scheduled_count: totals.scheduled_count,
        completion_rate: totals.completion_rate,
    }
}

/// Report for the user's latest checklist, or the latest one started in the given week
///
/// # Errors
///
/// Returns an error if a query fails
pub async fn weekly_report(
    database: &Database,
    user_id: Uuid,
    week_start: Option<NaiveDate>,
) -> AppResult<WeeklyReport> {
    let current = match week_start {
        Some(start) => {
            let start = start.and_time(NaiveTime::MIN).and_utc();
            let end = start + Duration::days(i64::from(DAYS_PER_WEEK));
            database.latest_todo_in_window(user_id, start, end).await?
        }
        None => database.latest_todo(user_id).await?,
    };

    let previous = match &current {
        Some(todo) => database.previous_todo(&todo.todo).await?,
        None => None,
    };

    Ok(compute_report(current.as_ref(), previous.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fitplan_core::models::{ChecklistItem, Todo};

    fn todo(items: &[(i64, ItemKind, bool)]) -> TodoWithItems {
        let todo_id = Uuid::new_v4();
        TodoWithItems {
            todo: Todo {
                id: todo_id,
                user_id: Uuid::new_v4(),
                plan_id: None,
                title: "Week".to_owned(),
                completed: false,
                created_at: Utc.with_ymd_and_hms(2025, 3, 3, 8, 0, 0).unwrap(),
            },
            items: items
                .iter()
                .enumerate()
                .map(|(slot, (day_index, kind, completed))| ChecklistItem {
                    id: Uuid::new_v4(),
                    todo_id,
                    day_index: *day_index,
                    slot: slot as i64,
                    kind: *kind,
                    completed: *completed,
                    label: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_week_start_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 3);
        assert_eq!(parse_week_start("2025-03-03"), expected);
        assert_eq!(parse_week_start("2025/03/03"), expected);
        assert_eq!(parse_week_start("03-03-2025"), None);
    }

    #[test]
    fn test_empty_report_uses_placeholders() {
        let report = compute_report(None, None);
        assert_eq!(report.week_start, "week-start");
        assert_eq!(report.week_end, "week-end");
        assert_eq!(report.daily.len(), 7);
        assert!(report.top_todos.is_empty());
        assert_eq!(report.totals, ReportTotals::default());
    }

    #[test]
    fn test_streak_counts_back_from_sunday() {
        let current = todo(&[
            (1, ItemKind::Daily, true),
            (3, ItemKind::Daily, false),
            (5, ItemKind::Daily, true),
            (6, ItemKind::Daily, true),
            (7, ItemKind::Daily, true),
        ]);
        let report = compute_report(Some(&current), None);
        assert_eq!(report.streak_days, 3);
        assert_eq!(report.daily[0].completed_count, 1);
        assert_eq!(report.daily[2].completed_count, 0);
        assert_eq!(report.week_start, "2025-03-03");
        assert_eq!(report.week_end, "2025-03-09");
    }

    #[test]
    fn test_breakdown_ignores_daily_items() {
        let current = todo(&[
            (1, ItemKind::Diet, true),
            (1, ItemKind::Exercise, true),
            (1, ItemKind::Exercise, false),
            (2, ItemKind::Daily, true),
        ]);
        let report = compute_report(Some(&current), None);
        assert_eq!(
            report.breakdown,
            Breakdown {
                diet_scheduled: 1,
                exercise_scheduled: 2,
                diet_completed: 1,
                exercise_completed: 1,
            }
        );
        assert_eq!(report.totals.completed_count, 3);
        assert!((report.totals.completion_rate - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_week_over_week_deltas() {
        let previous = todo(&[(1, ItemKind::Daily, true), (2, ItemKind::Daily, false)]);
        let current = todo(&[
            (1, ItemKind::Daily, true),
            (2, ItemKind::Daily, true),
            (3, ItemKind::Daily, true),
            (4, ItemKind::Daily, true),
        ]);
        let report = compute_report(Some(&current), Some(&previous));
        assert_eq!(report.wow.completed_count_delta, 3);
        assert!((report.wow.completion_rate_delta - 0.5).abs() < f64::EPSILON);
        assert_eq!(report.wow.prev_week.scheduled_count, 2);
    }
}
