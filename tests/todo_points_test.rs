// ABOUTME: Integration tests for checklist toggles and point settlement
// ABOUTME: Drives random toggle sequences and checks balance, ledger, and completion agree
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use common::{create_account, create_test_database, create_test_user};
use fitplan_server::database::Database;
use fitplan_server::errors::ErrorCode;
use fitplan_server::models::{RewardKind, Role, TodoWithItems, User};
use fitplan_server::services::todos;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

async fn setup() -> (Database, User, TodoWithItems) {
    let database = create_test_database().await.unwrap();
    let user = create_test_user(&database).await.unwrap();
    let todo = todos::create_todo(&database, user.id, None, Some("Week one"))
        .await
        .unwrap();
    (database, user, todo)
}

async fn balance(database: &Database, user: &User) -> i64 {
    database.get_user(user.id).await.unwrap().unwrap().points
}

#[tokio::test]
async fn test_random_toggle_sequences_keep_balance_and_ledger_consistent() {
    for seed in [7_u64, 42, 1337] {
        let (database, user, todo) = setup().await;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut checked = vec![false; todo.items.len()];
        let mut state_changes = 0_usize;

        for _ in 0..120 {
            let index = rng.gen_range(0..todo.items.len());
            let target = rng.gen_bool(0.6);
            let item = &todo.items[index];

            let outcome = todos::toggle_item(&database, user.id, todo.todo.id, item.id, target)
                .await
                .unwrap();

            let expected_delta = match (checked[index], target) {
                (false, true) => 10,
                (true, false) => -10,
                _ => 0,
            };
            assert_eq!(outcome.points_delta, expected_delta);
            assert_eq!(outcome.changed, expected_delta != 0);
            assert_eq!(outcome.item.completed, target);
            if outcome.changed {
                state_changes += 1;
            }

            checked[index] = target;
            let checked_count = checked.iter().filter(|c| **c).count() as i64;
            assert_eq!(outcome.points, checked_count * 10);
            assert_eq!(outcome.todo_completed, checked.iter().all(|c| *c));
        }

        let checked_count = checked.iter().filter(|c| **c).count() as i64;
        assert_eq!(balance(&database, &user).await, checked_count * 10);

        let grants = database
            .count_rewards(user.id, RewardKind::CheckItem)
            .await
            .unwrap();
        let revokes = database
            .count_rewards(user.id, RewardKind::CheckItemRevoke)
            .await
            .unwrap();
        assert_eq!(grants - revokes, checked_count, "seed {seed}");

        let ledger = database.list_rewards(user.id).await.unwrap();
        assert_eq!(ledger.len(), state_changes, "seed {seed}");

        let ledger_sum: i64 = ledger.iter().map(|entry| entry.points).sum();
        assert_eq!(ledger_sum, checked_count * 10);

        let stored = database
            .get_todo_with_items(user.id, todo.todo.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.todo.completed, checked.iter().all(|c| *c));
    }
}

#[tokio::test]
async fn test_ledger_notes_reference_the_item() {
    let (database, user, todo) = setup().await;
    let item = &todo.items[0];

    todos::toggle_item(&database, user.id, todo.todo.id, item.id, true)
        .await
        .unwrap();
    todos::toggle_item(&database, user.id, todo.todo.id, item.id, false)
        .await
        .unwrap();

    let ledger = database.list_rewards(user.id).await.unwrap();
    assert_eq!(ledger.len(), 2);

    let grant = ledger.iter().find(|e| e.kind == RewardKind::CheckItem).unwrap();
    assert_eq!(grant.points, 10);
    assert_eq!(grant.note.as_deref(), Some(format!("item:{}", item.id).as_str()));

    let revoke = ledger
        .iter()
        .find(|e| e.kind == RewardKind::CheckItemRevoke)
        .unwrap();
    assert_eq!(revoke.points, -10);
    assert_eq!(
        revoke.note.as_deref(),
        Some(format!("item:{}:undo", item.id).as_str())
    );
}

#[tokio::test]
async fn test_checking_every_item_completes_and_unchecking_reopens() {
    let (database, user, todo) = setup().await;
    let last = todo.items.len() - 1;

    for (i, item) in todo.items.iter().enumerate() {
        let outcome = todos::toggle_item(&database, user.id, todo.todo.id, item.id, true)
            .await
            .unwrap();
        assert_eq!(outcome.todo_completed, i == last);
    }
    assert_eq!(balance(&database, &user).await, 70);

    let reopened = todos::toggle_item(&database, user.id, todo.todo.id, todo.items[3].id, false)
        .await
        .unwrap();
    assert!(!reopened.todo_completed);
    assert_eq!(reopened.points, 60);
}

#[tokio::test]
async fn test_same_state_toggle_only_recomputes_completion() {
    let (database, user, todo) = setup().await;

    // Force the flag out of sync with the items
    todos::complete_todo(&database, user.id, todo.todo.id, true)
        .await
        .unwrap();

    let outcome = todos::toggle_item(&database, user.id, todo.todo.id, todo.items[0].id, false)
        .await
        .unwrap();
    assert!(!outcome.changed);
    assert_eq!(outcome.points_delta, 0);
    assert!(!outcome.todo_completed);
    assert!(database.list_rewards(user.id).await.unwrap().is_empty());

    let stored = database
        .get_todo_with_items(user.id, todo.todo.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.todo.completed);
}

#[tokio::test]
async fn test_toggling_another_users_item_is_not_found() {
    let (database, owner, todo) = setup().await;
    let intruder = create_account(&database, "intruder@example.com", Role::User)
        .await
        .unwrap();

    let err = todos::toggle_item(&database, intruder.id, todo.todo.id, todo.items[0].id, true)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    assert_eq!(balance(&database, &intruder).await, 0);
    assert_eq!(balance(&database, &owner).await, 0);
    assert!(database.list_rewards(intruder.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_item_from_another_checklist_is_not_found() {
    let (database, user, first) = setup().await;
    let second = todos::create_todo(&database, user.id, None, Some("Week two"))
        .await
        .unwrap();

    let err = todos::toggle_item(&database, user.id, first.todo.id, second.items[0].id, true)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}
