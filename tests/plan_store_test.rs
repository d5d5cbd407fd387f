// ABOUTME: Integration tests for atomic plan persistence and owner-scoped retrieval
// ABOUTME: Covers round trips, ordering, listing, cascade deletes and rollback on failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use pierre_plan_core::{FitnessGoal, PlanDay, PlanExercise};
use pierre_plan_server::plans::DeterministicPlanBuilder;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

async fn table_count(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query(&format!("SELECT COUNT(*) AS count FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
        .get::<i64, _>("count")
}

fn exercise(seq: u32, name: &str) -> PlanExercise {
    PlanExercise {
        seq,
        name: name.to_owned(),
        sets: Some(3),
        reps_or_time: Some("10".to_owned()),
        rest_sec: Some(60),
        notes: None,
    }
}

#[tokio::test]
async fn test_persist_then_fetch_round_trip() {
    let database = common::create_test_database().await;
    let store = database.plan_store();
    let prefs = common::preferences(&common::scenario_preferences_json());
    let days = DeterministicPlanBuilder::build(&prefs);
    let owner = Uuid::new_v4();

    let plan = store
        .persist(owner, "Round Trip", &prefs, &days)
        .await
        .expect("persist should succeed");
    assert_eq!(plan.owner_id, owner);
    assert_eq!(plan.goal, FitnessGoal::GeneralFitness);

    let fetched = store
        .fetch(plan.id, owner)
        .await
        .unwrap()
        .expect("plan should exist");
    assert_eq!(fetched.id, plan.id);
    assert_eq!(fetched.title, "Round Trip");
    assert_eq!(fetched.days_per_week, 3);
    assert_eq!(fetched.minutes_per_session, 45);
    assert!(fetched.add_cardio && fetched.add_core && fetched.add_mobility);
    assert_eq!(fetched.days, days);
    assert_eq!(
        fetched.created_at.timestamp_micros(),
        plan.created_at.timestamp_micros()
    );
}

#[tokio::test]
async fn test_fetch_orders_days_and_exercises() {
    let database = common::create_test_database().await;
    let store = database.plan_store();
    let prefs = common::preferences(&common::preferences_json(3, "maintain_shape"));
    let owner = Uuid::new_v4();

    let days = vec![
        PlanDay {
            day_order: 3,
            focus: "Third".to_owned(),
            warmup: None,
            cooldown: None,
            exercises: vec![exercise(2, "B"), exercise(1, "A")],
        },
        PlanDay {
            day_order: 1,
            focus: "First".to_owned(),
            warmup: Some("Jog".to_owned()),
            cooldown: None,
            exercises: vec![exercise(1, "Only")],
        },
        PlanDay {
            day_order: 2,
            focus: "Second".to_owned(),
            warmup: None,
            cooldown: Some("Stretch".to_owned()),
            exercises: vec![exercise(1, "Solo")],
        },
    ];
    let plan = store.persist(owner, "Ordered", &prefs, &days).await.unwrap();

    let fetched = store.fetch(plan.id, owner).await.unwrap().unwrap();
    let orders: Vec<u32> = fetched.days.iter().map(|d| d.day_order).collect();
    assert_eq!(orders, vec![1, 2, 3]);
    let third: Vec<&str> = fetched.days[2]
        .exercises
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(third, vec!["A", "B"]);
    assert_eq!(fetched.days[0].warmup.as_deref(), Some("Jog"));
    assert_eq!(fetched.days[1].cooldown.as_deref(), Some("Stretch"));
}

#[tokio::test]
async fn test_fetch_is_scoped_to_owner() {
    let database = common::create_test_database().await;
    let store = database.plan_store();
    let prefs = common::preferences(&common::scenario_preferences_json());
    let owner = Uuid::new_v4();
    let plan = store
        .persist(owner, "Mine", &prefs, &DeterministicPlanBuilder::build(&prefs))
        .await
        .unwrap();

    assert!(store.fetch(plan.id, Uuid::new_v4()).await.unwrap().is_none());
    assert!(store.fetch(Uuid::new_v4(), owner).await.unwrap().is_none());
    assert!(!store.delete(plan.id, Uuid::new_v4()).await.unwrap());
    assert!(store.fetch(plan.id, owner).await.unwrap().is_some());
}

#[tokio::test]
async fn test_list_newest_first_per_owner() {
    let database = common::create_test_database().await;
    let store = database.plan_store();
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();

    for (days, title) in [(3, "First"), (4, "Second"), (5, "Third")] {
        let prefs = common::preferences(&common::preferences_json(days, "lose_weight"));
        store
            .persist(owner, title, &prefs, &DeterministicPlanBuilder::build(&prefs))
            .await
            .unwrap();
    }
    let prefs = common::preferences(&common::scenario_preferences_json());
    store
        .persist(other, "Someone Else", &prefs, &DeterministicPlanBuilder::build(&prefs))
        .await
        .unwrap();

    let summaries = store.list_for_owner(owner).await.unwrap();
    let titles: Vec<&str> = summaries.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Third", "Second", "First"]);
    assert_eq!(summaries[0].days_per_week, 5);
    assert_eq!(summaries[0].goal, FitnessGoal::LoseWeight);

    assert!(store.list_for_owner(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_cascades_to_days_and_exercises() {
    let database = common::create_test_database().await;
    let store = database.plan_store();
    let pool = database.pool();
    let prefs = common::preferences(&common::scenario_preferences_json());
    let owner = Uuid::new_v4();
    let plan = store
        .persist(owner, "Doomed", &prefs, &DeterministicPlanBuilder::build(&prefs))
        .await
        .unwrap();
    assert_eq!(table_count(pool, "workout_plan_days").await, 3);
    assert!(table_count(pool, "workout_plan_exercises").await > 0);

    assert!(store.delete(plan.id, owner).await.unwrap());
    assert!(!store.delete(plan.id, owner).await.unwrap());

    assert_eq!(table_count(pool, "workout_plans").await, 0);
    assert_eq!(table_count(pool, "workout_plan_days").await, 0);
    assert_eq!(table_count(pool, "workout_plan_exercises").await, 0);
}

#[tokio::test]
async fn test_failing_insert_leaves_no_rows() {
    let database = common::create_test_database().await;
    let store = database.plan_store();
    let pool = database.pool();
    let prefs = common::preferences(&common::scenario_preferences_json());

    let mut days = DeterministicPlanBuilder::build(&prefs);
    let last_day = days.last_mut().unwrap();
    let next_seq = u32::try_from(last_day.exercises.len()).unwrap() + 1;
    last_day.exercises.push(exercise(next_seq, &"X".repeat(101)));

    let err = store
        .persist(Uuid::new_v4(), "Broken", &prefs, &days)
        .await
        .expect_err("name over the column limit must fail");
    assert_eq!(err.code, pierre_plan_server::errors::ErrorCode::DatabaseError);

    assert_eq!(table_count(pool, "workout_plans").await, 0);
    assert_eq!(table_count(pool, "workout_plan_days").await, 0);
    assert_eq!(table_count(pool, "workout_plan_exercises").await, 0);
}

#[tokio::test]
async fn test_file_database_survives_reopen() {
    common::init_test_logging();
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("nested").join("plans.db");
    let url = format!("sqlite:{}", db_path.display());
    let prefs = common::preferences(&common::scenario_preferences_json());
    let owner = Uuid::new_v4();

    let plan_id = {
        let database = pierre_plan_server::database::PlanDatabase::new(&url)
            .await
            .expect("file database should open");
        let plan = database
            .plan_store()
            .persist(owner, "Durable", &prefs, &DeterministicPlanBuilder::build(&prefs))
            .await
            .unwrap();
        database.pool().close().await;
        plan.id
    };
    assert!(db_path.exists());

    let reopened = pierre_plan_server::database::PlanDatabase::new(&url)
        .await
        .expect("reopen should migrate idempotently");
    let fetched = reopened.plan_store().fetch(plan_id, owner).await.unwrap();
    assert_eq!(fetched.unwrap().title, "Durable");
}

async fn assert_rejected_without_rows(days: &[PlanDay], expected_fragment: &str) {
    let database = common::create_test_database().await;
    let pool = database.pool();
    let prefs = common::preferences(&common::scenario_preferences_json());

    let err = database
        .plan_store()
        .persist(Uuid::new_v4(), "Partial", &prefs, days)
        .await
        .expect_err("partial plan must be rejected");
    assert_eq!(err.code, pierre_plan_server::errors::ErrorCode::InvalidInput);
    assert!(
        err.message.contains(expected_fragment),
        "unexpected message: {}",
        err.message
    );

    assert_eq!(table_count(pool, "workout_plans").await, 0);
    assert_eq!(table_count(pool, "workout_plan_days").await, 0);
    assert_eq!(table_count(pool, "workout_plan_exercises").await, 0);
}

#[tokio::test]
async fn test_plan_without_days_is_rejected() {
    assert_rejected_without_rows(&[], "needs 3 days").await;
}

#[tokio::test]
async fn test_wrong_day_count_is_rejected() {
    let prefs = common::preferences(&common::scenario_preferences_json());
    let mut days = DeterministicPlanBuilder::build(&prefs);
    days.pop();
    assert_rejected_without_rows(&days, "needs 3 days").await;
}

#[tokio::test]
async fn test_gapped_day_orders_are_rejected() {
    let prefs = common::preferences(&common::scenario_preferences_json());
    let mut days = DeterministicPlanBuilder::build(&prefs);
    days[2].day_order = 5;
    assert_rejected_without_rows(&days, "Day orders").await;

    let mut duplicated = DeterministicPlanBuilder::build(&prefs);
    duplicated[2].day_order = 2;
    assert_rejected_without_rows(&duplicated, "Day orders").await;
}

#[tokio::test]
async fn test_day_without_exercises_is_rejected() {
    let prefs = common::preferences(&common::scenario_preferences_json());
    let mut days = DeterministicPlanBuilder::build(&prefs);
    days[1].exercises.clear();
    assert_rejected_without_rows(&days, "Day 2 has no exercises").await;
}

#[tokio::test]
async fn test_gapped_exercise_seq_is_rejected() {
    let prefs = common::preferences(&common::scenario_preferences_json());
    let mut days = DeterministicPlanBuilder::build(&prefs);
    days[0].exercises = vec![exercise(1, "A"), exercise(3, "C")];
    assert_rejected_without_rows(&days, "Exercise seq values of day 1").await;
}
