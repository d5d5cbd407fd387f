// ABOUTME: Single-transaction writer for a plan with its days and exercises
// ABOUTME: Retries the whole write on SQLite lock contention; a dropped writer leaves nothing behind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Plan writes run inside one `SQLx` transaction owned by [`PlanWriter`].
//!
//! The writer only exposes the three inserts a plan needs and `commit`. If
//! it is dropped before `commit`, for example because an insert failed and
//! `?` returned early, `SQLx` rolls the transaction back, so readers never
//! observe a plan without its days.

use std::future::Future;
use std::time::Duration;

use pierre_plan_core::{Plan, PlanDay, PlanExercise};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};

/// First backoff step between whole-write retries
const LOCK_RETRY_BASE: Duration = Duration::from_millis(10);

/// Open transaction for one plan write
pub struct PlanWriter {
    tx: Transaction<'static, Sqlite>,
    rows: usize,
}

impl PlanWriter {
    /// Begin the transaction
    ///
    /// # Errors
    ///
    /// Returns a database error if no connection can be acquired
    pub async fn begin(pool: &SqlitePool) -> AppResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;
        Ok(Self { tx, rows: 0 })
    }

    /// Insert the `workout_plans` row
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails
    pub async fn insert_plan_row(&mut self, plan: &Plan) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO workout_plans (
                id, owner_id, title, goal, days_per_week, minutes_per_session,
                equipment, level, add_cardio, add_core, add_mobility, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ",
        )
        .bind(plan.id.to_string())
        .bind(plan.owner_id.to_string())
        .bind(&plan.title)
        .bind(plan.goal.as_str())
        .bind(i64::from(plan.days_per_week))
        .bind(i64::from(plan.minutes_per_session))
        .bind(plan.equipment.as_str())
        .bind(plan.level.as_str())
        .bind(plan.add_cardio)
        .bind(plan.add_core)
        .bind(plan.add_mobility)
        .bind(plan.created_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert plan: {e}")))?;
        self.rows += 1;
        Ok(())
    }

    /// Insert one day row and return its row id
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails
    pub async fn insert_day(&mut self, plan: &Plan, day: &PlanDay) -> AppResult<i64> {
        let day_id = sqlx::query(
            r"
            INSERT INTO workout_plan_days (plan_id, day_order, focus, warmup, cooldown)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(plan.id.to_string())
        .bind(i64::from(day.day_order))
        .bind(&day.focus)
        .bind(&day.warmup)
        .bind(&day.cooldown)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to insert plan day {}: {e}", day.day_order)))?
        .last_insert_rowid();
        self.rows += 1;
        Ok(day_id)
    }

    /// Insert one exercise row under `day_id`
    ///
    /// # Errors
    ///
    /// Returns a database error if the insert fails
    pub async fn insert_exercise(
        &mut self,
        day_id: i64,
        day_order: u32,
        exercise: &PlanExercise,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO workout_plan_exercises (
                day_id, seq, name, sets, reps_or_time, rest_sec, notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(day_id)
        .bind(i64::from(exercise.seq))
        .bind(&exercise.name)
        .bind(exercise.sets.map(i64::from))
        .bind(&exercise.reps_or_time)
        .bind(exercise.rest_sec.map(i64::from))
        .bind(&exercise.notes)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            AppError::database(format!(
                "Failed to insert exercise {} of day {day_order}: {e}",
                exercise.seq
            ))
        })?;
        self.rows += 1;
        Ok(())
    }

    /// Commit every row written so far
    ///
    /// # Errors
    ///
    /// Returns a database error if the commit fails; nothing is kept in that case
    pub async fn commit(self) -> AppResult<()> {
        let rows = self.rows;
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::database(format!("Transaction commit failed: {e}")))?;
        debug!(rows, "Plan write committed");
        Ok(())
    }
}

/// Run a whole plan write again while `SQLite` reports lock contention
///
/// Waits 20ms, 40ms, 80ms and so on between attempts. Any other error, and
/// the error of the last attempt, is returned unchanged.
///
/// # Errors
///
/// Returns the error of the final attempt
pub async fn retry_on_lock<F, Fut, T>(max_attempts: u32, mut write: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        let err = match write().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= max_attempts || !is_lock_contention(&err.message) {
            return Err(err);
        }

        let backoff = LOCK_RETRY_BASE * 2_u32.saturating_pow(attempt);
        warn!(
            attempt,
            max_attempts,
            backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Plan write hit lock contention, retrying"
        );
        sleep(backoff).await;
        attempt += 1;
    }
}

/// Whether a database error message describes a transient lock
///
/// Constraint failures are never transient, even when the driver message
/// also mentions a lock.
#[must_use]
pub fn is_lock_contention(message: &str) -> bool {
    let message = message.to_lowercase();
    !message.contains("constraint")
        && ["database is locked", "database table is locked", "busy", "timed out"]
            .iter()
            .any(|needle| message.contains(needle))
}
