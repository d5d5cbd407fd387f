// ABOUTME: Transactional persistence and owner-scoped reads of workout plans
// ABOUTME: Writes plan, day and exercise rows atomically and reassembles the nested plan on fetch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Instant;

use chrono::{DateTime, Utc};
use pierre_plan_core::{
    Equipment, FitnessGoal, Plan, PlanDay, PlanExercise, PlanPreferences, PlanSummary,
    TrainingLevel,
};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::plan_writer::{retry_on_lock, PlanWriter};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;

/// Attempts for a persist that keeps hitting `SQLite` lock contention
const PERSIST_MAX_ATTEMPTS: u32 = 3;

/// Plan persistence backed by `SQLite`
#[derive(Clone)]
pub struct PlanStore {
    pool: SqlitePool,
}

impl PlanStore {
    /// Create a new plan store
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a plan with all its days and exercises in one transaction
    ///
    /// Either every row is written or none is. Days are stored and returned
    /// ordered by `day_order`, exercises by `seq`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error if `days` is not a complete plan for
    /// `prefs`, or a database error if any insert fails; the transaction is
    /// rolled back before returning
    #[instrument(skip(self, prefs, days), fields(days = days.len()))]
    pub async fn persist(
        &self,
        owner_id: Uuid,
        title: &str,
        prefs: &PlanPreferences,
        days: &[PlanDay],
    ) -> AppResult<Plan> {
        let days = Self::complete_days(prefs, days)?;
        let plan = Plan {
            id: Uuid::new_v4(),
            owner_id,
            title: title.to_owned(),
            goal: prefs.goal,
            days_per_week: prefs.days_per_week,
            minutes_per_session: prefs.minutes_per_session,
            equipment: prefs.equipment,
            level: prefs.level,
            add_cardio: prefs.add_cardio,
            add_core: prefs.add_core,
            add_mobility: prefs.add_mobility,
            created_at: Utc::now(),
            days,
        };

        let started = Instant::now();
        let result = retry_on_lock(PERSIST_MAX_ATTEMPTS, || self.write_plan(&plan)).await;
        AppLogger::log_database_operation(
            "insert",
            "workout_plans",
            result.is_ok(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        );

        result.map(|()| plan)
    }

    /// Sorted copy of `days`, or an error if it would store a partial plan
    ///
    /// Day orders must be exactly `1..=daysPerWeek` and each day needs at
    /// least one exercise with `seq` values exactly `1..=n`.
    fn complete_days(prefs: &PlanPreferences, days: &[PlanDay]) -> AppResult<Vec<PlanDay>> {
        let expected = usize::from(prefs.days_per_week);
        if days.len() != expected {
            return Err(AppError::invalid_input(format!(
                "Plan needs {expected} days, got {}",
                days.len()
            )));
        }

        let mut days = days.to_vec();
        days.sort_by_key(|day| day.day_order);
        for (day, expected_order) in days.iter_mut().zip(1_u32..) {
            if day.day_order != expected_order {
                return Err(AppError::invalid_input(format!(
                    "Day orders must run 1..={expected} without gaps or duplicates"
                )));
            }
            if day.exercises.is_empty() {
                return Err(AppError::invalid_input(format!(
                    "Day {expected_order} has no exercises"
                )));
            }
            day.exercises.sort_by_key(|exercise| exercise.seq);
            if day.exercises.iter().zip(1_u32..).any(|(exercise, seq)| exercise.seq != seq) {
                return Err(AppError::invalid_input(format!(
                    "Exercise seq values of day {expected_order} must run 1..={}",
                    day.exercises.len()
                )));
            }
        }
        Ok(days)
    }

    async fn write_plan(&self, plan: &Plan) -> AppResult<()> {
        let mut writer = PlanWriter::begin(&self.pool).await?;
        writer.insert_plan_row(plan).await?;
        for day in &plan.days {
            let day_id = writer.insert_day(plan, day).await?;
            for exercise in &day.exercises {
                writer.insert_exercise(day_id, day.day_order, exercise).await?;
            }
        }
        writer.commit().await?;
        debug!(plan_id = %plan.id, "Plan persisted");
        Ok(())
    }

    /// Fetch a plan owned by `owner_id`, days by `dayOrder` and exercises by `seq`
    ///
    /// # Errors
    ///
    /// Returns a database error if a query fails or a stored row is corrupt
    pub async fn fetch(&self, plan_id: Uuid, owner_id: Uuid) -> AppResult<Option<Plan>> {
        let row = sqlx::query(
            r"
            SELECT id, owner_id, title, goal, days_per_week, minutes_per_session,
                   equipment, level, add_cardio, add_core, add_mobility, created_at
            FROM workout_plans
            WHERE id = $1 AND owner_id = $2
            ",
        )
        .bind(plan_id.to_string())
        .bind(owner_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch plan: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut plan = row_to_plan(&row)?;
        plan.days = self.fetch_days(plan_id).await?;
        Ok(Some(plan))
    }

    async fn fetch_days(&self, plan_id: Uuid) -> AppResult<Vec<PlanDay>> {
        let day_rows = sqlx::query(
            r"
            SELECT id, day_order, focus, warmup, cooldown
            FROM workout_plan_days
            WHERE plan_id = $1
            ORDER BY day_order ASC
            ",
        )
        .bind(plan_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to fetch plan days: {e}")))?;

        let mut days = Vec::with_capacity(day_rows.len());
        for row in &day_rows {
            let day_id: i64 = row.get("id");
            let exercise_rows = sqlx::query(
                r"
                SELECT seq, name, sets, reps_or_time, rest_sec, notes
                FROM workout_plan_exercises
                WHERE day_id = $1
                ORDER BY seq ASC
                ",
            )
            .bind(day_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to fetch plan exercises: {e}")))?;

            let day_order: i64 = row.get("day_order");
            days.push(PlanDay {
                day_order: to_u32(day_order, "day_order")?,
                focus: row.get("focus"),
                warmup: row.get("warmup"),
                cooldown: row.get("cooldown"),
                exercises: exercise_rows
                    .iter()
                    .map(row_to_exercise)
                    .collect::<AppResult<Vec<_>>>()?,
            });
        }
        Ok(days)
    }

    /// Plan summaries for an owner, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn list_for_owner(&self, owner_id: Uuid) -> AppResult<Vec<PlanSummary>> {
        let rows = sqlx::query(
            r"
            SELECT id, title, goal, days_per_week, created_at
            FROM workout_plans
            WHERE owner_id = $1
            ORDER BY created_at DESC, rowid DESC
            ",
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list plans: {e}")))?;

        rows.iter().map(row_to_summary).collect()
    }

    /// Delete an owner's plan; days and exercises cascade
    ///
    /// Returns `false` when no plan with that id belongs to the owner.
    ///
    /// # Errors
    ///
    /// Returns a database error if the delete fails
    pub async fn delete(&self, plan_id: Uuid, owner_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM workout_plans WHERE id = $1 AND owner_id = $2")
            .bind(plan_id.to_string())
            .bind(owner_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete plan: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn to_u32(value: i64, column: &str) -> AppResult<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::internal(format!("Invalid stored {column}: {value}")))
}

fn parse_uuid(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| AppError::internal(format!("Invalid UUID: {e}")))
}

fn parse_timestamp(raw: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::internal(format!("Invalid datetime: {e}")))
}

fn parse_goal(raw: &str) -> AppResult<FitnessGoal> {
    FitnessGoal::parse(raw).ok_or_else(|| AppError::internal(format!("Invalid stored goal: {raw}")))
}

fn row_to_plan(row: &SqliteRow) -> AppResult<Plan> {
    let id: String = row.get("id");
    let owner_id: String = row.get("owner_id");
    let goal: String = row.get("goal");
    let equipment: String = row.get("equipment");
    let level: String = row.get("level");
    let created_at: String = row.get("created_at");
    let days_per_week: i64 = row.get("days_per_week");
    let minutes_per_session: i64 = row.get("minutes_per_session");

    Ok(Plan {
        id: parse_uuid(&id)?,
        owner_id: parse_uuid(&owner_id)?,
        title: row.get("title"),
        goal: parse_goal(&goal)?,
        days_per_week: u8::try_from(days_per_week)
            .map_err(|_| AppError::internal("Invalid stored days_per_week"))?,
        minutes_per_session: u16::try_from(minutes_per_session)
            .map_err(|_| AppError::internal("Invalid stored minutes_per_session"))?,
        equipment: Equipment::parse(&equipment).ok_or_else(|| {
            AppError::internal(format!("Invalid stored equipment: {equipment}"))
        })?,
        level: TrainingLevel::parse(&level)
            .ok_or_else(|| AppError::internal(format!("Invalid stored level: {level}")))?,
        add_cardio: row.get("add_cardio"),
        add_core: row.get("add_core"),
        add_mobility: row.get("add_mobility"),
        created_at: parse_timestamp(&created_at)?,
        days: Vec::new(),
    })
}

fn row_to_exercise(row: &SqliteRow) -> AppResult<PlanExercise> {
    let seq: i64 = row.get("seq");
    let sets: Option<i64> = row.get("sets");
    let rest_sec: Option<i64> = row.get("rest_sec");

    Ok(PlanExercise {
        seq: to_u32(seq, "seq")?,
        name: row.get("name"),
        sets: sets.map(|s| to_u32(s, "sets")).transpose()?,
        reps_or_time: row.get("reps_or_time"),
        rest_sec: rest_sec.map(|r| to_u32(r, "rest_sec")).transpose()?,
        notes: row.get("notes"),
    })
}

fn row_to_summary(row: &SqliteRow) -> AppResult<PlanSummary> {
    let id: String = row.get("id");
    let goal: String = row.get("goal");
    let created_at: String = row.get("created_at");
    let days_per_week: i64 = row.get("days_per_week");

    Ok(PlanSummary {
        id: parse_uuid(&id)?,
        title: row.get("title"),
        goal: parse_goal(&goal)?,
        days_per_week: u8::try_from(days_per_week)
            .map_err(|_| AppError::internal("Invalid stored days_per_week"))?,
        created_at: parse_timestamp(&created_at)?,
    })
}
