// ABOUTME: SQLite connection setup and schema migrations for workout plans
// ABOUTME: Exposes the plan store and the transactional plan writer behind it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Database Management
//!
//! Plans live in three normalized tables: `workout_plans`, `workout_plan_days`
//! and `workout_plan_exercises`. Deleting a plan cascades to its days and
//! their exercises. Length limits are enforced again by `CHECK` constraints so
//! a bad row can never be committed even if a caller skips normalization.

pub mod plan_writer;
mod plans;

pub use plan_writer::PlanWriter;
pub use plans::PlanStore;

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

/// Pool size for file-backed databases
const FILE_POOL_MAX_CONNECTIONS: u32 = 5;

/// Database handle owning the connection pool
#[derive(Clone)]
pub struct PlanDatabase {
    pool: SqlitePool,
}

impl PlanDatabase {
    /// Connect, creating the database file if needed, and run migrations
    ///
    /// In-memory URLs get a single-connection pool so every query sees the
    /// same database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails or a
    /// migration statement fails
    pub async fn new(database_url: &str) -> Result<Self> {
        let in_memory = database_url.contains(":memory:");
        if !in_memory {
            Self::ensure_parent_dir(database_url).await?;
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let max_connections = if in_memory { 1 } else { FILE_POOL_MAX_CONNECTIONS };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to plan database")?;

        let db = Self { pool };
        db.migrate().await?;

        info!(in_memory, "Plan database ready");
        Ok(db)
    }

    /// Wrap an existing pool without running migrations
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Plan store sharing this pool
    #[must_use]
    pub fn plan_store(&self) -> PlanStore {
        PlanStore::new(self.pool.clone())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any `CREATE` statement fails
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_plans().await?;
        Ok(())
    }

    async fn migrate_plans(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_plans (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 120),
                goal TEXT NOT NULL,
                days_per_week INTEGER NOT NULL CHECK (days_per_week BETWEEN 1 AND 7),
                minutes_per_session INTEGER NOT NULL,
                equipment TEXT NOT NULL,
                level TEXT NOT NULL,
                add_cardio BOOLEAN NOT NULL DEFAULT false,
                add_core BOOLEAN NOT NULL DEFAULT false,
                add_mobility BOOLEAN NOT NULL DEFAULT false,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_workout_plans_owner ON workout_plans(owner_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_plan_days (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                plan_id TEXT NOT NULL REFERENCES workout_plans(id) ON DELETE CASCADE,
                day_order INTEGER NOT NULL CHECK (day_order >= 1),
                focus TEXT NOT NULL CHECK (length(focus) <= 64),
                warmup TEXT CHECK (warmup IS NULL OR length(warmup) <= 255),
                cooldown TEXT CHECK (cooldown IS NULL OR length(cooldown) <= 255),
                UNIQUE (plan_id, day_order)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS workout_plan_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                day_id INTEGER NOT NULL REFERENCES workout_plan_days(id) ON DELETE CASCADE,
                seq INTEGER NOT NULL CHECK (seq >= 1),
                name TEXT NOT NULL CHECK (length(name) BETWEEN 1 AND 100),
                sets INTEGER,
                reps_or_time TEXT CHECK (reps_or_time IS NULL OR length(reps_or_time) <= 32),
                rest_sec INTEGER,
                notes TEXT CHECK (notes IS NULL OR length(notes) <= 255),
                UNIQUE (day_id, seq)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Create the directory holding a file-backed database
    async fn ensure_parent_dir(database_url: &str) -> Result<()> {
        let path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let path = path.split('?').next().unwrap_or(path);
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
            }
        }
        Ok(())
    }
}
