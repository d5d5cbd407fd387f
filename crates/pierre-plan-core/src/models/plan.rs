// ABOUTME: Canonical training plan structures (plan, day, exercise)
// ABOUTME: Schema-conformant shape returned to clients and written to storage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Equipment, FitnessGoal, TrainingLevel};

/// One prescribed movement within a training day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanExercise {
    /// Position within the day, dense from 1
    pub seq: u32,
    /// Exercise name, never empty
    pub name: String,
    /// Working sets
    pub sets: Option<u32>,
    /// Rep range ("8-12") or duration ("45s")
    pub reps_or_time: Option<String>,
    /// Rest between sets in seconds
    pub rest_sec: Option<u32>,
    /// Coaching notes
    pub notes: Option<String>,
}

/// One training day of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    /// Position within the week, contiguous from 1
    pub day_order: u32,
    /// Day focus such as "Upper" or "Full-Body"
    pub focus: String,
    /// Warmup description
    pub warmup: Option<String>,
    /// Cooldown description
    pub cooldown: Option<String>,
    /// Exercises ordered by `seq`
    pub exercises: Vec<PlanExercise>,
}

/// A persisted training plan owned by a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Plan identifier
    pub id: Uuid,
    /// Owning user
    pub owner_id: Uuid,
    /// Display title
    pub title: String,
    /// Goal the plan was generated for
    pub goal: FitnessGoal,
    /// Training days per week
    pub days_per_week: u8,
    /// Session length in minutes
    pub minutes_per_session: u16,
    /// Equipment tier
    pub equipment: Equipment,
    /// Experience level
    pub level: TrainingLevel,
    /// Cardio extras requested
    pub add_cardio: bool,
    /// Core extras requested
    pub add_core: bool,
    /// Mobility extras requested
    pub add_mobility: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Days ordered by `day_order`
    pub days: Vec<PlanDay>,
}

/// Lightweight listing entry for a user's plans
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    /// Plan identifier
    pub id: Uuid,
    /// Display title
    pub title: String,
    /// Goal the plan was generated for
    pub goal: FitnessGoal,
    /// Training days per week
    pub days_per_week: u8,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}
