// ABOUTME: Training plan domain models
// ABOUTME: Re-exports preference and canonical plan types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

mod plan;
mod preferences;

pub use plan::{Plan, PlanDay, PlanExercise, PlanSummary};
pub use preferences::{Equipment, FitnessGoal, PlanPreferences, TrainingLevel};
