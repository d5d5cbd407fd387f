// ABOUTME: Core domain types for the Pierre training plan generator
// ABOUTME: Preference vocabulary, canonical plan structures and storage limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Pierre Plan Core
//!
//! Foundation crate for training plan generation. It holds the types every
//! other layer agrees on and performs no I/O:
//!
//! - **models**: `PlanPreferences` and its closed enumerations, plus the
//!   canonical `Plan` / `PlanDay` / `PlanExercise` structures
//! - **limits**: storage length limits and allowed numeric choices

/// Storage length limits and allowed preference values
pub mod limits;

/// Preference and canonical plan models
pub mod models;

pub use models::{
    Equipment, FitnessGoal, Plan, PlanDay, PlanExercise, PlanPreferences, PlanSummary,
    TrainingLevel,
};
