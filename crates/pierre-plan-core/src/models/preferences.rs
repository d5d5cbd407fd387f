// ABOUTME: Plan preference model with closed enumerations for equipment, level and goal
// ABOUTME: Values are strictly parsed; unknown strings are never coerced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Equipment available to the athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    /// Bodyweight only
    None,
    /// Dumbbells, kettlebell, bands
    Minimal,
    /// Full gym with barbells and machines
    Full,
}

impl Equipment {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }

    /// Parse from the wire representation, rejecting unknown values
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "minimal" => Some(Self::Minimal),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Training experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingLevel {
    /// New to structured training
    Beginner,
    /// Consistent training for months
    Intermediate,
    /// Years of structured training
    Advanced,
}

impl TrainingLevel {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse from the wire representation, rejecting unknown values
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

/// Primary goal of the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    /// Fat loss
    LoseWeight,
    /// Hypertrophy
    BuildMuscle,
    /// Keep current shape
    MaintainShape,
    /// Balanced general fitness
    GeneralFitness,
}

impl FitnessGoal {
    /// Convert to database string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LoseWeight => "lose_weight",
            Self::BuildMuscle => "build_muscle",
            Self::MaintainShape => "maintain_shape",
            Self::GeneralFitness => "general_fitness",
        }
    }

    /// Parse from the wire representation, rejecting unknown values
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lose_weight" => Some(Self::LoseWeight),
            "build_muscle" => Some(Self::BuildMuscle),
            "maintain_shape" => Some(Self::MaintainShape),
            "general_fitness" => Some(Self::GeneralFitness),
            _ => None,
        }
    }

    /// Human readable label used in generated titles
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::LoseWeight => "Fat Loss",
            Self::BuildMuscle => "Muscle Building",
            Self::MaintainShape => "Maintenance",
            Self::GeneralFitness => "General Fitness",
        }
    }
}

/// Validated preferences driving plan generation
///
/// Only constructed by the preference validator, so every field holds one of
/// its allowed values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreferences {
    /// Training days per week (3, 4 or 5)
    pub days_per_week: u8,
    /// Session length in minutes (30, 45 or 60)
    pub minutes_per_session: u16,
    /// Available equipment tier
    pub equipment: Equipment,
    /// Experience level
    pub level: TrainingLevel,
    /// Primary goal
    pub goal: FitnessGoal,
    /// Append a cardio finisher to each day
    pub add_cardio: bool,
    /// Append a core movement to each day
    pub add_core: bool,
    /// Append a mobility drill to each day
    pub add_mobility: bool,
    /// Injured areas to train around (e.g. "knee")
    #[serde(default)]
    pub injuries: BTreeSet<String>,
    /// Movement names or roles to leave out
    #[serde(default)]
    pub restricted_moves: BTreeSet<String>,
    /// Free-form intensity hint passed to the generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity_mode: Option<String>,
}

impl PlanPreferences {
    /// Title used when the generator does not supply one
    #[must_use]
    pub fn default_title(&self) -> String {
        format!("{}-Day {} Plan", self.days_per_week, self.goal.label())
    }
}
