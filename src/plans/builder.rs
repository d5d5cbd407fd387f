// ABOUTME: Deterministic rule-based plan builder used as fallback and gap-filler
// ABOUTME: Table-driven day skeletons, movement variants per equipment tier and level prescriptions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Deterministic Plan Builder
//!
//! Pure function from preferences to days. No I/O, never fails, and the same
//! preferences always produce the same plan.
//!
//! - Day skeletons are keyed by `(daysPerWeek, goal)`
//! - Each focus maps to an ordered list of movement roles
//! - Each role resolves to a bodyweight, dumbbell or barbell variant
//! - `level` decides sets and rest; rep ranges are fixed per role
//! - Session length caps the number of main movements

use pierre_plan_core::{Equipment, FitnessGoal, PlanDay, PlanExercise, PlanPreferences, TrainingLevel};

/// Warmup attached to every rule-based day
pub const STANDARD_WARMUP: &str =
    "5 min easy cardio, then dynamic mobility for hips, shoulders and ankles";

/// Cooldown attached to every rule-based day
pub const STANDARD_COOLDOWN: &str = "5 min easy walk, then static stretches for the muscles trained";

/// Movement pattern an exercise slot trains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementRole {
    /// Knee-dominant bilateral
    Squat,
    /// Hip-dominant
    Hinge,
    /// Single-leg
    Lunge,
    /// Horizontal press
    HorizontalPush,
    /// Overhead press
    VerticalPush,
    /// Row
    HorizontalPull,
    /// Pulldown / pull-up pattern
    VerticalPull,
    /// Trunk stability
    Core,
    /// Steady or interval cardio
    Cardio,
    /// Mobility drill
    Mobility,
    /// Metabolic conditioning
    Conditioning,
}

impl MovementRole {
    /// Role label used for matching restricted moves
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Squat => "squat",
            Self::Hinge => "hinge",
            Self::Lunge => "lunge",
            Self::HorizontalPush => "push",
            Self::VerticalPush => "overhead_push",
            Self::HorizontalPull => "pull",
            Self::VerticalPull => "vertical_pull",
            Self::Core => "core",
            Self::Cardio => "cardio",
            Self::Mobility => "mobility",
            Self::Conditioning => "conditioning",
        }
    }

    /// Exercise variant for an equipment tier
    #[must_use]
    pub const fn exercise_name(&self, equipment: Equipment) -> &'static str {
        let [none, minimal, full] = match self {
            Self::Squat => ["Bodyweight Squat", "Goblet Squat", "Barbell Back Squat"],
            Self::Hinge => [
                "Glute Bridge",
                "Dumbbell Romanian Deadlift",
                "Barbell Romanian Deadlift",
            ],
            Self::Lunge => ["Reverse Lunge", "Dumbbell Split Squat", "Barbell Walking Lunge"],
            Self::HorizontalPush => ["Push-up", "Dumbbell Floor Press", "Barbell Bench Press"],
            Self::VerticalPush => [
                "Pike Push-up",
                "Dumbbell Overhead Press",
                "Barbell Overhead Press",
            ],
            Self::HorizontalPull => ["Inverted Row", "One-Arm Dumbbell Row", "Barbell Row"],
            Self::VerticalPull => ["Superman Pull", "Resistance Band Pulldown", "Lat Pulldown"],
            Self::Core => ["Dead Bug", "Dumbbell Dead Bug", "Cable Crunch"],
            Self::Cardio => ["Jumping Jacks", "Jump Rope", "Rowing Machine Intervals"],
            Self::Mobility => [
                "Hip Flexor Stretch",
                "Band Shoulder Dislocates",
                "Foam Roll Thoracic Spine",
            ],
            Self::Conditioning => ["Burpees", "Kettlebell Swing", "Assault Bike Sprint"],
        };
        match equipment {
            Equipment::None => none,
            Equipment::Minimal => minimal,
            Equipment::Full => full,
        }
    }

    /// Fixed rep range or duration for the role
    #[must_use]
    pub const fn reps_or_time(&self) -> &'static str {
        match self {
            Self::Squat | Self::Hinge | Self::HorizontalPush | Self::HorizontalPull => "8-12",
            Self::Lunge => "10-12/side",
            Self::VerticalPush => "8-10",
            Self::VerticalPull => "10-12",
            Self::Core => "12-15",
            Self::Cardio => "10 min",
            Self::Mobility => "60s",
            Self::Conditioning => "30s",
        }
    }
}

/// Focus name with its ordered movement roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTemplate {
    /// Day focus label
    pub focus: &'static str,
    /// Main movement roles in priority order
    pub roles: &'static [MovementRole],
}

use MovementRole::{
    Cardio, Conditioning, Core, HorizontalPull, HorizontalPush, Hinge, Lunge, Squat, VerticalPull,
    VerticalPush,
};

const FULL_BODY: DayTemplate = DayTemplate {
    focus: "Full-Body",
    roles: &[Squat, HorizontalPush, HorizontalPull, Hinge, VerticalPush],
};
const UPPER: DayTemplate = DayTemplate {
    focus: "Upper",
    roles: &[HorizontalPush, HorizontalPull, VerticalPush, VerticalPull],
};
const LOWER: DayTemplate = DayTemplate {
    focus: "Lower",
    roles: &[Squat, Hinge, Lunge],
};
const LEGS: DayTemplate = DayTemplate {
    focus: "Legs",
    roles: &[Squat, Hinge, Lunge],
};
const PUSH: DayTemplate = DayTemplate {
    focus: "Push",
    roles: &[HorizontalPush, VerticalPush],
};
const PULL: DayTemplate = DayTemplate {
    focus: "Pull",
    roles: &[HorizontalPull, VerticalPull],
};
const PUSH_CORE: DayTemplate = DayTemplate {
    focus: "Push+Core",
    roles: &[HorizontalPush, VerticalPush, Core],
};
const PULL_CARDIO: DayTemplate = DayTemplate {
    focus: "Pull+Cardio",
    roles: &[HorizontalPull, VerticalPull, Cardio],
};
const CONDITIONING: DayTemplate = DayTemplate {
    focus: "Conditioning",
    roles: &[Conditioning, Lunge],
};

/// Sets and rest derived from training level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prescription {
    /// Working sets
    pub sets: u32,
    /// Rest between sets in seconds
    pub rest_sec: u32,
}

impl Prescription {
    /// Prescription for a level
    #[must_use]
    pub const fn for_level(level: TrainingLevel) -> Self {
        match level {
            TrainingLevel::Beginner => Self {
                sets: 3,
                rest_sec: 60,
            },
            TrainingLevel::Intermediate => Self {
                sets: 3,
                rest_sec: 75,
            },
            TrainingLevel::Advanced => Self {
                sets: 4,
                rest_sec: 90,
            },
        }
    }
}

/// Rule-based plan builder
pub struct DeterministicPlanBuilder;

impl DeterministicPlanBuilder {
    /// Day skeleton for the preferences, one template per training day
    #[must_use]
    pub fn skeleton(prefs: &PlanPreferences) -> Vec<DayTemplate> {
        let build_muscle = prefs.goal == FitnessGoal::BuildMuscle;
        match (prefs.days_per_week, build_muscle) {
            (4, true) => vec![UPPER, LOWER, UPPER, LOWER],
            (4, false) => vec![FULL_BODY, PUSH_CORE, PULL_CARDIO, LEGS],
            (5, true) => vec![PUSH, PULL, LEGS, UPPER, LOWER],
            (5, false) => vec![FULL_BODY, PUSH, PULL, LEGS, CONDITIONING],
            (days, _) => vec![FULL_BODY; usize::from(days.max(1))],
        }
    }

    /// Build every day of the week
    #[must_use]
    pub fn build(prefs: &PlanPreferences) -> Vec<PlanDay> {
        Self::skeleton(prefs)
            .iter()
            .zip(1_u32..)
            .map(|(template, day_order)| Self::assemble_day(prefs, template, day_order))
            .collect()
    }

    /// Build the single day occupying `day_order` (1-based)
    #[must_use]
    pub fn build_day(prefs: &PlanPreferences, day_order: u32) -> PlanDay {
        let skeleton = Self::skeleton(prefs);
        let index = usize::try_from(day_order.saturating_sub(1)).unwrap_or(usize::MAX);
        let template = skeleton.get(index).copied().unwrap_or(FULL_BODY);
        Self::assemble_day(prefs, &template, day_order)
    }

    /// Maximum number of main movements for a session length
    #[must_use]
    pub const fn main_movement_cap(minutes_per_session: u16) -> usize {
        match minutes_per_session {
            0..=30 => 3,
            31..=45 => 4,
            _ => 5,
        }
    }

    fn assemble_day(prefs: &PlanPreferences, template: &DayTemplate, day_order: u32) -> PlanDay {
        let mut roles: Vec<MovementRole> = template
            .roles
            .iter()
            .copied()
            .take(Self::main_movement_cap(prefs.minutes_per_session))
            .collect();

        let extras = [
            (prefs.add_core, Core),
            (prefs.add_cardio, Cardio),
            (prefs.add_mobility, MovementRole::Mobility),
        ];
        for (wanted, role) in extras {
            if wanted && !roles.contains(&role) {
                roles.push(role);
            }
        }

        let mut names: Vec<(MovementRole, &'static str)> = roles
            .into_iter()
            .map(|role| (role, role.exercise_name(prefs.equipment)))
            .filter(|(role, name)| Self::is_allowed(prefs, *role, name))
            .collect();

        if names.is_empty() {
            names.push((
                MovementRole::Mobility,
                MovementRole::Mobility.exercise_name(prefs.equipment),
            ));
        }

        let exercises = names
            .into_iter()
            .zip(1_u32..)
            .map(|((role, name), seq)| Self::prescribe(prefs, role, name, seq))
            .collect();

        PlanDay {
            day_order,
            focus: template.focus.to_owned(),
            warmup: Some(STANDARD_WARMUP.to_owned()),
            cooldown: Some(STANDARD_COOLDOWN.to_owned()),
            exercises,
        }
    }

    fn prescribe(
        prefs: &PlanPreferences,
        role: MovementRole,
        name: &str,
        seq: u32,
    ) -> PlanExercise {
        let level = Prescription::for_level(prefs.level);
        let (sets, rest_sec) = match role {
            Cardio | MovementRole::Mobility => (1, None),
            _ => (level.sets, Some(level.rest_sec)),
        };
        PlanExercise {
            seq,
            name: name.to_owned(),
            sets: Some(sets),
            reps_or_time: Some(role.reps_or_time().to_owned()),
            rest_sec,
            notes: None,
        }
    }

    /// Restricted moves match role labels or names; injuries exclude stressful roles
    fn is_allowed(prefs: &PlanPreferences, role: MovementRole, name: &str) -> bool {
        let name_lower = name.to_lowercase();
        let restricted = prefs.restricted_moves.iter().any(|moved| {
            let moved = moved.to_lowercase();
            !moved.is_empty() && (role.label() == moved || name_lower.contains(&moved))
        });
        let injured = prefs.injuries.iter().any(|injury| {
            let injury = injury.to_lowercase();
            Self::roles_stressing(&injury).contains(&role)
        });
        !restricted && !injured
    }

    fn roles_stressing(injury: &str) -> &'static [MovementRole] {
        if injury.contains("knee") {
            &[Lunge, Conditioning]
        } else if injury.contains("shoulder") {
            &[VerticalPush]
        } else if injury.contains("back") {
            &[Hinge]
        } else {
            &[]
        }
    }
}
