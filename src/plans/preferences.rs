// ABOUTME: Preference validation gate for plan creation
// ABOUTME: Checks every enumerated field against its closed set before any generation runs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;

use pierre_plan_core::limits::{
    ALLOWED_DAYS_PER_WEEK, ALLOWED_SESSION_MINUTES, INTENSITY_MODE_MAX_CHARS,
};
use pierre_plan_core::{Equipment, FitnessGoal, PlanPreferences, TrainingLevel};
use serde_json::{json, Map, Value};

use crate::errors::{AppError, AppResult, ErrorCode};

/// Validates raw client preferences into `PlanPreferences`
///
/// Unknown or missing enumerated values fail the whole call; nothing is
/// coerced at this stage.
pub struct PreferenceValidator;

impl PreferenceValidator {
    /// Validate a raw JSON body
    ///
    /// # Errors
    ///
    /// Returns a field-specific validation error for the first bad field
    pub fn validate(raw: &Value) -> AppResult<PlanPreferences> {
        let body = raw
            .as_object()
            .ok_or_else(|| AppError::invalid_input("Plan preferences must be a JSON object"))?;

        let days_per_week = Self::choice(body, "daysPerWeek", &ALLOWED_DAYS_PER_WEEK)?;
        let minutes_per_session = Self::choice(body, "minutesPerSession", &ALLOWED_SESSION_MINUTES)?;
        let equipment = Self::enumerated(body, "equipment", Equipment::parse)?;
        let level = Self::enumerated(body, "level", TrainingLevel::parse)?;
        let goal = Self::enumerated(body, "goal", FitnessGoal::parse)?;

        Ok(PlanPreferences {
            days_per_week,
            minutes_per_session,
            equipment,
            level,
            goal,
            add_cardio: Self::flag(body, "addCardio")?,
            add_core: Self::flag(body, "addCore")?,
            add_mobility: Self::flag(body, "addMobility")?,
            injuries: Self::string_set(body, "injuries")?,
            restricted_moves: Self::string_set(body, "restrictedMoves")?,
            intensity_mode: Self::intensity_mode(body)?,
        })
    }

    fn missing(field: &str) -> AppError {
        AppError::new(
            ErrorCode::MissingRequiredField,
            format!("{field} is required"),
        )
        .with_details(json!({ "field": field }))
    }

    fn invalid(field: &str, message: String) -> AppError {
        AppError::invalid_input(message).with_details(json!({ "field": field }))
    }

    fn choice<T>(body: &Map<String, Value>, field: &str, allowed: &[T]) -> AppResult<T>
    where
        T: Copy + PartialEq + TryFrom<u64> + ToString,
    {
        let value = body.get(field).ok_or_else(|| Self::missing(field))?;
        let allowed_list = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        value
            .as_u64()
            .and_then(|n| T::try_from(n).ok())
            .filter(|n| allowed.contains(n))
            .ok_or_else(|| {
                Self::invalid(
                    field,
                    format!("{field} must be one of {allowed_list}, got {value}"),
                )
            })
    }

    fn enumerated<T>(
        body: &Map<String, Value>,
        field: &str,
        parse: fn(&str) -> Option<T>,
    ) -> AppResult<T> {
        let value = body.get(field).ok_or_else(|| Self::missing(field))?;
        value
            .as_str()
            .and_then(parse)
            .ok_or_else(|| Self::invalid(field, format!("{field} has unsupported value {value}")))
    }

    fn flag(body: &Map<String, Value>, field: &str) -> AppResult<bool> {
        match body.get(field) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(flag)) => Ok(*flag),
            Some(other) => Err(Self::invalid(
                field,
                format!("{field} must be a boolean, got {other}"),
            )),
        }
    }

    fn string_set(body: &Map<String, Value>, field: &str) -> AppResult<BTreeSet<String>> {
        match body.get(field) {
            None | Some(Value::Null) => Ok(BTreeSet::new()),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) if s.trim().is_empty() => None,
                    Value::String(s) => Some(Ok(s.trim().to_lowercase())),
                    other => Some(Err(Self::invalid(
                        field,
                        format!("{field} entries must be strings, got {other}"),
                    ))),
                })
                .collect(),
            Some(other) => Err(Self::invalid(
                field,
                format!("{field} must be an array of strings, got {other}"),
            )),
        }
    }

    fn intensity_mode(body: &Map<String, Value>) -> AppResult<Option<String>> {
        const FIELD: &str = "intensityMode";
        match body.get(FIELD) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) if s.trim().chars().count() > INTENSITY_MODE_MAX_CHARS => {
                Err(Self::invalid(
                    FIELD,
                    format!("{FIELD} must be at most {INTENSITY_MODE_MAX_CHARS} characters"),
                ))
            }
            Some(Value::String(s)) => Ok(Some(s.trim().to_owned())),
            Some(other) => Err(Self::invalid(
                FIELD,
                format!("{FIELD} must be a string, got {other}"),
            )),
        }
    }
}
