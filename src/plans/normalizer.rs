// ABOUTME: Reconciles untrusted extracted JSON into canonical plan days
// ABOUTME: Coerces, truncates and renumbers fields, then pads missing days from the rule-based builder
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Plan Normalization
//!
//! Generated output is duck-typed: fields may be missing, renamed, the wrong
//! type or too long. The normalizer never rejects; it keeps what it can use
//! and fills every gap deterministically so the result is always persistable.

use std::collections::BTreeSet;

use pierre_plan_core::limits::{
    truncate_chars, EXERCISE_NAME_MAX_CHARS, FOCUS_MAX_CHARS, MAX_REST_SECONDS, MAX_SETS,
    NOTES_MAX_CHARS, REPS_OR_TIME_MAX_CHARS, SESSION_NOTE_MAX_CHARS, TITLE_MAX_CHARS,
};
use pierre_plan_core::{PlanDay, PlanExercise, PlanPreferences};
use serde_json::{Map, Value};
use tracing::debug;

use super::builder::DeterministicPlanBuilder;

const DAY_LIST_KEYS: &[&str] = &["days", "schedule"];
const DAY_ORDER_KEYS: &[&str] = &["dayOrder", "day_order", "day", "order"];
const DAY_LABEL_KEYS: &[&str] = &["day", "label", "name", "title"];
const FOCUS_KEYS: &[&str] = &["focus", "type", "theme"];
const EXERCISE_LIST_KEYS: &[&str] = &["exercises", "items", "movements"];
const EXERCISE_NAME_KEYS: &[&str] = &["name", "exercise", "title", "movement"];
const SETS_KEYS: &[&str] = &["sets"];
const REPS_KEYS: &[&str] = &["repsOrTime", "reps_or_time", "reps", "duration", "time"];
const REST_KEYS: &[&str] = &["restSec", "rest_sec", "rest", "restSeconds"];
const NOTES_KEYS: &[&str] = &["notes", "note"];

/// Result of reconciling extracted output with preferences
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPlan {
    /// Plan title, from the output when present, otherwise derived from preferences
    pub title: String,
    /// Exactly `daysPerWeek` days ordered `1..=N`
    pub days: Vec<PlanDay>,
    /// How many days came from the rule-based builder
    pub generated_days: usize,
}

/// A usable day parsed from untrusted input, before slot assignment
struct CandidateDay {
    order_hint: Option<u32>,
    focus: Option<String>,
    warmup: Option<String>,
    cooldown: Option<String>,
    exercises: Vec<PlanExercise>,
}

/// Reconciles extracted structure into canonical days
pub struct PlanNormalizer;

impl PlanNormalizer {
    /// Normalize extracted output into exactly `prefs.days_per_week` days
    #[must_use]
    pub fn normalize(extracted: Option<&Value>, prefs: &PlanPreferences) -> Vec<PlanDay> {
        Self::reconcile(extracted, prefs).days
    }

    /// Normalize days and resolve the plan title
    #[must_use]
    pub fn reconcile(extracted: Option<&Value>, prefs: &PlanPreferences) -> NormalizedPlan {
        let title = extracted
            .and_then(Self::extracted_title)
            .unwrap_or_else(|| prefs.default_title());

        let target = usize::from(prefs.days_per_week);
        let candidates: Vec<CandidateDay> = extracted
            .and_then(Self::day_list)
            .map(|days| {
                days.iter()
                    .filter_map(Self::candidate_day)
                    .take(target)
                    .collect()
            })
            .unwrap_or_default();

        if candidates.is_empty() {
            debug!("No usable days in generated output, using rule-based plan");
            return NormalizedPlan {
                title,
                days: DeterministicPlanBuilder::build(prefs),
                generated_days: target,
            };
        }

        let days = Self::place_days(candidates, prefs);
        let generated_days = target.saturating_sub(days.len());
        let days = Self::pad_days(days, prefs);

        NormalizedPlan {
            title,
            days,
            generated_days,
        }
    }

    fn extracted_title(value: &Value) -> Option<String> {
        let object = value.as_object()?;
        let raw = Self::string_field(object, &["title"]).or_else(|| {
            object
                .get("plan")
                .and_then(Value::as_object)
                .and_then(|plan| Self::string_field(plan, &["title"]))
        })?;
        Some(truncate_chars(&raw, TITLE_MAX_CHARS))
    }

    fn day_list(value: &Value) -> Option<&Vec<Value>> {
        let object = value.as_object()?;
        Self::first_array(object, DAY_LIST_KEYS).or_else(|| {
            object
                .get("plan")
                .and_then(Value::as_object)
                .and_then(|plan| Self::first_array(plan, DAY_LIST_KEYS))
        })
    }

    fn candidate_day(value: &Value) -> Option<CandidateDay> {
        let object = value.as_object()?;
        let exercises: Vec<PlanExercise> = Self::first_array(object, EXERCISE_LIST_KEYS)?
            .iter()
            .filter_map(Self::candidate_exercise)
            .zip(1_u32..)
            .map(|(exercise, seq)| PlanExercise { seq, ..exercise })
            .collect();

        if exercises.is_empty() {
            return None;
        }

        Some(CandidateDay {
            order_hint: Self::day_order_hint(object),
            focus: Self::string_field(object, FOCUS_KEYS)
                .map(|focus| truncate_chars(&focus, FOCUS_MAX_CHARS)),
            warmup: Self::string_field(object, &["warmup"])
                .map(|text| truncate_chars(&text, SESSION_NOTE_MAX_CHARS)),
            cooldown: Self::string_field(object, &["cooldown"])
                .map(|text| truncate_chars(&text, SESSION_NOTE_MAX_CHARS)),
            exercises,
        })
    }

    fn candidate_exercise(value: &Value) -> Option<PlanExercise> {
        if let Some(name) = value.as_str() {
            return Self::clean_text(name).map(|name| PlanExercise {
                seq: 0,
                name: truncate_chars(&name, EXERCISE_NAME_MAX_CHARS),
                sets: None,
                reps_or_time: None,
                rest_sec: None,
                notes: None,
            });
        }

        let object = value.as_object()?;
        let name = Self::string_field(object, EXERCISE_NAME_KEYS)?;

        Some(PlanExercise {
            seq: 0,
            name: truncate_chars(&name, EXERCISE_NAME_MAX_CHARS),
            sets: Self::number_field(object, SETS_KEYS)
                .map(f64::round)
                .filter(|sets| *sets > 0.0)
                .map(|sets| (sets as u32).min(MAX_SETS)),
            reps_or_time: Self::text_or_number_field(object, REPS_KEYS)
                .map(|reps| truncate_chars(&reps, REPS_OR_TIME_MAX_CHARS)),
            rest_sec: Self::number_field(object, REST_KEYS)
                .map(f64::round)
                .filter(|rest| *rest >= 0.0)
                .map(|rest| (rest as u32).min(MAX_REST_SECONDS)),
            notes: Self::string_field(object, NOTES_KEYS)
                .map(|notes| truncate_chars(&notes, NOTES_MAX_CHARS)),
        })
    }

    /// Explicit numeric order, else trailing digits of a label such as "Day 2"
    fn day_order_hint(object: &Map<String, Value>) -> Option<u32> {
        let explicit = DAY_ORDER_KEYS
            .iter()
            .filter_map(|key| object.get(*key))
            .find_map(|value| match value {
                Value::Number(n) => n
                    .as_u64()
                    .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
                Value::String(s) => s.trim().parse::<u64>().ok(),
                _ => None,
            });

        explicit
            .or_else(|| {
                DAY_LABEL_KEYS
                    .iter()
                    .filter_map(|key| object.get(*key).and_then(Value::as_str))
                    .find_map(Self::trailing_number)
            })
            .and_then(|order| u32::try_from(order).ok())
    }

    fn trailing_number(label: &str) -> Option<u64> {
        let trimmed = label.trim_end();
        let digits_start = trimmed
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(index, _)| index)?;
        trimmed[digits_start..].parse().ok()
    }

    /// Keep valid unique orders, give everything else the lowest free slot
    fn place_days(candidates: Vec<CandidateDay>, prefs: &PlanPreferences) -> Vec<PlanDay> {
        let target = u32::from(prefs.days_per_week);
        let mut taken = BTreeSet::new();
        let mut assigned: Vec<(Option<u32>, CandidateDay)> = candidates
            .into_iter()
            .map(|candidate| {
                let slot = candidate
                    .order_hint
                    .filter(|order| (1..=target).contains(order) && taken.insert(*order));
                (slot, candidate)
            })
            .collect();

        let mut free = (1..=target).filter(|order| !taken.contains(order));
        let mut slots: Vec<u32> = Vec::with_capacity(assigned.len());
        for (slot, _) in &mut assigned {
            if slot.is_none() {
                *slot = free.next();
            }
            slots.push(slot.unwrap_or(target));
        }

        assigned
            .into_iter()
            .zip(slots)
            .map(|((_, candidate), day_order)| {
                let focus = candidate.focus.unwrap_or_else(|| {
                    DeterministicPlanBuilder::build_day(prefs, day_order).focus
                });
                PlanDay {
                    day_order,
                    focus,
                    warmup: candidate.warmup,
                    cooldown: candidate.cooldown,
                    exercises: candidate.exercises,
                }
            })
            .collect()
    }

    fn pad_days(mut days: Vec<PlanDay>, prefs: &PlanPreferences) -> Vec<PlanDay> {
        let filled: BTreeSet<u32> = days.iter().map(|day| day.day_order).collect();
        days.extend(
            (1..=u32::from(prefs.days_per_week))
                .filter(|order| !filled.contains(order))
                .map(|order| DeterministicPlanBuilder::build_day(prefs, order)),
        );
        days.sort_by_key(|day| day.day_order);
        days
    }

    fn first_array<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Vec<Value>> {
        keys.iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))
    }

    /// First string among `keys` that is non-empty once cleaned
    fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| object.get(*key).and_then(Value::as_str))
            .find_map(Self::clean_text)
    }

    fn text_or_number_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| object.get(*key))
            .find_map(|value| match value {
                Value::String(s) => Self::clean_text(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Control whitespace becomes a space, other control characters are dropped
    ///
    /// `SQLite` measures text up to the first NUL, so a stray control
    /// character could otherwise fail the length checks at insert time.
    fn clean_text(raw: &str) -> Option<String> {
        let cleaned: String = raw
            .chars()
            .filter_map(|c| {
                if !c.is_control() {
                    Some(c)
                } else if c.is_whitespace() {
                    Some(' ')
                } else {
                    None
                }
            })
            .collect();
        let trimmed = cleaned.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }

    /// Finite number from a JSON number or a numeric string like "90s" or "2 min"
    fn number_field(object: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
        keys.iter()
            .filter_map(|key| object.get(*key))
            .find_map(|value| match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => Self::parse_leading_number(s),
                _ => None,
            })
            .filter(|n| n.is_finite())
    }

    fn parse_leading_number(raw: &str) -> Option<f64> {
        let trimmed = raw.trim();
        let end = trimmed
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_digit() || *c == '.' || *c == '-'))
            .map_or(trimmed.len(), |(index, _)| index);
        let number: f64 = trimmed[..end].parse().ok()?;
        let unit = trimmed[end..].trim().to_lowercase();
        if unit.starts_with("min") {
            Some(number * 60.0)
        } else {
            Some(number)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_number() {
        assert_eq!(PlanNormalizer::trailing_number("Day 3"), Some(3));
        assert_eq!(PlanNormalizer::trailing_number("Monday"), None);
        assert_eq!(PlanNormalizer::trailing_number("Week1 Day12 "), Some(12));
    }

    #[test]
    fn test_parse_leading_number_units() {
        assert_eq!(PlanNormalizer::parse_leading_number("90s"), Some(90.0));
        assert_eq!(PlanNormalizer::parse_leading_number("2 min"), Some(120.0));
        assert_eq!(PlanNormalizer::parse_leading_number("3"), Some(3.0));
        assert_eq!(PlanNormalizer::parse_leading_number("lots"), None);
    }

    #[test]
    fn test_clean_text_strips_control_characters() {
        assert_eq!(
            PlanNormalizer::clean_text("\u{0}Push-up\u{7}"),
            Some("Push-up".to_owned())
        );
        assert_eq!(
            PlanNormalizer::clean_text("Easy jog\nthen strides"),
            Some("Easy jog then strides".to_owned())
        );
        assert_eq!(PlanNormalizer::clean_text("\u{0}\u{1} "), None);
    }
}
