// ABOUTME: Builds the chat messages that ask a model for a structured weekly plan
// ABOUTME: System prompt is static markdown; the user message lists the validated preferences
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;
use std::fmt::Write;

use pierre_plan_core::PlanPreferences;

use crate::llm::ChatMessage;

/// System prompt describing the expected JSON reply
pub const PLAN_SYSTEM_PROMPT: &str = include_str!("prompts/plan_system.md");

/// System and user messages for a plan request
#[must_use]
pub fn build_plan_messages(prefs: &PlanPreferences) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(PLAN_SYSTEM_PROMPT),
        ChatMessage::user(describe_preferences(prefs)),
    ]
}

fn describe_preferences(prefs: &PlanPreferences) -> String {
    let mut text = format!(
        "Create a {days}-day per week plan.\n\
         Goal: {goal}\n\
         Level: {level}\n\
         Session length: {minutes} minutes\n\
         Equipment: {equipment}\n",
        days = prefs.days_per_week,
        goal = prefs.goal.label(),
        level = prefs.level.as_str(),
        minutes = prefs.minutes_per_session,
        equipment = prefs.equipment.as_str(),
    );

    let extras: Vec<&str> = [
        (prefs.add_cardio, "cardio"),
        (prefs.add_core, "core"),
        (prefs.add_mobility, "mobility"),
    ]
    .into_iter()
    .filter_map(|(wanted, name)| wanted.then_some(name))
    .collect();
    if !extras.is_empty() {
        let _ = writeln!(text, "Add to every day: {}", extras.join(", "));
    }

    if let Some(list) = join_set(&prefs.injuries) {
        let _ = writeln!(text, "Injuries: {list}");
    }
    if let Some(list) = join_set(&prefs.restricted_moves) {
        let _ = writeln!(text, "Restricted movements: {list}");
    }
    if let Some(mode) = &prefs.intensity_mode {
        let _ = writeln!(text, "Intensity mode: {mode}");
    }

    text
}

fn join_set(values: &BTreeSet<String>) -> Option<String> {
    (!values.is_empty()).then(|| values.iter().cloned().collect::<Vec<_>>().join(", "))
}
