// ABOUTME: Storage limits and allowed values for training plan fields
// ABOUTME: Shared by validation, normalization and the relational schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Allowed training days per week
pub const ALLOWED_DAYS_PER_WEEK: [u8; 3] = [3, 4, 5];

/// Allowed session lengths in minutes
pub const ALLOWED_SESSION_MINUTES: [u16; 3] = [30, 45, 60];

/// Maximum plan title length
pub const TITLE_MAX_CHARS: usize = 120;

/// Maximum day focus length
pub const FOCUS_MAX_CHARS: usize = 64;

/// Maximum warmup / cooldown description length
pub const SESSION_NOTE_MAX_CHARS: usize = 255;

/// Maximum exercise name length
pub const EXERCISE_NAME_MAX_CHARS: usize = 100;

/// Maximum reps-or-time prescription length
pub const REPS_OR_TIME_MAX_CHARS: usize = 32;

/// Maximum exercise notes length
pub const NOTES_MAX_CHARS: usize = 255;

/// Maximum intensity mode label length accepted from clients
pub const INTENSITY_MODE_MAX_CHARS: usize = 64;

/// Upper bound applied to coerced set counts
pub const MAX_SETS: u32 = 20;

/// Upper bound applied to coerced rest periods (seconds)
pub const MAX_REST_SECONDS: u32 = 3600;

/// Truncate a string to at most `max_chars` characters on a char boundary
#[must_use]
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((byte_index, _)) => value[..byte_index].to_owned(),
        None => value.to_owned(),
    }
}
