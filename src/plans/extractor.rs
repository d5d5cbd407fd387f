// ABOUTME: Extracts a structured JSON object from free-form generated text
// ABOUTME: Tries fenced blocks first, then balanced brace matching; never fails
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde_json::{json, Value};
use tracing::debug;

/// `{` positions past this byte offset are not tried as object starts
const MAX_START_OFFSET: usize = 256 * 1024;

/// Locates and parses the structured part of a model reply
pub struct ResponseExtractor;

impl ResponseExtractor {
    /// Extract a JSON object from `text`
    ///
    /// Returns `None` when nothing parseable is found. A bare top-level array
    /// is treated as a day list and wrapped as `{"days": [...]}`.
    #[must_use]
    pub fn extract(text: &str) -> Option<Value> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(interior) = Self::fenced_interior(trimmed) {
            if let Some(value) = Self::parse_candidate(interior) {
                return Some(value);
            }
            if let Some(value) = Self::first_balanced_object(interior) {
                return Some(value);
            }
        }

        Self::first_balanced_object(trimmed)
    }

    /// Interior of the first triple-backtick fence, minus an optional tag line
    fn fenced_interior(text: &str) -> Option<&str> {
        let start = text.find("```")?;
        let after_fence = &text[start + 3..];
        let end = after_fence.find("```")?;
        let block = &after_fence[..end];

        // Drop a language tag such as "json" on the opening line
        let block = match block.find('\n') {
            Some(newline) => {
                let first_line = block[..newline].trim();
                if first_line.is_empty()
                    || first_line.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    &block[newline + 1..]
                } else {
                    block
                }
            }
            None => block.trim_start_matches("json"),
        };

        let block = block.trim();
        (!block.is_empty()).then_some(block)
    }

    fn parse_candidate(candidate: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => Some(Value::Object(map)),
            Ok(Value::Array(days)) => Some(json!({ "days": days })),
            Ok(_) => None,
            Err(e) => {
                debug!(error = %e, "Candidate JSON block did not parse");
                None
            }
        }
    }

    /// Scan `{` positions left to right and return the first balanced block that parses
    fn first_balanced_object(text: &str) -> Option<Value> {
        text.char_indices()
            .take_while(|(start, _)| *start < MAX_START_OFFSET)
            .filter(|(_, c)| *c == '{')
            .find_map(|(start, _)| {
                Self::balanced_end(&text[start..])
                    .and_then(|end| Self::parse_candidate(&text[start..start + end]))
            })
    }

    /// Byte length of the balanced `{...}` prefix of `text`, string-literal aware
    fn balanced_end(text: &str) -> Option<usize> {
        let mut depth = 0_usize;
        let mut in_string = false;
        let mut escaped = false;

        for (index, c) in text.char_indices() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    '\\' => escaped = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                '"' => in_string = true,
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(index + c.len_utf8());
                    }
                }
                _ => {}
            }
        }
        None
    }
}
