// ABOUTME: Tests for extracting structured JSON from free-form model replies
// ABOUTME: Covers fenced blocks, bare objects, arrays and arbitrary junk input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use pierre_plan_server::plans::ResponseExtractor;
use serde_json::json;

#[test]
fn test_scenario_reply_with_prose_and_fence() {
    let text = "Here is your plan:\n```json\n{\"days\":[{\"dayOrder\":1,\"focus\":\"Upper\",\"exercises\":[{\"name\":\"Push-up\"}]}]}\n```";
    let value = ResponseExtractor::extract(text).unwrap();
    assert_eq!(value["days"][0]["focus"], "Upper");
    assert_eq!(value["days"][0]["exercises"][0]["name"], "Push-up");
}

#[test]
fn test_untagged_fence() {
    let text = "```\n{\"title\": \"Plan\"}\n```";
    assert_eq!(ResponseExtractor::extract(text), Some(json!({"title": "Plan"})));
}

#[test]
fn test_bare_object_in_prose() {
    let text = "Sure! {\"title\": \"Strength\", \"days\": []} Let me know if you need changes.";
    assert_eq!(
        ResponseExtractor::extract(text),
        Some(json!({"title": "Strength", "days": []}))
    );
}

#[test]
fn test_broken_fence_falls_back_to_balanced_braces() {
    let text = "```json\nnot json at all\n```\nActually: {\"title\": \"Recovered\"}";
    assert_eq!(
        ResponseExtractor::extract(text),
        Some(json!({"title": "Recovered"}))
    );
}

#[test]
fn test_fence_with_trailing_prose_inside() {
    let text = "```json\n{\"title\": \"Inner\"}\nHope this helps\n```";
    assert_eq!(ResponseExtractor::extract(text), Some(json!({"title": "Inner"})));
}

#[test]
fn test_bare_array_is_wrapped_as_days() {
    let text = "```json\n[{\"dayOrder\": 1, \"exercises\": [\"Plank\"]}]\n```";
    let value = ResponseExtractor::extract(text).unwrap();
    assert_eq!(value["days"][0]["dayOrder"], 1);
}

#[test]
fn test_skips_unbalanced_prefix() {
    let text = "Use { as a separator. {\"title\": \"Second\"}";
    assert_eq!(ResponseExtractor::extract(text), Some(json!({"title": "Second"})));
}

#[test]
fn test_no_structure_returns_none() {
    for text in [
        "",
        "   ",
        "Day 1: squats and lunges",
        "```",
        "```json\n```",
        "{{{{",
        "}}}} {",
        "{\"unterminated\": \"value",
        "42",
        "\"just a string\"",
        "日本語のテキスト {",
    ] {
        assert_eq!(ResponseExtractor::extract(text), None, "input {text:?}");
    }
}

#[test]
fn test_never_panics_on_multibyte_text() {
    let text = "Plan ✓ → {\"title\": \"Café ✓\"} ✓";
    assert_eq!(
        ResponseExtractor::extract(text),
        Some(json!({"title": "Café ✓"}))
    );
}

#[test]
fn test_many_unparseable_braces_before_the_object() {
    let text = format!("{}{{\"days\":[]}}", "{x} ".repeat(200));
    assert_eq!(ResponseExtractor::extract(&text), Some(json!({"days": []})));
}
