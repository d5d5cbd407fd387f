// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory databases, preference fixtures and a scripted completion transport
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `pierre_plan_server`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use pierre_plan_core::PlanPreferences;
use pierre_plan_server::{
    config::{FailurePolicy, ModelCandidate},
    database::PlanDatabase,
    llm::{
        CallError, ChainSettings, CompletionTransport, FinishReason, GenerationProvider,
        GenerationRequest, RawCompletion, RetryPolicy,
    },
    plans::PreferenceValidator,
};
use serde_json::{json, Value};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> PlanDatabase {
    init_test_logging();
    PlanDatabase::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory plan database")
}

/// Preference body used by the end-to-end scenarios
pub fn scenario_preferences_json() -> Value {
    json!({
        "daysPerWeek": 3,
        "minutesPerSession": 45,
        "equipment": "minimal",
        "level": "beginner",
        "goal": "general_fitness",
        "addCardio": true,
        "addCore": true,
        "addMobility": true
    })
}

/// Minimal valid preference body
pub fn preferences_json(days: u8, goal: &str) -> Value {
    json!({
        "daysPerWeek": days,
        "minutesPerSession": 60,
        "equipment": "full",
        "level": "intermediate",
        "goal": goal
    })
}

/// Validated preferences from a JSON body
pub fn preferences(body: &Value) -> PlanPreferences {
    PreferenceValidator::validate(body).expect("fixture preferences should validate")
}

/// Completion with the given text and finish reason
pub fn completion(text: &str, finish_reason: FinishReason) -> RawCompletion {
    RawCompletion {
        text: text.to_owned(),
        finish_reason,
        block_reason: None,
        model: "scripted-model".to_owned(),
    }
}

/// Blocked completion with no text
pub fn blocked_completion(reason: &str) -> RawCompletion {
    RawCompletion {
        text: String::new(),
        finish_reason: FinishReason::Blocked,
        block_reason: Some(reason.to_owned()),
        model: "scripted-model".to_owned(),
    }
}

/// One recorded transport call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub base_url: String,
    pub request: GenerationRequest,
}

/// Transport replaying a fixed script of outcomes and recording every call
///
/// Once the script runs out every further call fails fatally.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawCompletion, CallError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<RawCompletion, CallError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn models_called(&self) -> Vec<String> {
        self.calls().into_iter().map(|call| call.model).collect()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(
        &self,
        target: &ModelCandidate,
        request: &GenerationRequest,
    ) -> Result<RawCompletion, CallError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: target.model.clone(),
            base_url: target.base_url.clone(),
            request: request.clone(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CallError::Fatal("script exhausted".to_owned())))
    }
}

/// Chain settings with zero backoff
pub fn chain_settings(
    max_attempts: u32,
    continuation_rounds: u32,
    failure_policy: FailurePolicy,
) -> ChainSettings {
    ChainSettings {
        retry: RetryPolicy::immediate(max_attempts, Duration::from_secs(5)),
        continuation_rounds,
        failure_policy,
    }
}

/// Single-model provider over a scripted transport
pub fn single_provider(
    transport: Arc<ScriptedTransport>,
    settings: ChainSettings,
) -> GenerationProvider {
    GenerationProvider::single(
        transport,
        ModelCandidate::new("http://scripted.local/v1", "scripted-model"),
        settings,
    )
}

/// Test request with one user message
pub fn test_request() -> GenerationRequest {
    GenerationRequest::new(vec![pierre_plan_server::llm::ChatMessage::user(
        "Create a plan",
    )])
}
