// ABOUTME: Tests for the generation provider chain over a scripted transport
// ABOUTME: Covers retries, candidate fallback, blocked replies, continuation and exhaustion policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{
    blocked_completion, chain_settings, completion, single_provider, test_request,
    ScriptedTransport,
};
use pierre_plan_server::config::{FailurePolicy, ModelCandidate};
use pierre_plan_server::errors::ErrorCode;
use pierre_plan_server::llm::{
    CallError, ChainSettings, CompletionTransport, FinishReason, GenerationProvider,
    GenerationRequest, MessageRole, ProviderKind, RawCompletion, RetryPolicy, CANNED_PLAN_TEXT,
    CONTINUE_INSTRUCTION,
};

fn multi_candidates() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new("http://scripted.local/v1beta", "model-a"),
        ModelCandidate::new("http://scripted.local/v1beta", "model-b"),
        ModelCandidate::new("http://scripted.local/v1", "model-a"),
    ]
}

fn retriable() -> Result<RawCompletion, CallError> {
    Err(CallError::Retriable("503 upstream".to_owned()))
}

#[tokio::test]
async fn test_retriable_failures_are_retried_until_success() {
    let transport = ScriptedTransport::new(vec![
        retriable(),
        retriable(),
        Ok(completion("{\"days\": []}", FinishReason::Complete)),
    ]);
    let provider = single_provider(
        transport.clone(),
        chain_settings(3, 0, FailurePolicy::FailClosed),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.text, "{\"days\": []}");
    assert_eq!(generation.meta.provider_kind, ProviderKind::SingleModel);
    assert_eq!(generation.meta.finish_reason, FinishReason::Complete);
    assert!(!generation.meta.fallback_used);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_retry_ceiling_then_fail_closed() {
    let transport = ScriptedTransport::new(vec![retriable(), retriable(), retriable(), retriable()]);
    let provider = single_provider(
        transport.clone(),
        chain_settings(3, 0, FailurePolicy::FailClosed),
    );

    let err = provider.generate(&test_request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ProviderExhausted);
    assert_eq!(err.http_status(), 503);
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test]
async fn test_fatal_failure_is_not_retried() {
    let transport = ScriptedTransport::new(vec![
        Err(CallError::Fatal("400 bad request".to_owned())),
        Ok(completion("never reached", FinishReason::Complete)),
    ]);
    let provider = single_provider(
        transport.clone(),
        chain_settings(3, 0, FailurePolicy::FailClosed),
    );

    let err = provider.generate(&test_request()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ProviderExhausted);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_exhaustion_fails_open_to_canned_text() {
    let transport = ScriptedTransport::new(vec![retriable(), retriable()]);
    let provider = single_provider(
        transport.clone(),
        chain_settings(2, 0, FailurePolicy::FailOpen),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.text, CANNED_PLAN_TEXT);
    assert_eq!(generation.meta.provider_kind, ProviderKind::Canned);
    assert!(generation.meta.fallback_used);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_not_found_moves_to_next_candidate_immediately() {
    let transport = ScriptedTransport::new(vec![
        Err(CallError::NotFound("404 model-a".to_owned())),
        Ok(completion("from model-b", FinishReason::Complete)),
    ]);
    let provider = GenerationProvider::multi(
        transport.clone(),
        multi_candidates(),
        chain_settings(3, 0, FailurePolicy::FailClosed),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.text, "from model-b");
    assert_eq!(generation.meta.provider_kind, ProviderKind::MultiModel);
    assert_eq!(transport.models_called(), vec!["model-a", "model-b"]);
}

#[tokio::test]
async fn test_multi_walks_candidates_in_order() {
    let transport = ScriptedTransport::new(vec![
        retriable(),
        retriable(),
        Err(CallError::Fatal("unparsable body".to_owned())),
        Ok(completion("third time lucky", FinishReason::Complete)),
    ]);
    let provider = GenerationProvider::multi(
        transport.clone(),
        multi_candidates(),
        chain_settings(2, 0, FailurePolicy::FailClosed),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.text, "third time lucky");

    let calls = transport.calls();
    let targets: Vec<(&str, &str)> = calls
        .iter()
        .map(|call| (call.model.as_str(), call.base_url.as_str()))
        .collect();
    assert_eq!(
        targets,
        vec![
            ("model-a", "http://scripted.local/v1beta"),
            ("model-a", "http://scripted.local/v1beta"),
            ("model-b", "http://scripted.local/v1beta"),
            ("model-a", "http://scripted.local/v1"),
        ]
    );
}

#[tokio::test]
async fn test_empty_reply_tries_next_candidate() {
    let transport = ScriptedTransport::new(vec![
        Ok(completion("   ", FinishReason::Complete)),
        Ok(completion("real text", FinishReason::Complete)),
    ]);
    let provider = GenerationProvider::multi(
        transport.clone(),
        multi_candidates(),
        chain_settings(3, 0, FailurePolicy::FailClosed),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.text, "real text");
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_blocked_reply_is_terminal() {
    let transport = ScriptedTransport::new(vec![
        Ok(blocked_completion("SAFETY")),
        Ok(completion("should not be used", FinishReason::Complete)),
    ]);
    let provider = GenerationProvider::multi(
        transport.clone(),
        multi_candidates(),
        chain_settings(3, 2, FailurePolicy::FailOpen),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.meta.finish_reason, FinishReason::Blocked);
    assert_eq!(generation.meta.block_reason.as_deref(), Some("SAFETY"));
    assert!(!generation.meta.fallback_used);
    assert!(!generation.is_usable());
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn test_truncated_reply_is_continued_and_accumulated() {
    let transport = ScriptedTransport::new(vec![
        Ok(completion("Day 1: ...", FinishReason::Truncated)),
        Ok(completion(" squats, lunges", FinishReason::Complete)),
    ]);
    let provider = single_provider(
        transport.clone(),
        chain_settings(3, 2, FailurePolicy::FailClosed),
    );

    let request = test_request();
    let generation = provider.generate(&request).await.unwrap();
    assert_eq!(generation.text, "Day 1: ... squats, lunges");
    assert_eq!(generation.meta.finish_reason, FinishReason::Complete);
    assert_eq!(generation.meta.continued_rounds, 1);

    let calls = transport.calls();
    assert_eq!(calls.len(), 2);
    let follow_up = &calls[1].request.messages;
    assert_eq!(follow_up.len(), request.messages.len() + 2);
    assert_eq!(follow_up[..request.messages.len()], request.messages[..]);
    assert_eq!(follow_up[follow_up.len() - 2].role, MessageRole::Assistant);
    assert_eq!(follow_up[follow_up.len() - 2].content, "Day 1: ...");
    assert_eq!(follow_up[follow_up.len() - 1].role, MessageRole::User);
    assert_eq!(follow_up[follow_up.len() - 1].content, CONTINUE_INSTRUCTION);
}

#[tokio::test]
async fn test_continuation_rounds_are_bounded() {
    let transport = ScriptedTransport::new(vec![
        Ok(completion("a", FinishReason::Truncated)),
        Ok(completion("b", FinishReason::Truncated)),
        Ok(completion("c", FinishReason::Truncated)),
        Ok(completion("d", FinishReason::Complete)),
    ]);
    let provider = single_provider(
        transport.clone(),
        chain_settings(3, 2, FailurePolicy::FailClosed),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.text, "abc");
    assert_eq!(generation.meta.finish_reason, FinishReason::Truncated);
    assert_eq!(generation.meta.continued_rounds, 2);
    assert_eq!(transport.call_count(), 3);

    let last = &transport.calls()[2].request.messages;
    assert_eq!(last[last.len() - 2].content, "ab");
}

#[tokio::test]
async fn test_failed_continuation_keeps_accumulated_text() {
    let transport = ScriptedTransport::new(vec![
        Ok(completion("partial plan", FinishReason::Truncated)),
        retriable(),
        Ok(completion("never requested", FinishReason::Complete)),
    ]);
    let provider = single_provider(
        transport.clone(),
        chain_settings(3, 3, FailurePolicy::FailClosed),
    );

    let generation = provider.generate(&test_request()).await.unwrap();
    assert_eq!(generation.text, "partial plan");
    assert_eq!(generation.meta.finish_reason, FinishReason::Truncated);
    assert_eq!(generation.meta.continued_rounds, 0);
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn test_canned_provider_makes_no_calls() {
    let provider = GenerationProvider::canned();
    let generation = provider.generate(&test_request()).await.unwrap();

    assert_eq!(provider.kind(), ProviderKind::Canned);
    assert_eq!(generation.text, CANNED_PLAN_TEXT);
    assert!(!generation.meta.fallback_used);
    assert!(generation.is_usable());
}

/// Transport whose first `slow_calls` calls outlive any short attempt timeout
struct SlowTransport {
    slow_calls: u32,
    calls: AtomicU32,
}

#[async_trait]
impl CompletionTransport for SlowTransport {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn complete(
        &self,
        _target: &ModelCandidate,
        _request: &GenerationRequest,
    ) -> Result<RawCompletion, CallError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.slow_calls {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        Ok(completion("ok", FinishReason::Complete))
    }
}

fn slow_provider(transport: Arc<SlowTransport>, failure_policy: FailurePolicy) -> GenerationProvider {
    GenerationProvider::single(
        transport,
        ModelCandidate::new("http://scripted.local/v1", "slow-model"),
        ChainSettings {
            retry: RetryPolicy::immediate(2, Duration::from_millis(50)),
            continuation_rounds: 0,
            failure_policy,
        },
    )
}

#[tokio::test]
async fn test_attempt_timeout_is_retried_like_a_network_failure() {
    let transport = Arc::new(SlowTransport {
        slow_calls: 1,
        calls: AtomicU32::new(0),
    });
    let provider = slow_provider(transport.clone(), FailurePolicy::FailClosed);

    let generation = provider.generate(&test_request()).await.unwrap();

    assert_eq!(generation.text, "ok");
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_every_attempt_timing_out_exhausts_fail_closed() {
    let transport = Arc::new(SlowTransport {
        slow_calls: u32::MAX,
        calls: AtomicU32::new(0),
    });
    let provider = slow_provider(transport.clone(), FailurePolicy::FailClosed);

    let err = provider.generate(&test_request()).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ProviderExhausted);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}
