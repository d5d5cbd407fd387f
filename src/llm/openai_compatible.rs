// ABOUTME: OpenAI-compatible chat completions transport for the single-model variant
// ABOUTME: Maps finish_reason and HTTP failures onto generation finish and call error classes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Transport
//!
//! Sends one non-streaming request to `{base_url}/chat/completions`. Works with
//! `OpenAI` itself and with any compatible server (Ollama, vLLM, `LocalAI`).
//!
//! Finish reasons: `stop` means complete, `length` means truncated and
//! `content_filter` means the output was blocked.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::retry::{classify_request_error, classify_status};
use super::{
    CallError, ChatMessage, CompletionTransport, FinishReason, GenerationRequest, RawCompletion,
};
use crate::config::ModelCandidate;
use crate::errors::AppError;

/// Service label used in error messages
const SERVICE: &str = "OpenAI-compatible";

/// Connection timeout; the overall bound comes from the retry policy
const CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

impl From<&ChatMessage> for OpenAiMessage {
    fn from(msg: &ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: Option<OpenAiResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

// ============================================================================
// Transport Implementation
// ============================================================================

/// Chat completions transport for any `OpenAI`-compatible endpoint
pub struct OpenAiChatTransport {
    client: Client,
    api_key: Option<String>,
}

impl OpenAiChatTransport {
    /// Create a transport with an optional bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: Option<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    fn api_url(base_url: &str, endpoint: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
    }

    fn add_auth_header(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn map_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("stop") => FinishReason::Complete,
            Some("length") => FinishReason::Truncated,
            Some("content_filter") => FinishReason::Blocked,
            _ => FinishReason::Unknown,
        }
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<OpenAiErrorResponse>(body)
            .map_or_else(|_| body.chars().take(300).collect(), |e| e.error.message)
    }
}

#[async_trait]
impl CompletionTransport for OpenAiChatTransport {
    fn name(&self) -> &'static str {
        "openai_compatible"
    }

    #[instrument(skip(self, request), fields(model = %target.model))]
    async fn complete(
        &self,
        target: &ModelCandidate,
        request: &GenerationRequest,
    ) -> Result<RawCompletion, CallError> {
        let body = OpenAiRequest {
            model: target.model.clone(),
            messages: request.messages.iter().map(OpenAiMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            stream: false,
        };

        let http_request = self
            .client
            .post(Self::api_url(&target.base_url, "chat/completions"))
            .json(&body);

        let response = self
            .add_auth_header(http_request)
            .send()
            .await
            .map_err(|e| classify_request_error(SERVICE, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify_request_error(SERVICE, &e))?;

        if !status.is_success() {
            return Err(classify_status(
                SERVICE,
                status.as_u16(),
                &Self::error_message(&text),
            ));
        }

        let parsed: OpenAiResponse = serde_json::from_str(&text)
            .map_err(|e| CallError::Fatal(format!("{SERVICE}: failed to parse response: {e}")))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CallError::Fatal(format!("{SERVICE}: response had no choices")))?;

        let finish_reason = Self::map_finish_reason(choice.finish_reason.as_deref());
        let (content, refusal) = choice
            .message
            .map_or((None, None), |m| (m.content, m.refusal));
        let block_reason = match (finish_reason, refusal) {
            (_, Some(refusal)) if !refusal.is_empty() => Some(refusal),
            (FinishReason::Blocked, _) => Some("content_filter".to_owned()),
            _ => None,
        };
        let finish_reason = if block_reason.is_some() {
            FinishReason::Blocked
        } else {
            finish_reason
        };
        let content = content.unwrap_or_default();

        debug!(
            chars = content.len(),
            finish_reason = finish_reason.as_str(),
            "Received chat completion"
        );

        Ok(RawCompletion {
            text: content,
            finish_reason,
            block_reason,
            model: parsed.model.unwrap_or_else(|| target.model.clone()),
        })
    }
}
