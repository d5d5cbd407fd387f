// ABOUTME: Gemini generateContent transport for the multi-model variant
// ABOUTME: Maps prompt feedback, safety finishes and token caps onto generation outcomes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Gemini Transport
//!
//! Sends one request to `{base_url}/models/{model}:generateContent`. The base
//! URL carries the API version (`v1beta`, `v1`), so the multi-model chain can
//! try the same model on several versions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::retry::{classify_request_error, classify_status};
use super::{
    CallError, ChatMessage, CompletionTransport, FinishReason, GenerationRequest, MessageRole,
    RawCompletion,
};
use crate::config::ModelCandidate;
use crate::errors::AppError;

/// Service label used in error messages
const SERVICE: &str = "Gemini";

/// Connection timeout; the overall bound comes from the retry policy
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Finish reasons that mean the output was withheld
const BLOCKING_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "RECITATION",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
];

// ============================================================================
// API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    candidate_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Transport Implementation
// ============================================================================

/// Transport for Gemini-style `generateContent` endpoints
pub struct GeminiTransport {
    client: Client,
    api_key: Option<String>,
}

impl GeminiTransport {
    /// Create a transport; the key is sent as the `key` query parameter
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

    /// Build the API URL for a model and method
    fn build_url(base_url: &str, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", base_url.trim_end_matches('/'))
    }

    /// Gemini has no system role in `contents`; system text goes to `system_instruction`
    fn build_request(request: &GenerationRequest) -> GeminiRequest {
        let mut contents = Vec::new();
        let mut system_parts = Vec::new();

        for message in &request.messages {
            if message.role == MessageRole::System {
                system_parts.push(ContentPart {
                    text: Some(message.content.clone()),
                });
            } else {
                contents.push(Self::convert_message(message));
            }
        }

        GeminiRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then_some(GeminiContent {
                role: None,
                parts: system_parts,
            }),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
                candidate_count: 1,
            }),
        }
    }

    fn convert_message(message: &ChatMessage) -> GeminiContent {
        let role = match message.role {
            MessageRole::Assistant => "model",
            MessageRole::System | MessageRole::User => "user",
        };
        GeminiContent {
            role: Some(role.to_owned()),
            parts: vec![ContentPart {
                text: Some(message.content.clone()),
            }],
        }
    }

    fn map_finish_reason(reason: Option<&str>) -> FinishReason {
        match reason {
            Some("STOP") => FinishReason::Complete,
            Some("MAX_TOKENS") => FinishReason::Truncated,
            Some(r) if BLOCKING_FINISH_REASONS.contains(&r) => FinishReason::Blocked,
            _ => FinishReason::Unknown,
        }
    }

    fn error_message(body: &str) -> String {
        serde_json::from_str::<GeminiErrorResponse>(body)
            .map_or_else(|_| body.chars().take(300).collect(), |e| e.error.message)
    }

    fn into_completion(response: GeminiResponse, target: &ModelCandidate) -> RawCompletion {
        let model = response
            .model_version
            .unwrap_or_else(|| target.model.clone());

        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return RawCompletion {
                text: String::new(),
                finish_reason: FinishReason::Blocked,
                block_reason: Some(reason),
                model,
            };
        }

        let Some(candidate) = response.candidates.into_iter().next() else {
            return RawCompletion {
                text: String::new(),
                finish_reason: FinishReason::Unknown,
                block_reason: None,
                model,
            };
        };

        let finish_reason = Self::map_finish_reason(candidate.finish_reason.as_deref());
        let block_reason = (finish_reason == FinishReason::Blocked)
            .then(|| candidate.finish_reason.clone().unwrap_or_default());
        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        RawCompletion {
            text,
            finish_reason,
            block_reason,
            model,
        }
    }
}

#[async_trait]
impl CompletionTransport for GeminiTransport {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(skip(self, request), fields(model = %target.model, base = %target.base_url))]
    async fn complete(
        &self,
        target: &ModelCandidate,
        request: &GenerationRequest,
    ) -> Result<RawCompletion, CallError> {
        let url = Self::build_url(&target.base_url, &target.model, "generateContent");
        let mut http_request = self.client.post(url).json(&Self::build_request(request));
        if let Some(key) = &self.api_key {
            http_request = http_request.query(&[("key", key)]);
        }

        let response = http_request
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

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| CallError::Fatal(format!("{SERVICE}: failed to parse response: {e}")))?;
        let completion = Self::into_completion(parsed, target);

        debug!(
            chars = completion.text.len(),
            finish_reason = completion.finish_reason.as_str(),
            blocked = completion.block_reason.is_some(),
            "Received Gemini response"
        );

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatMessage;

    #[test]
    fn test_build_url_includes_version_base() {
        assert_eq!(
            GeminiTransport::build_url(
                "https://generativelanguage.googleapis.com/v1/",
                "gemini-1.5-flash",
                "generateContent"
            ),
            "https://generativelanguage.googleapis.com/v1/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_system_messages_move_to_system_instruction() {
        let request = GenerationRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("plan"),
            ChatMessage::assistant("partial"),
        ]);
        let body = serde_json::to_value(GeminiTransport::build_request(&request)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][1]["role"], "model");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(
            GeminiTransport::map_finish_reason(Some("MAX_TOKENS")),
            FinishReason::Truncated
        );
        assert_eq!(
            GeminiTransport::map_finish_reason(Some("SAFETY")),
            FinishReason::Blocked
        );
        assert_eq!(
            GeminiTransport::map_finish_reason(Some("STOP")),
            FinishReason::Complete
        );
    }
}
