// ABOUTME: Text generation abstraction used by plan creation and previews
// ABOUTME: Message types, generation metadata and the single-attempt transport contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Generation Provider Layer
//!
//! Calls an external text-generation backend with resilience and reports
//! what happened alongside the text.
//!
//! ## Key Concepts
//!
//! - **`CompletionTransport`**: one HTTP attempt against one model target.
//!   Transports classify failures into [`CallError`] and never retry.
//! - **`RetryPolicy`**: attempt ceiling, exponential backoff with jitter and
//!   per-attempt timeout, shared by every real variant.
//! - **`GenerationProvider`**: closed set of variants (single-model,
//!   multi-model, canned) selected once at startup. Handles candidate
//!   fallback, continuation of truncated replies and the fail-open switch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pierre_plan_server::config::GenerationConfig;
//! use pierre_plan_server::llm::{ChatMessage, GenerationProvider, GenerationRequest};
//!
//! # async fn example() -> Result<(), pierre_plan_server::errors::AppError> {
//! let provider = GenerationProvider::from_config(&GenerationConfig::default())?;
//! let request = GenerationRequest::new(vec![ChatMessage::user("Suggest a warmup")]);
//! let generation = provider.generate(&request).await?;
//! println!("{} ({:?})", generation.text, generation.meta.finish_reason);
//! # Ok(())
//! # }
//! ```

mod canned;
mod gemini;
mod openai_compatible;
mod provider;
mod retry;

pub use canned::{CannedProvider, CANNED_PLAN_TEXT};
pub use gemini::GeminiTransport;
pub use openai_compatible::OpenAiChatTransport;
pub use provider::{ChainSettings, GenerationProvider, ModelChain};
pub use retry::RetryPolicy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ModelCandidate;

/// Instruction appended when asking the model to resume a truncated reply
pub const CONTINUE_INSTRUCTION: &str =
    "Continue exactly where you left off. Do not repeat anything you already wrote.";

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Prompt and sampling settings for one generation
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Output token cap
    pub max_output_tokens: Option<u32>,
}

impl GenerationRequest {
    /// Create a request with default sampling settings
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output token cap
    #[must_use]
    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// Follow-up request resuming a truncated reply
    ///
    /// Re-submits the original messages, the accumulated assistant text and an
    /// explicit instruction not to repeat earlier output.
    #[must_use]
    pub fn continuation(&self, accumulated: &str) -> Self {
        let mut messages = self.messages.clone();
        messages.push(ChatMessage::assistant(accumulated));
        messages.push(ChatMessage::user(CONTINUE_INSTRUCTION));
        Self {
            messages,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// How a reply ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Ended naturally
    Complete,
    /// Cut off by the output-length cap
    Truncated,
    /// Refused for a safety or policy reason
    Blocked,
    /// Backend reported something else or nothing
    Unknown,
}

impl FinishReason {
    /// Convert to string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::Truncated => "truncated",
            Self::Blocked => "blocked",
            Self::Unknown => "unknown",
        }
    }
}

/// Which provider variant produced a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Single chat endpoint
    SingleModel,
    /// Multi-model candidate chain
    MultiModel,
    /// Canned response, no network
    Canned,
}

impl ProviderKind {
    /// Convert to string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleModel => "single_model",
            Self::MultiModel => "multi_model",
            Self::Canned => "canned",
        }
    }
}

/// Metadata describing how a generation was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationMeta {
    /// Variant that produced the text
    pub provider_kind: ProviderKind,
    /// Model that produced the text
    pub model_id: String,
    /// How the final round ended
    pub finish_reason: FinishReason,
    /// Safety or policy refusal reason
    pub block_reason: Option<String>,
    /// Continuation calls appended to the first reply
    pub continued_rounds: u32,
    /// True when fail-open substituted the canned response
    pub fallback_used: bool,
}

/// Generated text with metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    /// Accumulated text
    pub text: String,
    /// How it was produced
    pub meta: GenerationMeta,
}

impl Generation {
    /// True when the text can be handed to extraction
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.meta.block_reason.is_none() && !self.text.trim().is_empty()
    }
}

/// Result of a single transport attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    /// Reply text, possibly empty
    pub text: String,
    /// Normalized finish reason
    pub finish_reason: FinishReason,
    /// Refusal reason when the backend blocked the output
    pub block_reason: Option<String>,
    /// Model reported by the backend
    pub model: String,
}

/// Classified failure of one transport attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Transient: 429/5xx, connection reset, timeout, DNS
    #[error("retriable failure: {0}")]
    Retriable(String),
    /// Model or route does not exist at this endpoint
    #[error("model not found: {0}")]
    NotFound(String),
    /// Anything else, such as a rejected request or unparsable body
    #[error("call failed: {0}")]
    Fatal(String),
}

impl CallError {
    /// Whether the retry policy may try this attempt again
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Retriable(_))
    }
}

/// One HTTP attempt against one model target
///
/// Implementations must not retry on their own; the provider owns the retry
/// budget and timeouts.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &'static str;

    /// Send the request to `target` once
    async fn complete(
        &self,
        target: &ModelCandidate,
        request: &GenerationRequest,
    ) -> Result<RawCompletion, CallError>;
}
