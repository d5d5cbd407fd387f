// ABOUTME: Generation provider variants selected once at startup from configuration
// ABOUTME: Candidate fallback, continuation of truncated replies and fail-open/closed handling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Generation Provider
//!
//! `GenerationProvider` is a closed enum over the three variants:
//!
//! - `SingleModel`: one OpenAI-compatible endpoint and model
//! - `MultiModel`: ordered Gemini model/version candidates
//! - `Canned`: fixed text, no network
//!
//! Both real variants run a [`ModelChain`]. A chain walks its candidates in
//! order. "Not found" moves on at once, retriable failures are retried on the
//! current candidate up to the attempt ceiling, and the first usable reply
//! wins. A blocked reply is terminal and never retried. Truncated replies are
//! continued for a bounded number of single-attempt rounds.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use super::{
    CallError, CannedProvider, CompletionTransport, FinishReason, GeminiTransport, Generation,
    GenerationMeta, GenerationRequest, OpenAiChatTransport, ProviderKind, RawCompletion,
    RetryPolicy,
};
use crate::config::{FailurePolicy, GenerationConfig, GenerationMode, ModelCandidate};
use crate::errors::{AppError, AppResult};

/// Retry, continuation and exhaustion settings of a model chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainSettings {
    /// Per-candidate retry policy
    pub retry: RetryPolicy,
    /// Continuation rounds after a truncated reply
    pub continuation_rounds: u32,
    /// What happens when every candidate fails
    pub failure_policy: FailurePolicy,
}

impl ChainSettings {
    /// Build settings from generation configuration
    #[must_use]
    pub const fn from_config(config: &GenerationConfig) -> Self {
        Self {
            retry: RetryPolicy::from_config(config),
            continuation_rounds: config.continuation_rounds,
            failure_policy: config.failure_policy,
        }
    }
}

/// Ordered candidates sharing one transport and one set of chain settings
pub struct ModelChain {
    kind: ProviderKind,
    transport: Arc<dyn CompletionTransport>,
    candidates: Vec<ModelCandidate>,
    settings: ChainSettings,
}

impl ModelChain {
    /// Create a chain
    #[must_use]
    pub fn new(
        kind: ProviderKind,
        transport: Arc<dyn CompletionTransport>,
        candidates: Vec<ModelCandidate>,
        settings: ChainSettings,
    ) -> Self {
        Self {
            kind,
            transport,
            candidates,
            settings,
        }
    }

    /// Candidates in trial order
    #[must_use]
    pub fn candidates(&self) -> &[ModelCandidate] {
        &self.candidates
    }

    #[instrument(skip_all, fields(provider = self.kind.as_str()))]
    async fn generate(&self, request: &GenerationRequest) -> AppResult<Generation> {
        let transport = self.transport.as_ref();
        let mut last_failure = String::from("no candidates configured");

        for (index, candidate) in self.candidates.iter().enumerate() {
            if index > 0 {
                info!(
                    model = %candidate.model,
                    base = %candidate.base_url,
                    previous_failure = %last_failure,
                    "Trying next generation candidate"
                );
            }

            match self
                .settings
                .retry
                .call_with_retry(transport, candidate, request)
                .await
            {
                Ok(completion) if completion.block_reason.is_some() => {
                    warn!(
                        model = %completion.model,
                        block_reason = completion.block_reason.as_deref().unwrap_or(""),
                        "Generation blocked by provider"
                    );
                    return Ok(self.blocked(completion));
                }
                Ok(completion) if completion.text.trim().is_empty() => {
                    last_failure = format!("{} returned no text", candidate.model);
                    warn!(model = %candidate.model, "Empty generation, candidate unusable");
                }
                Ok(completion) => {
                    return Ok(self.continue_truncated(candidate, request, completion).await);
                }
                Err(error) => {
                    if !matches!(error, CallError::NotFound(_)) {
                        warn!(model = %candidate.model, error = %error, "Generation candidate failed");
                    }
                    last_failure = error.to_string();
                }
            }
        }

        self.exhausted(&last_failure)
    }

    /// Append continuation rounds while the reply keeps hitting the length cap
    ///
    /// Each round is a single attempt. A failed or blocked round stops the
    /// loop and the text accumulated so far is kept.
    async fn continue_truncated(
        &self,
        candidate: &ModelCandidate,
        request: &GenerationRequest,
        first: RawCompletion,
    ) -> Generation {
        let mut text = first.text;
        let mut finish_reason = first.finish_reason;
        let mut continued_rounds = 0;

        while finish_reason == FinishReason::Truncated
            && continued_rounds < self.settings.continuation_rounds
        {
            let follow_up = request.continuation(&text);
            match self
                .settings
                .retry
                .attempt(self.transport.as_ref(), candidate, &follow_up)
                .await
            {
                Ok(next) if next.block_reason.is_none() => {
                    continued_rounds += 1;
                    finish_reason = next.finish_reason;
                    if next.text.is_empty() {
                        break;
                    }
                    text.push_str(&next.text);
                }
                Ok(next) => {
                    warn!(
                        block_reason = next.block_reason.as_deref().unwrap_or(""),
                        "Continuation blocked, keeping accumulated text"
                    );
                    break;
                }
                Err(error) => {
                    warn!(error = %error, "Continuation failed, keeping accumulated text");
                    break;
                }
            }
        }

        Generation {
            text,
            meta: GenerationMeta {
                provider_kind: self.kind,
                model_id: first.model,
                finish_reason,
                block_reason: None,
                continued_rounds,
                fallback_used: false,
            },
        }
    }

    fn blocked(&self, completion: RawCompletion) -> Generation {
        Generation {
            text: completion.text,
            meta: GenerationMeta {
                provider_kind: self.kind,
                model_id: completion.model,
                finish_reason: FinishReason::Blocked,
                block_reason: completion.block_reason,
                continued_rounds: 0,
                fallback_used: false,
            },
        }
    }

    fn exhausted(&self, last_failure: &str) -> AppResult<Generation> {
        match self.settings.failure_policy {
            FailurePolicy::FailOpen => {
                warn!(
                    provider = self.kind.as_str(),
                    last_failure = %last_failure,
                    "All generation candidates exhausted, serving canned response"
                );
                Ok(CannedProvider.generate(true))
            }
            FailurePolicy::FailClosed => Err(AppError::provider_exhausted(format!(
                "all {} generation candidates failed: {last_failure}",
                self.kind.as_str()
            ))),
        }
    }
}

/// Generation backend selected once from configuration
pub enum GenerationProvider {
    /// One fixed endpoint and model
    SingleModel(ModelChain),
    /// Ordered model/version candidates
    MultiModel(ModelChain),
    /// Canned response without network
    Canned(CannedProvider),
}

impl GenerationProvider {
    /// Build the configured variant
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created.
    pub fn from_config(config: &GenerationConfig) -> AppResult<Self> {
        let settings = ChainSettings::from_config(config);
        let provider = match config.mode {
            GenerationMode::Single => Self::single(
                Arc::new(OpenAiChatTransport::new(config.api_key.clone())?),
                ModelCandidate::new(config.base_url.clone(), config.model.clone()),
                settings,
            ),
            GenerationMode::Multi => Self::multi(
                Arc::new(GeminiTransport::new(config.candidates_api_key.clone())?),
                config.candidates.clone(),
                settings,
            ),
            GenerationMode::Disabled => Self::canned(),
        };
        info!(
            provider = provider.kind().as_str(),
            "Initialized generation provider"
        );
        Ok(provider)
    }

    /// Single-model variant over any transport
    #[must_use]
    pub fn single(
        transport: Arc<dyn CompletionTransport>,
        target: ModelCandidate,
        settings: ChainSettings,
    ) -> Self {
        Self::SingleModel(ModelChain::new(
            ProviderKind::SingleModel,
            transport,
            vec![target],
            settings,
        ))
    }

    /// Multi-model variant over any transport
    #[must_use]
    pub fn multi(
        transport: Arc<dyn CompletionTransport>,
        candidates: Vec<ModelCandidate>,
        settings: ChainSettings,
    ) -> Self {
        Self::MultiModel(ModelChain::new(
            ProviderKind::MultiModel,
            transport,
            candidates,
            settings,
        ))
    }

    /// Canned variant
    #[must_use]
    pub const fn canned() -> Self {
        Self::Canned(CannedProvider)
    }

    /// Which variant this is
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::SingleModel(_) => ProviderKind::SingleModel,
            Self::MultiModel(_) => ProviderKind::MultiModel,
            Self::Canned(_) => ProviderKind::Canned,
        }
    }

    /// Generate text for the request
    ///
    /// # Errors
    ///
    /// Returns `ProviderExhausted` when every candidate failed and the
    /// provider is configured to fail closed.
    pub async fn generate(&self, request: &GenerationRequest) -> AppResult<Generation> {
        match self {
            Self::SingleModel(chain) | Self::MultiModel(chain) => chain.generate(request).await,
            Self::Canned(canned) => Ok(canned.generate(false)),
        }
    }
}
