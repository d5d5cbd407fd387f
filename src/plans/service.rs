// ABOUTME: Plan generation pipeline: validate, generate, extract, normalize, persist
// ABOUTME: Also serves the non-persisted preview flow and owner-scoped plan reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Plan Generation Service
//!
//! One sequential pipeline per request. The only suspension points are the
//! provider calls; extraction and normalization are synchronous and the
//! database transaction opens only after generation has finished.
//!
//! After validation passes, the only failures a caller can see are a
//! fail-closed provider exhaustion and a store failure. Blocked, empty or
//! unparseable output degrades to the rule-based plan.

use std::sync::Arc;

use pierre_plan_core::{Plan, PlanSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::extractor::ResponseExtractor;
use super::normalizer::PlanNormalizer;
use super::preferences::PreferenceValidator;
use super::prompt::build_plan_messages;
use crate::config::GenerationConfig;
use crate::constants::{defaults, PREVIEW_MESSAGE_MAX_CHARS};
use crate::database::PlanStore;
use crate::errors::{AppError, AppResult};
use crate::llm::{
    ChatMessage, FinishReason, GenerationProvider, GenerationRequest, ProviderKind,
};
use crate::logging::AppLogger;

/// System prompt for free-text preview suggestions
const PREVIEW_SYSTEM_PROMPT: &str = "You are a concise strength and conditioning coach. \
     Suggest training ideas in plain text. Keep it short and practical.";

/// Result of a preview call, surfaced as-is without fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPreview {
    /// Generated text, empty when blocked
    pub text: String,
    /// How the reply ended
    pub finish_reason: FinishReason,
    /// Refusal reason when the provider blocked the reply
    pub block_reason: Option<String>,
    /// Model that answered
    pub model_id: String,
    /// Provider variant that answered
    pub provider_kind: ProviderKind,
    /// Continuation calls appended to the first reply
    pub continued_rounds: u32,
    /// True when fail-open substituted the canned response
    pub fallback_used: bool,
}

/// Sampling settings applied to every generation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingSettings {
    /// Sampling temperature
    pub temperature: f32,
    /// Output token cap per call
    pub max_output_tokens: u32,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            temperature: defaults::TEMPERATURE,
            max_output_tokens: defaults::MAX_OUTPUT_TOKENS,
        }
    }
}

impl SamplingSettings {
    /// Sampling settings from generation configuration
    #[must_use]
    pub const fn from_config(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Orchestrates plan creation and plan reads
#[derive(Clone)]
pub struct PlanGenerationService {
    provider: Arc<GenerationProvider>,
    store: PlanStore,
    sampling: SamplingSettings,
}

impl PlanGenerationService {
    /// Create a service over a provider and a store
    #[must_use]
    pub fn new(provider: Arc<GenerationProvider>, store: PlanStore) -> Self {
        Self {
            provider,
            store,
            sampling: SamplingSettings::default(),
        }
    }

    /// Override sampling settings
    #[must_use]
    pub fn with_sampling(mut self, sampling: SamplingSettings) -> Self {
        self.sampling = sampling;
        self
    }

    fn request(&self, messages: Vec<ChatMessage>) -> GenerationRequest {
        GenerationRequest::new(messages)
            .with_temperature(self.sampling.temperature)
            .with_max_output_tokens(self.sampling.max_output_tokens)
    }

    /// Create and persist a plan from raw preferences
    ///
    /// # Errors
    ///
    /// - validation errors for bad preferences, before any generation
    /// - `ProviderExhausted` when generation fails and the provider fails closed
    /// - a database error when persistence fails; nothing partial is stored
    #[instrument(skip(self, raw), fields(owner_id = %owner_id))]
    pub async fn create(&self, owner_id: Uuid, raw: &Value) -> AppResult<Plan> {
        let prefs = PreferenceValidator::validate(raw)?;

        let request = self.request(build_plan_messages(&prefs));
        let generation = self.provider.generate(&request).await?;

        let extracted = if generation.is_usable() {
            ResponseExtractor::extract(&generation.text)
        } else {
            info!(
                block_reason = generation.meta.block_reason.as_deref().unwrap_or("none"),
                "Generation unusable, building plan from rules"
            );
            None
        };

        let normalized = PlanNormalizer::reconcile(extracted.as_ref(), &prefs);
        let plan = self
            .store
            .persist(owner_id, &normalized.title, &prefs, &normalized.days)
            .await?;

        let meta = &generation.meta;
        AppLogger::log_generation_outcome(
            &owner_id.to_string(),
            meta.provider_kind.as_str(),
            &meta.model_id,
            meta.finish_reason.as_str(),
            meta.block_reason.as_deref(),
            meta.continued_rounds,
            meta.fallback_used || normalized.generated_days > 0,
        );

        Ok(plan)
    }

    /// Free-text suggestions straight from the provider; nothing is persisted
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty or oversized message, or
    /// `ProviderExhausted` when the provider fails closed
    pub async fn preview(&self, message: &str) -> AppResult<PlanPreview> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::invalid_input("Preview message must not be empty"));
        }
        if message.chars().count() > PREVIEW_MESSAGE_MAX_CHARS {
            return Err(AppError::invalid_input(format!(
                "Preview message must be at most {PREVIEW_MESSAGE_MAX_CHARS} characters"
            )));
        }

        let request = self.request(vec![
            ChatMessage::system(PREVIEW_SYSTEM_PROMPT),
            ChatMessage::user(message),
        ]);
        let generation = self.provider.generate(&request).await?;

        Ok(PlanPreview {
            text: generation.text,
            finish_reason: generation.meta.finish_reason,
            block_reason: generation.meta.block_reason,
            model_id: generation.meta.model_id,
            provider_kind: generation.meta.provider_kind,
            continued_rounds: generation.meta.continued_rounds,
            fallback_used: generation.meta.fallback_used,
        })
    }

    /// Fetch one of the owner's plans
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when the plan does not exist or belongs to
    /// someone else
    pub async fn get(&self, owner_id: Uuid, plan_id: Uuid) -> AppResult<Plan> {
        self.store
            .fetch(plan_id, owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("Plan"))
    }

    /// List the owner's plans, newest first
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails
    pub async fn list(&self, owner_id: Uuid) -> AppResult<Vec<PlanSummary>> {
        self.store.list_for_owner(owner_id).await
    }

    /// Delete one of the owner's plans
    ///
    /// # Errors
    ///
    /// Returns `ResourceNotFound` when nothing was deleted
    pub async fn delete(&self, owner_id: Uuid, plan_id: Uuid) -> AppResult<()> {
        if self.store.delete(plan_id, owner_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Plan"))
        }
    }
}
