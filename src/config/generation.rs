// ABOUTME: Plan generation configuration (variant, candidates, retry budget, fail policy)
// ABOUTME: Parsed once at startup from PLAN_LLM_* environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{defaults, env_vars};

/// Which generation backend variant is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// One OpenAI-compatible chat endpoint and model
    Single,
    /// Ordered Gemini-style model/version candidates
    Multi,
    /// No network; canned plan-shaped text
    Disabled,
}

impl GenerationMode {
    /// Convert to configuration string representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for GenerationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            "disabled" | "off" | "mock" => Ok(Self::Disabled),
            other => Err(anyhow!(
                "unknown generation mode '{other}' (expected single, multi or disabled)"
            )),
        }
    }
}

/// What the provider does once every candidate and retry is used up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Answer with the canned response
    FailOpen,
    /// Raise a provider-exhausted error
    FailClosed,
}

/// One (endpoint base, model id) pair tried by the multi-model variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCandidate {
    /// API base URL including the version segment
    pub base_url: String,
    /// Model identifier
    pub model: String,
}

impl ModelCandidate {
    /// Create a new candidate
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Default Gemini candidates: every model on `v1beta`, then on `v1`
    #[must_use]
    pub fn gemini_defaults() -> Vec<Self> {
        [defaults::GEMINI_BASE_V1BETA, defaults::GEMINI_BASE_V1]
            .iter()
            .flat_map(|base| {
                defaults::GEMINI_MODELS
                    .iter()
                    .map(move |model| Self::new(*base, *model))
            })
            .collect()
    }
}

/// Parse a `model@base_url` comma list; a bare model uses the `v1beta` base
///
/// # Errors
///
/// Returns an error if an entry has an empty model or base
pub fn parse_candidates(raw: &str) -> Result<Vec<ModelCandidate>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (model, base) = entry
                .split_once('@')
                .unwrap_or((entry, defaults::GEMINI_BASE_V1BETA));
            let (model, base) = (model.trim(), base.trim().trim_end_matches('/'));
            if model.is_empty() || base.is_empty() {
                bail!("invalid candidate entry '{entry}'");
            }
            Ok(ModelCandidate::new(base, model))
        })
        .collect()
}

/// Static configuration for plan generation
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Active variant
    pub mode: GenerationMode,
    /// Single-model endpoint base URL
    pub base_url: String,
    /// Single-model id
    pub model: String,
    /// Single-model API key
    pub api_key: Option<String>,
    /// Multi-model candidates in trial order
    pub candidates: Vec<ModelCandidate>,
    /// Multi-model API key
    pub candidates_api_key: Option<String>,
    /// Attempts per candidate, first attempt included
    pub max_attempts: u32,
    /// Base retry delay
    pub retry_base_delay: Duration,
    /// Retry delay cap
    pub retry_max_delay: Duration,
    /// Upper bound of random jitter
    pub retry_jitter: Duration,
    /// Per-attempt timeout
    pub attempt_timeout: Duration,
    /// Continuation rounds after a truncated reply
    pub continuation_rounds: u32,
    /// Output token cap per call
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Exhaustion policy
    pub failure_policy: FailurePolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            mode: GenerationMode::Disabled,
            base_url: defaults::LLM_BASE_URL.to_owned(),
            model: defaults::LLM_MODEL.to_owned(),
            api_key: None,
            candidates: ModelCandidate::gemini_defaults(),
            candidates_api_key: None,
            max_attempts: defaults::MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(defaults::RETRY_BASE_DELAY_MS),
            retry_max_delay: Duration::from_millis(defaults::RETRY_MAX_DELAY_MS),
            retry_jitter: Duration::from_millis(defaults::RETRY_JITTER_MS),
            attempt_timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
            continuation_rounds: defaults::CONTINUATION_ROUNDS,
            max_output_tokens: defaults::MAX_OUTPUT_TOKENS,
            temperature: defaults::TEMPERATURE,
            failure_policy: FailurePolicy::FailOpen,
        }
    }
}

impl GenerationConfig {
    /// Load generation configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if any variable is present but unparsable
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load generation configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns an error if any value is present but unparsable or out of range
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mode = parse_or(&get, env_vars::GENERATION_MODE, GenerationMode::Disabled)?;
        let candidates = match get(env_vars::LLM_CANDIDATES) {
            Some(raw) => parse_candidates(&raw)
                .with_context(|| format!("Invalid {} value", env_vars::LLM_CANDIDATES))?,
            None => ModelCandidate::gemini_defaults(),
        };
        let fail_open = parse_or(&get, env_vars::LLM_FAIL_OPEN, true)?;

        let config = Self {
            mode,
            base_url: get(env_vars::LLM_BASE_URL)
                .unwrap_or_else(|| defaults::LLM_BASE_URL.to_owned()),
            model: get(env_vars::LLM_MODEL).unwrap_or_else(|| defaults::LLM_MODEL.to_owned()),
            api_key: get(env_vars::LLM_API_KEY),
            candidates,
            candidates_api_key: get(env_vars::GEMINI_API_KEY),
            max_attempts: parse_or(&get, env_vars::LLM_MAX_ATTEMPTS, defaults::MAX_ATTEMPTS)?,
            retry_base_delay: Duration::from_millis(parse_or(
                &get,
                env_vars::LLM_RETRY_BASE_DELAY_MS,
                defaults::RETRY_BASE_DELAY_MS,
            )?),
            retry_max_delay: Duration::from_millis(parse_or(
                &get,
                env_vars::LLM_RETRY_MAX_DELAY_MS,
                defaults::RETRY_MAX_DELAY_MS,
            )?),
            retry_jitter: Duration::from_millis(parse_or(
                &get,
                env_vars::LLM_RETRY_JITTER_MS,
                defaults::RETRY_JITTER_MS,
            )?),
            attempt_timeout: Duration::from_secs(parse_or(
                &get,
                env_vars::LLM_TIMEOUT_SECS,
                defaults::TIMEOUT_SECS,
            )?),
            continuation_rounds: parse_or(
                &get,
                env_vars::LLM_CONTINUATION_ROUNDS,
                defaults::CONTINUATION_ROUNDS,
            )?,
            max_output_tokens: parse_or(
                &get,
                env_vars::LLM_MAX_OUTPUT_TOKENS,
                defaults::MAX_OUTPUT_TOKENS,
            )?,
            temperature: parse_or(&get, env_vars::LLM_TEMPERATURE, defaults::TEMPERATURE)?,
            failure_policy: if fail_open {
                FailurePolicy::FailOpen
            } else {
                FailurePolicy::FailClosed
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            bail!("{} must be at least 1", env_vars::LLM_MAX_ATTEMPTS);
        }
        if self.attempt_timeout.is_zero() {
            bail!("{} must be greater than 0", env_vars::LLM_TIMEOUT_SECS);
        }
        if self.mode == GenerationMode::Multi && self.candidates.is_empty() {
            bail!(
                "{} must list at least one candidate in multi mode",
                env_vars::LLM_CANDIDATES
            );
        }
        Ok(())
    }
}

/// Parse an optional value, falling back to the default only when absent
fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}"))
    })
}
