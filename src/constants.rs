// ABOUTME: Service-wide constants and environment variable names
// ABOUTME: Defaults for ports, storage and plan generation tuning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Service name used in structured logs
pub const SERVICE_NAME: &str = "pierre-plan-server";

/// Header carrying the verified owner id from the upstream auth layer
pub const OWNER_ID_HEADER: &str = "x-user-id";

/// Maximum length of a free-text preview message
pub const PREVIEW_MESSAGE_MAX_CHARS: usize = 2000;

/// Environment variable names
pub mod env_vars {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// Database connection URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Generation variant: single, multi or disabled
    pub const GENERATION_MODE: &str = "PLAN_GENERATION_MODE";
    /// Base URL of the single-model chat endpoint
    pub const LLM_BASE_URL: &str = "PLAN_LLM_BASE_URL";
    /// Model id for the single-model endpoint
    pub const LLM_MODEL: &str = "PLAN_LLM_MODEL";
    /// API key for the single-model endpoint
    pub const LLM_API_KEY: &str = "PLAN_LLM_API_KEY";
    /// Ordered multi-model candidates, `model@base_url` comma list
    pub const LLM_CANDIDATES: &str = "PLAN_LLM_CANDIDATES";
    /// API key for the multi-model endpoints
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    /// Attempts per candidate, first attempt included
    pub const LLM_MAX_ATTEMPTS: &str = "PLAN_LLM_MAX_ATTEMPTS";
    /// Base retry delay in milliseconds
    pub const LLM_RETRY_BASE_DELAY_MS: &str = "PLAN_LLM_RETRY_BASE_DELAY_MS";
    /// Retry delay cap in milliseconds
    pub const LLM_RETRY_MAX_DELAY_MS: &str = "PLAN_LLM_RETRY_MAX_DELAY_MS";
    /// Upper bound of random jitter added to each delay
    pub const LLM_RETRY_JITTER_MS: &str = "PLAN_LLM_RETRY_JITTER_MS";
    /// Per-attempt timeout in seconds
    pub const LLM_TIMEOUT_SECS: &str = "PLAN_LLM_TIMEOUT_SECS";
    /// Maximum continuation rounds after a truncated reply
    pub const LLM_CONTINUATION_ROUNDS: &str = "PLAN_LLM_CONTINUATION_ROUNDS";
    /// Output token cap per call
    pub const LLM_MAX_OUTPUT_TOKENS: &str = "PLAN_LLM_MAX_OUTPUT_TOKENS";
    /// Sampling temperature
    pub const LLM_TEMPERATURE: &str = "PLAN_LLM_TEMPERATURE";
    /// Serve canned text instead of failing when every candidate is exhausted
    pub const LLM_FAIL_OPEN: &str = "PLAN_LLM_FAIL_OPEN";
}

/// Default values
pub mod defaults {
    /// Default HTTP port
    pub const HTTP_PORT: u16 = 8081;
    /// Default database URL
    pub const DATABASE_URL: &str = "sqlite:./data/plans.db";
    /// Default OpenAI-compatible base URL
    pub const LLM_BASE_URL: &str = "https://api.openai.com/v1";
    /// Default single-model id
    pub const LLM_MODEL: &str = "gpt-4o-mini";
    /// Default Gemini API base for the multi-model variant
    pub const GEMINI_BASE_V1BETA: &str = "https://generativelanguage.googleapis.com/v1beta";
    /// Stable Gemini API base tried after `v1beta`
    pub const GEMINI_BASE_V1: &str = "https://generativelanguage.googleapis.com/v1";
    /// Default Gemini models, in preference order
    pub const GEMINI_MODELS: [&str; 2] = ["gemini-2.5-flash", "gemini-1.5-flash"];
    /// Attempts per candidate
    pub const MAX_ATTEMPTS: u32 = 3;
    /// Base retry delay
    pub const RETRY_BASE_DELAY_MS: u64 = 500;
    /// Retry delay cap
    pub const RETRY_MAX_DELAY_MS: u64 = 8_000;
    /// Retry jitter bound
    pub const RETRY_JITTER_MS: u64 = 250;
    /// Per-attempt timeout
    pub const TIMEOUT_SECS: u64 = 45;
    /// Continuation rounds
    pub const CONTINUATION_ROUNDS: u32 = 2;
    /// Output token cap
    pub const MAX_OUTPUT_TOKENS: u32 = 2048;
    /// Sampling temperature
    pub const TEMPERATURE: f32 = 0.4;
}
