// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: HTTP port, database URL and the nested generation configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;

use anyhow::{Context, Result};
use tracing::info;

use super::generation::{GenerationConfig, GenerationMode};
use crate::constants::{defaults, env_vars};

/// Top-level server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// `SQLite` connection URL
    pub database_url: String,
    /// Generation provider settings
    pub generation: GenerationConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: defaults::HTTP_PORT,
            database_url: defaults::DATABASE_URL.to_owned(),
            generation: GenerationConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set to an unparsable value
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            http_port: env_var_or(env_vars::HTTP_PORT, &defaults::HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            database_url: env_var_or(env_vars::DATABASE_URL, defaults::DATABASE_URL),
            generation: GenerationConfig::from_env()?,
        };
        Ok(config)
    }

    /// Log a configuration summary without secrets
    pub fn log_summary(&self) {
        let generation = &self.generation;
        let target = match generation.mode {
            GenerationMode::Single => format!("{} @ {}", generation.model, generation.base_url),
            GenerationMode::Multi => generation
                .candidates
                .iter()
                .map(|c| format!("{}@{}", c.model, c.base_url))
                .collect::<Vec<_>>()
                .join(", "),
            GenerationMode::Disabled => "canned".to_owned(),
        };
        info!(
            http.port = self.http_port,
            db.url = %self.database_url,
            generation.mode = generation.mode.as_str(),
            generation.target = %target,
            generation.max_attempts = generation.max_attempts,
            generation.timeout_secs = generation.attempt_timeout.as_secs(),
            generation.continuation_rounds = generation.continuation_rounds,
            generation.failure_policy = ?generation.failure_policy,
            "Server configuration loaded"
        );
    }
}

/// Get environment variable or default value
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
