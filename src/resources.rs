// ABOUTME: Shared server state handed to every route handler
// ABOUTME: Built once at startup from configuration, database and generation provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::database::PlanDatabase;
use crate::errors::AppResult;
use crate::llm::GenerationProvider;
use crate::plans::{PlanGenerationService, SamplingSettings};

/// Resources shared by all handlers
#[derive(Clone)]
pub struct ServerResources {
    /// Static configuration loaded at startup
    pub config: Arc<ServerConfig>,
    /// Plan database
    pub database: PlanDatabase,
    /// Plan pipeline
    pub plan_service: PlanGenerationService,
}

impl ServerResources {
    /// Assemble resources around an existing provider
    #[must_use]
    pub fn new(
        config: ServerConfig,
        database: PlanDatabase,
        provider: Arc<GenerationProvider>,
    ) -> Self {
        let plan_service = PlanGenerationService::new(provider, database.plan_store())
            .with_sampling(SamplingSettings::from_config(&config.generation));
        Self {
            config: Arc::new(config),
            database,
            plan_service,
        }
    }

    /// Assemble resources, building the provider from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's HTTP client cannot be created
    pub fn from_config(config: ServerConfig, database: PlanDatabase) -> AppResult<Self> {
        let provider = Arc::new(GenerationProvider::from_config(&config.generation)?);
        Ok(Self::new(config, database, provider))
    }
}
