// ABOUTME: Plan generation pipeline components from preferences to persisted plan
// ABOUTME: Validator, rule-based builder, extractor, normalizer, prompt and orchestrating service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Deterministic rule-based builder
pub mod builder;
/// Structured output extraction
pub mod extractor;
/// Reconciliation of extracted output
pub mod normalizer;
/// Preference validation
pub mod preferences;
/// Prompt construction
pub mod prompt;
/// Pipeline orchestration
pub mod service;

pub use builder::{DeterministicPlanBuilder, MovementRole};
pub use extractor::ResponseExtractor;
pub use normalizer::{NormalizedPlan, PlanNormalizer};
pub use preferences::PreferenceValidator;
pub use service::{PlanGenerationService, PlanPreview, SamplingSettings};
