// ABOUTME: Configuration management for the plan server
// ABOUTME: Server settings and generation provider settings loaded from the environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! All configuration is static and read once at process start:
//!
//! - **environment**: HTTP port and database URL
//! - **generation**: which generation variant runs, its candidates, retry
//!   budget, timeouts, continuation limit and the fail-open switch

/// Server configuration from environment variables
pub mod environment;

/// Generation provider configuration
pub mod generation;

pub use environment::ServerConfig;
pub use generation::{FailurePolicy, GenerationConfig, GenerationMode, ModelCandidate};
