// ABOUTME: Main library entry point for the Pierre workout plan server
// ABOUTME: Turns training preferences into persisted multi-day plans with resilient AI generation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Pierre Plan Server
//!
//! Generates structured weekly training plans from a small set of preferences.
//!
//! ## Pipeline
//!
//! 1. **Validate** preferences against their closed sets
//! 2. **Generate** text through the configured provider (single model,
//!    multi-model candidates or canned), with retries, candidate fallback and
//!    continuation of truncated replies
//! 3. **Extract** a JSON object from the untrusted reply
//! 4. **Normalize** it into exactly `daysPerWeek` canonical days, filling gaps
//!    from the deterministic rule-based builder
//! 5. **Persist** plan, days and exercises in one transaction
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use pierre_plan_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Plan server configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Environment-driven configuration
pub mod config;

/// Application constants and environment variable names
pub mod constants;

/// Plan database, store and transactional plan writer
pub mod database;

/// Unified error handling
pub mod errors;

/// Text generation providers and transports
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Plan pipeline: validation, rule-based builder, extraction, normalization
pub mod plans;

/// Shared server state
pub mod resources;

/// HTTP routes
pub mod routes;

