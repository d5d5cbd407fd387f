// ABOUTME: Route module organization for the plan server HTTP endpoints
// ABOUTME: Merges domain routers and applies request tracing and timeout layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Each domain module holds route definitions and thin handlers that
//! delegate to the service layer.

/// Health check routes
pub mod health;
/// Workout plan routes
pub mod plans;

pub use health::HealthRoutes;
pub use plans::PlanRoutes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::Router;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::resources::ServerResources;

/// Header carrying the per-request correlation id
const REQUEST_ID_HEADER: &str = "x-request-id";

/// Grace added on top of the worst-case generation budget
const REQUEST_TIMEOUT_GRACE: Duration = Duration::from_secs(30);

/// Build the complete application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let timeout = request_timeout(&resources);

    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(&resources)))
        .merge(PlanRoutes::routes(resources))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

/// Upper bound on one request: every attempt of every candidate plus continuations
fn request_timeout(resources: &ServerResources) -> Duration {
    let generation = &resources.config.generation;
    let candidates = u32::try_from(generation.candidates.len().max(1)).unwrap_or(u32::MAX);
    let calls = generation
        .max_attempts
        .saturating_mul(candidates)
        .saturating_add(generation.continuation_rounds);
    generation
        .attempt_timeout
        .saturating_mul(calls)
        .saturating_add(generation.retry_max_delay.saturating_mul(calls))
        .saturating_add(REQUEST_TIMEOUT_GRACE)
}
