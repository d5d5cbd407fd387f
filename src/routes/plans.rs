// ABOUTME: REST endpoints for creating, previewing, reading and deleting workout plans
// ABOUTME: Owner identity comes from the header set by the upstream auth layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Plan routes
//!
//! Authentication happens upstream. The verified owner id arrives in the
//! `x-user-id` header; a missing or malformed value is rejected with 401.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pierre_plan_core::PlanSummary;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::constants::OWNER_ID_HEADER;
use crate::errors::AppError;
use crate::logging::AppLogger;
use crate::resources::ServerResources;

/// Body of a preview request
#[derive(Debug, Deserialize)]
pub struct PreviewBody {
    /// Free-text question or request
    pub message: String,
}

/// Response for listing plans
#[derive(Debug, Serialize, Deserialize)]
pub struct ListPlansResponse {
    /// Plan summaries, newest first
    pub plans: Vec<PlanSummary>,
    /// Number of plans returned
    pub total: usize,
}

/// Plan routes handler
pub struct PlanRoutes;

impl PlanRoutes {
    /// Create all plan routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/plans", post(Self::handle_create).get(Self::handle_list))
            .route("/api/plans/preview", post(Self::handle_preview))
            .route(
                "/api/plans/:id",
                get(Self::handle_get).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Owner id from the upstream auth header
    fn owner_id(headers: &HeaderMap) -> Result<Uuid, AppError> {
        let raw = headers
            .get(OWNER_ID_HEADER)
            .ok_or_else(AppError::auth_required)?
            .to_str()
            .map_err(|_| AppError::auth_invalid("Owner id header is not valid text"))?;

        Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::auth_invalid("Owner id header is not a valid UUID"))
    }

    /// Request body, with malformed JSON reported in the error envelope
    fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
        body.map(|Json(value)| value).map_err(|rejection| {
            AppError::invalid_input(format!("Invalid JSON body: {}", rejection.body_text()))
        })
    }

    fn plan_id(raw: &str) -> Result<Uuid, AppError> {
        Uuid::parse_str(raw).map_err(|_| AppError::invalid_input(format!("Invalid plan id: {raw}")))
    }

    /// Handle POST /api/plans - Generate and persist a plan
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<Value>, JsonRejection>,
    ) -> Result<Response, AppError> {
        let started = Instant::now();
        let owner_id = Self::owner_id(&headers)?;
        let body = Self::json_body(body)?;

        let plan = resources.plan_service.create(owner_id, &body).await?;

        AppLogger::log_api_request(
            "POST",
            "/api/plans",
            StatusCode::CREATED.as_u16(),
            u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            Some(&owner_id.to_string()),
        );
        Ok((StatusCode::CREATED, Json(plan)).into_response())
    }

    /// Handle POST /api/plans/preview - Free-text suggestions, not persisted
    async fn handle_preview(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Result<Json<PreviewBody>, JsonRejection>,
    ) -> Result<Response, AppError> {
        Self::owner_id(&headers)?;
        let body = Self::json_body(body)?;
        let preview = resources.plan_service.preview(&body.message).await?;
        Ok((StatusCode::OK, Json(preview)).into_response())
    }

    /// Handle GET /api/plans - List the caller's plans
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let owner_id = Self::owner_id(&headers)?;
        let plans = resources.plan_service.list(owner_id).await?;
        let response = ListPlansResponse {
            total: plans.len(),
            plans,
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/plans/:id - Fetch one plan
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let owner_id = Self::owner_id(&headers)?;
        let plan = resources
            .plan_service
            .get(owner_id, Self::plan_id(&id)?)
            .await?;
        Ok((StatusCode::OK, Json(plan)).into_response())
    }

    /// Handle DELETE /api/plans/:id - Delete one plan
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let owner_id = Self::owner_id(&headers)?;
        resources
            .plan_service
            .delete(owner_id, Self::plan_id(&id)?)
            .await?;
        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }
}
