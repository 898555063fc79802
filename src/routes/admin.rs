// ABOUTME: Admin route handlers - marketplace stats, manual assignment, override
// ABOUTME: Every route requires an authenticated admin caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::ServerResources;
use crate::errors::AppError;
use crate::models::{BookingStatus, UserRole};

#[derive(Debug, Deserialize)]
pub struct AssignProviderRequest {
    pub provider_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct OverrideStatusRequest {
    pub status: BookingStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Admin routes
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/admin/stats", get(Self::handle_stats))
            .route("/admin/bookings/:id/assign", post(Self::handle_assign))
            .route("/admin/bookings/:id/override", post(Self::handle_override))
            .with_state(resources)
    }

    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        ctx.require_role(UserRole::Admin)?;

        let stats = resources.database.booking_stats().await?;
        Ok(Json(stats).into_response())
    }

    async fn handle_assign(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(request): Json<AssignProviderRequest>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let booking = resources
            .engine
            .assign_provider(ctx, id, request.provider_id)
            .await?;
        Ok(Json(booking).into_response())
    }

    async fn handle_override(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(request): Json<OverrideStatusRequest>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        ctx.require_role(UserRole::Admin)?;

        let booking = resources
            .engine
            .update_status(ctx, id, request.status, request.reason)
            .await?;
        Ok(Json(booking).into_response())
    }
}
