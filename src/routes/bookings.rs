// ABOUTME: Booking route handlers - creation, listing, and lifecycle actions
// ABOUTME: Authenticates callers and delegates every mutation to the engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use super::ServerResources;
use crate::errors::AppError;
use crate::lifecycle::{CreateBooking, ListScope};
use crate::models::{Address, BookingStatus};

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub service_type_id: String,
    pub scheduled_date: DateTime<Utc>,
    pub address: Address,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReasonBody {
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_limit() -> u32 {
    20
}

fn default_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    /// `mine` (default) or `all`
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// Booking routes
pub struct BookingRoutes;

impl BookingRoutes {
    /// Create all booking routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/bookings",
                post(Self::handle_create).get(Self::handle_list),
            )
            .route("/bookings/:id", get(Self::handle_get))
            .route("/bookings/:id/status", patch(Self::handle_update_status))
            .route("/bookings/:id/cancel", post(Self::handle_cancel))
            .route("/bookings/:id/accept", post(Self::handle_accept))
            .route("/bookings/:id/reject", post(Self::handle_reject))
            .route("/bookings/:id/retry", post(Self::handle_retry))
            .route("/bookings/:id/events", get(Self::handle_events))
            .with_state(resources)
    }

    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateBookingRequest>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;

        let booking = resources
            .engine
            .create_booking(
                ctx,
                CreateBooking {
                    service_type_id: request.service_type_id,
                    scheduled_date: request.scheduled_date,
                    address: request.address,
                    notes: request.notes,
                },
            )
            .await?;

        Ok((StatusCode::CREATED, Json(booking)).into_response())
    }

    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<ListBookingsQuery>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;

        let scope = match query.scope.as_deref() {
            Some("all") => ListScope::All,
            _ => ListScope::Mine,
        };

        let page = resources
            .engine
            .list_bookings(ctx, scope, query.status, query.page, query.limit)
            .await?;

        Ok(Json(page).into_response())
    }

    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let booking = resources.engine.get_booking(ctx, id).await?;
        Ok(Json(booking).into_response())
    }

    async fn handle_update_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        Json(request): Json<UpdateStatusRequest>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let booking = resources
            .engine
            .update_status(ctx, id, request.status, request.reason)
            .await?;
        Ok(Json(booking).into_response())
    }

    async fn handle_cancel(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        body: Option<Json<ReasonBody>>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let reason = body.and_then(|Json(b)| b.reason);
        let booking = resources.engine.cancel(ctx, id, reason).await?;
        Ok(Json(booking).into_response())
    }

    async fn handle_accept(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let booking = resources.engine.accept_job(ctx, id).await?;
        Ok(Json(booking).into_response())
    }

    async fn handle_reject(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
        body: Option<Json<ReasonBody>>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let reason = body.and_then(|Json(b)| b.reason);
        let booking = resources.engine.reject_job(ctx, id, reason).await?;
        Ok(Json(booking).into_response())
    }

    async fn handle_retry(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let booking = resources.engine.retry(ctx, id).await?;
        Ok(Json(booking).into_response())
    }

    async fn handle_events(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        let events = resources.engine.booking_events(ctx, id).await?;
        Ok(Json(events).into_response())
    }
}
