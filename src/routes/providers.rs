// ABOUTME: Provider route handlers - availability listing and per-provider stats
// ABOUTME: Availability is admin-only; stats are visible to self or admin
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::ServerResources;
use crate::errors::AppError;
use crate::models::UserRole;

#[derive(Debug, Default, Deserialize)]
pub struct AvailableProvidersQuery {
    #[serde(default)]
    pub service_area: Option<String>,
}

/// Provider routes
pub struct ProviderRoutes;

impl ProviderRoutes {
    /// Create all provider routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/providers/available", get(Self::handle_available))
            .route("/providers/:id/stats", get(Self::handle_stats))
            .with_state(resources)
    }

    async fn handle_available(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<AvailableProvidersQuery>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;
        ctx.require_role(UserRole::Admin)?;

        let providers = resources
            .database
            .list_providers(query.service_area.as_deref())
            .await?;

        Ok(Json(providers).into_response())
    }

    async fn handle_stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<Uuid>,
    ) -> Result<Response, AppError> {
        let ctx = resources.auth.authenticate(&headers)?;

        if !ctx.is_admin() && ctx.actor_id != id {
            return Err(AppError::forbidden("Not your statistics"));
        }

        let stats = resources.database.provider_stats(id).await?;
        Ok(Json(stats).into_response())
    }
}
