// ABOUTME: Service catalog routes - list and fetch the fixed service types
// ABOUTME: The catalog is compiled in, so these handlers never touch the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use axum::{
    extract::Path,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::catalog;
use crate::errors::AppError;

/// Service catalog routes
pub struct ServiceTypeRoutes;

impl ServiceTypeRoutes {
    /// Create all service catalog routes
    #[must_use]
    pub fn routes() -> Router {
        Router::new()
            .route("/service-types", get(Self::handle_list))
            .route("/service-types/:id", get(Self::handle_get))
    }

    async fn handle_list() -> Response {
        Json(catalog::SERVICE_TYPES).into_response()
    }

    async fn handle_get(Path(id): Path<String>) -> Result<Response, AppError> {
        let service_type = catalog::lookup(&id)?;
        Ok(Json(service_type).into_response())
    }
}
