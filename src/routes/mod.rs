// ABOUTME: HTTP route registration and shared server state
// ABOUTME: Assembles per-module routers under /api with tracing and CORS layers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! HTTP routes
//!
//! Thin glue over the lifecycle engine: handlers authenticate the caller,
//! build an [`crate::context::ActorContext`], delegate to the engine or the
//! database, and serialize the result. No business rules live here.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod providers;
pub mod service_types;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::AuthManager;
use crate::database::Database;
use crate::lifecycle::LifecycleEngine;

/// Shared resources handed to every route handler
pub struct ServerResources {
    pub database: Arc<Database>,
    pub engine: LifecycleEngine,
    pub auth: AuthManager,
}

impl ServerResources {
    #[must_use]
    pub fn new(database: Arc<Database>, auth: AuthManager) -> Self {
        let engine = LifecycleEngine::new(database.clone());
        Self {
            database,
            engine,
            auth,
        }
    }
}

/// Build the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    let api = Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(service_types::ServiceTypeRoutes::routes())
        .merge(bookings::BookingRoutes::routes(resources.clone()))
        .merge(providers::ProviderRoutes::routes(resources.clone()))
        .merge(admin::AdminRoutes::routes(resources.clone()));

    Router::new()
        .nest("/api", api)
        .merge(health::HealthRoutes::routes(resources))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
