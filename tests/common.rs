// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides common database, engine, and user creation helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe
#![allow(dead_code, clippy::missing_panics_doc, clippy::must_use_candidate)]

//! Shared test utilities for `homeserve_server`
//!
//! Test databases are backed by files in a per-test temp directory; an
//! in-memory `SQLite` URL would hand each pooled connection its own
//! empty database.

use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use homeserve_server::{
    auth::AuthManager,
    context::ActorContext,
    database::Database,
    lifecycle::{CreateBooking, LifecycleEngine},
    models::{Address, Booking, User, UserRole},
};
use tempfile::TempDir;
use uuid::Uuid;

/// Everything a lifecycle or route test needs, with the temp dir kept
/// alive for the duration of the test
pub struct TestHarness {
    pub database: Arc<Database>,
    pub engine: LifecycleEngine,
    pub auth: AuthManager,
    _tmp: TempDir,
}

/// Create a migrated file-backed test database and an engine over it
pub async fn setup() -> Result<TestHarness> {
    let tmp = TempDir::new()?;
    let db_path = tmp.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let database = Arc::new(Database::new(&database_url).await?);
    database.migrate().await?;

    let engine = LifecycleEngine::new(database.clone());
    let auth = AuthManager::new(b"test-secret-key-for-integration-tests");

    Ok(TestHarness {
        database,
        engine,
        auth,
        _tmp: tmp,
    })
}

/// Insert a user with the given role; email is randomized per call
pub async fn create_user(database: &Database, role: UserRole) -> Result<User> {
    let service_area = match role {
        UserRole::Provider => Some("springfield".to_string()),
        _ => None,
    };
    let user = User::new(
        format!("Test {}", role.as_str()),
        format!("{}-{}@example.com", role.as_str(), Uuid::new_v4()),
        "$2b$04$testhashtesthashtesthashte".to_string(),
        role,
        service_area,
    )?;
    database.create_user(&user).await?;
    Ok(user)
}

pub fn ctx_for(user: &User) -> ActorContext {
    ActorContext {
        actor_id: user.id,
        role: user.role,
    }
}

pub fn test_address() -> Address {
    Address {
        street: "742 Evergreen Terrace".to_string(),
        city: "Springfield".to_string(),
        state: "OR".to_string(),
        postal_code: "97401".to_string(),
        unit: None,
        notes: None,
    }
}

pub fn create_request(service_type_id: &str) -> CreateBooking {
    CreateBooking {
        service_type_id: service_type_id.to_string(),
        scheduled_date: Utc::now() + Duration::days(3),
        address: test_address(),
        notes: None,
    }
}

/// Create a PENDING booking owned by the given customer
pub async fn create_booking(
    harness: &TestHarness,
    customer: &User,
) -> Result<Booking> {
    let booking = harness
        .engine
        .create_booking(ctx_for(customer), create_request("cleaning-basic"))
        .await?;
    Ok(booking)
}
