// ABOUTME: Database management for the HomeServe booking marketplace
// ABOUTME: Wraps a SQLite pool, runs migrations, and hosts per-module stores
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! # Database Management
//!
//! Storage boundary for the booking engine. Rows are decoded into the strict
//! domain types from [`crate::models`]; malformed stored values fail loudly
//! here instead of at use-sites.

mod bookings;
mod users;

pub use bookings::{BookingFilter, BookingPage, BookingStats, ProviderStats};

use anyhow::Result;
use sqlx::{Pool, Sqlite, SqlitePool};

/// Database manager for users, bookings, events, and the rejection ledger
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Ensure SQLite creates the database file if it doesn't exist
        let connection_options = if database_url.starts_with("sqlite:") {
            format!("{database_url}?mode=rwc")
        } else {
            database_url.to_string()
        };

        let pool = SqlitePool::connect(&connection_options).await?;

        let db = Self { pool };
        db.migrate().await?;

        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Liveness probe: round-trip a trivial query through the pool
    ///
    /// # Errors
    ///
    /// Returns an error when no connection can be acquired.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if table or index creation fails.
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_bookings().await?;
        Ok(())
    }
}
