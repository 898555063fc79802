// ABOUTME: Main library entry point for the HomeServe booking marketplace
// ABOUTME: Exposes the lifecycle engine, persistence, auth, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

#![deny(unsafe_code)]

//! # HomeServe Server
//!
//! Backend for a home-services booking marketplace. Customers book services
//! from a fixed catalog, providers accept or reject jobs, and admins assign
//! providers and resolve stuck bookings.
//!
//! The heart of the crate is the booking lifecycle engine: a fixed state
//! machine over booking statuses backed by an append-only event log and a
//! per-provider rejection ledger. Every status change goes through the
//! transition table (or an explicit admin override) and lands in the event
//! log atomically with the booking row itself.
//!
//! ## Architecture
//!
//! - **`lifecycle`**: Transition table and the engine that enforces it
//! - **`models`**: Booking, event, user, and catalog data structures
//! - **`database`**: `SQLite` persistence via `sqlx`
//! - **`auth`**: JWT issuance/validation and password hashing
//! - **`routes`**: Axum HTTP handlers, thin glue over the engine
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use homeserve_server::config::environment::ServerConfig;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("HomeServe server configured, port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod context;
pub mod database;
pub mod errors;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod routes;
