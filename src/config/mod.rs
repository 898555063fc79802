// ABOUTME: Configuration module for the HomeServe server
// ABOUTME: Environment-driven runtime configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

pub mod environment;

pub use environment::{Environment, ServerConfig};
