// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses environment variables into a typed ServerConfig with defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! Environment-based configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// Environment type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// Database connection string
    pub database_url: String,
    /// JWT signing secret
    pub jwt_secret: Vec<u8>,
    /// Deployment environment
    pub environment: Environment,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// `JWT_SECRET` is required in production; in development a random
    /// secret is generated when it is absent (tokens won't survive a
    /// restart).
    ///
    /// # Errors
    ///
    /// Returns an error for unparseable values or a missing production
    /// secret.
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_default(),
        );

        let http_port = env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse::<u16>()
            .context("Invalid HTTP_PORT")?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/homeserve.db".into());

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret.into_bytes(),
            _ if environment.is_production() => {
                anyhow::bail!("JWT_SECRET must be set in production")
            }
            _ => {
                tracing::warn!("JWT_SECRET not set, generating an ephemeral development secret");
                crate::auth::generate_jwt_secret().to_vec()
            }
        };

        Ok(Self {
            http_port,
            database_url,
            jwt_secret,
            environment,
        })
    }

    /// One-line startup summary (never includes the secret)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "environment={} http_port={} database_url={}",
            self.environment, self.http_port, self.database_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(
            Environment::from_str_or_default("prod"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_or_default("TEST"),
            Environment::Testing
        );
        assert_eq!(
            Environment::from_str_or_default("anything"),
            Environment::Development
        );
    }

    #[test]
    fn test_summary_has_no_secret() {
        let config = ServerConfig {
            http_port: 8080,
            database_url: "sqlite::memory:".into(),
            jwt_secret: b"super-secret".to_vec(),
            environment: Environment::Development,
        };
        assert!(!config.summary().contains("super-secret"));
    }
}
