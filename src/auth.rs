// ABOUTME: JWT-based authentication and password handling
// ABOUTME: Issues and validates tokens, turns request headers into an ActorContext
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! # Authentication
//!
//! Stateless JWT authentication. A login issues an HS256 token carrying the
//! user id and role; every protected route validates the `Authorization`
//! header and hands the engine an explicit [`ActorContext`]. The engine
//! itself never touches credentials.

use std::str::FromStr;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::ActorContext;
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};

/// Token lifetime, matching the 7-day sessions of the web clients
const TOKEN_EXPIRY_DAYS: i64 = 7;

/// `JWT` claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// User role at issue time
    pub role: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Issues and validates authentication tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthManager {
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Generate a token for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            role: user.role.as_str().to_owned(),
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_EXPIRY_DAYS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))
    }

    /// Validate a token and recover the actor context
    ///
    /// # Errors
    ///
    /// Returns `AuthExpired` for expired tokens and `AuthInvalid` for
    /// anything else that fails validation.
    pub fn validate_token(&self, token: &str) -> AppResult<ActorContext> {
        let data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::auth_expired(),
            _ => AppError::auth_invalid("Invalid or expired token"),
        })?;

        let actor_id = Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AppError::auth_invalid("Malformed subject claim"))?;
        let role = UserRole::from_str(&data.claims.role)
            .map_err(|_| AppError::auth_invalid("Malformed role claim"))?;

        Ok(ActorContext::new(actor_id, role))
    }

    /// Resolve an `Authorization` header into an actor context
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` when the header is missing or not a bearer
    /// token; validation errors otherwise.
    pub fn authenticate(&self, headers: &axum::http::HeaderMap) -> AppResult<ActorContext> {
        let header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(AppError::auth_required)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(AppError::auth_required)?;

        self.validate_token(token)
    }
}

/// Hash a password with bcrypt
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> AppResult<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against its bcrypt hash
///
/// # Errors
///
/// Returns an error if verification cannot run (malformed hash).
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::internal(format!("Failed to verify password: {e}")))
}

/// Generate a random JWT secret for development setups
#[must_use]
pub fn generate_jwt_secret() -> [u8; 64] {
    let mut secret = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}
