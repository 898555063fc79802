// ABOUTME: Authentication route handlers for registration, login, and logout
// ABOUTME: Issues JWT tokens for registered customers, providers, and admins
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ServerResources;
use crate::auth::{hash_password, verify_password};
use crate::errors::{AppError, ErrorCode};
use crate::models::{User, UserRole};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
    /// Only meaningful for providers
    #[serde(default)]
    pub service_area: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/auth/register", post(Self::handle_register))
            .route("/auth/login", post(Self::handle_login))
            .route("/auth/logout", post(Self::handle_logout))
            .with_state(resources)
    }

    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        if request.email.is_empty() || !request.email.contains('@') {
            return Err(AppError::invalid_input("Invalid email address"));
        }
        if request.password.len() < 8 {
            return Err(AppError::invalid_input(
                "Password must be at least 8 characters",
            ));
        }

        if resources
            .database
            .get_user_by_email(&request.email)
            .await?
            .is_some()
        {
            return Err(AppError::new(
                ErrorCode::ResourceAlreadyExists,
                "Email already registered",
            ));
        }

        let user = User::new(
            request.name,
            request.email,
            hash_password(&request.password)?,
            request.role,
            request.service_area,
        )?;
        resources.database.create_user(&user).await?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "Registration successful".into(),
            }),
        )
            .into_response())
    }

    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let user = resources
            .database
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        let token = resources.auth.generate_token(&user)?;
        info!(user_id = %user.id, "user logged in");

        Ok(Json(LoginResponse {
            token,
            user: UserInfo {
                id: user.id.to_string(),
                name: user.name,
                email: user.email,
                role: user.role,
            },
        })
        .into_response())
    }

    async fn handle_logout() -> Json<serde_json::Value> {
        // JWT is stateless; the client discards the token.
        Json(serde_json::json!({ "message": "Logged out successfully" }))
    }
}
