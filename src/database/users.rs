// ABOUTME: User account database operations
// ABOUTME: Handles registration storage, lookups, and the provider directory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use std::str::FromStr;

use anyhow::{anyhow, Result};
use sqlx::Row;
use uuid::Uuid;

use super::Database;
use crate::models::{User, UserRole};

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('CUSTOMER', 'PROVIDER', 'ADMIN')),
                service_area TEXT,
                created_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the email is already registered.
    pub async fn create_user(&self, user: &User) -> Result<()> {
        if self.get_user_by_email(&user.email).await?.is_some() {
            return Err(anyhow!("Email already registered"));
        }

        sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, role, service_area, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.service_area.as_deref())
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a user by id
    pub async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_user(&row)).transpose()
    }

    /// Fetch a user by email (login path)
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_user(&row)).transpose()
    }

    /// Provider directory, optionally filtered by service area
    pub async fn list_providers(&self, service_area: Option<&str>) -> Result<Vec<User>> {
        let rows = match service_area {
            Some(area) => {
                sqlx::query("SELECT * FROM users WHERE role = 'PROVIDER' AND service_area = ?")
                    .bind(area)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM users WHERE role = 'PROVIDER'")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(decode_user).collect()
    }

    /// Number of registered provider accounts
    pub async fn count_providers(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'PROVIDER'")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn decode_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    let role: String = row.try_get("role")?;

    Ok(User {
        id: Uuid::parse_str(&id)?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        role: UserRole::from_str(&role).map_err(|e| anyhow!("{e}"))?,
        service_area: row.try_get("service_area")?,
        created_at: row.try_get("created_at")?,
    })
}
