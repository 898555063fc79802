// ABOUTME: Actor context passed into every lifecycle engine operation
// ABOUTME: Carries the authenticated caller's identity and role explicitly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::UserRole;

/// Authenticated caller identity, resolved by the auth middleware
///
/// The engine trusts this value and performs no credential verification of
/// its own; it only checks role-appropriateness of individual operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorContext {
    pub actor_id: Uuid,
    pub role: UserRole,
}

impl ActorContext {
    #[must_use]
    pub const fn new(actor_id: Uuid, role: UserRole) -> Self {
        Self { actor_id, role }
    }

    /// Whether the caller holds admin privilege
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Require a specific role, surfacing a 403 otherwise
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` if the caller's role does not match.
    pub fn require_role(&self, role: UserRole) -> AppResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::forbidden(format!("{} only", role.as_str())))
        }
    }
}
