// ABOUTME: Core data models for the HomeServe booking marketplace
// ABOUTME: Defines Booking, BookingEvent, BookingStatus, UserRole and related types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! # Data Models
//!
//! Core data structures for the booking lifecycle engine. A `Booking` is the
//! aggregate root: it owns its status, its append-only event log, and the
//! rejection ledger. Status values are a closed enum so the transition table
//! can be checked exhaustively at compile time.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

/// Role of an authenticated user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Books services and tracks their bookings
    Customer,
    /// Accepts or rejects jobs and performs the work
    Provider,
    /// Full marketplace oversight incl. override powers
    Admin,
}

impl UserRole {
    /// Storage string for this role
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Provider => "PROVIDER",
            Self::Admin => "ADMIN",
        }
    }
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "PROVIDER" => Ok(Self::Provider),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(AppError::invalid_input(format!("Unknown user role: {s}"))),
        }
    }
}

/// Booking lifecycle status
///
/// The eight statuses form the nodes of the lifecycle state machine; the
/// edges live in [`crate::lifecycle::transitions`]. `Completed` and
/// `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Created, waiting for a provider
    Pending,
    /// A provider is bound to the booking
    Assigned,
    /// Work has started
    InProgress,
    /// Work finished (terminal)
    Completed,
    /// Called off by customer or admin (terminal)
    Cancelled,
    /// The assigned provider backed out
    Rejected,
    /// The assigned provider never showed up
    ProviderNoShow,
    /// Reset by an admin and re-opened for matching
    ReAssigned,
}

impl BookingStatus {
    /// Storage string for this status (the eight literal wire values)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Assigned => "ASSIGNED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
            Self::ProviderNoShow => "PROVIDER_NO_SHOW",
            Self::ReAssigned => "RE_ASSIGNED",
        }
    }

    /// Whether this status admits no further transitions
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// All statuses, for aggregation queries
    #[must_use]
    pub const fn all() -> [Self; 8] {
        [
            Self::Pending,
            Self::Assigned,
            Self::InProgress,
            Self::Completed,
            Self::Cancelled,
            Self::Rejected,
            Self::ProviderNoShow,
            Self::ReAssigned,
        ]
    }
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ASSIGNED" => Ok(Self::Assigned),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "REJECTED" => Ok(Self::Rejected),
            "PROVIDER_NO_SHOW" => Ok(Self::ProviderNoShow),
            "RE_ASSIGNED" => Ok(Self::ReAssigned),
            _ => Err(AppError::invalid_input(format!(
                "Unknown booking status: {s}"
            ))),
        }
    }
}

/// Who performed a status change
///
/// Distinct from [`UserRole`]: `System` marks engine-initiated changes
/// (manual assignment, retry) and `AdminOverride` marks transitions that
/// bypassed the transition table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingActor {
    Customer,
    Provider,
    Admin,
    System,
    AdminOverride,
}

impl BookingActor {
    /// Storage string for this actor
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "CUSTOMER",
            Self::Provider => "PROVIDER",
            Self::Admin => "ADMIN",
            Self::System => "SYSTEM",
            Self::AdminOverride => "ADMIN_OVERRIDE",
        }
    }
}

impl From<UserRole> for BookingActor {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Customer => Self::Customer,
            UserRole::Provider => Self::Provider,
            UserRole::Admin => Self::Admin,
        }
    }
}

impl Display for BookingActor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingActor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CUSTOMER" => Ok(Self::Customer),
            "PROVIDER" => Ok(Self::Provider),
            "ADMIN" => Ok(Self::Admin),
            "SYSTEM" => Ok(Self::System),
            "ADMIN_OVERRIDE" => Ok(Self::AdminOverride),
            _ => Err(AppError::invalid_input(format!(
                "Unknown booking actor: {s}"
            ))),
        }
    }
}

/// Service address supplied by the customer at creation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Immutable record of a status change
///
/// Events are append-only and never truncated. A rejection appends an event
/// carrying the booking's current status as a no-op marker, so the event log
/// records every provider decision even when status does not move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingEvent {
    /// Status being entered (may equal the current status for rejections)
    pub status: BookingStatus,
    /// Actor that triggered the change
    pub changed_by: BookingActor,
    /// Optional free-text note (e.g. cancellation reason)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Append-time clock reading, non-decreasing within a booking
    pub timestamp: DateTime<Utc>,
}

impl BookingEvent {
    /// Create an event stamped with the current time
    #[must_use]
    pub fn now(status: BookingStatus, changed_by: BookingActor, note: Option<String>) -> Self {
        Self {
            status,
            changed_by,
            note,
            timestamp: Utc::now(),
        }
    }
}

/// The booking aggregate root
///
/// Loaded and stored as a whole; `status` is only ever mutated through the
/// lifecycle engine, which validates against the transition table before any
/// persistence happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier, assigned at creation
    pub id: Uuid,
    /// Owning customer, immutable after creation
    pub customer_id: Uuid,
    /// Assigned provider; `None` until assignment, cleared on retry
    pub provider_id: Option<Uuid>,
    /// Catalog entry booked, immutable
    pub service_type_id: String,
    /// Requested service time
    pub scheduled_date: DateTime<Utc>,
    /// Where the work happens
    pub address: Address,
    /// Customer notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Catalog base price snapshot taken at creation; never recomputed
    pub total_price: i64,
    /// Current lifecycle status
    pub status: BookingStatus,
    /// Providers who declined this booking; deduplicated, reset on retry
    pub rejected_providers: Vec<Uuid>,
    /// Append-only status history; non-empty from creation onward
    pub events: Vec<BookingEvent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a fresh PENDING booking with its creation event
    #[must_use]
    pub fn new(
        customer_id: Uuid,
        service_type_id: String,
        scheduled_date: DateTime<Utc>,
        address: Address,
        notes: Option<String>,
        total_price: i64,
        created_by: BookingActor,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id,
            provider_id: None,
            service_type_id,
            scheduled_date,
            address,
            notes,
            total_price,
            status: BookingStatus::Pending,
            rejected_providers: Vec::new(),
            events: vec![BookingEvent::now(BookingStatus::Pending, created_by, None)],
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the given provider already declined this booking
    #[must_use]
    pub fn has_rejected(&self, provider_id: Uuid) -> bool {
        self.rejected_providers.contains(&provider_id)
    }
}

/// A registered user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    /// Required for providers, absent otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_area: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user account
    ///
    /// # Errors
    ///
    /// Returns an error if the account is a provider without a service area.
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        role: UserRole,
        service_area: Option<String>,
    ) -> AppResult<Self> {
        if role == UserRole::Provider && service_area.is_none() {
            return Err(AppError::invalid_input("Provider must have a service area"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            role,
            service_area,
            created_at: Utc::now(),
        })
    }
}

/// Service catalog category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    Cleaning,
    RepairMaintenance,
    BeautyWellness,
}

/// A bookable catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct ServiceType {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ServiceCategory,
    /// Base price in the smallest currency unit
    pub base_price: i64,
}
