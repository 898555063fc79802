// ABOUTME: Booking lifecycle engine - guarded transitions, event log, rejections
// ABOUTME: Every status mutation is validated, appended to the log, then committed
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! # Booking Lifecycle Engine
//!
//! All booking mutations flow through this engine: validate against the
//! transition table (or exercise admin override), append to the event log,
//! persist. Validation happens strictly before mutation, so a rejected
//! transition leaves both status and event log untouched.
//!
//! ## Concurrency
//!
//! Each operation is a single read-modify-write against one booking. A
//! per-booking async mutex serializes in-process operations, and the store
//! commits with a conditional update keyed on the expected current status,
//! so a stale write can never clobber a concurrent transition.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::catalog;
use crate::context::ActorContext;
use crate::database::{BookingFilter, BookingPage, Database};
use crate::errors::{AppError, AppResult};
use crate::lifecycle::transitions::can_transition;
use crate::models::{
    Address, Booking, BookingActor, BookingEvent, BookingStatus, UserRole,
};

/// Parameters for creating a booking
#[derive(Debug, Clone)]
pub struct CreateBooking {
    pub service_type_id: String,
    pub scheduled_date: chrono::DateTime<chrono::Utc>,
    pub address: Address,
    pub notes: Option<String>,
}

/// Listing scope requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListScope {
    /// Bookings belonging to the caller (customer-owned or provider-assigned)
    #[default]
    Mine,
    /// For providers: the available-jobs pool; for admins: everything
    All,
}

/// Booking lifecycle engine
///
/// Cheap to clone; shares the database handle and the lock registry.
#[derive(Clone)]
pub struct LifecycleEngine {
    database: Arc<Database>,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl LifecycleEngine {
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        Self {
            database,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Serialize operations on a single booking
    async fn lock_booking(&self, id: Uuid) -> tokio::sync::OwnedMutexGuard<()> {
        // Clone the Arc out before awaiting so the shard guard is released.
        let mutex = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    async fn load(&self, id: Uuid) -> AppResult<Booking> {
        self.database
            .get_booking(id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking"))
    }

    /// Append an event and advance status
    ///
    /// The single mutation point for normal transitions; rejection appends
    /// go through [`Self::reject_job`] which leaves status unchanged.
    fn append_event(
        booking: &mut Booking,
        status: BookingStatus,
        changed_by: BookingActor,
        note: Option<String>,
    ) {
        booking.events.push(BookingEvent::now(status, changed_by, note));
        booking.status = status;
        booking.updated_at = chrono::Utc::now();
    }

    /// Create a PENDING booking, snapshotting the catalog base price
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an unknown service type; nothing is
    /// persisted in that case.
    #[instrument(skip(self, request), fields(actor = %ctx.actor_id))]
    pub async fn create_booking(
        &self,
        ctx: ActorContext,
        request: CreateBooking,
    ) -> AppResult<Booking> {
        let service_type = catalog::lookup(&request.service_type_id)?;

        let booking = Booking::new(
            ctx.actor_id,
            request.service_type_id,
            request.scheduled_date,
            request.address,
            request.notes,
            service_type.base_price,
            BookingActor::from(ctx.role),
        );

        self.database.insert_booking(&booking).await?;
        info!(booking_id = %booking.id, service = service_type.id, "booking created");
        Ok(booking)
    }

    /// Fetch a booking the caller is allowed to see
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for unknown ids; `PermissionDenied` when a
    /// customer or provider asks for someone else's booking.
    pub async fn get_booking(&self, ctx: ActorContext, id: Uuid) -> AppResult<Booking> {
        let booking = self.load(id).await?;

        match ctx.role {
            UserRole::Customer if booking.customer_id != ctx.actor_id => {
                Err(AppError::forbidden("Not your booking"))
            }
            UserRole::Provider if booking.provider_id != Some(ctx.actor_id) => {
                Err(AppError::forbidden("Not your booking"))
            }
            _ => Ok(booking),
        }
    }

    /// Role-scoped booking listing
    ///
    /// Customers always see their own bookings. Providers see assigned jobs
    /// (`Mine`) or the PENDING pool minus bookings they already rejected
    /// (`All`). Admins see everything.
    pub async fn list_bookings(
        &self,
        ctx: ActorContext,
        scope: ListScope,
        status: Option<BookingStatus>,
        page: u32,
        limit: u32,
    ) -> AppResult<BookingPage> {
        let mut filter = BookingFilter {
            status,
            page,
            limit,
            ..BookingFilter::default()
        };

        match (ctx.role, scope) {
            (UserRole::Customer, _) => filter.customer_id = Some(ctx.actor_id),
            (UserRole::Provider, ListScope::Mine) => filter.provider_id = Some(ctx.actor_id),
            (UserRole::Provider, ListScope::All) => {
                // Available jobs: PENDING and not previously rejected by this
                // provider (Rejection Ledger query path).
                filter.status = Some(BookingStatus::Pending);
                filter.not_rejected_by = Some(ctx.actor_id);
            }
            (UserRole::Admin, _) => {}
        }

        Ok(self.database.list_bookings(&filter).await?)
    }

    /// Audit trail for a booking
    ///
    /// # Errors
    ///
    /// `ResourceNotFound` for unknown ids.
    pub async fn booking_events(&self, ctx: ActorContext, id: Uuid) -> AppResult<Vec<BookingEvent>> {
        Ok(self.get_booking(ctx, id).await?.events)
    }

    /// Guarded status transition, with admin override
    ///
    /// Non-admin callers must pass the transition table; admins may force
    /// any transition from a non-terminal status, recorded as
    /// `ADMIN_OVERRIDE`.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when the table rejects the move (or the booking
    /// is terminal); `ResourceNotFound` for unknown ids. On error no state
    /// is mutated.
    #[instrument(skip(self, note), fields(actor = %ctx.actor_id, role = %ctx.role))]
    pub async fn update_status(
        &self,
        ctx: ActorContext,
        id: Uuid,
        requested: BookingStatus,
        note: Option<String>,
    ) -> AppResult<Booking> {
        let _guard = self.lock_booking(id).await;
        let mut booking = self.load(id).await?;
        let current = booking.status;

        let actor = if ctx.is_admin() {
            // Terminal bookings stay frozen even for admins; everything else
            // is overridable and audit-marked as such.
            if current.is_terminal() {
                return Err(AppError::invalid_transition(
                    current.as_str(),
                    requested.as_str(),
                ));
            }
            if !can_transition(current, requested) {
                warn!(booking_id = %id, from = %current, to = %requested, "admin override");
            }
            BookingActor::AdminOverride
        } else {
            if !can_transition(current, requested) {
                return Err(AppError::invalid_transition(
                    current.as_str(),
                    requested.as_str(),
                ));
            }
            BookingActor::from(ctx.role)
        };

        let prior_events = booking.events.len();
        Self::append_event(&mut booking, requested, actor, note);
        self.commit(&booking, current, prior_events).await?;

        info!(booking_id = %id, from = %current, to = %requested, "status updated");
        Ok(booking)
    }

    /// Cancel a booking (guarded CANCELLED transition)
    ///
    /// # Errors
    ///
    /// `InvalidTransition` when CANCELLED is not reachable from the current
    /// status and the caller is not admin.
    pub async fn cancel(
        &self,
        ctx: ActorContext,
        id: Uuid,
        reason: Option<String>,
    ) -> AppResult<Booking> {
        self.update_status(ctx, id, BookingStatus::Cancelled, reason)
            .await
    }

    /// Provider self-accept: bind the caller and advance to ASSIGNED
    ///
    /// Assignment and status change commit as one atomic update; no
    /// observer sees `provider_id` set while status is still PENDING.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-providers; `InvalidTransition` when
    /// ASSIGNED is not reachable from the current status.
    #[instrument(skip(self), fields(provider = %ctx.actor_id))]
    pub async fn accept_job(&self, ctx: ActorContext, id: Uuid) -> AppResult<Booking> {
        ctx.require_role(UserRole::Provider)?;

        let _guard = self.lock_booking(id).await;
        let mut booking = self.load(id).await?;
        let current = booking.status;

        if !can_transition(current, BookingStatus::Assigned) {
            return Err(AppError::invalid_transition(
                current.as_str(),
                BookingStatus::Assigned.as_str(),
            ));
        }

        let prior_events = booking.events.len();
        booking.provider_id = Some(ctx.actor_id);
        Self::append_event(
            &mut booking,
            BookingStatus::Assigned,
            BookingActor::Provider,
            None,
        );
        self.commit(&booking, current, prior_events).await?;

        info!(booking_id = %id, "provider accepted job");
        Ok(booking)
    }

    /// Provider soft-reject: record the provider in the rejection ledger
    ///
    /// Status never changes here. The appended event carries the current
    /// status as a no-op marker. The ledger add is idempotent, but every
    /// call still appends an event for audit fidelity.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-providers; `InvalidTransition` when the
    /// booking is in neither PENDING nor ASSIGNED.
    #[instrument(skip(self, note), fields(provider = %ctx.actor_id))]
    pub async fn reject_job(
        &self,
        ctx: ActorContext,
        id: Uuid,
        note: Option<String>,
    ) -> AppResult<Booking> {
        ctx.require_role(UserRole::Provider)?;

        let _guard = self.lock_booking(id).await;
        let mut booking = self.load(id).await?;
        let current = booking.status;

        // Rejection is only meaningful while the booking is still matchable
        // or freshly assigned.
        if !matches!(current, BookingStatus::Pending | BookingStatus::Assigned) {
            return Err(AppError::invalid_transition(current.as_str(), "rejected"));
        }

        if !booking.has_rejected(ctx.actor_id) {
            booking.rejected_providers.push(ctx.actor_id);
        }

        let prior_events = booking.events.len();
        booking.events.push(BookingEvent::now(
            current,
            BookingActor::Provider,
            Some(note.unwrap_or_else(|| "Provider rejected job".into())),
        ));
        booking.updated_at = chrono::Utc::now();
        self.commit(&booking, current, prior_events).await?;

        info!(booking_id = %id, "provider rejected job");
        Ok(booking)
    }

    /// Admin retry: reset assignment state and re-open for matching
    ///
    /// The only operation that clears the rejection ledger. The event is
    /// recorded with actor SYSTEM.
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-admins; `InvalidTransition` for terminal
    /// bookings.
    #[instrument(skip(self), fields(actor = %ctx.actor_id))]
    pub async fn retry(&self, ctx: ActorContext, id: Uuid) -> AppResult<Booking> {
        ctx.require_role(UserRole::Admin)?;

        let _guard = self.lock_booking(id).await;
        let mut booking = self.load(id).await?;
        let current = booking.status;

        if current.is_terminal() {
            return Err(AppError::invalid_transition(
                current.as_str(),
                BookingStatus::ReAssigned.as_str(),
            ));
        }

        let prior_events = booking.events.len();
        booking.provider_id = None;
        booking.rejected_providers.clear();
        Self::append_event(
            &mut booking,
            BookingStatus::ReAssigned,
            BookingActor::System,
            None,
        );
        self.commit(&booking, current, prior_events).await?;

        info!(booking_id = %id, "booking reset for re-matching");
        Ok(booking)
    }

    /// Admin manual assignment: bind a provider and advance to ASSIGNED
    ///
    /// Recorded with actor SYSTEM (engine-initiated on the admin's behalf).
    ///
    /// # Errors
    ///
    /// `PermissionDenied` for non-admins; `ResourceNotFound` when the
    /// provider does not exist or is not a provider account;
    /// `InvalidTransition` when ASSIGNED is not reachable.
    #[instrument(skip(self), fields(actor = %ctx.actor_id))]
    pub async fn assign_provider(
        &self,
        ctx: ActorContext,
        id: Uuid,
        provider_id: Uuid,
    ) -> AppResult<Booking> {
        ctx.require_role(UserRole::Admin)?;

        let provider = self
            .database
            .get_user(provider_id)
            .await?
            .ok_or_else(|| AppError::not_found("Provider"))?;
        if provider.role != UserRole::Provider {
            return Err(AppError::not_found("Provider"));
        }

        let _guard = self.lock_booking(id).await;
        let mut booking = self.load(id).await?;
        let current = booking.status;

        if !can_transition(current, BookingStatus::Assigned) {
            return Err(AppError::invalid_transition(
                current.as_str(),
                BookingStatus::Assigned.as_str(),
            ));
        }

        let prior_events = booking.events.len();
        booking.provider_id = Some(provider_id);
        Self::append_event(
            &mut booking,
            BookingStatus::Assigned,
            BookingActor::System,
            None,
        );
        self.commit(&booking, current, prior_events).await?;

        info!(booking_id = %id, provider_id = %provider_id, "provider assigned");
        Ok(booking)
    }

    /// Commit a mutated aggregate, surfacing CAS failures as 409
    async fn commit(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
        prior_events: usize,
    ) -> AppResult<()> {
        let committed = self
            .database
            .commit_transition(booking, expected_status, prior_events)
            .await?;
        if committed {
            Ok(())
        } else {
            // The per-booking lock makes this unreachable in-process; it
            // fires when another process raced us between load and save.
            warn!(booking_id = %booking.id, "conditional update failed");
            Err(AppError::concurrent_update())
        }
    }
}
