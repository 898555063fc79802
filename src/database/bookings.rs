// ABOUTME: Booking aggregate persistence - rows, event log, rejection ledger
// ABOUTME: Commits transitions with a conditional update keyed on expected status
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{QueryBuilder, Row, Sqlite};
use uuid::Uuid;

use super::Database;
use crate::models::{Address, Booking, BookingActor, BookingEvent, BookingStatus};

/// Filter for booking listings
#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub customer_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
    /// Exclude bookings this provider already rejected (available-jobs view)
    pub not_rejected_by: Option<Uuid>,
    pub page: u32,
    pub limit: u32,
}

/// One page of a booking listing
#[derive(Debug, Serialize)]
pub struct BookingPage {
    pub data: Vec<Booking>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// Dashboard aggregation over all bookings
#[derive(Debug, Serialize)]
pub struct BookingStats {
    pub total_bookings: i64,
    pub active_providers: i64,
    /// Sum of `total_price` over COMPLETED bookings
    pub total_revenue: i64,
    /// Completed / total, as a whole percentage
    pub completion_rate: i64,
    /// count(REJECTED) + count(PROVIDER_NO_SHOW)
    pub requires_attention: i64,
    pub bookings_by_status: std::collections::HashMap<String, i64>,
}

/// Per-provider aggregation
#[derive(Debug, Serialize)]
pub struct ProviderStats {
    pub completed_bookings: i64,
    pub in_progress_jobs: i64,
    pub total_earnings: i64,
}

impl Database {
    /// Create booking, event, and rejection-ledger tables
    pub(super) async fn migrate_bookings(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL REFERENCES users(id),
                provider_id TEXT REFERENCES users(id),
                service_type_id TEXT NOT NULL,
                scheduled_date DATETIME NOT NULL,
                street TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                postal_code TEXT NOT NULL,
                unit TEXT,
                address_notes TEXT,
                notes TEXT,
                total_price INTEGER NOT NULL DEFAULT 0 CHECK (total_price >= 0),
                status TEXT NOT NULL CHECK (status IN (
                    'PENDING', 'ASSIGNED', 'IN_PROGRESS', 'COMPLETED',
                    'CANCELLED', 'REJECTED', 'PROVIDER_NO_SHOW', 'RE_ASSIGNED'
                )),
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Append-only event log; (booking_id, seq) fixes the order.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS booking_events (
                booking_id TEXT NOT NULL REFERENCES bookings(id),
                seq INTEGER NOT NULL,
                status TEXT NOT NULL,
                changed_by TEXT NOT NULL,
                note TEXT,
                timestamp DATETIME NOT NULL,
                PRIMARY KEY (booking_id, seq)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Rejection ledger; the primary key makes ledger adds idempotent.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS booking_rejections (
                booking_id TEXT NOT NULL REFERENCES bookings(id),
                provider_id TEXT NOT NULL REFERENCES users(id),
                rejected_at DATETIME NOT NULL,
                PRIMARY KEY (booking_id, provider_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_customer ON bookings(customer_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_provider ON bookings(provider_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Persist a freshly created booking with its creation event
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails (e.g. unknown customer id).
    pub async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO bookings (
                id, customer_id, provider_id, service_type_id, scheduled_date,
                street, city, state, postal_code, unit, address_notes,
                notes, total_price, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(booking.id.to_string())
        .bind(booking.customer_id.to_string())
        .bind(booking.provider_id.map(|p| p.to_string()))
        .bind(&booking.service_type_id)
        .bind(booking.scheduled_date)
        .bind(&booking.address.street)
        .bind(&booking.address.city)
        .bind(&booking.address.state)
        .bind(&booking.address.postal_code)
        .bind(booking.address.unit.as_deref())
        .bind(booking.address.notes.as_deref())
        .bind(booking.notes.as_deref())
        .bind(booking.total_price)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await?;

        for (seq, event) in booking.events.iter().enumerate() {
            insert_event(&mut tx, booking.id, seq, event).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Load a booking aggregate: row, ordered events, rejection ledger
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value fails to decode into the domain
    /// types.
    pub async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.hydrate_booking(&row).await?)),
            None => Ok(None),
        }
    }

    /// Commit a mutated aggregate
    ///
    /// The row update is conditional on the status the engine loaded
    /// (`expected_status`); if another writer moved the booking in between,
    /// nothing is written and `Ok(false)` is returned. New events
    /// (`events[prior_events..]`) and the current rejection ledger ride the
    /// same transaction, so assignment and status change are atomic.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement in the transaction fails.
    pub async fn commit_transition(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
        prior_events: usize,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE bookings
            SET provider_id = ?, status = ?, updated_at = ?
            WHERE id = ? AND status = ?
            ",
        )
        .bind(booking.provider_id.map(|p| p.to_string()))
        .bind(booking.status.as_str())
        .bind(booking.updated_at)
        .bind(booking.id.to_string())
        .bind(expected_status.as_str())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        for (seq, event) in booking.events.iter().enumerate().skip(prior_events) {
            insert_event(&mut tx, booking.id, seq, event).await?;
        }

        if booking.rejected_providers.is_empty() {
            // Retry is the only path that empties the ledger.
            sqlx::query("DELETE FROM booking_rejections WHERE booking_id = ?")
                .bind(booking.id.to_string())
                .execute(&mut *tx)
                .await?;
        } else {
            for provider_id in &booking.rejected_providers {
                sqlx::query(
                    r"
                    INSERT OR IGNORE INTO booking_rejections
                        (booking_id, provider_id, rejected_at)
                    VALUES (?, ?, ?)
                    ",
                )
                .bind(booking.id.to_string())
                .bind(provider_id.to_string())
                .bind(Utc::now())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Filtered, paginated booking listing, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the query or row decoding fails.
    pub async fn list_bookings(&self, filter: &BookingFilter) -> Result<BookingPage> {
        let limit = i64::from(filter.limit.max(1));
        let page = i64::from(filter.page.max(1));
        let offset = (page - 1) * limit;

        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM bookings WHERE 1 = 1");
        push_filter(&mut query, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query.build().fetch_all(&self.pool).await?;
        let mut data = Vec::with_capacity(rows.len());
        for row in &rows {
            data.push(self.hydrate_booking(row).await?);
        }

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM bookings WHERE 1 = 1");
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(BookingPage {
            data,
            total,
            page: filter.page.max(1),
            limit: filter.limit.max(1),
            total_pages: (total + limit - 1) / limit,
        })
    }

    /// Count bookings, optionally restricted to one status
    pub async fn count_bookings(&self, status: Option<BookingStatus>) -> Result<i64> {
        let count: i64 = match status {
            Some(status) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE status = ?")
                    .bind(status.as_str())
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    /// Dashboard aggregation: totals, per-status counts, revenue
    ///
    /// # Errors
    ///
    /// Returns an error if an aggregation query fails.
    pub async fn booking_stats(&self) -> Result<BookingStats> {
        let total = self.count_bookings(None).await?;

        let mut by_status = std::collections::HashMap::new();
        for status in BookingStatus::all() {
            by_status.insert(
                status.as_str().to_owned(),
                self.count_bookings(Some(status)).await?,
            );
        }

        let completed = by_status[BookingStatus::Completed.as_str()];
        let rejected = by_status[BookingStatus::Rejected.as_str()];
        let no_show = by_status[BookingStatus::ProviderNoShow.as_str()];

        let total_revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_price), 0) FROM bookings WHERE status = ?",
        )
        .bind(BookingStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(BookingStats {
            total_bookings: total,
            active_providers: self.count_providers().await?,
            total_revenue,
            completion_rate: if total > 0 {
                completed * 100 / total
            } else {
                0
            },
            requires_attention: rejected + no_show,
            bookings_by_status: by_status,
        })
    }

    /// Per-provider aggregation over completed and in-progress work
    ///
    /// # Errors
    ///
    /// Returns an error if an aggregation query fails.
    pub async fn provider_stats(&self, provider_id: Uuid) -> Result<ProviderStats> {
        let (completed_bookings, total_earnings): (i64, i64) = sqlx::query_as(
            r"
            SELECT COUNT(*), COALESCE(SUM(total_price), 0)
            FROM bookings WHERE provider_id = ? AND status = ?
            ",
        )
        .bind(provider_id.to_string())
        .bind(BookingStatus::Completed.as_str())
        .fetch_one(&self.pool)
        .await?;

        let in_progress_jobs: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE provider_id = ? AND status = ?",
        )
        .bind(provider_id.to_string())
        .bind(BookingStatus::InProgress.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(ProviderStats {
            completed_bookings,
            in_progress_jobs,
            total_earnings,
        })
    }

    /// Decode a booking row and attach its events and rejection ledger
    async fn hydrate_booking(&self, row: &sqlx::sqlite::SqliteRow) -> Result<Booking> {
        let id: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id)?;

        let events = self.booking_event_rows(id).await?;
        let rejected_providers = self.rejection_ledger(id).await?;

        let customer_id: String = row.try_get("customer_id")?;
        let provider_id: Option<String> = row.try_get("provider_id")?;
        let status: String = row.try_get("status")?;

        Ok(Booking {
            id,
            customer_id: Uuid::parse_str(&customer_id)?,
            provider_id: provider_id.as_deref().map(Uuid::parse_str).transpose()?,
            service_type_id: row.try_get("service_type_id")?,
            scheduled_date: row.try_get("scheduled_date")?,
            address: Address {
                street: row.try_get("street")?,
                city: row.try_get("city")?,
                state: row.try_get("state")?,
                postal_code: row.try_get("postal_code")?,
                unit: row.try_get("unit")?,
                notes: row.try_get("address_notes")?,
            },
            notes: row.try_get("notes")?,
            total_price: row.try_get("total_price")?,
            status: BookingStatus::from_str(&status).map_err(|e| anyhow!("{e}"))?,
            rejected_providers,
            events,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    /// Ordered event log for one booking
    async fn booking_event_rows(&self, booking_id: Uuid) -> Result<Vec<BookingEvent>> {
        let rows = sqlx::query(
            r"
            SELECT status, changed_by, note, timestamp
            FROM booking_events WHERE booking_id = ? ORDER BY seq ASC
            ",
        )
        .bind(booking_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                let changed_by: String = row.try_get("changed_by")?;
                let note: Option<String> = row.try_get("note")?;
                let timestamp: DateTime<Utc> = row.try_get("timestamp")?;
                Ok(BookingEvent {
                    status: BookingStatus::from_str(&status).map_err(|e| anyhow!("{e}"))?,
                    changed_by: BookingActor::from_str(&changed_by).map_err(|e| anyhow!("{e}"))?,
                    note,
                    timestamp,
                })
            })
            .collect()
    }

    /// Providers recorded in the rejection ledger for one booking
    async fn rejection_ledger(&self, booking_id: Uuid) -> Result<Vec<Uuid>> {
        let rows: Vec<String> = sqlx::query_scalar(
            r"
            SELECT provider_id FROM booking_rejections
            WHERE booking_id = ? ORDER BY rejected_at ASC
            ",
        )
        .bind(booking_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|s| Uuid::parse_str(s).map_err(Into::into))
            .collect()
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &BookingFilter) {
    if let Some(customer_id) = filter.customer_id {
        query.push(" AND customer_id = ");
        query.push_bind(customer_id.to_string());
    }
    if let Some(provider_id) = filter.provider_id {
        query.push(" AND provider_id = ");
        query.push_bind(provider_id.to_string());
    }
    if let Some(status) = filter.status {
        query.push(" AND status = ");
        query.push_bind(status.as_str());
    }
    if let Some(provider_id) = filter.not_rejected_by {
        query.push(
            " AND NOT EXISTS (SELECT 1 FROM booking_rejections r \
             WHERE r.booking_id = bookings.id AND r.provider_id = ",
        );
        query.push_bind(provider_id.to_string());
        query.push(")");
    }
}

async fn insert_event(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    booking_id: Uuid,
    seq: usize,
    event: &BookingEvent,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO booking_events (booking_id, seq, status, changed_by, note, timestamp)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(booking_id.to_string())
    .bind(i64::try_from(seq)?)
    .bind(event.status.as_str())
    .bind(event.changed_by.as_str())
    .bind(event.note.as_deref())
    .bind(event.timestamp)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
