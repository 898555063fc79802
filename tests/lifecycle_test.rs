// ABOUTME: Integration tests for the booking lifecycle engine
// ABOUTME: Covers guarded transitions, event log, rejections, retry, and override
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

mod common;

use common::{create_booking, create_request, create_user, ctx_for, setup};
use homeserve_server::{
    errors::ErrorCode,
    lifecycle::ListScope,
    models::{BookingActor, BookingStatus, UserRole},
};
use uuid::Uuid;

#[tokio::test]
async fn test_booking_starts_pending_with_creation_event() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.customer_id, customer.id);
    assert!(booking.provider_id.is_none());
    assert_eq!(booking.total_price, 500);
    assert_eq!(booking.events.len(), 1);
    assert_eq!(booking.events[0].status, BookingStatus::Pending);
    assert_eq!(booking.events[0].changed_by, BookingActor::Customer);

    // Round-trips through the store intact.
    let loaded = harness
        .engine
        .get_booking(ctx_for(&customer), booking.id)
        .await
        .unwrap();
    assert_eq!(loaded.status, BookingStatus::Pending);
    assert_eq!(loaded.events.len(), 1);
}

#[tokio::test]
async fn test_unknown_service_type_rejected() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();

    let err = harness
        .engine
        .create_booking(ctx_for(&customer), create_request("no-such-service"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidInput);
}

#[tokio::test]
async fn test_full_happy_path() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();

    let booking = harness
        .engine
        .accept_job(ctx_for(&provider), booking.id)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Assigned);
    assert_eq!(booking.provider_id, Some(provider.id));

    let booking = harness
        .engine
        .update_status(
            ctx_for(&provider),
            booking.id,
            BookingStatus::InProgress,
            None,
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::InProgress);

    let booking = harness
        .engine
        .update_status(
            ctx_for(&provider),
            booking.id,
            BookingStatus::Completed,
            None,
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Completed);

    // PENDING, ASSIGNED, IN_PROGRESS, COMPLETED in append order.
    let statuses: Vec<_> = booking.events.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            BookingStatus::Pending,
            BookingStatus::Assigned,
            BookingStatus::InProgress,
            BookingStatus::Completed,
        ]
    );
    for pair in booking.events.windows(2) {
        assert!(pair[0].timestamp <= pair[1].timestamp);
    }
}

#[tokio::test]
async fn test_invalid_transition_leaves_state_untouched() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();

    // PENDING -> COMPLETED is not in the table.
    let err = harness
        .engine
        .update_status(
            ctx_for(&customer),
            booking.id,
            BookingStatus::Completed,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
    assert_eq!(err.http_status(), 400);

    let loaded = harness
        .engine
        .get_booking(ctx_for(&customer), booking.id)
        .await
        .unwrap();
    assert_eq!(loaded.status, BookingStatus::Pending);
    assert_eq!(loaded.events.len(), 1, "failed transition must not log");
}

#[tokio::test]
async fn test_customer_cancels_pending_booking() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();
    let booking = harness
        .engine
        .cancel(
            ctx_for(&customer),
            booking.id,
            Some("change of plans".into()),
        )
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Cancelled);
    let last = booking.events.last().unwrap();
    assert_eq!(last.changed_by, BookingActor::Customer);
    assert_eq!(last.note.as_deref(), Some("change of plans"));
}

#[tokio::test]
async fn test_terminal_booking_is_frozen() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let admin = create_user(&harness.database, UserRole::Admin)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .cancel(ctx_for(&customer), booking.id, None)
        .await
        .unwrap();

    // Not even an admin override can leave a terminal status.
    let err = harness
        .engine
        .update_status(ctx_for(&admin), booking.id, BookingStatus::Pending, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);

    let err = harness
        .engine
        .retry(ctx_for(&admin), booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
}

#[tokio::test]
async fn test_reject_records_ledger_without_status_change() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();
    let admin = create_user(&harness.database, UserRole::Admin)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();
    let booking = harness
        .engine
        .reject_job(ctx_for(&provider), booking.id, Some("too far".into()))
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.rejected_providers, vec![provider.id]);

    // The no-op event carries the unchanged status.
    assert_eq!(booking.events.len(), 2);
    let last = booking.events.last().unwrap();
    assert_eq!(last.status, BookingStatus::Pending);
    assert_eq!(last.changed_by, BookingActor::Provider);
    assert_eq!(last.note.as_deref(), Some("too far"));

    // Rejecting again is a ledger no-op but still lands in the audit log.
    let booking = harness
        .engine
        .reject_job(ctx_for(&provider), booking.id, None)
        .await
        .unwrap();
    assert_eq!(booking.rejected_providers, vec![provider.id]);
    assert_eq!(booking.events.len(), 3);

    // Rejected bookings drop out of that provider's available pool but
    // stay visible to admins.
    let pool = harness
        .engine
        .list_bookings(ctx_for(&provider), ListScope::All, None, 1, 20)
        .await
        .unwrap();
    assert!(pool.data.iter().all(|b| b.id != booking.id));

    let all = harness
        .engine
        .list_bookings(ctx_for(&admin), ListScope::All, None, 1, 20)
        .await
        .unwrap();
    assert!(all.data.iter().any(|b| b.id == booking.id));
}

#[tokio::test]
async fn test_reject_requires_matchable_status() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .accept_job(ctx_for(&provider), booking.id)
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&provider),
            booking.id,
            BookingStatus::InProgress,
            None,
        )
        .await
        .unwrap();

    let err = harness
        .engine
        .reject_job(ctx_for(&provider), booking.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);
}

#[tokio::test]
async fn test_retry_clears_assignment_and_ledger() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();
    let admin = create_user(&harness.database, UserRole::Admin)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .reject_job(ctx_for(&provider), booking.id, None)
        .await
        .unwrap();
    harness
        .engine
        .accept_job(ctx_for(&provider), booking.id)
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&admin),
            booking.id,
            BookingStatus::ProviderNoShow,
            None,
        )
        .await
        .unwrap();

    let booking = harness
        .engine
        .retry(ctx_for(&admin), booking.id)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::ReAssigned);
    assert!(booking.provider_id.is_none());
    assert!(booking.rejected_providers.is_empty(), "retry clears ledger");
    let last = booking.events.last().unwrap();
    assert_eq!(last.changed_by, BookingActor::System);

    // The previously-rejecting provider may accept again.
    let booking = harness
        .engine
        .accept_job(ctx_for(&provider), booking.id)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Assigned);
    assert_eq!(booking.provider_id, Some(provider.id));
}

#[tokio::test]
async fn test_retry_is_admin_only() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();
    let err = harness
        .engine
        .retry(ctx_for(&customer), booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_admin_override_is_audit_marked() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let admin = create_user(&harness.database, UserRole::Admin)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();

    // PENDING -> IN_PROGRESS is not a table edge; only admins may force it.
    let err = harness
        .engine
        .update_status(
            ctx_for(&customer),
            booking.id,
            BookingStatus::InProgress,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);

    let booking = harness
        .engine
        .update_status(
            ctx_for(&admin),
            booking.id,
            BookingStatus::InProgress,
            Some("phone support".into()),
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::InProgress);
    assert_eq!(
        booking.events.last().unwrap().changed_by,
        BookingActor::AdminOverride
    );
}

#[tokio::test]
async fn test_admin_assignment_binds_provider() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();
    let admin = create_user(&harness.database, UserRole::Admin)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();
    let booking = harness
        .engine
        .assign_provider(ctx_for(&admin), booking.id, provider.id)
        .await
        .unwrap();

    assert_eq!(booking.status, BookingStatus::Assigned);
    assert_eq!(booking.provider_id, Some(provider.id));
    assert_eq!(
        booking.events.last().unwrap().changed_by,
        BookingActor::System
    );
}

#[tokio::test]
async fn test_assignment_rejects_non_provider_target() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let admin = create_user(&harness.database, UserRole::Admin)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();

    let err = harness
        .engine
        .assign_provider(ctx_for(&admin), booking.id, customer.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);

    let err = harness
        .engine
        .assign_provider(ctx_for(&admin), booking.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_booking_visibility_is_role_scoped() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let other_customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();

    let err = harness
        .engine
        .get_booking(ctx_for(&other_customer), booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    // An unassigned provider cannot read it directly either.
    let err = harness
        .engine
        .get_booking(ctx_for(&provider), booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    harness
        .engine
        .accept_job(ctx_for(&provider), booking.id)
        .await
        .unwrap();
    let loaded = harness
        .engine
        .get_booking(ctx_for(&provider), booking.id)
        .await
        .unwrap();
    assert_eq!(loaded.provider_id, Some(provider.id));
}

#[tokio::test]
async fn test_listing_pagination() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();

    for _ in 0..5 {
        create_booking(&harness, &customer).await.unwrap();
    }

    let page = harness
        .engine
        .list_bookings(ctx_for(&customer), ListScope::Mine, None, 1, 2)
        .await
        .unwrap();
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);

    let last_page = harness
        .engine
        .list_bookings(ctx_for(&customer), ListScope::Mine, None, 3, 2)
        .await
        .unwrap();
    assert_eq!(last_page.data.len(), 1);
}

#[tokio::test]
async fn test_concurrent_accepts_yield_single_assignee() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider_a = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();
    let provider_b = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();

    let booking = create_booking(&harness, &customer).await.unwrap();

    let (first, second) = tokio::join!(
        harness.engine.accept_job(ctx_for(&provider_a), booking.id),
        harness.engine.accept_job(ctx_for(&provider_b), booking.id),
    );

    // Exactly one accept wins; the loser sees an invalid transition from
    // the already-ASSIGNED status.
    let outcomes = [first.is_ok(), second.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1);

    let admin = create_user(&harness.database, UserRole::Admin)
        .await
        .unwrap();
    let loaded = harness
        .engine
        .get_booking(ctx_for(&admin), booking.id)
        .await
        .unwrap();
    assert_eq!(loaded.status, BookingStatus::Assigned);
    assert!(loaded.provider_id.is_some());
    assert_eq!(loaded.events.len(), 2);
}
