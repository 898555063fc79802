// ABOUTME: Integration tests for marketplace and per-provider aggregations
// ABOUTME: Drives bookings through the engine, then checks the stats queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

mod common;

use common::{create_booking, create_user, ctx_for, setup};
use homeserve_server::models::{BookingStatus, UserRole};

#[tokio::test]
async fn test_booking_stats_aggregation() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();

    // One completed, one cancelled, one left pending.
    let completed = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .accept_job(ctx_for(&provider), completed.id)
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&provider),
            completed.id,
            BookingStatus::InProgress,
            None,
        )
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&provider),
            completed.id,
            BookingStatus::Completed,
            None,
        )
        .await
        .unwrap();

    let cancelled = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .cancel(ctx_for(&customer), cancelled.id, None)
        .await
        .unwrap();

    create_booking(&harness, &customer).await.unwrap();

    let stats = harness.database.booking_stats().await.unwrap();
    assert_eq!(stats.total_bookings, 3);
    assert_eq!(stats.active_providers, 1);
    assert_eq!(stats.total_revenue, 500);
    assert_eq!(stats.completion_rate, 33);
    assert_eq!(stats.requires_attention, 0);
    assert_eq!(stats.bookings_by_status.get("COMPLETED"), Some(&1));
    assert_eq!(stats.bookings_by_status.get("CANCELLED"), Some(&1));
    assert_eq!(stats.bookings_by_status.get("PENDING"), Some(&1));
}

#[tokio::test]
async fn test_requires_attention_counts_stuck_bookings() {
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

    let no_show = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .accept_job(ctx_for(&provider), no_show.id)
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&provider),
            no_show.id,
            BookingStatus::InProgress,
            None,
        )
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&provider),
            no_show.id,
            BookingStatus::ProviderNoShow,
            None,
        )
        .await
        .unwrap();

    let rejected = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .accept_job(ctx_for(&provider), rejected.id)
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&provider),
            rejected.id,
            BookingStatus::Rejected,
            None,
        )
        .await
        .unwrap();

    let stats = harness.database.booking_stats().await.unwrap();
    assert_eq!(stats.requires_attention, 2);

    // Both can be recovered by an admin retry.
    harness
        .engine
        .retry(ctx_for(&admin), no_show.id)
        .await
        .unwrap();
    let stats = harness.database.booking_stats().await.unwrap();
    assert_eq!(stats.requires_attention, 1);
}

#[tokio::test]
async fn test_provider_stats() {
    let harness = setup().await.unwrap();
    let customer = create_user(&harness.database, UserRole::Customer)
        .await
        .unwrap();
    let provider = create_user(&harness.database, UserRole::Provider)
        .await
        .unwrap();

    let done = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .accept_job(ctx_for(&provider), done.id)
        .await
        .unwrap();
    harness
        .engine
        .update_status(ctx_for(&provider), done.id, BookingStatus::InProgress, None)
        .await
        .unwrap();
    harness
        .engine
        .update_status(ctx_for(&provider), done.id, BookingStatus::Completed, None)
        .await
        .unwrap();

    let running = create_booking(&harness, &customer).await.unwrap();
    harness
        .engine
        .accept_job(ctx_for(&provider), running.id)
        .await
        .unwrap();
    harness
        .engine
        .update_status(
            ctx_for(&provider),
            running.id,
            BookingStatus::InProgress,
            None,
        )
        .await
        .unwrap();

    let stats = harness.database.provider_stats(provider.id).await.unwrap();
    assert_eq!(stats.completed_bookings, 1);
    assert_eq!(stats.in_progress_jobs, 1);
    assert_eq!(stats.total_earnings, 500);
}
