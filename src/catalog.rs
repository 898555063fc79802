// ABOUTME: Static service catalog consulted at booking creation time
// ABOUTME: Provides catalog listing and base price lookup for price snapshots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! Service catalog
//!
//! The catalog is static configuration data. A booking snapshots the base
//! price of its catalog entry at creation; the snapshot is never recomputed.

use crate::errors::{AppError, AppResult};
use crate::models::{ServiceCategory, ServiceType};

/// All bookable service types, keyed by stable string id
pub const SERVICE_TYPES: &[ServiceType] = &[
    ServiceType {
        id: "cleaning-basic",
        name: "Basic Home Cleaning",
        category: ServiceCategory::Cleaning,
        base_price: 500,
    },
    ServiceType {
        id: "cleaning-deep",
        name: "Deep Cleaning",
        category: ServiceCategory::Cleaning,
        base_price: 1200,
    },
    ServiceType {
        id: "cleaning-kitchen",
        name: "Kitchen Cleaning",
        category: ServiceCategory::Cleaning,
        base_price: 800,
    },
    ServiceType {
        id: "cleaning-bathroom",
        name: "Bathroom Cleaning",
        category: ServiceCategory::Cleaning,
        base_price: 700,
    },
    ServiceType {
        id: "repair-electric",
        name: "Electrical Repair",
        category: ServiceCategory::RepairMaintenance,
        base_price: 600,
    },
    ServiceType {
        id: "repair-plumbing",
        name: "Plumbing Repair",
        category: ServiceCategory::RepairMaintenance,
        base_price: 650,
    },
    ServiceType {
        id: "repair-ac",
        name: "AC Repair & Service",
        category: ServiceCategory::RepairMaintenance,
        base_price: 1500,
    },
    ServiceType {
        id: "repair-appliance",
        name: "Appliance Repair",
        category: ServiceCategory::RepairMaintenance,
        base_price: 1000,
    },
    ServiceType {
        id: "beauty-haircut",
        name: "Haircut at Home",
        category: ServiceCategory::BeautyWellness,
        base_price: 400,
    },
    ServiceType {
        id: "beauty-facial",
        name: "Facial & Skincare",
        category: ServiceCategory::BeautyWellness,
        base_price: 900,
    },
    ServiceType {
        id: "beauty-massage",
        name: "Body Massage",
        category: ServiceCategory::BeautyWellness,
        base_price: 1200,
    },
    ServiceType {
        id: "beauty-makeup",
        name: "Party Makeup",
        category: ServiceCategory::BeautyWellness,
        base_price: 2000,
    },
];

/// Look up a catalog entry by id
#[must_use]
pub fn find(service_type_id: &str) -> Option<&'static ServiceType> {
    SERVICE_TYPES.iter().find(|s| s.id == service_type_id)
}

/// Look up a catalog entry, surfacing a validation error for unknown ids
///
/// # Errors
///
/// Returns `InvalidInput` (400) when the id is not in the catalog. This is
/// checked before any persistence at booking creation.
pub fn lookup(service_type_id: &str) -> AppResult<&'static ServiceType> {
    find(service_type_id)
        .ok_or_else(|| AppError::invalid_input(format!("Invalid service type: {service_type_id}")))
}
