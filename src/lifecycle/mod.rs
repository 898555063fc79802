// ABOUTME: Booking lifecycle state machine - transition table, guard, engine
// ABOUTME: All booking status mutations are funneled through this module
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 HomeServe

//! Booking lifecycle state machine

pub mod engine;
pub mod transitions;

pub use engine::{CreateBooking, LifecycleEngine, ListScope};
pub use transitions::{allowed_transitions, can_transition};
