// ABOUTME: Core types and constants for the FitPlan wellness platform
// ABOUTME: Foundation crate with error handling, domain models, and reward constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # FitPlan Core
//!
//! Foundation crate providing shared types and constants for the FitPlan
//! server. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and HTTP responses
//! - **constants**: Point values, reward tiers, and badge prices
//! - **models**: Users, assessments, plans, checklists, rewards, and coach reports

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models shared by the database, services, and routes
pub mod models;
