// ABOUTME: Error handling re-exported from the fitplan-core foundation crate
// ABOUTME: Keeps crate::errors paths available to binaries and integration tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! `AppError`, `ErrorCode`, and `AppResult` live in `fitplan-core` so the
//! models can return them without depending on this crate.

pub use fitplan_core::errors::{AppError, AppResult, ErrorCode};
