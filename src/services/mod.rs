// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Each service takes the database (and the AI provider where needed) explicitly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Domain service layer
//!
//! Route handlers authenticate and parse requests, then call into these
//! functions. Services never see HTTP types, so the integration tests and the
//! demo seeder drive the same code paths the API does.

/// Registration, login, profile validation, and coach approval
pub mod accounts;

/// Constitution questionnaire scoring
pub mod assessment;

/// Coach report creation, AI analysis, and chat
pub mod coach;

/// AI weekly plan generation and chat revision
pub mod plans;

/// Posture photo validation and AI analysis
pub mod posture;

/// Badge redemption and tier progress
pub mod rewards;

/// Weekly checklists and point accounting
pub mod todos;

/// Weekly completion report with week-over-week comparison
pub mod weekly_report;
