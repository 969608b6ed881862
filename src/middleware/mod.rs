// ABOUTME: HTTP middleware for session authentication, CORS, and request tracing
// ABOUTME: Resolves the calling user and builds per-request spans carrying the request id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Session authentication and role guards
pub mod auth;
/// Cross-origin configuration
pub mod cors;
/// Request spans and correlation ids
pub mod tracing;

// Authentication middleware
pub use auth::{require_role, SessionAuthenticator};

// CORS configuration
pub use cors::setup_cors;

// Request tracing
pub use tracing::{make_request_span, record_user_in_span, REQUEST_ID_HEADER};
