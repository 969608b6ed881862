// ABOUTME: Request tracing helpers for correlation and structured logging
// ABOUTME: Builds one span per HTTP request keyed by the x-request-id header
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use axum::http::Request;
use tracing::Span;
use uuid::Uuid;

/// Header carrying the request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create the span for an HTTP request
///
/// The request id is set upstream by `SetRequestIdLayer`; `user_id` is filled
/// in once the session is authenticated.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
        user_id = tracing::field::Empty,
    )
}

/// Record the authenticated user on the current span
pub fn record_user_in_span(user_id: Uuid) {
    Span::current().record("user_id", tracing::field::display(user_id));
}
