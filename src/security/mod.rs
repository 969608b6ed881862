// ABOUTME: HTTP security hardening for the JSON API
// ABOUTME: Response security headers per environment and session cookie helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Security Headers
//!
//! The API serves JSON only, so the policy is strict: nothing may frame a
//! response, content types are not sniffed, and no resources are loadable.
//! HSTS is added in production where the server sits behind TLS.

/// Session cookie parsing and construction
pub mod cookies;

use axum::Router;
use http::{header, HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::Environment;

/// Security header values for one environment
#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    /// `Content-Security-Policy`
    pub csp: &'static str,
    /// `X-Frame-Options`
    pub frame_options: &'static str,
    /// `Referrer-Policy`
    pub referrer_policy: &'static str,
    /// `Strict-Transport-Security`, production only
    pub hsts: Option<&'static str>,
}

impl SecurityHeaders {
    /// Header set for a deployment environment
    #[must_use]
    pub const fn for_environment(environment: Environment) -> Self {
        Self {
            csp: "default-src 'none'; frame-ancestors 'none'",
            frame_options: "DENY",
            referrer_policy: "strict-origin-when-cross-origin",
            hsts: if environment.is_production() {
                Some("max-age=31536000; includeSubDomains")
            } else {
                None
            },
        }
    }

    /// Header name/value pairs to attach to every response
    #[must_use]
    pub fn to_headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        let mut headers = vec![
            (
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(self.csp),
            ),
            (
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static(self.frame_options),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
            (
                header::REFERRER_POLICY,
                HeaderValue::from_static(self.referrer_policy),
            ),
        ];
        if let Some(hsts) = self.hsts {
            headers.push((
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static(hsts),
            ));
        }
        headers
    }
}

/// Attach the security headers for `environment` to every response of `router`
#[must_use]
pub fn apply_security_headers(router: Router, environment: Environment) -> Router {
    SecurityHeaders::for_environment(environment)
        .to_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
}
