// ABOUTME: Session cookie helpers
// ABOUTME: Reads cookies from request headers and builds the Set-Cookie values for login and logout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use http::{header, HeaderMap, HeaderValue};

use fitplan_core::errors::{AppError, AppResult};

/// Name of the session cookie
pub const AUTH_COOKIE_NAME: &str = "auth";

/// Find a cookie value by name across all `Cookie` headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_owned())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that stores a session token
///
/// # Errors
///
/// Returns an internal error if the token contains bytes not allowed in a header
pub fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> AppResult<HeaderValue> {
    let secure_attr = if secure { "; Secure" } else { "" };
    HeaderValue::from_str(&format!(
        "{AUTH_COOKIE_NAME}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age_secs}{secure_attr}"
    ))
    .map_err(|e| AppError::internal(format!("Invalid session cookie: {e}")))
}

/// `Set-Cookie` value that removes the session cookie
#[must_use]
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("auth=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("auth=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cookie_value_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth=abc.def.ghi; lang=en"),
        );
        assert_eq!(
            get_cookie_value(&headers, AUTH_COOKIE_NAME).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", 604_800, true).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("auth=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
