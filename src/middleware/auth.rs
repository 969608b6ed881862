// ABOUTME: Session authentication for API handlers
// ABOUTME: Accepts a Bearer token or the auth cookie, loads the user, and enforces role guards
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use axum::http::HeaderMap;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{Role, User};

use super::tracing::record_user_in_span;
use crate::auth::AuthManager;
use crate::database::Database;
use crate::logging::AppLogger;
use crate::security::cookies::{get_cookie_value, AUTH_COOKIE_NAME};

/// Resolves the user behind a request's session token
#[derive(Clone)]
pub struct SessionAuthenticator {
    auth_manager: AuthManager,
    database: Arc<Database>,
}

impl SessionAuthenticator {
    /// Create an authenticator over the session issuer and user store
    #[must_use]
    pub const fn new(auth_manager: AuthManager, database: Arc<Database>) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Authenticate a request from its headers
    ///
    /// The `Authorization: Bearer` header wins over the `auth` cookie.
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` without credentials, `AuthInvalid`/`AuthExpired`
    /// for a bad token or a deleted account, and `PermissionDenied` for a
    /// coach whose application is not approved
    #[tracing::instrument(skip(self, headers), fields(user_id = tracing::field::Empty))]
    pub async fn authenticate(&self, headers: &HeaderMap) -> AppResult<User> {
        let token = headers
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_owned())
            .or_else(|| get_cookie_value(headers, AUTH_COOKIE_NAME))
            .ok_or_else(AppError::auth_required)?;

        let claims = self.auth_manager.validate_token_detailed(&token)?;
        let user_id = claims.user_id()?;

        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Session user no longer exists"))?;

        if let Some(denial) = user.login_denial() {
            AppLogger::log_security_event(
                "blocked_coach_session",
                denial,
                Some(&user.id.to_string()),
            );
            return Err(AppError::forbidden(denial));
        }

        record_user_in_span(user.id);
        Ok(user)
    }
}

/// Require the caller to hold `role`
///
/// # Errors
///
/// Returns `PermissionDenied` naming the required role
pub fn require_role(user: &User, role: Role) -> AppResult<()> {
    if user.role == role {
        return Ok(());
    }
    let required = match role {
        Role::User => "User",
        Role::Coach => "Coach",
        Role::Admin => "Admin",
    };
    Err(AppError::forbidden(format!(
        "Access denied. {required} role required."
    )))
}
