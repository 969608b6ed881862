// ABOUTME: Centralized resource container shared by every route handler
// ABOUTME: Holds the database, session authenticator, configuration, and optional AI provider
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Server Resources
//!
//! Built once at startup and handed to the router as `Arc<ServerResources>`.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use fitplan_core::errors::{AppError, AppResult};
use tracing::warn;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::{GeminiProvider, LlmProvider};
use crate::middleware::SessionAuthenticator;

/// Shared server state
#[derive(Clone)]
pub struct ServerResources {
    /// Persistence layer
    pub database: Arc<Database>,
    /// Session token issuer
    pub auth_manager: AuthManager,
    /// Request authenticator
    pub authenticator: SessionAuthenticator,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl ServerResources {
    /// Assemble resources with an explicit AI provider
    #[must_use]
    pub fn new(
        database: Database,
        config: ServerConfig,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        let database = Arc::new(database);
        let auth_manager = AuthManager::new(&config.auth);
        let authenticator = SessionAuthenticator::new(auth_manager.clone(), Arc::clone(&database));
        Self {
            database,
            auth_manager,
            authenticator,
            config: Arc::new(config),
            llm,
        }
    }

    /// Assemble resources, creating the Gemini provider when a key is configured
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client for the provider cannot be built
    pub fn from_config(database: Database, config: ServerConfig) -> AppResult<Self> {
        let llm: Option<Arc<dyn LlmProvider>> = if config.llm.gemini_api_key.is_some() {
            Some(Arc::new(GeminiProvider::from_config(&config.llm)?))
        } else {
            warn!("GEMINI_API_KEY not set, AI endpoints will return a configuration error");
            None
        };
        Ok(Self::new(database, config, llm))
    }

    /// The configured AI provider
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no provider is configured
    pub fn llm(&self) -> AppResult<&dyn LlmProvider> {
        self.llm
            .as_deref()
            .ok_or_else(|| AppError::config("AI provider is not configured (set GEMINI_API_KEY)"))
    }
}

impl Debug for ServerResources {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ServerResources")
            .field("environment", &self.config.environment)
            .field("llm", &self.llm.as_ref().map(|llm| llm.name()))
            .finish_non_exhaustive()
    }
}
