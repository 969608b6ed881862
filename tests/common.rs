// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory resources, account creation, and session helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `fitplan_server`

use std::sync::{Arc, Once};

use anyhow::Result;
use axum::Router;
use fitplan_server::{
    auth::hash_password,
    config::ServerConfig,
    database::Database,
    llm::LlmProvider,
    models::{CoachStatus, Role, User},
    resources::ServerResources,
    routes::build_router,
};

static INIT_LOGGER: Once = Once::new();

/// Password used for every account created by these helpers
pub const TEST_PASSWORD: &str = "password123";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// Server resources over an in-memory database, with an optional AI provider
pub async fn create_test_server_resources(
    llm: Option<Arc<dyn LlmProvider>>,
) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(
        database,
        ServerConfig::for_testing(),
        llm,
    )))
}

/// Full application router over fresh resources
pub async fn create_test_app(llm: Option<Arc<dyn LlmProvider>>) -> Result<(Router, Arc<ServerResources>)> {
    let resources = create_test_server_resources(llm).await?;
    Ok((build_router(Arc::clone(&resources)), resources))
}

/// Insert an account directly, bypassing registration rules
pub async fn create_account(database: &Database, email: &str, role: Role) -> Result<User> {
    let password_hash = hash_password(TEST_PASSWORD, 4).await?;
    let user = User::new(email.to_owned(), password_hash, Some("Test".to_owned()), role);
    database.create_user(&user).await?;
    Ok(user)
}

/// A regular user account
pub async fn create_test_user(database: &Database) -> Result<User> {
    create_account(database, "user@example.com", Role::User).await
}

/// An approved coach account
pub async fn create_approved_coach(database: &Database) -> Result<User> {
    let coach = create_account(database, "coach@example.com", Role::Coach).await?;
    Ok(database.set_coach_status(coach.id, CoachStatus::Approved).await?)
}

/// An administrator account
pub async fn create_admin(database: &Database) -> Result<User> {
    create_account(database, "admin@example.com", Role::Admin).await
}

/// A session token for `user`
pub fn token_for(resources: &ServerResources, user: &User) -> Result<String> {
    Ok(resources.auth_manager.generate_token(user)?)
}
