// ABOUTME: Main library entry point for the FitPlan wellness API
// ABOUTME: Wires configuration, persistence, the AI provider, services, and HTTP routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # FitPlan Server
//!
//! A REST/JSON service for guided wellness plans:
//!
//! - **Assessment**: a constitution questionnaire scored into five buckets
//! - **Posture**: three photos reviewed by a vision model
//! - **Plans**: AI-generated weekly diet and exercise plans, revisable by chat
//! - **Checklists**: weekly todos derived from the plan, worth points per item
//! - **Rewards**: badges bought with points, tracked in an append-only ledger
//! - **Coaching**: student reports with AI analysis and follow-up chat
//! - **Administration**: coach approval and user listing
//!
//! ## Architecture
//!
//! - **Routes** authenticate, parse, and delegate to services
//! - **Services** hold the business rules and take their dependencies explicitly
//! - **Database** is an `SQLite` pool with one file per table family
//! - **LLM** is a provider trait with a Gemini implementation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fitplan_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("FitPlan configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Session tokens and password hashing
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// `SQLite` persistence layer
pub mod database;

/// Unified error handling re-exported from `fitplan-core`
pub mod errors;

/// LLM provider abstraction and the Gemini client
pub mod llm;

/// Production logging and structured output
pub mod logging;

/// HTTP middleware for authentication, CORS, and request tracing
pub mod middleware;

/// Shared server state
pub mod resources;

/// `HTTP` routes for every API domain
pub mod routes;

/// Security headers and session cookies
pub mod security;

/// Domain service layer
pub mod services;

pub use fitplan_core::{constants, models};
