// ABOUTME: Configuration module root for environment-driven server settings
// ABOUTME: Exposes the typed ServerConfig loaded once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-only configuration. There are no configuration files; every
//! setting comes from an environment variable with a documented default.

/// Typed server configuration loaded from environment variables
pub mod environment;

pub use environment::{Environment, LogLevel, ServerConfig};
