// ABOUTME: Environment-based configuration management for server settings
// ABOUTME: Loads ports, database URL, session secret, AI provider, and CORS settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for production deployment

use std::env;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};

use anyhow::{Context, Result};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default HTTP port
const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default database location
const DEFAULT_DATABASE_URL: &str = "sqlite:./data/fitplan.db";

/// Default session lifetime, seven days
const DEFAULT_JWT_EXPIRY_HOURS: i64 = 168;

/// Default Gemini model
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default model call timeout; must stay below the request timeout
const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 90;

/// Default request body limit; three base64 photos fit comfortably
const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024 * 1024;

/// Default per-request timeout; plan generation can take a while
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Strongly typed log level configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Normal operation
    #[default]
    Info,
    /// Verbose
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    /// Convert to `tracing::Level`
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Error => tracing::Level::ERROR,
            Self::Warn => tracing::Level::WARN,
            Self::Info => tracing::Level::INFO,
            Self::Debug => tracing::Level::DEBUG,
            Self::Trace => tracing::Level::TRACE,
        }
    }

    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "error" => Self::Error,
            "warn" => Self::Warn,
            "debug" => Self::Debug,
            "trace" => Self::Trace,
            _ => Self::Info,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Session signing secret, redacted from debug output
#[derive(Clone)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Wrap an explicit secret
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Generate a random per-process secret
    #[must_use]
    pub fn generate() -> Self {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect();
        Self(secret)
    }

    /// Raw bytes for the HMAC key
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Debug for SessionSecret {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("SessionSecret([REDACTED])")
    }
}

/// Database settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL
    pub url: String,
}

/// Session settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub secret: SessionSecret,
    /// Session lifetime in hours
    pub jwt_expiry_hours: i64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

/// Generative AI provider settings
#[derive(Clone)]
pub struct LlmConfig {
    /// Gemini API key; AI endpoints are unavailable without it
    pub gemini_api_key: Option<String>,
    /// Model used for all completions
    pub model: String,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Debug for LlmConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("LlmConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// HTTP transport settings
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Comma separated allowed origins, `*` for any
    pub cors_allowed_origins: String,
    /// Maximum accepted request body
    pub body_limit_bytes: usize,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP API port
    pub http_port: u16,
    /// Log level
    pub log_level: LogLevel,
    /// Deployment environment
    pub environment: Environment,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Session configuration
    pub auth: AuthConfig,
    /// AI provider configuration
    pub llm: LlmConfig,
    /// Transport configuration
    pub http: HttpConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed or if
    /// `AUTH_SECRET` is missing in production
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let environment = Environment::from_str_or_default(&env_var_or("ENVIRONMENT", "development"));

        let secret = match env::var("AUTH_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => SessionSecret::new(secret),
            _ if environment.is_production() => {
                return Err(anyhow::anyhow!("AUTH_SECRET must be set in production"));
            }
            _ => {
                warn!("AUTH_SECRET not set, generating a per-process secret; sessions will not survive a restart");
                SessionSecret::generate()
            }
        };

        let config = Self {
            host: env_var_or("HOST", "0.0.0.0"),
            http_port: env_var_or("HTTP_PORT", &DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            log_level: LogLevel::from_str_or_default(&env_var_or("RUST_LOG", "info")),
            environment,
            database: DatabaseConfig {
                url: env_var_or("DATABASE_URL", DEFAULT_DATABASE_URL),
            },
            auth: AuthConfig {
                secret,
                jwt_expiry_hours: env_var_or(
                    "JWT_EXPIRY_HOURS",
                    &DEFAULT_JWT_EXPIRY_HOURS.to_string(),
                )
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS value")?,
                secure_cookies: environment.is_production(),
                bcrypt_cost: env_var_or("BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())
                    .parse()
                    .context("Invalid BCRYPT_COST value")?,
            },
            llm: LlmConfig {
                gemini_api_key: env::var("GEMINI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty()),
                model: env_var_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
                timeout_secs: env_var_or(
                    "GEMINI_TIMEOUT_SECS",
                    &DEFAULT_GEMINI_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid GEMINI_TIMEOUT_SECS value")?,
            },
            http: HttpConfig {
                cors_allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
                body_limit_bytes: env_var_or(
                    "HTTP_BODY_LIMIT_BYTES",
                    &DEFAULT_BODY_LIMIT_BYTES.to_string(),
                )
                .parse()
                .context("Invalid HTTP_BODY_LIMIT_BYTES value")?,
                request_timeout_secs: env_var_or(
                    "HTTP_REQUEST_TIMEOUT_SECS",
                    &DEFAULT_REQUEST_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid HTTP_REQUEST_TIMEOUT_SECS value")?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Configuration for tests: in-memory database, fixed secret, no AI key
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            http_port: 0,
            log_level: LogLevel::Debug,
            environment: Environment::Testing,
            database: DatabaseConfig {
                url: "sqlite::memory:".to_owned(),
            },
            auth: AuthConfig {
                secret: SessionSecret::new("test-secret-with-enough-entropy-for-hs256"),
                jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
                secure_cookies: false,
                bcrypt_cost: 4,
            },
            llm: LlmConfig {
                gemini_api_key: None,
                model: DEFAULT_GEMINI_MODEL.to_owned(),
                timeout_secs: DEFAULT_GEMINI_TIMEOUT_SECS,
            },
            http: HttpConfig {
                cors_allowed_origins: "*".to_owned(),
                body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
                request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            },
        }
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error if the session lifetime is not positive or the
    /// model timeout does not fit inside the request timeout
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_expiry_hours <= 0 {
            return Err(anyhow::anyhow!("JWT_EXPIRY_HOURS must be positive"));
        }
        if self.llm.timeout_secs >= self.http.request_timeout_secs {
            return Err(anyhow::anyhow!(
                "GEMINI_TIMEOUT_SECS ({}) must be lower than HTTP_REQUEST_TIMEOUT_SECS ({})",
                self.llm.timeout_secs,
                self.http.request_timeout_secs
            ));
        }
        if self.llm.gemini_api_key.is_none() {
            warn!("GEMINI_API_KEY not set; posture, plan, and coach analysis endpoints will be unavailable");
        }
        Ok(())
    }

    /// One-line summary for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "FitPlan Server Configuration:\n\
             - Bind: {}:{}\n\
             - Environment: {}\n\
             - Log Level: {}\n\
             - Database: {}\n\
             - Session Lifetime: {}h\n\
             - AI Provider: {}\n\
             - CORS Origins: {}",
            self.host,
            self.http_port,
            self.environment,
            self.log_level,
            self.database.url,
            self.auth.jwt_expiry_hours,
            if self.llm.gemini_api_key.is_some() {
                format!("Gemini ({})", self.llm.model)
            } else {
                "Disabled".to_owned()
            },
            self.http.cors_allowed_origins,
        )
    }
}

/// Read an environment variable with a default
fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
