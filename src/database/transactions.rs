// ABOUTME: Retry helper for multi-statement SQLite transactions
// ABOUTME: Re-runs a transaction body with exponential backoff when the database is locked
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Transaction retry for `SQLite` lock contention
//!
//! `SQLite` serializes writers. A deferred transaction that reads and then
//! writes can fail with `database is locked` when another connection got the
//! write lock first. Because the failed transaction is rolled back as a whole,
//! running the same body again is safe.
//!
//! ```text
//! retry_transaction(|| async {
//!     let mut tx = pool.begin().await?;
//!     sqlx::query("UPDATE ...").execute(&mut *tx).await?;
//!     sqlx::query("INSERT ...").execute(&mut *tx).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }, DEFAULT_MAX_ATTEMPTS).await
//! ```

use std::future::Future;
use std::time::Duration;

use fitplan_core::errors::{AppResult, ErrorCode};
use tokio::time::sleep;
use tracing::{error, warn};

/// Attempts used by the write paths in this crate
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry a transaction operation if it fails because the database is busy
///
/// Only database errors whose message indicates lock contention or a timeout
/// are retried. Everything else, including domain errors such as
/// `ResourceNotFound`, is returned immediately.
///
/// Backoff doubles from 20ms: 20ms, 40ms, 80ms, ...
///
/// # Errors
///
/// Returns the last error if every attempt failed, or the first
/// non-retryable error
pub async fn retry_transaction<F, Fut, T>(mut f: F, max_attempts: u32) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempts = 0;
    loop {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempts += 1;
                let retryable = e.code == ErrorCode::DatabaseError && is_retryable_error(&e.message);

                if !retryable {
                    return Err(e);
                }
                if attempts >= max_attempts {
                    error!(attempts, error = %e, "Transaction failed after max retries");
                    return Err(e);
                }

                let backoff_ms = 10 * (1_u64 << attempts);
                warn!(
                    attempt = attempts,
                    backoff_ms,
                    error = %e,
                    "Transaction hit lock contention, retrying after backoff"
                );
                sleep(Duration::from_millis(backoff_ms)).await;
            }
        }
    }
}

/// Check if a database error message describes transient contention
fn is_retryable_error(error_msg: &str) -> bool {
    let error_lower = error_msg.to_lowercase();
    error_lower.contains("database is locked")
        || error_lower.contains("busy")
        || error_lower.contains("timed out")
        || error_lower.contains("timeout")
}
