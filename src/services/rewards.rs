// ABOUTME: Reward tier progress and badge redemption
// ABOUTME: Derives tier standing from the balance and validates redeem requests before the ledger write
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{Badge, RewardTier, User};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::database::Database;
use crate::logging::AppLogger;

/// Where a balance sits within the tier ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    /// Current tier
    pub tier: RewardTier,
    /// Tier above, `None` at Gold
    pub next_tier: Option<RewardTier>,
    /// Points still needed for the next tier, `None` at Gold
    pub points_to_next_tier: Option<i64>,
    /// Percent of the way through the current tier, 100 at Gold
    pub tier_progress: i64,
}

/// Compute tier standing for a balance
#[must_use]
pub fn tier_progress(points: i64) -> TierProgress {
    let tier = RewardTier::for_points(points);
    let next_tier = tier.next();

    let tier_progress = next_tier.map_or(100, |next| {
        let range = (next.min_points() - tier.min_points()).max(1);
        let percent = ((points - tier.min_points()) as f64 / range as f64 * 100.0).round() as i64;
        percent.clamp(0, 100)
    });

    TierProgress {
        tier,
        next_tier,
        points_to_next_tier: next_tier.map(|next| (next.min_points() - points).max(0)),
        tier_progress,
    }
}

/// Balance, badge counts, and tier standing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardSummary {
    /// Current balance
    pub points: i64,
    /// Bronze badges owned
    pub bronze_badges: i64,
    /// Silver badges owned
    pub silver_badges: i64,
    /// Gold badges owned
    pub gold_badges: i64,
    /// Tier standing
    #[serde(flatten)]
    pub progress: TierProgress,
}

impl RewardSummary {
    /// Summarize a user's reward state
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        Self {
            points: user.points,
            bronze_badges: user.bronze_badges,
            silver_badges: user.silver_badges,
            gold_badges: user.gold_badges,
            progress: tier_progress(user.points),
        }
    }
}

/// Validate a redeem request's `kind`
///
/// # Errors
///
/// Returns `InvalidInput` with "Missing redeem kind" or "Invalid reward type"
pub fn parse_badge(kind: Option<&str>) -> AppResult<Badge> {
    let kind = kind
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .ok_or_else(|| AppError::invalid_input("Missing redeem kind"))?;
    Badge::from_display_name(kind).ok_or_else(|| AppError::invalid_input("Invalid reward type"))
}

/// Buy a badge with points
///
/// # Errors
///
/// Returns `InvalidInput` for a missing or unknown kind or an insufficient
/// balance, or a database error
pub async fn redeem(database: &Database, user_id: Uuid, kind: Option<&str>) -> AppResult<User> {
    let badge = parse_badge(kind)?;
    let user = database.redeem_badge(user_id, badge).await?;

    AppLogger::log_points_change(
        &user_id.to_string(),
        badge.reward_kind().as_str(),
        -badge.cost(),
        user.points,
    );
    info!(user.id = %user_id, badge = badge.display_name(), "Badge redeemed");
    Ok(user)
}
