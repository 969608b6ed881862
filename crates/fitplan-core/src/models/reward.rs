// ABOUTME: Point ledger entries, redeemable badges, and reward tiers
// ABOUTME: Every balance change is mirrored by a ledger row tagged with its kind
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{badges, tiers};
use crate::errors::AppError;

/// Reason for a ledger row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardKind {
    /// Checklist item checked
    CheckItem,
    /// Checklist item unchecked
    CheckItemRevoke,
    /// Bronze badge redeemed
    BadgeBronze,
    /// Silver badge redeemed
    BadgeSilver,
    /// Gold badge redeemed
    BadgeGold,
}

impl RewardKind {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CheckItem => "CHECK_ITEM",
            Self::CheckItemRevoke => "CHECK_ITEM_REVOKE",
            Self::BadgeBronze => "BADGE_BRONZE",
            Self::BadgeSilver => "BADGE_SILVER",
            Self::BadgeGold => "BADGE_GOLD",
        }
    }
}

impl Display for RewardKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CHECK_ITEM" => Ok(Self::CheckItem),
            "CHECK_ITEM_REVOKE" => Ok(Self::CheckItemRevoke),
            "BADGE_BRONZE" => Ok(Self::BadgeBronze),
            "BADGE_SILVER" => Ok(Self::BadgeSilver),
            "BADGE_GOLD" => Ok(Self::BadgeGold),
            other => Err(AppError::invalid_input(format!(
                "Unknown reward kind: {other}"
            ))),
        }
    }
}

/// Append-only ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEntry {
    /// Unique identifier
    pub id: Uuid,
    /// Account whose balance changed
    pub user_id: Uuid,
    /// Signed point delta
    pub points: i64,
    /// Reason tag
    pub kind: RewardKind,
    /// Free-form reference, e.g. `item:<id>` or `item:<id>:undo`
    pub note: Option<String>,
    /// Time of the change
    pub created_at: DateTime<Utc>,
}

/// Badge that can be bought with points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    /// "Bronze Badge"
    #[serde(rename = "Bronze Badge")]
    Bronze,
    /// "Silver Badge"
    #[serde(rename = "Silver Badge")]
    Silver,
    /// "Gold Badge"
    #[serde(rename = "Gold Badge")]
    Gold,
}

impl Badge {
    /// Parse the display name clients send when redeeming
    #[must_use]
    pub fn from_display_name(name: &str) -> Option<Self> {
        match name {
            "Bronze Badge" => Some(Self::Bronze),
            "Silver Badge" => Some(Self::Silver),
            "Gold Badge" => Some(Self::Gold),
            _ => None,
        }
    }

    /// Display name
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze Badge",
            Self::Silver => "Silver Badge",
            Self::Gold => "Gold Badge",
        }
    }

    /// Price in points
    #[must_use]
    pub const fn cost(&self) -> i64 {
        match self {
            Self::Bronze => badges::BRONZE_COST,
            Self::Silver => badges::SILVER_COST,
            Self::Gold => badges::GOLD_COST,
        }
    }

    /// Ledger tag written on redemption
    #[must_use]
    pub const fn reward_kind(&self) -> RewardKind {
        match self {
            Self::Bronze => RewardKind::BadgeBronze,
            Self::Silver => RewardKind::BadgeSilver,
            Self::Gold => RewardKind::BadgeGold,
        }
    }

    /// Counter column on the `users` table
    #[must_use]
    pub const fn counter_column(&self) -> &'static str {
        match self {
            Self::Bronze => "bronze_badges",
            Self::Silver => "silver_badges",
            Self::Gold => "gold_badges",
        }
    }
}

/// Status tier derived from the current balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RewardTier {
    /// 0 to 199 points
    Bronze,
    /// 200 to 499 points
    Silver,
    /// 500 points and above
    Gold,
}

impl RewardTier {
    /// Tier for a balance; negative balances count as Bronze
    #[must_use]
    pub const fn for_points(points: i64) -> Self {
        if points >= tiers::GOLD_MIN {
            Self::Gold
        } else if points >= tiers::SILVER_MIN {
            Self::Silver
        } else {
            Self::Bronze
        }
    }

    /// Inclusive lower bound
    #[must_use]
    pub const fn min_points(&self) -> i64 {
        match self {
            Self::Bronze => tiers::BRONZE_MIN,
            Self::Silver => tiers::SILVER_MIN,
            Self::Gold => tiers::GOLD_MIN,
        }
    }

    /// The tier above this one
    #[must_use]
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Bronze => Some(Self::Silver),
            Self::Silver => Some(Self::Gold),
            Self::Gold => None,
        }
    }

    /// Display name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RewardTier::for_points(-30), RewardTier::Bronze);
        assert_eq!(RewardTier::for_points(0), RewardTier::Bronze);
        assert_eq!(RewardTier::for_points(199), RewardTier::Bronze);
        assert_eq!(RewardTier::for_points(200), RewardTier::Silver);
        assert_eq!(RewardTier::for_points(499), RewardTier::Silver);
        assert_eq!(RewardTier::for_points(500), RewardTier::Gold);
        assert_eq!(RewardTier::Gold.next(), None);
    }

    #[test]
    fn test_badge_names_and_costs() {
        assert_eq!(Badge::from_display_name("Silver Badge"), Some(Badge::Silver));
        assert_eq!(Badge::from_display_name("Platinum Badge"), None);
        assert_eq!(Badge::Gold.cost(), 500);
        assert_eq!(Badge::Bronze.reward_kind(), RewardKind::BadgeBronze);
    }
}
