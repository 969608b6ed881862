// ABOUTME: Point values, reward tier thresholds, and other domain constants
// ABOUTME: Shared by the checklist ledger, reward redemption, and weekly reporting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Point accounting for checklist items
pub mod points {
    /// Points credited when an item is checked (and debited when unchecked)
    pub const CHECK_ITEM_POINTS: i64 = 10;
}

/// Reward tier thresholds (inclusive lower bounds)
pub mod tiers {
    /// Bronze tier starts at zero points
    pub const BRONZE_MIN: i64 = 0;
    /// Silver tier lower bound
    pub const SILVER_MIN: i64 = 200;
    /// Gold tier lower bound
    pub const GOLD_MIN: i64 = 500;
}

/// Badge prices in points
pub mod badges {
    /// Bronze badge price
    pub const BRONZE_COST: i64 = 100;
    /// Silver badge price
    pub const SILVER_COST: i64 = 200;
    /// Gold badge price
    pub const GOLD_COST: i64 = 500;
}

/// Checklist layout
pub mod schedule {
    /// Days in a weekly checklist
    pub const DAYS_PER_WEEK: u8 = 7;
    /// Plan content keys for each day, `day_index` 1 maps to `monday`
    pub const DAY_KEYS: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    /// Title used when neither the plan nor the caller provides one
    pub const DEFAULT_TODO_TITLE: &str = "Weekly Plan";
}

/// Account validation limits
pub mod limits {
    /// Minimum password length
    pub const PASSWORD_MIN_LEN: usize = 6;
    /// Maximum password length (bcrypt truncates beyond 72 bytes)
    pub const PASSWORD_MAX_LEN: usize = 72;
    /// Maximum display name length
    pub const NAME_MAX_LEN: usize = 50;
    /// Maximum free-text sex field length
    pub const SEX_MAX_LEN: usize = 20;
    /// Height bounds in centimetres
    pub const HEIGHT_CM_RANGE: (i64, i64) = (50, 250);
    /// Weight bounds in kilograms
    pub const WEIGHT_KG_RANGE: (i64, i64) = (20, 400);
    /// Highest value a questionnaire answer may take
    pub const MAX_ANSWER_VALUE: i64 = 5;
}

/// Service identity used in logs
pub mod service_names {
    /// Name reported by the server binary
    pub const FITPLAN_SERVER: &str = "fitplan-server";
}
