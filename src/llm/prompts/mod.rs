// ABOUTME: Prompt templates for posture, plan, and coach report completions
// ABOUTME: Templates are Markdown files embedded at compile time with {{placeholder}} slots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy
//! maintenance. Placeholders use `{{name}}` and are filled with [`fill`].

/// Vision prompt sent with the three posture photos
pub const POSTURE_REPORT_PROMPT: &str = include_str!("posture_report.md");

/// Weekly plan generation prompt
///
/// Placeholders: `userName`, `userAge`, `userGender`, `userHeight`,
/// `userWeight`, `userBMI`, `calorieTarget`, `constitution`,
/// `postureAnalysis`.
pub const PLAN_GENERATION_PROMPT: &str = include_str!("plan_generation.md");

/// Plan revision prompt; placeholders `currentPlan` and `userMessage`
pub const PLAN_REVISION_PROMPT: &str = include_str!("plan_revision.md");

/// Coach report analysis prompt; placeholder `studentData`
pub const COACH_ANALYSIS_PROMPT: &str = include_str!("coach_analysis.md");

/// System prompt for chatting about an analysed report
pub const COACH_CHAT_PROMPT: &str = include_str!("coach_chat.md");

/// Replace every `{{key}}` in `template` with its value
///
/// Unknown placeholders are left in place.
#[must_use]
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_owned(), |text, (key, value)| {
            text.replace(&format!("{{{{{key}}}}}"), value)
        })
}
