// ABOUTME: AI weekly plan generation from the user's profile, constitution, and posture report
// ABOUTME: Also revises an existing plan through a tagged RESPONSE/PLAN chat exchange
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Plan Generation
//!
//! Generation needs the newest assessment and posture analysis. The profile
//! is condensed into the values the generation prompt asks for, and the
//! reply is parsed as JSON (fenced or bare). Revision sends the current
//! plan and the user's request and accepts a replacement plan only when it
//! parses.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::{Constitution, Plan, User};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::llm::extract::{json_payload, split_revision_reply};
use crate::llm::prompts::{fill, PLAN_GENERATION_PROMPT, PLAN_REVISION_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::logging::AppLogger;

/// Age assumed when no birth date is on file
const DEFAULT_AGE: i64 = 30;

/// Calorie target used when height or weight is missing
const DEFAULT_CALORIES: &str = "2000";

/// Moderate activity multiplier applied to the basal rate
const ACTIVITY_FACTOR: f64 = 1.55;

const NOT_SPECIFIED: &str = "Not specified";
const NO_POSTURE: &str = "No posture analysis available. Focus on general postural health.";
const DEFAULT_REVISION_MESSAGE: &str = "I've updated your plan based on your request!";

const TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 4096;
const REVISION_MAX_TOKENS: u32 = 4000;

/// A freshly generated plan
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    /// The stored plan
    pub plan: Plan,
    /// Confirmation for the client
    pub message: &'static str,
}

/// A revised plan and the model's explanation
#[derive(Debug, Clone)]
pub struct PlanRevision {
    /// Plan document after the revision
    pub content: Value,
    /// What the model says it changed
    pub message: String,
    /// Whether the model supplied a usable replacement plan
    pub replaced: bool,
}

/// Whole years between `birth_date` and `today`
#[must_use]
pub fn age_on(birth_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    birth_date
        .and_then(|birth| today.years_since(birth))
        .map_or(DEFAULT_AGE, i64::from)
}

/// Body mass index with one decimal, or "Not available"
#[must_use]
pub fn bmi(height_cm: Option<i64>, weight_kg: Option<i64>) -> String {
    match (height_cm, weight_kg) {
        (Some(height), Some(weight)) if height > 0 && weight > 0 => {
            let meters = height as f64 / 100.0;
            format!("{:.1}", weight as f64 / (meters * meters))
        }
        _ => "Not available".to_owned(),
    }
}

/// Daily calorie target from the Mifflin-St Jeor basal rate
#[must_use]
pub fn calorie_target(
    height_cm: Option<i64>,
    weight_kg: Option<i64>,
    age: i64,
    sex: Option<&str>,
) -> String {
    let (Some(height), Some(weight)) = (height_cm, weight_kg) else {
        return DEFAULT_CALORIES.to_owned();
    };
    if height <= 0 || weight <= 0 {
        return DEFAULT_CALORIES.to_owned();
    }

    let offset = if sex.is_some_and(|sex| sex.trim().eq_ignore_ascii_case("male")) {
        5.0
    } else {
        -161.0
    };
    let basal = 10.0f64.mul_add(
        weight as f64,
        6.25f64.mul_add(height as f64, -5.0 * age as f64),
    ) + offset;

    format!("{}", (basal * ACTIVITY_FACTOR).round() as i64)
}

/// Fill the generation prompt for a user
#[must_use]
pub fn build_generation_prompt(
    user: &User,
    constitution: Constitution,
    posture_md: Option<&str>,
    today: NaiveDate,
) -> String {
    let age = age_on(user.birth_date, today);
    let height = user
        .height_cm
        .map_or_else(|| NOT_SPECIFIED.to_owned(), |h| h.to_string());
    let weight = user
        .weight_kg
        .map_or_else(|| NOT_SPECIFIED.to_owned(), |w| w.to_string());
    let sex = user
        .sex
        .as_deref()
        .filter(|sex| !sex.trim().is_empty())
        .unwrap_or(NOT_SPECIFIED);
    let posture = posture_md
        .filter(|md| !md.trim().is_empty())
        .unwrap_or(NO_POSTURE);

    fill(
        PLAN_GENERATION_PROMPT,
        &[
            ("userName", user.name.as_deref().unwrap_or("User")),
            ("userAge", age.to_string().as_str()),
            ("userGender", sex),
            ("userHeight", height.as_str()),
            ("userWeight", weight.as_str()),
            ("userBMI", bmi(user.height_cm, user.weight_kg).as_str()),
            (
                "calorieTarget",
                calorie_target(user.height_cm, user.weight_kg, age, user.sex.as_deref()).as_str(),
            ),
            ("constitution", constitution.as_str()),
            ("postureAnalysis", posture),
        ],
    )
}

/// Parse a generation reply into a plan document
///
/// # Errors
///
/// Returns an external service error if no JSON can be recovered
pub fn parse_plan_reply(reply: &str) -> AppResult<Value> {
    serde_json::from_str(json_payload(reply)).map_err(|e| {
        warn!(error = %e, "Plan reply was not valid JSON");
        AppError::external_service("Gemini", "Failed to parse AI response as JSON")
    })
}

/// Generate and store a plan for the user
///
/// # Errors
///
/// Returns `InvalidInput` when the assessment or posture analysis is
/// missing, the provider's error when the model call fails, or an external
/// service error when the reply is not JSON
pub async fn generate_plan(
    database: &Database,
    llm: &dyn LlmProvider,
    user: &User,
) -> AppResult<GeneratedPlan> {
    let assessment = database.latest_assessment(user.id).await?.ok_or_else(|| {
        AppError::invalid_input("Please complete an assessment first before generating a plan")
    })?;
    let posture = database.latest_posture_analysis(user.id).await?.ok_or_else(|| {
        AppError::invalid_input(
            "Please complete a posture analysis first for personalized exercise recommendations",
        )
    })?;

    let prompt = build_generation_prompt(
        user,
        assessment.constitution,
        Some(&posture.analysis_md),
        Utc::now().date_naive(),
    );
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
        .with_temperature(TEMPERATURE)
        .with_max_tokens(GENERATION_MAX_TOKENS);

    let started = Instant::now();
    let result = llm.complete(&request).await;
    AppLogger::log_ai_call(
        &user.id.to_string(),
        "plan_generation",
        result.is_ok(),
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );
    let content = parse_plan_reply(&result?.content)?;

    let now = Utc::now();
    let plan = Plan {
        id: Uuid::new_v4(),
        user_id: user.id,
        assessment_id: Some(assessment.id),
        posture_id: Some(posture.id),
        content,
        created_at: now,
        updated_at: now,
    };
    database.create_plan(&plan).await?;

    info!(user.id = %user.id, plan.id = %plan.id, "Plan generated");
    Ok(GeneratedPlan {
        plan,
        message: "Detailed personalized plan generated successfully",
    })
}

/// One of the caller's plans
///
/// # Errors
///
/// Returns `ResourceNotFound` if it does not exist, or `PermissionDenied`
/// if it belongs to someone else
pub async fn get_owned_plan(database: &Database, user_id: Uuid, plan_id: Uuid) -> AppResult<Plan> {
    let plan = database
        .get_plan(plan_id)
        .await?
        .ok_or_else(|| AppError::not_found("Plan"))?;
    if plan.user_id != user_id {
        return Err(AppError::forbidden("Forbidden"));
    }
    Ok(plan)
}

/// Revise a plan from a chat message
///
/// # Errors
///
/// Returns `ResourceNotFound`/`PermissionDenied` for a plan the caller
/// cannot see, or the provider's error when the model call fails
pub async fn revise_plan(
    database: &Database,
    llm: &dyn LlmProvider,
    user_id: Uuid,
    plan_id: Uuid,
    message: &str,
) -> AppResult<PlanRevision> {
    let plan = get_owned_plan(database, user_id, plan_id).await?;

    let current = serde_json::to_string_pretty(&plan.content)?;
    let prompt = fill(
        PLAN_REVISION_PROMPT,
        &[("currentPlan", current.as_str()), ("userMessage", message)],
    );
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
        .with_temperature(TEMPERATURE)
        .with_max_tokens(REVISION_MAX_TOKENS);

    let started = Instant::now();
    let result = llm.complete(&request).await;
    AppLogger::log_ai_call(
        &user_id.to_string(),
        "plan_revision",
        result.is_ok(),
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );
    let reply = split_revision_reply(&result?.content);

    if reply.message.is_none() {
        warn!(plan.id = %plan_id, "Revision reply had no RESPONSE section");
    }
    let replaced = reply.plan.is_some();
    if !replaced {
        warn!(plan.id = %plan_id, "Revision reply had no usable PLAN section, keeping content");
    }
    let content = reply.plan.unwrap_or(plan.content);

    database.update_plan_content(plan_id, &content).await?;

    info!(user.id = %user_id, plan.id = %plan_id, replaced, "Plan revised");
    Ok(PlanRevision {
        content,
        message: reply
            .message
            .unwrap_or_else(|| DEFAULT_REVISION_MESSAGE.to_owned()),
        replaced,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitplan_core::models::Role;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_age_counts_whole_years() {
        let today = date(2025, 6, 15);
        assert_eq!(age_on(Some(date(1995, 6, 15)), today), 30);
        assert_eq!(age_on(Some(date(1995, 6, 16)), today), 29);
        assert_eq!(age_on(None, today), 30);
    }

    #[test]
    fn test_bmi_one_decimal() {
        assert_eq!(bmi(Some(180), Some(81)), "25.0");
        assert_eq!(bmi(Some(165), Some(60)), "22.0");
        assert_eq!(bmi(None, Some(60)), "Not available");
    }

    #[test]
    fn test_calorie_target_by_sex() {
        // 10*70 + 6.25*175 - 5*30 + 5 = 1648.75; * 1.55 = 2555.56
        assert_eq!(calorie_target(Some(175), Some(70), 30, Some("Male")), "2556");
        // 10*60 + 6.25*165 - 5*30 - 161 = 1320.25; * 1.55 = 2046.39
        assert_eq!(calorie_target(Some(165), Some(60), 30, Some("female")), "2046");
        assert_eq!(calorie_target(None, Some(60), 30, None), "2000");
    }

    #[test]
    fn test_prompt_defaults_for_sparse_profile() {
        let user = User::new("sam@example.com".into(), "hash".into(), None, Role::User);
        let prompt = build_generation_prompt(&user, Constitution::QiDeficiency, None, date(2025, 1, 1));
        assert!(prompt.contains("Name: User"));
        assert!(prompt.contains("Age: 30"));
        assert!(prompt.contains("Sex: Not specified"));
        assert!(prompt.contains("BMI: Not available"));
        assert!(prompt.contains("2000 kcal"));
        assert!(prompt.contains("QI_DEFICIENCY"));
        assert!(prompt.contains(NO_POSTURE));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_plan_reply_parsing() {
        let fenced = "Sure!\n```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(parse_plan_reply(fenced).unwrap()["summary"], "ok");
        assert_eq!(parse_plan_reply("{\"a\": 1}").unwrap()["a"], 1);

        let err = parse_plan_reply("I cannot help with that").unwrap_err();
        assert_eq!(err.http_status(), 502);
        assert!(err.message.contains("Failed to parse AI response as JSON"));
    }
}
