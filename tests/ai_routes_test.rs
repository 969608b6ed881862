// ABOUTME: Integration tests for the AI-backed posture, plan, and coach report routes
// ABOUTME: Uses a scripted provider so replies and prompts can be asserted exactly
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use common::{create_approved_coach, create_test_app, create_test_user, token_for};
use fitplan_server::errors::AppError;
use fitplan_server::llm::{LlmProvider, MessageRole};
use helpers::axum_test::AxumTestRequest;
use helpers::scripted_llm::ScriptedLlm;
use serde_json::{json, Value};

const POSTURE_REPORT: &str = "## Findings\n\n- Forward head posture";

fn photo() -> String {
    "QUJD".repeat(40)
}

fn plan_reply() -> String {
    let plan = json!({
        "title": "Week of Warmth",
        "diet": {
            "monday": { "breakfast": "Oats", "lunch": ["Rice", "Fish"], "dinner": "Soup" }
        },
        "exercise": {
            "monday": ["Squats 3x10", "Plank 3x30s"]
        }
    });
    format!("Here is your plan:\n```json\n{plan}\n```")
}

async fn app_with(llm: &Arc<ScriptedLlm>) -> (Router, Arc<fitplan_server::resources::ServerResources>) {
    let provider: Arc<dyn LlmProvider> = llm.clone();
    create_test_app(Some(provider)).await.unwrap()
}

async fn upload_posture(app: &Router, token: &str) -> Value {
    AxumTestRequest::post("/api/posture/upload")
        .bearer(token)
        .json(&json!({
            "frontUrl": photo(),
            "sideUrl": photo(),
            "backUrl": photo(),
        }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json()
}

async fn submit_assessment(app: &Router, token: &str) {
    AxumTestRequest::post("/api/assessment")
        .bearer(token)
        .json(&json!({ "answers": { "yang_1": 5, "yang_2": 4 } }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::CREATED);
}

// ============================================================================
// Posture
// ============================================================================

#[tokio::test]
async fn test_posture_upload_stores_report_and_preview() {
    let llm = ScriptedLlm::with_replies([POSTURE_REPORT]);
    let (app, resources) = app_with(&llm).await;
    let user = create_test_user(&resources.database).await.unwrap();
    let token = token_for(&resources, &user).unwrap();

    let uploaded = upload_posture(&app, &token).await;
    assert_eq!(uploaded["message"], "Analysis completed successfully");
    let id = uploaded["id"].as_str().unwrap();

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].messages[0].images.len(), 3);

    let analysis: Value = AxumTestRequest::get(&format!("/api/posture/{id}"))
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(analysis["analysisMd"], POSTURE_REPORT);
    let preview = analysis["frontUrl"].as_str().unwrap();
    assert!(preview.starts_with("data:image/jpeg;base64,"));
    assert!(preview.ends_with("..."));

    let list: Value = AxumTestRequest::get("/api/posture/list")
        .bearer(&token)
        .send(app)
        .await
        .json();
    assert_eq!(list["analyses"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_posture_upload_validates_images() {
    let llm = ScriptedLlm::with_replies(Vec::<String>::new());
    let (app, resources) = app_with(&llm).await;
    let user = create_test_user(&resources.database).await.unwrap();
    let token = token_for(&resources, &user).unwrap();

    let missing: Value = AxumTestRequest::post("/api/posture/upload")
        .bearer(&token)
        .json(&json!({ "frontUrl": photo(), "sideUrl": photo() }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(missing["error"]["message"], "Missing required images");

    let not_base64: Value = AxumTestRequest::post("/api/posture/upload")
        .bearer(&token)
        .json(&json!({
            "frontUrl": format!("data:image/jpeg;base64,{}", photo()),
            "sideUrl": photo(),
            "backUrl": photo(),
        }))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(not_base64["error"]["message"], "Images must be in base64 format");

    assert!(llm.requests().is_empty());
}

// ============================================================================
// Plans
// ============================================================================

#[tokio::test]
async fn test_plan_generation_requires_assessment_and_posture() {
    let llm = ScriptedLlm::with_replies([POSTURE_REPORT]);
    let (app, resources) = app_with(&llm).await;
    let user = create_test_user(&resources.database).await.unwrap();
    let token = token_for(&resources, &user).unwrap();

    let body: Value = AxumTestRequest::post("/api/plan/generate")
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(
        body["error"]["message"],
        "Please complete an assessment first before generating a plan"
    );

    submit_assessment(&app, &token).await;
    AxumTestRequest::post("/api/plan/generate")
        .bearer(&token)
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    assert!(llm.requests().is_empty());
}

#[tokio::test]
async fn test_generated_plan_drives_the_checklist_and_can_be_revised() {
    let revised = json!({
        "title": "Week of Warmth",
        "diet": { "monday": { "breakfast": "Congee" } },
        "exercise": { "monday": ["Lunges 3x10"] }
    });
    let llm = ScriptedLlm::with_replies([
        POSTURE_REPORT.to_owned(),
        plan_reply(),
        format!("RESPONSE: Swapped squats for lunges.\nPLAN:\n```json\n{revised}\n```"),
    ]);
    let (app, resources) = app_with(&llm).await;
    let user = create_test_user(&resources.database).await.unwrap();
    let token = token_for(&resources, &user).unwrap();

    submit_assessment(&app, &token).await;
    upload_posture(&app, &token).await;

    let generated: Value = AxumTestRequest::post("/api/plan/generate")
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(generated["content"]["title"], "Week of Warmth");
    let plan_id = generated["id"].as_str().unwrap().to_owned();

    let prompt = &llm.requests()[1].messages[0].content;
    assert!(prompt.contains("YANG_DEFICIENCY"));
    assert!(prompt.contains("Forward head posture"));

    let view: Value = AxumTestRequest::get(&format!("/api/plan/{plan_id}"))
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(view["assessment"]["constitution"], "YANG_DEFICIENCY");

    let created: Value = AxumTestRequest::post("/api/todos/create")
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(created["todo"]["title"], "Week of Warmth");
    let items = created["todo"]["items"].as_array().unwrap();
    // 7 diet items plus two Monday exercises
    assert_eq!(items.len(), 9);
    assert_eq!(items[0]["label"], "Breakfast: Oats; Lunch: Rice, Fish; Dinner: Soup");
    assert_eq!(items[1]["label"], "Squats 3x10");
    let todo_id = created["todo"]["id"].as_str().unwrap().to_owned();

    let chat: Value = AxumTestRequest::post("/api/plan/chat")
        .bearer(&token)
        .json(&json!({ "planId": plan_id, "message": "No squats please" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(chat["message"], "Swapped squats for lunges.");
    assert_eq!(chat["content"]["exercise"]["monday"][0], "Lunges 3x10");

    // Labels are resolved from the current plan on every read
    let todo: Value = AxumTestRequest::get(&format!("/api/todos/{todo_id}"))
        .bearer(&token)
        .send(app.clone())
        .await
        .json();
    assert_eq!(todo["todo"]["items"][1]["label"], "Lunges 3x10");

    AxumTestRequest::post("/api/plan/chat")
        .bearer(&token)
        .json(&json!({ "planId": plan_id }))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plans_are_private_to_their_owner() {
    let llm = ScriptedLlm::with_replies([POSTURE_REPORT.to_owned(), plan_reply()]);
    let (app, resources) = app_with(&llm).await;
    let user = create_test_user(&resources.database).await.unwrap();
    let token = token_for(&resources, &user).unwrap();
    let other = common::create_account(
        &resources.database,
        "other@example.com",
        fitplan_server::models::Role::User,
    )
    .await
    .unwrap();
    let other_token = token_for(&resources, &other).unwrap();

    submit_assessment(&app, &token).await;
    upload_posture(&app, &token).await;
    let generated: Value = AxumTestRequest::post("/api/plan/generate")
        .bearer(&token)
        .send(app.clone())
        .await
        .json();
    let plan_id = generated["id"].as_str().unwrap();

    AxumTestRequest::get(&format!("/api/plan/{plan_id}"))
        .bearer(&other_token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let plans: Value = AxumTestRequest::get("/api/plan/userplan")
        .bearer(&other_token)
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert!(plans["plans"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_ai_routes_without_provider_report_configuration_error() {
    let (app, resources) = create_test_app(None).await.unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let token = token_for(&resources, &user).unwrap();

    let body: Value = AxumTestRequest::post("/api/posture/upload")
        .bearer(&token)
        .json(&json!({ "frontUrl": photo(), "sideUrl": photo(), "backUrl": photo() }))
        .send(app)
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .json();
    assert_eq!(body["error"]["code"], "CONFIG_ERROR");
}

// ============================================================================
// Coach Reports
// ============================================================================

const ANALYSIS_REPLY: &str = r#"{"analysis": "Solid base", "riskAnalysis": ["Low sleep"], "recommendations": "Deload week", "knowledgeLinks": [{"title": "Sleep", "url": "https://example.org/sleep", "description": "Recovery"}]}"#;

async fn create_report(app: &Router, token: &str) -> String {
    let created: Value = AxumTestRequest::post("/api/coach/reports")
        .bearer(token)
        .json(&json!({
            "title": "Check-in",
            "studentData": { "sleepHours": 5, "sessions": 4 },
        }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(created["success"], true);
    assert_eq!(created["report"]["status"], "PENDING");
    created["report"]["id"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn test_coach_report_analysis_and_chat() {
    let llm = ScriptedLlm::with_replies([ANALYSIS_REPLY, "Aim for eight hours."]);
    let (app, resources) = app_with(&llm).await;
    let coach = create_approved_coach(&resources.database).await.unwrap();
    let token = token_for(&resources, &coach).unwrap();

    let report_id = create_report(&app, &token).await;

    let early: Value = AxumTestRequest::post("/api/coach/chat")
        .bearer(&token)
        .json(&json!({ "reportId": report_id, "message": "Thoughts?" }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(early["error"]["message"], "Report analysis not completed yet");

    let analyzed: Value = AxumTestRequest::post("/api/coach/analyze")
        .bearer(&token)
        .json(&json!({ "reportId": report_id }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(analyzed["report"]["status"], "COMPLETED");
    assert_eq!(analyzed["report"]["analysis"], "Solid base");
    assert_eq!(analyzed["report"]["riskAnalysis"], "- Low sleep");
    assert_eq!(analyzed["report"]["knowledgeLinks"][0]["title"], "Sleep");

    let chat: Value = AxumTestRequest::post("/api/coach/chat")
        .bearer(&token)
        .json(&json!({
            "reportId": report_id,
            "message": "How much sleep?",
            "chatHistory": [
                { "role": "user", "content": "Hi" },
                { "role": "assistant", "content": "Hello coach" }
            ],
        }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(chat["response"], "Aim for eight hours.");

    let request = &llm.requests()[1];
    let roles: Vec<MessageRole> = request.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::User
        ]
    );
    assert!(request.messages[0].content.contains("Solid base"));

    let listed: Value = AxumTestRequest::get("/api/coach/reports")
        .bearer(&token)
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listed["reports"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_analysis_marks_report_failed() {
    let llm = ScriptedLlm::failing(AppError::external_service("Gemini", "quota exhausted"));
    let (app, resources) = app_with(&llm).await;
    let coach = create_approved_coach(&resources.database).await.unwrap();
    let token = token_for(&resources, &coach).unwrap();

    let report_id = create_report(&app, &token).await;

    let failed: Value = AxumTestRequest::post("/api/coach/analyze")
        .bearer(&token)
        .json(&json!({ "reportId": report_id }))
        .send(app.clone())
        .await
        .assert_status(StatusCode::BAD_GATEWAY)
        .json();
    assert_eq!(failed["error"]["message"], "AI analysis failed");

    let report: Value = AxumTestRequest::get(&format!("/api/coach/reports/{report_id}"))
        .bearer(&token)
        .send(app)
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(report["report"]["status"], "FAILED");
}

#[tokio::test]
async fn test_coach_routes_reject_other_roles_and_foreign_reports() {
    let llm = ScriptedLlm::with_replies(Vec::<String>::new());
    let (app, resources) = app_with(&llm).await;
    let coach = create_approved_coach(&resources.database).await.unwrap();
    let coach_token = token_for(&resources, &coach).unwrap();
    let user = create_test_user(&resources.database).await.unwrap();
    let user_token = token_for(&resources, &user).unwrap();

    AxumTestRequest::get("/api/coach/reports")
        .bearer(&user_token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let report_id = create_report(&app, &coach_token).await;

    let second = common::create_account(
        &resources.database,
        "coach2@example.com",
        fitplan_server::models::Role::Coach,
    )
    .await
    .unwrap();
    let second = resources
        .database
        .set_coach_status(second.id, fitplan_server::models::CoachStatus::Approved)
        .await
        .unwrap();
    let second_token = token_for(&resources, &second).unwrap();

    AxumTestRequest::get(&format!("/api/coach/reports/{report_id}"))
        .bearer(&second_token)
        .send(app.clone())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let missing: Value = AxumTestRequest::post("/api/coach/reports")
        .bearer(&coach_token)
        .json(&json!({ "title": "No data" }))
        .send(app)
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(missing["error"]["message"], "Title and student data are required");
}
