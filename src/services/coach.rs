// ABOUTME: Coach report lifecycle: creation, AI analysis, and chat about an analysed report
// ABOUTME: Parses the model's JSON analysis with a plain-text fallback and forwards chat history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Instant;

use chrono::Utc;
use fitplan_core::errors::{AppError, AppResult, ErrorCode};
use fitplan_core::models::{CoachReport, KnowledgeLink, ReportAnalysis, ReportStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};
use uuid::Uuid;

use crate::database::Database;
use crate::llm::extract::first_json_object;
use crate::llm::prompts::{fill, COACH_ANALYSIS_PROMPT, COACH_CHAT_PROMPT};
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::logging::AppLogger;

const NO_RISK_ANALYSIS: &str = "Risk analysis not available";
const NO_RECOMMENDATIONS: &str = "Recommendations not available";

const TEMPERATURE: f32 = 0.7;
const ANALYSIS_MAX_TOKENS: u32 = 2000;
const CHAT_MAX_TOKENS: u32 = 1000;

/// Fields of a new report
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    /// Report title
    pub title: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Free-form student data, stored as text
    pub student_data: Option<Value>,
    /// Student account the report is about
    pub student_id: Option<Uuid>,
}

/// One prior turn of a report conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `user` or `assistant`
    pub role: String,
    /// Turn text
    pub content: String,
}

impl ChatTurn {
    fn to_message(&self) -> ChatMessage {
        if self.role == "assistant" {
            ChatMessage::assistant(&self.content)
        } else {
            ChatMessage::user(&self.content)
        }
    }
}

/// Render student data as prompt text; strings are kept verbatim
fn student_data_text(value: &Value) -> AppResult<Option<String>> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(text) => text.trim().to_owned(),
        other => serde_json::to_string_pretty(other)?,
    };
    Ok((!text.is_empty()).then_some(text))
}

/// Create a pending report
///
/// # Errors
///
/// Returns `InvalidInput` when the title or student data is missing
pub async fn create_report(
    database: &Database,
    coach_id: Uuid,
    input: NewReport,
) -> AppResult<CoachReport> {
    let title = input
        .title
        .map(|title| title.trim().to_owned())
        .filter(|title| !title.is_empty());
    let student_data = match &input.student_data {
        Some(value) => student_data_text(value)?,
        None => None,
    };
    let (Some(title), Some(student_data)) = (title, student_data) else {
        return Err(AppError::invalid_input("Title and student data are required"));
    };

    let now = Utc::now();
    let report = CoachReport {
        id: Uuid::new_v4(),
        coach_id,
        student_id: input.student_id,
        title,
        description: input.description.filter(|d| !d.trim().is_empty()),
        student_data,
        status: ReportStatus::Pending,
        analysis: None,
        student: None,
        created_at: now,
        updated_at: now,
    };
    database.create_coach_report(&report).await?;

    info!(coach.id = %coach_id, report.id = %report.id, "Coach report created");
    Ok(report)
}

/// One of the coach's reports
///
/// # Errors
///
/// Returns `ResourceNotFound` if the report is not the coach's
pub async fn get_report(database: &Database, coach_id: Uuid, report_id: Uuid) -> AppResult<CoachReport> {
    database
        .get_coach_report(coach_id, report_id)
        .await?
        .ok_or_else(|| AppError::not_found("Report"))
}

/// Read a string field, accepting lists of strings as bullet lines
fn text_field(object: &Value, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(entries) => {
            let lines: Vec<String> = entries
                .iter()
                .filter_map(Value::as_str)
                .map(|line| format!("- {line}"))
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        _ => None,
    }
}

/// Parse the analysis reply, falling back to the raw text
#[must_use]
pub fn parse_analysis(reply: &str) -> ReportAnalysis {
    let parsed = first_json_object(reply)
        .and_then(|object| serde_json::from_str::<Value>(object).ok())
        .filter(Value::is_object);

    let Some(object) = parsed else {
        return ReportAnalysis {
            analysis: reply.trim().to_owned(),
            risk_analysis: NO_RISK_ANALYSIS.to_owned(),
            recommendations: NO_RECOMMENDATIONS.to_owned(),
            knowledge_links: Vec::new(),
        };
    };

    let knowledge_links = object
        .get("knowledgeLinks")
        .cloned()
        .and_then(|links| serde_json::from_value::<Vec<KnowledgeLink>>(links).ok())
        .unwrap_or_default();

    ReportAnalysis {
        analysis: text_field(&object, "analysis").unwrap_or_else(|| reply.trim().to_owned()),
        risk_analysis: text_field(&object, "riskAnalysis")
            .unwrap_or_else(|| NO_RISK_ANALYSIS.to_owned()),
        recommendations: text_field(&object, "recommendations")
            .unwrap_or_else(|| NO_RECOMMENDATIONS.to_owned()),
        knowledge_links,
    }
}

/// Run the AI analysis for a report
///
/// The report moves to `PROCESSING`, then `COMPLETED` with the analysis,
/// or `FAILED` if the model call fails.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the report is not the coach's, or an
/// external service error (502) when the analysis fails
pub async fn analyze_report(
    database: &Database,
    llm: &dyn LlmProvider,
    coach_id: Uuid,
    report_id: Uuid,
) -> AppResult<CoachReport> {
    let report = get_report(database, coach_id, report_id).await?;
    database
        .set_report_status(report_id, ReportStatus::Processing)
        .await?;

    let prompt = fill(
        COACH_ANALYSIS_PROMPT,
        &[("studentData", report.student_data.as_str())],
    );
    let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
        .with_temperature(TEMPERATURE)
        .with_max_tokens(ANALYSIS_MAX_TOKENS);

    let started = Instant::now();
    let result = llm.complete(&request).await;
    AppLogger::log_ai_call(
        &coach_id.to_string(),
        "coach_analysis",
        result.is_ok(),
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            error!(report.id = %report_id, error = %e, "Report analysis failed");
            database
                .set_report_status(report_id, ReportStatus::Failed)
                .await?;
            return Err(AppError::new(ErrorCode::ExternalServiceError, "AI analysis failed")
                .with_details(serde_json::json!({ "reason": e.message })));
        }
    };

    let analysis = parse_analysis(&response.content);
    database.store_report_analysis(report_id, &analysis).await?;

    info!(coach.id = %coach_id, report.id = %report_id, "Report analysis completed");
    get_report(database, coach_id, report_id).await
}

/// Build the system prompt for chatting about a completed report
fn chat_system_prompt(report: &CoachReport, analysis: &ReportAnalysis) -> String {
    fill(
        COACH_CHAT_PROMPT,
        &[
            ("title", report.title.as_str()),
            ("studentData", report.student_data.as_str()),
            ("analysis", analysis.analysis.as_str()),
            ("riskAnalysis", analysis.risk_analysis.as_str()),
            ("recommendations", analysis.recommendations.as_str()),
        ],
    )
}

/// Answer a coach's question about an analysed report
///
/// # Errors
///
/// Returns `ResourceNotFound` if the report is not the coach's,
/// `InvalidInput` if its analysis is not complete, or the provider's error
pub async fn chat_about_report(
    database: &Database,
    llm: &dyn LlmProvider,
    coach_id: Uuid,
    report_id: Uuid,
    message: &str,
    history: &[ChatTurn],
) -> AppResult<String> {
    let report = get_report(database, coach_id, report_id).await?;
    let analysis = match (&report.status, &report.analysis) {
        (ReportStatus::Completed, Some(analysis)) => analysis,
        _ => return Err(AppError::invalid_input("Report analysis not completed yet")),
    };

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(chat_system_prompt(&report, analysis)));
    messages.extend(history.iter().map(ChatTurn::to_message));
    messages.push(ChatMessage::user(message));

    let request = ChatRequest::new(messages)
        .with_temperature(TEMPERATURE)
        .with_max_tokens(CHAT_MAX_TOKENS);

    let started = Instant::now();
    let result = llm.complete(&request).await;
    AppLogger::log_ai_call(
        &coach_id.to_string(),
        "coach_chat",
        result.is_ok(),
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );

    Ok(result?.content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_analysis_inside_prose() {
        let reply = r#"Here is my analysis:
{"analysis": "Good base fitness", "riskAnalysis": "Knee strain", "recommendations": ["Add mobility work", "Sleep 8h"],
 "knowledgeLinks": [{"title": "Squat form", "url": "https://example.org/squat", "description": "Technique"}]}
Hope it helps."#;
        let parsed = parse_analysis(reply);
        assert_eq!(parsed.analysis, "Good base fitness");
        assert_eq!(parsed.risk_analysis, "Knee strain");
        assert_eq!(parsed.recommendations, "- Add mobility work\n- Sleep 8h");
        assert_eq!(parsed.knowledge_links.len(), 1);
        assert_eq!(parsed.knowledge_links[0].url, "https://example.org/squat");
    }

    #[test]
    fn test_unparsable_reply_falls_back_to_text() {
        let parsed = parse_analysis("The student is doing well overall.");
        assert_eq!(parsed.analysis, "The student is doing well overall.");
        assert_eq!(parsed.risk_analysis, "Risk analysis not available");
        assert_eq!(parsed.recommendations, "Recommendations not available");
        assert!(parsed.knowledge_links.is_empty());
    }

    #[test]
    fn test_partial_object_fills_defaults() {
        let parsed = parse_analysis(r#"{"analysis": "Only this"}"#);
        assert_eq!(parsed.analysis, "Only this");
        assert_eq!(parsed.risk_analysis, NO_RISK_ANALYSIS);
    }

    #[test]
    fn test_student_data_rendering() {
        assert_eq!(
            student_data_text(&Value::String("  age 20 ".into())).unwrap().as_deref(),
            Some("age 20")
        );
        assert!(student_data_text(&Value::Null).unwrap().is_none());
        let rendered = student_data_text(&serde_json::json!({ "age": 20 })).unwrap().unwrap();
        assert!(rendered.contains("\"age\": 20"));
    }

    #[test]
    fn test_history_roles() {
        let assistant = ChatTurn { role: "assistant".into(), content: "hi".into() }.to_message();
        let other = ChatTurn { role: "coach".into(), content: "hey".into() }.to_message();
        assert_eq!(assistant.role, crate::llm::MessageRole::Assistant);
        assert_eq!(other.role, crate::llm::MessageRole::User);
    }
}
