// ABOUTME: Posture photo validation and AI posture review
// ABOUTME: Sends three base64 photos to the vision model and stores the Markdown report with previews
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::LazyLock;
use std::time::Instant;

use chrono::Utc;
use fitplan_core::errors::{AppError, AppResult};
use fitplan_core::models::PostureAnalysis;
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::Database;
use crate::llm::prompts::POSTURE_REPORT_PROMPT;
use crate::llm::{ChatMessage, ChatRequest, ImageAttachment, LlmProvider};
use crate::logging::AppLogger;

/// Raw base64 alphabet, no data-URL prefix or whitespace
static BASE64_PAYLOAD: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/=]+$").ok());

/// Payloads at or below this length are rejected as not being images
const MIN_IMAGE_LEN: usize = 100;

/// Characters of each photo kept in the stored preview
const PREVIEW_LEN: usize = 50;

/// Stored when the model returns no text
const EMPTY_REPORT: &str = "Analysis could not be generated.";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 4000;

/// The three photos of a posture upload, as raw base64 JPEG payloads
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostureImages {
    /// Front view
    #[serde(rename = "frontUrl")]
    pub front: Option<String>,
    /// Side view
    #[serde(rename = "sideUrl")]
    pub side: Option<String>,
    /// Back view
    #[serde(rename = "backUrl")]
    pub back: Option<String>,
}

fn present(value: Option<&String>) -> AppResult<&str> {
    value
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::invalid_input("Missing required images"))
}

fn is_base64_image(value: &str) -> bool {
    value.len() > MIN_IMAGE_LEN
        && BASE64_PAYLOAD
            .as_ref()
            .is_some_and(|re| re.is_match(value))
}

/// Check presence and encoding of all three photos
///
/// # Errors
///
/// Returns `InvalidInput` with "Missing required images" or
/// "Images must be in base64 format"
pub fn validate_images(images: &PostureImages) -> AppResult<[&str; 3]> {
    let photos = [
        present(images.front.as_ref())?,
        present(images.side.as_ref())?,
        present(images.back.as_ref())?,
    ];

    if !photos.iter().all(|photo| is_base64_image(photo)) {
        return Err(AppError::invalid_input("Images must be in base64 format"));
    }
    Ok(photos)
}

/// Short data-URL preview stored instead of the full photo
#[must_use]
pub fn preview(data: &str) -> String {
    let head: String = data.chars().take(PREVIEW_LEN).collect();
    format!("data:image/jpeg;base64,{head}...")
}

/// Run the vision model over the photos and store the report
///
/// # Errors
///
/// Returns `InvalidInput` for bad photos, the provider's error if the
/// model call fails, or a database error
pub async fn analyze_posture(
    database: &Database,
    llm: &dyn LlmProvider,
    user_id: Uuid,
    images: &PostureImages,
) -> AppResult<PostureAnalysis> {
    let [front, side, back] = validate_images(images)?;
    if !llm.capabilities().supports_vision() {
        return Err(AppError::config(format!(
            "{} cannot read images",
            llm.display_name()
        )));
    }

    let request = ChatRequest::new(vec![ChatMessage::user(POSTURE_REPORT_PROMPT).with_images(
        vec![
            ImageAttachment::jpeg(front),
            ImageAttachment::jpeg(side),
            ImageAttachment::jpeg(back),
        ],
    )])
    .with_temperature(TEMPERATURE)
    .with_max_tokens(MAX_TOKENS);

    let started = Instant::now();
    let result = llm.complete(&request).await;
    AppLogger::log_ai_call(
        &user_id.to_string(),
        "posture_analysis",
        result.is_ok(),
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    );
    let response = result?;

    let report = response.content.trim();
    let analysis_md = if report.is_empty() {
        warn!(user.id = %user_id, "Vision model returned an empty posture report");
        EMPTY_REPORT.to_owned()
    } else {
        report.to_owned()
    };

    let analysis = PostureAnalysis {
        id: Uuid::new_v4(),
        user_id,
        front_url: preview(front),
        side_url: preview(side),
        back_url: preview(back),
        analysis_md,
        created_at: Utc::now(),
    };
    database.create_posture_analysis(&analysis).await?;

    info!(user.id = %user_id, posture.id = %analysis.id, "Posture analysis stored");
    Ok(analysis)
}

/// One of the caller's posture analyses
///
/// # Errors
///
/// Returns `ResourceNotFound` if it does not exist, or `PermissionDenied`
/// if it belongs to someone else
pub async fn get_owned_analysis(
    database: &Database,
    user_id: Uuid,
    analysis_id: Uuid,
) -> AppResult<PostureAnalysis> {
    let analysis = database
        .get_posture_analysis(analysis_id)
        .await?
        .ok_or_else(|| AppError::not_found("Posture analysis"))?;
    if analysis.user_id != user_id {
        return Err(AppError::forbidden("Forbidden"));
    }
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photo(c: char) -> String {
        c.to_string().repeat(120)
    }

    fn images(front: Option<String>, side: Option<String>, back: Option<String>) -> PostureImages {
        PostureImages { front, side, back }
    }

    #[test]
    fn test_all_images_required() {
        let err = validate_images(&images(Some(photo('A')), None, Some(photo('B')))).unwrap_err();
        assert_eq!(err.message, "Missing required images");
    }

    #[test]
    fn test_short_or_prefixed_images_rejected() {
        let short = images(Some("QUJD".to_owned()), Some(photo('A')), Some(photo('B')));
        assert_eq!(
            validate_images(&short).unwrap_err().message,
            "Images must be in base64 format"
        );

        let data_url = format!("data:image/jpeg;base64,{}", photo('A'));
        let prefixed = images(Some(data_url), Some(photo('A')), Some(photo('B')));
        assert!(validate_images(&prefixed).is_err());
    }

    #[test]
    fn test_valid_images_pass() {
        let ok = images(Some(photo('A')), Some(photo('B')), Some(photo('=')));
        assert!(validate_images(&ok).is_ok());
    }

    #[test]
    fn test_preview_truncates() {
        let preview = preview(&photo('Z'));
        assert_eq!(preview, format!("data:image/jpeg;base64,{}...", "Z".repeat(50)));
    }
}
