// ABOUTME: Google Gemini LLM provider implementation with inline image support
// ABOUTME: Calls the generateContent endpoint for text and vision completions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Gemini Provider
//!
//! Implementation of the `LlmProvider` trait for Google's Gemini models.
//!
//! ## Configuration
//!
//! Set `GEMINI_API_KEY` with a key from Google AI Studio and optionally
//! `GEMINI_MODEL` to pick a model other than the default.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fitplan_server::llm::{ChatMessage, ChatRequest, GeminiProvider, LlmProvider};
//! use fitplan_core::errors::AppError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let provider = GeminiProvider::new("api-key").with_default_model("gemini-2.0-flash");
//!     let request = ChatRequest::new(vec![ChatMessage::user("Suggest a stretching routine.")]);
//!     let response = provider.complete(&request).await?;
//!     println!("{}", response.content);
//!     Ok(())
//! }
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use fitplan_core::errors::{AppError, ErrorCode};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{
    ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, MessageRole, TokenUsage,
};
use crate::config::environment::LlmConfig;

/// Default model to use
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Base URL for the Gemini API
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Service name used in error messages
const SERVICE_NAME: &str = "Gemini";

/// Header carrying the API key; keeps the key out of URLs and error text
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Default per-call timeout for model requests
const DEFAULT_TIMEOUT_SECS: u64 = 90;

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Gemini API request structure
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// Content structure for Gemini API
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

/// Part of content (text or inline image)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    /// Text content
    Text { text: String },
    /// Base64 image data
    InlineData {
        #[serde(alias = "inlineData")]
        inline_data: InlineData,
    },
}

/// Inline binary payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct InlineData {
    #[serde(alias = "mimeType")]
    mime_type: String,
    data: String,
}

/// Generation configuration
#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    candidate_count: Option<u32>,
}

/// Gemini API response structure
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
    error: Option<GeminiError>,
}

/// Response candidate
#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

/// Usage metadata from Gemini API response
#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates: Option<u32>,
    #[serde(rename = "totalTokenCount")]
    total: Option<u32>,
}

/// API error response from Gemini
#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// ============================================================================
// Provider Implementation
// ============================================================================

/// Google Gemini LLM provider
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    base_url: String,
    default_model: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// Create a new Gemini provider with an API key
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: API_BASE_URL.to_owned(),
            default_model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create a provider from the AI section of the server configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no API key is configured
    pub fn from_config(config: &LlmConfig) -> Result<Self, AppError> {
        let api_key = config
            .gemini_api_key
            .as_deref()
            .ok_or_else(|| AppError::config("GEMINI_API_KEY is not configured"))?;
        Ok(Self::new(api_key)
            .with_default_model(&config.model)
            .with_timeout(Duration::from_secs(config.timeout_secs)))
    }

    /// Set a custom default model
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Set the per-call timeout
    ///
    /// Keep it below the HTTP request timeout so a slow model call fails
    /// inside the handler instead of being cancelled with it.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point the provider at another endpoint root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Convert our message role to Gemini's role format
    ///
    /// System messages normally travel in `system_instruction`; a stray one
    /// is sent as a user turn.
    const fn convert_role(role: MessageRole) -> &'static str {
        match role {
            MessageRole::System | MessageRole::User => "user",
            MessageRole::Assistant => "model",
        }
    }

    /// Build the API URL for a model and method
    fn build_url(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    /// Authenticated `generateContent` call with the per-call timeout
    fn build_http_request(&self, model: &str, body: &GeminiRequest) -> RequestBuilder {
        self.client
            .post(self.build_url(model, "generateContent"))
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(self.timeout)
            .json(body)
    }

    /// Text part followed by one inline part per attached image
    fn message_parts(message: &ChatMessage) -> Vec<ContentPart> {
        let mut parts = Vec::with_capacity(1 + message.images.len());
        parts.push(ContentPart::Text {
            text: message.content.clone(),
        });
        parts.extend(message.images.iter().map(|image| ContentPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        }));
        parts
    }

    /// Convert chat messages to Gemini format
    fn convert_messages(messages: &[ChatMessage]) -> (Vec<GeminiContent>, Option<GeminiContent>) {
        let mut contents = Vec::new();
        let mut system_instruction = None;

        for message in messages {
            if message.role == MessageRole::System {
                system_instruction = Some(GeminiContent {
                    role: None,
                    parts: vec![ContentPart::Text {
                        text: message.content.clone(),
                    }],
                });
            } else {
                contents.push(GeminiContent {
                    role: Some(Self::convert_role(message.role).to_owned()),
                    parts: Self::message_parts(message),
                });
            }
        }

        (contents, system_instruction)
    }

    /// Build a Gemini API request from a `ChatRequest`
    fn build_gemini_request(request: &ChatRequest) -> GeminiRequest {
        let (contents, system_instruction) = Self::convert_messages(&request.messages);

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                candidate_count: Some(1),
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            system_instruction,
            generation_config,
        }
    }

    /// Concatenate the text parts of the first candidate
    fn extract_content(response: &GeminiResponse) -> Result<String, AppError> {
        let content = response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .ok_or_else(|| AppError::external_service(SERVICE_NAME, "No content in response"))?;

        Ok(content
            .parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::InlineData { .. } => None,
            })
            .collect())
    }

    /// Convert usage metadata to our token usage format
    fn convert_usage(metadata: &UsageMetadata) -> TokenUsage {
        TokenUsage {
            prompt_tokens: metadata.prompt.unwrap_or(0),
            completion_tokens: metadata.candidates.unwrap_or(0),
            total_tokens: metadata.total.unwrap_or(0),
        }
    }

    /// Map API error status to appropriate error type
    ///
    /// Rate limit (429) responses surface a retry hint to the caller.
    fn map_api_error(status: u16, response_text: &str) -> AppError {
        let message = serde_json::from_str::<GeminiResponse>(response_text)
            .ok()
            .and_then(|r| r.error)
            .map_or_else(|| response_text.to_owned(), |e| e.message);

        match status {
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                Self::extract_quota_message(&message),
            ),
            _ => AppError::external_service(SERVICE_NAME, format!("API error ({status}): {message}")),
        }
    }

    /// Extract a user-friendly quota/rate limit message from Gemini error
    ///
    /// Gemini phrases the hint as "Please retry in 6.406453963s."
    fn extract_quota_message(message: &str) -> String {
        const RETRY_PREFIX: &str = "Please retry in ";

        let seconds = message
            .find(RETRY_PREFIX)
            .map(|pos| &message[pos + RETRY_PREFIX.len()..])
            .and_then(|rest| rest.find('s').map(|end| &rest[..end]))
            .and_then(|value| value.parse::<f64>().ok());

        seconds.map_or_else(
            || "AI service quota exceeded. Please wait a moment and try again.".to_owned(),
            |seconds| {
                format!(
                    "AI service quota exceeded. Please try again in {} seconds.",
                    seconds.ceil() as u64
                )
            },
        )
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn display_name(&self) -> &'static str {
        "Google Gemini"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::full_featured()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip(self, request), fields(images = request.has_images()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let gemini_request = Self::build_gemini_request(request);

        debug!(model, "Sending request to Gemini API");

        let response = self
            .build_http_request(model, &gemini_request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            error!(status = %status, "Gemini API error");
            return Err(Self::map_api_error(status.as_u16(), &response_text));
        }

        let gemini_response: GeminiResponse =
            serde_json::from_str(&response_text).map_err(|e| {
                error!(error = %e, "Failed to parse Gemini response");
                AppError::external_service(SERVICE_NAME, format!("Unreadable response: {e}"))
            })?;

        if let Some(error) = gemini_response.error {
            return Err(AppError::external_service(SERVICE_NAME, error.message));
        }

        let content = Self::extract_content(&gemini_response)?;
        let usage = gemini_response
            .usage_metadata
            .as_ref()
            .map(Self::convert_usage);
        let finish_reason = gemini_response
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.clone());

        debug!(
            content_len = content.len(),
            total_tokens = usage.as_ref().map_or(0, |u| u.total_tokens),
            "Received Gemini response"
        );

        Ok(ChatResponse {
            content,
            model: model.to_owned(),
            usage,
            finish_reason,
        })
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.default_model)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ImageAttachment;

    #[test]
    fn test_images_become_inline_parts() {
        let request = ChatRequest::new(vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("look").with_images(vec![
                ImageAttachment::jpeg("AAAA"),
                ImageAttachment::jpeg("BBBB"),
            ]),
        ])
        .with_temperature(0.7)
        .with_max_tokens(4000);

        let body = serde_json::to_value(GeminiProvider::build_gemini_request(&request)).unwrap();

        assert_eq!(body["system_instruction"]["parts"][0]["text"], "be brief");
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["text"], "look");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[2]["inline_data"]["data"], "BBBB");
        assert_eq!(body["generation_config"]["max_output_tokens"], 4000);
    }

    #[test]
    fn test_assistant_turns_map_to_model_role() {
        let (contents, system) = GeminiProvider::convert_messages(&[
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello"),
        ]);
        assert!(system.is_none());
        assert_eq!(contents[1].role.as_deref(), Some("model"));
    }

    #[test]
    fn test_multi_part_text_is_joined() {
        let response: GeminiResponse = serde_json::from_str(
            r##"{"candidates":[{"content":{"role":"model","parts":[{"text":"# Posture"},{"text":" Report"}]},"finishReason":"STOP"}]}"##,
        )
        .unwrap();
        assert_eq!(
            GeminiProvider::extract_content(&response).unwrap(),
            "# Posture Report"
        );
    }

    #[test]
    fn test_rate_limit_message_rounds_up() {
        let body = r#"{"error":{"message":"Quota exceeded. Please retry in 6.4s."}}"#;
        let err = GeminiProvider::map_api_error(429, body);
        assert_eq!(err.code, ErrorCode::ExternalRateLimited);
        assert_eq!(
            err.message,
            "AI service quota exceeded. Please try again in 7 seconds."
        );
    }

    #[test]
    fn test_other_failures_are_external_service_errors() {
        let err = GeminiProvider::map_api_error(500, "boom");
        assert_eq!(err.code, ErrorCode::ExternalServiceError);
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn test_api_key_travels_in_header_not_url() {
        let provider = GeminiProvider::new("SECRET-KEY-123").with_timeout(Duration::from_secs(30));
        let body = GeminiProvider::build_gemini_request(&ChatRequest::new(vec![ChatMessage::user("hi")]));

        let request = provider
            .build_http_request("gemini-2.0-flash", &body)
            .build()
            .unwrap();

        assert!(request.url().query().is_none());
        assert!(!request.url().as_str().contains("SECRET-KEY-123"));
        assert_eq!(request.headers()[API_KEY_HEADER], "SECRET-KEY-123");
        assert_eq!(request.timeout(), Some(&Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_leak_key() {
        // Nothing listens on the discard port
        let provider = GeminiProvider::new("SECRET-KEY-123").with_base_url("http://127.0.0.1:9/v1beta");
        let request = ChatRequest::new(vec![ChatMessage::user("hi")]);

        let err = provider.complete(&request).await.unwrap_err();

        assert!(!err.message.contains("SECRET-KEY-123"));
        assert!(!err.message.contains("127.0.0.1"));
        assert!(!format!("{err:?}").contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", GeminiProvider::new("secret-key"));
        assert!(!rendered.contains("secret-key"));
    }
}
