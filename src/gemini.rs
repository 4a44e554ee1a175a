//! Gemini API client
//!
//! A constructed client object with explicit lifetime, injected into the
//! components that need it (podcast generation and the live session).

use serde::Deserialize;

use crate::{Error, Result};

/// Base URL for the Gemini REST API
const BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// WebSocket endpoint for the Gemini Live duplex API
const LIVE_WS_PATH: &str =
    "/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

/// Client for the Gemini generateContent and Live APIs
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Gemini API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }

    /// WebSocket URL for the Live duplex endpoint
    #[must_use]
    pub fn live_url(&self) -> String {
        format!(
            "wss://generativelanguage.googleapis.com{LIVE_WS_PATH}?key={}",
            self.api_key
        )
    }

    /// Call `models/{model}:generateContent` with a raw request body
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API reports a non-success status
    pub async fn generate_content(
        &self,
        model: &str,
        request: &serde_json::Value,
    ) -> Result<GenerateContentResponse> {
        let url = format!("{BASE_URL}/v1beta/models/{model}:generateContent");

        tracing::debug!(model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, model, "generateContent request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Gemini API error");
            return Err(Error::Script(format!("Gemini API error {status}: {body}")));
        }

        let result: GenerateContentResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse generateContent response");
            e
        })?;

        Ok(result)
    }
}

/// Response from the generateContent API
#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One response candidate
#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

/// Candidate content: a sequence of parts
#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// One content part; either text or inline binary data
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub text: Option<String>,
    pub inline_data: Option<InlineData>,
}

/// Base64-encoded binary payload with its MIME type
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: Option<String>,
    pub data: String,
}

impl GenerateContentResponse {
    /// Text of the first candidate part, if any
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
    }

    /// Inline data payload of the first candidate part, if any
    #[must_use]
    pub fn first_inline_data(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .inline_data
            .as_ref()
            .map(|d| d.data.as_str())
    }
}
