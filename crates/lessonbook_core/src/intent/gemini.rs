//! Gemini `generateContent` client.
//!
//! # Invariants
//! - The API key travels in the `x-goog-api-key` header, never in the URL.
//! - Request and response bodies are not logged.

use crate::config::ModelConfig;
use crate::intent::{IntentError, ModelClient};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    /// Builds a client from configuration.
    ///
    /// Returns `Ok(None)` when no API key is configured, which disables the
    /// model fallback.
    pub fn from_config(config: &ModelConfig) -> Result<Option<Self>, IntentError> {
        let Some(api_key) = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
        else {
            return Ok(None);
        };
        if config.name.trim().is_empty() {
            return Err(IntentError::NotConfigured("model.name"));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| IntentError::Transport(err.to_string()))?;

        Ok(Some(Self {
            client,
            url: format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.name.trim()
            ),
            api_key: api_key.to_string(),
        }))
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl ModelClient for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, IntentError> {
        let started_at = Instant::now();
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .map_err(|err| {
                warn!(
                    "event=model_request module=intent status=error error_code=transport duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                IntentError::Transport(err.without_url().to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=model_request module=intent status=error http_status={} duration_ms={}",
                status.as_u16(),
                started_at.elapsed().as_millis()
            );
            return Err(IntentError::Status(status.as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .map_err(|err| IntentError::Decode(err.to_string()))?;
        let text = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| IntentError::Decode("response has no candidate text".to_string()))?;

        info!(
            "event=model_request module=intent status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(text)
    }
}
