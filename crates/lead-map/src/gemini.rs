//! Gemini `generateContent` provider.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Unavailable;
use crate::suggest::{SuggestionOptions, SuggestionProvider};

const TEMPERATURE: f32 = 0.0;
const MAX_OUTPUT_TOKENS: u32 = 4096;
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Blocking client for the hosted model.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    url: String,
    timeout: Duration,
}

impl GeminiProvider {
    /// Builds a provider; fails with `NotConfigured` when no key is set.
    pub fn new(options: &SuggestionOptions) -> Result<Self, Unavailable> {
        let api_key = options.api_key.clone().ok_or(Unavailable::NotConfigured)?;
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|err| Unavailable::Transport(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            url: format!(
                "{}/models/{}:generateContent",
                options.endpoint.trim_end_matches('/'),
                options.model
            ),
            timeout: options.timeout,
        })
    }

    fn map_error(&self, err: &reqwest::Error) -> Unavailable {
        if err.is_timeout() {
            Unavailable::Timeout(self.timeout)
        } else {
            Unavailable::Transport(err.to_string())
        }
    }
}

impl SuggestionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn complete(&self, prompt: &str) -> Result<String, Unavailable> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        debug!(url = %self.url, "calling generateContent");
        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(
                USER_AGENT,
                format!("lead-map/{}", env!("CARGO_PKG_VERSION")),
            )
            .json(&body)
            .send()
            .map_err(|err| self.map_error(&err))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(Unavailable::Status { status, body });
        }

        let parsed: GenerateResponse = response.json().map_err(|err| {
            if err.is_timeout() {
                Unavailable::Timeout(self.timeout)
            } else {
                Unavailable::Malformed(err.to_string())
            }
        })?;
        let text = parsed.text();
        if text.trim().is_empty() {
            return Err(Unavailable::EmptyResponse);
        }
        Ok(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts joined.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }
}
