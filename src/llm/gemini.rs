use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::http;
use super::{ChatBackend, Completion, GenerationRequest, TokenUsage};
use crate::error::AttemptError;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
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

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    cached_content_token_count: Option<u64>,
}

/// Gemini `generateContent` backend.
pub struct GeminiBackend {
    client: Client,
    api_base_url: String,
}

impl GeminiBackend {
    pub fn new(api_base_url: &str) -> Result<Self, reqwest::Error> {
        Ok(GeminiBackend {
            client: http::client()?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.api_base_url)
    }
}

impl ChatBackend for GeminiBackend {
    fn send(&self, request: &GenerationRequest, api_key: &str) -> Result<Completion, AttemptError> {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: &request.system_instruction,
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part {
                    text: &request.user_command,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        };

        let builder = self
            .client
            .post(self.generate_url(&request.model))
            .timeout(request.timeout)
            .header("x-goog-api-key", api_key)
            .json(&body);

        let body = http::send(builder)?;
        parse_response(&body)
    }
}

/// Text of the first candidate plus usage metadata.
pub fn parse_response(body: &str) -> Result<Completion, AttemptError> {
    let resp: GenerateResponse =
        serde_json::from_str(body).map_err(|e| http::parse_error(e, body))?;

    let candidate = resp
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| http::parse_error("no candidates returned", body))?;

    let message = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default();

    let usage = resp
        .usage_metadata
        .map(|u| TokenUsage {
            input: u.prompt_token_count,
            cached: u.cached_content_token_count,
            output: u.candidates_token_count,
        })
        .unwrap_or_default();

    Ok(Completion { message, usage })
}
