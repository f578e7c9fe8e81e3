use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::http;
use super::{ChatBackend, Completion, GenerationRequest, TokenUsage};
use crate::error::AttemptError;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    cache_read_input_tokens: Option<u64>,
}

/// Anthropic Messages API backend.
pub struct AnthropicBackend {
    client: Client,
    api_base_url: String,
}

impl AnthropicBackend {
    pub fn new(api_base_url: &str) -> Result<Self, reqwest::Error> {
        Ok(AnthropicBackend {
            client: http::client()?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ChatBackend for AnthropicBackend {
    fn send(&self, request: &GenerationRequest, api_key: &str) -> Result<Completion, AttemptError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            system: &request.system_instruction,
            messages: [UserMessage {
                role: "user",
                content: &request.user_command,
            }],
        };

        let builder = self
            .client
            .post(format!("{}/messages", self.api_base_url))
            .timeout(request.timeout)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let body = http::send(builder)?;
        parse_response(&body)
    }
}

/// Join the text blocks of a Messages API response.
pub fn parse_response(body: &str) -> Result<Completion, AttemptError> {
    let resp: MessagesResponse =
        serde_json::from_str(body).map_err(|e| http::parse_error(e, body))?;

    if resp.content.is_empty() {
        return Err(http::parse_error("no content blocks returned", body));
    }

    let message = resp
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    let usage = resp
        .usage
        .map(|u| TokenUsage {
            input: u.input_tokens,
            cached: u.cache_read_input_tokens,
            output: u.output_tokens,
        })
        .unwrap_or_default();

    Ok(Completion { message, usage })
}
