use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::http;
use super::{ChatBackend, Completion, GenerationRequest, TokenUsage};
use crate::error::AttemptError;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GITHUB_MODELS_BASE_URL: &str = "https://models.github.ai/inference";

/// Which OpenAI-compatible service we are talking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    OpenAi,
    GitHubModels,
}

/// Minimal request/response structs for the Chat Completions API.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    prompt_tokens_details: Option<PromptTokensDetails>,
}

#[derive(Deserialize)]
struct PromptTokensDetails {
    cached_tokens: Option<u64>,
}

/// Chat Completions backend for OpenAI and GitHub Models.
pub struct OpenAiBackend {
    client: Client,
    api_base_url: String,
    flavor: Flavor,
}

impl OpenAiBackend {
    pub fn new(flavor: Flavor, api_base_url: &str) -> Result<Self, reqwest::Error> {
        Ok(OpenAiBackend {
            client: http::client()?,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            flavor,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.api_base_url)
    }

    fn body<'a>(&self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        let (max_completion_tokens, max_tokens, response_format) = match self.flavor {
            Flavor::OpenAi => (
                Some(request.max_output_tokens),
                None,
                Some(ResponseFormat { kind: "text" }),
            ),
            Flavor::GitHubModels => (None, Some(request.max_output_tokens), None),
        };

        ChatRequest {
            model: &request.model,
            max_completion_tokens,
            max_tokens,
            temperature: request.temperature,
            response_format,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_command,
                },
            ],
        }
    }
}

impl ChatBackend for OpenAiBackend {
    fn send(&self, request: &GenerationRequest, api_key: &str) -> Result<Completion, AttemptError> {
        let mut builder = self
            .client
            .post(self.chat_url())
            .timeout(request.timeout)
            .bearer_auth(api_key)
            .json(&self.body(request));

        if self.flavor == Flavor::GitHubModels {
            builder = builder
                .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                .header("X-GitHub-Api-Version", "2022-11-28");
        }

        let body = http::send(builder)?;
        parse_response(&body)
    }
}

/// Extract message text and usage from a Chat Completions response body.
pub fn parse_response(body: &str) -> Result<Completion, AttemptError> {
    let resp: ChatResponse = serde_json::from_str(body).map_err(|e| http::parse_error(e, body))?;

    let choice = resp
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| http::parse_error("no choices returned", body))?;

    let usage = resp
        .usage
        .map(|u| TokenUsage {
            input: u.prompt_tokens,
            cached: u.prompt_tokens_details.and_then(|d| d.cached_tokens),
            output: u.completion_tokens,
        })
        .unwrap_or_default();

    Ok(Completion {
        message: choice.message.content.unwrap_or_default(),
        usage,
    })
}
