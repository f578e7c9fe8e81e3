pub mod anthropic;
pub mod client;
pub mod gemini;
mod http;
pub mod openai;
pub mod prompt_builder;
mod prompts;
pub mod registry;
pub mod retry;

use crate::error::AttemptError;
use std::time::Duration;

pub const MAX_OUTPUT_TOKENS: u32 = 4000;
pub const TEMPERATURE: f64 = 0.7;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// One chat-style generation request: a system instruction plus a user command.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub system_instruction: String,
    pub user_command: String,
    pub max_output_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
}

impl GenerationRequest {
    pub fn new(model: &str, system_instruction: &str, user_command: &str) -> Self {
        GenerationRequest {
            model: model.to_string(),
            system_instruction: system_instruction.to_string(),
            user_command: user_command.to_string(),
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Token counts reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input: u64,
    pub cached: Option<u64>,
    pub output: u64,
}

/// Parsed reply from a single successful attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: String,
    pub usage: TokenUsage,
}

/// Outcome of a generation after retries.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success { message: String, usage: TokenUsage },
    Failure,
}

impl GenerationResult {
    pub fn message(&self) -> Option<&str> {
        match self {
            GenerationResult::Success { message, .. } => Some(message),
            GenerationResult::Failure => None,
        }
    }
}

/// Wire adapter for one provider's HTTP API. Performs exactly one attempt.
pub trait ChatBackend: Send + Sync {
    fn send(&self, request: &GenerationRequest, api_key: &str) -> Result<Completion, AttemptError>;
}

/// Something that can turn a prompt pair into text.
pub trait TextGenerator {
    fn generate(
        &self,
        model: &str,
        system_instruction: &str,
        user_command: &str,
        api_key: &str,
    ) -> GenerationResult;
}
