use log::{error, info};

use super::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use super::{ChatBackend, Completion, GenerationRequest, GenerationResult, TextGenerator};
use crate::error::AttemptError;

/// Sends generation requests through a backend with bounded retries.
pub struct ProviderClient {
    backend: Box<dyn ChatBackend>,
    policy: RetryPolicy,
    sleeper: Box<dyn Sleeper>,
}

impl ProviderClient {
    pub fn new(backend: Box<dyn ChatBackend>, policy: RetryPolicy) -> Self {
        ProviderClient {
            backend,
            policy,
            sleeper: Box::new(ThreadSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    fn attempt(
        &self,
        request: &GenerationRequest,
        api_key: &str,
        n: u32,
    ) -> Result<Completion, AttemptError> {
        if n == 1 {
            info!("Generating response with {}...", request.model);
        } else {
            info!(
                "Attempt {n} of {} to generate response with {}...",
                self.policy.max_attempts(),
                request.model
            );
        }

        let result = self.backend.send(request, api_key).and_then(|completion| {
            if completion.message.trim().is_empty() {
                Err(AttemptError::EmptyMessage)
            } else {
                Ok(completion)
            }
        });

        if let Err(e) = &result {
            error!("{e}");
            if let Some(body) = e.body() {
                error!("Response content: {}", pretty_body(body));
            }
        }

        result
    }
}

impl TextGenerator for ProviderClient {
    fn generate(
        &self,
        model: &str,
        system_instruction: &str,
        user_command: &str,
        api_key: &str,
    ) -> GenerationResult {
        let request = GenerationRequest::new(model, system_instruction, user_command);

        match self
            .policy
            .run(self.sleeper.as_ref(), |n| self.attempt(&request, api_key, n))
        {
            Ok(Completion { message, usage }) => {
                info!("Model: {model}");
                info!("Input tokens: {}", usage.input);
                if let Some(cached) = usage.cached {
                    info!("Cached tokens: {cached}");
                }
                info!("Output tokens: {}", usage.output);
                info!("\n{message}");

                GenerationResult::Success { message, usage }
            }
            Err(_) => {
                error!(
                    "Failed to get valid response after {} attempts.",
                    self.policy.max_attempts()
                );
                GenerationResult::Failure
            }
        }
    }
}

/// Pretty-print JSON bodies; leave anything else untouched.
fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string())
}
