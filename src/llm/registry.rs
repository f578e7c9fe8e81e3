use anyhow::{Context, Result};

use super::anthropic::{ANTHROPIC_BASE_URL, AnthropicBackend};
use super::gemini::{GEMINI_BASE_URL, GeminiBackend};
use super::openai::{Flavor, GITHUB_MODELS_BASE_URL, OPENAI_BASE_URL, OpenAiBackend};
use super::prompt_builder::Task;
use super::ChatBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    OpenAi,
    GitHubModels,
    Anthropic,
    Gemini,
}

/// A provider the pipeline can be pointed at with `--provider`.
#[derive(Debug, Clone)]
pub struct ProviderEntry {
    pub name: &'static str,
    /// Environment variable holding the API key.
    pub api_key_env: &'static str,
    pub default_base_url: &'static str,
    default_model: &'static str,
    review_model: &'static str,
    kind: BackendKind,
}

impl ProviderEntry {
    pub fn default_model(&self, task: Task) -> &'static str {
        match task {
            Task::CodeReview => self.review_model,
            Task::Changelog | Task::ErrorAnalysis => self.default_model,
        }
    }

    /// Build the wire backend, optionally against a non-default base URL.
    pub fn backend(&self, base_url: Option<&str>) -> Result<Box<dyn ChatBackend>> {
        let base_url = base_url.unwrap_or(self.default_base_url);
        let backend: Box<dyn ChatBackend> = match self.kind {
            BackendKind::OpenAi => Box::new(OpenAiBackend::new(Flavor::OpenAi, base_url)?),
            BackendKind::GitHubModels => {
                Box::new(OpenAiBackend::new(Flavor::GitHubModels, base_url)?)
            }
            BackendKind::Anthropic => Box::new(AnthropicBackend::new(base_url)?),
            BackendKind::Gemini => Box::new(GeminiBackend::new(base_url)?),
        };
        Ok(backend)
    }
}

/// Maps provider names to their backends and defaults.
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
}

impl ProviderRegistry {
    pub fn builtin() -> Self {
        ProviderRegistry {
            entries: vec![
                ProviderEntry {
                    name: "openai",
                    api_key_env: "OPENAI_API_KEY",
                    default_base_url: OPENAI_BASE_URL,
                    default_model: "gpt-4.1",
                    review_model: "gpt-4.1",
                    kind: BackendKind::OpenAi,
                },
                ProviderEntry {
                    name: "anthropic",
                    api_key_env: "ANTHROPIC_API_KEY",
                    default_base_url: ANTHROPIC_BASE_URL,
                    default_model: "claude-sonnet-4-20250514",
                    review_model: "claude-sonnet-4-20250514",
                    kind: BackendKind::Anthropic,
                },
                ProviderEntry {
                    name: "gemini",
                    api_key_env: "GEMINI_API_KEY",
                    default_base_url: GEMINI_BASE_URL,
                    default_model: "gemini-2.5-pro-preview-06-05",
                    review_model: "gemini-2.5-pro-preview-06-05",
                    kind: BackendKind::Gemini,
                },
                ProviderEntry {
                    name: "github_models",
                    api_key_env: "GITHUB_MODELS_API_KEY",
                    default_base_url: GITHUB_MODELS_BASE_URL,
                    default_model: "openai/gpt-4.1-mini",
                    review_model: "openai/gpt-4.1",
                    kind: BackendKind::GitHubModels,
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.name).collect()
    }
}

/// Look up a provider, failing with the message the pipeline logs show.
pub fn lookup<'a>(registry: &'a ProviderRegistry, name: &str) -> Result<&'a ProviderEntry> {
    registry.get(name).with_context(|| {
        format!(
            "Provider '{name}' is currently not supported. Supported providers: {}",
            registry.names().join(", ")
        )
    })
}
