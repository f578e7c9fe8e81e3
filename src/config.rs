use anyhow::{Result, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli_args::ProviderArgs;
use crate::github::DEFAULT_API_URL;
use crate::llm::prompt_builder::Task;
use crate::llm::registry::ProviderEntry;
use crate::llm::retry::{MAX_ATTEMPTS, RETRY_DELAY, RetryPolicy};

/// Values the CI runner exposes through the environment, read once at startup.
#[derive(Debug, Clone, Default)]
pub struct CiEnv {
    pub repository: Option<String>,
    pub ref_name: Option<String>,
    pub run_id: Option<String>,
    pub sha: Option<String>,
    pub event_before: Option<String>,
    pub actor: Option<String>,
    pub env_file: Option<PathBuf>,
    pub workspace: Option<PathBuf>,
    pub api_url: Option<String>,
}

impl CiEnv {
    pub fn from_env() -> Self {
        CiEnv {
            repository: var("GITHUB_REPOSITORY"),
            ref_name: var("GITHUB_REF_NAME"),
            run_id: var("GITHUB_RUN_ID"),
            sha: var("GITHUB_SHA"),
            event_before: var("GITHUB_EVENT_BEFORE"),
            actor: var("GITHUB_ACTOR"),
            env_file: var("GITHUB_ENV").map(PathBuf::from),
            workspace: var("GITHUB_WORKSPACE").map(PathBuf::from),
            api_url: var("GITHUB_API_URL"),
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn workspace(&self) -> PathBuf {
        self.workspace.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Root folder name used in prompts: the owner segment of "owner/repo".
pub fn repo_name(repository: &str) -> &str {
    repository.split('/').next().unwrap_or(repository)
}

/// Final resolved configuration for one provider call.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub base_url: Option<String>,
    pub retry: RetryPolicy,
}

impl LlmConfig {
    /// Build the final config from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence for the model:
    ///   1. CLI flag (`--model`)
    ///   2. Env var `CIBOT_MODEL`
    ///   3. TOML `[models] <provider> = "..."`
    ///   4. The provider's default for the task
    ///
    /// The API key comes from `--api-key` or the provider's own env var.
    pub fn from_sources(
        args: &ProviderArgs,
        entry: &ProviderEntry,
        task: Task,
        file_cfg: &FileConfig,
    ) -> Result<Self> {
        let model = args
            .model
            .clone()
            .or_else(|| var("CIBOT_MODEL"))
            .or_else(|| file_cfg.models.get(entry.name).cloned())
            .unwrap_or_else(|| entry.default_model(task).to_string());

        let api_key = args
            .api_key
            .clone()
            .or_else(|| var(entry.api_key_env))
            .ok_or_else(|| {
                anyhow!(
                    "{} must be set (or pass --api-key) to use provider '{}'",
                    entry.api_key_env,
                    entry.name
                )
            })?;

        Ok(LlmConfig {
            provider: entry.name.to_string(),
            model,
            api_key,
            base_url: file_cfg.base_urls.get(entry.name).cloned(),
            retry: file_cfg.retry_policy(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Model overrides keyed by provider name.
    #[serde(default)]
    pub models: BTreeMap<String, String>,
    /// API base URL overrides keyed by provider name.
    #[serde(default)]
    pub base_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub delay_secs: Option<u64>,
}

impl FileConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(
            self.retry.max_attempts.unwrap_or(MAX_ATTEMPTS),
            self.retry
                .delay_secs
                .map(Duration::from_secs)
                .unwrap_or(RETRY_DELAY),
        )
    }
}

/// Return `~/.config/cibot.toml`
fn default_config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("cibot.toml"))
}

/// Load the TOML config. A missing file means defaults; a broken one is warned about.
pub fn load_file_config(explicit: Option<&Path>) -> FileConfig {
    let path = match explicit.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => return FileConfig::default(),
    };
    if !path.exists() {
        if explicit.is_some() {
            log::warn!("Config file {:?} does not exist, using defaults", path);
        }
        return FileConfig::default();
    }

    let parsed = fs::read_to_string(&path)
        .map_err(anyhow::Error::from)
        .and_then(|data| toml::from_str::<FileConfig>(&data).map_err(anyhow::Error::from));

    match parsed {
        Ok(cfg) => {
            log::debug!("Loaded config from {:?}", path);
            cfg
        }
        Err(e) => {
            log::warn!("Ignoring config file {:?}: {e}", path);
            FileConfig::default()
        }
    }
}
