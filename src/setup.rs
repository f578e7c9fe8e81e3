use anyhow::Result;
use log::debug;

use crate::config::LlmConfig;
use crate::llm::client::ProviderClient;
use crate::llm::registry::ProviderEntry;

/// Build the provider client based on CLI + config.
pub fn build_provider_client(entry: &ProviderEntry, cfg: &LlmConfig) -> Result<ProviderClient> {
    debug!(
        "Using provider {} with model {} ({} attempts, {}s apart)",
        cfg.provider,
        cfg.model,
        cfg.retry.max_attempts(),
        cfg.retry.delay().as_secs()
    );
    if let Some(url) = &cfg.base_url {
        debug!("Overriding {} base URL: {url}", cfg.provider);
    }

    let backend = entry.backend(cfg.base_url.as_deref())?;
    Ok(ProviderClient::new(backend, cfg.retry))
}
