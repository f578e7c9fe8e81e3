use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use crate::error::LookupError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// One workflow run as returned by the GitHub Actions API.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub head_sha: String,
    #[serde(default)]
    pub run_number: u64,
}

#[derive(Deserialize)]
struct RunsPage {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

/// Anything that can list successful runs of the pipeline on a branch.
pub trait RunSource {
    fn successful_runs(&self, branch: &str) -> Result<Vec<WorkflowRun>, LookupError>;
}

/// Workflow runs from the GitHub REST API.
pub struct GitHubRuns {
    client: Client,
    api_url: String,
    repository: String,
    workflow_file: String,
    token: String,
}

impl GitHubRuns {
    pub fn new(
        api_url: &str,
        repository: &str,
        workflow_file: &str,
        token: &str,
    ) -> Result<Self, LookupError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("cibot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(LookupError::Client)?;

        Ok(GitHubRuns {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            workflow_file: workflow_file.to_string(),
            token: token.to_string(),
        })
    }

    fn runs_url(&self, branch: &str) -> Result<Url, LookupError> {
        let base = format!(
            "{}/repos/{}/actions/workflows/{}/runs",
            self.api_url, self.repository, self.workflow_file
        );
        Url::parse_with_params(
            &base,
            &[("branch", branch), ("status", "success"), ("per_page", "100")],
        )
        .map_err(|e| LookupError::InvalidUrl(format!("{base}: {e}")))
    }
}

impl RunSource for GitHubRuns {
    fn successful_runs(&self, branch: &str) -> Result<Vec<WorkflowRun>, LookupError> {
        let url = self.runs_url(branch)?;

        log::info!("Querying GitHub API for workflow runs: {url}");

        let resp = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .map_err(|source| LookupError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        let body = resp.text().map_err(|source| LookupError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let runs = parse_runs(&body)?;
        log::info!("Found {} successful workflow runs", runs.len());
        Ok(runs)
    }
}

/// Parse a `GET .../runs` response body.
pub fn parse_runs(body: &str) -> Result<Vec<WorkflowRun>, LookupError> {
    let page: RunsPage = serde_json::from_str(body).map_err(LookupError::Parse)?;
    Ok(page.workflow_runs)
}
