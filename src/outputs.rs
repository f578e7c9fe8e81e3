//! Artifacts handed to later pipeline steps.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const HEREDOC_DELIMITER: &str = "EOF";

/// Append-only writer for the `GITHUB_ENV` file.
pub struct GithubEnvFile {
    path: PathBuf,
}

impl GithubEnvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GithubEnvFile { path: path.into() }
    }

    /// Append `NAME=value`.
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        self.append(&format!("{name}={value}\n"))
    }

    /// Append a multi-line value using the heredoc form.
    pub fn set_multiline(&self, name: &str, value: &str) -> Result<()> {
        self.append(&multiline_entry(name, value))
    }

    fn append(&self, text: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open env file {:?}", self.path))?;
        file.write_all(text.as_bytes())
            .with_context(|| format!("failed to write env file {:?}", self.path))?;
        Ok(())
    }
}

/// `NAME<<DELIM\nvalue\nDELIM\n`, with a delimiter that no line of `value` equals.
pub fn multiline_entry(name: &str, value: &str) -> String {
    let delimiter = heredoc_delimiter(value);
    format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
}

fn heredoc_delimiter(value: &str) -> String {
    let mut delimiter = HEREDOC_DELIMITER.to_string();
    let mut n = 0;
    while value.lines().any(|line| line == delimiter) {
        n += 1;
        delimiter = format!("{HEREDOC_DELIMITER}_{n}");
    }
    delimiter
}

/// Append a message to `<workspace>/github_action_logs/all.log`.
pub fn append_action_log(workspace: &Path, message: &str) -> Result<()> {
    let dir = workspace.join("github_action_logs");
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {:?}", dir))?;

    let path = dir.join("all.log");
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {:?}", path))?;
    writeln!(file, "{message}").with_context(|| format!("failed to write log file {:?}", path))?;
    Ok(())
}

/// Slack message body posted by a later step.
#[derive(Debug, Serialize)]
pub struct SlackPayload {
    pub text: String,
}

impl SlackPayload {
    pub fn code_review(actor: &str, branch: &str, review: &str) -> Self {
        SlackPayload {
            text: format!("*Who:* `{actor}`\n\n*Branch:* `{branch}`\n\n{review}"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorAnalysisPayload {
    pub error_analysis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slack_id: Option<String>,
}

/// Write a JSON artifact, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {:?}", parent))?;
    }
    let json = serde_json::to_string(value).context("failed to encode JSON artifact")?;
    fs::write(path, json).with_context(|| format!("failed to write {:?}", path))?;
    Ok(())
}
