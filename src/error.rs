//! Error types for the git, GitHub and provider seams.

use thiserror::Error;

/// Errors from running git subprocesses.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("failed to run git {args:?}: {source}")]
    Spawn {
        args: Vec<String>,
        #[source]
        source: std::io::Error,
    },

    #[error("git {args:?} exited with status {code:?}: {stderr}")]
    Failed {
        args: Vec<String>,
        code: Option<i32>,
        stderr: String,
    },
}

impl GitError {
    /// Process exit code to surface for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            GitError::Failed {
                code: Some(code), ..
            } if *code != 0 => u8::try_from(*code).unwrap_or(1),
            _ => 1,
        }
    }
}

/// Errors while looking up previous workflow runs. Never fatal.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("missing required GitHub environment variable {0}")]
    MissingEnv(&'static str),

    #[error("invalid GitHub API URL: {0}")]
    InvalidUrl(String),

    #[error("failed to set up GitHub client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to query GitHub API at {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GitHub API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse workflow runs: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Errors from a single provider request attempt.
#[derive(Error, Debug)]
pub enum AttemptError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("provider returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("failed to parse API response: {reason}")]
    Parse { reason: String, body: String },

    #[error("received empty message from API")]
    EmptyMessage,
}

impl AttemptError {
    /// Response body worth logging alongside the error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            AttemptError::Status { body, .. } | AttemptError::Parse { body, .. } => Some(body),
            _ => None,
        }
    }
}
