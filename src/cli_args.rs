use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "cibot",
    version,
    about = "LLM-generated changelogs, code reviews and build-failure analyses for CI pipelines"
)]
pub struct Cli {
    /// Debug mode: log prompts, responses and config resolution
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to a TOML config file (defaults to ~/.config/cibot.toml)
    #[arg(long, env = "CIBOT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Which provider to call, and how.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// Provider name: openai, anthropic, gemini or github_models
    #[arg(long)]
    pub provider: String,

    /// Model name; defaults to the provider's model for the task
    #[arg(long)]
    pub model: Option<String>,

    /// API key (otherwise read from the provider's env var, e.g. OPENAI_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the commits since the last successful run and export their log and diff
    GitContext {
        /// GitHub token used to query workflow runs
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,

        /// Workflow file whose successful runs mark the start of the range
        #[arg(long, default_value = "deploy.yml")]
        workflow_file_name: String,
    },

    /// Generate a changelog grouped by committer and folder
    Changelog {
        /// Commit log for the range (as exported by git-context)
        #[arg(long)]
        commit_info: String,

        /// Diff for the range (as exported by git-context)
        #[arg(long)]
        diff: String,

        #[command(flatten)]
        provider: ProviderArgs,

        /// Also write the changelog to this file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Review a diff for critical issues and write a Slack payload
    CodeReview {
        /// Diff to review
        #[arg(long)]
        diff: String,

        #[command(flatten)]
        provider: ProviderArgs,

        /// Where to write the Slack payload JSON
        #[arg(long, default_value = ".github/slack_payload.json")]
        output: PathBuf,
    },

    /// Explain why a build failed from its logs
    ErrorAnalysis {
        /// Build step logs
        #[arg(long)]
        logs: String,

        /// Slack member id to include in the output for mentions
        #[arg(long, default_value = "")]
        slack_id: String,

        #[command(flatten)]
        provider: ProviderArgs,

        /// Where to write the analysis JSON
        #[arg(long, default_value = ".github/error_analysis.json")]
        output: PathBuf,
    },
}
