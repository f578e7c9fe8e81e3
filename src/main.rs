#[macro_use]
mod logging;

mod cli_args;
mod config;
mod error;
mod git;
mod github;
mod llm;
mod outputs;
mod range;
mod sanitize;
mod setup;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crate::cli_args::{Cli, Command, ProviderArgs};
use crate::config::{CiEnv, LlmConfig};
use crate::error::{GitError, LookupError};
use crate::git::GitRepo;
use crate::github::{GitHubRuns, RunSource};
use crate::llm::prompt_builder::{self, PromptPair, Task};
use crate::llm::registry::{self, ProviderRegistry};
use crate::llm::TextGenerator;
use crate::outputs::{ErrorAnalysisPayload, GithubEnvFile, SlackPayload};
use crate::range::{RangeTarget, resolve_range};
use crate::sanitize::sanitize;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logger(cli.debug);

    let ci = CiEnv::from_env();

    match run(&cli, &ci) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Git failures exit with git's own status; everything else exits with 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<GitError>()
        .map(GitError::exit_code)
        .unwrap_or(1)
}

fn run(cli: &Cli, ci: &CiEnv) -> Result<()> {
    match &cli.command {
        Command::GitContext {
            token,
            workflow_file_name,
        } => run_git_context(ci, token, workflow_file_name),
        Command::Changelog {
            commit_info,
            diff,
            provider,
            output,
        } => run_changelog(cli, ci, commit_info, diff, provider, output.as_deref()),
        Command::CodeReview {
            diff,
            provider,
            output,
        } => run_code_review(cli, ci, diff, provider, output),
        Command::ErrorAnalysis {
            logs,
            slack_id,
            provider,
            output,
        } => run_error_analysis(cli, ci, logs, slack_id, provider, output),
    }
}

/// Resolve the commit range, extract its log and diff, and export both.
fn run_git_context(ci: &CiEnv, token: &str, workflow_file_name: &str) -> Result<()> {
    info!("Starting to prepare Git context...");

    let runs = match ci.repository.as_deref() {
        Some(repository) => GitHubRuns::new(ci.api_url(), repository, workflow_file_name, token),
        None => Err(LookupError::MissingEnv("GITHUB_REPOSITORY")),
    };

    let target = RangeTarget {
        branch: ci.ref_name.clone(),
        current_commit: ci.sha.clone().unwrap_or_else(|| "HEAD".to_string()),
        current_run_id: ci.run_id.clone(),
        before_commit: ci.event_before.clone(),
    };

    info!("Finding last successful run...");
    let source = match &runs {
        Ok(runs) => Ok(runs as &dyn RunSource),
        Err(e) => Err(e),
    };
    let range = resolve_range(source, &target);

    let repo = GitRepo::at(ci.workspace());
    let range = repo.anchor(range)?;
    info!("Using commit range: {range}");

    let ctx = repo.extract(&range)?;

    info!("Setting environment variables...");
    match &ci.env_file {
        Some(path) => {
            let env_file = GithubEnvFile::new(path);
            env_file.set("COMMIT_RANGE", &range.to_string())?;
            env_file.set_multiline("COMMIT_INFO", &ctx.commit_info)?;
            env_file.set_multiline("DIFF", &ctx.diff)?;
            info!("Environment variables are set.");
        }
        None => {
            warn!("GITHUB_ENV is not set, printing the context to stdout instead");
            println!("COMMIT_RANGE={range}");
            print!("{}", outputs::multiline_entry("COMMIT_INFO", &ctx.commit_info));
            print!("{}", outputs::multiline_entry("DIFF", &ctx.diff));
        }
    }

    info!("Adding commit information and diff to logs...");
    let log_message = format!(
        "\nCommit Range: {range}\n\nCommit Info:\n{}\n\nDiff:\n{}\n",
        ctx.commit_info, ctx.diff
    );
    outputs::append_action_log(&ci.workspace(), &log_message)?;
    info!("Commit information and diff added to logs.");

    success!("Git context preparation completed.");
    Ok(())
}

fn run_changelog(
    cli: &Cli,
    ci: &CiEnv,
    commit_info: &str,
    diff: &str,
    provider: &ProviderArgs,
    output: Option<&Path>,
) -> Result<()> {
    let changelog = generate_for_task(cli, ci, provider, Task::Changelog, |repo| {
        prompt_builder::changelog_prompt(&sanitize(commit_info), &sanitize(diff), repo)
    })?;

    println!("{changelog}");

    if let Some(path) = output {
        fs::write(path, format!("{changelog}\n"))
            .with_context(|| format!("failed to write changelog to {:?}", path))?;
        info!("Changelog written to {:?}", path);
    }

    success!("Changelog generated.");
    Ok(())
}

fn run_code_review(
    cli: &Cli,
    ci: &CiEnv,
    diff: &str,
    provider: &ProviderArgs,
    output: &Path,
) -> Result<()> {
    let review = generate_for_task(cli, ci, provider, Task::CodeReview, |repo| {
        prompt_builder::code_review_prompt(&sanitize(diff), repo)
    })?;

    info!("Creating payload for the message to be posted on Slack.");
    let payload = SlackPayload::code_review(
        ci.actor.as_deref().unwrap_or("unknown"),
        ci.ref_name.as_deref().unwrap_or("unknown"),
        &review,
    );
    outputs::write_json(output, &payload)?;
    info!("Payload for Slack message created successfully.");

    success!("Code review generated.");
    Ok(())
}

fn run_error_analysis(
    cli: &Cli,
    ci: &CiEnv,
    logs: &str,
    slack_id: &str,
    provider: &ProviderArgs,
    output: &Path,
) -> Result<()> {
    let analysis = generate_for_task(cli, ci, provider, Task::ErrorAnalysis, |repo| {
        prompt_builder::error_analysis_prompt(&sanitize(logs), repo)
    })?;

    info!("Adding error analysis to file");
    let slack_id = slack_id.trim();
    let payload = ErrorAnalysisPayload {
        error_analysis: analysis,
        slack_id: (!slack_id.is_empty()).then(|| slack_id.to_string()),
    };
    outputs::write_json(output, &payload)?;
    info!("Error analysis added to file successfully.");

    success!("Error analysis generated.");
    Ok(())
}

/// Shared flow for the generation subcommands: pick the provider, build the
/// prompt, call the model, and hand back the text.
fn generate_for_task<F>(
    cli: &Cli,
    ci: &CiEnv,
    args: &ProviderArgs,
    task: Task,
    build_prompt: F,
) -> Result<String>
where
    F: FnOnce(&str) -> PromptPair,
{
    let providers = ProviderRegistry::builtin();
    let entry = registry::lookup(&providers, &args.provider)?;

    let repo = repository_name(ci)?;

    info!("Creating payload for {} generation...", task.as_str());
    let prompts = build_prompt(&repo);
    debug!(
        "System instruction:\n{}",
        prompt_builder::truncate(&prompts.system, 3000)
    );
    debug!("Command:\n{}", prompts.user);
    info!("Completed creating payload for {} generation.", task.as_str());

    let file_cfg = config::load_file_config(cli.config.as_deref());
    let cfg = LlmConfig::from_sources(args, entry, task, &file_cfg)?;
    let client = setup::build_provider_client(entry, &cfg)?;

    info!("Generating {}...", task.as_str());
    let result = client.generate(&cfg.model, &prompts.system, &prompts.user, &cfg.api_key);
    info!("Completed generating {}.", task.as_str());

    result
        .message()
        .map(str::to_string)
        .with_context(|| format!("Failed to generate {}", task.as_str()))
}

/// Repository name used as the root folder in prompts.
fn repository_name(ci: &CiEnv) -> Result<String> {
    if let Some(repository) = &ci.repository {
        return Ok(config::repo_name(repository).to_string());
    }

    let detected = GitRepo::at(ci.workspace())
        .detect_repo_id()
        .context("GITHUB_REPOSITORY is not set and no origin remote was found")?;
    debug!("Detected repository {detected} from remote.origin.url");
    Ok(config::repo_name(&detected).to_string())
}
