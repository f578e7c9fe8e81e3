use crate::llm::prompts;

/// The three generation tasks a pipeline can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Changelog,
    CodeReview,
    ErrorAnalysis,
}

impl Task {
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Changelog => "changelog",
            Task::CodeReview => "code review",
            Task::ErrorAnalysis => "error analysis",
        }
    }
}

pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Changelog grouped by committer, then by folder under `repo`.
pub fn changelog_prompt(commit_info: &str, diff: &str, repo: &str) -> PromptPair {
    PromptPair {
        system: format!("{}\n{commit_info}\n{diff}\n", prompts::CHANGELOG_SYSTEM),
        user: with_repo(prompts::CHANGELOG_COMMAND, repo),
    }
}

/// Critical-issues-only review formatted as Slack mrkdwn.
pub fn code_review_prompt(diff: &str, repo: &str) -> PromptPair {
    PromptPair {
        system: format!("{}\n{diff}\n", prompts::CODE_REVIEW_SYSTEM),
        user: with_repo(prompts::CODE_REVIEW_COMMAND, repo),
    }
}

/// Build-failure analysis with exactly three sections.
pub fn error_analysis_prompt(logs: &str, repo: &str) -> PromptPair {
    PromptPair {
        system: format!("{}\n{logs}\n", prompts::ERROR_ANALYSIS_SYSTEM),
        user: with_repo(prompts::ERROR_ANALYSIS_COMMAND, repo),
    }
}

fn with_repo(template: &str, repo: &str) -> String {
    template.replace("{repo}", repo)
}

/// Truncate long strings for debug logging.
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((cut, _)) => format!(
            "{}...\n[truncated {} chars]",
            &s[..cut],
            s[cut..].chars().count()
        ),
    }
}
