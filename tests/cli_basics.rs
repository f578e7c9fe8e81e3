use assert_cmd::cargo; // handy crate for testing CLIs
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CI_VARS: &[&str] = &[
    "GITHUB_REPOSITORY",
    "GITHUB_REF_NAME",
    "GITHUB_RUN_ID",
    "GITHUB_SHA",
    "GITHUB_EVENT_BEFORE",
    "GITHUB_ACTOR",
    "GITHUB_ENV",
    "GITHUB_WORKSPACE",
    "GITHUB_API_URL",
    "GITHUB_TOKEN",
    "OPENAI_API_KEY",
    "ANTHROPIC_API_KEY",
    "GEMINI_API_KEY",
    "GITHUB_MODELS_API_KEY",
    "CIBOT_MODEL",
    "CIBOT_CONFIG",
    "RUST_LOG",
];

/// The binary with none of the CI variables leaking in from the host.
fn cibot() -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!();
    for var in CI_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .expect("failed to run git");
    assert!(out.status.success(), "git {args:?} failed: {out:?}");
    String::from_utf8_lossy(&out.stdout).trim().to_string()
}

fn init_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    git(dir.path(), &["init", "--quiet"]);
    git(dir.path(), &["config", "user.name", "Ada Lovelace"]);
    git(dir.path(), &["config", "user.email", "ada@example.com"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    dir
}

fn commit(dir: &Path, file: &str, content: &str, message: &str) -> String {
    fs::write(dir.join(file), content).unwrap();
    git(dir, &["add", file]);
    git(dir, &["commit", "--quiet", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

/// Config pointing the openai provider at `base_url`, with no wait between retries.
fn provider_config(dir: &Path, base_url: &str) -> PathBuf {
    let path = dir.join("cibot.toml");
    fs::write(
        &path,
        format!("[base_urls]\nopenai = \"{base_url}\"\n\n[retry]\ndelay_secs = 0\n"),
    )
    .unwrap();
    path
}

fn chat_reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}],
        "usage": {"prompt_tokens": 42, "completion_tokens": 7}
    }))
}

#[test]
fn prints_help() {
    let mut cmd = cibot();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicates::str::contains("Usage"))
        .stdout(predicates::str::contains("git-context"))
        .stdout(predicates::str::contains("error-analysis"));
}

#[test]
fn prints_version() {
    let mut cmd = cibot();

    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicates::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_required_argument_is_usage_error() {
    cibot()
        .args(["changelog", "--diff", "x", "--provider", "openai"])
        .assert()
        .code(2)
        .stderr(predicates::str::contains("--commit-info"));
}

#[test]
fn unsupported_provider_fails_before_any_call() {
    cibot()
        .args([
            "changelog",
            "--commit-info",
            "Commit: abc",
            "--diff",
            "+line",
            "--provider",
            "unsupported",
        ])
        .assert()
        .code(1)
        .stderr(predicates::str::contains(
            "Provider 'unsupported' is currently not supported",
        ));
}

#[test]
fn missing_api_key_names_the_variable() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("error_analysis.json");

    cibot()
        .env("GITHUB_REPOSITORY", "octo/widgets")
        .args(["error-analysis", "--logs", "boom", "--provider", "openai"])
        .arg("--output")
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicates::str::contains("OPENAI_API_KEY must be set"));

    assert!(!output.exists());
}

#[test]
fn git_context_exports_range_log_and_diff() {
    let repo = init_repo();
    commit(repo.path(), "a.txt", "one\n", "Initial commit");
    let head = commit(repo.path(), "a.txt", "one\ntwo\n", "Add second line");
    let env_file = repo.path().join("github_env");

    cibot()
        .current_dir(repo.path())
        .env("GITHUB_ENV", &env_file)
        .env("GITHUB_SHA", &head)
        .env("GITHUB_WORKSPACE", repo.path())
        .args(["git-context", "--token", "unused"])
        .assert()
        .success()
        .stderr(predicates::str::contains("GITHUB_REPOSITORY"))
        .stderr(predicates::str::contains("Git context preparation completed."));

    let exported = fs::read_to_string(&env_file).unwrap();
    assert!(exported.contains(&format!("COMMIT_RANGE={head}~1..{head}\n")));
    assert!(exported.contains("COMMIT_INFO<<EOF\n"));
    assert!(exported.contains(&format!("Commit: {head}")));
    assert!(exported.contains("Message: Add second line"));
    assert!(!exported.contains("Message: Initial commit"));
    assert!(exported.contains("DIFF<<EOF\n"));
    assert!(exported.contains("+two"));

    let action_log = fs::read_to_string(repo.path().join("github_action_logs/all.log")).unwrap();
    assert!(action_log.contains(&format!("Commit Range: {head}~1..{head}")));
}

#[test]
fn git_context_on_first_commit_diffs_from_empty_tree() {
    let repo = init_repo();
    let head = commit(repo.path(), "readme.md", "hello\n", "Initial commit");
    let env_file = repo.path().join("github_env");

    cibot()
        .current_dir(repo.path())
        .env("GITHUB_ENV", &env_file)
        .env("GITHUB_SHA", &head)
        .env("GITHUB_WORKSPACE", repo.path())
        .args(["git-context", "--token", "unused"])
        .assert()
        .success();

    let exported = fs::read_to_string(&env_file).unwrap();
    assert!(exported.contains(&format!(
        "COMMIT_RANGE=4b825dc642cb6eb9a060e54bf8d69288fbee4904..{head}\n"
    )));
    assert!(exported.contains("Message: Initial commit"));
    assert!(exported.contains("+hello"));
}

#[test]
fn git_context_prints_to_stdout_without_env_file() {
    let repo = init_repo();
    commit(repo.path(), "a.txt", "one\n", "Initial commit");
    let head = commit(repo.path(), "a.txt", "two\n", "Change");

    cibot()
        .current_dir(repo.path())
        .env("GITHUB_SHA", &head)
        .env("GITHUB_WORKSPACE", repo.path())
        .args(["git-context", "--token", "unused"])
        .assert()
        .success()
        .stdout(predicates::str::contains(format!(
            "COMMIT_RANGE={head}~1..{head}"
        )))
        .stdout(predicates::str::contains("DIFF<<EOF"));
}

#[test]
fn git_context_unknown_before_commit_exits_with_git_status() {
    let repo = init_repo();
    let head = commit(repo.path(), "a.txt", "one\n", "Initial commit");

    cibot()
        .current_dir(repo.path())
        .env("GITHUB_SHA", &head)
        .env("GITHUB_WORKSPACE", repo.path())
        .env(
            "GITHUB_EVENT_BEFORE",
            "2222222222222222222222222222222222222222",
        )
        .args(["git-context", "--token", "unused"])
        .assert()
        .code(128)
        .stderr(predicates::str::contains("exited with status"));
}

#[tokio::test]
async fn changelog_is_printed_and_logged() {
    const CHANGELOG: &str = "Ada Lovelace added a second line to octo/a.txt";

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("octo/Folder Name"))
        .and(body_string_contains("Author: Ada Lovelace"))
        .respond_with(chat_reply(CHANGELOG))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = provider_config(dir.path(), &server.uri());
    let output = dir.path().join("CHANGELOG.md");
    let output_arg = output.clone();

    tokio::task::spawn_blocking(move || {
        cibot()
            .env("GITHUB_REPOSITORY", "octo/widgets")
            .env("CIBOT_CONFIG", &config)
            .env("OPENAI_API_KEY", "sk-test")
            .args([
                "changelog",
                "--commit-info",
                "Commit: abc\nAuthor: Ada Lovelace\nMessage: Add second line",
                "--diff",
                "+two",
                "--provider",
                "openai",
                "--output",
            ])
            .arg(&output_arg)
            .assert()
            .success()
            .stdout(predicates::str::contains(CHANGELOG))
            .stderr(predicates::str::contains(CHANGELOG))
            .stderr(predicates::str::contains("Output tokens: 7"));
    })
    .await
    .unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), format!("{CHANGELOG}\n"));
}

#[tokio::test]
async fn code_review_writes_slack_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(chat_reply("No critical issues found."))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = provider_config(dir.path(), &server.uri());
    let output = dir.path().join(".github/slack_payload.json");
    let output_arg = output.clone();

    tokio::task::spawn_blocking(move || {
        cibot()
            .env("GITHUB_REPOSITORY", "octo/widgets")
            .env("GITHUB_ACTOR", "octocat")
            .env("GITHUB_REF_NAME", "main")
            .env("CIBOT_CONFIG", &config)
            .args(["code-review", "--diff", "+two", "--provider", "openai"])
            .args(["--api-key", "sk-test", "--output"])
            .arg(&output_arg)
            .assert()
            .success();
    })
    .await
    .unwrap();

    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(
        payload["text"],
        "*Who:* `octocat`\n\n*Branch:* `main`\n\nNo critical issues found."
    );
}

#[tokio::test]
async fn provider_outage_fails_after_three_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = provider_config(dir.path(), &server.uri());
    let output = dir.path().join("error_analysis.json");
    let output_arg = output.clone();

    tokio::task::spawn_blocking(move || {
        cibot()
            .env("GITHUB_REPOSITORY", "octo/widgets")
            .env("CIBOT_CONFIG", &config)
            .env("OPENAI_API_KEY", "sk-test")
            .args(["error-analysis", "--logs", "error: boom", "--provider", "openai"])
            .arg("--output")
            .arg(&output_arg)
            .assert()
            .code(1)
            .stderr(predicates::str::contains(
                "Failed to get valid response after 3 attempts.",
            ))
            .stderr(predicates::str::contains("Failed to generate error analysis"));
    })
    .await
    .unwrap();

    assert!(!output.exists());
}
