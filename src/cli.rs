use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::ai::openai::OpenAiCompatibleHandler;
use crate::config::loader::init_settings;
use crate::devops::client::AzureDevopsClient;
use crate::devops::url::resolve_build_service_name;
use crate::devops::{PrThreadsApi, delete_existing_comments};
use crate::error::ReviewTaskError;
use crate::git::{DiffProvider, GitCli};
use crate::review::{ReviewEngine, ReviewOutcome};

/// GPT-powered pull request review task for Azure DevOps pipelines.
#[derive(Parser, Debug)]
#[command(name = "gpt-pr-review", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Extra arguments passed as config overrides (--section.key=value).
    /// Place after `--` separator: `gpt-pr-review review ... -- --config.model=gpt-4o`
    #[arg(last = true, allow_hyphen_values = true, global = true)]
    pub rest: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Clean up comments from a previous run, then review changed files.
    Review {
        /// Branch (or ref) the PR targets; files are diffed against it.
        #[arg(long)]
        target_branch: String,

        /// Review only these files instead of enumerating changed ones.
        #[arg(long = "file")]
        files: Vec<String>,

        /// Repository checkout directory (defaults to the working directory).
        #[arg(long)]
        repo_dir: Option<PathBuf>,

        /// Keep comments from previous runs instead of deleting them first.
        #[arg(long)]
        skip_cleanup: bool,
    },
    /// Only delete comments left on the PR by a previous run.
    Cleanup,
    /// Print the resolved configuration.
    Config,
}

/// Forbidden config keys that cannot be overridden via CLI args.
///
/// These are security-sensitive — exposing them to untrusted input could
/// allow secrets exfiltration or provider redirection.
pub const FORBIDDEN_OVERRIDE_KEYS: &[&str] =
    &["openai.key", "access_token", "api_base", "key"];

/// Check if a config key is forbidden for override.
///
/// Returns `Some(matched_forbidden_key)` if the key matches, `None` if allowed.
pub fn check_forbidden_key(key: &str) -> Option<&'static str> {
    let key_lower = key.to_lowercase();
    let segments: Vec<&str> = key_lower.split('.').collect();
    FORBIDDEN_OVERRIDE_KEYS
        .iter()
        .find(|&&forbidden| key_lower == forbidden || segments.contains(&forbidden))
        .copied()
}

/// Parse the `rest` args into a HashMap of config overrides.
/// Format: `--section.key=value` or `--section__key=value` (double underscores → dots).
fn parse_config_overrides(rest: &[String]) -> Result<HashMap<String, String>, ReviewTaskError> {
    let mut overrides = HashMap::new();

    for arg in rest {
        let stripped = arg.trim_start_matches('-');
        if stripped.is_empty() {
            continue;
        }

        let stripped = stripped.replace("__", ".");

        if let Some((key, value)) = stripped.split_once('=') {
            if let Some(forbidden) = check_forbidden_key(key) {
                return Err(ReviewTaskError::Other(format!(
                    "forbidden CLI override: '{key}' (matches '{forbidden}')"
                )));
            }

            overrides.insert(key.to_string(), value.to_string());
        }
    }

    Ok(overrides)
}

pub async fn run() -> Result<(), ReviewTaskError> {
    let cli = Cli::parse();

    let config_overrides = parse_config_overrides(&cli.rest)?;
    let settings = init_settings(&config_overrides)?;

    match cli.command {
        Command::Config => {
            println!("Model: {}", crate::review::resolved_model(&settings));
            println!(
                "Max tokens: {}",
                crate::review::resolved_max_tokens(&settings)
            );
            println!("AI timeout: {}s", settings.config.ai_timeout);
            println!(
                "Build service name: {}",
                resolve_build_service_name(&settings)
            );
            println!(
                "Collection URI: {}",
                settings.azure_devops.collection_uri
            );
        }
        Command::Cleanup => {
            let client = AzureDevopsClient::from_settings()?;
            let name = resolve_build_service_name(&settings);
            let deleted = delete_existing_comments(&client, &name).await?;
            tracing::info!(deleted, "cleanup finished");
        }
        Command::Review {
            target_branch,
            files,
            repo_dir,
            skip_cleanup,
        } => {
            let git = Arc::new(GitCli::new(repo_dir));
            let ai = Arc::new(OpenAiCompatibleHandler::from_settings()?);
            let threads: Arc<dyn PrThreadsApi> = Arc::new(AzureDevopsClient::from_settings()?);

            // Cleanup runs to completion before anything is posted; a failure
            // here aborts the task.
            if skip_cleanup {
                tracing::info!("skipping cleanup of previous comments");
            } else {
                let name = resolve_build_service_name(&settings);
                let deleted = delete_existing_comments(threads.as_ref(), &name).await?;
                tracing::info!(deleted, "previous comments cleaned up");
            }

            let files = if files.is_empty() {
                git.changed_files(&target_branch).await?
            } else {
                files
            };
            tracing::info!(
                num_files = files.len(),
                target_branch = %target_branch,
                model = crate::review::resolved_model(&settings),
                "starting review"
            );

            let engine = ReviewEngine::new(git, ai, threads);
            let results = engine.review_files(&target_branch, &files).await;

            let posted = results
                .iter()
                .filter(|r| r.outcome == ReviewOutcome::Posted)
                .count();
            let clean = results
                .iter()
                .filter(|r| r.outcome == ReviewOutcome::NoFeedback)
                .count();
            let failed = results.len() - posted - clean;
            tracing::info!(posted, no_feedback = clean, failed, "review finished");
        }
    }

    Ok(())
}
