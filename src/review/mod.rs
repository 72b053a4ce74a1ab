use std::sync::Arc;

use crate::ai::AiHandler;
use crate::config::loader::get_settings;
use crate::config::types::Settings;
use crate::devops::{PrThreadsApi, add_comment};
use crate::error::ReviewTaskError;
use crate::git::DiffProvider;

/// Reply meaning the model found nothing to say. Comparison is exact
/// (case- and punctuation-sensitive) after trimming, matching the wording
/// the embedded rubric asks the model to use.
pub const NO_FEEDBACK_SENTINEL: &str = "No feedback.";

/// Model used when the `model` task input is not set.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Output token budget used when the `max_tokens` input is missing or not
/// a number.
pub const DEFAULT_MAX_TOKENS: u32 = 10_000;

/// What happened to one file's review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Feedback was posted as a new comment thread on the file.
    Posted,
    /// The model replied with the no-feedback sentinel; nothing was posted.
    NoFeedback,
    /// Something failed; logged, never re-raised to the caller.
    Failed(String),
}

/// Per-file result of a batch run.
#[derive(Debug, Clone)]
pub struct FileReview {
    pub file: String,
    pub outcome: ReviewOutcome,
}

/// Reviews one file at a time: pulls the diff, asks the model, posts the
/// feedback unless the model had none.
///
/// Holds no mutable state, so per-file reviews are safe to run sequentially
/// or concurrently.
pub struct ReviewEngine {
    diff: Arc<dyn DiffProvider>,
    ai: Arc<dyn AiHandler>,
    threads: Arc<dyn PrThreadsApi>,
}

impl ReviewEngine {
    pub fn new(
        diff: Arc<dyn DiffProvider>,
        ai: Arc<dyn AiHandler>,
        threads: Arc<dyn PrThreadsApi>,
    ) -> Self {
        Self { diff, ai, threads }
    }

    /// Review a single file.
    ///
    /// This is the error boundary for the batch: every failure in the
    /// diff/completion/post chain is logged and folded into
    /// `ReviewOutcome::Failed` so one broken file never aborts the others.
    pub async fn review_file(&self, target_branch: &str, file_name: &str) -> ReviewOutcome {
        match self.review_file_inner(target_branch, file_name).await {
            Ok(outcome) => {
                tracing::debug!(file = file_name, "review completed");
                outcome
            }
            Err(e) => {
                log_review_error(&e, file_name);
                ReviewOutcome::Failed(e.to_string())
            }
        }
    }

    async fn review_file_inner(
        &self,
        target_branch: &str,
        file_name: &str,
    ) -> Result<ReviewOutcome, ReviewTaskError> {
        tracing::debug!(file = file_name, "start reviewing");

        let patch = self.diff.diff_file(target_branch, file_name).await?;

        let settings = get_settings();
        let model = resolved_model(&settings);
        let instructions = resolved_instructions(&settings);
        let max_tokens = resolved_max_tokens(&settings);

        let response = self
            .ai
            .chat_completion(model, instructions, &patch, max_tokens)
            .await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                file = file_name,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                finish_reason = ?response.finish_reason,
                "completion received"
            );
        }

        let feedback = response.content.trim();
        if feedback == NO_FEEDBACK_SENTINEL {
            return Ok(ReviewOutcome::NoFeedback);
        }

        add_comment(self.threads.as_ref(), file_name, feedback).await?;
        Ok(ReviewOutcome::Posted)
    }

    /// Review files sequentially, collecting each file's outcome.
    pub async fn review_files(&self, target_branch: &str, files: &[String]) -> Vec<FileReview> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            let outcome = self.review_file(target_branch, file).await;
            results.push(FileReview {
                file: file.clone(),
                outcome,
            });
        }
        results
    }
}

/// HTTP-style failures get their status and body logged; everything else
/// just the message.
fn log_review_error(error: &ReviewTaskError, file_name: &str) {
    match error {
        ReviewTaskError::Api { status, body, .. } => {
            tracing::error!(file = file_name, status = *status, body = %body, "review failed");
        }
        _ => {
            tracing::error!(file = file_name, error = %error, "review failed");
        }
    }
}

/// Effective model: the `model` input, or the fixed default.
pub fn resolved_model(settings: &Settings) -> &str {
    if settings.config.model.is_empty() {
        DEFAULT_MODEL
    } else {
        &settings.config.model
    }
}

/// Effective instructions: the `instructions` input, or the embedded rubric.
pub fn resolved_instructions(settings: &Settings) -> &str {
    if settings.config.instructions.is_empty() {
        &settings.review_prompt.system
    } else {
        &settings.config.instructions
    }
}

/// Effective token budget: the `max_tokens` input parsed as an integer, or
/// the fixed default. A non-numeric override falls back silently.
pub fn resolved_max_tokens(settings: &Settings) -> u32 {
    settings
        .config
        .max_tokens
        .trim()
        .parse()
        .unwrap_or(DEFAULT_MAX_TOKENS)
}
