pub mod client;
pub mod types;
pub mod url;

use async_trait::async_trait;
use types::{Comment, NewThread, Thread};

use crate::error::ReviewTaskError;

/// Trait over the PR comment-thread REST surface.
///
/// The HTTP implementation is `client::AzureDevopsClient`; tests substitute
/// a mock. Object-safe for dynamic dispatch via `Arc<dyn PrThreadsApi>`.
#[async_trait]
pub trait PrThreadsApi: Send + Sync {
    /// All comment threads on the PR.
    async fn list_threads(&self) -> Result<Vec<Thread>, ReviewTaskError>;

    /// All comments in one thread.
    async fn list_comments(&self, thread_id: u64) -> Result<Vec<Comment>, ReviewTaskError>;

    /// Create a new thread on the PR.
    async fn create_thread(&self, thread: &NewThread) -> Result<(), ReviewTaskError>;

    /// Delete a single comment by its (thread, comment) pair.
    async fn delete_comment(&self, thread_id: u64, comment_id: u64)
    -> Result<(), ReviewTaskError>;
}

/// Post review feedback as a new active thread anchored to `file_path`.
pub async fn add_comment(
    api: &dyn PrThreadsApi,
    file_path: &str,
    text: &str,
) -> Result<(), ReviewTaskError> {
    api.create_thread(&NewThread::for_file(file_path, text))
        .await?;
    tracing::debug!(file = file_path, "new comment added to PR");
    Ok(())
}

/// Delete every comment a previous run of this task left on the PR.
///
/// Only file-anchored threads are inspected (general PR conversation is
/// never touched), and within them only comments whose author display name
/// exactly equals `build_service_name` are deleted. Any API failure aborts
/// the pass and propagates; deletions already applied stay applied.
pub async fn delete_existing_comments(
    api: &dyn PrThreadsApi,
    build_service_name: &str,
) -> Result<u32, ReviewTaskError> {
    tracing::debug!(
        display_name = build_service_name,
        "deleting comments left by a previous run"
    );

    let threads = api.list_threads().await?;
    let mut deleted = 0u32;

    for thread in threads.iter().filter(|t| t.is_file_anchored()) {
        let comments = api.list_comments(thread.id).await?;
        for comment in comments
            .iter()
            .filter(|c| c.author.display_name == build_service_name)
        {
            api.delete_comment(thread.id, comment.id).await?;
            tracing::debug!(
                thread_id = thread.id,
                comment_id = comment.id,
                "deleted comment"
            );
            deleted += 1;
        }
    }

    tracing::debug!(deleted, "existing comments deleted");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::mock_threads::MockThreadsApi;

    const BOT: &str = "MyProject Build Service (myorg)";

    #[tokio::test]
    async fn test_add_comment_posts_active_file_anchored_thread() {
        let api = MockThreadsApi::new();
        add_comment(&api, "src/lib.rs", "Consider renaming X")
            .await
            .unwrap();

        let calls = api.get_calls();
        assert_eq!(calls.created_threads.len(), 1);
        let thread = &calls.created_threads[0];
        assert_eq!(thread.status, types::THREAD_STATUS_ACTIVE);
        assert_eq!(thread.thread_context.file_path, "/src/lib.rs");
        assert_eq!(thread.comments.len(), 1);
        assert_eq!(thread.comments[0].parent_comment_id, 0);
        assert_eq!(thread.comments[0].comment_type, types::COMMENT_TYPE_TEXT);
        assert_eq!(thread.comments[0].content, "Consider renaming X");
    }

    #[tokio::test]
    async fn test_cleanup_deletes_only_own_comments() {
        let api = MockThreadsApi::new()
            .with_thread(1, Some("/src/a.rs"), vec![(10, BOT), (11, "Jordan Doe")])
            .with_thread(2, Some("/src/b.rs"), vec![(20, BOT), (21, BOT)]);

        let deleted = delete_existing_comments(&api, BOT).await.unwrap();
        assert_eq!(deleted, 3);

        let calls = api.get_calls();
        let mut removed = calls.deleted_comments.clone();
        removed.sort_unstable();
        assert_eq!(removed, vec![(1, 10), (2, 20), (2, 21)]);
    }

    #[tokio::test]
    async fn test_cleanup_skips_general_threads() {
        // Thread 2 has no threadContext: a general PR comment written under
        // the bot identity must survive cleanup.
        let api = MockThreadsApi::new()
            .with_thread(1, Some("/src/a.rs"), vec![(10, BOT)])
            .with_thread(2, None, vec![(20, BOT)]);

        let deleted = delete_existing_comments(&api, BOT).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(api.get_calls().deleted_comments, vec![(1, 10)]);
        // The general thread's comments were never even listed.
        assert_eq!(api.get_calls().listed_comment_threads, vec![1]);
    }

    #[tokio::test]
    async fn test_cleanup_with_no_matching_author_deletes_nothing() {
        let api = MockThreadsApi::new().with_thread(
            1,
            Some("/src/a.rs"),
            vec![(10, "Jordan Doe"), (11, "Sam Reviewer")],
        );

        let deleted = delete_existing_comments(&api, BOT).await.unwrap();
        assert_eq!(deleted, 0);
        assert!(api.get_calls().deleted_comments.is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_propagates_api_failure() {
        let api = MockThreadsApi::new()
            .with_thread(1, Some("/src/a.rs"), vec![(10, BOT)])
            .failing_deletes();

        let err = delete_existing_comments(&api, BOT).await.unwrap_err();
        assert!(matches!(err, ReviewTaskError::Api { status: 500, .. }));
    }
}
