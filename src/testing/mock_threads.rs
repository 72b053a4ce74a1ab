use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::devops::PrThreadsApi;
use crate::devops::types::{Comment, IdentityRef, NewThread, Thread, ThreadContext};
use crate::error::ReviewTaskError;

/// Captured calls made to the mock threads API, for test assertions.
#[derive(Debug, Default)]
pub struct MockThreadCalls {
    pub created_threads: Vec<NewThread>,
    pub deleted_comments: Vec<(u64, u64)>,
    pub listed_comment_threads: Vec<u64>,
}

/// Mock of the PR comment-thread REST surface.
///
/// Pre-configured with thread/comment fixtures; captures create/delete calls
/// for assertions. Failure switches simulate non-2xx responses.
#[derive(Default)]
pub struct MockThreadsApi {
    threads: Vec<Thread>,
    comments: HashMap<u64, Vec<Comment>>,
    fail_creates: bool,
    fail_deletes: bool,
    calls: Mutex<MockThreadCalls>,
}

impl MockThreadsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixture thread. `file_path = None` makes it a general PR
    /// comment thread (null threadContext on the wire).
    pub fn with_thread(
        mut self,
        id: u64,
        file_path: Option<&str>,
        comments: Vec<(u64, &str)>,
    ) -> Self {
        self.threads.push(Thread {
            id,
            thread_context: file_path.map(|p| ThreadContext {
                file_path: p.to_string(),
            }),
        });
        self.comments.insert(
            id,
            comments
                .into_iter()
                .map(|(comment_id, author)| Comment {
                    id: comment_id,
                    parent_comment_id: 0,
                    author: IdentityRef {
                        display_name: author.to_string(),
                    },
                    content: String::new(),
                })
                .collect(),
        );
        self
    }

    pub fn failing_creates(mut self) -> Self {
        self.fail_creates = true;
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn get_calls(&self) -> MutexGuard<'_, MockThreadCalls> {
        self.calls.lock().unwrap()
    }

    fn api_error(method: &'static str) -> ReviewTaskError {
        ReviewTaskError::Api {
            method,
            status: 500,
            body: "mock failure".into(),
        }
    }
}

#[async_trait]
impl PrThreadsApi for MockThreadsApi {
    async fn list_threads(&self) -> Result<Vec<Thread>, ReviewTaskError> {
        Ok(self.threads.clone())
    }

    async fn list_comments(&self, thread_id: u64) -> Result<Vec<Comment>, ReviewTaskError> {
        self.calls
            .lock()
            .unwrap()
            .listed_comment_threads
            .push(thread_id);
        Ok(self.comments.get(&thread_id).cloned().unwrap_or_default())
    }

    async fn create_thread(&self, thread: &NewThread) -> Result<(), ReviewTaskError> {
        if self.fail_creates {
            return Err(Self::api_error("POST"));
        }
        self.calls
            .lock()
            .unwrap()
            .created_threads
            .push(thread.clone());
        Ok(())
    }

    async fn delete_comment(
        &self,
        thread_id: u64,
        comment_id: u64,
    ) -> Result<(), ReviewTaskError> {
        if self.fail_deletes {
            return Err(Self::api_error("DELETE"));
        }
        self.calls
            .lock()
            .unwrap()
            .deleted_comments
            .push((thread_id, comment_id));
        Ok(())
    }
}
