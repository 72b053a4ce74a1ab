use serde::{Deserialize, Serialize};

/// Wire value for an active comment thread.
pub const THREAD_STATUS_ACTIVE: i32 = 1;
/// Wire value for a plain text comment (as opposed to a system event).
pub const COMMENT_TYPE_TEXT: i32 = 1;

/// Azure DevOps wraps collection responses in `{ "value": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueList<T> {
    pub value: Vec<T>,
}

/// A comment thread on the PR.
///
/// `thread_context` is null for general PR comments; threads created by this
/// task are always file-anchored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: u64,
    #[serde(default)]
    pub thread_context: Option<ThreadContext>,
}

impl Thread {
    pub fn is_file_anchored(&self) -> bool {
        self.thread_context.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadContext {
    pub file_path: String,
}

/// A single comment inside a thread.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub parent_comment_id: u64,
    pub author: IdentityRef,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub display_name: String,
}

/// Request body for creating a new comment thread.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThread {
    pub comments: Vec<NewComment>,
    pub status: i32,
    pub thread_context: ThreadContext,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub parent_comment_id: i32,
    pub content: String,
    pub comment_type: i32,
}

impl NewThread {
    /// An active thread with one root text comment, anchored to `file_path`
    /// (repository-relative, a leading `/` is prepended on the wire).
    pub fn for_file(file_path: &str, content: &str) -> Self {
        Self {
            comments: vec![NewComment {
                parent_comment_id: 0,
                content: content.to_string(),
                comment_type: COMMENT_TYPE_TEXT,
            }],
            status: THREAD_STATUS_ACTIVE,
            thread_context: ThreadContext {
                file_path: format!("/{file_path}"),
            },
        }
    }
}
