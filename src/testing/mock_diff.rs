use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::error::ReviewTaskError;
use crate::git::DiffProvider;

/// Mock diff provider with canned per-file patches and optional failures.
#[derive(Default)]
pub struct MockDiffProvider {
    patches: HashMap<String, String>,
    failing_files: HashSet<String>,
    fail_all: Option<String>,
}

impl MockDiffProvider {
    pub fn with_patch(file: &str, patch: &str) -> Self {
        let mut provider = Self::default();
        provider.patches.insert(file.into(), patch.into());
        provider
    }

    /// Create a mock where every diff request fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_all: Some(message.into()),
            ..Default::default()
        }
    }

    /// Make diffs for one specific file fail while others succeed.
    pub fn and_failing_file(mut self, file: &str) -> Self {
        self.failing_files.insert(file.into());
        self
    }
}

#[async_trait]
impl DiffProvider for MockDiffProvider {
    async fn diff_file(
        &self,
        _target_branch: &str,
        file_path: &str,
    ) -> Result<String, ReviewTaskError> {
        if let Some(message) = &self.fail_all {
            return Err(ReviewTaskError::GitDiff(message.clone()));
        }
        if self.failing_files.contains(file_path) {
            return Err(ReviewTaskError::GitDiff(format!(
                "mock diff failure for {file_path}"
            )));
        }
        Ok(self.patches.get(file_path).cloned().unwrap_or_default())
    }

    async fn changed_files(&self, _target_branch: &str) -> Result<Vec<String>, ReviewTaskError> {
        let mut files: Vec<String> = self
            .patches
            .keys()
            .chain(self.failing_files.iter())
            .cloned()
            .collect();
        files.sort();
        Ok(files)
    }
}
