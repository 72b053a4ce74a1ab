use std::path::PathBuf;
use std::process::Output;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::ReviewTaskError;

/// Trait for the version-control diff collaborator.
///
/// `changed_files` is the explicit file-enumeration step the pipeline driver
/// needs; `diff_file` produces the per-file unified diff the review engine
/// sends to the model.
#[async_trait]
pub trait DiffProvider: Send + Sync {
    /// Unified diff of one file against the target branch.
    async fn diff_file(
        &self,
        target_branch: &str,
        file_path: &str,
    ) -> Result<String, ReviewTaskError>;

    /// Paths of all files that differ from the target branch.
    async fn changed_files(&self, target_branch: &str) -> Result<Vec<String>, ReviewTaskError>;
}

/// Diff provider shelling out to the `git` binary on the build agent.
pub struct GitCli {
    repo_dir: Option<PathBuf>,
}

impl GitCli {
    pub fn new(repo_dir: Option<PathBuf>) -> Self {
        Self { repo_dir }
    }

    async fn run_git(&self, args: &[&str]) -> Result<String, ReviewTaskError> {
        let mut cmd = Command::new("git");
        if let Some(dir) = &self.repo_dir {
            cmd.current_dir(dir);
        }
        let output = cmd.args(args).output().await?;
        check_git_output(args, output)
    }
}

fn check_git_output(args: &[&str], output: Output) -> Result<String, ReviewTaskError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReviewTaskError::GitDiff(format!(
            "git {} exited with {}: {}",
            args.join(" "),
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl DiffProvider for GitCli {
    async fn diff_file(
        &self,
        target_branch: &str,
        file_path: &str,
    ) -> Result<String, ReviewTaskError> {
        self.run_git(&["diff", target_branch, "--", file_path]).await
    }

    async fn changed_files(&self, target_branch: &str) -> Result<Vec<String>, ReviewTaskError> {
        let stdout = self.run_git(&["diff", "--name-only", target_branch]).await?;
        Ok(parse_name_only(&stdout))
    }
}

/// Parse `git diff --name-only` output into file paths.
fn parse_name_only(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
