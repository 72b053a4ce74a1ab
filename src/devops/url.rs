use crate::config::types::{AzureDevopsConfig, Settings};
use crate::error::ReviewTaskError;

/// All thread/comment REST calls are pinned to this API version.
pub const API_VERSION: &str = "5.0";

/// Build the REST endpoint for the PR's comment threads.
///
/// With no ids this is the threads collection; `thread_id` narrows it to a
/// thread's comments collection and `comment_id` to a single comment.
/// Fails with the missing pipeline variable's name if any of the four PR
/// identifiers is absent — this runs before any network call is made.
pub fn pr_threads_url(
    az: &AzureDevopsConfig,
    thread_id: Option<u64>,
    comment_id: Option<u64>,
) -> Result<String, ReviewTaskError> {
    if az.collection_uri.is_empty() {
        return Err(ReviewTaskError::MissingVariable(
            "System.TeamFoundationCollectionUri",
        ));
    }
    if az.project_id.is_empty() {
        return Err(ReviewTaskError::MissingVariable("System.TeamProjectId"));
    }
    if az.repository_id.is_empty() {
        return Err(ReviewTaskError::MissingVariable("Build.Repository.ID"));
    }
    if az.pull_request_id.is_empty() {
        return Err(ReviewTaskError::MissingVariable(
            "System.PullRequest.PullRequestId",
        ));
    }

    let mut url = format!(
        "{}{}/_apis/git/repositories/{}/pullRequests/{}/threads",
        az.collection_uri, az.project_id, az.repository_id, az.pull_request_id
    );
    if let Some(thread_id) = thread_id {
        url.push_str(&format!("/{thread_id}/comments"));
        if let Some(comment_id) = comment_id {
            url.push_str(&format!("/{comment_id}"));
        }
    }

    tracing::debug!(%url, "DevOps URL constructed");
    Ok(format!("{url}?api-version={API_VERSION}"))
}

/// Extract the collection (organization) name from a collection URI.
///
/// The hosting product has two historical URL shapes:
/// `https://fabrikam.visualstudio.com/` (legacy hosted service) and
/// `https://dev.azure.com/myorg/` (organization-based).
pub fn collection_name(collection_uri: &str) -> String {
    let without_protocol = collection_uri
        .replace("https://", "")
        .replace("http://", "");

    if let Some((host, _)) = without_protocol.split_once(".visualstudio.") {
        host.to_string()
    } else {
        without_protocol
            .split('/')
            .nth(1)
            .unwrap_or_default()
            .to_string()
    }
}

/// Display name the task posts comments under: the explicit override input,
/// or the computed `"{team project} Build Service ({collection})"` default.
pub fn resolve_build_service_name(settings: &Settings) -> String {
    if !settings.azure_devops.build_service_name.is_empty() {
        return settings.azure_devops.build_service_name.clone();
    }
    let collection = collection_name(&settings.azure_devops.collection_uri);
    format!(
        "{} Build Service ({})",
        settings.azure_devops.project_name, collection
    )
}
