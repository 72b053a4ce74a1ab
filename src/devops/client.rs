use async_trait::async_trait;
use reqwest::Client;

use super::PrThreadsApi;
use super::types::{Comment, NewThread, Thread, ValueList};
use super::url::pr_threads_url;
use crate::config::loader::get_settings;
use crate::error::ReviewTaskError;

/// Azure DevOps PR threads client using raw reqwest for full API control.
///
/// Authenticates every request with the pipeline access token as a bearer
/// token, the same way the hosted build agent does.
pub struct AzureDevopsClient {
    client: Client,
    access_token: String,
}

impl AzureDevopsClient {
    /// Create a new client from the current settings.
    pub fn from_settings() -> Result<Self, ReviewTaskError> {
        let settings = get_settings();
        let client = Client::builder()
            .build()
            .map_err(ReviewTaskError::Http)?;
        Ok(Self {
            client,
            access_token: settings.azure_devops.access_token.clone(),
        })
    }

    /// Check response status; non-2xx becomes an error carrying the HTTP
    /// status code and the response body text. Never swallows a failure.
    async fn check_response(
        resp: reqwest::Response,
        method: &'static str,
    ) -> Result<reqwest::Response, ReviewTaskError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ReviewTaskError::Api {
                method,
                status,
                body,
            });
        }
        Ok(resp)
    }

    async fn api_get(&self, url: &str) -> Result<reqwest::Response, ReviewTaskError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(ReviewTaskError::Http)?;
        Self::check_response(resp, "GET").await
    }
}

#[async_trait]
impl PrThreadsApi for AzureDevopsClient {
    async fn list_threads(&self) -> Result<Vec<Thread>, ReviewTaskError> {
        let settings = get_settings();
        let url = pr_threads_url(&settings.azure_devops, None, None)?;
        let resp = self.api_get(&url).await?;
        let threads: ValueList<Thread> = resp.json().await.map_err(ReviewTaskError::Http)?;
        Ok(threads.value)
    }

    async fn list_comments(&self, thread_id: u64) -> Result<Vec<Comment>, ReviewTaskError> {
        let settings = get_settings();
        let url = pr_threads_url(&settings.azure_devops, Some(thread_id), None)?;
        let resp = self.api_get(&url).await?;
        let comments: ValueList<Comment> = resp.json().await.map_err(ReviewTaskError::Http)?;
        Ok(comments.value)
    }

    async fn create_thread(&self, thread: &NewThread) -> Result<(), ReviewTaskError> {
        let settings = get_settings();
        let url = pr_threads_url(&settings.azure_devops, None, None)?;
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(thread)
            .send()
            .await
            .map_err(ReviewTaskError::Http)?;
        Self::check_response(resp, "POST").await?;
        Ok(())
    }

    async fn delete_comment(
        &self,
        thread_id: u64,
        comment_id: u64,
    ) -> Result<(), ReviewTaskError> {
        let settings = get_settings();
        let url = pr_threads_url(&settings.azure_devops, Some(thread_id), Some(comment_id))?;
        let resp = self
            .client
            .delete(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(ReviewTaskError::Http)?;
        Self::check_response(resp, "DELETE").await?;
        Ok(())
    }
}
