pub mod openai;
pub mod types;

use async_trait::async_trait;
use types::ChatResponse;

use crate::error::ReviewTaskError;

/// Trait for AI/LLM completion handlers.
///
/// Implementors handle a single provider family (e.g. OpenAI-compatible
/// endpoints). Object-safe for dynamic dispatch via `Arc<dyn AiHandler>`.
#[async_trait]
pub trait AiHandler: Send + Sync {
    /// Send a two-message chat completion request: a system message carrying
    /// the review instructions and a user message carrying the raw diff.
    async fn chat_completion(
        &self,
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<ChatResponse, ReviewTaskError>;
}
