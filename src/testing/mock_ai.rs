use std::sync::Mutex;

use async_trait::async_trait;

use crate::ai::AiHandler;
use crate::ai::types::{ChatResponse, FinishReason, Usage};
use crate::error::ReviewTaskError;

/// A recorded AI call for test assertions.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct RecordedAiCall {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

/// Mock AI handler returning a fixed response (or a fixed error).
/// Records every call for assertions.
pub struct MockAiHandler {
    response: Result<String, String>,
    call_count: Mutex<usize>,
    recorded_calls: Mutex<Vec<RecordedAiCall>>,
}

impl MockAiHandler {
    /// Create a mock that returns the same content for every call.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            call_count: Mutex::new(0),
            recorded_calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock whose every call fails with an `AiHandler` error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            call_count: Mutex::new(0),
            recorded_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_recorded_calls(&self) -> Vec<RecordedAiCall> {
        self.recorded_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiHandler for MockAiHandler {
    async fn chat_completion(
        &self,
        model: &str,
        system: &str,
        user: &str,
        max_tokens: u32,
    ) -> Result<ChatResponse, ReviewTaskError> {
        self.recorded_calls.lock().unwrap().push(RecordedAiCall {
            model: model.to_string(),
            system: system.to_string(),
            user: user.to_string(),
            max_tokens,
        });
        *self.call_count.lock().unwrap() += 1;

        match &self.response {
            Ok(content) => Ok(ChatResponse {
                content: content.clone(),
                finish_reason: FinishReason::Stop,
                usage: Some(Usage {
                    prompt_tokens: 100,
                    completion_tokens: 200,
                    total_tokens: 300,
                }),
            }),
            Err(message) => Err(ReviewTaskError::AiHandler(message.clone())),
        }
    }
}
