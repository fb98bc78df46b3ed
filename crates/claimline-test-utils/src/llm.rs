use async_trait::async_trait;
use claimline_core::llm::{ChatMessage, ChatProvider, ChunkStream, LlmError};
use futures_util::stream;
use parking_lot::Mutex;
use std::sync::Arc;

/// Provider that always answers with the same text.
#[derive(Debug, Clone)]
pub struct FixedLlm {
    response: String,
}

impl FixedLlm {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

#[async_trait]
impl ChatProvider for FixedLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        Ok(self.response.clone())
    }
}

/// Provider that streams a fixed sequence of deltas.
#[derive(Debug, Clone)]
pub struct StreamingLlm {
    chunks: Vec<String>,
    /// Error delivered after the chunks, when set.
    trailing_error: Option<&'static str>,
}

impl StreamingLlm {
    pub fn new(chunks: Vec<&str>) -> Self {
        Self {
            chunks: chunks.into_iter().map(String::from).collect(),
            trailing_error: None,
        }
    }

    /// Deliver the chunks, then fail the stream.
    pub fn failing_after(chunks: Vec<&str>, message: &'static str) -> Self {
        Self {
            chunks: chunks.into_iter().map(String::from).collect(),
            trailing_error: Some(message),
        }
    }
}

#[async_trait]
impl ChatProvider for StreamingLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        if let Some(message) = self.trailing_error {
            return Err(LlmError::Request(message.to_string()));
        }
        Ok(self.chunks.concat())
    }

    async fn complete_stream(&self, _messages: &[ChatMessage]) -> Result<ChunkStream, LlmError> {
        let mut items: Vec<Result<String, LlmError>> =
            self.chunks.iter().cloned().map(Ok).collect();
        if let Some(message) = self.trailing_error {
            items.push(Err(LlmError::Request(message.to_string())));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

/// Provider whose every call fails.
#[derive(Debug, Clone)]
pub struct FailingLlm {
    message: String,
}

impl FailingLlm {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[async_trait]
impl ChatProvider for FailingLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        Err(LlmError::Request(self.message.clone()))
    }

    async fn complete_stream(&self, _messages: &[ChatMessage]) -> Result<ChunkStream, LlmError> {
        Err(LlmError::Request(self.message.clone()))
    }
}

/// Provider whose stream never yields; used to hold an exchange open.
#[derive(Debug, Clone, Default)]
pub struct PendingLlm;

#[async_trait]
impl ChatProvider for PendingLlm {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
        futures_util::future::pending().await
    }

    async fn complete_stream(&self, _messages: &[ChatMessage]) -> Result<ChunkStream, LlmError> {
        Ok(Box::pin(stream::pending()))
    }
}

/// Provider that records the requests it receives.
#[derive(Debug, Clone)]
pub struct RecordingLlm {
    response: String,
    seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl RecordingLlm {
    pub fn new(response: impl Into<String>) -> (Self, Arc<Mutex<Vec<Vec<ChatMessage>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        (Self { response: response.into(), seen: seen.clone() }, seen)
    }
}

#[async_trait]
impl ChatProvider for RecordingLlm {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        self.seen.lock().push(messages.to_vec());
        Ok(self.response.clone())
    }
}
