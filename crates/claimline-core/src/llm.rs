//! Chat model seam and the OpenAI-compatible HTTP client.

use async_trait::async_trait;
use claimline_config::LlmConfig;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::Stream;

/// One message in a chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Chat model failure, mapped from transport and protocol errors.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request timed out")]
    Timeout,
    #[error("model rate limit exceeded")]
    RateLimited,
    #[error("model returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model response was malformed: {0}")]
    Malformed(String),
}

/// Stream of response text deltas.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Seam over a chat completion backend.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run a completion and return the full response text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;

    /// Run a completion and stream text deltas as they arrive. The
    /// default wraps [`ChatProvider::complete`] in a one-chunk stream.
    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream, LlmError> {
        let text = self.complete(messages).await?;
        Ok(Box::pin(futures_util::stream::once(async move { Ok(text) })))
    }
}

/// Client for any OpenAI-compatible chat completions endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamResponse {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Build a provider from config, reading the API key from the
    /// environment variable the config names.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            LlmError::Request(format!("environment variable {} is not set", config.api_key_env))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Request(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Http { status: status.as_u16(), message });
        }
        Ok(response)
    }
}

fn map_transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Request(err.to_string())
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let response = self.send(messages, false).await?;
        let parsed: CompletionResponse =
            response.json().await.map_err(|e| LlmError::Malformed(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::Malformed("response carried no choices".to_string()))
    }

    async fn complete_stream(&self, messages: &[ChatMessage]) -> Result<ChunkStream, LlmError> {
        let response = self.send(messages, true).await?;
        let state = SseState {
            bytes: Box::pin(response.bytes_stream()),
            buffer: String::new(),
            pending: VecDeque::new(),
            done: false,
        };
        Ok(Box::pin(futures_util::stream::unfold(state, |mut state| async move {
            loop {
                if let Some(item) = state.pending.pop_front() {
                    return Some((item, state));
                }
                if state.done {
                    return None;
                }
                match state.bytes.next().await {
                    Some(Ok(chunk)) => {
                        state.buffer.push_str(&String::from_utf8_lossy(&chunk));
                        drain_sse_lines(&mut state);
                    }
                    Some(Err(err)) => {
                        state.done = true;
                        state.pending.push_back(Err(map_transport_error(err)));
                    }
                    None => state.done = true,
                }
            }
        })))
    }
}

struct SseState {
    bytes: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
    buffer: String,
    pending: VecDeque<Result<String, LlmError>>,
    done: bool,
}

/// Split complete SSE lines out of the buffer and queue any text deltas
/// they carry. A `data: [DONE]` line ends the stream.
fn drain_sse_lines(state: &mut SseState) {
    while let Some(newline) = state.buffer.find('\n') {
        let line: String = state.buffer.drain(..=newline).collect();
        let line = line.trim();
        let Some(data) = line.strip_prefix("data: ") else { continue };
        if data == "[DONE]" {
            state.done = true;
            return;
        }
        match serde_json::from_str::<StreamResponse>(data) {
            Ok(parsed) => {
                if let Some(delta) =
                    parsed.choices.into_iter().next().and_then(|c| c.delta.content)
                {
                    if !delta.is_empty() {
                        state.pending.push_back(Ok(delta));
                    }
                }
            }
            Err(err) => {
                state.done = true;
                state.pending.push_back(Err(LlmError::Malformed(err.to_string())));
                return;
            }
        }
    }
}
