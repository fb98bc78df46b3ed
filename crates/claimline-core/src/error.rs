//! Error types for the core crate.

use crate::extract::ExtractError;
use crate::llm::LlmError;
use claimline_protocol::SessionId;
use thiserror::Error;

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum ClaimlineCoreError {
    /// Session id is unknown to the orchestrator.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
    /// A second submission arrived while an exchange was in flight.
    #[error("exchange already in flight for session: {0}")]
    ExchangeInFlight(SessionId),
    /// User input exceeded the configured length cap.
    #[error("message too long: {length} chars (max {max})")]
    InputTooLong { length: usize, max: usize },
    /// User input was empty after trimming.
    #[error("empty message")]
    EmptyInput,
    /// Document text extraction failed.
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),
    /// External LLM call failed.
    #[error("llm error: {0}")]
    Llm(#[from] LlmError),
    /// State store error.
    #[error("state error: {0}")]
    State(String),
    /// Exchange task error.
    #[error("executor error: {0}")]
    Executor(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
