//! Core building blocks for the Claimline legal chat service: the
//! classifier, knowledge retriever, referral matcher, document text
//! extraction seam, LLM provider seam, session persistence, and the
//! conversation orchestrator that composes them.

pub mod classify;
mod error;
pub mod extract;
pub mod knowledge;
pub mod llm;
mod orchestrator;
pub mod referral;
pub mod state;
pub mod types;

pub use error::ClaimlineCoreError;
pub use orchestrator::{ExchangeOutcome, ExchangeStream, Orchestrator};
