//! Test helpers shared across Claimline crates.

pub mod events;
pub mod extract;
pub mod llm;

pub use events::CollectingSink;
pub use extract::StubExtractor;
pub use llm::{FailingLlm, FixedLlm, PendingLlm, RecordingLlm, StreamingLlm};
