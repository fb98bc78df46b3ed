//! Core data types shared across the orchestrator API.

use chrono::{DateTime, Utc};
use claimline_protocol::{Citation, LegalCategory, SessionId, Track};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Message stored in a session transcript. Append-only: messages are
/// never edited once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Message identifier.
    pub id: Uuid,
    /// Role that produced the message.
    pub role: Role,
    /// Message content.
    pub text: String,
    /// Timestamp for the message; conversation order.
    pub created_at: DateTime<Utc>,
    /// Category assigned by the classifier, when one ran.
    #[serde(default)]
    pub legal_category: Option<LegalCategory>,
    /// Track assigned by the classifier, when one ran.
    #[serde(default)]
    pub track: Option<Track>,
    /// Citations attached to a bot reply; empty when nothing matched.
    #[serde(default)]
    pub citations: Vec<Citation>,
    /// Link to a document analysis when the message reports one.
    #[serde(default)]
    pub document_analysis_id: Option<Uuid>,
}

impl Message {
    /// Build a plain user message with a fresh id.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            created_at: Utc::now(),
            legal_category: None,
            track: None,
            citations: Vec::new(),
            document_analysis_id: None,
        }
    }

    /// Build a bot reply carrying classifier output and citations.
    pub fn bot(
        text: impl Into<String>,
        legal_category: Option<LegalCategory>,
        track: Option<Track>,
        citations: Vec<Citation>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Bot,
            text: text.into(),
            created_at: Utc::now(),
            legal_category,
            track,
            citations,
            document_analysis_id: None,
        }
    }
}

/// Speaker role for a stored message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Visitor-authored message.
    User,
    /// Assistant-authored message.
    Bot,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Bot => "bot",
        }
    }

    /// Parse a role from a lowercase string.
    pub fn parse(value: &str) -> Self {
        if value == "bot" { Role::Bot } else { Role::User }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Role::parse(value))
    }
}

/// Full session transcript with messages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Session identifier.
    pub id: SessionId,
    /// Ordered list of messages in the session.
    pub messages: Vec<Message>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Summary view of a session for listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    /// Session identifier.
    pub id: SessionId,
    /// Count of messages stored.
    pub message_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// One defence point produced by document analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DefencePoint {
    /// The point itself.
    pub point: String,
    /// Legal basis supporting the point.
    pub legal_basis: String,
    /// Evidence a claimant would need to make the point.
    pub evidence_needed: String,
}

/// Result of analysing an uploaded document. Created once per
/// successful upload, never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentAnalysis {
    /// Analysis identifier.
    pub id: Uuid,
    /// Session that uploaded the document.
    pub session_id: SessionId,
    /// Original filename as declared by the client.
    pub filename: String,
    /// Extracted text, truncated for storage.
    pub extracted_text: String,
    /// Model-generated summary.
    pub ai_summary: String,
    /// Defence points identified by the model.
    pub defence_points: Vec<DefencePoint>,
    /// Track the document's dispute most likely belongs to.
    pub track_assessment: Track,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
