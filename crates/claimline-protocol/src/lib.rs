//! Wire protocol types for Claimline events, submissions, and common types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a session.
pub type SessionId = Uuid;
/// Unique identifier for an exchange (one user submission plus its terminal response).
pub type ExchangeId = Uuid;

/// UK civil-procedure case-complexity tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// Claims up to £10,000.
    SmallClaims,
    /// Claims over £10,000 up to £25,000.
    FastTrack,
    /// Claims over £25,000, or complex matters.
    MultiTrack,
    /// No value and no complexity signal.
    Unknown,
}

impl Track {
    /// Return the track as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::SmallClaims => "small_claims",
            Track::FastTrack => "fast_track",
            Track::MultiTrack => "multi_track",
            Track::Unknown => "unknown",
        }
    }

    /// Parse a track from a lowercase string, defaulting to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value {
            "small_claims" => Track::SmallClaims,
            "fast_track" => Track::FastTrack,
            "multi_track" => Track::MultiTrack,
            _ => Track::Unknown,
        }
    }
}

impl FromStr for Track {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Track::parse(value))
    }
}

/// Coarse legal category assigned by the classifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LegalCategory {
    ContractDispute,
    DebtRecovery,
    PersonalInjury,
    Employment,
    PropertyDispute,
    ConsumerDispute,
    ProfessionalNegligence,
    /// Fallback when no keyword group matches.
    General,
}

impl LegalCategory {
    /// Return the category as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            LegalCategory::ContractDispute => "contract_dispute",
            LegalCategory::DebtRecovery => "debt_recovery",
            LegalCategory::PersonalInjury => "personal_injury",
            LegalCategory::Employment => "employment",
            LegalCategory::PropertyDispute => "property_dispute",
            LegalCategory::ConsumerDispute => "consumer_dispute",
            LegalCategory::ProfessionalNegligence => "professional_negligence",
            LegalCategory::General => "general",
        }
    }

    /// Parse a category from a lowercase string, defaulting to `General`.
    pub fn parse(value: &str) -> Self {
        match value {
            "contract_dispute" => LegalCategory::ContractDispute,
            "debt_recovery" => LegalCategory::DebtRecovery,
            "personal_injury" => LegalCategory::PersonalInjury,
            "employment" => LegalCategory::Employment,
            "property_dispute" => LegalCategory::PropertyDispute,
            "consumer_dispute" => LegalCategory::ConsumerDispute,
            "professional_negligence" => LegalCategory::ProfessionalNegligence,
            _ => LegalCategory::General,
        }
    }
}

impl FromStr for LegalCategory {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(LegalCategory::parse(value))
    }
}

/// Kind of record a citation points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    /// Case-law precedent.
    Case,
    /// Procedural rule or guidance.
    Procedure,
}

/// Reference to a case or procedural record attached to a bot response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// Record kind.
    pub kind: CitationKind,
    /// Human-readable name (case name or rule title).
    pub display_name: String,
    /// Formal reference string (citation or rule number).
    pub reference: String,
    /// Optional link to the source.
    #[serde(default)]
    pub url: Option<String>,
}

/// Funding route a claimant could use to pay for representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundingOption {
    /// Short name, e.g. "Conditional Fee Agreement (CFA)".
    pub name: String,
    /// What the arrangement is.
    pub description: String,
    /// Who can use it.
    pub eligibility: String,
    /// What it costs.
    pub cost: String,
}

/// Solicitor firm surfaced in a referral block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolicitorSummary {
    /// Firm name.
    pub firm_name: String,
    /// Named contact at the firm.
    pub contact_name: String,
    /// Firm location.
    pub location: String,
    /// Contact email address.
    pub contact_email: String,
    /// Contact phone number.
    pub contact_phone: String,
    /// Firm website.
    pub website: String,
    /// Categories the firm specialises in.
    pub specialties: Vec<LegalCategory>,
}

/// Referral block attached to a final message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReferralInfo {
    /// Composed advice text.
    pub advice: String,
    /// Matched firms, best match first.
    pub solicitors: Vec<SolicitorSummary>,
    /// Applicable funding options.
    pub funding_options: Vec<FundingOption>,
}

/// Reason a document submission was rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentErrorReason {
    /// Declared format is not one we extract text from.
    UnsupportedDocumentFormat,
    /// Extraction ran but the file could not be read.
    ExtractionFailed,
    /// Extraction produced no usable text.
    EmptyContent,
}

/// All submission operations a client can send over the channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum SubmissionPayload {
    /// Submit a user message to start an exchange.
    UserMessage { content: String },
    /// Cancel an in-flight exchange.
    CancelExchange { exchange_id: ExchangeId },
}

/// Wrapper for events emitted during an exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMsg {
    /// Unique id for the event.
    pub id: Uuid,
    /// Session id associated with the event.
    pub session_id: SessionId,
    /// Timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// Event payload content.
    pub payload: EventPayload,
}

impl EventMsg {
    /// Build a fresh event for a session.
    pub fn new(session_id: SessionId, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            created_at: Utc::now(),
            payload,
        }
    }
}

/// All events emitted toward the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum EventPayload {
    /// Channel connection state changed.
    ConnectionStatus { connected: bool },
    /// The assistant started or stopped composing a reply.
    TypingIndicator {
        exchange_id: ExchangeId,
        active: bool,
    },
    /// Streaming response delta.
    ResponseChunk { exchange_id: ExchangeId, delta: String },
    /// Terminal event: the composed reply for an exchange.
    FinalMessage {
        exchange_id: ExchangeId,
        text: String,
        track: Option<Track>,
        review_needed: bool,
        citations: Vec<Citation>,
        referral: Option<ReferralInfo>,
    },
    /// Terminal event: a document was analysed successfully.
    DocumentProcessed {
        exchange_id: ExchangeId,
        filename: String,
        summary: String,
    },
    /// Terminal event: a document submission failed.
    DocumentError {
        exchange_id: ExchangeId,
        filename: String,
        reason: DocumentErrorReason,
    },
    /// Terminal event: the exchange failed.
    Error {
        exchange_id: Option<ExchangeId>,
        message: String,
    },
}

impl EventPayload {
    /// Whether this event ends an exchange. Exactly one terminal event is
    /// emitted per exchange; chunks always precede it.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EventPayload::FinalMessage { .. }
                | EventPayload::DocumentProcessed { .. }
                | EventPayload::DocumentError { .. }
                | EventPayload::Error { .. }
        )
    }
}

/// Sink interface for orchestrator events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: EventMsg);
}
