//! Upload analysis flow: extraction, model analysis and persistence.

use super::prompt;
use super::sessions::SessionStore;
use crate::classify::classify;
use crate::error::ClaimlineCoreError;
use crate::extract::{ExtractError, TextExtractor};
use crate::llm::ChatProvider;
use crate::types::{DefencePoint, DocumentAnalysis, Message};
use claimline_config::ClaimlineConfig;
use claimline_protocol::{
    DocumentErrorReason, EventMsg, EventPayload, EventSink, ExchangeId, SessionId, Track,
};
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Parameters for a single document analysis exchange.
pub(crate) struct DocumentParams {
    pub(crate) session_id: SessionId,
    pub(crate) exchange_id: ExchangeId,
    pub(crate) filename: String,
    pub(crate) bytes: Vec<u8>,
    pub(crate) event_sink: Arc<dyn EventSink>,
}

/// Shape the model is asked to answer with.
#[derive(Debug, Deserialize)]
struct AnalysisReply {
    summary: String,
    #[serde(default)]
    defence_points: Vec<DefencePoint>,
    #[serde(default)]
    track_assessment: Option<Track>,
}

/// Executes a document upload end-to-end. Terminal event is
/// `DocumentProcessed` on success, `DocumentError` on extraction
/// failure, and `Error` if the model call fails.
pub(crate) struct DocumentExecutor {
    config: Arc<ClaimlineConfig>,
    llm: Arc<dyn ChatProvider>,
    extractor: Arc<dyn TextExtractor>,
    session_store: SessionStore,
}

impl DocumentExecutor {
    pub(crate) fn new(
        config: Arc<ClaimlineConfig>,
        llm: Arc<dyn ChatProvider>,
        extractor: Arc<dyn TextExtractor>,
        session_store: SessionStore,
    ) -> Self {
        Self { config, llm, extractor, session_store }
    }

    pub(crate) async fn analyze(
        &self,
        params: DocumentParams,
    ) -> Result<DocumentAnalysis, ClaimlineCoreError> {
        let DocumentParams { session_id, exchange_id, filename, bytes, event_sink } = params;
        info!(
            "analyzing document (session_id={}, exchange_id={}, filename={}, bytes={})",
            session_id,
            exchange_id,
            filename,
            bytes.len()
        );

        if let Err(err) = self.session_store.resume_session(session_id) {
            super::runtime::emit_error(&event_sink, session_id, exchange_id, &err);
            return Err(err);
        }

        let text = match self.extractor.extract(&filename, &bytes) {
            Ok(text) => text,
            Err(err) => {
                emit_document_error(&event_sink, session_id, exchange_id, &filename, &err);
                return Err(ClaimlineCoreError::Extract(err));
            }
        };
        if text.chars().count() < self.config.chat.min_document_chars {
            let err = ExtractError::EmptyContent;
            emit_document_error(&event_sink, session_id, exchange_id, &filename, &err);
            return Err(ClaimlineCoreError::Extract(err));
        }

        event_sink.emit(EventMsg::new(
            session_id,
            EventPayload::TypingIndicator { exchange_id, active: true },
        ));

        let messages = prompt::build_document_messages(&filename, &text);
        let reply = match self.llm.complete(&messages).await {
            Ok(reply) => reply,
            Err(err) => {
                let err = ClaimlineCoreError::Llm(err);
                super::runtime::stop_typing(&event_sink, session_id, exchange_id);
                super::runtime::emit_error(&event_sink, session_id, exchange_id, &err);
                return Err(err);
            }
        };
        super::runtime::stop_typing(&event_sink, session_id, exchange_id);

        let classification = classify(&text, None);
        let (summary, defence_points, track_assessment) = match decode_reply(&reply) {
            Some(decoded) => {
                let track = decoded.track_assessment.unwrap_or(classification.track);
                (decoded.summary, decoded.defence_points, track)
            }
            // A reply that is not valid JSON still carries useful prose;
            // keep it as the summary and fall back to rule-based triage.
            None => {
                warn!(
                    "model reply was not valid analysis JSON (session_id={session_id}, \
                     exchange_id={exchange_id})"
                );
                (reply.trim().to_string(), Vec::new(), classification.track)
            }
        };

        let analysis = DocumentAnalysis {
            id: Uuid::new_v4(),
            session_id,
            filename: filename.clone(),
            extracted_text: truncate_chars(&text, self.config.chat.stored_text_chars),
            ai_summary: summary.clone(),
            defence_points,
            track_assessment,
            created_at: chrono::Utc::now(),
        };

        event_sink.emit(EventMsg::new(
            session_id,
            EventPayload::DocumentProcessed {
                exchange_id,
                filename: filename.clone(),
                summary: summary.clone(),
            },
        ));

        // Storage failures after the terminal event degrade to an
        // unpersisted but delivered analysis.
        if let Err(err) = self.session_store.record_document_analysis(&analysis) {
            warn!("failed to persist document analysis (session_id={session_id}): {err}");
        } else {
            let mut message = Message::bot(
                format_analysis_message(&analysis),
                Some(classification.category),
                Some(track_assessment),
                Vec::new(),
            );
            message.document_analysis_id = Some(analysis.id);
            if let Err(err) = self.session_store.append_message(session_id, &message) {
                warn!("failed to persist analysis message (session_id={session_id}): {err}");
            }
        }

        Ok(analysis)
    }
}

/// Decode the model's JSON reply, tolerating a fenced code block.
fn decode_reply(reply: &str) -> Option<AnalysisReply> {
    let trimmed = reply.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.strip_suffix("```").unwrap_or(rest))
        .unwrap_or(trimmed);
    serde_json::from_str(trimmed.trim()).ok()
}

fn format_analysis_message(analysis: &DocumentAnalysis) -> String {
    let mut text = format!("Document analysis for {}:\n\n{}", analysis.filename, analysis.ai_summary);
    if !analysis.defence_points.is_empty() {
        text.push_str("\n\nKey points:");
        for point in &analysis.defence_points {
            text.push_str(&format!(
                "\n- {} (basis: {}; evidence needed: {})",
                point.point, point.legal_basis, point.evidence_needed
            ));
        }
    }
    text
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}

fn emit_document_error(
    event_sink: &Arc<dyn EventSink>,
    session_id: SessionId,
    exchange_id: ExchangeId,
    filename: &str,
    err: &ExtractError,
) {
    let reason = match err {
        ExtractError::UnsupportedFormat(_) => DocumentErrorReason::UnsupportedDocumentFormat,
        ExtractError::CorruptFile(_) => DocumentErrorReason::ExtractionFailed,
        ExtractError::EmptyContent => DocumentErrorReason::EmptyContent,
    };
    event_sink.emit(EventMsg::new(
        session_id,
        EventPayload::DocumentError {
            exchange_id,
            filename: filename.to_string(),
            reason,
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::{decode_reply, truncate_chars};
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_plain_and_fenced_json() {
        let raw = r#"{"summary": "A claim letter.", "defence_points": [], "track_assessment": "fast_track"}"#;
        assert_eq!(decode_reply(raw).unwrap().summary, "A claim letter.");

        let fenced = format!("```json\n{raw}\n```");
        assert_eq!(decode_reply(&fenced).unwrap().summary, "A claim letter.");
    }

    #[test]
    fn prose_reply_does_not_decode() {
        assert!(decode_reply("This document appears to be a claim letter.").is_none());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("£££££", 3), "£££");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
