//! Exchange execution flow for chat turns.

use super::prompt;
use super::sessions::SessionStore;
use crate::classify::classify;
use crate::error::ClaimlineCoreError;
use crate::knowledge::KnowledgeBase;
use crate::llm::ChatProvider;
use crate::referral::SolicitorDirectory;
use crate::types::Message;
use claimline_config::ClaimlineConfig;
use claimline_protocol::{EventMsg, EventPayload, EventSink, ExchangeId, SessionId, Track};
use futures_util::StreamExt;
use log::{debug, info, warn};
use std::sync::Arc;

/// Parameters for a single chat exchange.
pub(crate) struct ExchangeParams {
    pub(crate) session_id: SessionId,
    pub(crate) exchange_id: ExchangeId,
    pub(crate) input: String,
    pub(crate) event_sink: Arc<dyn EventSink>,
}

/// Result payload for a completed exchange.
#[derive(Debug)]
pub struct ExchangeOutcome {
    /// Session that produced the response.
    pub session_id: SessionId,
    /// Exchange identifier.
    pub exchange_id: ExchangeId,
    /// Full assistant response text.
    pub response: String,
}

/// Executes a single chat exchange end-to-end: validation, triage,
/// retrieval, streaming completion and persistence.
pub(crate) struct ExchangeExecutor {
    config: Arc<ClaimlineConfig>,
    knowledge: Arc<KnowledgeBase>,
    directory: Arc<SolicitorDirectory>,
    llm: Arc<dyn ChatProvider>,
    session_store: SessionStore,
}

impl ExchangeExecutor {
    pub(crate) fn new(
        config: Arc<ClaimlineConfig>,
        knowledge: Arc<KnowledgeBase>,
        directory: Arc<SolicitorDirectory>,
        llm: Arc<dyn ChatProvider>,
        session_store: SessionStore,
    ) -> Self {
        Self { config, knowledge, directory, llm, session_store }
    }

    /// Run one exchange. Exactly one terminal event is emitted on the
    /// sink: `FinalMessage` on success, `Error` on any failure.
    pub(crate) async fn run_exchange(
        &self,
        params: ExchangeParams,
    ) -> Result<ExchangeOutcome, ClaimlineCoreError> {
        let ExchangeParams { session_id, exchange_id, input, event_sink } = params;
        info!(
            "starting exchange (session_id={}, exchange_id={}, input_len={})",
            session_id,
            exchange_id,
            input.len()
        );

        let input = input.trim().to_string();
        if input.is_empty() {
            let err = ClaimlineCoreError::EmptyInput;
            emit_error(&event_sink, session_id, exchange_id, &err);
            return Err(err);
        }
        if input.chars().count() > self.config.chat.max_message_chars {
            let err = ClaimlineCoreError::InputTooLong {
                length: input.chars().count(),
                max: self.config.chat.max_message_chars,
            };
            emit_error(&event_sink, session_id, exchange_id, &err);
            return Err(err);
        }

        let history = match self.session_store.resume_session(session_id) {
            Ok(session) => session.messages,
            Err(err) => {
                emit_error(&event_sink, session_id, exchange_id, &err);
                return Err(err);
            }
        };

        event_sink.emit(EventMsg::new(
            session_id,
            EventPayload::TypingIndicator { exchange_id, active: true },
        ));

        let classification = classify(&input, None);
        debug!(
            "triage complete (session_id={}, category={}, track={}, review_needed={})",
            session_id,
            classification.category.as_str(),
            classification.track.as_str(),
            classification.review_needed
        );
        let track = (classification.track != Track::Unknown).then_some(classification.track);
        let citations = self.knowledge.retrieve(
            classification.category,
            track,
            &input,
            self.config.retrieval.max_citations,
        );
        let referral = self
            .directory
            .match_referrals(&classification, self.config.referral.max_solicitors);

        let messages = prompt::build_chat_messages(
            &history,
            self.config.chat.history_window,
            &classification,
            &citations,
            &input,
        );

        let mut stream = match self.llm.complete_stream(&messages).await {
            Ok(stream) => stream,
            Err(err) => {
                let err = ClaimlineCoreError::Llm(err);
                stop_typing(&event_sink, session_id, exchange_id);
                emit_error(&event_sink, session_id, exchange_id, &err);
                return Err(err);
            }
        };

        let mut response = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(delta) => {
                    response.push_str(&delta);
                    event_sink.emit(EventMsg::new(
                        session_id,
                        EventPayload::ResponseChunk { exchange_id, delta },
                    ));
                }
                Err(err) => {
                    let err = ClaimlineCoreError::Llm(err);
                    stop_typing(&event_sink, session_id, exchange_id);
                    emit_error(&event_sink, session_id, exchange_id, &err);
                    return Err(err);
                }
            }
        }

        stop_typing(&event_sink, session_id, exchange_id);

        let referral = (!referral.solicitors.is_empty() || !referral.funding_options.is_empty())
            .then_some(referral);
        event_sink.emit(EventMsg::new(
            session_id,
            EventPayload::FinalMessage {
                exchange_id,
                text: response.clone(),
                track,
                review_needed: classification.review_needed,
                citations: citations.clone(),
                referral,
            },
        ));

        // Persistence runs after the terminal event so a storage failure
        // degrades to an unpersisted but delivered exchange.
        self.persist_exchange(session_id, &input, &response, &classification, citations);

        info!(
            "exchange complete (session_id={}, exchange_id={}, response_len={})",
            session_id,
            exchange_id,
            response.len()
        );
        Ok(ExchangeOutcome { session_id, exchange_id, response })
    }

    fn persist_exchange(
        &self,
        session_id: SessionId,
        input: &str,
        response: &str,
        classification: &crate::classify::Classification,
        citations: Vec<claimline_protocol::Citation>,
    ) {
        let user = Message::user(input);
        if let Err(err) = self.session_store.append_message(session_id, &user) {
            warn!("failed to persist user message (session_id={session_id}): {err}");
            return;
        }
        let track = (classification.track != Track::Unknown).then_some(classification.track);
        let bot = Message::bot(response, Some(classification.category), track, citations);
        if let Err(err) = self.session_store.append_message(session_id, &bot) {
            warn!("failed to persist bot message (session_id={session_id}): {err}");
        }
    }
}

pub(crate) fn stop_typing(
    event_sink: &Arc<dyn EventSink>,
    session_id: SessionId,
    exchange_id: ExchangeId,
) {
    event_sink.emit(EventMsg::new(
        session_id,
        EventPayload::TypingIndicator { exchange_id, active: false },
    ));
}

pub(crate) fn emit_error(
    event_sink: &Arc<dyn EventSink>,
    session_id: SessionId,
    exchange_id: ExchangeId,
    err: &ClaimlineCoreError,
) {
    event_sink.emit(EventMsg::new(
        session_id,
        EventPayload::Error { exchange_id: Some(exchange_id), message: err.to_string() },
    ));
}
