//! Orchestrator integration tests with mock chat providers.

use claimline_config::ClaimlineConfig;
use claimline_core::llm::ChatProvider;
use claimline_core::{ClaimlineCoreError, Orchestrator};
use claimline_protocol::{EventPayload, EventSink, Track};
use claimline_test_utils::{
    CollectingSink, FailingLlm, FixedLlm, PendingLlm, StreamingLlm, StubExtractor,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use uuid::Uuid;

fn test_config() -> ClaimlineConfig {
    let mut config = ClaimlineConfig::default();
    config.sessions.enabled = false;
    config
}

fn build_orchestrator(
    llm: Arc<dyn ChatProvider>,
    sink: &CollectingSink,
) -> Orchestrator {
    let sink: Arc<dyn EventSink> = Arc::new(sink.clone());
    let extractor: Arc<dyn claimline_core::extract::TextExtractor> = Arc::new(StubExtractor::new(
        "Claim letter text long enough to clear the minimum extraction threshold.",
    ));
    Orchestrator::new(test_config(), Some(llm), Some(extractor), None, Some(sink))
        .expect("build orchestrator")
}

fn terminal_count(sink: &CollectingSink) -> usize {
    sink.events()
        .iter()
        .filter(|event| event.payload.is_terminal())
        .count()
}

#[tokio::test]
async fn streamed_exchange_emits_chunks_then_one_final_message() {
    let sink = CollectingSink::new();
    let llm = Arc::new(StreamingLlm::new(vec!["Hel", "lo ", "there"]));
    let orchestrator = build_orchestrator(llm, &sink);
    let session_id = orchestrator.create_session().expect("session");

    let stream = orchestrator
        .submit_message(session_id, "my builder breached our £8,000 contract")
        .expect("submit");
    let outcome = stream.finish().await.expect("finish");
    assert_eq!(outcome.response, "Hello there");

    let events = sink.events();
    let chunks: Vec<String> = events
        .iter()
        .filter_map(|event| match &event.payload {
            EventPayload::ResponseChunk { delta, .. } => Some(delta.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(chunks, vec!["Hel", "lo ", "there"]);
    assert_eq!(terminal_count(&sink), 1);
}

#[tokio::test]
async fn contract_claim_is_triaged_with_citations_and_referral() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new("answer")), &sink);
    let session_id = orchestrator.create_session().expect("session");

    orchestrator
        .submit_message(session_id, "my builder breached our £8,000 contract")
        .expect("submit")
        .finish()
        .await
        .expect("finish");

    let events = sink.events();
    let final_message = events
        .iter()
        .find_map(|event| match &event.payload {
            EventPayload::FinalMessage { track, review_needed, citations, referral, .. } => {
                Some((*track, *review_needed, citations.clone(), referral.clone()))
            }
            _ => None,
        })
        .expect("final message");

    let (track, review_needed, citations, referral) = final_message;
    assert_eq!(track, Some(Track::SmallClaims));
    assert_eq!(review_needed, false);
    assert!(!citations.is_empty());
    let referral = referral.expect("referral");
    assert!(!referral.solicitors.is_empty());
    assert!(
        referral
            .funding_options
            .iter()
            .any(|option| option.name.contains("Conditional Fee"))
    );
    // Small claims advice must say representation is optional.
    assert!(referral.advice.contains("representation is optional"));
}

#[tokio::test]
async fn fast_track_boundary_value_assigns_fast_track() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new("answer")), &sink);
    let session_id = orchestrator.create_session().expect("session");

    orchestrator
        .submit_message(session_id, "they owe me £25,000 under our agreement")
        .expect("submit")
        .finish()
        .await
        .expect("finish");

    let track = sink.events().iter().find_map(|event| match &event.payload {
        EventPayload::FinalMessage { track, .. } => Some(*track),
        _ => None,
    });
    assert_eq!(track, Some(Some(Track::FastTrack)));
}

#[tokio::test]
async fn empty_input_fails_with_error_event_and_persists_nothing() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new("answer")), &sink);
    let session_id = orchestrator.create_session().expect("session");

    let err = orchestrator
        .submit_message(session_id, "   ")
        .expect("submit")
        .finish()
        .await
        .expect_err("empty input");
    assert!(matches!(err, ClaimlineCoreError::EmptyInput));

    assert_eq!(terminal_count(&sink), 1);
    assert!(matches!(
        sink.events().last().map(|e| e.payload.clone()),
        Some(EventPayload::Error { .. })
    ));
    assert_eq!(orchestrator.history(session_id).expect("history"), Vec::new());
}

#[tokio::test]
async fn over_long_input_is_rejected() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new("answer")), &sink);
    let session_id = orchestrator.create_session().expect("session");
    let max = orchestrator.config().chat.max_message_chars;

    let err = orchestrator
        .submit_message(session_id, "x".repeat(max + 1))
        .expect("submit")
        .finish()
        .await
        .expect_err("too long");
    assert!(matches!(err, ClaimlineCoreError::InputTooLong { .. }));
    assert_eq!(terminal_count(&sink), 1);
}

#[tokio::test]
async fn provider_failure_surfaces_as_error_event() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FailingLlm::new("boom")), &sink);
    let session_id = orchestrator.create_session().expect("session");

    let err = orchestrator
        .submit_message(session_id, "what is a letter before action?")
        .expect("submit")
        .finish()
        .await
        .expect_err("provider failure");
    assert!(matches!(err, ClaimlineCoreError::Llm(_)));
    assert_eq!(terminal_count(&sink), 1);
    // The typing indicator must be switched off before the error lands.
    let events = sink.events();
    let last_typing = events
        .iter()
        .rev()
        .find_map(|event| match event.payload {
            EventPayload::TypingIndicator { active, .. } => Some(active),
            _ => None,
        })
        .expect("typing events");
    assert_eq!(last_typing, false);
}

#[tokio::test]
async fn mid_stream_failure_drops_the_partial_exchange() {
    let sink = CollectingSink::new();
    let llm = Arc::new(StreamingLlm::failing_after(vec!["partial "], "cut off"));
    let orchestrator = build_orchestrator(llm, &sink);
    let session_id = orchestrator.create_session().expect("session");

    let err = orchestrator
        .submit_message(session_id, "tell me about small claims")
        .expect("submit")
        .finish()
        .await
        .expect_err("mid-stream failure");
    assert!(matches!(err, ClaimlineCoreError::Llm(_)));
    assert_eq!(terminal_count(&sink), 1);
    assert_eq!(orchestrator.history(session_id).expect("history"), Vec::new());
}

#[tokio::test]
async fn unknown_session_submission_fails() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new("answer")), &sink);

    let err = orchestrator
        .submit_message(Uuid::new_v4(), "hello")
        .expect("submit")
        .finish()
        .await
        .expect_err("unknown session");
    assert!(matches!(err, ClaimlineCoreError::UnknownSession(_)));
}

#[tokio::test]
async fn concurrent_submission_in_a_session_is_rejected() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(PendingLlm), &sink);
    let session_id = orchestrator.create_session().expect("session");

    let first = orchestrator
        .submit_message(session_id, "first message")
        .expect("first submit");
    let err = orchestrator
        .submit_message(session_id, "second message")
        .expect_err("second submit");
    assert!(matches!(err, ClaimlineCoreError::ExchangeInFlight(_)));

    first.abort();
}

#[tokio::test]
async fn cancelled_exchange_persists_nothing_and_frees_the_session() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(PendingLlm), &sink);
    let session_id = orchestrator.create_session().expect("session");

    let stream = orchestrator
        .submit_message(session_id, "hold this open")
        .expect("submit");
    stream.abort();
    stream.finish().await.expect_err("aborted");

    assert_eq!(orchestrator.history(session_id).expect("history"), Vec::new());
    // The session is free for a new exchange once aborted.
    let followup = orchestrator
        .submit_message(session_id, "try again")
        .expect("resubmit");
    followup.abort();
}

#[tokio::test]
async fn history_replays_persisted_exchanges_in_order() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new("answer")), &sink);
    let session_id = orchestrator.create_session().expect("session");

    orchestrator
        .submit_message(session_id, "first question")
        .expect("submit")
        .finish()
        .await
        .expect("finish");
    orchestrator
        .submit_message(session_id, "second question")
        .expect("submit")
        .finish()
        .await
        .expect("finish");

    let history = orchestrator.history(session_id).expect("history");
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].text, "first question");
    assert_eq!(history[2].text, "second question");
}

#[tokio::test]
async fn document_upload_is_analyzed_and_persisted() {
    let sink = CollectingSink::new();
    let reply = r#"{"summary": "A claim letter about an unpaid invoice.",
        "defence_points": [{"point": "Dispute the sum", "legal_basis": "Contract terms",
        "evidence_needed": "Invoices"}], "track_assessment": "small_claims"}"#;
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new(reply)), &sink);
    let session_id = orchestrator.create_session().expect("session");

    let outcome = orchestrator
        .submit_document(session_id, "claim_letter.txt", b"irrelevant".to_vec())
        .expect("submit")
        .finish()
        .await
        .expect("finish");
    assert_eq!(outcome.response, "A claim letter about an unpaid invoice.");

    let processed = sink.events().iter().any(|event| {
        matches!(event.payload, EventPayload::DocumentProcessed { .. })
    });
    assert!(processed);
    assert_eq!(terminal_count(&sink), 1);

    let history = orchestrator.history(session_id).expect("history");
    assert_eq!(history.len(), 1);
    assert!(history[0].document_analysis_id.is_some());
}

#[tokio::test]
async fn unsupported_upload_emits_document_error_and_persists_nothing() {
    let sink = CollectingSink::new();
    let orchestrator = build_orchestrator(Arc::new(FixedLlm::new("answer")), &sink);
    let session_id = orchestrator.create_session().expect("session");

    let err = orchestrator
        .submit_document(session_id, "payload.exe", b"MZ".to_vec())
        .expect("submit")
        .finish()
        .await
        .expect_err("unsupported upload");
    assert!(matches!(err, ClaimlineCoreError::Extract(_)));

    let reason = sink.events().iter().find_map(|event| match &event.payload {
        EventPayload::DocumentError { reason, .. } => Some(*reason),
        _ => None,
    });
    assert_eq!(
        reason,
        Some(claimline_protocol::DocumentErrorReason::UnsupportedDocumentFormat)
    );
    assert_eq!(terminal_count(&sink), 1);
    assert_eq!(orchestrator.history(session_id).expect("history"), Vec::new());
    assert_eq!(orchestrator.document_analyses(session_id).expect("analyses"), Vec::new());
}
