//! Prompt assembly for chat and document-analysis turns.

use crate::classify::Classification;
use crate::llm::ChatMessage;
use crate::types::{Message, Role};
use claimline_protocol::{Citation, Track};

/// Base system prompt for every chat turn.
pub const SYSTEM_PROMPT: &str = "\
You are Claimline, a specialized UK civil litigation assistant for money claims \
up to £100,000. You provide general legal information only - NOT legal advice.

JURISDICTION: England and Wales only
SPECIALIZATION: Civil litigation, money claims, contract disputes, debt recovery, \
personal injury, employment disputes, property disputes, consumer issues, \
professional negligence

TRACK ALLOCATION:
- Small Claims Track: Up to £10,000 (simplified procedures, no costs awards typically)
- Fast Track: £10,000-£25,000 (streamlined procedures, fixed costs)
- Multi-Track: £25,000-£100,000 (full case management, detailed procedures)

RESPONSE GUIDELINES:
1. Always include appropriate disclaimers about not providing legal advice
2. Provide accurate, current information about UK civil litigation procedures
3. Reference relevant legislation, court rules, and case law where appropriate
4. Suggest track allocation based on claim value and complexity
5. Recommend when professional legal advice is essential
6. Be clear about limitation periods and procedural deadlines
7. Explain court fees and potential costs consequences

TONE: Professional, accessible, helpful but cautious. Use simple language while \
maintaining legal accuracy.

ALWAYS DISCLAIM: Emphasize this is general information only and specific legal \
advice requires consultation with a qualified solicitor.";

/// Build the chat completion request for a user turn: system prompt,
/// a trailing window of session history, then the current query with
/// classifier context and retrieved citations attached.
pub fn build_chat_messages(
    history: &[Message],
    history_window: usize,
    classification: &Classification,
    citations: &[Citation],
    input: &str,
) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];

    let start = history.len().saturating_sub(history_window);
    for message in &history[start..] {
        match message.role {
            Role::User => messages.push(ChatMessage::user(message.text.clone())),
            Role::Bot => messages.push(ChatMessage::assistant(message.text.clone())),
        }
    }

    messages.push(ChatMessage::user(annotate_query(classification, citations, input)));
    messages
}

/// Fold triage output and retrieved sources into the user turn so the
/// model grounds its reply without a second round trip.
fn annotate_query(classification: &Classification, citations: &[Citation], input: &str) -> String {
    let mut query = String::from(input);
    query.push_str("\n\n[Context for your answer, not part of the user's words]\n");
    query.push_str(&format!("Assessed category: {}\n", classification.category.as_str()));
    if classification.track != Track::Unknown {
        query.push_str(&format!("Likely track: {}\n", classification.track.as_str()));
    }
    if let Some(pence) = classification.claim_value_pence {
        query.push_str(&format!("Stated claim value: £{:.2}\n", pence as f64 / 100.0));
    }
    if !citations.is_empty() {
        query.push_str("Relevant sources to cite where appropriate:\n");
        for citation in citations {
            query.push_str(&format!("- {} ({})\n", citation.display_name, citation.reference));
        }
    }
    query
}

/// Build the completion request that analyses an uploaded document. The
/// model must answer with a strict JSON object so the reply can be
/// decoded into defence points and a track assessment.
pub fn build_document_messages(filename: &str, text: &str) -> Vec<ChatMessage> {
    let request = format!(
        "Analyse the following document uploaded as \"{filename}\" in the context \
         of a UK civil money claim.\n\n\
         Respond with a strict JSON object and nothing else, in this shape:\n\
         {{\n\
           \"summary\": \"two or three sentence summary\",\n\
           \"defence_points\": [\n\
             {{\"point\": \"...\", \"legal_basis\": \"...\", \"evidence_needed\": \"...\"}}\n\
           ],\n\
           \"track_assessment\": \"small_claims\" | \"fast_track\" | \"multi_track\" | \"unknown\"\n\
         }}\n\n\
         Document text:\n{text}"
    );
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(request)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::types::Message;
    use pretty_assertions::assert_eq;

    #[test]
    fn history_window_keeps_only_the_tail() {
        let history: Vec<Message> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("question {i}"))
                } else {
                    Message::bot(format!("answer {i}"), None, None, Vec::new())
                }
            })
            .collect();
        let classification = classify("breach of contract", None);
        let messages = build_chat_messages(&history, 6, &classification, &[], "next question");

        // system + 6 history + current query
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "question 4");
        assert!(messages[7].content.starts_with("next question"));
    }

    #[test]
    fn query_annotation_carries_triage_and_sources() {
        let classification = classify("breach of contract worth £8,000", None);
        let citations = vec![Citation {
            kind: claimline_protocol::CitationKind::Case,
            display_name: "Hadley v Baxendale".to_string(),
            reference: "(1854) 9 Exch 341".to_string(),
            url: None,
        }];
        let messages =
            build_chat_messages(&[], 6, &classification, &citations, "can I claim?");
        let query = &messages.last().unwrap().content;
        assert!(query.contains("contract_dispute"));
        assert!(query.contains("small_claims"));
        assert!(query.contains("£8000.00"));
        assert!(query.contains("Hadley v Baxendale"));
    }

    #[test]
    fn unknown_track_is_not_suggested_to_the_model() {
        let classification = classify("a general question", None);
        let messages = build_chat_messages(&[], 6, &classification, &[], "hello");
        assert!(!messages.last().unwrap().content.contains("Likely track"));
    }
}
