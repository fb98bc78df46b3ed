//! Deterministic rule-based triage: category, claim value, track and
//! urgency, computed from message text alone. No network access and no
//! model calls; same input always yields the same classification.

use claimline_protocol::{LegalCategory, Track};
use regex::Regex;
use std::sync::LazyLock;

/// Claim value below or at which a dispute is small claims (£10,000).
pub const SMALL_CLAIMS_LIMIT_PENCE: u64 = 1_000_000;
/// Claim value below or at which a dispute is fast track (£25,000).
pub const FAST_TRACK_LIMIT_PENCE: u64 = 2_500_000;
/// Claim value above which a dispute needs human review (£100,000).
pub const REVIEW_THRESHOLD_PENCE: u64 = 10_000_000;

/// Urgency tier derived from the message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Output of a classification pass over one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Assigned legal category; `General` when no keyword group matched.
    pub category: LegalCategory,
    /// Assigned court track.
    pub track: Track,
    /// Whether the matter should be flagged for human review.
    pub review_needed: bool,
    /// Urgency tier.
    pub urgency: Urgency,
    /// Detected claim value, if any.
    pub claim_value_pence: Option<u64>,
}

/// Keyword groups checked in fixed priority order. The first group with
/// any keyword present in the lowercased text assigns the category.
const CATEGORY_RULES: &[(LegalCategory, &[&str])] = &[
    (
        LegalCategory::ContractDispute,
        &[
            "contract",
            "agreement",
            "breach",
            "terms",
            "deposit",
            "refund",
            "cancellation",
            "builder",
            "supplier",
        ],
    ),
    (
        LegalCategory::DebtRecovery,
        &[
            "debt",
            "owed",
            "owes",
            "invoice",
            "unpaid",
            "payment",
            "money claim",
            "recover",
        ],
    ),
    (
        LegalCategory::PersonalInjury,
        &[
            "injury",
            "injured",
            "accident",
            "whiplash",
            "negligence claim",
            "medical",
            "hurt",
            "slip",
            "fall",
        ],
    ),
    (
        LegalCategory::Employment,
        &[
            "employer",
            "dismissal",
            "redundancy",
            "workplace",
            "discrimination",
            "unfair",
            "tribunal",
            "wages",
        ],
    ),
    (
        LegalCategory::PropertyDispute,
        &[
            "landlord",
            "tenant",
            "property",
            "lease",
            "eviction",
            "boundary",
            "neighbour",
            "housing",
        ],
    ),
    (
        LegalCategory::ConsumerDispute,
        &[
            "faulty",
            "goods",
            "product",
            "warranty",
            "retailer",
            "consumer",
            "purchase",
            "defective",
        ],
    ),
    (
        LegalCategory::ProfessionalNegligence,
        &[
            "solicitor",
            "accountant",
            "surveyor",
            "architect",
            "professional",
            "negligent advice",
            "bad advice",
        ],
    ),
];

/// Wording that marks a matter complex enough for the multi-track even
/// without a stated value.
const COMPLEXITY_KEYWORDS: &[&str] = &[
    "multiple parties",
    "group action",
    "class action",
    "fraud",
    "injunction",
    "international",
    "expert evidence",
    "complex",
];

const HIGH_URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "deadline",
    "today",
    "tomorrow",
    "court date",
    "hearing",
    "eviction notice",
    "injunction",
    "limitation",
];

const MEDIUM_URGENCY_KEYWORDS: &[&str] =
    &["soon", "this week", "next week", "quickly", "asap", "letter before action"];

static POUND_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"£\s*(\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)").unwrap()
});

static POUNDS_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)\s*pounds?\b").unwrap()
});

static K_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[£]?\s*(\d+(?:\.\d+)?)\s*k\b").unwrap());

static THOUSAND_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*thousand\b").unwrap());

/// Classify one message. `explicit_value_pence` overrides any value
/// detected in the text (used when a caller already knows the claim
/// value, e.g. from an earlier message in the session).
pub fn classify(text: &str, explicit_value_pence: Option<u64>) -> Classification {
    let lowered = text.to_lowercase();
    let category = detect_category(&lowered);
    let claim_value_pence = explicit_value_pence.or_else(|| detect_claim_value(text));
    let (track, review_needed) = assign_track(claim_value_pence, &lowered);
    let urgency = detect_urgency(&lowered);
    Classification { category, track, review_needed, urgency, claim_value_pence }
}

fn detect_category(lowered: &str) -> LegalCategory {
    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return *category;
        }
    }
    LegalCategory::General
}

/// Extract the largest monetary amount mentioned in the text, in pence.
/// Recognises `£12,500`, `4000 pounds`, `15k` and `25 thousand` forms.
pub fn detect_claim_value(text: &str) -> Option<u64> {
    let mut best: Option<u64> = None;

    let mut consider = |pence: u64| {
        best = Some(best.map_or(pence, |current| current.max(pence)));
    };

    for captures in POUND_AMOUNT.captures_iter(text) {
        if let Some(pence) = parse_decimal_pence(&captures[1]) {
            consider(pence);
        }
    }
    for captures in POUNDS_WORD.captures_iter(text) {
        if let Some(pence) = parse_decimal_pence(&captures[1]) {
            consider(pence);
        }
    }
    for captures in K_SUFFIX.captures_iter(text) {
        if let Ok(value) = captures[1].parse::<f64>() {
            consider((value * 1000.0 * 100.0).round() as u64);
        }
    }
    for captures in THOUSAND_WORD.captures_iter(text) {
        if let Ok(value) = captures[1].parse::<f64>() {
            consider((value * 1000.0 * 100.0).round() as u64);
        }
    }

    best
}

fn parse_decimal_pence(raw: &str) -> Option<u64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let value: f64 = cleaned.parse().ok()?;
    Some((value * 100.0).round() as u64)
}

fn assign_track(claim_value_pence: Option<u64>, lowered: &str) -> (Track, bool) {
    match claim_value_pence {
        Some(v) if v <= SMALL_CLAIMS_LIMIT_PENCE => (Track::SmallClaims, false),
        Some(v) if v <= FAST_TRACK_LIMIT_PENCE => (Track::FastTrack, false),
        Some(v) if v <= REVIEW_THRESHOLD_PENCE => (Track::MultiTrack, false),
        Some(_) => (Track::MultiTrack, true),
        None if COMPLEXITY_KEYWORDS.iter().any(|kw| lowered.contains(kw)) => {
            (Track::MultiTrack, true)
        }
        None => (Track::Unknown, false),
    }
}

fn detect_urgency(lowered: &str) -> Urgency {
    if HIGH_URGENCY_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Urgency::High
    } else if MEDIUM_URGENCY_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn category_priority_order_first_match_wins() {
        // "contract" outranks "unpaid" despite both matching.
        let c = classify("unpaid invoice under a signed contract", None);
        assert_eq!(c.category, LegalCategory::ContractDispute);
    }

    #[test]
    fn no_keyword_match_is_general() {
        let c = classify("I have a question about my situation", None);
        assert_eq!(c.category, LegalCategory::General);
    }

    #[test]
    fn detects_pound_sign_amounts_with_commas() {
        assert_eq!(detect_claim_value("they owe me £12,500 for the work"), Some(1_250_000));
    }

    #[test]
    fn detects_pounds_word_and_k_suffix() {
        assert_eq!(detect_claim_value("roughly 4000 pounds"), Some(400_000));
        assert_eq!(detect_claim_value("it's about 15k in total"), Some(1_500_000));
        assert_eq!(detect_claim_value("seeking 25 thousand"), Some(2_500_000));
    }

    #[test]
    fn largest_amount_wins() {
        assert_eq!(
            detect_claim_value("paid £2,000 deposit on a £9,500 job"),
            Some(950_000)
        );
    }

    #[test]
    fn track_boundaries_are_inclusive_to_the_lower_track() {
        let at_small_claims = classify("breach of contract worth £10,000", None);
        assert_eq!(at_small_claims.track, Track::SmallClaims);

        let at_fast_track = classify("breach of contract worth £25,000", None);
        assert_eq!(at_fast_track.track, Track::FastTrack);

        let at_review = classify("breach of contract worth £100,000", None);
        assert_eq!(at_review.track, Track::MultiTrack);
        assert!(!at_review.review_needed);
    }

    #[test]
    fn value_above_review_threshold_flags_review() {
        let c = classify("claim for £250,000 against the supplier", None);
        assert_eq!(c.track, Track::MultiTrack);
        assert!(c.review_needed);
    }

    #[test]
    fn complexity_without_value_flags_review() {
        let c = classify("a fraud case with multiple parties", None);
        assert_eq!(c.track, Track::MultiTrack);
        assert!(c.review_needed);
        assert_eq!(c.claim_value_pence, None);
    }

    #[test]
    fn no_value_no_complexity_is_unknown() {
        let c = classify("my landlord will not return my deposit", None);
        assert_eq!(c.track, Track::Unknown);
        assert!(!c.review_needed);
    }

    #[test]
    fn urgency_tiers() {
        assert_eq!(classify("I have a court date tomorrow", None).urgency, Urgency::High);
        assert_eq!(classify("need this sorted this week", None).urgency, Urgency::Medium);
        assert_eq!(classify("no rush at all", None).urgency, Urgency::Low);
    }

    #[test]
    fn explicit_value_overrides_detected_value() {
        let c = classify("the contract mentioned £500", Some(3_000_000));
        assert_eq!(c.claim_value_pence, Some(3_000_000));
        assert_eq!(c.track, Track::MultiTrack);
    }

    #[test]
    fn classification_is_deterministic() {
        let text = "urgent: builder breached our £18,000 contract";
        assert_eq!(classify(text, None), classify(text, None));
    }
}
