//! In-memory knowledge base and the ranked citation retriever.
//!
//! Records are an embedded snapshot built once at startup; retrieval is
//! read-only and deterministic for a given query.

use claimline_protocol::{Citation, CitationKind, LegalCategory, Track};

/// Kind of material a knowledge record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    /// Decided case with a citation.
    Case,
    /// Court procedure description.
    Procedure,
    /// Statutory provision.
    Statute,
}

/// One entry in the knowledge base.
#[derive(Debug, Clone)]
pub struct KnowledgeRecord {
    pub id: u32,
    pub content_type: ContentType,
    /// Categories the record speaks to.
    pub categories: &'static [LegalCategory],
    /// Tracks the record is relevant to.
    pub track_relevance: &'static [Track],
    pub title: &'static str,
    /// Formal reference: a law report citation, CPR part, or statute name.
    pub reference: &'static str,
    pub summary: &'static str,
    pub keywords: &'static [&'static str],
    pub url: &'static str,
}

/// Immutable collection of knowledge records with ranked retrieval.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    records: Vec<KnowledgeRecord>,
}

const CATEGORY_SCORE: u32 = 10;
const TRACK_SCORE: u32 = 4;
const KEYWORD_SCORE: u32 = 1;

impl KnowledgeBase {
    /// Build the base from an explicit record set.
    pub fn new(records: Vec<KnowledgeRecord>) -> Self {
        Self { records }
    }

    /// Build the base with the embedded record snapshot.
    pub fn seed() -> Self {
        Self::new(seed_records())
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the base holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rank records against a classified query and return at most `max`
    /// citations. Scoring: category match is worth the most, then track
    /// relevance, then individual keyword hits in the query text. Records
    /// scoring zero are never returned. Ties break on higher record id so
    /// newer records win.
    pub fn retrieve(
        &self,
        category: LegalCategory,
        track: Option<Track>,
        query: &str,
        max: usize,
    ) -> Vec<Citation> {
        let lowered = query.to_lowercase();
        let mut scored: Vec<(u32, &KnowledgeRecord)> = self
            .records
            .iter()
            .filter_map(|record| {
                let score = score_record(record, category, track, &lowered);
                (score > 0).then_some((score, record))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.id.cmp(&a.1.id)));
        scored
            .into_iter()
            .take(max)
            .map(|(_, record)| record_citation(record))
            .collect()
    }
}

fn score_record(
    record: &KnowledgeRecord,
    category: LegalCategory,
    track: Option<Track>,
    lowered_query: &str,
) -> u32 {
    let mut score = 0;
    if record.categories.contains(&category) {
        score += CATEGORY_SCORE;
    }
    if let Some(track) = track {
        if record.track_relevance.contains(&track) {
            score += TRACK_SCORE;
        }
    }
    for keyword in record.keywords {
        if lowered_query.contains(keyword) {
            score += KEYWORD_SCORE;
        }
    }
    score
}

fn record_citation(record: &KnowledgeRecord) -> Citation {
    let kind = match record.content_type {
        ContentType::Case => CitationKind::Case,
        // Statutes surface as procedural guidance in replies.
        ContentType::Procedure | ContentType::Statute => CitationKind::Procedure,
    };
    Citation {
        kind,
        display_name: record.title.to_string(),
        reference: record.reference.to_string(),
        url: Some(record.url.to_string()),
    }
}

fn seed_records() -> Vec<KnowledgeRecord> {
    use ContentType::*;
    use LegalCategory::*;
    use Track::*;

    vec![
        KnowledgeRecord {
            id: 1,
            content_type: Case,
            categories: &[ContractDispute],
            track_relevance: &[MultiTrack],
            title: "Dunlop Pneumatic Tyre Co Ltd v New Garage and Motor Co Ltd",
            reference: "[1915] AC 79",
            summary: "Distinguishes unenforceable penalty clauses from liquidated \
                      damages, which must be a genuine pre-estimate of loss.",
            keywords: &["penalty", "liquidated damages", "clause", "contract"],
            url: "https://www.bailii.org/uk/cases/UKHL/1915/1.html",
        },
        KnowledgeRecord {
            id: 2,
            content_type: Case,
            categories: &[ContractDispute],
            track_relevance: &[FastTrack],
            title: "Hadley v Baxendale",
            reference: "(1854) 9 Exch 341",
            summary: "Damages for breach of contract are limited to losses arising \
                      naturally from the breach or reasonably foreseeable at formation.",
            keywords: &["remoteness", "damages", "foreseeable", "breach"],
            url: "https://www.bailii.org/ew/cases/EWHC/Exch/1854/J70.html",
        },
        KnowledgeRecord {
            id: 3,
            content_type: Case,
            categories: &[ConsumerDispute, ContractDispute],
            track_relevance: &[SmallClaims],
            title: "Jarvis v Swans Tours Ltd",
            reference: "[1973] QB 233",
            summary: "Damages for disappointment and distress are recoverable in \
                      consumer contracts for holidays and leisure.",
            keywords: &["holiday", "disappointment", "distress", "consumer"],
            url: "https://www.bailii.org/ew/cases/EWCA/Civ/1972/12.html",
        },
        KnowledgeRecord {
            id: 4,
            content_type: Case,
            categories: &[ProfessionalNegligence, PersonalInjury],
            track_relevance: &[MultiTrack],
            title: "Caparo Industries plc v Dickman",
            reference: "[1990] 2 AC 605",
            summary: "Three-part test for duty of care in negligence: foreseeability \
                      of harm, proximity of relationship, and that imposing a duty is \
                      fair, just and reasonable.",
            keywords: &["duty of care", "negligence", "proximity", "foreseeability"],
            url: "https://www.bailii.org/uk/cases/UKHL/1990/2.html",
        },
        KnowledgeRecord {
            id: 5,
            content_type: Case,
            categories: &[General],
            track_relevance: &[MultiTrack],
            title: "Mitchell v News Group Newspapers Ltd",
            reference: "[2013] EWCA Civ 1537",
            summary: "Robust approach to relief from sanctions under CPR 3.9; parties \
                      must comply with court orders and directions.",
            keywords: &["sanctions", "relief", "costs", "case management"],
            url: "https://www.bailii.org/ew/cases/EWCA/Civ/2013/1537.html",
        },
        KnowledgeRecord {
            id: 6,
            content_type: Procedure,
            categories: &[
                General,
                ContractDispute,
                DebtRecovery,
                ConsumerDispute,
                PropertyDispute,
            ],
            track_relevance: &[SmallClaims],
            title: "Small Claims Track Procedure",
            reference: "CPR Part 27",
            summary: "Simplified procedure for disputes up to £10,000: limited \
                      disclosure, no requirement for legal representation, restricted \
                      costs recovery, informal hearings before a District Judge.",
            keywords: &["small claims", "district judge", "informal", "online claim"],
            url: "https://www.gov.uk/make-court-claim-for-money",
        },
        KnowledgeRecord {
            id: 7,
            content_type: Procedure,
            categories: &[General, ContractDispute, DebtRecovery, PersonalInjury],
            track_relevance: &[FastTrack],
            title: "Fast Track Case Management",
            reference: "CPR Part 28",
            summary: "Claims between £10,000 and £25,000 follow standard directions \
                      with a 30-week trial window, fixed trial costs, disclosure by \
                      list and usually a single joint expert.",
            keywords: &["fast track", "standard directions", "fixed costs", "expert"],
            url: "https://www.justice.gov.uk/courts/procedure-rules/civil",
        },
        KnowledgeRecord {
            id: 8,
            content_type: Procedure,
            categories: &[General, ContractDispute, ProfessionalNegligence],
            track_relevance: &[MultiTrack],
            title: "Multi-Track Case Management Conference",
            reference: "CPR Part 29",
            summary: "Claims over £25,000 are actively case-managed: Case Management \
                      Conferences, costs budgeting under Precedent H and directions \
                      tailored to the case.",
            keywords: &["multi track", "case management conference", "costs budgeting", "cmc"],
            url: "https://www.justice.gov.uk/courts/procedure-rules/civil",
        },
        KnowledgeRecord {
            id: 9,
            content_type: Procedure,
            categories: &[General],
            track_relevance: &[SmallClaims, FastTrack, MultiTrack],
            title: "Part 36 Offers",
            reference: "CPR Part 36",
            summary: "Formal settlement offers with costs consequences, open for at \
                      least 21 days. Failing to beat an offer at trial can shift costs \
                      from the offer's expiry plus interest.",
            keywords: &["part 36", "settlement", "offer", "costs consequences"],
            url: "https://www.justice.gov.uk/courts/procedure-rules/civil/rules/part36",
        },
        KnowledgeRecord {
            id: 10,
            content_type: Procedure,
            categories: &[General],
            track_relevance: &[FastTrack, MultiTrack],
            title: "Disclosure and Inspection",
            reference: "CPR Part 31",
            summary: "Standard disclosure covers documents that support or adversely \
                      affect any party's case, controlled by the court to stay \
                      proportionate to value and complexity.",
            keywords: &["disclosure", "inspection", "documents", "proportionality"],
            url: "https://www.justice.gov.uk/courts/procedure-rules/civil/rules/part31",
        },
        KnowledgeRecord {
            id: 11,
            content_type: Statute,
            categories: &[
                General,
                ContractDispute,
                PersonalInjury,
                ProfessionalNegligence,
                DebtRecovery,
            ],
            track_relevance: &[SmallClaims, FastTrack, MultiTrack],
            title: "Limitation Act 1980",
            reference: "Limitation Act 1980",
            summary: "Contract and tort claims must generally be brought within 6 \
                      years, personal injury within 3; time may extend for fraud, \
                      concealment or disability.",
            keywords: &["limitation", "time limit", "6 years", "3 years"],
            url: "https://www.legislation.gov.uk/ukpga/1980/58",
        },
        KnowledgeRecord {
            id: 12,
            content_type: Statute,
            categories: &[ConsumerDispute],
            track_relevance: &[SmallClaims, FastTrack],
            title: "Consumer Rights Act 2015",
            reference: "Consumer Rights Act 2015",
            summary: "Goods must be of satisfactory quality, fit for purpose and as \
                      described; consumers have rights to reject, repair, replacement \
                      and refund, and unfair terms are not binding.",
            keywords: &["consumer rights", "satisfactory quality", "refund", "unfair terms"],
            url: "https://www.legislation.gov.uk/ukpga/2015/15",
        },
        KnowledgeRecord {
            id: 13,
            content_type: Statute,
            categories: &[PersonalInjury],
            track_relevance: &[SmallClaims, FastTrack],
            title: "Civil Liability Act 2018",
            reference: "Civil Liability Act 2018",
            summary: "Fixed tariffs for whiplash injuries lasting up to 2 years and a \
                      £5,000 small claims limit for RTA-related personal injury.",
            keywords: &["whiplash", "tariff", "rta", "personal injury"],
            url: "https://www.legislation.gov.uk/ukpga/2018/29",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn retrieval_is_capped_and_ranked() {
        let base = KnowledgeBase::seed();
        let citations = base.retrieve(
            LegalCategory::ContractDispute,
            Some(Track::FastTrack),
            "breach of contract and remoteness of damages",
            2,
        );
        assert_eq!(citations.len(), 2);
        // Category + track + keyword hits put Hadley first.
        assert_eq!(citations[0].display_name, "Hadley v Baxendale");
        assert_eq!(citations[0].kind, CitationKind::Case);
    }

    #[test]
    fn zero_score_records_are_never_returned() {
        let base = KnowledgeBase::new(vec![KnowledgeRecord {
            id: 1,
            content_type: ContentType::Statute,
            categories: &[LegalCategory::ConsumerDispute],
            track_relevance: &[Track::SmallClaims],
            title: "Consumer Rights Act 2015",
            reference: "Consumer Rights Act 2015",
            summary: "",
            keywords: &["consumer rights"],
            url: "https://www.legislation.gov.uk/ukpga/2015/15",
        }]);
        let citations = base.retrieve(
            LegalCategory::Employment,
            Some(Track::MultiTrack),
            "dismissed without notice",
            5,
        );
        assert_eq!(citations, Vec::new());
    }

    #[test]
    fn statutes_surface_as_procedure_citations() {
        let base = KnowledgeBase::seed();
        let citations = base.retrieve(
            LegalCategory::ConsumerDispute,
            Some(Track::SmallClaims),
            "faulty goods and a refund",
            5,
        );
        let statute = citations
            .iter()
            .find(|c| c.display_name == "Consumer Rights Act 2015")
            .expect("statute retrieved");
        assert_eq!(statute.kind, CitationKind::Procedure);
    }

    #[test]
    fn ties_break_on_higher_record_id() {
        let base = KnowledgeBase::seed();
        // Limitation Act (id 11) and Part 36 (id 9) can both match General
        // with all tracks and no keyword hits; the newer record sorts first.
        let citations =
            base.retrieve(LegalCategory::General, Some(Track::FastTrack), "hello", 13);
        let limitation = citations
            .iter()
            .position(|c| c.display_name == "Limitation Act 1980")
            .expect("limitation act retrieved");
        let part36 = citations
            .iter()
            .position(|c| c.display_name == "Part 36 Offers")
            .expect("part 36 retrieved");
        assert!(limitation < part36);
    }
}
