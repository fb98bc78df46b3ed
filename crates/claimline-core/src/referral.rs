//! Solicitor directory and the referral matcher.
//!
//! Matching is pure scoring over an embedded directory snapshot plus a
//! set of funding heuristics keyed on claim value and category.

use crate::classify::{Classification, Urgency};
use claimline_protocol::{FundingOption, LegalCategory, ReferralInfo, SolicitorSummary, Track};

/// One firm in the referral directory.
#[derive(Debug, Clone)]
pub struct SolicitorRecord {
    pub firm_name: &'static str,
    pub contact_name: &'static str,
    pub location: &'static str,
    pub contact_email: &'static str,
    pub contact_phone: &'static str,
    pub website: &'static str,
    /// Categories the firm specialises in.
    pub specialties: &'static [LegalCategory],
    /// Tracks the firm has acted on.
    pub track_experience: &'static [Track],
    /// Firm takes general litigation work outside its specialties.
    pub general_practice: bool,
    /// Firm acts across every track.
    pub all_tracks: bool,
    /// Firm handles urgent applications such as injunctions.
    pub urgent_applications: bool,
    /// Smallest claim value the firm takes, in pence.
    pub min_claim_value_pence: u64,
    /// Largest claim value the firm takes, in pence.
    pub max_claim_value_pence: u64,
}

/// Immutable directory of firms with scored matching.
#[derive(Debug, Clone)]
pub struct SolicitorDirectory {
    records: Vec<SolicitorRecord>,
}

const SPECIALTY_SCORE: u32 = 10;
const GENERAL_PRACTICE_SCORE: u32 = 5;
const TRACK_SCORE: u32 = 8;
const ALL_TRACKS_SCORE: u32 = 6;
const URGENCY_SCORE: u32 = 5;

impl SolicitorDirectory {
    pub fn new(records: Vec<SolicitorRecord>) -> Self {
        Self { records }
    }

    /// Build the directory with the embedded firm snapshot.
    pub fn seed() -> Self {
        Self::new(seed_records())
    }

    /// Match firms against a classification and return referral details
    /// with at most `max` firms. Firms whose value range excludes the
    /// claim are filtered out before scoring; zero-scoring firms are
    /// dropped. Ordering is score descending, then firm name ascending
    /// so equal scores list alphabetically.
    pub fn match_referrals(&self, classification: &Classification, max: usize) -> ReferralInfo {
        let mut scored: Vec<(u32, &SolicitorRecord)> = self
            .records
            .iter()
            .filter(|record| value_in_range(record, classification.claim_value_pence))
            .filter_map(|record| {
                let score = score_record(record, classification);
                (score > 0).then_some((score, record))
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.firm_name.cmp(b.1.firm_name)));

        let solicitors = scored
            .into_iter()
            .take(max)
            .map(|(_, record)| SolicitorSummary {
                firm_name: record.firm_name.to_string(),
                contact_name: record.contact_name.to_string(),
                location: record.location.to_string(),
                contact_email: record.contact_email.to_string(),
                contact_phone: record.contact_phone.to_string(),
                website: record.website.to_string(),
                specialties: record.specialties.to_vec(),
            })
            .collect();

        ReferralInfo {
            advice: referral_advice(classification),
            solicitors,
            funding_options: funding_options(classification),
        }
    }
}

fn value_in_range(record: &SolicitorRecord, claim_value_pence: Option<u64>) -> bool {
    match claim_value_pence {
        Some(v) => v >= record.min_claim_value_pence && v <= record.max_claim_value_pence,
        // Unknown value never excludes a firm.
        None => true,
    }
}

fn score_record(record: &SolicitorRecord, classification: &Classification) -> u32 {
    let mut score = 0;
    if record.specialties.contains(&classification.category) {
        score += SPECIALTY_SCORE;
    } else if record.general_practice {
        score += GENERAL_PRACTICE_SCORE;
    }
    if record.track_experience.contains(&classification.track) {
        score += TRACK_SCORE;
    } else if record.all_tracks {
        score += ALL_TRACKS_SCORE;
    }
    if classification.urgency == Urgency::High && record.urgent_applications {
        score += URGENCY_SCORE;
    }
    score
}

fn referral_advice(classification: &Classification) -> String {
    match classification.track {
        Track::SmallClaims => {
            "Small claims are designed for litigants in person; legal representation \
             is optional and costs recovery from the other side is restricted. A \
             fixed-fee consultation may still help you prepare."
                .to_string()
        }
        Track::FastTrack => {
            "Fast track claims follow standard court directions with fixed trial \
             costs. Instructing a solicitor early helps with disclosure and witness \
             evidence deadlines."
                .to_string()
        }
        Track::MultiTrack => {
            "Multi-track claims involve active case management and costs budgeting. \
             Specialist representation is strongly recommended."
                .to_string()
        }
        Track::Unknown => {
            "Tell us the approximate value of your claim so we can suggest the right \
             court track and suitable firms."
                .to_string()
        }
    }
}

/// Funding routes a claimant could explore, gated on value and category
/// so the list stays relevant to the matter.
fn funding_options(classification: &Classification) -> Vec<FundingOption> {
    let value = classification.claim_value_pence;
    let mut options = Vec::new();

    if classification.category == LegalCategory::PropertyDispute
        && value.is_some_and(|v| v < 500_000)
    {
        options.push(FundingOption {
            name: "Legal Aid".to_string(),
            description: "Public funding for eligible housing matters such as \
                          eviction and disrepair."
                .to_string(),
            eligibility: "Means-tested; housing cases only.".to_string(),
            cost: "Free if eligible.".to_string(),
        });
    }
    if value.is_none_or(|v| v >= 100_000) {
        options.push(FundingOption {
            name: "Conditional Fee Agreement (CFA)".to_string(),
            description: "No win, no fee. The solicitor's success fee is deducted \
                          from damages on success."
                .to_string(),
            eligibility: "Claims with reasonable prospects of success.".to_string(),
            cost: "Success fee up to 25% of damages.".to_string(),
        });
    }
    if value.is_some_and(|v| v >= 500_000) {
        options.push(FundingOption {
            name: "After the Event (ATE) Insurance".to_string(),
            description: "Insurance against paying the other side's costs if the \
                          claim fails."
                .to_string(),
            eligibility: "Usually taken alongside a CFA.".to_string(),
            cost: "Premium payable, often deferred until conclusion.".to_string(),
        });
    }
    if value.is_some_and(|v| v >= 1_000_000) {
        options.push(FundingOption {
            name: "Damages-Based Agreement (DBA)".to_string(),
            description: "The solicitor's fee is an agreed percentage of damages \
                          recovered."
                .to_string(),
            eligibility: "Higher-value claims with good prospects.".to_string(),
            cost: "Up to 50% of damages in commercial claims.".to_string(),
        });
    }
    if value.is_some_and(|v| v >= 5_000_000) {
        options.push(FundingOption {
            name: "Third-Party Funding".to_string(),
            description: "A commercial funder pays the legal costs in return for a \
                          share of damages."
                .to_string(),
            eligibility: "Substantial claims, typically £50,000 and above.".to_string(),
            cost: "Funder's share agreed case by case.".to_string(),
        });
    }

    options
}

fn seed_records() -> Vec<SolicitorRecord> {
    use LegalCategory::*;
    use Track::*;

    vec![
        SolicitorRecord {
            firm_name: "City Commercial Law LLP",
            contact_name: "Sarah Johnson",
            location: "London",
            contact_email: "sarah.johnson@citycommercial.co.uk",
            contact_phone: "020 7123 4567",
            website: "https://www.citycommercial.co.uk",
            specialties: &[ContractDispute, DebtRecovery],
            track_experience: &[FastTrack, MultiTrack],
            general_practice: false,
            all_tracks: false,
            urgent_applications: true,
            min_claim_value_pence: 1_000_000,
            max_claim_value_pence: 10_000_000,
        },
        SolicitorRecord {
            firm_name: "Regional Litigation Partners",
            contact_name: "Michael Brown",
            location: "Manchester",
            contact_email: "michael.brown@regionallitigation.co.uk",
            contact_phone: "0161 234 5678",
            website: "https://www.regionallitigation.co.uk",
            specialties: &[PersonalInjury, Employment, ConsumerDispute],
            track_experience: &[SmallClaims, FastTrack, MultiTrack],
            general_practice: true,
            all_tracks: true,
            urgent_applications: false,
            min_claim_value_pence: 50_000,
            max_claim_value_pence: 5_000_000,
        },
        SolicitorRecord {
            firm_name: "Professional Negligence Specialists",
            contact_name: "Dr. Emma Wilson",
            location: "Birmingham",
            contact_email: "emma.wilson@profnegligence.co.uk",
            contact_phone: "0121 345 6789",
            website: "https://www.profnegligence.co.uk",
            specialties: &[ProfessionalNegligence],
            track_experience: &[FastTrack, MultiTrack],
            general_practice: false,
            all_tracks: false,
            urgent_applications: false,
            min_claim_value_pence: 500_000,
            max_claim_value_pence: 10_000_000,
        },
        SolicitorRecord {
            firm_name: "High Street Legal Services",
            contact_name: "James Thompson",
            location: "Leeds",
            contact_email: "james.thompson@highstreetlegal.co.uk",
            contact_phone: "0113 456 7890",
            website: "https://www.highstreetlegal.co.uk",
            specialties: &[ConsumerDispute, PropertyDispute, DebtRecovery],
            track_experience: &[SmallClaims, FastTrack],
            general_practice: true,
            all_tracks: false,
            urgent_applications: true,
            min_claim_value_pence: 10_000,
            max_claim_value_pence: 2_500_000,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use pretty_assertions::assert_eq;

    #[test]
    fn specialty_and_track_outrank_general_practice() {
        let classification = classify("breach of contract worth £18,000", None);
        let info = SolicitorDirectory::seed().match_referrals(&classification, 3);
        assert_eq!(info.solicitors[0].firm_name, "City Commercial Law LLP");
    }

    #[test]
    fn value_range_filters_firms_out() {
        // £250,000 is above every firm's maximum.
        let classification = classify("contract dispute over £250,000", None);
        let info = SolicitorDirectory::seed().match_referrals(&classification, 3);
        assert_eq!(info.solicitors, Vec::new());
    }

    #[test]
    fn unknown_value_excludes_nobody() {
        let classification = classify("my landlord is evicting me", None);
        let info = SolicitorDirectory::seed().match_referrals(&classification, 3);
        assert!(!info.solicitors.is_empty());
    }

    #[test]
    fn results_are_capped() {
        let classification = classify("faulty goods, about £800", None);
        let info = SolicitorDirectory::seed().match_referrals(&classification, 1);
        assert_eq!(info.solicitors.len(), 1);
    }

    #[test]
    fn equal_scores_order_alphabetically() {
        let directory = SolicitorDirectory::new(vec![
            SolicitorRecord {
                firm_name: "Zeta Law",
                contact_name: "A",
                location: "London",
                contact_email: "a@zeta.example",
                contact_phone: "1",
                website: "https://zeta.example",
                specialties: &[LegalCategory::ContractDispute],
                track_experience: &[Track::SmallClaims],
                general_practice: false,
                all_tracks: false,
                urgent_applications: false,
                min_claim_value_pence: 0,
                max_claim_value_pence: u64::MAX,
            },
            SolicitorRecord {
                firm_name: "Alpha Law",
                contact_name: "B",
                location: "Leeds",
                contact_email: "b@alpha.example",
                contact_phone: "2",
                website: "https://alpha.example",
                specialties: &[LegalCategory::ContractDispute],
                track_experience: &[Track::SmallClaims],
                general_practice: false,
                all_tracks: false,
                urgent_applications: false,
                min_claim_value_pence: 0,
                max_claim_value_pence: u64::MAX,
            },
        ]);
        let classification = classify("breach of contract worth £2,000", None);
        let info = directory.match_referrals(&classification, 3);
        assert_eq!(info.solicitors[0].firm_name, "Alpha Law");
        assert_eq!(info.solicitors[1].firm_name, "Zeta Law");
    }

    #[test]
    fn funding_scales_with_claim_value() {
        let small = classify("owed £1,500 for an unpaid invoice", None);
        let small_names: Vec<String> = SolicitorDirectory::seed()
            .match_referrals(&small, 3)
            .funding_options
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert!(small_names.iter().any(|n| n.contains("Conditional Fee")));
        assert!(!small_names.iter().any(|n| n.contains("Third-Party")));

        let large = classify("contract claim for £75,000", None);
        let large_names: Vec<String> = SolicitorDirectory::seed()
            .match_referrals(&large, 3)
            .funding_options
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert!(large_names.iter().any(|n| n.contains("Third-Party")));
        assert!(large_names.iter().any(|n| n.contains("Damages-Based")));
    }

    #[test]
    fn advice_follows_the_assigned_track() {
        let directory = SolicitorDirectory::seed();

        let small = directory.match_referrals(&classify("owed £3,000 in unpaid invoices", None), 3);
        assert!(small.advice.contains("representation is optional"));

        let multi = directory.match_referrals(&classify("£80,000 contract claim", None), 3);
        assert!(multi.advice.contains("Specialist representation"));

        let unknown = directory.match_referrals(&classify("need some general help", None), 3);
        assert!(unknown.advice.contains("approximate value"));
    }

    #[test]
    fn legal_aid_only_for_low_value_housing() {
        let housing = classify("my landlord ignored the disrepair, about £2,000", None);
        let info = SolicitorDirectory::seed().match_referrals(&housing, 3);
        assert!(info.funding_options.iter().any(|o| o.name == "Legal Aid"));

        let contract = classify("breach of contract worth £2,000", None);
        let info = SolicitorDirectory::seed().match_referrals(&contract, 3);
        assert!(!info.funding_options.iter().any(|o| o.name == "Legal Aid"));
    }
}
