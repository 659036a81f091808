// src/beneficiary/eligibility.rs
use crate::models::{EligibilityStatus, IncomeBracket};
use crate::utils::round_to;

/// Access to subsidised NGO programs granted by an income bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NgoFundingAccess {
    Full,
    Partial,
    SelfPay,
}

impl NgoFundingAccess {
    pub fn description(&self) -> &'static str {
        match self {
            NgoFundingAccess::Full => "Full",
            NgoFundingAccess::Partial => "Partial / co-pay",
            NgoFundingAccess::SelfPay => "Recommend self-pay / government insurance instead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityPolicy {
    pub bracket: IncomeBracket,
    pub status: EligibilityStatus,
    pub access: NgoFundingAccess,
    /// Multiplier on NGO ranking scores. Lowers, never zeroes, NGO matches.
    pub ngo_weight: f64,
    score_offset: f64,
}

const RAW_SCORE_WEIGHT: f64 = 0.6;

pub fn eligibility_for(bracket: IncomeBracket) -> EligibilityPolicy {
    let (status, access, ngo_weight, score_offset) = match bracket {
        IncomeBracket::BelowOneLakh | IncomeBracket::OneToTwoLakhs => {
            (EligibilityStatus::Qualified, NgoFundingAccess::Full, 1.0, 40.0)
        }
        IncomeBracket::TwoToThreeLakhs => (
            EligibilityStatus::PartiallyQualified,
            NgoFundingAccess::Partial,
            0.85,
            25.0,
        ),
        IncomeBracket::AboveThreeLakhs => (
            EligibilityStatus::NotEligible,
            NgoFundingAccess::SelfPay,
            0.5,
            0.0,
        ),
    };
    EligibilityPolicy {
        bracket,
        status,
        access,
        ngo_weight,
        score_offset,
    }
}

impl EligibilityPolicy {
    /// Maps a raw 0-100 fit score into this bracket's band of the final
    /// match score. Bands are 40-100, 25-85 and 0-60, so a higher bracket
    /// always scores lower than a qualified one for the same fit.
    pub fn composite_score(&self, raw_fit: f64) -> u8 {
        let raw = if raw_fit.is_finite() {
            raw_fit.clamp(0.0, 100.0)
        } else {
            0.0
        };
        (self.score_offset + RAW_SCORE_WEIGHT * raw)
            .round()
            .clamp(0.0, 100.0) as u8
    }
}

/// Table rows in the order the portal lists the brackets.
pub fn policy_table() -> Vec<EligibilityPolicy> {
    IncomeBracket::ALL.iter().map(|b| eligibility_for(*b)).collect()
}

/// Safety rating on a 5 point scale, banded on facility capability.
pub fn safety_rating(capability_score: f64) -> f64 {
    match capability_score {
        s if s > 90.0 => 4.7,
        s if s > 80.0 => 4.5,
        s if s > 70.0 => 4.2,
        s if s > 60.0 => 4.0,
        s if s > 50.0 => 3.7,
        _ => 3.5,
    }
}

/// Travel estimate: 1-5 km inside the beneficiary's district, 5-15 km
/// outside it. Better equipped facilities are assumed closer to town.
pub fn estimated_distance_km(same_district: bool, capability_score: f64) -> f64 {
    let gap = (100.0 - capability_score.clamp(0.0, 100.0)) / 100.0;
    let km = if same_district {
        1.0 + gap * 4.0
    } else {
        5.0 + gap * 10.0
    };
    round_to(km, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table_matches_brackets() {
        let statuses: Vec<EligibilityStatus> = policy_table().iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![
                EligibilityStatus::Qualified,
                EligibilityStatus::Qualified,
                EligibilityStatus::PartiallyQualified,
                EligibilityStatus::NotEligible,
            ]
        );
        assert_eq!(
            eligibility_for(IncomeBracket::TwoToThreeLakhs).access,
            NgoFundingAccess::Partial
        );
        assert!(eligibility_for(IncomeBracket::AboveThreeLakhs).ngo_weight > 0.0);
    }

    #[test]
    fn test_top_bracket_scores_strictly_lower() {
        let low = eligibility_for(IncomeBracket::BelowOneLakh);
        let high = eligibility_for(IncomeBracket::AboveThreeLakhs);
        for raw in [0.0, 35.5, 70.0, 99.4, 100.0, 250.0, f64::NAN] {
            assert!(high.composite_score(raw) < low.composite_score(raw), "raw {}", raw);
        }
        assert_eq!(low.composite_score(100.0), 100);
        assert_eq!(high.composite_score(70.0), 42);
    }

    #[test]
    fn test_safety_bands_are_monotonic() {
        assert_eq!(safety_rating(95.0), 4.7);
        assert_eq!(safety_rating(90.0), 4.5);
        assert_eq!(safety_rating(81.0), 4.5);
        assert_eq!(safety_rating(10.0), 3.5);
        let mut last = 0.0;
        for s in 0..=100 {
            let r = safety_rating(s as f64);
            assert!(r >= last);
            last = r;
        }
    }

    #[test]
    fn test_distance_ranges() {
        assert_eq!(estimated_distance_km(true, 100.0), 1.0);
        assert_eq!(estimated_distance_km(true, 0.0), 5.0);
        assert_eq!(estimated_distance_km(false, 100.0), 5.0);
        assert_eq!(estimated_distance_km(false, 0.0), 15.0);
        assert_eq!(estimated_distance_km(true, 75.0), 2.0);
    }
}
