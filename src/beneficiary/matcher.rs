// src/beneficiary/matcher.rs
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::sync::Arc;

use super::eligibility::{
    eligibility_for, estimated_distance_km, policy_table, safety_rating, EligibilityPolicy,
};
use crate::ai::responses::BeneficiaryMatchResponse;
use crate::ai::{request_structured, AiError, LanguageModel};
use crate::models::{
    BeneficiaryMatch, BeneficiaryProfile, DistrictStats, EligibilityStatus, FacilityRecord,
    NgoRecord,
};
use crate::scoring::bootstrap_label;

/// Candidates of each kind passed to the language model.
pub const DEFAULT_CANDIDATES: usize = 5;

/// Service terms that make a facility a stronger maternity match.
const MATERNAL_SERVICE_TERMS: [&str; 7] = [
    "nicu",
    "emergency obstetric",
    "labour",
    "labor",
    "maternity",
    "antenatal",
    "blood bank",
];
const SERVICE_BONUS: f64 = 5.0;
const SERVICE_BONUS_CAP: f64 = 15.0;
const SAME_DISTRICT_BONUS: f64 = 10.0;
const MATERNAL_FOCUS_BONUS: f64 = 10.0;

const FALLBACK_FACILITY: &str = "District Government Hospital";
const FALLBACK_PROGRAM: &str = "Janani Suraksha Yojana";
const SELF_PAY_PROGRAM: &str = "Self-pay / Government insurance (PM-JAY)";
const FALLBACK_RAW_SCORE: f64 = 70.0;
const FALLBACK_SAFETY: f64 = 4.0;
const FALLBACK_DISTANCE_KM: f64 = 5.0;
const FALLBACK_BEDS: u32 = 100;
const FALLBACK_SERVICES: [&str; 3] = [
    "Antenatal care",
    "Institutional delivery",
    "Emergency obstetric care",
];

/// Read-only inputs for one match request.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub facilities: &'a [FacilityRecord],
    pub ngos: &'a [NgoRecord],
    pub districts: &'a [DistrictStats],
}

/// District whose pincode prefixes cover `pincode`. The longest matching
/// prefix wins so a narrower district beats a broader one.
pub fn resolve_district<'a>(pincode: &str, districts: &'a [DistrictStats]) -> Option<&'a DistrictStats> {
    let pincode = pincode.trim();
    districts
        .iter()
        .filter_map(|d| {
            d.prefixes()
                .iter()
                .filter(|p| pincode.starts_with(p.as_str()))
                .map(|p| p.len())
                .max()
                .map(|len| (d, len))
        })
        .fold(None, |best: Option<(&DistrictStats, usize)>, (d, len)| match best {
            Some((_, best_len)) if best_len >= len => best,
            _ => Some((d, len)),
        })
        .map(|(d, _)| d)
}

fn same_district(a: &str, b: Option<&str>) -> bool {
    b.is_some_and(|b| a.trim().eq_ignore_ascii_case(b.trim()))
}

fn facility_rank(facility: &FacilityRecord, district: Option<&str>) -> f64 {
    let services = facility.services_text.to_lowercase();
    let matched = MATERNAL_SERVICE_TERMS
        .iter()
        .filter(|t| services.contains(*t))
        .count() as f64;
    let mut rank = facility.capability_score.unwrap_or(0.0)
        + (matched * SERVICE_BONUS).min(SERVICE_BONUS_CAP);
    if same_district(&facility.district, district) {
        rank += SAME_DISTRICT_BONUS;
    }
    rank
}

/// Facilities ordered by capability, maternity services and proximity.
pub fn rank_facilities<'a>(
    facilities: &'a [FacilityRecord],
    district: Option<&str>,
) -> Vec<(&'a FacilityRecord, f64)> {
    let mut ranked: Vec<_> = facilities
        .iter()
        .map(|f| (f, facility_rank(f, district)))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}

/// NGOs ordered by maternal alignment, scaled by the bracket's NGO weight.
pub fn rank_ngos<'a>(
    ngos: &'a [NgoRecord],
    district: Option<&str>,
    policy: &EligibilityPolicy,
) -> Vec<(&'a NgoRecord, f64)> {
    let mut ranked: Vec<_> = ngos
        .iter()
        .map(|n| {
            let mut score = n.capability_score.or(n.alignment_score).unwrap_or(0.0);
            if bootstrap_label(&n.embedding_text()) {
                score += MATERNAL_FOCUS_BONUS;
            }
            if same_district(&n.district, district) {
                score += SAME_DISTRICT_BONUS;
            }
            (n, score * policy.ngo_weight)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    ranked
}

fn district_impact(stats: Option<&DistrictStats>, pincode: &str) -> String {
    match stats {
        Some(d) => {
            let mut impact = format!(
                "{} district: ~{} expected deliveries per year",
                d.district, d.annual_beneficiaries
            );
            if let Some(pct) = d.institutional_delivery_pct {
                impact.push_str(&format!(", {:.1}% institutional deliveries", pct));
            }
            if let Some(mmr) = d.maternal_mortality_ratio {
                impact.push_str(&format!(", MMR {:.0}", mmr));
            }
            impact
        }
        None => format!("District statistics unavailable for pincode {}", pincode.trim()),
    }
}

pub struct BeneficiaryMatcher {
    llm: Arc<dyn LanguageModel>,
    candidates: usize,
}

impl BeneficiaryMatcher {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self {
            llm,
            candidates: DEFAULT_CANDIDATES,
        }
    }

    pub fn with_candidates(mut self, candidates: usize) -> Self {
        self.candidates = candidates.max(1);
        self
    }

    /// Produces one recommendation. Never fails: any collaborator problem
    /// yields the fixed fallback recommendation.
    pub async fn match_beneficiary(
        &self,
        profile: &BeneficiaryProfile,
        ctx: MatchContext<'_>,
    ) -> BeneficiaryMatch {
        let policy = eligibility_for(profile.income);
        let stats = resolve_district(&profile.pincode, ctx.districts);
        let district = stats.map(|d| d.district.as_str());
        if stats.is_none() {
            warn!("No district covers pincode {}", profile.pincode.trim());
        }

        let facilities: Vec<_> = rank_facilities(ctx.facilities, district)
            .into_iter()
            .take(self.candidates)
            .collect();
        let ngos: Vec<_> = rank_ngos(ctx.ngos, district, &policy)
            .into_iter()
            .take(self.candidates)
            .collect();

        if facilities.is_empty() {
            warn!("No facilities loaded, returning fallback recommendation");
            return fallback_match(profile, stats);
        }

        let prompt = match_prompt(profile, &policy, stats, &facilities, &ngos);
        let outcome =
            request_structured::<BeneficiaryMatchResponse>(self.llm.as_ref(), &prompt)
                .await
                .and_then(|response| {
                    finalize(response, &policy, stats, &facilities, &profile.pincode)
                });

        match outcome {
            Ok(result) => {
                info!(
                    "🔍 Matched beneficiary to '{}' ({}, score {})",
                    result.facility_name, result.eligibility_status, result.match_score
                );
                result
            }
            Err(e) => {
                warn!("Beneficiary matching failed ({}), returning fallback", e);
                fallback_match(profile, stats)
            }
        }
    }
}

/// Turns a validated model answer into the final result. Eligibility, score
/// band, safety and distance come from the policy and the facility record,
/// not from the model.
fn finalize(
    response: BeneficiaryMatchResponse,
    policy: &EligibilityPolicy,
    stats: Option<&DistrictStats>,
    facilities: &[(&FacilityRecord, f64)],
    pincode: &str,
) -> Result<BeneficiaryMatch, AiError> {
    let wanted = response.facility_name.trim();
    let facility = facilities
        .iter()
        .map(|(f, _)| *f)
        .find(|f| f.name.trim().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            AiError::InvalidValue(format!("facility '{}' is not a candidate", wanted))
        })?;

    if response.eligibility_status != policy.status {
        debug!(
            "Model suggested '{}', policy says '{}' for {}",
            response.eligibility_status, policy.status, policy.bracket
        );
    }

    let capability = facility.capability_score.unwrap_or(0.0);
    let district = stats.map(|d| d.district.as_str());
    let program_name = match policy.status {
        EligibilityStatus::NotEligible => SELF_PAY_PROGRAM.to_string(),
        _ if response.program_name.trim().is_empty() => FALLBACK_PROGRAM.to_string(),
        _ => response.program_name.trim().to_string(),
    };
    let bed_count = facility.bed_count.unwrap_or_else(|| response.beds());
    let specialized_services = if response.specialized_services.is_empty() {
        facility.services()
    } else {
        response.specialized_services
    };
    let district_impact = if response.district_impact.trim().is_empty() {
        district_impact(stats, pincode)
    } else {
        response.district_impact
    };

    Ok(BeneficiaryMatch {
        facility_name: facility.name.clone(),
        program_name,
        match_score: policy.composite_score(response.match_score),
        eligibility_status: policy.status,
        reasoning: response.reasoning,
        estimated_distance_km: estimated_distance_km(
            same_district(&facility.district, district),
            capability,
        ),
        safety_rating: safety_rating(capability),
        bed_count,
        specialized_services,
        district_impact,
    })
}

/// Fixed recommendation returned when matching cannot complete.
pub fn fallback_match(
    profile: &BeneficiaryProfile,
    stats: Option<&DistrictStats>,
) -> BeneficiaryMatch {
    let policy = eligibility_for(profile.income);
    let (program_name, funding_reason) = match policy.status {
        EligibilityStatus::NotEligible => (
            SELF_PAY_PROGRAM,
            "Household income is above the subsidy threshold; PM-JAY or private cover applies",
        ),
        _ => (
            FALLBACK_PROGRAM,
            "Janani Suraksha Yojana provides cash assistance for institutional delivery",
        ),
    };
    BeneficiaryMatch {
        facility_name: FALLBACK_FACILITY.to_string(),
        program_name: program_name.to_string(),
        match_score: policy.composite_score(FALLBACK_RAW_SCORE),
        eligibility_status: policy.status,
        reasoning: vec![
            "District government hospitals offer free institutional delivery".to_string(),
            funding_reason.to_string(),
            "Emergency obstetric care is available round the clock".to_string(),
        ],
        estimated_distance_km: FALLBACK_DISTANCE_KM,
        safety_rating: FALLBACK_SAFETY,
        bed_count: FALLBACK_BEDS,
        specialized_services: FALLBACK_SERVICES.iter().map(|s| s.to_string()).collect(),
        district_impact: district_impact(stats, &profile.pincode),
    }
}

fn match_prompt(
    profile: &BeneficiaryProfile,
    policy: &EligibilityPolicy,
    stats: Option<&DistrictStats>,
    facilities: &[(&FacilityRecord, f64)],
    ngos: &[(&NgoRecord, f64)],
) -> String {
    let table = policy_table()
        .iter()
        .map(|p| format!("| {} | {} | {} |", p.bracket, p.status, p.access.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let facility_lines = facilities
        .iter()
        .map(|(f, rank)| {
            format!(
                "- {} | district: {} | type: {} | capability: {:.1} | beds: {} | services: {} | rank: {:.1}",
                f.name,
                f.district,
                f.facility_type,
                f.capability_score.unwrap_or(0.0),
                f.bed_count.map(|b| b.to_string()).unwrap_or_else(|| "unknown".into()),
                f.services_text,
                rank
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let ngo_lines = if ngos.is_empty() {
        "- none available".to_string()
    } else {
        ngos.iter()
            .map(|(n, score)| {
                format!(
                    "- {} | district: {} | focus: {} | weighted score: {:.1}",
                    n.name, n.district, n.focus_areas, score
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let district_line = district_impact(stats, &profile.pincode);

    format!(
        "You are matching an expectant mother in Andhra Pradesh / Telangana to the best maternity facility and support program.\n\n\
         Beneficiary:\n\
         - Pincode: {pincode}\n\
         - Yearly family income: {income}\n\
         - Expected due date: {due_date}\n\n\
         Eligibility policy:\n\
         | Income bracket | Eligibility status | NGO funding access |\n\
         {table}\n\
         This beneficiary's status is \"{status}\" with NGO access \"{access}\".\n\n\
         District statistics: {district_line}\n\n\
         Candidate facilities (best first):\n{facility_lines}\n\n\
         Candidate NGO programs (best first):\n{ngo_lines}\n\n\
         Instructions:\n\
         - Choose facility_name exactly as written in the facility list.\n\
         - Prefer high capability, NICU / emergency obstetric services and the beneficiary's own district.\n\
         - Pick a supporting program from the NGO list that fits maternal health needs.\n\
         - Give exactly 3 reasoning strings, each citing concrete values from the data above.\n\
         - match_score is your 0-100 fit estimate before eligibility adjustments.\n\n\
         Return JSON with fields: facility_name, program_name, match_score, eligibility_status, \
         reasoning, estimated_distance_km, safety_rating, bed_count, specialized_services, district_impact.\n\
         Return ONLY the JSON.",
        pincode = profile.pincode.trim(),
        income = profile.income,
        due_date = profile.due_date,
        status = policy.status,
        access = policy.access.description(),
    )
}
