// src/models/beneficiary.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::records::split_list;

/// Yearly family income bracket as collected by the mother portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncomeBracket {
    #[serde(rename = "Below 1 Lakh")]
    BelowOneLakh,
    #[serde(rename = "1–2 Lakhs", alias = "1-2 Lakhs")]
    OneToTwoLakhs,
    #[serde(rename = "2–3 Lakhs", alias = "2-3 Lakhs")]
    TwoToThreeLakhs,
    #[serde(rename = "Above 3 Lakhs")]
    AboveThreeLakhs,
}

impl IncomeBracket {
    pub const ALL: [IncomeBracket; 4] = [
        IncomeBracket::BelowOneLakh,
        IncomeBracket::OneToTwoLakhs,
        IncomeBracket::TwoToThreeLakhs,
        IncomeBracket::AboveThreeLakhs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            IncomeBracket::BelowOneLakh => "Below 1 Lakh",
            IncomeBracket::OneToTwoLakhs => "1–2 Lakhs",
            IncomeBracket::TwoToThreeLakhs => "2–3 Lakhs",
            IncomeBracket::AboveThreeLakhs => "Above 3 Lakhs",
        }
    }
}

impl fmt::Display for IncomeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for IncomeBracket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept plain hyphens as well as the en dash used by the portal.
        let normalized = s.trim().replace('-', "–");
        IncomeBracket::ALL
            .iter()
            .copied()
            .find(|b| b.label().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| format!("Unknown income bracket '{}'", s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EligibilityStatus {
    #[serde(rename = "Qualified")]
    Qualified,
    #[serde(rename = "Partially Qualified")]
    PartiallyQualified,
    #[serde(rename = "Not Eligible")]
    NotEligible,
}

impl fmt::Display for EligibilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EligibilityStatus::Qualified => "Qualified",
            EligibilityStatus::PartiallyQualified => "Partially Qualified",
            EligibilityStatus::NotEligible => "Not Eligible",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryProfile {
    #[serde(default)]
    pub name: Option<String>,
    pub pincode: String,
    pub income: IncomeBracket,
    pub due_date: NaiveDate,
}

/// Reference statistics for one district, keyed by district name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictStats {
    pub district: String,
    #[serde(default)]
    pub state: String,
    pub annual_beneficiaries: u64,
    /// `;` separated pincode prefixes served by the district.
    #[serde(default)]
    pub pincode_prefixes: String,
    #[serde(default)]
    pub population: Option<u64>,
    #[serde(default)]
    pub institutional_delivery_pct: Option<f64>,
    #[serde(default)]
    pub maternal_mortality_ratio: Option<f64>,
}

impl DistrictStats {
    pub fn prefixes(&self) -> Vec<String> {
        split_list(&self.pincode_prefixes, ';')
    }

    pub fn serves_pincode(&self, pincode: &str) -> bool {
        let pincode = pincode.trim();
        self.prefixes().iter().any(|p| pincode.starts_with(p.as_str()))
    }
}

/// One recommendation per request; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryMatch {
    pub facility_name: String,
    pub program_name: String,
    pub match_score: u8,
    pub eligibility_status: EligibilityStatus,
    pub reasoning: Vec<String>,
    pub estimated_distance_km: f64,
    pub safety_rating: f64,
    pub bed_count: u32,
    pub specialized_services: Vec<String>,
    pub district_impact: String,
}
