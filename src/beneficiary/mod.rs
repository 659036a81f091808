// src/beneficiary/mod.rs
pub mod eligibility;
pub mod matcher;

pub use eligibility::{eligibility_for, EligibilityPolicy, NgoFundingAccess};
pub use matcher::{fallback_match, resolve_district, BeneficiaryMatcher, MatchContext};
