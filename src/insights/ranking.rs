// src/insights/ranking.rs
use serde::Serialize;
use std::cmp::Ordering;

use crate::models::{FacilityRecord, NgoRecord};
use crate::utils::constants::PRIORITY_RANKING_LIMIT;

const DEFAULT_FACILITY_STATE: &str = "Andhra Pradesh";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedOrganization {
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: String,
    pub district: String,
    pub state: String,
    pub relevance_score: f64,
    pub priority_score: f64,
}

/// Unified NGO and facility list by capability score, best first.
pub fn priority_ranking(ngos: &[NgoRecord], facilities: &[FacilityRecord]) -> Vec<RankedOrganization> {
    let ngo_rows = ngos.iter().map(|n| {
        let score = n.capability_score.unwrap_or(0.0);
        RankedOrganization {
            name: n.name.clone(),
            org_type: "NGO".to_string(),
            district: n.district.clone(),
            state: n.state.clone(),
            relevance_score: score,
            priority_score: score,
        }
    });
    let facility_rows = facilities.iter().map(|f| {
        let score = f.capability_score.unwrap_or(0.0);
        RankedOrganization {
            name: f.name.clone(),
            org_type: if f.facility_type.trim().is_empty() {
                "Facility".to_string()
            } else {
                f.facility_type.clone()
            },
            district: f.district.clone(),
            state: DEFAULT_FACILITY_STATE.to_string(),
            relevance_score: score,
            priority_score: score,
        }
    });

    let mut rows: Vec<RankedOrganization> = ngo_rows.chain(facility_rows).collect();
    rows.sort_by(|a, b| {
        b.priority_score
            .partial_cmp(&a.priority_score)
            .unwrap_or(Ordering::Equal)
    });
    rows.truncate(PRIORITY_RANKING_LIMIT);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{facility, ngo};

    #[test]
    fn test_ranking_merges_and_caps() {
        let ngos: Vec<_> = (0..40)
            .map(|i| ngo(&format!("N{}", i), "Guntur", 16.3, i as f64, "maternal"))
            .collect();
        let mut facilities: Vec<_> = (0..20)
            .map(|i| facility(&format!("F{}", i), "Krishna", 16.5, 50.0 + i as f64, "PHC"))
            .collect();
        facilities[0].facility_type = String::new();
        facilities[0].state = "Telangana".into();

        let rows = priority_ranking(&ngos, &facilities);
        assert_eq!(rows.len(), 50);
        assert_eq!(rows[0].name, "F19");
        assert_eq!(rows[0].org_type, "PHC");
        assert_eq!(rows[0].state, "Andhra Pradesh");
        for pair in rows.windows(2) {
            assert!(pair[0].priority_score >= pair[1].priority_score);
        }
        let f0 = rows.iter().find(|r| r.name == "F0").unwrap();
        assert_eq!(f0.org_type, "Facility");
        assert_eq!(f0.state, "Andhra Pradesh");
    }
}
