// src/insights/listing.rs
//
// Directory listings over the NGO and funder tables.
use serde::Deserialize;
use std::cmp::Ordering;

use crate::models::{FunderRecord, NgoRecord};

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Descending by score; unscored rows count as 0.
fn by_score_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.unwrap_or(0.0)
        .partial_cmp(&a.unwrap_or(0.0))
        .unwrap_or(Ordering::Equal)
}

/// NGOs whose name or description contains `query` (case-insensitive),
/// highest alignment first. A blank query lists every NGO.
pub fn ngo_listing<'a>(ngos: &'a [NgoRecord], query: Option<&str>) -> Vec<&'a NgoRecord> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    let mut hits: Vec<&NgoRecord> = ngos
        .iter()
        .filter(|n| match query {
            Some(q) => contains_ci(&n.name, q) || contains_ci(&n.description, q),
            None => true,
        })
        .collect();
    hits.sort_by(|a, b| by_score_desc(a.alignment_score, b.alignment_score));
    hits
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FunderFilter {
    /// Exact funder type, e.g. "CSR" or "Foundation".
    #[serde(rename = "type", default)]
    pub funder_type: Option<String>,
    /// Case-insensitive substring of the funder's regions.
    #[serde(default)]
    pub geography: Option<String>,
}

impl FunderFilter {
    pub fn matches(&self, funder: &FunderRecord) -> bool {
        if let Some(wanted) = self.funder_type.as_deref().filter(|t| !t.is_empty()) {
            if funder.funder_type.as_deref() != Some(wanted) {
                return false;
            }
        }
        if let Some(geo) = self.geography.as_deref().filter(|g| !g.is_empty()) {
            if !contains_ci(&funder.regions, geo) {
                return false;
            }
        }
        true
    }
}

pub fn funder_listing<'a>(funders: &'a [FunderRecord], filter: &FunderFilter) -> Vec<&'a FunderRecord> {
    let mut hits: Vec<&FunderRecord> = funders.iter().filter(|f| filter.matches(f)).collect();
    hits.sort_by(|a, b| by_score_desc(a.relevance_score, b.relevance_score));
    hits
}
