// src/insights/search.rs
use serde::Deserialize;
use std::cmp::Ordering;

use crate::models::{Entity, OrgType};

/// Optional filters; unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(rename = "type", default)]
    pub org_type: Option<OrgType>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl SearchQuery {
    pub fn matches(&self, entity: &Entity) -> bool {
        if let Some(state) = &self.state {
            if entity.state.as_deref() != Some(state.as_str()) {
                return false;
            }
        }
        if let Some(district) = &self.district {
            if !entity.district.as_deref().is_some_and(|d| contains_ci(d, district)) {
                return false;
            }
        }
        if let Some(org_type) = self.org_type {
            if entity.org_type != Some(org_type) {
                return false;
            }
        }
        if let Some(q) = &self.query {
            if !contains_ci(&entity.name, q) && !contains_ci(&entity.description, q) {
                return false;
            }
        }
        true
    }
}

/// Entities matching every set filter, highest relevance first. Unscored
/// entities sort last.
pub fn search_entities<'a>(entities: &'a [Entity], query: &SearchQuery) -> Vec<&'a Entity> {
    let mut hits: Vec<&Entity> = entities.iter().filter(|e| query.matches(e)).collect();
    hits.sort_by(|a, b| match (a.relevance_score, b.relevance_score) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::fixtures::entity;

    fn corpus() -> Vec<Entity> {
        vec![
            entity("Rainbow Hospitals", OrgType::PrivateHospital, Some("Hyderabad"), Some(72.0), None),
            entity("GGH Guntur", OrgType::GovernmentHospital, Some("Guntur"), Some(91.0), None),
            entity("Sakhi Trust", OrgType::Ngo, Some("East Godavari"), None, None),
            entity("Guntur PHC", OrgType::Phc, Some("Guntur"), Some(64.0), None),
        ]
    }

    #[test]
    fn test_empty_query_returns_all_by_relevance() {
        let all = corpus();
        let names: Vec<&str> = search_entities(&all, &SearchQuery::default())
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["GGH Guntur", "Rainbow Hospitals", "Guntur PHC", "Sakhi Trust"]
        );
    }

    #[test]
    fn test_filters_combine() {
        let all = corpus();
        let query = SearchQuery {
            district: Some("gunt".into()),
            org_type: Some(OrgType::Phc),
            ..SearchQuery::default()
        };
        let hits = search_entities(&all, &query);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Guntur PHC");

        let by_text = SearchQuery {
            query: Some("MOTHERS".into()),
            state: Some("Telangana".into()),
            ..SearchQuery::default()
        };
        assert!(search_entities(&all, &by_text).is_empty());
    }
}
