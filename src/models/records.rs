// src/models/records.rs
//
// Rows of the scored tables the graph builder and beneficiary matcher consume.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NgoRecord {
    pub name: String,
    pub district: String,
    #[serde(default)]
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub focus_areas: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capability_score: Option<f64>,
    #[serde(default)]
    pub alignment_score: Option<f64>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl NgoRecord {
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.focus_areas, self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityRecord {
    pub name: String,
    pub district: String,
    #[serde(default)]
    pub state: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(rename = "type", default)]
    pub facility_type: String,
    #[serde(default)]
    pub services_text: String,
    #[serde(default)]
    pub capability_score: Option<f64>,
    #[serde(default)]
    pub bed_count: Option<u32>,
    #[serde(skip)]
    pub embedding: Option<Vec<f32>>,
}

impl FacilityRecord {
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.facility_type, self.services_text)
    }

    /// Comma separated service list, trimmed.
    pub fn services(&self) -> Vec<String> {
        split_list(&self.services_text, ',')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunderRecord {
    pub name: String,
    #[serde(default)]
    pub focus_areas: String,
    #[serde(default)]
    pub regions: String,
    #[serde(rename = "type", default)]
    pub funder_type: Option<String>,
    #[serde(default)]
    pub grant_size: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

impl FunderRecord {
    /// Focus keywords, trimmed with blanks dropped.
    pub fn focus_keywords(&self) -> Vec<String> {
        split_list(&self.focus_areas, ',')
    }
}

pub(crate) fn split_list(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_funder_keywords_drop_blanks() {
        let funder = FunderRecord {
            name: "Gates".into(),
            focus_areas: "Maternal Health, ,Nutrition,".into(),
            regions: "India".into(),
            funder_type: None,
            grant_size: None,
            description: String::new(),
            relevance_score: None,
        };
        assert_eq!(funder.focus_keywords(), vec!["Maternal Health", "Nutrition"]);
    }

    #[test]
    fn test_facility_services_split() {
        let fac = FacilityRecord {
            name: "GGH Guntur".into(),
            district: "Guntur".into(),
            state: "Andhra Pradesh".into(),
            lat: 16.3,
            lon: 80.4,
            facility_type: "Government Hospital".into(),
            services_text: "NICU, Emergency Obstetric Care,Blood Bank".into(),
            capability_score: Some(91.0),
            bed_count: Some(1200),
            embedding: None,
        };
        assert_eq!(
            fac.services(),
            vec!["NICU", "Emergency Obstetric Care", "Blood Bank"]
        );
        assert_eq!(
            fac.embedding_text(),
            "Government Hospital NICU, Emergency Obstetric Care,Blood Bank"
        );
    }
}
