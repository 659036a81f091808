// src/models/entity.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type EntityId = i64;

/// The seven organization labels the classifier is allowed to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrgType {
    #[serde(rename = "PHC")]
    Phc,
    #[serde(rename = "Government Hospital")]
    GovernmentHospital,
    #[serde(rename = "Private Hospital")]
    PrivateHospital,
    #[serde(rename = "Medical College")]
    MedicalCollege,
    #[serde(rename = "NGO")]
    Ngo,
    #[serde(rename = "Corporate")]
    Corporate,
    #[serde(rename = "Funder")]
    Funder,
}

impl OrgType {
    pub const ALL: [OrgType; 7] = [
        OrgType::Phc,
        OrgType::GovernmentHospital,
        OrgType::PrivateHospital,
        OrgType::MedicalCollege,
        OrgType::Ngo,
        OrgType::Corporate,
        OrgType::Funder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgType::Phc => "PHC",
            OrgType::GovernmentHospital => "Government Hospital",
            OrgType::PrivateHospital => "Private Hospital",
            OrgType::MedicalCollege => "Medical College",
            OrgType::Ngo => "NGO",
            OrgType::Corporate => "Corporate",
            OrgType::Funder => "Funder",
        }
    }

    /// Phrase used when addressing an organization of this type in outreach copy.
    pub fn outreach_context(&self) -> &'static str {
        match self {
            OrgType::PrivateHospital => {
                "a private hospital specializing in women and children's health"
            }
            OrgType::GovernmentHospital => "a government hospital serving the public",
            OrgType::MedicalCollege => "a medical college with hospital facilities",
            OrgType::Phc => "a primary health centre serving rural communities",
            OrgType::Ngo => "an NGO working on maternal and child health",
            OrgType::Funder => "a foundation/funder interested in maternal health programs",
            OrgType::Corporate => "a corporate entity with CSR programs in healthcare",
        }
    }
}

impl fmt::Display for OrgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrgType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        OrgType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("Unknown organization type '{}'", needle))
    }
}

/// A generic organization record as held by the persistence layer.
///
/// `embedding` is either absent or exactly the configured dimension, and the
/// scores stay `None` until scoring has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// `None` until the record has been persisted.
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(rename = "type")]
    pub org_type: Option<OrgType>,
    pub district: Option<String>,
    pub state: Option<String>,
    pub description: String,
    pub website: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub relevance_score: Option<f64>,
    pub priority_score: Option<f64>,
}

/// Ingest request for a brand new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEntity {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub org_type: Option<OrgType>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default = "default_state")]
    pub state: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

fn default_state() -> Option<String> {
    Some("Andhra Pradesh".to_string())
}

impl NewEntity {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            org_type: None,
            district: None,
            state: default_state(),
            website: None,
            email: None,
            phone: None,
        }
    }

    /// Text submitted to the embedding service for this record.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.name, self.description)
    }
}
