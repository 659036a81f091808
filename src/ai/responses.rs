// src/ai/responses.rs
//
// Typed, validated shapes for every structured completion call site.
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::{AiError, LanguageModel};
use crate::models::{EligibilityStatus, OrgType};

/// A response type with a JSON schema and semantic checks beyond deserialization.
pub trait StructuredResponse: DeserializeOwned {
    fn schema() -> JsonValue;

    fn validate(&self) -> Result<(), AiError> {
        Ok(())
    }

    /// Deserializes and validates a raw JSON object, rejecting anything
    /// missing a required field.
    fn from_json(value: JsonValue) -> Result<Self, AiError> {
        if let Some(required) = Self::schema().get("required").and_then(|r| r.as_array()) {
            for field in required.iter().filter_map(|f| f.as_str()) {
                if value.get(field).map_or(true, |v| v.is_null()) {
                    return Err(AiError::MissingField(field.to_string()));
                }
            }
        }
        let parsed: Self =
            serde_json::from_value(value).map_err(|e| AiError::Malformed(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }
}

/// Sends `prompt` with `T`'s schema and returns the validated response.
pub async fn request_structured<T: StructuredResponse>(
    llm: &dyn LanguageModel,
    prompt: &str,
) -> Result<T, AiError> {
    let raw = llm
        .generate_structured_completion(prompt, &T::schema())
        .await?;
    debug!("Structured completion returned: {}", raw);
    T::from_json(raw)
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), AiError> {
    if !value.is_finite() || value < min || value > max {
        return Err(AiError::InvalidValue(format!(
            "{} = {} is outside [{}, {}]",
            field, value, min, max
        )));
    }
    Ok(())
}

fn check_len(field: &str, items: &[String], expected: usize) -> Result<(), AiError> {
    if items.len() != expected {
        return Err(AiError::InvalidValue(format!(
            "{} has {} entries, expected {}",
            field,
            items.len(),
            expected
        )));
    }
    if items.iter().any(|s| s.trim().is_empty()) {
        return Err(AiError::InvalidValue(format!("{} contains a blank entry", field)));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResponse {
    #[serde(rename = "type")]
    pub org_type: OrgType,
    pub confidence: f64,
    pub reasoning: String,
}

impl StructuredResponse for ClassificationResponse {
    fn schema() -> JsonValue {
        let labels: Vec<&str> = OrgType::ALL.iter().map(|t| t.as_str()).collect();
        json!({
            "type": "object",
            "properties": {
                "type": {"type": "string", "enum": labels},
                "confidence": {"type": "number", "minimum": 0, "maximum": 100},
                "reasoning": {"type": "string", "description": "2-3 sentence explanation"}
            },
            "required": ["type", "confidence", "reasoning"]
        })
    }

    fn validate(&self) -> Result<(), AiError> {
        check_range("confidence", self.confidence, 0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceResponse {
    pub score: f64,
    pub reasoning: Vec<String>,
}

pub const RELEVANCE_REASON_COUNT: usize = 4;

impl StructuredResponse for RelevanceResponse {
    fn schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "score": {"type": "number", "minimum": 0, "maximum": 100},
                "reasoning": {
                    "type": "array",
                    "items": {"type": "string"},
                    "minItems": RELEVANCE_REASON_COUNT,
                    "maxItems": RELEVANCE_REASON_COUNT
                }
            },
            "required": ["score", "reasoning"]
        })
    }

    fn validate(&self) -> Result<(), AiError> {
        check_range("score", self.score, 0.0, 100.0)?;
        check_len("reasoning", &self.reasoning, RELEVANCE_REASON_COUNT)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachEmail {
    pub subject: String,
    pub body: String,
}

impl StructuredResponse for OutreachEmail {
    fn schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "subject": {"type": "string"},
                "body": {"type": "string"}
            },
            "required": ["subject", "body"]
        })
    }

    fn validate(&self) -> Result<(), AiError> {
        if self.subject.trim().is_empty() || self.body.trim().is_empty() {
            return Err(AiError::InvalidValue("email subject and body must not be blank".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeneficiaryMatchResponse {
    pub facility_name: String,
    pub program_name: String,
    pub match_score: f64,
    pub eligibility_status: EligibilityStatus,
    pub reasoning: Vec<String>,
    pub estimated_distance_km: f64,
    pub safety_rating: f64,
    pub bed_count: f64,
    pub specialized_services: Vec<String>,
    pub district_impact: String,
}

pub const MATCH_REASON_COUNT: usize = 3;
const MAX_BED_COUNT: f64 = 100_000.0;

impl BeneficiaryMatchResponse {
    /// Models sometimes answer `1200.0` for an integer field.
    pub fn beds(&self) -> u32 {
        self.bed_count.round() as u32
    }
}

impl StructuredResponse for BeneficiaryMatchResponse {
    fn schema() -> JsonValue {
        json!({
            "type": "object",
            "properties": {
                "facility_name": {"type": "string"},
                "program_name": {"type": "string"},
                "match_score": {"type": "integer", "minimum": 0, "maximum": 100},
                "eligibility_status": {
                    "type": "string",
                    "enum": ["Qualified", "Partially Qualified", "Not Eligible"]
                },
                "reasoning": {
                    "type": "array",
                    "items": {"type": "string"},
                    "minItems": MATCH_REASON_COUNT,
                    "maxItems": MATCH_REASON_COUNT
                },
                "estimated_distance_km": {"type": "number"},
                "safety_rating": {"type": "number", "minimum": 0, "maximum": 5},
                "bed_count": {"type": "integer", "minimum": 0},
                "specialized_services": {"type": "array", "items": {"type": "string"}},
                "district_impact": {"type": "string"}
            },
            "required": [
                "facility_name", "program_name", "match_score", "eligibility_status",
                "reasoning", "estimated_distance_km", "safety_rating", "bed_count",
                "specialized_services", "district_impact"
            ]
        })
    }

    fn validate(&self) -> Result<(), AiError> {
        check_range("match_score", self.match_score, 0.0, 100.0)?;
        check_range("safety_rating", self.safety_rating, 0.0, 5.0)?;
        check_range("estimated_distance_km", self.estimated_distance_km, 0.0, 1000.0)?;
        check_range("bed_count", self.bed_count, 0.0, MAX_BED_COUNT)?;
        check_len("reasoning", &self.reasoning, MATCH_REASON_COUNT)?;
        if self.facility_name.trim().is_empty() {
            return Err(AiError::InvalidValue("facility_name is blank".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_accepts_known_label() {
        let parsed = ClassificationResponse::from_json(json!({
            "type": "PHC",
            "confidence": 88,
            "reasoning": "Government run primary centre."
        }))
        .unwrap();
        assert_eq!(parsed.org_type, OrgType::Phc);
    }

    #[test]
    fn test_classification_rejects_unknown_label() {
        let err = ClassificationResponse::from_json(json!({
            "type": "Clinic",
            "confidence": 88,
            "reasoning": "x"
        }))
        .unwrap_err();
        assert!(matches!(err, AiError::Malformed(_)));
    }

    #[test]
    fn test_missing_field_is_reported_by_name() {
        let err = RelevanceResponse::from_json(json!({"score": 80})).unwrap_err();
        match err {
            AiError::MissingField(field) => assert_eq!(field, "reasoning"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_relevance_requires_four_reasons() {
        let err = RelevanceResponse::from_json(json!({
            "score": 80,
            "reasoning": ["a", "b", "c"]
        }))
        .unwrap_err();
        assert!(matches!(err, AiError::InvalidValue(_)));
    }

    #[test]
    fn test_relevance_score_out_of_range() {
        let err = RelevanceResponse::from_json(json!({
            "score": 140,
            "reasoning": ["a", "b", "c", "d"]
        }))
        .unwrap_err();
        assert!(matches!(err, AiError::InvalidValue(_)));
    }

    #[test]
    fn test_email_rejects_blank_body() {
        let err = OutreachEmail::from_json(json!({"subject": "Hello", "body": "  "})).unwrap_err();
        assert!(matches!(err, AiError::InvalidValue(_)));
    }

    fn match_response(bed_count: JsonValue) -> JsonValue {
        json!({
            "facility_name": "GGH Guntur",
            "program_name": "Janani Suraksha Yojana",
            "match_score": 88,
            "eligibility_status": "Qualified",
            "reasoning": ["a", "b", "c"],
            "estimated_distance_km": 3.0,
            "safety_rating": 4.5,
            "bed_count": bed_count,
            "specialized_services": ["NICU"],
            "district_impact": "Guntur"
        })
    }

    #[test]
    fn test_match_accepts_fractional_bed_count() {
        let parsed = BeneficiaryMatchResponse::from_json(match_response(json!(1200.0))).unwrap();
        assert_eq!(parsed.beds(), 1200);
        let parsed = BeneficiaryMatchResponse::from_json(match_response(json!(350))).unwrap();
        assert_eq!(parsed.beds(), 350);
    }

    #[test]
    fn test_match_rejects_negative_bed_count() {
        let err = BeneficiaryMatchResponse::from_json(match_response(json!(-5))).unwrap_err();
        assert!(matches!(err, AiError::InvalidValue(_)));
    }
}
