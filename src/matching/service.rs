// src/matching/service.rs
use log::{debug, info, warn};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::priority::calculate_priority_score;
use super::prompts::{classification_prompt, outreach_email_prompt, relevance_prompt};
use super::similarity::{check_duplicate, rank_by_similarity};
use super::MatchingError;
use crate::ai::responses::{ClassificationResponse, OutreachEmail, RelevanceResponse};
use crate::ai::{request_structured, AiError, EmbeddingProvider, LanguageModel};
use crate::models::{Entity, EntityId, NewEntity, NgoRecord, OrgType};
use crate::utils::constants::DEFAULT_RELEVANCE_SCORE;
use crate::utils::engine_config::EngineConfig;

/// Type assumed when classification fails.
pub const FALLBACK_ORG_TYPE: OrgType = OrgType::PrivateHospital;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub org_type: OrgType,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceAssessment {
    pub score: f64,
    pub reasoning: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rescore {
    pub entity_id: EntityId,
    pub relevance_score: f64,
    pub priority_score: f64,
    pub reasoning: Vec<String>,
}

/// Duplicate detection, classification, relevance/priority scoring and
/// semantic NGO matching over the injected collaborators.
pub struct EntityMatchingService {
    llm: Arc<dyn LanguageModel>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: EngineConfig,
}

impl EntityMatchingService {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: EngineConfig,
    ) -> Self {
        Self {
            llm,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Embeds `text`, treating a failed call or a vector of the wrong
    /// dimension as "no embedding".
    async fn try_embed(&self, text: &str) -> Option<Vec<f32>> {
        match self.embedder.generate_embedding(text).await {
            Ok(v) if v.len() == self.config.embedding_dim => Some(v),
            Ok(v) => {
                warn!(
                    "Discarding embedding of dimension {} (expected {})",
                    v.len(),
                    self.config.embedding_dim
                );
                None
            }
            Err(e) => {
                warn!("Embedding unavailable: {}", e);
                None
            }
        }
    }

    pub async fn classify(&self, description: &str) -> Result<Classification, AiError> {
        let response: ClassificationResponse =
            request_structured(self.llm.as_ref(), &classification_prompt(description)).await?;
        Ok(Classification {
            org_type: response.org_type,
            confidence: response.confidence,
            reasoning: response.reasoning,
        })
    }

    /// Classification with the documented fallback type on any failure.
    pub async fn classify_or_default(&self, description: &str) -> OrgType {
        match self.classify(description).await {
            Ok(c) => c.org_type,
            Err(e) => {
                warn!(
                    "Classification failed ({}), falling back to '{}'",
                    e, FALLBACK_ORG_TYPE
                );
                FALLBACK_ORG_TYPE
            }
        }
    }

    pub async fn score_relevance(
        &self,
        description: &str,
        org_type: &str,
        district: &str,
    ) -> Result<RelevanceAssessment, AiError> {
        let response: RelevanceResponse = request_structured(
            self.llm.as_ref(),
            &relevance_prompt(description, org_type, district),
        )
        .await?;
        Ok(RelevanceAssessment {
            score: response.score,
            reasoning: response.reasoning,
        })
    }

    /// Checks a new embedding against every existing entity that has one.
    pub fn find_duplicate(
        &self,
        embedding: &[f32],
        existing: &[Entity],
    ) -> Result<(), MatchingError> {
        if embedding.len() != self.config.embedding_dim {
            return Err(MatchingError::InvalidEmbedding {
                expected: self.config.embedding_dim,
                actual: embedding.len(),
            });
        }
        let candidates: Vec<(EntityId, Option<&[f32]>)> = existing
            .iter()
            .filter_map(|e| e.id.map(|id| (id, e.embedding.as_deref())))
            .collect();
        match check_duplicate(embedding, &candidates, self.config.duplicate_threshold) {
            Some(dup) => Err(MatchingError::Duplicate {
                existing_id: dup.existing_id,
                similarity: dup.similarity,
            }),
            None => Ok(()),
        }
    }

    /// Builds a scored, not yet persisted entity from an ingest request.
    ///
    /// A detected duplicate is returned as an error so the caller can block
    /// ingestion. When no embedding can be produced the duplicate check is
    /// skipped.
    pub async fn ingest(
        &self,
        request: NewEntity,
        existing: &[Entity],
    ) -> Result<Entity, MatchingError> {
        let embedding = self.try_embed(&request.embedding_text()).await;

        match &embedding {
            Some(v) => self.find_duplicate(v, existing)?,
            None => info!(
                "No embedding for '{}'; duplicate check skipped",
                request.name
            ),
        }

        let org_type = match request.org_type {
            Some(t) => t,
            None => self.classify_or_default(&request.description).await,
        };

        let district = request.district.clone().unwrap_or_default();
        let relevance_score = match self
            .score_relevance(&request.description, org_type.as_str(), &district)
            .await
        {
            Ok(assessment) => assessment.score,
            Err(e) => {
                warn!(
                    "Relevance scoring failed for '{}' ({}), using default {}",
                    request.name, e, DEFAULT_RELEVANCE_SCORE
                );
                DEFAULT_RELEVANCE_SCORE
            }
        };
        let priority_score = calculate_priority_score(relevance_score);
        debug!(
            "Ingested '{}' as {} with relevance {:.1}, priority {:.1}",
            request.name, org_type, relevance_score, priority_score
        );

        Ok(Entity {
            id: None,
            name: request.name,
            org_type: Some(org_type),
            district: request.district,
            state: request.state,
            description: request.description,
            website: request.website,
            email: request.email,
            phone: request.phone,
            embedding,
            relevance_score: Some(relevance_score),
            priority_score: Some(priority_score),
        })
    }

    /// Re-scores a stored entity. Scoring failures propagate so an existing
    /// score is never replaced by the placeholder.
    pub async fn rescore(
        &self,
        entity_id: EntityId,
        entities: &[Entity],
    ) -> Result<Rescore, MatchingError> {
        let entity = entities
            .iter()
            .find(|e| e.id == Some(entity_id))
            .ok_or(MatchingError::NotFound(entity_id))?;

        let org_type = entity.org_type.map(|t| t.as_str()).unwrap_or("");
        let district = entity.district.as_deref().unwrap_or("");
        let assessment = self
            .score_relevance(&entity.description, org_type, district)
            .await?;

        Ok(Rescore {
            entity_id,
            relevance_score: assessment.score,
            priority_score: calculate_priority_score(assessment.score),
            reasoning: assessment.reasoning,
        })
    }

    /// Fills in NGO embeddings so program matching can rank by similarity.
    /// NGOs whose text cannot be embedded keep `None`.
    pub async fn embed_ngos(&self, ngos: &mut [NgoRecord], concurrency: usize) {
        let texts: Vec<String> = ngos.iter().map(|n| n.embedding_text()).collect();
        let embeddings: Vec<Option<Vec<f32>>> = stream::iter(texts)
            .map(|text| async move { self.try_embed(&text).await })
            .buffered(concurrency.max(1))
            .collect()
            .await;
        let embedded = embeddings.iter().filter(|e| e.is_some()).count();
        for (ngo, embedding) in ngos.iter_mut().zip(embeddings) {
            ngo.embedding = embedding;
        }
        info!("Embedded {} of {} NGOs", embedded, ngos.len());
    }

    /// Ranks NGOs against a program description by embedding similarity.
    ///
    /// Falls back to alignment score order when no NGO has an embedding or the
    /// program text cannot be embedded.
    pub async fn match_ngos<'a>(
        &self,
        program_description: &str,
        ngos: &'a [NgoRecord],
    ) -> Vec<&'a NgoRecord> {
        if ngos.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<(usize, Option<&[f32]>)> = ngos
            .iter()
            .enumerate()
            .filter(|(_, n)| n.embedding.is_some())
            .map(|(i, n)| (i, n.embedding.as_deref()))
            .collect();

        if !candidates.is_empty() {
            if let Some(query) = self.try_embed(program_description).await {
                let ranked: Vec<&NgoRecord> =
                    rank_by_similarity(&query, &candidates, self.config.semantic_top_k)
                        .into_iter()
                        .map(|(i, _)| &ngos[i])
                        .collect();
                if !ranked.is_empty() {
                    return ranked;
                }
                warn!("No NGO embedding was comparable with the program, ranking by alignment");
            }
        }

        let mut by_alignment: Vec<&NgoRecord> = ngos.iter().collect();
        by_alignment.sort_by(|a, b| {
            b.alignment_score
                .unwrap_or(0.0)
                .partial_cmp(&a.alignment_score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        by_alignment.truncate(self.config.semantic_top_k);
        by_alignment
    }

    pub async fn generate_outreach_email(
        &self,
        organization_name: &str,
        org_type: &str,
    ) -> Result<OutreachEmail, MatchingError> {
        let email =
            request_structured(self.llm.as_ref(), &outreach_email_prompt(organization_name, org_type))
                .await?;
        Ok(email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::{FakeEmbedder, FakeLanguageModel};
    use serde_json::json;

    const GUNTUR_PHC: &str = "A 24/7 government-run primary health centre in Guntur offering antenatal and delivery services";

    fn config(dim: usize) -> EngineConfig {
        EngineConfig {
            embedding_dim: dim,
            ..EngineConfig::default()
        }
    }

    fn service(llm: FakeLanguageModel, embedder: FakeEmbedder) -> EntityMatchingService {
        EntityMatchingService::new(Arc::new(llm), Arc::new(embedder), config(2))
    }

    fn stored(id: EntityId, embedding: Option<Vec<f32>>) -> Entity {
        Entity {
            id: Some(id),
            name: format!("Entity {}", id),
            org_type: Some(OrgType::Ngo),
            district: Some("Guntur".into()),
            state: Some("Andhra Pradesh".into()),
            description: "Community maternal outreach".into(),
            website: None,
            email: None,
            phone: None,
            embedding,
            relevance_score: Some(60.0),
            priority_score: Some(calculate_priority_score(60.0)),
        }
    }

    fn relevance_json(score: u32) -> serde_json::Value {
        json!({
            "score": score,
            "reasoning": ["antenatal care", "women's groups", "village outreach", "Guntur focus"]
        })
    }

    #[tokio::test]
    async fn test_ingest_with_fallbacks_yields_valid_type_and_priority() {
        let mut request = NewEntity::new("Guntur PHC", GUNTUR_PHC);
        request.district = Some("Guntur".into());
        let svc = service(FakeLanguageModel::failing(), FakeEmbedder::new());

        let entity = svc.ingest(request, &[]).await.unwrap();
        assert_eq!(entity.org_type, Some(OrgType::PrivateHospital));
        assert_eq!(entity.relevance_score, Some(70.0));
        let priority = entity.priority_score.unwrap();
        assert!((0.0..=100.0).contains(&priority));
        assert_eq!(priority, 71.5);
        assert!(entity.embedding.is_none());
    }

    #[tokio::test]
    async fn test_ingest_with_live_classification() {
        let mut request = NewEntity::new("Guntur PHC", GUNTUR_PHC);
        request.district = Some("Guntur".into());
        let llm = FakeLanguageModel::new()
            .respond_to(
                "Classify the following organization",
                json!({"type": "PHC", "confidence": 93, "reasoning": "Government primary centre."}),
            )
            .respond_to("Score this organization's relevance", relevance_json(80));
        let embedder = FakeEmbedder::new().with(&request.embedding_text(), vec![0.6, 0.8]);
        let svc = service(llm, embedder);

        let entity = svc.ingest(request, &[]).await.unwrap();
        assert_eq!(entity.org_type, Some(OrgType::Phc));
        assert_eq!(entity.relevance_score, Some(80.0));
        assert_eq!(entity.priority_score, Some(76.5));
        assert_eq!(entity.embedding, Some(vec![0.6, 0.8]));
    }

    #[tokio::test]
    async fn test_ingest_reports_duplicate() {
        let request = NewEntity::new("Sakhi Trust", "Maternal outreach");
        let embedder = FakeEmbedder::new().with(&request.embedding_text(), vec![1.0, 0.0]);
        let svc = service(FakeLanguageModel::failing(), embedder);
        let existing = vec![stored(1, None), stored(2, Some(vec![0.99, 0.05]))];

        match svc.ingest(request, &existing).await {
            Err(MatchingError::Duplicate { existing_id, .. }) => assert_eq!(existing_id, 2),
            other => panic!("expected duplicate, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_wrong_dimension_embedding_skips_duplicate_check() {
        let request = NewEntity::new("Sakhi Trust", "Maternal outreach");
        let embedder = FakeEmbedder::new().with(&request.embedding_text(), vec![1.0, 0.0, 0.0]);
        let svc = service(FakeLanguageModel::failing(), embedder);
        let existing = vec![stored(2, Some(vec![1.0, 0.0]))];

        let entity = svc.ingest(request, &existing).await.unwrap();
        assert!(entity.embedding.is_none());
    }

    #[test]
    fn test_find_duplicate_rejects_wrong_dimension() {
        let svc = service(FakeLanguageModel::failing(), FakeEmbedder::new());
        let err = svc.find_duplicate(&[1.0, 0.0, 0.0], &[]).unwrap_err();
        assert!(matches!(
            err,
            MatchingError::InvalidEmbedding {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_rescore_unknown_entity_is_not_found() {
        let svc = service(FakeLanguageModel::failing(), FakeEmbedder::new());
        let err = svc.rescore(42, &[stored(1, None)]).await.unwrap_err();
        assert!(matches!(err, MatchingError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_rescore_failure_is_distinct_from_not_found() {
        let svc = service(FakeLanguageModel::failing(), FakeEmbedder::new());
        let err = svc.rescore(1, &[stored(1, None)]).await.unwrap_err();
        assert!(matches!(err, MatchingError::Ai(_)));
    }

    #[tokio::test]
    async fn test_rescore_recomputes_priority() {
        let llm = FakeLanguageModel::new().respond_to("Score this organization", relevance_json(90));
        let svc = service(llm, FakeEmbedder::new());
        let rescore = svc.rescore(1, &[stored(1, None)]).await.unwrap();
        assert_eq!(rescore.relevance_score, 90.0);
        assert_eq!(rescore.priority_score, 81.5);
        assert_eq!(rescore.reasoning.len(), 4);
    }

    fn ngo(name: &str, alignment: f64, embedding: Option<Vec<f32>>) -> NgoRecord {
        NgoRecord {
            name: name.into(),
            district: "Guntur".into(),
            state: "Andhra Pradesh".into(),
            lat: 16.3,
            lon: 80.4,
            focus_areas: "maternal health".into(),
            description: String::new(),
            capability_score: None,
            alignment_score: Some(alignment),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_match_ngos_by_similarity() {
        let ngos = vec![
            ngo("Far", 90.0, Some(vec![0.0, 1.0])),
            ngo("NoVector", 99.0, None),
            ngo("Near", 10.0, Some(vec![1.0, 0.1])),
        ];
        let embedder = FakeEmbedder::new().with("newborn care", vec![1.0, 0.0]);
        let svc = service(FakeLanguageModel::failing(), embedder);

        let ranked = svc.match_ngos("newborn care", &ngos).await;
        let names: Vec<&str> = ranked.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
    }

    #[tokio::test]
    async fn test_match_ngos_falls_back_to_alignment() {
        let ngos = vec![
            ngo("Low", 10.0, Some(vec![1.0, 0.0])),
            ngo("High", 95.0, None),
        ];
        let svc = service(FakeLanguageModel::failing(), FakeEmbedder::new());
        let ranked = svc.match_ngos("unembeddable", &ngos).await;
        assert_eq!(ranked[0].name, "High");
        assert!(svc.match_ngos("x", &[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_embed_ngos_skips_failed_and_wrong_dimension() {
        let mut ngos = vec![
            ngo("Good", 10.0, None),
            ngo("Wide", 20.0, None),
            ngo("Missing", 30.0, None),
        ];
        for n in ngos.iter_mut() {
            n.description = format!("{} outreach", n.name);
        }
        let good_text = ngos[0].embedding_text();
        let wide_text = ngos[1].embedding_text();
        let embedder = FakeEmbedder::new()
            .with(&good_text, vec![1.0, 0.0])
            .with(&wide_text, vec![1.0, 0.0, 0.0]);
        let svc = service(FakeLanguageModel::failing(), embedder);

        svc.embed_ngos(&mut ngos, 2).await;
        assert_eq!(ngos[0].embedding, Some(vec![1.0, 0.0]));
        assert_eq!(ngos[1].embedding, None);
        assert_eq!(ngos[2].embedding, None);
    }

    #[tokio::test]
    async fn test_match_ngos_wrong_dimension_query_falls_back() {
        let ngos = vec![
            ngo("Low", 10.0, Some(vec![1.0, 0.0])),
            ngo("High", 95.0, Some(vec![0.0, 1.0])),
        ];
        let embedder = FakeEmbedder::new().with("newborn care", vec![1.0, 0.0, 0.0]);
        let svc = service(FakeLanguageModel::failing(), embedder);

        let ranked = svc.match_ngos("newborn care", &ngos).await;
        let names: Vec<&str> = ranked.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["High", "Low"]);
    }

    #[tokio::test]
    async fn test_match_ngos_incomparable_candidates_fall_back() {
        // Zero-magnitude and wrong-length stored vectors rank nothing.
        let ngos = vec![
            ngo("Zero", 20.0, Some(vec![0.0, 0.0])),
            ngo("Short", 80.0, Some(vec![1.0])),
        ];
        let embedder = FakeEmbedder::new().with("newborn care", vec![1.0, 0.0]);
        let svc = service(FakeLanguageModel::failing(), embedder);

        let ranked = svc.match_ngos("newborn care", &ngos).await;
        assert_eq!(ranked[0].name, "Short");
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_outreach_email_failure_propagates() {
        let svc = service(FakeLanguageModel::failing(), FakeEmbedder::new());
        let err = svc
            .generate_outreach_email("Rainbow Hospitals", "Private Hospital")
            .await
            .unwrap_err();
        assert!(matches!(err, MatchingError::Ai(_)));
    }

    #[tokio::test]
    async fn test_outreach_email_uses_type_context() {
        let llm = FakeLanguageModel::new().respond_to(
            "a private hospital specializing in women and children's health",
            json!({"subject": "Partnership", "body": "Dear team, ..."}),
        );
        let svc = service(llm, FakeEmbedder::new());
        let email = svc
            .generate_outreach_email("Rainbow Hospitals", "Private Hospital")
            .await
            .unwrap();
        assert_eq!(email.subject, "Partnership");
    }
}
