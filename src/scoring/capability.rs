// src/scoring/capability.rs
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::ScoringError;
use crate::utils::round_to;

/// Hyperparameters for offline training. The seed fixes the sample order so
/// retraining on an unchanged corpus reproduces the same weights.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2_penalty: f64,
    pub seed: u64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            epochs: 50,
            learning_rate: 0.05,
            l2_penalty: 1e-4,
            seed: 42,
        }
    }
}

/// Binary logistic regression over embedding vectors, trained with
/// stochastic gradient descent and persisted as JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CapabilityModel {
    pub model_id: String,
    pub trained_at: DateTime<Utc>,
    pub dimension: usize,
    // One weight per embedding component followed by the bias term.
    weights: Vec<f64>,
    pub training_examples: usize,
    pub positive_examples: usize,
}

fn sigmoid(logit: f64) -> f64 {
    1.0 / (1.0 + (-logit).exp())
}

impl CapabilityModel {
    pub fn train(
        samples: &[(Vec<f32>, bool)],
        options: &TrainingOptions,
    ) -> Result<Self, ScoringError> {
        let Some((first, _)) = samples.first() else {
            return Err(ScoringError::EmptyCorpus);
        };
        let dimension = first.len();
        if dimension == 0 {
            return Err(ScoringError::EmptyCorpus);
        }
        if let Some((bad, _)) = samples.iter().find(|(v, _)| v.len() != dimension) {
            return Err(ScoringError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let positive_examples = samples.iter().filter(|(_, label)| *label).count();
        info!(
            "⚙️ Training capability model on {} samples ({} positive, dim {})",
            samples.len(),
            positive_examples,
            dimension
        );
        if positive_examples == 0 || positive_examples == samples.len() {
            warn!("Bootstrap labels are all one class; scores will be uninformative");
        }

        let mut model = Self {
            model_id: format!("capability_lr_{}", Uuid::new_v4()),
            trained_at: Utc::now(),
            dimension,
            weights: vec![0.0; dimension + 1],
            training_examples: samples.len(),
            positive_examples,
        };

        let mut rng = StdRng::seed_from_u64(options.seed);
        let mut order: Vec<usize> = (0..samples.len()).collect();
        for epoch in 0..options.epochs {
            order.shuffle(&mut rng);
            let mut loss = 0.0;
            for &i in &order {
                let (features, label) = &samples[i];
                let target = if *label { 1.0 } else { 0.0 };
                let prediction = model.logit(features).map(sigmoid)?;
                loss -= target * prediction.max(1e-12).ln()
                    + (1.0 - target) * (1.0 - prediction).max(1e-12).ln();
                model.step(features, target - prediction, options);
            }
            if (epoch + 1) % 10 == 0 {
                debug!(
                    "Epoch {}/{}: mean log loss {:.4}",
                    epoch + 1,
                    options.epochs,
                    loss / samples.len() as f64
                );
            }
        }

        info!("✅ Trained capability model {}", model.model_id);
        Ok(model)
    }

    fn step(&mut self, features: &[f32], error: f64, options: &TrainingOptions) {
        let bias_index = self.weights.len() - 1;
        for (w, x) in self.weights[..bias_index].iter_mut().zip(features) {
            *w += options.learning_rate * (error * f64::from(*x) - options.l2_penalty * *w);
        }
        self.weights[bias_index] += options.learning_rate * error;
    }

    fn logit(&self, features: &[f32]) -> Result<f64, ScoringError> {
        if features.len() != self.dimension {
            return Err(ScoringError::DimensionMismatch {
                expected: self.dimension,
                actual: features.len(),
            });
        }
        let bias = self.weights[self.dimension];
        Ok(self
            .weights
            .iter()
            .zip(features)
            .map(|(w, x)| w * f64::from(*x))
            .sum::<f64>()
            + bias)
    }

    /// Probability of the positive (capable) class.
    pub fn predict_proba(&self, embedding: &[f32]) -> Result<f64, ScoringError> {
        self.logit(embedding).map(sigmoid)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScoringError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Saved capability model {} to {}", self.model_id, path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ScoringError> {
        let model: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        if model.weights.len() != model.dimension + 1 {
            return Err(ScoringError::DimensionMismatch {
                expected: model.dimension + 1,
                actual: model.weights.len(),
            });
        }
        info!(
            "Loaded capability model {} (trained {}, dim {})",
            model.model_id, model.trained_at, model.dimension
        );
        Ok(model)
    }
}

/// Read-only serving wrapper: constructed once, then shared by reference.
#[derive(Debug, Clone)]
pub struct CapabilityScorer {
    model: CapabilityModel,
    default_score: f64,
}

impl CapabilityScorer {
    pub fn new(model: CapabilityModel, default_score: f64) -> Self {
        Self {
            model,
            default_score,
        }
    }

    pub fn load(path: &Path, default_score: f64) -> Result<Self, ScoringError> {
        Ok(Self::new(CapabilityModel::load(path)?, default_score))
    }

    pub fn model(&self) -> &CapabilityModel {
        &self.model
    }

    /// Positive-class probability as a 0-100 score, rounded to 2 decimals.
    pub fn score(&self, embedding: &[f32]) -> Result<f64, ScoringError> {
        let probability = self.model.predict_proba(embedding)?;
        Ok(round_to(probability * 100.0, 2).clamp(0.0, 100.0))
    }

    /// Scores when a usable embedding exists, otherwise the configured default.
    pub fn score_or_default(&self, embedding: Option<&[f32]>) -> f64 {
        match embedding.map(|e| self.score(e)) {
            Some(Ok(score)) => score,
            Some(Err(e)) => {
                warn!("Capability scoring skipped ({}), using default", e);
                self.default_score
            }
            None => self.default_score,
        }
    }
}
