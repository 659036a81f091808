// src/bin/train_capability_model.rs
//
// Offline batch: embeds the raw NGO and facility tables, bootstraps labels
// from capability keywords, fits the capability classifier and writes the
// scored tables the engine loads at startup.
use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;

use outreach_lib::ai::{EmbeddingProvider, OllamaClient};
use outreach_lib::dataset::{
    read_records, write_records, FACILITIES_RAW_FILE, FACILITIES_SCORED_FILE, NGOS_RAW_FILE,
    NGOS_SCORED_FILE,
};
use outreach_lib::models::{FacilityRecord, NgoRecord};
use outreach_lib::scoring::{bootstrap_label, CapabilityModel, CapabilityScorer, TrainingOptions};
use outreach_lib::utils::engine_config::EngineConfig;
use outreach_lib::utils::env::load_env;

#[derive(Parser)]
#[command(author, version, about = "Train the capability classifier and score the raw tables", long_about = None)]
struct TrainArgs {
    /// Directory holding ngos.csv and facilities.csv; scored tables are written here
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Where to persist the model (defaults to CAPABILITY_MODEL_PATH)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Concurrent embedding requests
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    #[arg(long, default_value_t = 50)]
    epochs: usize,
}

/// Embeds every text, keeping `None` for failures or wrong dimensions.
async fn embed_all(
    embedder: &dyn EmbeddingProvider,
    texts: Vec<String>,
    dim: usize,
    concurrency: usize,
    label: &str,
) -> Result<Vec<Option<Vec<f32>>>> {
    let pb = ProgressBar::new(texts.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg} ({eta})")
            .context("Invalid progress bar template")?,
    );
    pb.set_message(label.to_string());

    let embeddings = stream::iter(texts)
        .map(|text| {
            let pb = pb.clone();
            async move {
                let result = match embedder.generate_embedding(&text).await {
                    Ok(v) if v.len() == dim => Some(v),
                    Ok(v) => {
                        warn!("Embedding dimension {} != {}, skipping", v.len(), dim);
                        None
                    }
                    Err(e) => {
                        warn!("Embedding failed: {}", e);
                        None
                    }
                };
                pb.inc(1);
                result
            }
        })
        .buffered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

    pb.finish_with_message(format!("{} embedded", label));
    Ok(embeddings)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    load_env();
    let start = Instant::now();
    let args = TrainArgs::parse();
    let config = EngineConfig::from_env();
    config.log_config();

    let mut ngos: Vec<NgoRecord> = read_records(&args.data_dir.join(NGOS_RAW_FILE))?;
    let mut facilities: Vec<FacilityRecord> =
        read_records(&args.data_dir.join(FACILITIES_RAW_FILE))?;
    info!(
        "📊 Loaded {} NGOs and {} facilities",
        ngos.len(),
        facilities.len()
    );

    let client = OllamaClient::from_config(&config)
        .context("Failed to construct embedding client")?;
    let ngo_texts = ngos.iter().map(|n| n.embedding_text()).collect();
    let ngo_embeddings = embed_all(
        &client,
        ngo_texts,
        config.embedding_dim,
        args.concurrency,
        "NGOs",
    )
    .await?;
    let fac_texts = facilities.iter().map(|f| f.embedding_text()).collect();
    let fac_embeddings = embed_all(
        &client,
        fac_texts,
        config.embedding_dim,
        args.concurrency,
        "facilities",
    )
    .await?;

    // NGOs are labelled on their description, facilities on their services.
    let mut samples: Vec<(Vec<f32>, bool)> = Vec::new();
    for (ngo, embedding) in ngos.iter().zip(&ngo_embeddings) {
        if let Some(v) = embedding {
            samples.push((v.clone(), bootstrap_label(&ngo.description)));
        }
    }
    for (fac, embedding) in facilities.iter().zip(&fac_embeddings) {
        if let Some(v) = embedding {
            samples.push((v.clone(), bootstrap_label(&fac.services_text)));
        }
    }
    if samples.is_empty() {
        bail!("No embeddings could be generated; is the embedding service running?");
    }

    let options = TrainingOptions {
        epochs: args.epochs,
        ..TrainingOptions::default()
    };
    let model = CapabilityModel::train(&samples, &options).context("Training failed")?;
    let model_path = args
        .output
        .unwrap_or_else(|| config.capability_model_path.clone());
    model
        .save(&model_path)
        .with_context(|| format!("Failed to save model to {}", model_path.display()))?;

    let scorer = CapabilityScorer::new(model, config.default_capability_score);
    for (ngo, embedding) in ngos.iter_mut().zip(&ngo_embeddings) {
        ngo.capability_score = Some(scorer.score_or_default(embedding.as_deref()));
    }
    for (fac, embedding) in facilities.iter_mut().zip(&fac_embeddings) {
        fac.capability_score = Some(scorer.score_or_default(embedding.as_deref()));
    }

    write_records(&args.data_dir.join(NGOS_SCORED_FILE), &ngos)?;
    write_records(&args.data_dir.join(FACILITIES_SCORED_FILE), &facilities)?;

    info!(
        "✅ Scored {} NGOs and {} facilities with model {} in {:.2?}",
        ngos.len(),
        facilities.len(),
        scorer.model().model_id,
        start.elapsed()
    );
    Ok(())
}
