// src/main.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use outreach_lib::ai::{CachedEmbeddingProvider, OllamaClient};
use outreach_lib::beneficiary::{BeneficiaryMatcher, MatchContext};
use outreach_lib::dataset::{read_entities, ScoredDataset, ENTITIES_FILE};
use outreach_lib::graph::{subgraph_for_district, to_flow_graph};
use outreach_lib::insights::{
    dashboard_stats, district_heatmap, funder_listing, ngo_listing, priority_ranking, FunderFilter,
};
use outreach_lib::matching::{EntityMatchingService, MatchingError};
use outreach_lib::models::{BeneficiaryProfile, IncomeBracket, NewEntity, OrgType};
use outreach_lib::utils::engine_config::EngineConfig;
use outreach_lib::utils::env::load_env;

const EMBEDDING_CONCURRENCY: usize = 4;

#[derive(Parser)]
#[command(author, version, about = "Maternal health outreach matching engine", long_about = None)]
struct Cli {
    /// Directory holding the scored CSV tables
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the flow-chart projection of one district's referral view
    Graph {
        #[arg(long)]
        district: String,
    },
    /// Print the unified NGO + facility priority ranking
    Rank,
    /// Match a beneficiary to a facility and support program
    MatchBeneficiary {
        #[arg(long)]
        pincode: String,
        /// Income bracket, e.g. "Below 1 Lakh" or "2-3 Lakhs"
        #[arg(long)]
        income: IncomeBracket,
        /// Expected due date (YYYY-MM-DD)
        #[arg(long)]
        due_date: NaiveDate,
        #[arg(long)]
        name: Option<String>,
    },
    /// Score a new organization, checking it against the stored entities
    Ingest {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        district: Option<String>,
        #[arg(long = "type")]
        org_type: Option<OrgType>,
    },
    /// Rank NGOs against a program description
    MatchNgos {
        #[arg(long)]
        program: String,
    },
    /// Draft a partnership email
    Email {
        #[arg(long)]
        name: String,
        #[arg(long = "type")]
        org_type: String,
    },
    /// Dashboard counts and district heatmap for the stored entities
    Stats,
    /// List NGOs by alignment, optionally filtered by name or description
    Ngos {
        #[arg(long)]
        query: Option<String>,
    },
    /// List funders by relevance, optionally filtered by type and geography
    Funders {
        #[arg(long = "type")]
        funder_type: Option<String>,
        #[arg(long)]
        geography: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_entities_or_empty(data_dir: &Path) -> Result<Vec<outreach_lib::models::Entity>> {
    let path = data_dir.join(ENTITIES_FILE);
    if path.exists() {
        read_entities(&path)
    } else {
        warn!("{} not found, treating entity store as empty", path.display());
        Ok(Vec::new())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let start = Instant::now();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();
    config.log_config();

    match cli.command {
        Command::Graph { district } => {
            let dataset = ScoredDataset::load(&cli.data_dir)?;
            let graph = dataset.build_graph(config.care_chain_max_km);
            let view = subgraph_for_district(
                &graph,
                &district,
                config.subgraph_max_ngos,
                config.subgraph_max_facilities,
            );
            info!(
                "District '{}': {} nodes, {} edges",
                district,
                view.node_count(),
                view.edge_count()
            );
            print_json(&to_flow_graph(&view))?;
        }
        Command::Rank => {
            let dataset = ScoredDataset::load(&cli.data_dir)?;
            print_json(&priority_ranking(&dataset.ngos, &dataset.facilities))?;
        }
        Command::MatchBeneficiary {
            pincode,
            income,
            due_date,
            name,
        } => {
            let dataset = ScoredDataset::load(&cli.data_dir)?;
            let client = OllamaClient::from_config(&config)
                .context("Failed to construct language model client")?
                .with_temperature(0.3);
            let matcher = BeneficiaryMatcher::new(Arc::new(client));
            let profile = BeneficiaryProfile {
                name,
                pincode,
                income,
                due_date,
            };
            let ctx = MatchContext {
                facilities: &dataset.facilities,
                ngos: &dataset.ngos,
                districts: &dataset.districts,
            };
            print_json(&matcher.match_beneficiary(&profile, ctx).await)?;
        }
        Command::Ingest {
            name,
            description,
            district,
            org_type,
        } => {
            let existing = load_entities_or_empty(&cli.data_dir)?;
            let client = OllamaClient::from_config(&config)
                .context("Failed to construct language model client")?;
            let embedder = CachedEmbeddingProvider::new(client.clone(), config.embedding_cache_size);
            let service = EntityMatchingService::new(Arc::new(client), Arc::new(embedder), config);

            let mut request = NewEntity::new(name, description);
            request.district = district;
            request.org_type = org_type;
            match service.ingest(request, &existing).await {
                Ok(entity) => print_json(&entity)?,
                Err(MatchingError::Duplicate {
                    existing_id,
                    similarity,
                }) => {
                    warn!(
                        "Duplicate of entity {} (similarity {:.3}), not ingesting",
                        existing_id, similarity
                    );
                    print_json(&serde_json::json!({
                        "duplicate_of": existing_id,
                        "similarity": similarity,
                    }))?;
                }
                Err(e) => return Err(e).context("Ingest failed"),
            }
        }
        Command::MatchNgos { program } => {
            let mut dataset = ScoredDataset::load(&cli.data_dir)?;
            let client = OllamaClient::from_config(&config)
                .context("Failed to construct language model client")?;
            let embedder = Arc::new(CachedEmbeddingProvider::new(
                client.clone(),
                config.embedding_cache_size,
            ));
            let service = EntityMatchingService::new(Arc::new(client), embedder.clone(), config);
            service
                .embed_ngos(&mut dataset.ngos, EMBEDDING_CONCURRENCY)
                .await;
            let (hits, misses) = embedder.stats();
            info!("Embedding cache: {} hits, {} misses", hits, misses);

            let ranked = service.match_ngos(&program, &dataset.ngos).await;
            print_json(&ranked)?;
        }
        Command::Email { name, org_type } => {
            let client = OllamaClient::from_config(&config)
                .context("Failed to construct language model client")?
                .with_temperature(0.7);
            let service = EntityMatchingService::new(
                Arc::new(client.clone()),
                Arc::new(client),
                config,
            );
            let email = service
                .generate_outreach_email(&name, &org_type)
                .await
                .context("Email generation failed")?;
            print_json(&email)?;
        }
        Command::Stats => {
            let dataset = ScoredDataset::load(&cli.data_dir)?;
            let entities = load_entities_or_empty(&cli.data_dir)?;
            print_json(&serde_json::json!({
                "stats": dashboard_stats(&entities, dataset.ngos.len(), dataset.funders.len()),
                "heatmap": district_heatmap(&entities),
            }))?;
        }
        Command::Ngos { query } => {
            let dataset = ScoredDataset::load(&cli.data_dir)?;
            print_json(&ngo_listing(&dataset.ngos, query.as_deref()))?;
        }
        Command::Funders {
            funder_type,
            geography,
        } => {
            let dataset = ScoredDataset::load(&cli.data_dir)?;
            let filter = FunderFilter {
                funder_type,
                geography,
            };
            print_json(&funder_listing(&dataset.funders, &filter))?;
        }
    }

    info!("Done in {:.2?}", start.elapsed());
    Ok(())
}
