// src/dataset/mod.rs
//
// Scored tables read once at startup into immutable vectors.
use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::graph::{build_graph, ReferralGraph};
use crate::models::{DistrictStats, Entity, FacilityRecord, FunderRecord, NgoRecord};

pub const NGOS_RAW_FILE: &str = "ngos.csv";
pub const FACILITIES_RAW_FILE: &str = "facilities.csv";
pub const NGOS_SCORED_FILE: &str = "ngos_scored.csv";
pub const FACILITIES_SCORED_FILE: &str = "facilities_scored.csv";
pub const FUNDERS_FILE: &str = "funders.csv";
pub const DISTRICTS_FILE: &str = "districts.csv";
pub const ENTITIES_FILE: &str = "entities.json";

pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut records = Vec::new();
    for (row, result) in rdr.deserialize().enumerate() {
        let record: T =
            result.with_context(|| format!("Bad row {} in {}", row + 1, path.display()))?;
        records.push(record);
    }
    Ok(records)
}

pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut wtr = WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

/// Persisted entity corpus as a JSON array.
pub fn read_entities(path: &Path) -> Result<Vec<Entity>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid entity JSON in {}", path.display()))
}

#[derive(Debug, Clone, Default)]
pub struct ScoredDataset {
    pub ngos: Vec<NgoRecord>,
    pub facilities: Vec<FacilityRecord>,
    pub funders: Vec<FunderRecord>,
    pub districts: Vec<DistrictStats>,
}

impl ScoredDataset {
    pub fn load(dir: &Path) -> Result<Self> {
        let path = |name: &str| -> PathBuf { dir.join(name) };
        let dataset = Self {
            ngos: read_records(&path(NGOS_SCORED_FILE))?,
            facilities: read_records(&path(FACILITIES_SCORED_FILE))?,
            funders: read_records(&path(FUNDERS_FILE))?,
            districts: read_records(&path(DISTRICTS_FILE))?,
        };
        info!(
            "Loaded dataset from {}: {} NGOs, {} facilities, {} funders, {} districts",
            dir.display(),
            dataset.ngos.len(),
            dataset.facilities.len(),
            dataset.funders.len(),
            dataset.districts.len()
        );
        Ok(dataset)
    }

    pub fn build_graph(&self, max_km: f64) -> ReferralGraph {
        build_graph(&self.ngos, &self.facilities, &self.funders, max_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn seed(dir: &Path) {
        write(
            dir,
            NGOS_SCORED_FILE,
            "name,district,state,lat,lon,focus_areas,description,capability_score,alignment_score\n\
             Sakhi Trust,Guntur,Andhra Pradesh,16.30,80.43,maternal health,Nutrition kits,81.25,\n\
             Green Earth,Guntur,Andhra Pradesh,16.31,80.44,environment,Tree planting,,40\n",
        );
        write(
            dir,
            FACILITIES_SCORED_FILE,
            "name,district,state,lat,lon,type,services_text,capability_score,bed_count\n\
             GGH Guntur,Guntur,Andhra Pradesh,16.29,80.45,Government Hospital,\"NICU, Blood Bank\",92.3,1200\n",
        );
        write(
            dir,
            FUNDERS_FILE,
            "name,focus_areas,regions,type,grant_size,description\n\
             Gates Foundation,\"maternal health, government\",India,Foundation,Large,Global health\n",
        );
        write(
            dir,
            DISTRICTS_FILE,
            "district,state,annual_beneficiaries,pincode_prefixes,population,institutional_delivery_pct,maternal_mortality_ratio\n\
             Guntur,Andhra Pradesh,52000,522;5230,4887813,91.5,\n",
        );
    }

    #[test]
    fn test_load_scored_dataset() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let data = ScoredDataset::load(dir.path()).unwrap();

        assert_eq!(data.ngos.len(), 2);
        assert_eq!(data.ngos[0].capability_score, Some(81.25));
        assert_eq!(data.ngos[0].alignment_score, None);
        assert_eq!(data.ngos[1].capability_score, None);
        assert_eq!(data.facilities[0].services(), vec!["NICU", "Blood Bank"]);
        assert_eq!(data.facilities[0].bed_count, Some(1200));
        assert_eq!(data.funders[0].focus_keywords().len(), 2);
        assert!(data.districts[0].serves_pincode("522002"));
        assert_eq!(data.districts[0].maternal_mortality_ratio, None);

        let graph = data.build_graph(60.0);
        assert!(graph.has_edge("ngo_Sakhi Trust", "fac_GGH Guntur"));
        assert!(graph.has_edge("fund_Gates Foundation", "fac_GGH Guntur"));
        assert!(!graph.has_edge("fund_Gates Foundation", "ngo_Green Earth"));
    }

    #[test]
    fn test_missing_table_is_reported_with_path() {
        let dir = tempdir().unwrap();
        let err = ScoredDataset::load(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(NGOS_SCORED_FILE));
    }

    #[test]
    fn test_written_records_load_back() {
        let dir = tempdir().unwrap();
        seed(dir.path());
        let ngos: Vec<NgoRecord> = read_records(&dir.path().join(NGOS_SCORED_FILE)).unwrap();
        let out = dir.path().join("out").join(NGOS_SCORED_FILE);
        write_records(&out, &ngos).unwrap();
        let back: Vec<NgoRecord> = read_records(&out).unwrap();
        assert_eq!(back, ngos);
    }
}
