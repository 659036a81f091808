// src/insights/stats.rs
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::Entity;
use crate::utils::constants::HIGH_PRIORITY_THRESHOLD;

/// Map position for districts outside the coordinate table.
pub const DEFAULT_DISTRICT_COORDS: (f64, f64) = (17.0, 80.0);

const DISTRICT_COORDS: [(&str, f64, f64); 12] = [
    ("Visakhapatnam", 17.6868, 83.2185),
    ("Hyderabad", 17.3850, 78.4867),
    ("Guntur", 16.3067, 80.4365),
    ("Krishna", 16.6100, 80.7214),
    ("Rangareddy", 17.2543, 78.3808),
    ("East Godavari", 17.0005, 81.8040),
    ("Eluru", 16.7107, 81.0952),
    ("Karimnagar", 18.4386, 79.1288),
    ("Nellore", 14.4426, 79.9865),
    ("Kurnool", 15.8281, 78.0373),
    ("Warangal", 17.9784, 79.5941),
    ("Nizamabad", 18.6725, 78.0941),
];

pub fn district_coordinates(district: &str) -> (f64, f64) {
    DISTRICT_COORDS
        .iter()
        .find(|(name, _, _)| *name == district)
        .map(|(_, lat, lng)| (*lat, *lng))
        .unwrap_or(DEFAULT_DISTRICT_COORDS)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_entities: usize,
    pub total_ngos: usize,
    pub total_funders: usize,
    pub high_priority_leads: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_district: BTreeMap<String, usize>,
}

fn count_by_district(entities: &[Entity]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for district in entities.iter().filter_map(|e| e.district.as_deref()) {
        if !district.is_empty() {
            *counts.entry(district.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Headline counts. NGO and funder totals come from their own tables.
pub fn dashboard_stats(entities: &[Entity], total_ngos: usize, total_funders: usize) -> DashboardStats {
    let high_priority_leads = entities
        .iter()
        .filter(|e| e.priority_score.is_some_and(|p| p >= HIGH_PRIORITY_THRESHOLD))
        .count();

    let mut by_type = BTreeMap::new();
    for e in entities {
        let label = e.org_type.map(|t| t.as_str()).unwrap_or("Unknown");
        *by_type.entry(label.to_string()).or_insert(0) += 1;
    }

    DashboardStats {
        total_entities: entities.len(),
        total_ngos,
        total_funders,
        high_priority_leads,
        by_type,
        by_district: count_by_district(entities),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapPoint {
    pub district: String,
    pub count: usize,
    pub lat: f64,
    pub lng: f64,
}

/// Entity count per district with map coordinates, busiest first. Equal
/// counts are ordered by district name.
pub fn district_heatmap(entities: &[Entity]) -> Vec<HeatmapPoint> {
    let mut points: Vec<HeatmapPoint> = count_by_district(entities)
        .into_iter()
        .map(|(district, count)| {
            let (lat, lng) = district_coordinates(&district);
            HeatmapPoint {
                district,
                count,
                lat,
                lng,
            }
        })
        .collect();
    points.sort_by(|a, b| b.count.cmp(&a.count));
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::fixtures::entity;
    use crate::models::OrgType;

    fn corpus() -> Vec<Entity> {
        vec![
            entity("A", OrgType::Ngo, Some("Guntur"), Some(90.0), Some(86.5)),
            entity("B", OrgType::Phc, Some("Guntur"), Some(70.0), Some(71.5)),
            entity("C", OrgType::Ngo, Some("Palnadu"), None, Some(85.0)),
            entity("D", OrgType::Funder, None, None, None),
        ]
    }

    #[test]
    fn test_dashboard_counts() {
        let stats = dashboard_stats(&corpus(), 12, 4);
        assert_eq!(stats.total_entities, 4);
        assert_eq!(stats.total_ngos, 12);
        assert_eq!(stats.total_funders, 4);
        assert_eq!(stats.high_priority_leads, 2);
        assert_eq!(stats.by_type["NGO"], 2);
        assert_eq!(stats.by_type["Funder"], 1);
        assert_eq!(stats.by_district.get("Guntur"), Some(&2));
        assert_eq!(stats.by_district.len(), 2);
    }

    #[test]
    fn test_heatmap_sorted_with_default_coords() {
        let points = district_heatmap(&corpus());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].district, "Guntur");
        assert_eq!(points[0].count, 2);
        assert_eq!((points[0].lat, points[0].lng), (16.3067, 80.4365));
        assert_eq!((points[1].lat, points[1].lng), DEFAULT_DISTRICT_COORDS);
    }
}
