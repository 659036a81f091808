// src/graph/builder.rs
use log::{debug, info};
use std::collections::HashMap;
use std::time::Instant;

use super::{EdgeKind, GraphNode, NodeIndex, NodeKind, ReferralGraph};
use crate::models::{FacilityRecord, FunderRecord, NgoRecord};
use crate::utils::geo::geodesic_distance_km;
use crate::utils::round_to;

pub fn ngo_node(r: &NgoRecord) -> GraphNode {
    GraphNode {
        id: format!("ngo_{}", r.name),
        kind: NodeKind::Ngo,
        name: r.name.clone(),
        district: Some(r.district.clone()),
        lat: Some(r.lat),
        lon: Some(r.lon),
        score: r.capability_score,
        profile_text: r.focus_areas.clone(),
        focus_keywords: Vec::new(),
        regions: None,
    }
}

pub fn facility_node(r: &FacilityRecord) -> GraphNode {
    GraphNode {
        id: format!("fac_{}", r.name),
        kind: NodeKind::Facility,
        name: r.name.clone(),
        district: Some(r.district.clone()),
        lat: Some(r.lat),
        lon: Some(r.lon),
        score: r.capability_score,
        profile_text: r.facility_type.clone(),
        focus_keywords: Vec::new(),
        regions: None,
    }
}

pub fn funder_node(r: &FunderRecord) -> GraphNode {
    GraphNode {
        id: format!("fund_{}", r.name),
        kind: NodeKind::Funder,
        name: r.name.clone(),
        district: None,
        lat: None,
        lon: None,
        score: None,
        profile_text: r.focus_areas.clone(),
        focus_keywords: r.focus_keywords(),
        regions: Some(r.regions.clone()),
    }
}

/// Builds the full referral graph from the scored tables.
///
/// CARE_CHAIN edges join an NGO and a facility of the same district whose
/// geodesic distance is at most `max_km`. Facilities are bucketed by district
/// first, so only same-district pairs are measured. FUNDING edges join a
/// funder to every NGO or facility whose profile text contains one of the
/// funder's focus keywords (case-insensitive).
///
/// Node and edge order follow input order, so rebuilding from unchanged
/// tables yields an identical graph.
pub fn build_graph(
    ngos: &[NgoRecord],
    facilities: &[FacilityRecord],
    funders: &[FunderRecord],
    max_km: f64,
) -> ReferralGraph {
    let start = Instant::now();
    let mut graph = ReferralGraph::new();

    for r in ngos {
        graph.add_node(ngo_node(r));
    }
    for r in facilities {
        graph.add_node(facility_node(r));
    }
    for r in funders {
        graph.add_node(funder_node(r));
    }

    let ngo_idx = graph.indices_of_kind(NodeKind::Ngo);
    let fac_idx = graph.indices_of_kind(NodeKind::Facility);
    let fund_idx = graph.indices_of_kind(NodeKind::Funder);

    let care_chain = add_care_chain_edges(&mut graph, &ngo_idx, &fac_idx, max_km);
    let funding = add_funding_edges(&mut graph, &fund_idx, &ngo_idx, &fac_idx);

    info!(
        "✅ Built referral graph: {} nodes ({} NGOs, {} facilities, {} funders), {} CARE_CHAIN + {} FUNDING edges in {:.2?}",
        graph.node_count(),
        ngo_idx.len(),
        fac_idx.len(),
        fund_idx.len(),
        care_chain,
        funding,
        start.elapsed()
    );
    graph
}

fn add_care_chain_edges(
    graph: &mut ReferralGraph,
    ngo_idx: &[NodeIndex],
    fac_idx: &[NodeIndex],
    max_km: f64,
) -> usize {
    let mut by_district: HashMap<String, Vec<NodeIndex>> = HashMap::new();
    for &f in fac_idx {
        if let Some(district) = graph.nodes()[f].district.clone() {
            by_district.entry(district).or_default().push(f);
        }
    }

    let mut pending: Vec<(NodeIndex, NodeIndex, f64)> = Vec::new();
    for &n in ngo_idx {
        let ngo = &graph.nodes()[n];
        let (Some(district), Some((lat1, lon1))) = (ngo.district.as_ref(), ngo.coordinates()) else {
            continue;
        };
        let Some(bucket) = by_district.get(district) else {
            continue;
        };
        for &f in bucket {
            let Some((lat2, lon2)) = graph.nodes()[f].coordinates() else {
                continue;
            };
            let distance_km = geodesic_distance_km(lat1, lon1, lat2, lon2);
            if distance_km <= max_km {
                pending.push((n, f, round_to(distance_km, 1)));
            } else {
                debug!(
                    "No CARE_CHAIN {} -> {}: {:.1} km > {:.1} km",
                    ngo.id,
                    graph.nodes()[f].id,
                    distance_km,
                    max_km
                );
            }
        }
    }

    let mut added = 0;
    for (n, f, distance_km) in pending {
        if graph.add_edge(n, f, EdgeKind::CareChain { distance_km }) {
            added += 1;
        }
    }
    added
}

fn add_funding_edges(
    graph: &mut ReferralGraph,
    fund_idx: &[NodeIndex],
    ngo_idx: &[NodeIndex],
    fac_idx: &[NodeIndex],
) -> usize {
    let mut pending: Vec<(NodeIndex, NodeIndex)> = Vec::new();
    for &fund in fund_idx {
        let keywords: Vec<String> = graph.nodes()[fund]
            .focus_keywords
            .iter()
            .map(|k| k.to_lowercase())
            .collect();
        if keywords.is_empty() {
            continue;
        }
        for &target in ngo_idx.iter().chain(fac_idx) {
            let text = graph.nodes()[target].profile_text.to_lowercase();
            if keywords.iter().any(|kw| text.contains(kw.as_str())) {
                pending.push((fund, target));
            }
        }
    }

    let mut added = 0;
    for (fund, target) in pending {
        if graph.add_edge(fund, target, EdgeKind::Funding) {
            added += 1;
        }
    }
    added
}
