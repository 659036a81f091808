// src/graph/subgraph.rs
use log::debug;
use std::cmp::Ordering;

use super::{NodeIndex, NodeKind, ReferralGraph};

/// Top `limit` nodes of `kind` in `district`, by score descending. A missing
/// score counts as 0 and ties keep graph order.
fn top_in_district(
    graph: &ReferralGraph,
    kind: NodeKind,
    district: &str,
    limit: usize,
) -> Vec<NodeIndex> {
    let mut candidates: Vec<NodeIndex> = graph
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind == kind && n.district.as_deref() == Some(district))
        .map(|(i, _)| i)
        .collect();

    let score = |i: &NodeIndex| graph.nodes()[*i].score.unwrap_or(0.0);
    candidates.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
    candidates.truncate(limit);
    candidates
}

/// Bounded view of one district: its best NGOs and facilities plus every
/// funder linked to at least one of them. Edges to anything outside the
/// selection are dropped.
pub fn subgraph_for_district(
    graph: &ReferralGraph,
    district: &str,
    max_ngos: usize,
    max_facilities: usize,
) -> ReferralGraph {
    let mut selected = top_in_district(graph, NodeKind::Ngo, district, max_ngos);
    selected.extend(top_in_district(
        graph,
        NodeKind::Facility,
        district,
        max_facilities,
    ));

    let funders: Vec<NodeIndex> = graph
        .indices_of_kind(NodeKind::Funder)
        .into_iter()
        .filter(|&f| selected.iter().any(|&t| graph.edge_between(f, t).is_some()))
        .collect();

    debug!(
        "District '{}' view: {} NGOs/facilities, {} funders",
        district,
        selected.len(),
        funders.len()
    );
    selected.extend(funders);
    graph.induced_subgraph(&selected)
}
