// src/graph/mod.rs
//
// Arena graph of NGOs, facilities and funders. Nodes and edges live in two
// vectors and refer to each other by index; rebuilding from the scored tables
// is the only way to change it.
pub mod builder;
pub mod layout;
pub mod subgraph;

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use builder::build_graph;
pub use layout::{to_flow_graph, FlowGraph};
pub use subgraph::subgraph_for_district;

pub type NodeIndex = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "NGO")]
    Ngo,
    #[serde(rename = "FACILITY")]
    Facility,
    #[serde(rename = "FUNDER")]
    Funder,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Ngo => "NGO",
            NodeKind::Facility => "FACILITY",
            NodeKind::Funder => "FUNDER",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub district: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub score: Option<f64>,
    /// Focus areas for NGOs and funders, facility type for facilities.
    pub profile_text: String,
    /// Funder focus keywords; empty for other kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<String>,
}

impl GraphNode {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EdgeKind {
    #[serde(rename = "CARE_CHAIN")]
    CareChain { distance_km: f64 },
    #[serde(rename = "FUNDING")]
    Funding,
}

impl EdgeKind {
    pub fn label(&self) -> &'static str {
        match self {
            EdgeKind::CareChain { .. } => "CARE_CHAIN",
            EdgeKind::Funding => "FUNDING",
        }
    }
}

/// Undirected edge; `source` is the endpoint that was added first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeIndex,
    pub target: NodeIndex,
    pub kind: EdgeKind,
}

impl GraphEdge {
    pub fn other(&self, node: NodeIndex) -> NodeIndex {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReferralGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, NodeIndex>,
    // Edge indices touching each node.
    adjacency: Vec<Vec<usize>>,
}

impl ReferralGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, or returns the index of the node already holding this id.
    /// The first row for an id wins.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&existing) = self.index.get(&node.id) {
            warn!("Duplicate node id '{}', keeping the first row", node.id);
            return existing;
        }
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        idx
    }

    /// Adds an undirected edge. A second edge between the same pair, or a
    /// self loop, is ignored. Returns whether an edge was added.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, kind: EdgeKind) -> bool {
        if a == b || a >= self.nodes.len() || b >= self.nodes.len() || self.edge_between(a, b).is_some()
        {
            return false;
        }
        let edge_idx = self.edges.len();
        self.edges.push(GraphEdge {
            source: a,
            target: b,
            kind,
        });
        self.adjacency[a].push(edge_idx);
        self.adjacency[b].push(edge_idx);
        true
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&GraphNode> {
        self.nodes.get(idx)
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_between(&self, a: NodeIndex, b: NodeIndex) -> Option<&GraphEdge> {
        self.adjacency
            .get(a)?
            .iter()
            .map(|&e| &self.edges[e])
            .find(|edge| edge.other(a) == b)
    }

    pub fn has_edge(&self, a_id: &str, b_id: &str) -> bool {
        match (self.node_index(a_id), self.node_index(b_id)) {
            (Some(a), Some(b)) => self.edge_between(a, b).is_some(),
            _ => false,
        }
    }

    /// Neighbors of `idx` with the connecting edge, in edge insertion order.
    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &GraphEdge)> + '_ {
        self.adjacency
            .get(idx)
            .into_iter()
            .flatten()
            .map(move |&e| (self.edges[e].other(idx), &self.edges[e]))
    }

    pub fn indices_of_kind(&self, kind: NodeKind) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }

    /// Copy of the graph restricted to `keep`. Nodes keep their relative
    /// order from this graph; only edges with both endpoints kept survive.
    pub fn induced_subgraph(&self, keep: &[NodeIndex]) -> ReferralGraph {
        let mut selected = vec![false; self.nodes.len()];
        for &idx in keep {
            if let Some(slot) = selected.get_mut(idx) {
                *slot = true;
            }
        }

        let mut sub = ReferralGraph::new();
        let mut remap: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        for (idx, node) in self.nodes.iter().enumerate() {
            if selected[idx] {
                remap.insert(idx, sub.add_node(node.clone()));
            }
        }
        for edge in &self.edges {
            if let (Some(&a), Some(&b)) = (remap.get(&edge.source), remap.get(&edge.target)) {
                sub.add_edge(a, b, edge.kind.clone());
            }
        }
        sub
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, kind: NodeKind) -> GraphNode {
        GraphNode {
            id: id.into(),
            kind,
            name: id.into(),
            district: None,
            lat: None,
            lon: None,
            score: None,
            profile_text: String::new(),
            focus_keywords: Vec::new(),
            regions: None,
        }
    }

    #[test]
    fn test_duplicate_node_id_keeps_first() {
        let mut g = ReferralGraph::new();
        let a = g.add_node(node("ngo_A", NodeKind::Ngo));
        let mut dup = node("ngo_A", NodeKind::Ngo);
        dup.score = Some(99.0);
        assert_eq!(g.add_node(dup), a);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.node(a).unwrap().score, None);
    }

    #[test]
    fn test_edges_are_undirected_and_unique() {
        let mut g = ReferralGraph::new();
        let a = g.add_node(node("fund_X", NodeKind::Funder));
        let b = g.add_node(node("ngo_Y", NodeKind::Ngo));
        assert!(g.add_edge(a, b, EdgeKind::Funding));
        assert!(!g.add_edge(b, a, EdgeKind::Funding));
        assert!(!g.add_edge(a, a, EdgeKind::Funding));
        assert!(g.has_edge("ngo_Y", "fund_X"));
        assert_eq!(g.neighbors(b).map(|(n, _)| n).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_induced_subgraph_drops_external_edges() {
        let mut g = ReferralGraph::new();
        let f = g.add_node(node("fund_X", NodeKind::Funder));
        let n = g.add_node(node("ngo_Y", NodeKind::Ngo));
        let c = g.add_node(node("fac_Z", NodeKind::Facility));
        g.add_edge(f, n, EdgeKind::Funding);
        g.add_edge(n, c, EdgeKind::CareChain { distance_km: 3.2 });
        g.add_edge(f, c, EdgeKind::Funding);

        let sub = g.induced_subgraph(&[c, n]);
        let ids: Vec<&str> = sub.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["ngo_Y", "fac_Z"]);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.edges()[0].kind, EdgeKind::CareChain { distance_km: 3.2 });
    }

    #[test]
    fn test_edge_kind_serializes_with_tag() {
        let json = serde_json::to_value(EdgeKind::CareChain { distance_km: 12.4 }).unwrap();
        assert_eq!(json["kind"], "CARE_CHAIN");
        assert_eq!(json["distance_km"], 12.4);
    }
}
