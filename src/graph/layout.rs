// src/graph/layout.rs
//
// Node/edge projection for flow-chart style viewers. Coordinates carry no
// meaning beyond being deterministic for a fixed node order.
use serde::Serialize;

use super::{EdgeKind, NodeKind, ReferralGraph};

const X_STEP: f64 = 220.0;
const Y_STEP: f64 = 120.0;

fn band(kind: NodeKind) -> f64 {
    match kind {
        NodeKind::Funder => 0.0,
        NodeKind::Ngo => 1.0,
        NodeKind::Facility => 2.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNodeData {
    pub label: String,
    pub role: NodeKind,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowNode {
    pub id: String,
    pub position: FlowPosition,
    pub data: FlowNodeData,
    #[serde(rename = "type")]
    pub node_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: &'static str,
    pub animated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

pub fn to_flow_graph(graph: &ReferralGraph) -> FlowGraph {
    let nodes = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, n)| FlowNode {
            id: n.id.clone(),
            position: FlowPosition {
                x: band(n.kind) * X_STEP,
                y: i as f64 * Y_STEP,
            },
            data: FlowNodeData {
                label: n.name.clone(),
                role: n.kind,
                score: n.score,
            },
            node_type: "default",
        })
        .collect();

    let edges = graph
        .edges()
        .iter()
        .enumerate()
        .map(|(i, e)| FlowEdge {
            id: format!("e{}", i),
            source: graph.nodes()[e.source].id.clone(),
            target: graph.nodes()[e.target].id.clone(),
            label: e.kind.label(),
            animated: matches!(e.kind, EdgeKind::CareChain { .. }),
        })
        .collect();

    FlowGraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::graph::fixtures::{facility, funder, ngo};

    #[test]
    fn test_positions_follow_kind_band_and_order() {
        let g = build_graph(
            &[ngo("Sakhi", "Guntur", 16.3, 80.0, "maternal")],
            &[facility("PHC", "Guntur", 16.31, 70.0, "PHC")],
            &[funder("Gates", "maternal")],
            60.0,
        );
        let flow = to_flow_graph(&g);

        let positions: Vec<(f64, f64)> = flow
            .nodes
            .iter()
            .map(|n| (n.position.x, n.position.y))
            .collect();
        assert_eq!(positions, vec![(220.0, 0.0), (440.0, 120.0), (0.0, 240.0)]);

        assert_eq!(flow.edges.len(), 2);
        assert_eq!(flow.edges[0].id, "e0");
        assert_eq!(flow.edges[0].label, "CARE_CHAIN");
        assert!(flow.edges[0].animated);
        assert_eq!(flow.edges[1].source, "fund_Gates");
        assert!(!flow.edges[1].animated);
    }

    #[test]
    fn test_flow_json_shape() {
        let g = build_graph(&[ngo("Sakhi", "Guntur", 16.3, 80.0, "")], &[], &[], 60.0);
        let json = serde_json::to_value(to_flow_graph(&g)).unwrap();
        let node = &json["nodes"][0];
        assert_eq!(node["type"], "default");
        assert_eq!(node["data"]["role"], "NGO");
        assert_eq!(node["data"]["label"], "Sakhi");
        assert_eq!(node["data"]["score"], 80.0);
    }
}
