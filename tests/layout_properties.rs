//! Property tests for the layered layout.

use std::collections::HashSet;

use codeforge::graph::{EdgeLabel, GraphEdge, GraphModel, GraphNode, NodeType};
use codeforge::layout::{LayoutDirection, LayoutEngine, LayoutResult, NODE_HEIGHT, NODE_WIDTH};
use proptest::prelude::*;

// -- Strategy helpers --

fn arb_label() -> impl Strategy<Value = EdgeLabel> {
    prop_oneof![
        Just(EdgeLabel::Calls),
        Just(EdgeLabel::Structural),
        Just(EdgeLabel::Dependency),
        Just(EdgeLabel::Flow),
    ]
}

fn arb_direction() -> impl Strategy<Value = LayoutDirection> {
    prop_oneof![
        Just(LayoutDirection::TopToBottom),
        Just(LayoutDirection::LeftToRight),
    ]
}

/// Up to 14 nodes with up to 30 edges among them; cycles, self-loops and
/// parallel edges all allowed.
fn arb_graph() -> impl Strategy<Value = GraphModel> {
    (1usize..14).prop_flat_map(|n| {
        prop::collection::vec((0..n, 0..n, arb_label()), 0..30).prop_map(move |raw| {
            let nodes: Vec<GraphNode> = (0..n)
                .map(|i| GraphNode::new(format!("n{}", i), NodeType::Function))
                .collect();
            let edges: Vec<GraphEdge> = raw
                .into_iter()
                .map(|(s, t, label)| GraphEdge::new(format!("n{}", s), format!("n{}", t), label))
                .collect();
            GraphModel::new(nodes, edges).expect("generated graph is valid")
        })
    })
}

fn compute(graph: &GraphModel, direction: LayoutDirection) -> LayoutResult {
    LayoutEngine::default().compute_model(graph, direction)
}

fn overlaps(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 < b.0 + NODE_WIDTH && b.0 < a.0 + NODE_WIDTH && a.1 < b.1 + NODE_HEIGHT && b.1 < a.1 + NODE_HEIGHT
}

proptest! {
    #[test]
    fn every_node_is_placed(graph in arb_graph(), direction in arb_direction()) {
        let result = compute(&graph, direction);
        prop_assert_eq!(result.positions.len(), graph.node_count());
        prop_assert_eq!(result.ranks.len(), graph.node_count());
        prop_assert_eq!(result.edge_anchors.len(), graph.edge_count());
        for node in graph.nodes() {
            let p = result.position(&node.id).expect("position");
            prop_assert!(p.x >= 0.0 && p.y >= 0.0);
            prop_assert!(p.x + NODE_WIDTH <= result.width + 1e-9);
            prop_assert!(p.y + NODE_HEIGHT <= result.height + 1e-9);
        }
    }

    #[test]
    fn boxes_never_overlap(graph in arb_graph(), direction in arb_direction()) {
        let result = compute(&graph, direction);
        let boxes: Vec<(f64, f64)> = result.positions.values().map(|p| (p.x, p.y)).collect();
        for i in 0..boxes.len() {
            for j in i + 1..boxes.len() {
                prop_assert!(!overlaps(boxes[i], boxes[j]), "{:?} overlaps {:?}", boxes[i], boxes[j]);
            }
        }
    }

    /// Forward edges always point to a strictly later rank.
    #[test]
    fn forward_edges_descend(graph in arb_graph()) {
        let result = compute(&graph, LayoutDirection::TopToBottom);
        for anchor in &result.edge_anchors {
            if anchor.source == anchor.target {
                prop_assert!(anchor.back_edge);
                continue;
            }
            if !anchor.back_edge {
                let s = result.rank(&anchor.source).expect("source rank");
                let t = result.rank(&anchor.target).expect("target rank");
                prop_assert!(t > s, "{} (rank {}) → {} (rank {})", anchor.source, s, anchor.target, t);
            }
        }
    }

    /// Longest-path ranking is tight: every node off rank 0 has a forward
    /// predecessor exactly one rank above it.
    #[test]
    fn ranks_are_tight(graph in arb_graph()) {
        let result = compute(&graph, LayoutDirection::TopToBottom);
        for (id, &rank) in &result.ranks {
            if rank == 0 {
                continue;
            }
            let has_parent = result.edge_anchors.iter().any(|a| {
                !a.back_edge && a.target == *id && result.rank(&a.source) == Some(rank - 1)
            });
            prop_assert!(has_parent, "{} on rank {} has no parent on rank {}", id, rank, rank - 1);
        }
        let roots: HashSet<&str> = result
            .ranks
            .iter()
            .filter(|(_, r)| **r == 0)
            .map(|(id, _)| id.as_str())
            .collect();
        prop_assert!(!roots.is_empty());
    }

    #[test]
    fn layout_is_deterministic(graph in arb_graph(), direction in arb_direction()) {
        prop_assert_eq!(compute(&graph, direction), compute(&graph, direction));
    }

    /// Direction only swaps axes; ranking is shared.
    #[test]
    fn direction_preserves_ranks(graph in arb_graph()) {
        let tb = compute(&graph, LayoutDirection::TopToBottom);
        let lr = compute(&graph, LayoutDirection::LeftToRight);
        prop_assert_eq!(&tb.ranks, &lr.ranks);
        let tb_back: Vec<bool> = tb.edge_anchors.iter().map(|a| a.back_edge).collect();
        let lr_back: Vec<bool> = lr.edge_anchors.iter().map(|a| a.back_edge).collect();
        prop_assert_eq!(tb_back, lr_back);
    }
}
