//! Wire-to-model validation
//!
//! Node invariants are hard errors. Edge problems are repaired by dropping
//! the offending edge and counting it in a [`ValidationReport`].

use std::collections::{HashMap, HashSet};

use tracing::warn;

use super::model::GraphModel;
use super::types::{EdgeLabel, GraphEdge, GraphNode, RawEdge};
use crate::error::GraphError;

/// What validation had to drop to produce a consistent model
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Edges with a source or target missing from the node set.
    pub dangling_edges: usize,
    /// Edges whose relation is none of the four canonical labels.
    pub unknown_labels: usize,
    /// Edges identical to an earlier one (same source, target, label).
    pub duplicate_edges: usize,
}

impl ValidationReport {
    pub fn dropped(&self) -> usize {
        self.dangling_edges + self.unknown_labels + self.duplicate_edges
    }

    pub fn is_clean(&self) -> bool {
        self.dropped() == 0
    }
}

/// Check node invariants and build the id index.
pub(super) fn index_nodes(nodes: &[GraphNode]) -> Result<HashMap<String, usize>, GraphError> {
    let mut index = HashMap::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        if node.risk_level.is_elevated() && node.failure_reason.is_none() {
            return Err(GraphError::MissingFailureReason {
                id: node.id.clone(),
                risk: node.risk_level,
            });
        }
        if index.insert(node.id.clone(), i).is_some() {
            return Err(GraphError::DuplicateNode(node.id.clone()));
        }
    }
    Ok(index)
}

/// Normalize raw edges against a node index.
///
/// Self-loops and parallel edges with different labels survive; only fully
/// identical repeats are collapsed.
pub(super) fn normalize_edges(
    index: &HashMap<String, usize>,
    raw_edges: impl IntoIterator<Item = RawEdge>,
) -> (Vec<GraphEdge>, ValidationReport) {
    let mut report = ValidationReport::default();
    let mut seen: HashSet<(String, String, EdgeLabel)> = HashSet::new();
    let mut edges = Vec::new();

    for raw in raw_edges {
        if !index.contains_key(&raw.source) || !index.contains_key(&raw.target) {
            report.dangling_edges += 1;
            continue;
        }
        let Some(label) = EdgeLabel::from_relation(&raw.label) else {
            report.unknown_labels += 1;
            continue;
        };
        if !seen.insert((raw.source.clone(), raw.target.clone(), label)) {
            report.duplicate_edges += 1;
            continue;
        }
        edges.push(GraphEdge {
            source: raw.source,
            target: raw.target,
            label,
        });
    }

    if !report.is_clean() {
        warn!(
            dangling = report.dangling_edges,
            unknown_labels = report.unknown_labels,
            duplicates = report.duplicate_edges,
            kept = edges.len(),
            "Dropped edges during graph validation"
        );
    }

    (edges, report)
}

/// Validate nodes and raw edges into a [`GraphModel`].
pub fn validate(
    nodes: Vec<GraphNode>,
    raw_edges: impl IntoIterator<Item = RawEdge>,
) -> Result<(GraphModel, ValidationReport), GraphError> {
    let index = index_nodes(&nodes)?;
    let (edges, report) = normalize_edges(&index, raw_edges);
    Ok((GraphModel::from_validated(nodes, edges, index), report))
}
