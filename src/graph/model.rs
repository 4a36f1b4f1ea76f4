//! The canonical node/edge dataset for one completed job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::{EdgeLabel, GraphEdge, GraphNode, RawEdge};
use super::validate::{self, ValidationReport};
use crate::error::GraphError;

/// Immutable Graph Model
///
/// Construction always goes through validation, so every edge references
/// a node of this model and node ids are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphParts", into = "GraphParts")]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    index: HashMap<String, usize>,
}

impl GraphModel {
    /// Build a model from already-labelled edges.
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Result<Self, GraphError> {
        let raw = edges
            .into_iter()
            .map(|e| RawEdge::new(e.source, e.target, e.label.as_str()));
        Ok(validate::validate(nodes, raw)?.0)
    }

    /// Build a model from wire records, reporting what had to be dropped.
    pub fn from_parts(
        nodes: Vec<GraphNode>,
        raw_edges: impl IntoIterator<Item = RawEdge>,
    ) -> Result<(Self, ValidationReport), GraphError> {
        validate::validate(nodes, raw_edges)
    }

    pub(super) fn from_validated(
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
        index: HashMap<String, usize>,
    ) -> Self {
        Self {
            nodes,
            edges,
            index,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Edges carrying the given label, in model order.
    pub fn edges_labelled(&self, label: EdgeLabel) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |e| e.label == label)
    }
}

#[derive(Serialize, Deserialize)]
struct GraphParts {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
}

impl TryFrom<GraphParts> for GraphModel {
    type Error = GraphError;

    fn try_from(parts: GraphParts) -> Result<Self, Self::Error> {
        GraphModel::new(parts.nodes, parts.edges)
    }
}

impl From<GraphModel> for GraphParts {
    fn from(model: GraphModel) -> Self {
        GraphParts {
            nodes: model.nodes,
            edges: model.edges,
        }
    }
}
