//! Layout Engine - layered (Sugiyama-style) positioning
//!
//! Pure function from a node/edge set plus a direction to top-left anchored
//! coordinates and per-edge anchor sides. Every call builds its own working
//! graph, so results depend on nothing but the inputs.
//!
//! # Phases
//!
//! ```text
//! nodes + edges
//!      │
//!      ▼
//! rank::classify_back_edges   (DFS, cycle breaking)
//! rank::assign_ranks          (longest path over forward edges)
//!      │
//!      ▼
//! order::order_layers         (barycenter sweeps, bounded passes)
//!      │
//!      ▼
//! coords::place_component     (per connected component, packed on the
//!                              secondary axis)
//! ```

mod cache;
mod coords;
mod order;
mod rank;

pub use cache::{Fingerprint, LayoutCache};

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{GraphEdge, GraphNode, GraphModel};

// =============================================================================
// LAYOUT CONSTANTS
// =============================================================================

/// Default node footprint
pub const NODE_WIDTH: f64 = 200.0;
pub const NODE_HEIGHT: f64 = 80.0;

/// Gap between consecutive ranks along the primary axis
pub const RANK_GAP: f64 = 80.0;
/// Gap between neighbours within a rank
pub const NODE_GAP: f64 = 40.0;
/// Gap between packed connected components
pub const COMPONENT_GAP: f64 = 80.0;

/// Upper bound on crossing-reduction passes
pub const MAX_ORDERING_PASSES: usize = 12;

/// Fixed geometry used by the layout engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    pub rank_gap: f64,
    pub node_gap: f64,
    pub component_gap: f64,
    pub max_ordering_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            rank_gap: RANK_GAP,
            node_gap: NODE_GAP,
            component_gap: COMPONENT_GAP,
            max_ordering_passes: MAX_ORDERING_PASSES,
        }
    }
}

// =============================================================================
// PUBLIC TYPES
// =============================================================================

/// Primary flow direction of the drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    #[default]
    #[serde(rename = "TB")]
    TopToBottom,
    #[serde(rename = "LR")]
    LeftToRight,
}

impl LayoutDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutDirection::TopToBottom => "TB",
            LayoutDirection::LeftToRight => "LR",
        }
    }

    /// Side an edge leaves its source node from.
    pub fn exit_side(&self) -> AnchorSide {
        match self {
            LayoutDirection::TopToBottom => AnchorSide::Bottom,
            LayoutDirection::LeftToRight => AnchorSide::Right,
        }
    }

    /// Side an edge enters its target node on.
    pub fn entry_side(&self) -> AnchorSide {
        match self {
            LayoutDirection::TopToBottom => AnchorSide::Top,
            LayoutDirection::LeftToRight => AnchorSide::Left,
        }
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tb" | "top-to-bottom" => Ok(LayoutDirection::TopToBottom),
            "lr" | "left-to-right" => Ok(LayoutDirection::LeftToRight),
            other => Err(format!("unknown layout direction '{}'", other)),
        }
    }
}

/// Side of a node box an edge attaches to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorSide {
    Top,
    Bottom,
    Left,
    Right,
}

/// Top-left corner of a node box
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Routing information for one input edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeAnchor {
    pub source: String,
    pub target: String,
    /// Side the edge leaves the source from.
    pub exit: AnchorSide,
    /// Side the edge enters the target on.
    pub entry: AnchorSide,
    /// Excluded from ranking to break a cycle; still drawn.
    pub back_edge: bool,
}

/// Output of the layout engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutResult {
    pub direction: LayoutDirection,
    /// Node id → top-left position.
    pub positions: BTreeMap<String, Point>,
    /// Node id → layer index along the primary axis.
    pub ranks: BTreeMap<String, usize>,
    /// One entry per input edge, in input order.
    pub edge_anchors: Vec<EdgeAnchor>,
    /// Extent of the drawing (bottom-right corner of the furthest box).
    pub width: f64,
    pub height: f64,
}

impl LayoutResult {
    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    pub fn rank(&self, id: &str) -> Option<usize> {
        self.ranks.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn back_edge_count(&self) -> usize {
        self.edge_anchors.iter().filter(|a| a.back_edge).count()
    }
}

// =============================================================================
// LAYOUT ENGINE
// =============================================================================

/// Index-based working graph, rebuilt on every call
pub(crate) struct WorkGraph {
    /// Node ids in input order; duplicates keep the first occurrence.
    pub ids: Vec<String>,
    /// Resolved endpoints per input edge (None when an endpoint is unknown).
    pub edges: Vec<Option<(usize, usize)>>,
    /// Outgoing (target, edge index) pairs per node.
    pub out: Vec<Vec<(usize, usize)>>,
    /// Undirected neighbour sets without self-loops, sorted.
    pub neighbors: Vec<Vec<usize>>,
}

impl WorkGraph {
    fn build(nodes: &[GraphNode], edges: &[GraphEdge]) -> Self {
        let mut ids = Vec::with_capacity(nodes.len());
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if !index.contains_key(node.id.as_str()) {
                index.insert(node.id.as_str(), ids.len());
                ids.push(node.id.clone());
            }
        }

        let n = ids.len();
        let mut out = vec![Vec::new(); n];
        let mut neighbors = vec![Vec::new(); n];
        let mut resolved = Vec::with_capacity(edges.len());

        for (i, edge) in edges.iter().enumerate() {
            let ends = match (index.get(edge.source.as_str()), index.get(edge.target.as_str())) {
                (Some(&u), Some(&v)) => Some((u, v)),
                _ => None,
            };
            if let Some((u, v)) = ends {
                out[u].push((v, i));
                if u != v {
                    neighbors[u].push(v);
                    neighbors[v].push(u);
                }
            }
            resolved.push(ends);
        }

        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }

        Self {
            ids,
            edges: resolved,
            out,
            neighbors,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Connected components (ignoring direction), each sorted by input
    /// index, ordered by their first member.
    fn components(&self) -> Vec<Vec<usize>> {
        let n = self.len();
        let mut component = vec![usize::MAX; n];
        let mut result: Vec<Vec<usize>> = Vec::new();

        for start in 0..n {
            if component[start] != usize::MAX {
                continue;
            }
            let id = result.len();
            let mut members = vec![start];
            component[start] = id;
            let mut stack = vec![start];
            while let Some(u) = stack.pop() {
                for &v in &self.neighbors[u] {
                    if component[v] == usize::MAX {
                        component[v] = id;
                        members.push(v);
                        stack.push(v);
                    }
                }
            }
            members.sort_unstable();
            result.push(members);
        }
        result
    }
}

/// Layout engine computes node positions
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lay out a validated Graph Model.
    pub fn compute_model(&self, model: &GraphModel, direction: LayoutDirection) -> LayoutResult {
        self.compute(model.nodes(), model.edges(), direction)
    }

    /// Compute positions and anchors.
    ///
    /// Edges whose endpoints are not in `nodes` get an anchor entry but take
    /// no part in ranking; filtering them is the Graph Model's job.
    pub fn compute(
        &self,
        nodes: &[GraphNode],
        edges: &[GraphEdge],
        direction: LayoutDirection,
    ) -> LayoutResult {
        let graph = WorkGraph::build(nodes, edges);

        let back = rank::classify_back_edges(&graph);
        let ranks = rank::assign_ranks(&graph, &back);
        let geometry = coords::AxisGeometry::new(&self.config, direction);

        let mut placed: Vec<Point> = vec![Point::default(); graph.len()];
        let mut offset = 0.0;
        let components = graph.components();

        for members in &components {
            let layers = order::build_layers(members, &ranks);
            let layers = order::order_layers(layers, &graph, self.config.max_ordering_passes);
            let span = coords::place_component(&layers, offset, &geometry, &mut placed);
            offset += span + self.config.component_gap;
        }

        let mut positions = BTreeMap::new();
        let mut rank_map = BTreeMap::new();
        let (mut width, mut height) = (0.0_f64, 0.0_f64);
        for (i, id) in graph.ids.iter().enumerate() {
            let p = placed[i];
            width = width.max(p.x + self.config.node_width);
            height = height.max(p.y + self.config.node_height);
            positions.insert(id.clone(), p);
            rank_map.insert(id.clone(), ranks[i]);
        }

        let edge_anchors = edges
            .iter()
            .enumerate()
            .map(|(i, edge)| EdgeAnchor {
                source: edge.source.clone(),
                target: edge.target.clone(),
                exit: direction.exit_side(),
                entry: direction.entry_side(),
                back_edge: back[i],
            })
            .collect();

        debug!(
            nodes = graph.len(),
            edges = edges.len(),
            components = components.len(),
            direction = %direction,
            "Computed layout"
        );

        LayoutResult {
            direction,
            positions,
            ranks: rank_map,
            edge_anchors,
            width,
            height,
        }
    }
}

/// Lay out with the default geometry.
pub fn layout(nodes: &[GraphNode], edges: &[GraphEdge], direction: LayoutDirection) -> LayoutResult {
    LayoutEngine::default().compute(nodes, edges, direction)
}
