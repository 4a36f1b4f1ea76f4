//! View Controller
//!
//! Derives what to draw from a Graph Model, its layout and the user's view
//! state. Filtering and selection are independent: hiding edges never
//! clears the selection, and selecting never changes the filter.
//!
//! ```text
//! GraphModel ─┐
//! LayoutResult ├─► derive_view() ─► GraphView { visible_edges, selected_node, stats }
//! ViewState ──┘
//! ```

mod explorer;

pub use explorer::ResultsExplorer;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::graph::{EdgeLabel, GraphEdge, GraphModel, GraphNode};
use crate::job::AnalysisStats;
use crate::layout::{AnchorSide, LayoutResult, Point};

/// Id of the synthetic root the service adds to its tree view.
/// Selecting it clears the selection.
pub const ROOT_NODE_ID: &str = "root";

/// Headline used when the report has no usable first line.
pub const DEFAULT_INSIGHT: &str = "Codebase graph generated with granular nodes and relations.";

// =============================================================================
// VIEW STATE
// =============================================================================

/// Which edges to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum EdgeFilter {
    #[default]
    All,
    Only(EdgeLabel),
}

impl EdgeFilter {
    pub fn matches(&self, edge: &GraphEdge) -> bool {
        match self {
            EdgeFilter::All => true,
            EdgeFilter::Only(label) => edge.label == *label,
        }
    }
}

impl fmt::Display for EdgeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeFilter::All => f.write_str("all"),
            EdgeFilter::Only(label) => f.write_str(label.as_str()),
        }
    }
}

impl FromStr for EdgeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(EdgeFilter::All);
        }
        s.to_ascii_lowercase()
            .parse::<EdgeLabel>()
            .map(EdgeFilter::Only)
            .map_err(|_| format!("unknown edge filter '{}'", s))
    }
}

/// Filter and selection chosen by the user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: EdgeFilter,
    pub selected: Option<String>,
}

impl ViewState {
    /// Select a node; the root id clears the selection.
    pub fn select(&mut self, node_id: &str) {
        if node_id == ROOT_NODE_ID {
            self.selected = None;
        } else {
            self.selected = Some(node_id.to_string());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn set_filter(&mut self, filter: EdgeFilter) {
        self.filter = filter;
    }
}

// =============================================================================
// DERIVED VIEW
// =============================================================================

/// An edge that passes the filter, with routing from the layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleEdge {
    pub edge: GraphEdge,
    pub exit: AnchorSide,
    pub entry: AnchorSide,
    pub back_edge: bool,
}

/// Counts computed from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedStats {
    pub nodes: usize,
    pub total_edges: usize,
    pub visible_edges: usize,
}

impl DerivedStats {
    /// Whether the service-reported counts match the model.
    pub fn agrees_with(&self, reported: &AnalysisStats) -> bool {
        self.nodes == reported.nodes && self.total_edges == reported.edges
    }
}

/// Everything needed to draw the current view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub filter: EdgeFilter,
    pub visible_edges: Vec<VisibleEdge>,
    /// Full record of the selected node, if it exists in the model.
    pub selected_node: Option<GraphNode>,
    pub selected_position: Option<Point>,
    pub stats: DerivedStats,
}

/// Compute the drawable view.
///
/// `layout` must have been computed from `graph`'s edges; anchors are
/// matched by position and fall back to the direction's default sides.
pub fn derive_view(graph: &GraphModel, layout: &LayoutResult, state: &ViewState) -> GraphView {
    let visible_edges: Vec<VisibleEdge> = graph
        .edges()
        .iter()
        .enumerate()
        .filter(|(_, edge)| state.filter.matches(edge))
        .map(|(i, edge)| {
            let anchor = layout
                .edge_anchors
                .get(i)
                .filter(|a| a.source == edge.source && a.target == edge.target);
            VisibleEdge {
                edge: edge.clone(),
                exit: anchor.map_or(layout.direction.exit_side(), |a| a.exit),
                entry: anchor.map_or(layout.direction.entry_side(), |a| a.entry),
                back_edge: anchor.map_or(false, |a| a.back_edge),
            }
        })
        .collect();

    let selected_node = state
        .selected
        .as_deref()
        .and_then(|id| graph.node(id))
        .cloned();
    let selected_position = selected_node
        .as_ref()
        .and_then(|node| layout.position(&node.id));

    let stats = DerivedStats {
        nodes: graph.node_count(),
        total_edges: graph.edge_count(),
        visible_edges: visible_edges.len(),
    };

    GraphView {
        filter: state.filter,
        visible_edges,
        selected_node,
        selected_position,
        stats,
    }
}

/// First line of the report with any leading `# ` removed.
pub fn headline_insight(report: &str) -> String {
    let first = report.lines().next().unwrap_or("").trim();
    let headline = first.trim_start_matches('#').trim();
    if headline.is_empty() {
        DEFAULT_INSIGHT.to_string()
    } else {
        headline.to_string()
    }
}
