//! Wire types for the analysis service
//!
//! Field names follow the service's JSON. Unknown fields are ignored, so
//! presentation extras the service attaches (styles, positions, colours)
//! pass through harmlessly.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::{GraphModel, GraphNode, RawEdge, RiskLevel};
use crate::job::{AnalysisResults, AnalysisStats};

/// `POST /analyze` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /status/{job_id}` response
///
/// `status` is either JSON-encoded progress, the completion token, a
/// failure-prefixed message or a bare progress string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Error body the service returns with non-success statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// `GET /report/{job_id}` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub content: String,
}

/// Presentation node record inside `tree_data`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TreeNodeData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
}

/// Layout input graph (`tree_data`), also served alone by `/tree/{job_id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeData {
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

/// `GET /results/{job_id}` response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultsBundle {
    /// Full node records.
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub tree_data: TreeData,
    #[serde(default)]
    pub stats: AnalysisStats,
    #[serde(default)]
    pub report: String,
}

impl ResultsBundle {
    /// Validate the bundle into the canonical Graph Model.
    ///
    /// Node records come from `nodes`; edges from `tree_data.edges`.
    /// Presentation-only tree nodes with no record (such as a synthetic
    /// root) are not part of the model, and edges touching them are dropped
    /// as dangling.
    pub fn into_results(self) -> Result<AnalysisResults, GraphError> {
        let (graph, validation) = GraphModel::from_parts(self.nodes, self.tree_data.edges)?;
        Ok(AnalysisResults {
            graph,
            stats: self.stats,
            report: self.report,
            validation,
        })
    }
}
