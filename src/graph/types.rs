//! Graph Model data structures
//!
//! Nodes arrive from the service as full records; edges as raw relation
//! records that still need normalization (see [`super::validate`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// NODE CLASSIFICATION
// =============================================================================

/// Kind of code entity a node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Class,
    #[default]
    Function,
    ApiCall,
    Module,
    #[serde(other)]
    Other,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Class => "class",
            NodeType::Function => "function",
            NodeType::ApiCall => "api_call",
            NodeType::Module => "module",
            NodeType::Other => "other",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk assessment attached to a node by the discovery step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn is_elevated(&self) -> bool {
        !matches!(self, RiskLevel::Low)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EDGE LABELS
// =============================================================================

/// Relation type carried by an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeLabel {
    Calls,
    Structural,
    Dependency,
    Flow,
}

impl EdgeLabel {
    pub const ALL: [EdgeLabel; 4] = [
        EdgeLabel::Calls,
        EdgeLabel::Structural,
        EdgeLabel::Dependency,
        EdgeLabel::Flow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeLabel::Calls => "calls",
            EdgeLabel::Structural => "structural",
            EdgeLabel::Dependency => "dependency",
            EdgeLabel::Flow => "flow",
        }
    }

    /// Human label for filter pickers.
    pub fn display_name(&self) -> &'static str {
        match self {
            EdgeLabel::Calls => "Function Calls",
            EdgeLabel::Structural => "Structural",
            EdgeLabel::Dependency => "Dependencies",
            EdgeLabel::Flow => "Data Flow",
        }
    }

    /// Map a raw relation name (as produced by parsing or discovery) onto one
    /// of the four canonical labels.
    pub fn from_relation(relation: &str) -> Option<EdgeLabel> {
        match relation.trim().to_ascii_lowercase().as_str() {
            "calls" | "call" => Some(EdgeLabel::Calls),
            "structural" | "composition" | "contains" | "inheritance" | "inherits" => {
                Some(EdgeLabel::Structural)
            }
            "dependency" | "import" | "imports" | "same_file" | "coupling" => {
                Some(EdgeLabel::Dependency)
            }
            "flow" | "temporal" | "data_flow" => Some(EdgeLabel::Flow),
            _ => None,
        }
    }
}

impl fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EdgeLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("unknown edge label '{}'", s))
    }
}

// =============================================================================
// NODES AND EDGES
// =============================================================================

/// A code entity in the analysed codebase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub line_start: u32,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Outbound call identifiers, display-only.
    #[serde(default)]
    pub calls: Vec<String>,
}

impl GraphNode {
    /// Minimal node, mostly useful for building graphs by hand.
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            node_type,
            language: None,
            file: String::new(),
            line_start: 0,
            risk_level: RiskLevel::Low,
            failure_reason: None,
            calls: Vec::new(),
        }
    }

    pub fn with_risk(mut self, risk: RiskLevel, reason: impl Into<String>) -> Self {
        self.risk_level = risk;
        self.failure_reason = Some(reason.into());
        self
    }

    /// `file:line` provenance string.
    pub fn location(&self) -> String {
        format!("{}:{}", self.file, self.line_start)
    }
}

/// A validated, labelled edge between two nodes of the same model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub label: EdgeLabel,
}

impl GraphEdge {
    pub fn new(source: impl Into<String>, target: impl Into<String>, label: EdgeLabel) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            label,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Edge as delivered on the wire, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    /// Relation name; may be canonical or a raw alias like `imports`.
    #[serde(default = "default_relation")]
    pub label: String,
}

fn default_relation() -> String {
    EdgeLabel::Calls.as_str().to_string()
}

impl RawEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            label: label.into(),
        }
    }
}
