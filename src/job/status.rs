//! Status decoding and pipeline stages
//!
//! The service reports job status as a single string. Decoding order:
//!
//! ```text
//! "Done"                  → Terminal
//! "Failed..."             → Failed (whole string kept as the message)
//! {"step":..,"message":..} → Progress
//! anything else           → RawFallback (shown verbatim at step 1)
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Exact status string that marks pipeline completion.
pub const COMPLETION_TOKEN: &str = "Done";

/// Prefix of every pipeline failure status.
pub const FAILURE_PREFIX: &str = "Failed";

/// Number of pipeline stages; also the progress step of a finished job.
pub const FINAL_STEP: u8 = 6;

/// A decoded status string
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedStatus {
    Progress {
        step: u8,
        message: String,
        /// Stage count the service reported, when present.
        total: Option<u8>,
        /// When the service recorded this progress.
        updated_at: Option<DateTime<Utc>>,
    },
    Terminal,
    Failed {
        message: String,
    },
    RawFallback {
        text: String,
    },
}

#[derive(Deserialize)]
struct ProgressPayload {
    step: i64,
    message: String,
    #[serde(default)]
    total: Option<i64>,
    /// Seconds since the epoch.
    #[serde(default)]
    timestamp: Option<f64>,
}

impl ParsedStatus {
    pub fn decode(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed == COMPLETION_TOKEN {
            return ParsedStatus::Terminal;
        }
        if trimmed.starts_with(FAILURE_PREFIX) {
            return ParsedStatus::Failed {
                message: trimmed.to_string(),
            };
        }
        if let Ok(payload) = serde_json::from_str::<ProgressPayload>(trimmed) {
            return ParsedStatus::Progress {
                step: clamp_step(payload.step),
                message: payload.message,
                total: payload.total.and_then(|t| u8::try_from(t).ok()),
                updated_at: payload.timestamp.and_then(epoch_seconds),
            };
        }
        ParsedStatus::RawFallback {
            text: raw.to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ParsedStatus::Terminal)
    }

    /// Progress step and message this status implies, if it carries any.
    pub fn progress(&self) -> Option<(u8, &str)> {
        match self {
            ParsedStatus::Progress { step, message, .. } => Some((*step, message.as_str())),
            ParsedStatus::RawFallback { text } => Some((1, text.as_str())),
            ParsedStatus::Terminal => Some((FINAL_STEP, "Complete")),
            ParsedStatus::Failed { .. } => None,
        }
    }
}

fn clamp_step(step: i64) -> u8 {
    step.clamp(0, i64::from(FINAL_STEP)) as u8
}

fn epoch_seconds(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1e9) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
}

// ── Pipeline stages ─────────────────────────────────────────────

/// The six stages the service walks through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    CodeParsing,
    AiDiscovery,
    StructuralLearning,
    ServiceClustering,
    GraphMetrics,
    ReportGeneration,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::CodeParsing,
        PipelineStage::AiDiscovery,
        PipelineStage::StructuralLearning,
        PipelineStage::ServiceClustering,
        PipelineStage::GraphMetrics,
        PipelineStage::ReportGeneration,
    ];

    /// 1-based stage number, matching the progress step.
    pub fn number(&self) -> u8 {
        match self {
            PipelineStage::CodeParsing => 1,
            PipelineStage::AiDiscovery => 2,
            PipelineStage::StructuralLearning => 3,
            PipelineStage::ServiceClustering => 4,
            PipelineStage::GraphMetrics => 5,
            PipelineStage::ReportGeneration => 6,
        }
    }

    pub fn from_step(step: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.number() == step)
    }

    pub fn title(&self) -> &'static str {
        match self {
            PipelineStage::CodeParsing => "Code Parsing",
            PipelineStage::AiDiscovery => "AI Discovery",
            PipelineStage::StructuralLearning => "GNN Learning",
            PipelineStage::ServiceClustering => "Service Clustering",
            PipelineStage::GraphMetrics => "Graph Metrics",
            PipelineStage::ReportGeneration => "Report Generation",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PipelineStage::CodeParsing => "Building CPG",
            PipelineStage::AiDiscovery => "LLM Analysis",
            PipelineStage::StructuralLearning => "Structural Embeddings",
            PipelineStage::ServiceClustering => "Louvain Algorithm",
            PipelineStage::GraphMetrics => "Analyzing Topology",
            PipelineStage::ReportGeneration => "Finalizing Blueprint",
        }
    }

    /// Where this stage stands at a given progress step. Once the pipeline
    /// has finished every stage is completed.
    pub fn status_at(&self, step: u8, finished: bool) -> StageStatus {
        let n = self.number();
        if finished || n < step {
            StageStatus::Completed
        } else if n == step {
            StageStatus::Current
        } else {
            StageStatus::Pending
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title(), self.description())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    Completed,
    Current,
    Pending,
}
