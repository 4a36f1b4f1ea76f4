//! Analysis service client
//!
//! The job orchestrator only sees the [`AnalysisService`] trait. The HTTP
//! implementation lives in [`http`]; tests substitute scripted fakes.
//!
//! ```text
//! POST /analyze            multipart: file=<archive> | repo_url=<url>
//!                          → {"job_id": "..."}
//! GET  /status/{job_id}    → {"status": "<progress|Done|Failed...>"}
//! GET  /results/{job_id}   → ResultsBundle
//! GET  /tree/{job_id}      → TreeData
//! GET  /report/{job_id}    → {"content": "..."}
//! ```

pub mod http;
pub mod types;

pub use http::HttpAnalysisClient;
pub use types::{
    ErrorBody, ReportResponse, ResultsBundle, StatusResponse, SubmitResponse, TreeData, TreeNode,
    TreeNodeData,
};

use std::path::Path;

use async_trait::async_trait;

use crate::error::ServiceError;

/// What to analyse: an uploaded archive or a repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    Archive { file_name: String, bytes: Vec<u8> },
    Repository(String),
}

impl AnalysisInput {
    pub fn repository(url: impl Into<String>) -> Self {
        AnalysisInput::Repository(url.into())
    }

    /// Read an archive from disk. The file name sent to the service is the
    /// path's final component.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive.zip".to_string());
        Ok(AnalysisInput::Archive { file_name, bytes })
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        match self {
            AnalysisInput::Archive { file_name, bytes } => {
                format!("archive {} ({} bytes)", file_name, bytes.len())
            }
            AnalysisInput::Repository(url) => format!("repository {}", url),
        }
    }
}

/// The remote analysis service as seen by the job orchestrator
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Start a job and return its opaque id.
    async fn submit(&self, input: &AnalysisInput) -> Result<String, ServiceError>;

    /// Raw status string for a job.
    async fn poll_status(&self, job_id: &str) -> Result<String, ServiceError>;

    /// Results bundle of a finished job.
    async fn fetch_results(&self, job_id: &str) -> Result<ResultsBundle, ServiceError>;
}
