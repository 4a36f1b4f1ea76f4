//! CodeForge - client for remote codebase analysis
//!
//! Submits a codebase (archive or repository URL) to the analysis service,
//! tracks the job until it finishes, and turns the results into a laid-out,
//! filterable dependency graph.
//!
//! ## Architecture
//!
//! ```text
//! AnalysisSession ─► JobOrchestrator ─► AnalysisService (HTTP)
//!                          │
//!                          ▼
//!                   AnalysisResults { GraphModel, stats, report }
//!                          │
//!                          ▼
//!        ResultsExplorer ─► LayoutEngine (layered, cached) ─► GraphView
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use codeforge::api::{AnalysisInput, HttpAnalysisClient};
//! use codeforge::config::ClientConfig;
//! use codeforge::job::JobOrchestrator;
//!
//! # async fn run() -> codeforge::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let client = Arc::new(HttpAnalysisClient::new(config.clone())?);
//! let orchestrator = JobOrchestrator::from_config(client, &config);
//! let handle = orchestrator.start(AnalysisInput::repository("https://github.com/org/repo"));
//! let snapshot = handle.wait().await;
//! println!("{}", snapshot.job.state);
//! # Ok(())
//! # }
//! ```

// Core error handling
pub mod error;

// Service location, polling cadence, layout geometry
pub mod config;

// Canonical node/edge dataset
pub mod graph;

// Layered graph layout
pub mod layout;

// Analysis service client
pub mod api;

// Job lifecycle
pub mod job;

// Filtering, selection, derived views
pub mod view;

pub use error::{ForgeError, Result};
pub use graph::{EdgeLabel, GraphEdge, GraphModel, GraphNode};
pub use job::{AnalysisResults, AnalysisSession, Job, JobOrchestrator, JobState};
pub use layout::{layout, LayoutDirection, LayoutEngine, LayoutResult};
pub use view::{derive_view, EdgeFilter, GraphView, ResultsExplorer, ViewState};
