//! Job Orchestrator
//!
//! Turns a submission into a polled, cancellable job and delivers its
//! results.
//!
//! ```text
//! AnalysisSession ──start──► JobOrchestrator ──spawn──► driver task
//!                                                           │
//!        JobHandle ◄──watch<JobSnapshot>──── transition() ◄─┤
//!                                                           │
//!                          AnalysisService: submit / poll_status / fetch_results
//! ```
//!
//! - `status`: decoding the service's status string, pipeline stages
//! - `state`: the pure state machine
//! - `orchestrator`: the task that drives a job
//! - `session`: one live job per user, error dismissal

mod orchestrator;
mod results;
mod session;
pub mod state;
pub mod status;

pub use orchestrator::{JobHandle, JobOrchestrator, JobSnapshot, JobWatcher};
pub use results::{AnalysisResults, AnalysisStats, MetricValue};
pub use session::AnalysisSession;
pub use state::{
    transition, FailureKind, Job, JobEvent, JobFailure, JobState, ABORTED_MESSAGE,
    INITIAL_PROGRESS_MESSAGE, RESULTS_UNAVAILABLE_MESSAGE,
};
pub use status::{ParsedStatus, PipelineStage, StageStatus, COMPLETION_TOKEN, FINAL_STEP};
