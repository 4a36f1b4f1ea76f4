//! Job state machine
//!
//! ```text
//! Idle ──[SubmitStarted]──► Submitting ──[Submitted]──► Polling
//!  │                            │                         │
//!  │                            └──[SubmitFailed]──► Failed (Submission)
//!  │                                                      │
//!  │            Polling ──[StatusReceived(Failed)]──► Failed (Pipeline)
//!  │            Polling ──[StatusReceived(Terminal)]──► Polling, pipeline finished
//!  │                 │
//!  │                 ├──[ResultsFetched]──────► Done
//!  │                 └──[ResultsUnavailable]──► Failed (ResultsUnavailable)
//! ```
//!
//! Done and Failed are final: every further event is rejected. A transport
//! failure while polling leaves the job untouched. `Aborted` fails any
//! unsettled job whose driver stopped early.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::results::AnalysisResults;
use super::status::{ParsedStatus, PipelineStage, StageStatus, FINAL_STEP};
use crate::error::InvalidTransition;

/// Message shown when a finished job's results cannot be used.
pub const RESULTS_UNAVAILABLE_MESSAGE: &str =
    "Failed to download analysis results. The server may have restarted.";

/// Message of a job whose driver stopped before it settled.
pub const ABORTED_MESSAGE: &str = "Analysis stopped unexpectedly. Please try again.";

/// Progress message of a job that has not reported yet.
pub const INITIAL_PROGRESS_MESSAGE: &str = "Initializing...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Idle,
    Submitting,
    Polling,
    Done,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Submitting => "submitting",
            JobState::Polling => "polling",
            JobState::Done => "done",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }

    /// Submitting or polling.
    pub fn is_active(&self) -> bool {
        matches!(self, JobState::Submitting | JobState::Polling)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a failed job went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The service rejected the submission or could not be reached.
    Submission,
    /// The pipeline itself reported failure.
    Pipeline,
    /// The pipeline finished but its results could not be fetched or used.
    ResultsUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// One analysis job as the client sees it
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Assigned by the service on submission.
    pub id: Option<String>,
    pub state: JobState,
    /// 0 before any report, 1..=6 while running, 6 once finished.
    pub progress_step: u8,
    pub progress_message: String,
    pub total_steps: Option<u8>,
    pub status_updated_at: Option<DateTime<Utc>>,
    /// The completion token has been seen; results are being fetched.
    pub pipeline_finished: bool,
    pub result: Option<Arc<AnalysisResults>>,
    pub failure: Option<JobFailure>,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            id: None,
            state: JobState::Idle,
            progress_step: 0,
            progress_message: INITIAL_PROGRESS_MESSAGE.to_string(),
            total_steps: None,
            status_updated_at: None,
            pipeline_finished: false,
            result: None,
            failure: None,
        }
    }
}

impl Job {
    pub fn new() -> Self {
        Self::default()
    }

    /// Failure message, when the job failed.
    pub fn error_detail(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }

    /// Status of each pipeline stage at the current progress.
    pub fn stage_statuses(&self) -> Vec<(PipelineStage, StageStatus)> {
        PipelineStage::ALL
            .iter()
            .map(|stage| {
                (
                    *stage,
                    stage.status_at(self.progress_step, self.pipeline_finished),
                )
            })
            .collect()
    }
}

/// Inputs to [`transition`]
#[derive(Debug, Clone)]
pub enum JobEvent {
    SubmitStarted,
    Submitted { job_id: String },
    SubmitFailed { message: String },
    StatusReceived(ParsedStatus),
    PollFailed { error: String },
    ResultsFetched(Arc<AnalysisResults>),
    ResultsUnavailable { reason: String },
    /// The driver stopped without reaching a terminal state.
    Aborted { reason: String },
}

impl JobEvent {
    pub fn name(&self) -> &'static str {
        match self {
            JobEvent::SubmitStarted => "submit_started",
            JobEvent::Submitted { .. } => "submitted",
            JobEvent::SubmitFailed { .. } => "submit_failed",
            JobEvent::StatusReceived(_) => "status_received",
            JobEvent::PollFailed { .. } => "poll_failed",
            JobEvent::ResultsFetched(_) => "results_fetched",
            JobEvent::ResultsUnavailable { .. } => "results_unavailable",
            JobEvent::Aborted { .. } => "aborted",
        }
    }
}

// ============================================================================
// State Machine - single entry point for every job change
// ============================================================================

/// Apply one event to a job, producing the next job.
pub fn transition(job: &Job, event: JobEvent) -> Result<Job, InvalidTransition> {
    use JobEvent::*;
    use JobState::*;

    let invalid = |event: &JobEvent| InvalidTransition {
        from: job.state,
        event: event.name(),
    };

    let mut next = job.clone();
    match (job.state, event) {
        (Idle, SubmitStarted) => {
            next.state = Submitting;
        }

        (Idle | Submitting, Submitted { job_id }) => {
            next.id = Some(job_id);
            next.state = Polling;
        }

        (Idle | Submitting, SubmitFailed { message }) => {
            next.state = Failed;
            next.failure = Some(JobFailure {
                kind: FailureKind::Submission,
                message,
            });
        }

        (Polling, StatusReceived(status)) if !job.pipeline_finished => match status {
            ParsedStatus::Progress {
                step,
                message,
                total,
                updated_at,
            } => {
                next.progress_step = step;
                next.progress_message = message;
                next.total_steps = total.or(job.total_steps);
                next.status_updated_at = updated_at.or(job.status_updated_at);
            }
            ParsedStatus::RawFallback { text } => {
                next.progress_step = 1;
                next.progress_message = text;
            }
            ParsedStatus::Terminal => {
                next.progress_step = FINAL_STEP;
                next.progress_message = "Complete".to_string();
                next.pipeline_finished = true;
            }
            ParsedStatus::Failed { message } => {
                next.state = Failed;
                next.failure = Some(JobFailure {
                    kind: FailureKind::Pipeline,
                    message,
                });
            }
        },

        (Polling, PollFailed { .. }) => {}

        (Polling, ResultsFetched(results)) if job.pipeline_finished => {
            next.state = Done;
            next.result = Some(results);
        }

        (Polling, ResultsUnavailable { .. }) if job.pipeline_finished => {
            next.state = Failed;
            next.failure = Some(JobFailure {
                kind: FailureKind::ResultsUnavailable,
                message: RESULTS_UNAVAILABLE_MESSAGE.to_string(),
            });
        }

        (Idle | Submitting | Polling, Aborted { reason }) => {
            let kind = match job.state {
                Polling if job.pipeline_finished => FailureKind::ResultsUnavailable,
                Polling => FailureKind::Pipeline,
                _ => FailureKind::Submission,
            };
            next.state = Failed;
            next.failure = Some(JobFailure {
                kind,
                message: reason,
            });
        }

        (_, event) => return Err(invalid(&event)),
    }
    Ok(next)
}
