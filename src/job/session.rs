//! One user's analysis session: at most one live job at a time.

use std::sync::Arc;

use super::orchestrator::{JobHandle, JobOrchestrator};
use super::results::AnalysisResults;
use super::state::{Job, JobFailure};
use crate::api::AnalysisInput;

/// Holds the current job and the error-banner state around it
pub struct AnalysisSession {
    orchestrator: JobOrchestrator,
    current: Option<JobHandle>,
    error_dismissed: bool,
}

impl AnalysisSession {
    pub fn new(orchestrator: JobOrchestrator) -> Self {
        Self {
            orchestrator,
            current: None,
            error_dismissed: false,
        }
    }

    /// Start a new job, cancelling any job still running.
    pub fn start(&mut self, input: AnalysisInput) -> &JobHandle {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        self.error_dismissed = false;
        let handle = self.orchestrator.start(input);
        self.current.insert(handle)
    }

    pub fn current(&self) -> Option<&JobHandle> {
        self.current.as_ref()
    }

    pub fn job(&self) -> Option<Job> {
        self.current.as_ref().map(JobHandle::job)
    }

    /// A started job has not yet settled.
    pub fn is_loading(&self) -> bool {
        self.current
            .as_ref()
            .map(|h| !h.snapshot().is_settled())
            .unwrap_or(false)
    }

    pub fn results(&self) -> Option<Arc<AnalysisResults>> {
        self.current.as_ref().and_then(|h| h.job().result)
    }

    /// The current job's failure, unless the user dismissed it.
    pub fn visible_error(&self) -> Option<JobFailure> {
        if self.error_dismissed {
            return None;
        }
        self.current.as_ref().and_then(|h| h.job().failure)
    }

    /// Hide the current failure. The job itself stays failed.
    pub fn dismiss_error(&mut self) {
        self.error_dismissed = true;
    }

    /// Cancel and forget the current job.
    pub fn reset(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.cancel();
        }
        self.error_dismissed = false;
    }
}
