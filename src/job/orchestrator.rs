//! Drives one job from submission to a terminal state.
//!
//! Each job runs on its own tokio task. The task submits, then polls on a
//! fixed interval with at most one status request in flight, then fetches
//! results exactly once. Every change goes through [`transition`] and is
//! published on a watch channel, so observers always see a consistent
//! [`JobSnapshot`].
//!
//! Cancellation is a watch signal raced against every await. Once
//! cancelled, the snapshot refuses further changes, so a response that
//! arrives late is discarded.
//!
//! If the driver stops before the job settles (a panicking service or a
//! runtime shutting down), the job is failed on the way out so that
//! [`JobHandle::wait`] always returns.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::state::{transition, Job, JobEvent, ABORTED_MESSAGE};
use super::status::ParsedStatus;
use crate::api::{AnalysisInput, AnalysisService};
use crate::config::ClientConfig;

/// What observers see: the job plus whether it was cancelled
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub job: Job,
    pub cancelled: bool,
}

impl JobSnapshot {
    /// No further change will be published.
    pub fn is_settled(&self) -> bool {
        self.cancelled || self.job.state.is_terminal()
    }
}

/// Receiver yielding a snapshot after every change.
pub type JobWatcher = watch::Receiver<JobSnapshot>;

/// Starts jobs against an analysis service
#[derive(Clone)]
pub struct JobOrchestrator {
    service: Arc<dyn AnalysisService>,
    poll_interval: Duration,
}

impl JobOrchestrator {
    pub fn new(service: Arc<dyn AnalysisService>, poll_interval: Duration) -> Self {
        Self {
            service,
            poll_interval,
        }
    }

    pub fn from_config(service: Arc<dyn AnalysisService>, config: &ClientConfig) -> Self {
        Self::new(service, config.poll_interval())
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Spawn a job. Must be called inside a tokio runtime.
    pub fn start(&self, input: AnalysisInput) -> JobHandle {
        let (state_tx, _) = watch::channel(JobSnapshot {
            job: Job::new(),
            cancelled: false,
        });
        let state = Arc::new(state_tx);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let driver = Driver {
            service: Arc::clone(&self.service),
            poll_interval: self.poll_interval,
            state: Arc::clone(&state),
            cancel: cancel_rx,
        };
        let task = tokio::spawn(driver.run(input));

        JobHandle {
            state,
            cancel_tx,
            task,
        }
    }
}

/// Owner's handle on a running job. Dropping it cancels the job.
pub struct JobHandle {
    state: Arc<watch::Sender<JobSnapshot>>,
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl JobHandle {
    pub fn snapshot(&self) -> JobSnapshot {
        self.state.borrow().clone()
    }

    pub fn job(&self) -> Job {
        self.state.borrow().job.clone()
    }

    pub fn subscribe(&self) -> JobWatcher {
        self.state.subscribe()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.borrow().cancelled
    }

    /// Stop polling and discard anything still in flight. Idempotent; a job
    /// already in a terminal state is left as it is.
    pub fn cancel(&self) {
        let newly_cancelled = self.state.send_if_modified(|snapshot| {
            if snapshot.is_settled() {
                return false;
            }
            snapshot.cancelled = true;
            true
        });
        self.cancel_tx.send_replace(true);
        if newly_cancelled {
            info!(job_id = ?self.state.borrow().job.id, "Job cancelled");
        }
    }

    /// Wait until the job is terminal or cancelled.
    pub async fn wait(&self) -> JobSnapshot {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(JobSnapshot::is_settled)
            .await
            .map(|snapshot| (*snapshot).clone());
        settled.unwrap_or_else(|_| self.snapshot())
    }

    /// The driving task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ============================================================================
// Driver task
// ============================================================================

struct Driver {
    service: Arc<dyn AnalysisService>,
    poll_interval: Duration,
    state: Arc<watch::Sender<JobSnapshot>>,
    cancel: watch::Receiver<bool>,
}

/// Fails a job that is still unsettled when the driver goes away,
/// including after a panic in the service.
struct SettleOnExit(Arc<watch::Sender<JobSnapshot>>);

impl Drop for SettleOnExit {
    fn drop(&mut self) {
        let aborted = self.0.send_if_modified(|snapshot| {
            if snapshot.is_settled() {
                return false;
            }
            let event = JobEvent::Aborted {
                reason: ABORTED_MESSAGE.to_string(),
            };
            match transition(&snapshot.job, event) {
                Ok(next) => {
                    snapshot.job = next;
                    true
                }
                Err(_) => false,
            }
        });
        if aborted {
            error!(
                job_id = ?self.0.borrow().job.id,
                "Job driver stopped before the job settled"
            );
        }
    }
}

/// Run `fut` unless cancellation wins first. A dropped handle counts as
/// cancellation.
async fn cancellable<F: Future>(cancel: &mut watch::Receiver<bool>, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.wait_for(|c| *c) => None,
        out = fut => Some(out),
    }
}

impl Driver {
    /// Apply an event unless the job was cancelled. Returns false when the
    /// event was not applied, which means the task should stop.
    fn apply(&self, event: JobEvent) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|snapshot| {
            if snapshot.cancelled {
                return false;
            }
            match transition(&snapshot.job, event) {
                Ok(next) => {
                    applied = true;
                    let changed = next != snapshot.job;
                    snapshot.job = next;
                    changed
                }
                Err(e) => {
                    warn!(error = %e, "Rejected job event");
                    false
                }
            }
        });
        applied
    }

    async fn run(mut self, input: AnalysisInput) {
        let _settle = SettleOnExit(Arc::clone(&self.state));

        if !self.apply(JobEvent::SubmitStarted) {
            return;
        }

        let Some(submitted) = cancellable(&mut self.cancel, self.service.submit(&input)).await
        else {
            return;
        };
        let job_id = match submitted {
            Ok(job_id) => job_id,
            Err(e) => {
                warn!(error = %e, input = %input.describe(), "Submission failed");
                self.apply(JobEvent::SubmitFailed {
                    message: e.user_message(),
                });
                return;
            }
        };
        if !self.apply(JobEvent::Submitted {
            job_id: job_id.clone(),
        }) {
            return;
        }

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        let mut consecutive_failures: u32 = 0;
        loop {
            if cancellable(&mut self.cancel, ticker.tick()).await.is_none() {
                return;
            }
            let Some(polled) =
                cancellable(&mut self.cancel, self.service.poll_status(&job_id)).await
            else {
                return;
            };

            match polled {
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        job_id = %job_id,
                        error = %e,
                        consecutive_failures,
                        transient = e.is_transient(),
                        "Status poll failed"
                    );
                    if !self.apply(JobEvent::PollFailed {
                        error: e.to_string(),
                    }) {
                        return;
                    }
                }
                Ok(raw) => {
                    consecutive_failures = 0;
                    let status = ParsedStatus::decode(&raw);
                    debug!(job_id = %job_id, status = ?status, "Status polled");
                    let finished = status.is_terminal();
                    let failed = matches!(status, ParsedStatus::Failed { .. });
                    if !self.apply(JobEvent::StatusReceived(status)) {
                        return;
                    }
                    if failed {
                        info!(job_id = %job_id, "Pipeline reported failure");
                        return;
                    }
                    if finished {
                        break;
                    }
                }
            }
        }

        let Some(fetched) =
            cancellable(&mut self.cancel, self.service.fetch_results(&job_id)).await
        else {
            return;
        };
        let converted = fetched
            .map_err(|e| e.to_string())
            .and_then(|bundle| bundle.into_results().map_err(|e| e.to_string()));

        let event = match converted {
            Ok(results) => {
                info!(
                    job_id = %job_id,
                    nodes = results.graph.node_count(),
                    edges = results.graph.edge_count(),
                    dropped_edges = results.validation.dropped(),
                    "Results ready"
                );
                JobEvent::ResultsFetched(Arc::new(results))
            }
            Err(reason) => {
                warn!(job_id = %job_id, reason = %reason, "Results unavailable");
                JobEvent::ResultsUnavailable { reason }
            }
        };
        self.apply(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ResultsBundle, TreeData};
    use crate::error::ServiceError;
    use crate::graph::{GraphNode, NodeType, RawEdge};
    use crate::job::{FailureKind, JobState};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Answers polls from a queue; repeats the last answer when drained.
    struct QueueService {
        statuses: Mutex<VecDeque<Result<String, ServiceError>>>,
        bundle: ResultsBundle,
    }

    impl QueueService {
        fn new(statuses: Vec<Result<String, ServiceError>>, bundle: ResultsBundle) -> Arc<Self> {
            Arc::new(Self {
                statuses: Mutex::new(statuses.into()),
                bundle,
            })
        }
    }

    #[async_trait]
    impl AnalysisService for QueueService {
        async fn submit(&self, _input: &AnalysisInput) -> Result<String, ServiceError> {
            Ok("job-1".into())
        }

        async fn poll_status(&self, _job_id: &str) -> Result<String, ServiceError> {
            let mut statuses = self.statuses.lock().unwrap();
            if statuses.len() > 1 {
                statuses.pop_front().unwrap()
            } else {
                statuses.front().cloned().unwrap()
            }
        }

        async fn fetch_results(&self, _job_id: &str) -> Result<ResultsBundle, ServiceError> {
            Ok(self.bundle.clone())
        }
    }

    fn bundle() -> ResultsBundle {
        ResultsBundle {
            nodes: vec![
                GraphNode::new("a", NodeType::Module),
                GraphNode::new("b", NodeType::Function),
            ],
            tree_data: TreeData {
                nodes: vec![],
                edges: vec![RawEdge::new("a", "b", "calls")],
            },
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_to_done() {
        let service = QueueService::new(
            vec![
                Ok(r#"{"step": 1, "message": "Code Parsing"}"#.into()),
                Ok("Done".into()),
            ],
            bundle(),
        );
        let orchestrator = JobOrchestrator::new(service, Duration::from_millis(100));
        let handle = orchestrator.start(AnalysisInput::repository("https://example.com/r.git"));

        let snapshot = handle.wait().await;
        assert!(!snapshot.cancelled);
        assert_eq!(snapshot.job.state, JobState::Done);
        assert_eq!(snapshot.job.id.as_deref(), Some("job-1"));
        let results = snapshot.job.result.unwrap();
        assert_eq!(results.graph.edge_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_bundle_is_results_unavailable() {
        let mut bad = bundle();
        bad.nodes.push(GraphNode::new("a", NodeType::Class));
        let service = QueueService::new(vec![Ok("Done".into())], bad);
        let handle = JobOrchestrator::new(service, Duration::from_millis(100))
            .start(AnalysisInput::repository("r"));

        let snapshot = handle.wait().await;
        assert_eq!(snapshot.job.state, JobState::Failed);
        assert_eq!(
            snapshot.job.failure.unwrap().kind,
            FailureKind::ResultsUnavailable
        );
    }

    /// Panics on the first status poll.
    struct PanickingService;

    #[async_trait]
    impl AnalysisService for PanickingService {
        async fn submit(&self, _input: &AnalysisInput) -> Result<String, ServiceError> {
            Ok("job-1".into())
        }

        async fn poll_status(&self, _job_id: &str) -> Result<String, ServiceError> {
            panic!("status backend exploded");
        }

        async fn fetch_results(&self, _job_id: &str) -> Result<ResultsBundle, ServiceError> {
            Ok(bundle())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_service_still_settles() {
        let handle = JobOrchestrator::new(Arc::new(PanickingService), Duration::from_millis(100))
            .start(AnalysisInput::repository("r"));

        let snapshot = tokio::time::timeout(Duration::from_secs(60), handle.wait())
            .await
            .expect("wait returns after the driver panics");
        assert!(!snapshot.cancelled);
        assert_eq!(snapshot.job.state, JobState::Failed);
        let failure = snapshot.job.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Pipeline);
        assert_eq!(failure.message, ABORTED_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_freezes_state() {
        let service = QueueService::new(
            vec![Ok(r#"{"step": 2, "message": "AI Discovery"}"#.into())],
            bundle(),
        );
        let handle = JobOrchestrator::new(service, Duration::from_millis(100))
            .start(AnalysisInput::repository("r"));

        tokio::time::sleep(Duration::from_millis(350)).await;
        let before = handle.job();
        assert_eq!(before.state, JobState::Polling);
        assert_eq!(before.progress_step, 2);

        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.job(), before);
        assert!(handle.is_finished());
    }
}
