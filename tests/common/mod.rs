//! Shared fixtures for integration tests: a scripted analysis service and
//! a sample results bundle.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use codeforge::api::{AnalysisInput, AnalysisService, ResultsBundle};
use codeforge::error::ServiceError;

// ── Scripted service ───────────────────────────────────────────

/// Fake service answering from a script.
///
/// Status replies are consumed in order; the last one repeats once the
/// script runs out. Panics if two polls are ever in flight at once.
pub struct ScriptedService {
    submit_reply: Result<String, ServiceError>,
    statuses: Mutex<VecDeque<Result<String, ServiceError>>>,
    results_reply: Result<ResultsBundle, ServiceError>,
    poll_delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    submits: AtomicUsize,
    polls: AtomicUsize,
    result_fetches: AtomicUsize,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self {
            submit_reply: Ok("job-1".into()),
            statuses: Mutex::new(VecDeque::new()),
            results_reply: Ok(sample_bundle()),
            poll_delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
            result_fetches: AtomicUsize::new(0),
        }
    }

    pub fn submit_reply(mut self, reply: Result<String, ServiceError>) -> Self {
        self.submit_reply = reply;
        self
    }

    pub fn status(self, raw: impl Into<String>) -> Self {
        self.statuses
            .lock()
            .expect("status script lock")
            .push_back(Ok(raw.into()));
        self
    }

    pub fn status_error(self, error: ServiceError) -> Self {
        self.statuses
            .lock()
            .expect("status script lock")
            .push_back(Err(error));
        self
    }

    pub fn results_reply(mut self, reply: Result<ResultsBundle, ServiceError>) -> Self {
        self.results_reply = reply;
        self
    }

    /// Each poll takes this long to answer.
    pub fn poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn result_fetches(&self) -> usize {
        self.result_fetches.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the poll future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn submit(&self, _input: &AnalysisInput) -> Result<String, ServiceError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.submit_reply.clone()
    }

    async fn poll_status(&self, _job_id: &str) -> Result<String, ServiceError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        assert!(now <= 1, "{} status polls in flight", now);
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.polls.fetch_add(1, Ordering::SeqCst);

        if !self.poll_delay.is_zero() {
            tokio::time::sleep(self.poll_delay).await;
        }

        let mut statuses = self.statuses.lock().expect("status script lock");
        if statuses.len() > 1 {
            statuses.pop_front().expect("non-empty script")
        } else {
            statuses
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ServiceError::Transport("empty script".into())))
        }
    }

    async fn fetch_results(&self, _job_id: &str) -> Result<ResultsBundle, ServiceError> {
        self.result_fetches.fetch_add(1, Ordering::SeqCst);
        self.results_reply.clone()
    }
}

// ── Fixtures ───────────────────────────────────────────────────

/// JSON progress status string.
pub fn progress(step: u8, message: &str) -> String {
    serde_json::json!({ "step": step, "total": 6, "message": message }).to_string()
}

pub const SAMPLE_BUNDLE: &str = r##"{
    "nodes": [
        {"id": "mod_billing", "type": "module", "name": "billing", "language": "python",
         "file": "billing/__init__.py", "line_start": 1, "risk_level": "low", "calls": []},
        {"id": "fn_charge", "type": "function", "name": "charge", "language": "python",
         "file": "billing/charge.py", "line_start": 12, "risk_level": "high",
         "failure_reason": "Retries payment gateway without backoff",
         "calls": ["fn_gateway_post"]},
        {"id": "fn_gateway_post", "type": "api_call", "name": "gateway_post",
         "file": "billing/gateway.py", "line_start": 40, "risk_level": "medium",
         "failure_reason": "No timeout on outbound request", "calls": []},
        {"id": "cls_ledger", "type": "class", "name": "Ledger",
         "file": "billing/ledger.py", "line_start": 5, "risk_level": "low"}
    ],
    "tree_data": {
        "nodes": [
            {"id": "root", "data": {"label": "Codebase"}},
            {"id": "mod_billing"}, {"id": "fn_charge"}, {"id": "fn_gateway_post"}, {"id": "cls_ledger"}
        ],
        "edges": [
            {"id": "e0", "source": "root", "target": "mod_billing", "label": "structural"},
            {"id": "e1", "source": "mod_billing", "target": "fn_charge", "label": "structural"},
            {"id": "e2", "source": "fn_charge", "target": "fn_gateway_post", "label": "calls"},
            {"id": "e3", "source": "fn_charge", "target": "cls_ledger", "label": "dependency"},
            {"id": "e4", "source": "cls_ledger", "target": "fn_charge", "label": "flow"}
        ]
    },
    "stats": {"services": 1, "loc": "2k", "nodes": 4, "edges": 4, "reduction": "1.0x",
              "confidence": "94%"},
    "report": "# Billing depends directly on the payment gateway\n\n## Risks\n..."
}"##;

pub fn sample_bundle() -> ResultsBundle {
    serde_json::from_str(SAMPLE_BUNDLE).expect("sample bundle decodes")
}
