//! HTTP client against an in-process fake analysis service.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use codeforge::api::{AnalysisInput, AnalysisService, HttpAnalysisClient};
use codeforge::config::ClientConfig;
use codeforge::error::ServiceError;
use codeforge::job::{JobOrchestrator, JobState};

use common::{progress, SAMPLE_BUNDLE};

// ── Fake service ───────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeState {
    polls: Arc<AtomicUsize>,
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn analyze(mut multipart: Multipart) -> Response {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.unwrap_or_default();
                return Json(json!({
                    "job_id": format!("archive-{}-{}", file_name, bytes.len()),
                    "message": "Analysis started"
                }))
                .into_response();
            }
            Some("repo_url") => {
                let url = field.text().await.unwrap_or_default();
                if url.is_empty() {
                    break;
                }
                return Json(json!({ "job_id": "job-repo", "message": "Analysis started" }))
                    .into_response();
            }
            _ => {}
        }
    }
    error(StatusCode::BAD_REQUEST, "No file or repo_url provided")
}

async fn status(State(state): State<FakeState>, Path(job_id): Path<String>) -> Response {
    if job_id != "job-repo" {
        return error(StatusCode::NOT_FOUND, "Job not found");
    }
    let n = state.polls.fetch_add(1, Ordering::SeqCst);
    let status = if n == 0 {
        progress(2, "AI Discovery")
    } else {
        "Done".to_string()
    };
    Json(json!({ "status": status })).into_response()
}

async fn results(Path(job_id): Path<String>) -> Response {
    match job_id.as_str() {
        "job-repo" => SAMPLE_BUNDLE.into_response(),
        "job-garbled" => "<html>502 Bad Gateway</html>".into_response(),
        _ => error(StatusCode::NOT_FOUND, "Job not found"),
    }
}

async fn tree(Path(_job_id): Path<String>) -> Json<Value> {
    let bundle: Value = serde_json::from_str(SAMPLE_BUNDLE).unwrap_or_default();
    Json(bundle["tree_data"].clone())
}

async fn report(Path(_job_id): Path<String>) -> Json<Value> {
    Json(json!({ "content": "# Billing depends directly on the payment gateway" }))
}

async fn spawn_fake() -> (String, FakeState) {
    let state = FakeState::default();
    let app = Router::new()
        .route("/analyze", post(analyze))
        .route("/status/:job_id", get(status))
        .route("/results/:job_id", get(results))
        .route("/tree/:job_id", get(tree))
        .route("/report/:job_id", get(report))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake service");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake service");
    });
    (format!("http://{}", addr), state)
}

fn client(base_url: &str) -> HttpAnalysisClient {
    let config = ClientConfig::with_base_url(base_url)
        .expect("valid url")
        .request_timeout_ms(2000);
    HttpAnalysisClient::new(config).expect("client")
}

// ── Tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn repository_submission_round_trip() {
    let (url, _state) = spawn_fake().await;
    let client = client(&url);

    let job_id = client
        .submit(&AnalysisInput::repository("https://github.com/acme/billing"))
        .await
        .expect("submit");
    assert_eq!(job_id, "job-repo");

    let first = client.poll_status(&job_id).await.expect("status");
    assert!(first.contains("\"step\":2"));
    assert_eq!(client.poll_status(&job_id).await.expect("status"), "Done");

    let bundle = client.fetch_results(&job_id).await.expect("results");
    let results = bundle.into_results().expect("valid bundle");
    assert_eq!(results.graph.node_count(), 4);
}

#[tokio::test]
async fn archive_upload_sends_file_part() {
    let (url, _state) = spawn_fake().await;
    let input = AnalysisInput::Archive {
        file_name: "project.zip".into(),
        bytes: vec![0x50, 0x4b, 0x03, 0x04, 0, 0],
    };
    let job_id = client(&url).submit(&input).await.expect("submit");
    assert_eq!(job_id, "archive-project.zip-6");
}

#[tokio::test]
async fn rejection_carries_service_message() {
    let (url, _state) = spawn_fake().await;
    let err = client(&url)
        .submit(&AnalysisInput::repository(""))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ServiceError::Rejected {
            status: 400,
            message: "No file or repo_url provided".into()
        }
    );
    assert_eq!(err.user_message(), "No file or repo_url provided");
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let (url, _state) = spawn_fake().await;
    let err = client(&url).poll_status("nope").await.unwrap_err();
    assert_eq!(err, ServiceError::NotFound("Job not found".into()));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn garbled_results_are_a_decode_error() {
    let (url, _state) = spawn_fake().await;
    let err = client(&url).fetch_results("job-garbled").await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn tree_and_report_endpoints() {
    let (url, _state) = spawn_fake().await;
    let client = client(&url);

    let tree = client.fetch_tree("job-repo").await.expect("tree");
    assert_eq!(tree.nodes.len(), 5);
    assert_eq!(tree.edges.len(), 5);

    let report = client.fetch_report("job-repo").await.expect("report");
    assert!(report.starts_with("# Billing"));
}

#[tokio::test]
async fn refused_connection_is_transient() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let err = client(&format!("http://{}", addr))
        .poll_status("job-repo")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)), "got {:?}", err);
    assert!(err.is_transient());
}

#[tokio::test]
async fn orchestrated_job_over_http() {
    let (url, state) = spawn_fake().await;
    let config = ClientConfig::with_base_url(&url)
        .expect("valid url")
        .poll_interval_ms(20);
    let service = Arc::new(HttpAnalysisClient::new(config.clone()).expect("client"));
    let handle = JobOrchestrator::from_config(service, &config)
        .start(AnalysisInput::repository("https://github.com/acme/billing"));

    let snapshot = tokio::time::timeout(Duration::from_secs(10), handle.wait())
        .await
        .expect("job settles");
    assert_eq!(snapshot.job.state, JobState::Done);
    assert_eq!(state.polls.load(Ordering::SeqCst), 2);
    let results = snapshot.job.result.expect("results");
    assert_eq!(results.graph.edge_count(), 4);
}
