//! HTTP client for the analysis service

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::types::{
    ErrorBody, ReportResponse, ResultsBundle, StatusResponse, SubmitResponse, TreeData,
};
use super::{AnalysisInput, AnalysisService};
use crate::config::ClientConfig;
use crate::error::ServiceError;

/// reqwest-backed [`AnalysisService`]
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    client: Client,
    config: ClientConfig,
}

impl HttpAnalysisClient {
    pub fn new(config: ClientConfig) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ServiceError::Transport(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Layout input graph alone (`/tree/{job_id}`).
    pub async fn fetch_tree(&self, job_id: &str) -> Result<TreeData, ServiceError> {
        self.get_json(&format!("/tree/{}", job_id)).await
    }

    /// Markdown report alone (`/report/{job_id}`).
    pub async fn fetch_report(&self, job_id: &str) -> Result<String, ServiceError> {
        let report: ReportResponse = self.get_json(&format!("/report/{}", job_id)).await?;
        Ok(report.content)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        let url = self.config.endpoint(path);
        debug!(url = %url, "GET");
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }
}

/// Turn a response into `T`, mapping non-success statuses to
/// [`ServiceError::Rejected`] / [`ServiceError::NotFound`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        return Err(if status == StatusCode::NOT_FOUND {
            ServiceError::NotFound(message)
        } else {
            ServiceError::Rejected {
                status: status.as_u16(),
                message,
            }
        });
    }

    serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn submission_form(input: &AnalysisInput) -> Form {
    match input {
        AnalysisInput::Archive { file_name, bytes } => Form::new().part(
            "file",
            Part::bytes(bytes.clone()).file_name(file_name.clone()),
        ),
        AnalysisInput::Repository(url) => Form::new().text("repo_url", url.clone()),
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisClient {
    async fn submit(&self, input: &AnalysisInput) -> Result<String, ServiceError> {
        let url = self.config.endpoint("/analyze");
        let response = self
            .client
            .post(&url)
            .multipart(submission_form(input))
            .send()
            .await?;
        let submitted: SubmitResponse = decode(response).await?;
        info!(job_id = %submitted.job_id, input = %input.describe(), "Analysis submitted");
        Ok(submitted.job_id)
    }

    async fn poll_status(&self, job_id: &str) -> Result<String, ServiceError> {
        let status: StatusResponse = self.get_json(&format!("/status/{}", job_id)).await?;
        Ok(status.status)
    }

    async fn fetch_results(&self, job_id: &str) -> Result<ResultsBundle, ServiceError> {
        self.get_json(&format!("/results/{}", job_id)).await
    }
}
