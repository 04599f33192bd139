//! Gelato automation jobs API: list and register recurring prediction jobs.

use crate::domain::ports::{JobRegistry, JobRequest, RegisteredJob};
use crate::infrastructure::core::http_client_factory::HttpClientFactory;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct JobList {
    #[serde(default)]
    jobs: Vec<RegisteredJob>,
}

pub struct GelatoJobsClient {
    reads: ClientWithMiddleware,
    writes: Client,
    jobs_url: String,
    api_key: Option<String>,
}

impl GelatoJobsClient {
    pub fn new(jobs_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            reads: HttpClientFactory::create_client(timeout),
            writes: HttpClientFactory::create_plain_client(timeout),
            jobs_url: jobs_url.into(),
            api_key,
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.as_deref().unwrap_or_default())
    }
}

#[async_trait]
impl JobRegistry for GelatoJobsClient {
    async fn list_jobs(&self) -> Result<Vec<RegisteredJob>> {
        let response = self
            .reads
            .get(&self.jobs_url)
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .send()
            .await
            .context("Failed to fetch Gelato jobs")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Gelato jobs API error ({}): {}", status, error_text);
        }

        let list: JobList = response
            .json()
            .await
            .context("Failed to parse Gelato job list")?;
        Ok(list.jobs)
    }

    async fn register(&self, job: &JobRequest) -> Result<Option<String>> {
        let response = self
            .writes
            .post(&self.jobs_url)
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .json(job)
            .send()
            .await
            .with_context(|| format!("Failed to register Gelato job {}", job.name))?;

        if response.status() != reqwest::StatusCode::OK {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            bail!("Job registration rejected ({}): {}", status, error_text);
        }

        let body: Value = response.json().await.unwrap_or(Value::Null);
        Ok(body.get("id").map(|id| match id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }
}
