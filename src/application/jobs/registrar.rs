use crate::domain::feed::{feed_from_job_name, job_name};
use crate::domain::notification::Severity;
use crate::domain::ports::{JobRegistry, JobRequest, JobTrigger, Notifier, TaskSpec};
use crate::infrastructure::persistence::FeedConfigStore;
use anyhow::{Context, Result};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSyncReport {
    pub already_active: Vec<String>,
    pub registered: Vec<String>,
    pub failed: Vec<String>,
}

/// Ensures every enabled feed has a recurring automation job.
pub struct JobRegistrar {
    registry: Arc<dyn JobRegistry>,
    feed_store: Arc<FeedConfigStore>,
    notifier: Arc<dyn Notifier>,
    trigger_interval_secs: u64,
}

impl JobRegistrar {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        feed_store: Arc<FeedConfigStore>,
        notifier: Arc<dyn Notifier>,
        trigger_interval_secs: u64,
    ) -> Self {
        Self {
            registry,
            feed_store,
            notifier,
            trigger_interval_secs,
        }
    }

    fn request_for(&self, feed: &str, relayer: &str) -> JobRequest {
        JobRequest {
            name: job_name(feed),
            task_spec: TaskSpec {
                exec_address: relayer.to_string(),
                exec_data: json!({ "feed": feed }).to_string(),
            },
            trigger: JobTrigger {
                interval: self.trigger_interval_secs,
            },
        }
    }

    /// Register missing jobs against `relayer`.
    ///
    /// Fails only when the job list or feed configuration cannot be read.
    pub async fn sync(&self, relayer: &str) -> Result<JobSyncReport> {
        let existing = match self.registry.list_jobs().await {
            Ok(jobs) => jobs,
            Err(e) => {
                self.notifier
                    .notify(Severity::Warning, &format!("Failed to fetch jobs: {:#}", e))
                    .await;
                return Err(e).context("Failed to list automation jobs");
            }
        };
        let active: HashSet<String> = existing
            .iter()
            .filter_map(|job| feed_from_job_name(&job.name))
            .collect();

        let document = self
            .feed_store
            .load_or_empty()
            .context("Failed to load feed configuration")?;

        let mut report = JobSyncReport::default();
        for feed in document.enabled_feeds() {
            let identifier = feed.identifier.clone();
            if active.contains(&identifier) {
                self.notifier
                    .notify(Severity::Info, &format!("{} still active on Gelato", identifier))
                    .await;
                report.already_active.push(identifier);
                continue;
            }

            match self.registry.register(&self.request_for(&identifier, relayer)).await {
                Ok(id) => {
                    let id = id.unwrap_or_else(|| "unknown id".to_string());
                    self.notifier
                        .notify(
                            Severity::Success,
                            &format!("Gelato job registered for {}: {}", identifier, id),
                        )
                        .await;
                    report.registered.push(identifier);
                }
                Err(e) => {
                    self.notifier
                        .notify(
                            Severity::Warning,
                            &format!("Job registration failed for {}: {:#}", identifier, e),
                        )
                        .await;
                    report.failed.push(identifier);
                }
            }
        }

        info!(
            "JobRegistrar: {} active, {} registered, {} failed",
            report.already_active.len(),
            report.registered.len(),
            report.failed.len()
        );
        Ok(report)
    }
}
