//! Supervised agent loop.
//!
//! Every failure is handled inside the process: a failed cycle is reported
//! and followed by a short cooldown; repeated failures open a circuit
//! breaker that pauses the loop before a single trial cycle is attempted.

use crate::application::agents::PredictionReport;
use crate::application::discovery::ActiveEndpoints;
use crate::config::{AgentEnvConfig, SupervisorEnvConfig};
use crate::domain::notification::Severity;
use crate::domain::ports::Notifier;
use crate::infrastructure::core::CircuitBreaker;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Work that runs on its own cadence, after the prediction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledTask {
    AccuracyAdjustment,
    JobVerification,
    RewardClaims,
    ProfitTracking,
}

impl ScheduledTask {
    pub const ALL: [ScheduledTask; 4] = [
        ScheduledTask::AccuracyAdjustment,
        ScheduledTask::JobVerification,
        ScheduledTask::RewardClaims,
        ScheduledTask::ProfitTracking,
    ];
}

impl fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScheduledTask::AccuracyAdjustment => "accuracy adjustment",
            ScheduledTask::JobVerification => "job verification",
            ScheduledTask::RewardClaims => "reward claims",
            ScheduledTask::ProfitTracking => "profit tracking",
        };
        f.write_str(name)
    }
}

/// The steps of one agent cycle.
#[async_trait]
pub trait CycleSteps: Send + Sync {
    async fn discover(&self) -> Result<ActiveEndpoints>;
    async fn predict(&self, endpoints: &ActiveEndpoints) -> Result<PredictionReport>;
    async fn run_task(&self, task: ScheduledTask, endpoints: &ActiveEndpoints) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub prediction_interval: Duration,
    pub accuracy_interval: Duration,
    pub jobs_interval: Duration,
    pub claim_interval: Duration,
    pub profit_interval: Duration,
}

impl Schedule {
    pub fn from_config(agent: &AgentEnvConfig) -> Self {
        Self {
            prediction_interval: agent.prediction_interval,
            accuracy_interval: agent.accuracy_interval,
            jobs_interval: agent.jobs_check_interval,
            claim_interval: agent.claim_interval,
            profit_interval: agent.profit_interval,
        }
    }

    fn interval(&self, task: ScheduledTask) -> Duration {
        match task {
            ScheduledTask::AccuracyAdjustment => self.accuracy_interval,
            ScheduledTask::JobVerification => self.jobs_interval,
            ScheduledTask::RewardClaims => self.claim_interval,
            ScheduledTask::ProfitTracking => self.profit_interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub endpoints: ActiveEndpoints,
    pub predictions: PredictionReport,
    pub tasks_run: Vec<ScheduledTask>,
    pub tasks_failed: Vec<ScheduledTask>,
}

pub struct AgentRunner {
    steps: Arc<dyn CycleSteps>,
    notifier: Arc<dyn Notifier>,
    schedule: Schedule,
    supervisor: SupervisorEnvConfig,
    breaker: CircuitBreaker,
    /// Last attempt per task, indexed like `ScheduledTask::ALL`.
    last_run: [Option<Instant>; 4],
}

impl AgentRunner {
    pub fn new(
        steps: Arc<dyn CycleSteps>,
        notifier: Arc<dyn Notifier>,
        schedule: Schedule,
        supervisor: SupervisorEnvConfig,
    ) -> Self {
        let breaker = CircuitBreaker::new(
            "AgentCycle",
            supervisor.max_consecutive_failures,
            supervisor.trip_cooldown,
        );
        Self {
            steps,
            notifier,
            schedule,
            supervisor,
            breaker,
            last_run: [None; 4],
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    fn slot(task: ScheduledTask) -> usize {
        ScheduledTask::ALL
            .iter()
            .position(|t| *t == task)
            .unwrap_or_default()
    }

    /// A task that has never run is due immediately.
    fn is_due(&self, task: ScheduledTask, now: Instant) -> bool {
        match self.last_run[Self::slot(task)] {
            None => true,
            Some(last) => now.duration_since(last) >= self.schedule.interval(task),
        }
    }

    /// One unsupervised cycle. Scheduled task failures are reported but do
    /// not fail the cycle. A task keeps its cadence whatever the outcome, so a
    /// failing task is attempted again only once its interval has elapsed.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let endpoints = self.steps.discover().await?;
        info!(
            "AgentRunner: submitting predictions via relayer {} ({}) using contract {} ({})",
            endpoints.relayer.value, endpoints.relayer.source, endpoints.contract.value, endpoints.contract.source
        );
        let predictions = self.steps.predict(&endpoints).await?;

        let mut tasks_run = Vec::new();
        let mut tasks_failed = Vec::new();
        for task in ScheduledTask::ALL {
            if !self.is_due(task, Instant::now()) {
                continue;
            }
            let outcome = self.steps.run_task(task, &endpoints).await;
            self.last_run[Self::slot(task)] = Some(Instant::now());
            match outcome {
                Ok(()) => tasks_run.push(task),
                Err(e) => {
                    warn!("AgentRunner: {} failed: {:#}", task, e);
                    self.notifier
                        .notify(Severity::Warning, &format!("Scheduled {} failed: {:#}", task, e))
                        .await;
                    tasks_failed.push(task);
                }
            }
        }

        Ok(CycleReport {
            endpoints,
            predictions,
            tasks_run,
            tasks_failed,
        })
    }

    /// One supervised iteration, including the pause that follows it.
    pub async fn step(&mut self) {
        if !self.breaker.try_acquire() {
            tokio::time::sleep(self.breaker.remaining_cooldown()).await;
            return;
        }

        match self.run_cycle().await {
            Ok(report) => {
                self.breaker.record_success();
                info!(
                    "AgentRunner: cycle complete ({} predictions, tasks run: {:?}); next in {:?}",
                    report.predictions.submitted, report.tasks_run, self.schedule.prediction_interval
                );
                tokio::time::sleep(self.schedule.prediction_interval).await;
            }
            Err(e) => {
                error!("AgentRunner: cycle failed: {:#}", e);
                self.notifier
                    .notify(Severity::Critical, &format!("Unhandled error in agent cycle: {:#}", e))
                    .await;

                if self.breaker.record_failure() {
                    self.notifier
                        .notify(
                            Severity::Critical,
                            &format!(
                                "Agent paused after {} consecutive failures; retrying in {:?}",
                                self.breaker.consecutive_failures(),
                                self.supervisor.trip_cooldown
                            ),
                        )
                        .await;
                    tokio::time::sleep(self.supervisor.trip_cooldown).await;
                } else {
                    tokio::time::sleep(self.supervisor.error_cooldown).await;
                }
            }
        }
    }

    /// Run a bounded number of supervised iterations.
    pub async fn run_cycles(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.step().await;
        }
    }

    /// Run until the future is dropped (the binary races it against Ctrl-C).
    pub async fn run_forever(&mut self) {
        self.notifier
            .notify(Severity::Info, "Starting Predictoor agent")
            .await;
        loop {
            self.step().await;
        }
    }
}
