use super::runner::{AgentRunner, CycleSteps, Schedule, ScheduledTask};
use crate::application::accuracy::AccuracyAdjuster;
use crate::application::agents::{PredictionAgent, PredictionReport, RandomModel};
use crate::application::discovery::{ActiveEndpoints, DiscoveryService};
use crate::application::jobs::JobRegistrar;
use crate::application::monitoring::ProfitTracker;
use crate::application::rewards::RewardsClaimer;
use crate::config::Config;
use crate::domain::discovery::Provenance;
use crate::domain::notification::Severity;
use crate::domain::performance::AccuracyEngine;
use crate::domain::ports::{
    BalanceSource, ClaimService, JobRegistry, Notifier, PredictionRelay, PriceSource, RemoteSource,
};
use crate::infrastructure::binance::BinancePriceSource;
use crate::infrastructure::discovery::HttpRemoteSource;
use crate::infrastructure::explorer::ExplorerBalanceSource;
use crate::infrastructure::gelato::{GelatoJobsClient, GelatoRelaySubmitter};
use crate::infrastructure::notifications::{LogNotifier, TelegramNotifier};
use crate::infrastructure::persistence::{
    FeedConfigStore, PerformanceLogStore, ProfitHistoryStore,
};
use crate::infrastructure::predictoor::PredictoorClaimClient;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Outbound services the agent talks to besides discovery and notifications.
pub struct Adapters {
    pub prices: Arc<dyn PriceSource>,
    pub relay: Arc<dyn PredictionRelay>,
    pub claims: Arc<dyn ClaimService>,
    pub balances: Arc<dyn BalanceSource>,
    pub jobs: Arc<dyn JobRegistry>,
}

impl Adapters {
    /// The HTTP clients for the configured endpoints.
    pub fn http(config: &Config) -> Self {
        let timeout = config.discovery.http_timeout;
        let agent = &config.agent;
        Self {
            prices: Arc::new(BinancePriceSource::new(&agent.price_api_url, timeout)),
            relay: Arc::new(GelatoRelaySubmitter::new(&agent.relay_submit_url, timeout)),
            claims: Arc::new(PredictoorClaimClient::new(agent.predictoor_api_key.clone(), timeout)),
            balances: Arc::new(ExplorerBalanceSource::new(&agent.explorer_api_url, timeout)),
            jobs: Arc::new(GelatoJobsClient::new(
                &agent.gelato_jobs_url,
                agent.gelato_api_key.clone(),
                timeout,
            )),
        }
    }
}

/// Every service of the agent, wired from one [`Config`].
pub struct Application {
    pub config: Config,
    pub notifier: Arc<dyn Notifier>,
    pub discovery: DiscoveryService,
    pub adjuster: AccuracyAdjuster,
    pub claimer: RewardsClaimer,
    pub profit_tracker: ProfitTracker,
    pub job_registrar: JobRegistrar,
    /// Absent without a wallet address.
    predictor: Option<PredictionAgent>,
}

impl Application {
    pub fn build(config: Config) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = match (
            config.notifier.telegram_bot_token.as_deref(),
            config.notifier.telegram_chat_id.as_deref(),
        ) {
            (Some(token), Some(chat_id)) if config.notifier.telegram_enabled() => {
                info!("Notifications: Telegram chat {}", chat_id);
                Arc::new(TelegramNotifier::new(token, chat_id, config.notifier.timeout))
            }
            _ => {
                info!("Notifications: log only (Telegram not configured)");
                Arc::new(LogNotifier)
            }
        };
        let source: Arc<dyn RemoteSource> =
            Arc::new(HttpRemoteSource::new(config.discovery.http_timeout));
        let adapters = Adapters::http(&config);
        Self::build_with(config, source, notifier, adapters)
    }

    /// Wire the application around explicit collaborators.
    pub fn build_with(
        config: Config,
        source: Arc<dyn RemoteSource>,
        notifier: Arc<dyn Notifier>,
        adapters: Adapters,
    ) -> Result<Self> {
        let storage = &config.storage;
        let agent = &config.agent;

        let feed_store = Arc::new(FeedConfigStore::new(&storage.feeds_path));
        let log_store = Arc::new(PerformanceLogStore::new(&storage.performance_log_path));

        let discovery =
            DiscoveryService::from_config(&config.discovery, storage, source, notifier.clone());

        let adjuster = AccuracyAdjuster::new(
            AccuracyEngine::new(config.accuracy.policy),
            log_store.clone(),
            feed_store.clone(),
            notifier.clone(),
        );

        let claimer = RewardsClaimer::new(
            adapters.claims,
            notifier.clone(),
            agent.claim_targets.clone(),
            agent.claim_pacing,
        );

        let profit_tracker = ProfitTracker::new(
            adapters.balances,
            Arc::new(ProfitHistoryStore::new(&storage.profit_log_path)),
            notifier.clone(),
        );

        let job_registrar = JobRegistrar::new(
            adapters.jobs,
            feed_store.clone(),
            notifier.clone(),
            agent.job_trigger_interval_secs,
        );

        let predictor = config.require_wallet().ok().map(|wallet| {
            PredictionAgent::new(
                feed_store.clone(),
                log_store.clone(),
                adapters.prices,
                adapters.relay,
                notifier.clone(),
                Box::new(RandomModel),
                wallet,
                agent.submission_pacing,
            )
        });

        Ok(Self {
            notifier,
            discovery,
            adjuster,
            claimer,
            profit_tracker,
            job_registrar,
            predictor,
            config,
        })
    }

    pub fn predictor(&self) -> Result<&PredictionAgent> {
        self.predictor
            .as_ref()
            .ok_or_else(|| anyhow!("WALLET_ADDRESS is not set; predictions are disabled"))
    }

    pub fn wallet(&self) -> Result<&str> {
        self.config.require_wallet()
    }

    /// Supervised runner over this application.
    pub fn into_runner(self: Arc<Self>) -> AgentRunner {
        let schedule = Schedule::from_config(&self.config.agent);
        let supervisor = self.config.supervisor;
        let notifier = self.notifier.clone();
        AgentRunner::new(self, notifier, schedule, supervisor)
    }
}

#[async_trait]
impl CycleSteps for Application {
    async fn discover(&self) -> Result<ActiveEndpoints> {
        self.discovery.resolve_all().await
    }

    async fn predict(&self, _endpoints: &ActiveEndpoints) -> Result<PredictionReport> {
        self.predictor()?.run_cycle().await
    }

    async fn run_task(&self, task: ScheduledTask, endpoints: &ActiveEndpoints) -> Result<()> {
        match task {
            ScheduledTask::AccuracyAdjustment => {
                self.adjuster.run().await?;
            }
            ScheduledTask::JobVerification => {
                // Jobs registered against the placeholder address would never execute.
                if endpoints.relayer.source == Provenance::Fallback {
                    warn!(
                        "Application: relayer unresolved (fallback {}), skipping job verification",
                        endpoints.relayer.value
                    );
                    self.notifier
                        .notify(
                            Severity::Warning,
                            &format!(
                                "Job verification skipped: relayer unresolved, fallback {} in use",
                                endpoints.relayer.value
                            ),
                        )
                        .await;
                    return Ok(());
                }
                self.job_registrar.sync(&endpoints.relayer.value).await?;
            }
            ScheduledTask::RewardClaims => {
                let outcomes = self.claimer.claim_all(self.wallet()?).await;
                let failed = outcomes.iter().filter(|o| !o.succeeded).count();
                if failed > 0 {
                    anyhow::bail!("{} claim(s) failed", failed);
                }
            }
            ScheduledTask::ProfitTracking => {
                if self.profit_tracker.track(self.wallet()?).await?.is_none() {
                    anyhow::bail!("wallet balance unavailable");
                }
            }
        }
        Ok(())
    }
}
