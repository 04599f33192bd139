use anyhow::Result;
use async_trait::async_trait;
use predictoor_agent::application::accuracy::AccuracyAdjuster;
use predictoor_agent::application::agents::model::Prediction;
use predictoor_agent::application::agents::{PredictionAgent, PredictionModel, PredictionReport};
use predictoor_agent::application::discovery::{
    ActiveEndpoints, DiscoveryResolver, DiscoveryService, DiscoveryTarget, RetryPolicy,
};
use predictoor_agent::application::system::{AgentRunner, CycleSteps, Schedule, ScheduledTask};
use predictoor_agent::config::SupervisorEnvConfig;
use predictoor_agent::domain::discovery::{Extraction, Provenance};
use predictoor_agent::domain::feed::Feed;
use predictoor_agent::domain::notification::Severity;
use predictoor_agent::domain::performance::{
    AccuracyEngine, AccuracyPolicy, Direction, PerformanceRecord,
};
use predictoor_agent::infrastructure::core::CircuitState;
use predictoor_agent::infrastructure::mock::{
    AcceptAllVerifier, FixedPriceSource, RecordingNotifier, RecordingRelay, Scripted,
    ScriptedRemoteSource,
};
use predictoor_agent::infrastructure::persistence::{
    DiscoveryCache, FeedConfigStore, PerformanceLogStore,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "predictoor_it_{}_{}_{}",
        label,
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

const CONTRACT: &str = "0x1111111111111111111111111111111111111111";
const RELAYER: &str = "0x2222222222222222222222222222222222222222";
const REGISTRY_URL: &str = "https://registry.example/address.json";
const RELAYERS_URL: &str = "https://relay.example/relayers";

struct AlwaysUp;

impl PredictionModel for AlwaysUp {
    fn predict(&self, feed: &Feed, _price: Decimal) -> Prediction {
        Prediction {
            direction: Direction::Up,
            confidence: feed.confidence,
        }
    }
}

/// Discovery, prediction and accuracy adjustment over real stores.
struct Pipeline {
    discovery: DiscoveryService,
    predictor: PredictionAgent,
    adjuster: AccuracyAdjuster,
}

#[async_trait]
impl CycleSteps for Pipeline {
    async fn discover(&self) -> Result<ActiveEndpoints> {
        self.discovery.resolve_all().await
    }

    async fn predict(&self, _endpoints: &ActiveEndpoints) -> Result<PredictionReport> {
        self.predictor.run_cycle().await
    }

    async fn run_task(&self, task: ScheduledTask, _endpoints: &ActiveEndpoints) -> Result<()> {
        if task == ScheduledTask::AccuracyAdjustment {
            self.adjuster.run().await?;
        }
        Ok(())
    }
}

struct Fixture {
    dir: PathBuf,
    notifier: Arc<RecordingNotifier>,
    log: Arc<PerformanceLogStore>,
    relay: Arc<RecordingRelay>,
}

impl Fixture {
    fn new(label: &str, feeds: Value) -> Self {
        let dir = temp_dir(label);
        std::fs::write(dir.join("feeds.json"), feeds.to_string()).unwrap();
        Self {
            log: Arc::new(PerformanceLogStore::new(dir.join("performance_log.json"))),
            notifier: Arc::new(RecordingNotifier::new()),
            relay: Arc::new(RecordingRelay::new()),
            dir,
        }
    }

    fn target(&self, name: &str, url: &str, extraction: Extraction, cache: DiscoveryCache, fallback: &str) -> DiscoveryTarget {
        DiscoveryTarget {
            name: name.to_string(),
            sources: vec![url.to_string()],
            extraction,
            cache,
            fallback: fallback.to_string(),
        }
    }

    fn runner(&self, source: ScriptedRemoteSource, max_failures: usize) -> AgentRunner {
        let notifier = self.notifier.clone();
        let discovery = DiscoveryService::new(
            DiscoveryResolver::new(
                Arc::new(source),
                notifier.clone(),
                RetryPolicy {
                    attempts: 1,
                    delay: Duration::from_millis(1),
                },
            ),
            self.target(
                "Predictoor contract",
                REGISTRY_URL,
                Extraction::ContractRegistry {
                    networks: vec!["sapphire-mainnet".to_string()],
                    contract_key: "Predictoor".to_string(),
                },
                DiscoveryCache::contract(self.dir.join("active_contracts.json")),
                "0xFALLBACKCONTRACT",
            ),
            self.target(
                "Gelato relayer",
                RELAYERS_URL,
                Extraction::BestRelayer,
                DiscoveryCache::relayer(self.dir.join("gelato_relayer.json")),
                "0xFALLBACKRELAYER",
            ),
            Arc::new(AcceptAllVerifier),
            Arc::new(AcceptAllVerifier),
        );

        let feed_store = Arc::new(FeedConfigStore::new(self.dir.join("feeds.json")));
        let predictor = PredictionAgent::new(
            feed_store.clone(),
            self.log.clone(),
            Arc::new(FixedPriceSource::new().with_price("BTC/USDT", dec!(64000))),
            self.relay.clone(),
            notifier.clone(),
            Box::new(AlwaysUp),
            "0xwallet",
            Duration::from_millis(1),
        );
        let adjuster = AccuracyAdjuster::new(
            AccuracyEngine::new(AccuracyPolicy::default()),
            self.log.clone(),
            feed_store,
            notifier.clone(),
        );

        let hour = Duration::from_secs(3600);
        AgentRunner::new(
            Arc::new(Pipeline {
                discovery,
                predictor,
                adjuster,
            }),
            notifier,
            Schedule {
                prediction_interval: Duration::from_millis(1),
                accuracy_interval: hour,
                jobs_interval: hour,
                claim_interval: hour,
                profit_interval: hour,
            },
            SupervisorEnvConfig {
                max_consecutive_failures: max_failures,
                error_cooldown: Duration::from_millis(1),
                trip_cooldown: Duration::from_millis(20),
            },
        )
    }

    fn feeds(&self) -> Value {
        read(&self.dir.join("feeds.json"))
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.dir).ok();
    }
}

fn read(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn live_source() -> ScriptedRemoteSource {
    ScriptedRemoteSource::new()
        .with(
            REGISTRY_URL,
            Scripted::Body(json!({"sapphire-mainnet": {"Predictoor": CONTRACT}}).to_string()),
        )
        .with(
            RELAYERS_URL,
            Scripted::Body(json!([{"address": RELAYER, "jobsExecuted": 12}]).to_string()),
        )
}

#[tokio::test]
async fn test_cycle_discovers_predicts_and_adjusts() {
    let fixture = Fixture::new(
        "cycle_full",
        json!([
            {"identifier": "BTC/USDT", "confidence": 0.70},
            {"identifier": "ETH/USDT", "confidence": 0.60, "enabled": false}
        ]),
    );
    for i in 0..4 {
        fixture
            .log
            .append(&PerformanceRecord::new("BTC/USDT", Direction::Up, format!("t{}", i)))
            .await
            .unwrap();
    }
    let mut runner = fixture.runner(live_source(), 3);

    let report = runner.run_cycle().await.unwrap();

    assert_eq!(report.endpoints.contract.value, CONTRACT);
    assert_eq!(report.endpoints.contract.source, Provenance::Remote);
    assert_eq!(report.endpoints.relayer.value, RELAYER);
    assert_eq!(report.predictions.submitted, 1);
    assert_eq!(report.predictions.skipped_disabled, 1);
    assert_eq!(report.tasks_run, ScheduledTask::ALL.to_vec());
    assert!(report.tasks_failed.is_empty());

    // Five UP records: accuracy 1.0 raises BTC/USDT by one step.
    assert_eq!(fixture.log.snapshot().await.records("BTC/USDT").len(), 5);
    assert_eq!(fixture.feeds()[0]["confidence"], json!(0.73));
    assert_eq!(fixture.feeds()[1], json!({"identifier": "ETH/USDT", "confidence": 0.60, "enabled": false}));

    let cached = read(&fixture.dir.join("active_contracts.json"));
    assert_eq!(cached["predictoor_contract"], json!(CONTRACT));
    assert_eq!(
        fixture.notifier.with_severity(Severity::Success),
        vec![
            format!("Active Predictoor contract discovered: {}", CONTRACT),
            format!("Active Gelato relayer discovered: {}", RELAYER),
        ]
    );

    // Tasks are not due again within their interval.
    let second = runner.run_cycle().await.unwrap();
    assert!(second.tasks_run.is_empty());
    assert_eq!(fixture.relay.submitted().len(), 2);
}

#[tokio::test]
async fn test_unreachable_discovery_falls_back_and_keeps_predicting() {
    let fixture = Fixture::new("cycle_fallback", json!([{"identifier": "BTC/USDT", "confidence": 0.70}]));
    let mut runner = fixture.runner(ScriptedRemoteSource::new(), 3);

    runner.run_cycles(1).await;

    assert_eq!(runner.breaker().state(), CircuitState::Closed);
    assert_eq!(fixture.relay.submitted().len(), 1);
    assert_eq!(
        fixture.notifier.with_severity(Severity::Critical),
        vec![
            "Using fallback Predictoor contract: 0xFALLBACKCONTRACT".to_string(),
            "Using fallback Gelato relayer: 0xFALLBACKRELAYER".to_string(),
        ]
    );
    assert!(!fixture.dir.join("active_contracts.json").exists());
}

#[tokio::test]
async fn test_repeated_failures_pause_the_agent() {
    let fixture = Fixture::new("cycle_breaker", json!([]));
    // A directory in place of the file makes every read fail with an I/O error.
    std::fs::remove_file(fixture.dir.join("feeds.json")).unwrap();
    std::fs::create_dir(fixture.dir.join("feeds.json")).unwrap();
    let mut runner = fixture.runner(live_source(), 2);

    runner.run_cycles(2).await;

    assert_eq!(runner.breaker().state(), CircuitState::Open);
    let critical = fixture.notifier.with_severity(Severity::Critical);
    assert_eq!(critical.len(), 3);
    assert!(critical[0].starts_with("Unhandled error in agent cycle"));
    assert!(critical[2].starts_with("Agent paused after 2 consecutive failures"));
    assert!(fixture.relay.submitted().is_empty());

    // Operator repairs the file; the trial cycle closes the breaker.
    std::fs::remove_dir(fixture.dir.join("feeds.json")).unwrap();
    std::fs::write(
        fixture.dir.join("feeds.json"),
        json!([{"identifier": "BTC/USDT", "confidence": 0.70}]).to_string(),
    )
    .unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    runner.run_cycles(1).await;

    assert_eq!(runner.breaker().state(), CircuitState::Closed);
    assert_eq!(fixture.relay.submitted().len(), 1);
}
