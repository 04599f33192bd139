use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use predictoor_agent::application::system::Application;
use predictoor_agent::config::Config;
use predictoor_agent::domain::notification::Severity;
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Predictoor automation agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Supervised loop: discovery, predictions and scheduled tasks until Ctrl-C
    Run,
    /// One cycle of discovery and prediction submission
    Predict,
    /// Reconcile feed confidence against the performance log
    Adjust,
    /// Print per-feed accuracy as JSON
    Report,
    /// Resolve the active contract and relayer
    Discover,
    /// Claim rewards for every configured token
    Claim,
    /// Record today's balance and profit
    Profit,
    /// Register missing automation jobs
    Jobs,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let app = Application::build(config).context("Failed to build application")?;

    match cli.command {
        Commands::Run => {
            app.wallet()?;
            let app = Arc::new(app);
            let notifier = app.notifier.clone();
            let mut runner = app.into_runner();
            tokio::select! {
                _ = runner.run_forever() => {}
                signal = tokio::signal::ctrl_c() => {
                    if let Err(e) = signal {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                    }
                    info!("Shutdown requested");
                    notifier.notify(Severity::Info, "Predictoor agent stopped").await;
                }
            }
        }
        Commands::Predict => {
            let endpoints = app.discovery.resolve_all().await?;
            info!(
                "Using contract {} ({}) and relayer {} ({})",
                endpoints.contract.value,
                endpoints.contract.source,
                endpoints.relayer.value,
                endpoints.relayer.source
            );
            let report = app.predictor()?.run_cycle().await?;
            println!(
                "submitted={} skipped_disabled={} failed={}",
                report.submitted, report.skipped_disabled, report.failed
            );
        }
        Commands::Adjust => {
            let report = app.adjuster.run().await?;
            println!(
                "assessed={} disabled={} saved={}",
                report.assessments.len(),
                report.disabled(),
                report.saved
            );
        }
        Commands::Report => {
            let accuracy = app.adjuster.report().await;
            println!("{}", serde_json::to_string_pretty(&accuracy)?);
        }
        Commands::Discover => {
            let endpoints = app.discovery.resolve_all().await?;
            let output = serde_json::json!({
                "predictoor_contract": {
                    "value": endpoints.contract.value,
                    "source": endpoints.contract.source.to_string(),
                    "verified": endpoints.contract.verified,
                },
                "relayer": {
                    "value": endpoints.relayer.value,
                    "source": endpoints.relayer.source.to_string(),
                    "verified": endpoints.relayer.verified,
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Claim => {
            let outcomes = app.claimer.claim_all(app.wallet()?).await;
            for outcome in outcomes {
                println!(
                    "{}: ok={} earned={}",
                    outcome.token,
                    outcome.succeeded,
                    outcome.earned.map(|e| e.to_string()).unwrap_or_else(|| "-".to_string())
                );
            }
        }
        Commands::Profit => {
            if let Some(entry) = app.profit_tracker.track(app.wallet()?).await? {
                println!("{} balance={} profit={}", entry.date, entry.balance, entry.profit);
            }
        }
        Commands::Jobs => {
            let relayer = app.discovery.resolve_relayer().await?;
            let report = app.job_registrar.sync(&relayer.value).await?;
            println!(
                "active={} registered={} failed={}",
                report.already_active.len(),
                report.registered.len(),
                report.failed.len()
            );
        }
    }

    Ok(())
}
