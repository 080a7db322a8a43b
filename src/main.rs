//! AlarmWatch - CloudWatch alarm log relay
//!
//! Runs as an AWS Lambda function subscribed to the alarm's SNS topic, or
//! handles a single saved event with `--event FILE`.

use alarmwatch::{
    cli::Cli,
    config::Config,
    internal_metrics::{self, LoggingRecorder},
    relay::{AlarmRelay, SUCCESS_MESSAGE},
};
use anyhow::{anyhow, Context, Result};
use clap::Parser;
use lambda_runtime::{service_fn, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Initialize logging with defaults to report this specific error
        init_tracing("info");
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    init_tracing(&config.log_level);

    info!("AlarmWatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!(
        "SNS Topic: {}",
        config.notification.topic_arn.as_deref().unwrap_or("Disabled")
    );
    info!(
        "Email: {} -> {}",
        config.notification.from_address.as_deref().unwrap_or("Disabled"),
        config.notification.to_addresses.join(", ")
    );
    info!("Console Region: {}", config.console.region);
    info!(
        "Environment Tag: {}",
        config.report.environment_tag.as_deref().unwrap_or("None")
    );
    info!("Redaction: {:?}", config.report.redaction.strategy);
    info!("Window Multiplier: {}", config.fetch.window_multiplier);
    info!("Max Pages: {}", config.fetch.max_pages);
    if let Some(deadline) = config.fetch.deadline_seconds {
        info!("Fetch Deadline: {}s", deadline);
    }
    info!("-------------------------------------------------------");

    let recorder = if config.metrics.log_metrics {
        Some(internal_metrics::install_logging_recorder()?)
    } else {
        None
    };

    let relay = Arc::new(
        AlarmRelay::builder(config)
            .dry_run(cli.dry_run)
            .build()
            .await?,
    );

    if let Some(path) = &cli.event {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading event file {}", path.display()))?;
        let payload: Value = serde_json::from_str(&raw)
            .with_context(|| format!("parsing event file {}", path.display()))?;
        let result = relay.handle(&payload).await;
        log_snapshot(&recorder);
        let outcome = result?;
        info!(
            alarm = %outcome.alarm_name,
            records = outcome.records,
            delivered = ?outcome.delivered,
            "{}", SUCCESS_MESSAGE
        );
        return Ok(());
    }

    info!("Waiting for Lambda invocations...");
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let relay = relay.clone();
        let recorder = recorder.clone();
        async move {
            info!(request_id = %event.context.request_id, "Invocation received");
            let result = relay.handle(&event.payload).await;
            log_snapshot(&recorder);
            match result {
                Ok(_) => Ok::<_, lambda_runtime::Error>(SUCCESS_MESSAGE.to_string()),
                Err(e) => Err(e.into()),
            }
        }
    }))
    .await
    .map_err(|e| anyhow!("Lambda runtime failed: {}", e))
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        // disable printing the name of the module in every log line.
        .with_target(false)
        // disabling time is handy because CloudWatch will add the ingestion time.
        .without_time()
        .init();
}

fn log_snapshot(recorder: &Option<LoggingRecorder>) {
    if let Some(recorder) = recorder {
        recorder.log_snapshot();
    }
}
