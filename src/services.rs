//! Encapsulation for setting up external services.

use crate::{
    cloudwatch::CloudWatchLogs,
    config::Config,
    core::Notifier,
    notification::{SesNotifier, SnsNotifier},
};
use aws_config::BehaviorVersion;
use std::sync::Arc;
use tracing::{info, warn};

/// The AWS-backed collaborators of the relay.
pub struct AwsServices {
    pub logs: Arc<CloudWatchLogs>,
    pub notifiers: Vec<Arc<dyn Notifier>>,
}

impl AwsServices {
    /// Resolves credentials and region from the environment and builds a
    /// client per service. Channels without a destination are left out.
    pub async fn load(config: &Config) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        info!(region = ?sdk_config.region(), "Loaded AWS configuration");

        let logs = Arc::new(CloudWatchLogs::new(aws_sdk_cloudwatchlogs::Client::new(
            &sdk_config,
        )));

        let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();
        if config.notification.topic_arn.is_some() {
            notifiers.push(Arc::new(SnsNotifier::new(aws_sdk_sns::Client::new(
                &sdk_config,
            ))));
        } else {
            warn!("No SNS topic configured, broadcast channel disabled.");
        }

        match (
            &config.notification.from_address,
            config.notification.to_addresses.is_empty(),
        ) {
            (Some(from_address), false) => {
                notifiers.push(Arc::new(SesNotifier::new(
                    aws_sdk_sesv2::Client::new(&sdk_config),
                    from_address.clone(),
                    config.notification.to_addresses.clone(),
                )));
            }
            _ => warn!("No email sender or recipients configured, email channel disabled."),
        }

        Self { logs, notifiers }
    }
}
