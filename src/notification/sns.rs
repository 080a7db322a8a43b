//! Publishes reports to an SNS topic.

use crate::core::{DispatchError, Notifier, Report};
use async_trait::async_trait;
use aws_sdk_sns::error::DisplayErrorContext;
use tracing::{error, info, instrument};

/// SNS requires subjects shorter than 100 characters.
const MAX_SUBJECT_CHARS: usize = 99;

pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
}

impl SnsNotifier {
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    fn name(&self) -> &str {
        "sns"
    }

    #[instrument(skip_all, fields(topic = report.destination.as_deref().unwrap_or_default()))]
    async fn deliver(&self, report: &Report) -> Result<(), DispatchError> {
        let topic_arn = report
            .destination
            .as_deref()
            .ok_or_else(|| DispatchError::MissingDestination {
                channel: self.name().to_string(),
            })?;

        let response = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .subject(sns_subject(&report.subject))
            .message(&report.html_body)
            .send()
            .await;

        match response {
            Ok(output) => {
                info!(
                    message_id = output.message_id().unwrap_or_default(),
                    "Published report to SNS"
                );
                Ok(())
            }
            Err(e) => {
                let reason = DisplayErrorContext(&e).to_string();
                error!(error = %reason, "SNS publish failed");
                Err(DispatchError::Delivery {
                    channel: self.name().to_string(),
                    reason,
                })
            }
        }
    }
}

/// Fits a subject within SNS limits: single line, fewer than 100 characters.
fn sns_subject(subject: &str) -> String {
    subject
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(MAX_SUBJECT_CHARS)
        .collect()
}
