//! Sends reports as HTML email through SES.

use crate::core::{DispatchError, Notifier, Report};
use async_trait::async_trait;
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use tracing::{error, info, instrument};

pub struct SesNotifier {
    client: aws_sdk_sesv2::Client,
    from_address: String,
    to_addresses: Vec<String>,
}

impl SesNotifier {
    pub fn new(client: aws_sdk_sesv2::Client, from_address: String, to_addresses: Vec<String>) -> Self {
        Self {
            client,
            from_address,
            to_addresses,
        }
    }

    fn content(&self, data: &str) -> Result<Content, DispatchError> {
        Content::builder()
            .data(data)
            .charset("UTF-8")
            .build()
            .map_err(|e| DispatchError::InvalidMessage {
                channel: self.name().to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl Notifier for SesNotifier {
    fn name(&self) -> &str {
        "email"
    }

    #[instrument(skip_all, fields(from = %self.from_address, recipients = self.to_addresses.len()))]
    async fn deliver(&self, report: &Report) -> Result<(), DispatchError> {
        let message = Message::builder()
            .subject(self.content(&report.subject)?)
            .body(Body::builder().html(self.content(&report.html_body)?).build())
            .build();

        let response = self
            .client
            .send_email()
            .from_email_address(&self.from_address)
            .destination(
                Destination::builder()
                    .set_to_addresses(Some(self.to_addresses.clone()))
                    .build(),
            )
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await;

        match response {
            Ok(output) => {
                info!(
                    message_id = output.message_id().unwrap_or_default(),
                    "Sent report email"
                );
                Ok(())
            }
            Err(e) => {
                let reason = DisplayErrorContext(&e).to_string();
                error!(error = %reason, "SES send failed");
                Err(DispatchError::Delivery {
                    channel: self.name().to_string(),
                    reason,
                })
            }
        }
    }
}
