//! Amazon SES v2 backend

use crate::aws::AwsError;
use crate::relay::{OutboundEmail, Transport};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sesv2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sesv2::operation::send_email::SendEmailError;
use aws_sdk_sesv2::primitives::Blob;
use aws_sdk_sesv2::types::{Destination, EmailContent, RawMessage};
use aws_sdk_sesv2::Client;
use tracing::debug;

const SERVICE: &str = "SES";

/// Sends raw messages through the SES v2 `SendEmail` API
#[derive(Debug, Clone)]
pub struct SesTransport {
    client: Client,
}

impl SesTransport {
    /// Wrap an existing client; it is reused for every send
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl Transport for SesTransport {
    fn name(&self) -> &'static str {
        "ses"
    }

    async fn deliver(&self, email: &OutboundEmail<'_>) -> anyhow::Result<()> {
        let raw = RawMessage::builder()
            .data(Blob::new(email.raw))
            .build()
            .map_err(|e| AwsError::Build {
                service: SERVICE,
                message: e.to_string(),
            })?;
        let destination = Destination::builder()
            .set_to_addresses(Some(email.to.to_vec()))
            .set_cc_addresses(Some(email.cc.to_vec()))
            .build();

        let output = self
            .client
            .send_email()
            .set_configuration_set_name(email.configuration_set.map(str::to_string))
            .from_email_address(email.from)
            .destination(destination)
            .content(EmailContent::builder().raw(raw).build())
            .send()
            .await
            .map_err(api_error)?;

        debug!(message_id = ?output.message_id(), "SES accepted message");
        Ok(())
    }
}

fn api_error<R: std::fmt::Debug>(err: SdkError<SendEmailError, R>) -> AwsError {
    match err.code() {
        Some(code) => AwsError::Api {
            service: SERVICE,
            code: code.to_string(),
            message: err.message().unwrap_or_default().to_string(),
        },
        None => AwsError::Request {
            service: SERVICE,
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}
