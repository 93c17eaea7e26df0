//! Amazon Pinpoint Email backend

use crate::aws::AwsError;
use crate::relay::{OutboundEmail, Transport};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_pinpointemail::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_pinpointemail::operation::send_email::SendEmailError;
use aws_sdk_pinpointemail::primitives::Blob;
use aws_sdk_pinpointemail::types::{Destination, EmailContent, RawMessage};
use aws_sdk_pinpointemail::Client;
use tracing::debug;

const SERVICE: &str = "Pinpoint";

/// Sends raw messages through the Pinpoint Email `SendEmail` API
#[derive(Debug, Clone)]
pub struct PinpointTransport {
    client: Client,
}

impl PinpointTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl Transport for PinpointTransport {
    fn name(&self) -> &'static str {
        "pinpoint"
    }

    async fn deliver(&self, email: &OutboundEmail<'_>) -> anyhow::Result<()> {
        let raw = RawMessage::builder()
            .data(Blob::new(email.raw))
            .build()
            .map_err(|e| AwsError::Build {
                service: SERVICE,
                message: e.to_string(),
            })?;

        let output = self
            .client
            .send_email()
            .set_configuration_set_name(email.configuration_set.map(str::to_string))
            .from_email_address(email.from)
            .destination(
                Destination::builder()
                    .set_to_addresses(Some(email.to.to_vec()))
                    .set_cc_addresses(Some(email.cc.to_vec()))
                    .build(),
            )
            .content(EmailContent::builder().raw(raw).build())
            .send()
            .await
            .map_err(api_error)?;

        debug!(message_id = ?output.message_id(), "Pinpoint accepted message");
        Ok(())
    }
}

fn api_error<R: std::fmt::Debug>(err: SdkError<SendEmailError, R>) -> AwsError {
    if let Some(code) = err.code() {
        return AwsError::Api {
            service: SERVICE,
            code: code.to_string(),
            message: err.message().unwrap_or_default().to_string(),
        };
    }
    AwsError::Request {
        service: SERVICE,
        message: DisplayErrorContext(&err).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_pinpointemail::config::retry::RetryConfig;
    use aws_sdk_pinpointemail::config::{BehaviorVersion, Credentials, Region};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer) -> PinpointTransport {
        let config = aws_sdk_pinpointemail::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(Credentials::new("AKID", "secret", None, None, "test"))
            .endpoint_url(server.uri())
            .retry_config(RetryConfig::disabled())
            .build();
        PinpointTransport::new(Client::from_conf(config))
    }

    #[tokio::test]
    async fn test_deliver_with_carbon_copy() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/email/outbound-emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let to = vec!["bob@example.org".to_string(), "carol@example.org".to_string()];
        let cc = vec!["archive@example.org".to_string()];
        let email = OutboundEmail {
            configuration_set: None,
            from: "alice@example.org",
            to: &to,
            cc: &cc,
            raw: b"Hello",
        };

        let transport = transport(&server);
        assert_eq!(transport.name(), "pinpoint");
        transport.deliver(&email).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(
            sent["Destination"]["ToAddresses"],
            serde_json::json!(["bob@example.org", "carol@example.org"])
        );
        assert_eq!(
            sent["Destination"]["CcAddresses"],
            serde_json::json!(["archive@example.org"])
        );
    }

    #[tokio::test]
    async fn test_deliver_throttled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("x-amzn-ErrorType", "TooManyRequestsException")
                    .set_body_json(serde_json::json!({"message": "Rate exceeded"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let to = vec!["bob@example.org".to_string()];
        let email = OutboundEmail {
            configuration_set: Some("events"),
            from: "alice@example.org",
            to: &to,
            cc: &[],
            raw: b"Hello",
        };

        let err = transport(&server).deliver(&email).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Pinpoint API error TooManyRequestsException: Rate exceeded"
        );
    }
}
