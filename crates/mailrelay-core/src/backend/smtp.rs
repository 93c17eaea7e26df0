//! SMTP forward backend

use crate::relay::{OutboundEmail, Transport};
use async_trait::async_trait;
use lettre::address::{Address, Envelope};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use mailrelay_common::config::{SmtpConfig, TlsMode};
use std::time::Duration;
use tracing::debug;

/// Header carrying the configuration set through an SES SMTP endpoint
pub const CONFIGURATION_SET_HEADER: &str = "X-SES-CONFIGURATION-SET";

/// Forwards raw messages to an upstream SMTP server
pub struct SmtpTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn from_config(config: &SmtpConfig) -> anyhow::Result<Self> {
        let builder = match config.tls {
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?,
            TlsMode::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?,
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        let mut builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: builder.build(),
        })
    }
}

#[async_trait]
impl Transport for SmtpTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn deliver(&self, email: &OutboundEmail<'_>) -> anyhow::Result<()> {
        let envelope = envelope_for(email)?;
        let message = with_configuration_set(email.raw, email.configuration_set);
        let response = self.mailer.send_raw(&envelope, &message).await?;
        debug!(code = %response.code(), "Upstream accepted message");
        Ok(())
    }
}

/// SMTP envelope: all `to` recipients plus the carbon copy.
/// An empty sender becomes the null reverse-path.
fn envelope_for(email: &OutboundEmail<'_>) -> anyhow::Result<Envelope> {
    let from = if email.from.is_empty() {
        None
    } else {
        Some(email.from.parse::<Address>()?)
    };

    let recipients = email
        .to
        .iter()
        .chain(email.cc.iter())
        .map(|rcpt| rcpt.parse::<Address>())
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Envelope::new(from, recipients)?)
}

fn with_configuration_set(raw: &[u8], configuration_set: Option<&str>) -> Vec<u8> {
    match configuration_set {
        Some(name) => {
            let header = format!("{}: {}\r\n", CONFIGURATION_SET_HEADER, name);
            let mut message = Vec::with_capacity(header.len() + raw.len());
            message.extend_from_slice(header.as_bytes());
            message.extend_from_slice(raw);
            message
        }
        None => raw.to_vec(),
    }
}
