//! Backend selection

use super::{DispatchOptions, Dispatcher, Relay};
use crate::audit::{sink_for, AuditSink};
use crate::aws::load_sdk_config;
use crate::backend::{PinpointTransport, SesTransport, SmtpTransport};
use crate::policy::Policy;
use mailrelay_common::config::BackendKind;
use mailrelay_common::{Config, Error, Result};
use std::sync::Arc;
use tracing::info;

/// Relay over the SES v2 API
pub type SesRelay = Dispatcher<SesTransport>;

/// Relay over the Pinpoint Email API
pub type PinpointRelay = Dispatcher<PinpointTransport>;

/// Relay forwarding to an upstream SMTP server
pub type SmtpRelay = Dispatcher<SmtpTransport>;

/// Build the relay selected by `relay.backend`
pub async fn build_relay(config: &Config) -> Result<Arc<dyn Relay>> {
    build_relay_with_sink(config, sink_for(config.audit.sink)).await
}

/// Build the configured relay writing audit records to `audit`.
///
/// The AWS SDK client is created once here and shared by every send.
pub async fn build_relay_with_sink(
    config: &Config,
    audit: Arc<dyn AuditSink>,
) -> Result<Arc<dyn Relay>> {
    let policy = Policy::from_config(&config.relay);
    let options = DispatchOptions::from_config(&config.relay);

    info!(
        backend = %config.relay.backend,
        unrestricted = policy.is_unrestricted(),
        "Building relay"
    );

    let relay: Arc<dyn Relay> = match config.relay.backend {
        BackendKind::Ses => {
            let sdk_config = load_sdk_config(&config.aws)
                .await
                .map_err(|e| Error::Aws(e.to_string()))?;
            let transport = SesTransport::from_sdk_config(&sdk_config);
            Arc::new(SesRelay::new(transport, policy, options, audit))
        }
        BackendKind::Pinpoint => {
            let sdk_config = load_sdk_config(&config.aws)
                .await
                .map_err(|e| Error::Aws(e.to_string()))?;
            let transport = PinpointTransport::from_sdk_config(&sdk_config);
            Arc::new(PinpointRelay::new(transport, policy, options, audit))
        }
        BackendKind::Smtp => {
            let transport =
                SmtpTransport::from_config(&config.smtp).map_err(|e| Error::Smtp(e.to_string()))?;
            Arc::new(SmtpRelay::new(transport, policy, options, audit))
        }
    };

    Ok(relay)
}
