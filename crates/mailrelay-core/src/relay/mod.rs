//! Relay module
//!
//! `Relay` is the capability the listener calls once per submitted message.
//! `Transport` is the destination-specific outbound call a `Dispatcher`
//! wraps with filtering, rewriting and audit logging.

mod builder;
mod dispatcher;

pub use builder::{build_relay, build_relay_with_sink, PinpointRelay, SesRelay, SmtpRelay};
pub use dispatcher::{DispatchOptions, Dispatcher};

use crate::error::RelayError;
use async_trait::async_trait;
use mailrelay_common::Envelope;
use std::net::SocketAddr;

/// Relay capability consumed by the listener
#[async_trait]
pub trait Relay: Send + Sync {
    /// Filter, rewrite and dispatch one message
    async fn send(
        &self,
        origin: SocketAddr,
        from: &str,
        to: &[String],
        data: &[u8],
    ) -> Result<(), RelayError>;

    /// Dispatch a complete envelope
    async fn send_envelope(&self, envelope: &Envelope) -> Result<(), RelayError> {
        self.send(envelope.origin, &envelope.from, &envelope.to, &envelope.data)
            .await
    }
}

/// A request for the destination API
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundEmail<'a> {
    pub configuration_set: Option<&'a str>,
    pub from: &'a str,
    pub to: &'a [String],
    pub cc: &'a [String],
    pub raw: &'a [u8],
}

/// Destination-specific outbound call
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Perform the outbound send. Errors are passed through untouched.
    async fn deliver(&self, email: &OutboundEmail<'_>) -> anyhow::Result<()>;
}
