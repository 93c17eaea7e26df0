//! Dispatch Orchestrator - Filter, rewrite, send, log
//!
//! Every backend shares this pipeline; only the `Transport` differs.
//! The return value follows a fixed priority: a failed backend call wins
//! over everything, then the filter's denial, then success.

use super::{OutboundEmail, Relay, Transport};
use crate::audit::{AuditRecord, AuditSink};
use crate::error::RelayError;
use crate::policy::Policy;
use crate::rewrite::prepend_subject;
use async_trait::async_trait;
use mailrelay_common::config::RelayConfig;
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-backend message options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOptions {
    configuration_set: Option<String>,
    subject_prefix: Option<String>,
    carbon_copy: Option<String>,
}

impl DispatchOptions {
    /// Create options; an empty carbon copy means none
    pub fn new(
        configuration_set: Option<String>,
        subject_prefix: Option<String>,
        carbon_copy: Option<String>,
    ) -> Self {
        Self {
            configuration_set,
            subject_prefix,
            carbon_copy: carbon_copy.filter(|cc| !cc.is_empty()),
        }
    }

    /// Build options from the relay configuration
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.configuration_set.clone(),
            config.prepend_subject.clone(),
            config.carbon_copy.clone(),
        )
    }

    pub fn configuration_set(&self) -> Option<&str> {
        self.configuration_set.as_deref()
    }

    pub fn subject_prefix(&self) -> Option<&str> {
        self.subject_prefix.as_deref()
    }

    pub fn carbon_copy(&self) -> Option<&str> {
        self.carbon_copy.as_deref()
    }
}

/// Relay implementation over a destination `Transport`.
///
/// Holds only immutable state, so one instance can serve any number of
/// concurrent sends.
pub struct Dispatcher<T> {
    transport: T,
    policy: Policy,
    options: DispatchOptions,
    cc: Vec<String>,
    audit: Arc<dyn AuditSink>,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a new dispatcher
    pub fn new(
        transport: T,
        policy: Policy,
        options: DispatchOptions,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let cc = options.carbon_copy().map(str::to_string).into_iter().collect();
        Self {
            transport,
            policy,
            options,
            cc,
            audit,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }
}

#[async_trait]
impl<T: Transport> Relay for Dispatcher<T> {
    async fn send(
        &self,
        origin: SocketAddr,
        from: &str,
        to: &[String],
        data: &[u8],
    ) -> Result<(), RelayError> {
        let filtered = self.policy.filter(from, to);

        // Soft signal, returned only if the backend call does not fail
        let denial = filtered.outcome.denial();
        if let Some(ref err) = denial {
            self.audit
                .record(&AuditRecord::new(origin, from, &filtered.denied, Some(err)));
        }

        if filtered.allowed.is_empty() {
            debug!(
                "No recipients left for message from {} via {}, skipping send",
                from,
                self.transport.name()
            );
            return denial.map_or(Ok(()), Err);
        }

        let raw: Cow<'_, [u8]> = match self.options.subject_prefix() {
            Some(prefix) => Cow::Owned(prepend_subject(data, prefix)),
            None => Cow::Borrowed(data),
        };

        let email = OutboundEmail {
            configuration_set: self.options.configuration_set(),
            from,
            to: &filtered.allowed,
            cc: &self.cc,
            raw: &raw,
        };

        let result = self.transport.deliver(&email).await;

        match result {
            Ok(()) => {
                self.audit
                    .record(&AuditRecord::new(origin, from, &filtered.allowed, None));
                debug!(
                    "Relayed message from {} to {} recipient(s) via {}",
                    from,
                    filtered.allowed.len(),
                    self.transport.name()
                );
            }
            Err(e) => {
                self.audit.record(&AuditRecord::new(
                    origin,
                    from,
                    &filtered.allowed,
                    Some(&e),
                ));
                warn!("{} send failed for {}: {}", self.transport.name(), from, e);
                return Err(RelayError::Backend(e));
            }
        }

        denial.map_or(Ok(()), Err)
    }
}
