//! Address Filter - Partitions recipients by the relay policy
//!
//! The sender is checked first against `allow_from`; a denied sender stops
//! evaluation. Each recipient is then checked against `allow_to` and
//! `deny_to` in submission order. A pattern that is not configured never
//! restricts its axis.

use crate::error::RelayError;
use mailrelay_common::config::RelayConfig;
use mailrelay_common::AddressPattern;
use tracing::debug;

/// Sender and recipient restrictions of one relay instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Policy {
    /// Senders must match this pattern
    pub allow_from: Option<AddressPattern>,
    /// Recipients must match this pattern
    pub allow_to: Option<AddressPattern>,
    /// Recipients matching this pattern are denied
    pub deny_to: Option<AddressPattern>,
}

impl Policy {
    /// Create a new policy
    pub fn new(
        allow_from: Option<AddressPattern>,
        allow_to: Option<AddressPattern>,
        deny_to: Option<AddressPattern>,
    ) -> Self {
        Self {
            allow_from,
            allow_to,
            deny_to,
        }
    }

    /// Build the policy from the relay configuration
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(
            config.allow_from.clone(),
            config.allow_to.clone(),
            config.deny_to.clone(),
        )
    }

    /// Whether no axis is restricted
    pub fn is_unrestricted(&self) -> bool {
        self.allow_from.is_none() && self.allow_to.is_none() && self.deny_to.is_none()
    }

    /// Apply this policy to an envelope
    pub fn filter(&self, from: &str, to: &[String]) -> FilterResult {
        filter_addresses(
            from,
            to,
            self.allow_from.as_ref(),
            self.allow_to.as_ref(),
            self.deny_to.as_ref(),
        )
    }
}

/// Overall filter decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Nothing was denied
    Clean,
    /// The sender failed `allow_from`; no recipient was evaluated
    SenderDenied,
    /// At least one recipient was denied
    SomeRecipientsDenied,
}

impl FilterOutcome {
    /// The soft error reported for this outcome, if any
    pub fn denial(self) -> Option<RelayError> {
        match self {
            FilterOutcome::Clean => None,
            FilterOutcome::SenderDenied => Some(RelayError::SenderDenied),
            FilterOutcome::SomeRecipientsDenied => Some(RelayError::RecipientsDenied),
        }
    }
}

/// Recipients split by the policy, each list in submission order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    pub allowed: Vec<String>,
    pub denied: Vec<String>,
    pub outcome: FilterOutcome,
}

impl FilterResult {
    fn sender_denied() -> Self {
        Self {
            allowed: Vec::new(),
            denied: Vec::new(),
            outcome: FilterOutcome::SenderDenied,
        }
    }
}

/// Partition `to` into allowed and denied recipients.
///
/// Pure function: no I/O, no side effects beyond debug logging.
pub fn filter_addresses(
    from: &str,
    to: &[String],
    allow_from: Option<&AddressPattern>,
    allow_to: Option<&AddressPattern>,
    deny_to: Option<&AddressPattern>,
) -> FilterResult {
    if let Some(pattern) = allow_from {
        if !pattern.is_match(from) {
            debug!("Sender {} does not match allow_from {}", from, pattern);
            return FilterResult::sender_denied();
        }
    }

    let (allowed, denied): (Vec<String>, Vec<String>) =
        to.iter().cloned().partition(|recipient| {
            let permitted = allow_to.map_or(true, |p| p.is_match(recipient))
                && !deny_to.map_or(false, |p| p.is_match(recipient));
            if !permitted {
                debug!("Recipient {} denied by policy", recipient);
            }
            permitted
        });

    let outcome = if denied.is_empty() {
        FilterOutcome::Clean
    } else {
        FilterOutcome::SomeRecipientsDenied
    };

    FilterResult {
        allowed,
        denied,
        outcome,
    }
}
