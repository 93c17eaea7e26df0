//! MailRelay Core - Relay dispatch engine
//!
//! This crate filters envelope addresses, rewrites the Subject header,
//! dispatches to an outbound backend (SES, Pinpoint or SMTP) and writes
//! an audit record for every outcome.

pub mod audit;
pub mod aws;
pub mod backend;
pub mod error;
pub mod policy;
pub mod relay;
pub mod rewrite;

pub use audit::{AuditRecord, AuditSink, JsonSink, MemorySink, TracingSink};
pub use backend::{PinpointTransport, SesTransport, SmtpTransport};
pub use error::RelayError;
pub use policy::{filter_addresses, FilterOutcome, FilterResult, Policy};
pub use relay::{
    build_relay, build_relay_with_sink, DispatchOptions, Dispatcher, OutboundEmail,
    PinpointRelay, Relay, SesRelay, SmtpRelay, Transport,
};
pub use rewrite::prepend_subject;
