//! MailRelay Common - Shared types and configuration
//!
//! This crate provides the configuration model, error type and value
//! types shared by the relay core and the `mailrelay` binary.

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{AddressPattern, Envelope};
