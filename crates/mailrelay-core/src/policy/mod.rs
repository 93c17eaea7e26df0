//! Address Policy Module
//!
//! Decides which senders may relay and which recipients an outbound
//! message is dispatched to.

mod filter;

pub use filter::{filter_addresses, FilterOutcome, FilterResult, Policy};
