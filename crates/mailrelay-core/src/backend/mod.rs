//! Outbound backends
//!
//! Each backend implements [`Transport`](crate::relay::Transport) and is
//! wrapped by a [`Dispatcher`](crate::relay::Dispatcher).

mod pinpoint;
mod ses;
mod smtp;

pub use pinpoint::PinpointTransport;
pub use ses::SesTransport;
pub use smtp::SmtpTransport;
