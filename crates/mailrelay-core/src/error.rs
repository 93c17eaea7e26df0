//! Relay error taxonomy

use thiserror::Error;

/// Outcome of a failed or partially denied send.
///
/// `SenderDenied` and `RecipientsDenied` are soft: they report a policy
/// decision, and any recipients that passed the policy have already been
/// dispatched when they are returned. `Backend` is hard and carries the
/// destination API error untouched.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("denied sender: sender does not match the allowed emails regexp")]
    SenderDenied,

    #[error("denied recipients: recipients match the denied emails regexp")]
    RecipientsDenied,

    #[error(transparent)]
    Backend(anyhow::Error),
}

impl RelayError {
    /// Whether this is a policy denial rather than a delivery failure
    pub fn is_soft(&self) -> bool {
        matches!(self, RelayError::SenderDenied | RelayError::RecipientsDenied)
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::SenderDenied => "SENDER_DENIED",
            RelayError::RecipientsDenied => "RECIPIENTS_DENIED",
            RelayError::Backend(_) => "BACKEND_ERROR",
        }
    }

    /// SMTP reply (code, enhanced status, text) for a front-end
    pub fn smtp_reply(&self) -> (u16, &'static str, &'static str) {
        match self {
            RelayError::SenderDenied => (550, "5.7.1", "Sender address not allowed"),
            RelayError::RecipientsDenied => (
                250,
                "2.0.0",
                "Message accepted for allowed recipients; denied recipients were dropped",
            ),
            RelayError::Backend(_) => (451, "4.3.0", "Temporary error"),
        }
    }
}
