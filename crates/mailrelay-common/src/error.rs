//! Error types for MailRelay

use thiserror::Error;

/// Main error type for MailRelay
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("AWS error: {0}")]
    Aws(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for MailRelay
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Smtp(_) => "SMTP_ERROR",
            Error::Aws(_) => "AWS_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }
}
