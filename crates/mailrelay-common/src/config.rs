//! Configuration for MailRelay

use crate::types::AddressPattern;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "MAILRELAY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Relay policy and backend selection
    #[serde(default)]
    pub relay: RelayConfig,

    /// AWS API configuration (SES and Pinpoint backends)
    #[serde(default)]
    pub aws: AwsConfig,

    /// SMTP forward configuration (SMTP backend)
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Audit log configuration
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Outbound backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Amazon SES v2 API
    #[default]
    Ses,
    /// Amazon Pinpoint Email API
    Pinpoint,
    /// Plain SMTP forward
    Smtp,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Ses => write!(f, "ses"),
            BackendKind::Pinpoint => write!(f, "pinpoint"),
            BackendKind::Smtp => write!(f, "smtp"),
        }
    }
}

/// Relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Backend used for outbound delivery
    #[serde(default)]
    pub backend: BackendKind,

    /// Configuration set attached to every outbound request
    pub configuration_set: Option<String>,

    /// Senders must match this pattern
    pub allow_from: Option<AddressPattern>,

    /// Recipients must match this pattern
    pub allow_to: Option<AddressPattern>,

    /// Recipients matching this pattern are dropped
    pub deny_to: Option<AddressPattern>,

    /// Prefix inserted into the Subject header
    pub prepend_subject: Option<String>,

    /// Address added as CC on every outbound send
    pub carbon_copy: Option<String>,
}

/// AWS API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Shared config profile; the SDK default chain applies when unset
    pub profile: Option<String>,

    /// Region override; otherwise AWS_REGION or the profile region
    pub region: Option<String>,

    /// Endpoint override (e.g. a VPC endpoint)
    pub endpoint: Option<String>,

    /// Static access key ID, used together with `secret_access_key`
    /// in place of the SDK credential chain
    pub access_key_id: Option<String>,

    /// Static secret access key
    pub secret_access_key: Option<String>,

    /// Session token for static credentials
    pub session_token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: None,
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Transport security for the SMTP forward
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain text
    None,
    /// Upgrade with STARTTLS
    #[default]
    Starttls,
    /// Implicit TLS
    Tls,
}

/// SMTP forward configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Upstream host
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Upstream port
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Username for AUTH
    pub username: Option<String>,

    /// Password for AUTH
    pub password: Option<String>,

    /// Transport security
    #[serde(default)]
    pub tls: TlsMode,

    /// Command timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: None,
            password: None,
            tls: TlsMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Where audit records are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditSinkKind {
    /// JSON lines on stdout, failures on stderr
    #[default]
    Stdio,
    /// Structured tracing events
    Tracing,
}

/// Audit log configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Audit sink
    #[serde(default)]
    pub sink: AuditSinkKind,
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file (explicit or default location)
    /// layered under `MAILRELAY__SECTION__KEY` environment overrides
    pub fn load(path: Option<&Path>) -> crate::Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_paths().into_iter().find(|p| p.exists()),
        };

        let mut builder = ::config::Config::builder();
        match path {
            Some(ref path) => {
                debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(
                    ::config::File::from(path.as_path()).format(::config::FileFormat::Toml),
                );
            }
            None => debug!("No configuration file found, using defaults"),
        }

        let config: Config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| crate::Error::Config(format!("Failed to load config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn default_paths() -> Vec<PathBuf> {
        vec![
            PathBuf::from("./mailrelay.toml"),
            PathBuf::from("/etc/mailrelay/config.toml"),
        ]
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> crate::Result<()> {
        if self.relay.backend == BackendKind::Smtp && self.smtp.host.trim().is_empty() {
            return Err(crate::Error::Config(
                "smtp.host is required for the smtp backend".to_string(),
            ));
        }

        if self.smtp.username.is_some() != self.smtp.password.is_some() {
            return Err(crate::Error::Config(
                "smtp.username and smtp.password must be set together".to_string(),
            ));
        }

        match self.logging.format.as_str() {
            "json" | "text" => {}
            other => {
                return Err(crate::Error::Config(format!(
                    "Unknown log format: {}",
                    other
                )))
            }
        }

        Ok(())
    }
}
