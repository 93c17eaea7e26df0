//! MailRelay - relay one message to the configured backend
//!
//! Sendmail-style entry point: the raw message is read from stdin, the
//! envelope sender and recipients come from the command line.

use clap::Parser;
use mailrelay_common::config::{Config, LoggingConfig};
use mailrelay_common::Envelope;
use mailrelay_core::{build_relay, RelayError};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// sysexits.h
const EX_UNAVAILABLE: u8 = 69;
const EX_IOERR: u8 = 74;
const EX_NOPERM: u8 = 77;
const EX_CONFIG: u8 = 78;

#[derive(Parser, Debug)]
#[command(name = "mailrelay")]
#[command(version, about = "Relay a message from stdin through SES, Pinpoint or SMTP", long_about = None)]
struct Cli {
    /// Configuration file (default: ./mailrelay.toml, then /etc/mailrelay/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Envelope sender
    #[arg(short = 'f', long = "from")]
    from: String,

    /// Peer address recorded in the audit log
    #[arg(long, default_value = "127.0.0.1:0")]
    origin: SocketAddr,

    /// Envelope recipients
    #[arg(required = true)]
    recipients: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("mailrelay: {}", e);
            return ExitCode::from(EX_CONFIG);
        }
    };

    init_logging(&config.logging);

    ExitCode::from(run(cli, &config).await)
}

async fn run(cli: Cli, config: &Config) -> u8 {
    let relay = match build_relay(config).await {
        Ok(relay) => relay,
        Err(e) => {
            error!(code = e.code(), "Failed to build relay: {}", e);
            return EX_CONFIG;
        }
    };

    let mut data = Vec::new();
    if let Err(e) = tokio::io::stdin().read_to_end(&mut data).await {
        error!("Failed to read message from stdin: {}", e);
        return EX_IOERR;
    }

    let envelope = Envelope::new(cli.origin, cli.from, cli.recipients, data);
    match relay.send_envelope(&envelope).await {
        Ok(()) => {
            info!(
                from = %envelope.from,
                recipients = envelope.to.len(),
                "Message relayed"
            );
            0
        }
        Err(RelayError::RecipientsDenied) => {
            info!(
                from = %envelope.from,
                recipients = envelope.to.len(),
                "Message relayed; some recipients were denied"
            );
            0
        }
        Err(e) => {
            let (code, status, text) = e.smtp_reply();
            warn!(
                code = e.code(),
                reply = %format!("{} {} {}", code, status, text),
                "Relay failed: {}",
                e
            );
            exit_code(&e)
        }
    }
}

/// Map a relay outcome to a sysexits code.
/// Denied recipients are dropped, not retried, so the send still succeeds.
fn exit_code(err: &RelayError) -> u8 {
    match err {
        RelayError::SenderDenied => EX_NOPERM,
        RelayError::RecipientsDenied => 0,
        RelayError::Backend(_) => EX_UNAVAILABLE,
    }
}

fn init_logging(config: &LoggingConfig) {
    // RUST_LOG takes precedence over the configured level
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    // stdout is reserved for the audit stream
    if config.format == "json" {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}
