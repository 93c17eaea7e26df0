//! Shared AWS SDK configuration for the SES v2 and Pinpoint Email backends
//!
//! Credentials and region come from the standard AWS provider chain
//! (environment, shared config/credentials profiles, web identity, ECS and
//! EC2 instance metadata). The `[aws]` section only overrides it.

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_sdk_sesv2::config::Credentials;
use mailrelay_common::config::AwsConfig;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Provider name reported for credentials taken from the config file
const CONFIG_PROVIDER: &str = "mailrelay-config";

/// Errors raised by the AWS backends
#[derive(Error, Debug)]
pub enum AwsError {
    #[error("{service} API error {code}: {message}")]
    Api {
        service: &'static str,
        code: String,
        message: String,
    },

    #[error("{service} request failed: {message}")]
    Request {
        service: &'static str,
        message: String,
    },

    #[error("AWS region error: {0}")]
    Region(String),

    #[error("Invalid {service} request: {message}")]
    Build {
        service: &'static str,
        message: String,
    },
}

/// Resolve the shared SDK configuration.
///
/// Retries are disabled: a failed send is reported once to the caller.
pub async fn load_sdk_config(config: &AwsConfig) -> Result<SdkConfig, AwsError> {
    let sdk_config = loader_for(config).load().await;
    ensure_region(&sdk_config)?;
    debug!(region = ?sdk_config.region(), "Loaded AWS configuration");
    Ok(sdk_config)
}

fn loader_for(config: &AwsConfig) -> ConfigLoader {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::disabled())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(Duration::from_secs(config.timeout_secs))
                .build(),
        );

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key_id,
            secret_access_key,
            config.session_token.clone(),
            None,
            CONFIG_PROVIDER,
        ));
    }
    loader
}

/// A region is needed to pick the regional endpoint
fn ensure_region(config: &SdkConfig) -> Result<(), AwsError> {
    match config.region() {
        Some(_) => Ok(()),
        None => Err(AwsError::Region(
            "no region configured (set aws.region, AWS_REGION or a profile region)".to_string(),
        )),
    }
}
