//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::config::{Credentials, RequestChecksumCalculation};
use tracing::Level;

use super::S3Settings;

/// Upper bound for a single S3 operation, including the upload body
const S3_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development {
        /// Optional S3-compatible endpoint (`LocalStack`, `MinIO`)
        s3_endpoint_override: Option<String>,
    },
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => {
                let s3_endpoint_override = env::var("S3_ENDPOINT_URL")
                    .ok()
                    .filter(|url| !url.trim().is_empty());

                Self::Development {
                    s3_endpoint_override,
                }
            }
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Whether logs are emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Returns the endpoint URL to use for S3, if it differs from AWS
    #[must_use]
    pub fn s3_endpoint_url(&self) -> Option<&str> {
        match self {
            Self::Production | Self::Staging => None,
            Self::Development {
                s3_endpoint_override,
            } => s3_endpoint_override.as_deref(),
        }
    }

    /// Database connection URL
    #[must_use]
    pub fn database_url(&self) -> String {
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://spic.db?mode=rwc".to_string())
    }

    /// Path of the optional settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        env::var("SETTINGS_PATH")
            .map_or_else(|_| PathBuf::from("settings.yml"), PathBuf::from)
    }

    /// Port the HTTP server listens on
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but is not a valid port number
    pub fn port(&self) -> Result<u16, std::num::ParseIntError> {
        env::var("PORT").map_or(Ok(8001), |p| p.parse())
    }

    /// AWS configuration built from the settings credentials
    ///
    /// Retries are disabled: a failed upload is reported, never replayed.
    pub async fn aws_config(&self, s3: &S3Settings) -> aws_config::SdkConfig {
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(S3_OPERATION_TIMEOUT_SECS))
            .build();

        let credentials = Credentials::new(
            s3.access_key_id.clone(),
            s3.secret_access_key.clone(),
            None,
            None,
            "spic-settings",
        );

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(s3.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.s3_endpoint_url() {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self, s3: &S3Settings) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config(s3).await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // S3-compatible servers address buckets by path and may not accept
        // streaming checksum trailers
        if self.s3_endpoint_url().is_some() {
            builder.set_force_path_style(Some(true));
            builder.set_request_checksum_calculation(Some(
                RequestChecksumCalculation::WhenRequired,
            ));
        }

        builder.build()
    }

    /// Default log level when `RUST_LOG` is not set
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development { .. } => Level::DEBUG,
            })
    }
}
