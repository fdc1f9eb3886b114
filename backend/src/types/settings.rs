//! Application settings loaded once at startup
//!
//! Values come from a YAML settings file when it exists, otherwise from one
//! environment variable per key. The two sources are never mixed.

use std::{env, fmt, fs, io, path::Path};

use serde::Deserialize;
use strum::{Display, EnumString};
use subtle::ConstantTimeEq;
use thiserror::Error;

const DEFAULT_S3_REGION: &str = "us-east-1";
const DEFAULT_S3_HOST: &str = "s3.amazonaws.com";

/// Result type for settings loading
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file exists but could not be read
    #[error("Failed to read settings file: {0}")]
    Read(#[from] io::Error),

    /// Settings file is not valid YAML
    #[error("Failed to parse settings file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A required value is missing or empty
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// Unknown upload backend name
    #[error("Invalid upload backend: {0}")]
    InvalidBackend(String),

    /// Secret that cannot be a single path segment
    #[error("Secret must not contain '/'")]
    InvalidSecret,
}

/// Upload backend selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendKind {
    /// Direct object storage upload
    #[default]
    S3,
    /// Photo-host upload using a persisted access token
    Flickr,
}

/// Object storage credentials and addressing
#[derive(Clone, PartialEq, Eq)]
pub struct S3Settings {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket receiving uploads
    pub bucket: String,
    /// Bucket region
    pub region: String,
    /// Host used to build public URLs, e.g. `s3.amazonaws.com`
    pub host: String,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("access_key_id", &"[redacted]")
            .field("secret_access_key", &"[redacted]")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("host", &self.host)
            .finish()
    }
}

/// Photo-host API credentials
#[derive(Clone, PartialEq, Eq)]
pub struct FlickrSettings {
    /// API key
    pub key: String,
    /// API shared secret used to sign requests
    pub secret: String,
}

impl fmt::Debug for FlickrSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlickrSettings")
            .field("key", &self.key)
            .field("secret", &"[redacted]")
            .finish()
    }
}

/// Backend-specific settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSettings {
    /// Object storage
    S3(S3Settings),
    /// Photo host
    Flickr(FlickrSettings),
}

/// Immutable process-wide settings
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    secret: String,
    backend: BackendSettings,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("secret", &"[redacted]")
            .field("backend", &self.backend)
            .finish()
    }
}

impl Settings {
    /// Creates settings from already validated parts
    #[must_use]
    pub const fn new(secret: String, backend: BackendSettings) -> Self {
        Self { secret, backend }
    }

    /// Loads settings from `path` if the file exists, otherwise from the environment
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file cannot be read or parsed, or if a value
    /// required by the selected backend is missing
    pub fn load(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();

        let raw = if path.exists() {
            tracing::info!("Loading settings from {}", path.display());
            let contents = fs::read_to_string(path)?;
            serde_yaml::from_str::<RawSettings>(&contents)?
        } else {
            tracing::info!(
                "Settings file {} not found, reading environment",
                path.display()
            );
            RawSettings::from_env()
        };

        raw.validate()
    }

    /// Compares a submitted credential with the shared secret in constant time
    #[must_use]
    pub fn verify_secret(&self, candidate: &str) -> bool {
        candidate.as_bytes().ct_eq(self.secret.as_bytes()).into()
    }

    /// The shared secret, for embedding in the secret-holder's own forms
    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Backend-specific settings
    #[must_use]
    pub const fn backend(&self) -> &BackendSettings {
        &self.backend
    }

    /// Which upload backend is configured
    #[must_use]
    pub const fn backend_kind(&self) -> BackendKind {
        match self.backend {
            BackendSettings::S3(_) => BackendKind::S3,
            BackendSettings::Flickr(_) => BackendKind::Flickr,
        }
    }
}

/// Settings as found in the file or environment, before validation
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    s3_access_key_id: Option<String>,
    s3_secret_access_key: Option<String>,
    s3_bucket: Option<String>,
    s3_region: Option<String>,
    s3_host: Option<String>,
    secret: Option<String>,
    flickr_key: Option<String>,
    flickr_secret: Option<String>,
    backend: Option<String>,
}

impl RawSettings {
    fn from_env() -> Self {
        Self {
            s3_access_key_id: env::var("S3_KEY").ok(),
            s3_secret_access_key: env::var("S3_SECRET").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_host: env::var("S3_HOST").ok(),
            secret: env::var("SECRET").ok(),
            flickr_key: env::var("FLICKR_KEY").ok(),
            flickr_secret: env::var("FLICKR_SECRET").ok(),
            backend: env::var("UPLOAD_BACKEND").ok(),
        }
    }

    fn validate(self) -> SettingsResult<Settings> {
        let kind = match present(self.backend) {
            Some(name) => name
                .trim()
                .parse::<BackendKind>()
                .map_err(|_| SettingsError::InvalidBackend(name))?,
            None => BackendKind::default(),
        };

        let secret = required(self.secret, "secret")?;
        if secret.contains('/') {
            return Err(SettingsError::InvalidSecret);
        }

        let backend = match kind {
            BackendKind::S3 => BackendSettings::S3(S3Settings {
                access_key_id: required(self.s3_access_key_id, "s3_access_key_id")?,
                secret_access_key: required(self.s3_secret_access_key, "s3_secret_access_key")?,
                bucket: required(self.s3_bucket, "s3_bucket")?,
                region: present(self.s3_region).unwrap_or_else(|| DEFAULT_S3_REGION.to_string()),
                host: present(self.s3_host).unwrap_or_else(|| DEFAULT_S3_HOST.to_string()),
            }),
            BackendKind::Flickr => BackendSettings::Flickr(FlickrSettings {
                key: required(self.flickr_key, "flickr_key")?,
                secret: required(self.flickr_secret, "flickr_secret")?,
            }),
        };

        Ok(Settings::new(secret, backend))
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(value: Option<String>, key: &'static str) -> SettingsResult<String> {
    present(value).ok_or(SettingsError::Missing(key))
}
