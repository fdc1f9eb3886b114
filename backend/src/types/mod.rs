mod environment;
mod error;
mod settings;

pub use environment::Environment;
pub use error::AppError;
pub use settings::{BackendKind, BackendSettings, FlickrSettings, S3Settings, Settings, SettingsError};
