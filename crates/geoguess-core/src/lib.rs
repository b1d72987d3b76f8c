//! Shared configuration and domain primitives for the geoguess workspace.

mod app_config;
mod config;
mod error_kind;
mod place_key;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error_kind::ErrorKind;
pub use place_key::PlaceKey;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
