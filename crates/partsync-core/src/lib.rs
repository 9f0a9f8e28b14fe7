//! Shared domain records and configuration for partsync.
//!
//! The catalog records produced by `partsync-feeds` live here so that the
//! storage, sync, and HTTP crates can depend on them without depending on the
//! XML parser.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod fitment;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, ShopifyConfig};
pub use catalog::CatalogItem;
pub use config::{load_app_config, load_app_config_from_env, log_level_from_env};
pub use fitment::{dedup_fitments, FitmentEntry, FitmentKey};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
