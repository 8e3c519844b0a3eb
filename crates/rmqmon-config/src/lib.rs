//! Configuration for the RabbitMQ to Graphite collector.
//!
//! The document lists the Graphite backends to write to and the RabbitMQ
//! clusters to poll. Keys match the JSON files the tool has always read, so
//! `{"graphite_servers": [...], "rabbitmq_servers": [...]}` loads unchanged;
//! TOML with the same keys is accepted too.

pub mod config;
pub mod loader;

pub use config::{AppConfig, GraphiteServer, RabbitMqServer};
pub use loader::{load, parse, render_toml, ConfigFormat};

use std::path::PathBuf;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML render error: {0}")]
    TomlRender(#[from] toml::ser::Error),

    #[error("unsupported config format for {} (expected .json or .toml)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("missing required field: {0}")]
    Missing(String),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}
