use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for log files. If None, no file logging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,

    /// Prefix for log file names.
    #[serde(default = "default_prefix")]
    pub file_prefix: String,

    /// Log rotation: "hourly", "daily", "never".
    #[serde(default = "default_rotation")]
    pub rotation: String,

    /// Whether to output JSON format.
    #[serde(default)]
    pub json_format: bool,

    /// Whether to also output to the console (stderr).
    #[serde(default = "default_true")]
    pub console_output: bool,
}

fn default_level() -> String {
    "info".into()
}

fn default_prefix() -> String {
    "rabbitmq-metrics-to-graphite".into()
}

fn default_rotation() -> String {
    "daily".into()
}

fn default_true() -> bool {
    true
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_level(),
            log_dir: None,
            file_prefix: default_prefix(),
            rotation: default_rotation(),
            json_format: false,
            console_output: true,
        }
    }
}

impl LogConfig {
    /// Same config with the level forced to `debug` (the `--verbose` switch).
    pub fn verbose(mut self) -> Self {
        self.level = "debug".into();
        self
    }

    fn rotation_kind(&self) -> rolling::Rotation {
        match self.rotation.as_str() {
            "hourly" => rolling::Rotation::HOURLY,
            "never" => rolling::Rotation::NEVER,
            _ => rolling::Rotation::DAILY,
        }
    }
}

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("cannot create log file appender in {}: {message}", .dir.display())]
    Appender { dir: PathBuf, message: String },

    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Initialize the logging system. Should be called once at program startup.
///
/// `RUST_LOG`, when set, takes precedence over `config.level`. Returns a guard
/// that must be held alive for the duration of the program when file logging
/// is enabled (it flushes the non-blocking writer on drop).
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, LogError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let console_layer: Option<BoxedLayer<_>> = if config.console_output {
        if config.json_format {
            Some(Box::new(fmt::layer().json().with_writer(std::io::stderr)))
        } else {
            Some(Box::new(fmt::layer().with_writer(std::io::stderr)))
        }
    } else {
        None
    };

    let (file_layer, guard): (Option<BoxedLayer<_>>, Option<WorkerGuard>) =
        if let Some(ref log_dir) = config.log_dir {
            let file_appender = rolling::RollingFileAppender::builder()
                .rotation(config.rotation_kind())
                .filename_prefix(&config.file_prefix)
                .filename_suffix("log")
                .build(log_dir)
                .map_err(|e| LogError::Appender {
                    dir: log_dir.clone(),
                    message: e.to_string(),
                })?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer: BoxedLayer<_> = if config.json_format {
                Box::new(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            } else {
                Box::new(fmt::layer().with_ansi(false).with_writer(non_blocking))
            };

            (Some(layer), Some(guard))
        } else {
            (None, None)
        };

    registry
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}
