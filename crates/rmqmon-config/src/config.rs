use std::time::Duration;

use rmqmon_logging::LogConfig;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One Graphite (carbon) plaintext listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphiteServer {
    pub host: String,

    #[serde(default = "default_graphite_port")]
    pub port: u16,

    /// Namespace every metric path starts with. May itself contain dots.
    #[serde(default)]
    pub prefix: String,
}

/// One RabbitMQ cluster, reached through its management plugin.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct RabbitMqServer {
    pub host: String,

    #[serde(default = "default_management_port")]
    pub port: u16,

    #[serde(default = "default_scheme")]
    pub scheme: String,

    pub username: String,

    pub password: String,

    /// Display name used as the metric namespace segment. Defaults to `host`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,

    /// Virtual host the named queues live in.
    #[serde(default = "default_vhost")]
    pub vhost: String,

    /// Queues to peek individually for a `msg_count-<queue>` metric.
    #[serde(default)]
    pub queues: Vec<String>,
}

impl RabbitMqServer {
    pub fn display_name(&self) -> &str {
        self.cluster_name.as_deref().unwrap_or(&self.host)
    }
}

impl std::fmt::Debug for RabbitMqServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RabbitMqServer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("scheme", &self.scheme)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("cluster_name", &self.cluster_name)
            .field("vhost", &self.vhost)
            .field("queues", &self.queues)
            .finish()
    }
}

/// The whole configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Seconds between cycle starts. Zero runs a single cycle and exits.
    #[serde(default)]
    pub interval_secs: u64,

    /// Bound on establishing each Graphite connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Bound on each management API request.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub graphite_servers: Vec<GraphiteServer>,

    #[serde(default)]
    pub rabbitmq_servers: Vec<RabbitMqServer>,
}

fn default_graphite_port() -> u16 {
    2003
}

fn default_management_port() -> u16 {
    15672
}

fn default_scheme() -> String {
    "http".into()
}

fn default_vhost() -> String {
    "/".into()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0,
            connect_timeout_secs: default_connect_timeout_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            log: LogConfig::default(),
            graphite_servers: Vec::new(),
            rabbitmq_servers: Vec::new(),
        }
    }
}

impl AppConfig {
    /// A complete, valid document pointing at local defaults. Used by
    /// `--dump-default-config`.
    pub fn example() -> Self {
        Self {
            graphite_servers: vec![GraphiteServer {
                host: "localhost".into(),
                port: default_graphite_port(),
                prefix: "rabbitmq".into(),
            }],
            rabbitmq_servers: vec![RabbitMqServer {
                host: "localhost".into(),
                port: default_management_port(),
                scheme: default_scheme(),
                username: "guest".into(),
                password: "guest".into(),
                cluster_name: Some("local".into()),
                vhost: default_vhost(),
                queues: Vec::new(),
            }],
            ..Self::default()
        }
    }

    /// `None` when the collector should run once and exit.
    pub fn interval(&self) -> Option<Duration> {
        if self.interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.interval_secs))
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.graphite_servers.is_empty() {
            return Err(ConfigError::Missing("graphite_servers".into()));
        }
        if self.rabbitmq_servers.is_empty() {
            return Err(ConfigError::Missing("rabbitmq_servers".into()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(invalid("connect_timeout_secs", "must be at least 1"));
        }
        if self.http_timeout_secs == 0 {
            return Err(invalid("http_timeout_secs", "must be at least 1"));
        }

        for (i, sink) in self.graphite_servers.iter().enumerate() {
            if sink.host.trim().is_empty() {
                return Err(invalid(&format!("graphite_servers[{}].host", i), "must not be empty"));
            }
            if sink.port == 0 {
                return Err(invalid(&format!("graphite_servers[{}].port", i), "must not be 0"));
            }
        }

        for (i, source) in self.rabbitmq_servers.iter().enumerate() {
            if source.host.trim().is_empty() {
                return Err(invalid(&format!("rabbitmq_servers[{}].host", i), "must not be empty"));
            }
            if source.port == 0 {
                return Err(invalid(&format!("rabbitmq_servers[{}].port", i), "must not be 0"));
            }
            if source.display_name().trim().is_empty() {
                return Err(invalid(
                    &format!("rabbitmq_servers[{}].cluster_name", i),
                    "must not be empty",
                ));
            }
            if source.queues.iter().any(|q| q.is_empty()) {
                return Err(invalid(
                    &format!("rabbitmq_servers[{}].queues", i),
                    "queue names must not be empty",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.interval_secs, 0);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.http_timeout_secs, 30);
        assert!(config.interval().is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_is_valid() {
        let config = AppConfig::example();
        config.validate().unwrap();
        assert_eq!(config.rabbitmq_servers[0].display_name(), "local");
    }

    #[test]
    fn test_display_name_defaults_to_host() {
        let mut source = AppConfig::example().rabbitmq_servers.remove(0);
        source.cluster_name = None;
        assert_eq!(source.display_name(), "localhost");
    }

    #[test]
    fn test_interval_some_when_nonzero() {
        let config = AppConfig {
            interval_secs: 60,
            ..AppConfig::example()
        };
        assert_eq!(config.interval(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = AppConfig::example();
        config.graphite_servers[0].port = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("graphite_servers[0].port"));
    }

    #[test]
    fn test_validate_rejects_missing_sinks() {
        let mut config = AppConfig::example();
        config.graphite_servers.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_debug_hides_password() {
        let mut source = AppConfig::example().rabbitmq_servers.remove(0);
        source.password = "hunter2".into();
        let rendered = format!("{:?}", source);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
