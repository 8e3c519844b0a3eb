use std::path::Path;

use crate::config::AppConfig;
use crate::ConfigError;

/// On-disk encoding of the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
            Some("json") => Ok(ConfigFormat::Json),
            Some("toml") => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// Parse and validate a configuration document.
pub fn parse(content: &str, format: ConfigFormat) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = match format {
        ConfigFormat::Json => serde_json::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };
    config.validate()?;
    Ok(config)
}

/// Read, parse, and validate the configuration file at `path`.
pub fn load(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse(&content, format)?;

    tracing::debug!(
        path = %path.display(),
        graphite_servers = ?config.graphite_servers,
        rabbitmq_servers = ?config.rabbitmq_servers,
        "Config loaded"
    );
    Ok(config)
}

/// Render a document as TOML.
pub fn render_toml(config: &AppConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const LEGACY_JSON: &str = r#"{
        "graphite_servers": [
            {"host": "graphite.internal", "port": 2003, "prefix": "servers.rabbitmq"}
        ],
        "rabbitmq_servers": [
            {
                "host": "mq1.internal",
                "port": 15672,
                "username": "monitor",
                "password": "secret",
                "vhost": "/",
                "queues": ["orders", "invoices"]
            }
        ]
    }"#;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/b.json")).unwrap(), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("conf.TOML")).unwrap(), ConfigFormat::Toml);
        assert!(matches!(
            ConfigFormat::from_path(Path::new("conf.yaml")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(ConfigFormat::from_path(Path::new("conf")).is_err());
    }

    #[test]
    fn test_parse_legacy_json() {
        let config = parse(LEGACY_JSON, ConfigFormat::Json).unwrap();
        assert_eq!(config.graphite_servers[0].prefix, "servers.rabbitmq");
        let source = &config.rabbitmq_servers[0];
        assert_eq!(source.display_name(), "mq1.internal");
        assert_eq!(source.scheme, "http");
        assert_eq!(source.queues, vec!["orders", "invoices"]);
        assert!(config.interval().is_none());
    }

    #[test]
    fn test_parse_toml_with_defaults() {
        let content = r#"
            interval_secs = 30

            [[graphite_servers]]
            host = "graphite.internal"
            prefix = "rabbitmq"

            [[rabbitmq_servers]]
            host = "mq1.internal"
            username = "monitor"
            password = "secret"
            cluster_name = "prod"
        "#;
        let config = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.interval_secs, 30);
        assert_eq!(config.graphite_servers[0].port, 2003);
        assert_eq!(config.rabbitmq_servers[0].port, 15672);
        assert_eq!(config.rabbitmq_servers[0].vhost, "/");
        assert!(config.rabbitmq_servers[0].queues.is_empty());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(matches!(parse("{not json", ConfigFormat::Json), Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_parse_rejects_missing_credentials() {
        let content = r#"{
            "graphite_servers": [{"host": "g", "prefix": "p"}],
            "rabbitmq_servers": [{"host": "mq"}]
        }"#;
        assert!(parse(content, ConfigFormat::Json).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("rmqmon-config-test-missing").join("absent.json");
        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = std::env::temp_dir().join("rmqmon-config-test-load");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        fs::write(&path, LEGACY_JSON).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config.rabbitmq_servers.len(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_rendered_example_parses_back() {
        let example = AppConfig::example();
        let rendered = render_toml(&example).unwrap();
        let back = parse(&rendered, ConfigFormat::Toml).unwrap();
        assert_eq!(back, example);
    }
}
