use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rmqmon_collector::{run_service, shutdown_signal, CycleOrchestrator, HttpClientFactory};
use rmqmon_config::AppConfig;
use rmqmon_logging::{init_logging, LogConfig};

/// Send RabbitMQ management statistics to Graphite
#[derive(Parser, Debug)]
#[command(name = "rabbitmq-metrics-to-graphite", version, about)]
struct Args {
    /// Path to the config file (.json or .toml)
    #[arg(required_unless_present = "dump_default_config")]
    config: Option<PathBuf>,

    /// Log at debug level, including every sample sent
    #[arg(short, long)]
    verbose: bool,

    /// Run a single cycle even if an interval is configured
    #[arg(long)]
    once: bool,

    /// Print an example configuration as TOML and exit
    #[arg(long)]
    dump_default_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.dump_default_config {
        return match rmqmon_config::render_toml(&AppConfig::example()) {
            Ok(rendered) => {
                print!("{}", rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("ERROR: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    // Anything that escapes `run` ends here: log it and exit non-zero.
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let path = args.config.context("no config file given")?;
    let loaded = rmqmon_config::load(&path);

    let log = match &loaded {
        Ok(config) => config.log.clone(),
        Err(_) => LogConfig::default(),
    };
    let log = if args.verbose { log.verbose() } else { log };
    let _guard = match init_logging(&log) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cannot initialize logging: {}", e);
            None
        }
    };

    let config = loaded.with_context(|| {
        format!(
            "You must pass an existing, valid config file, actual is {}",
            path.display()
        )
    })?;
    tracing::debug!(config = %path.display(), "Processing config file");

    let interval = if args.once { None } else { config.interval() };
    let factory = HttpClientFactory::new(config.http_timeout());
    let orchestrator = CycleOrchestrator::new(config, factory);

    tracing::info!(
        sources = orchestrator.config().rabbitmq_servers.len(),
        sinks = orchestrator.config().graphite_servers.len(),
        "Starting rabbitmq-metrics-to-graphite"
    );
    let cycles = run_service(&orchestrator, interval, shutdown_signal()).await;
    tracing::info!(cycles, "Collector stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_config_is_required() {
        assert!(Args::try_parse_from(["rabbitmq-metrics-to-graphite"]).is_err());
        let args = Args::try_parse_from(["rabbitmq-metrics-to-graphite", "--dump-default-config"])
            .unwrap();
        assert!(args.dump_default_config);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_flags() {
        let args =
            Args::try_parse_from(["rabbitmq-metrics-to-graphite", "-v", "--once", "conf.json"])
                .unwrap();
        assert!(args.verbose);
        assert!(args.once);
        assert_eq!(args.config, Some(PathBuf::from("conf.json")));
    }

    #[tokio::test]
    async fn test_missing_config_fails() {
        let args =
            Args::try_parse_from(["rabbitmq-metrics-to-graphite", "/nonexistent/rmqmon.json"])
                .unwrap();
        let err = run(args).await.unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rmqmon.json"));
    }
}
