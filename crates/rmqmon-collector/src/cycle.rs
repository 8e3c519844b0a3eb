//! One collection cycle: every source, then every sink for that source.

use std::time::{Duration, Instant};

use rmqmon_config::{AppConfig, GraphiteServer, RabbitMqServer};
use rmqmon_graphite::{GraphiteConnection, MetricPath, Sample};
use rmqmon_rabbitmq::{fetch_snapshot, ManagementApi, Snapshot};

use crate::error::CollectError;
use crate::extractor::{self, ELAPSED_SUFFIX};
use crate::factory::ClientFactory;

/// What one successful (source, sink) pass sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkPass {
    pub samples: usize,
    pub bytes: usize,
    pub failed_peeks: usize,
}

/// Outcome counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub sources_ok: usize,
    pub sources_failed: usize,
    pub sink_passes_ok: usize,
    pub sink_passes_failed: usize,
    pub samples_sent: usize,
    pub failed_peeks: usize,
}

impl CycleReport {
    /// True when nothing at all went wrong.
    pub fn is_clean(&self) -> bool {
        self.sources_failed == 0 && self.sink_passes_failed == 0 && self.failed_peeks == 0
    }
}

/// Drives fetch, extract, and emit across all configured sources and sinks.
pub struct CycleOrchestrator<F> {
    config: AppConfig,
    factory: F,
}

impl<F: ClientFactory> CycleOrchestrator<F> {
    pub fn new(config: AppConfig, factory: F) -> Self {
        Self { config, factory }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Run one full pass over all sources and sinks, in configuration order.
    ///
    /// Never fails: every error is logged and counted in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let mut report = CycleReport::default();

        for source in &self.config.rabbitmq_servers {
            let cluster = source.display_name();
            tracing::debug!(cluster, host = %source.host, "Working on rabbitmq server");

            let started = Instant::now();
            let (api, snapshot) = match self.fetch(source).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    tracing::error!(cluster, error = %e, "Skipping rabbitmq server for this cycle");
                    report.sources_failed += 1;
                    continue;
                }
            };
            report.sources_ok += 1;

            for sink in &self.config.graphite_servers {
                match self.emit(api.as_ref(), &snapshot, source, sink, started).await {
                    Ok(pass) => {
                        report.sink_passes_ok += 1;
                        report.samples_sent += pass.samples;
                        report.failed_peeks += pass.failed_peeks;
                    }
                    Err(e) => {
                        tracing::error!(
                            cluster,
                            sink = %sink.host,
                            error = %e,
                            "Failed to send metrics"
                        );
                        report.sink_passes_failed += 1;
                    }
                }
            }
        }

        tracing::info!(
            sources_ok = report.sources_ok,
            sources_failed = report.sources_failed,
            sink_passes_ok = report.sink_passes_ok,
            sink_passes_failed = report.sink_passes_failed,
            samples_sent = report.samples_sent,
            failed_peeks = report.failed_peeks,
            "Cycle complete"
        );
        report
    }

    async fn fetch(
        &self,
        source: &RabbitMqServer,
    ) -> Result<(std::sync::Arc<dyn ManagementApi>, Snapshot), CollectError> {
        let fetch_error = |error| CollectError::SourceFetch {
            cluster: source.display_name().to_string(),
            error,
        };
        let api = self.factory.create(source).map_err(fetch_error)?;
        let snapshot = fetch_snapshot(api.as_ref()).await.map_err(fetch_error)?;
        Ok((api, snapshot))
    }

    /// One (source, sink) pass: connect, extract, write, close.
    ///
    /// The connection is closed on every path once it has been opened.
    pub async fn emit(
        &self,
        api: &dyn ManagementApi,
        snapshot: &Snapshot,
        source: &RabbitMqServer,
        sink: &GraphiteServer,
        started: Instant,
    ) -> Result<SinkPass, CollectError> {
        tracing::debug!(
            cluster = source.display_name(),
            sink = %sink.host,
            port = sink.port,
            "Processing rabbitmq on graphite"
        );

        let connect_timeout = self.config.connect_timeout();
        let mut conn = GraphiteConnection::open(&sink.host, sink.port, connect_timeout)
            .await
            .map_err(|e| CollectError::sink(&format!("{}:{}", sink.host, sink.port), e))?;

        let extraction = extractor::extract(api, snapshot, source).await;
        let path = MetricPath::new(&sink.prefix, source.display_name());
        let mut samples: Vec<Sample> = extraction
            .points
            .iter()
            .map(|point| Sample::new(path.join(&point.suffix), point.value))
            .collect();
        samples.push(Sample::new(path.join(ELAPSED_SUFFIX), started.elapsed().as_secs_f64()));

        let result = conn.send_samples(&samples).await;
        let addr = conn.addr().to_string();
        conn.close().await;
        let bytes = result.map_err(|e| CollectError::sink(&addr, e))?;

        tracing::info!(
            cluster = source.display_name(),
            sink = %addr,
            samples = samples.len(),
            "All metrics sent in: {} sec",
            round_secs(started.elapsed())
        );

        Ok(SinkPass {
            samples: samples.len(),
            bytes,
            failed_peeks: extraction.failed_peeks.len(),
        })
    }
}

/// Seconds rounded to two decimals, for log display only.
fn round_secs(d: Duration) -> f64 {
    (d.as_secs_f64() * 100.0).round() / 100.0
}
