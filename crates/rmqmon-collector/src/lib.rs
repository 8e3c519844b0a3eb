//! Metric translation and fan-out for RabbitMQ statistics.
//!
//! For every configured RabbitMQ cluster the [`CycleOrchestrator`] fetches one
//! statistics [`Snapshot`](rmqmon_rabbitmq::Snapshot), then for every Graphite
//! backend opens a fresh connection, runs the [`extractor`] over the snapshot,
//! and writes the resulting samples. Failures are contained at the smallest
//! unit: one queue peek, one (cluster, backend) pass, or one cluster.
//!
//! Execution is sequential: one connection is open at a time and sample
//! order within a cycle is deterministic.

pub mod cycle;
pub mod error;
pub mod extractor;
pub mod factory;
pub mod service;

pub use cycle::{CycleOrchestrator, CycleReport, SinkPass};
pub use error::CollectError;
pub use extractor::{Extraction, MetricPoint};
pub use factory::{ClientFactory, HttpClientFactory};
pub use service::{run_service, shutdown_signal};
