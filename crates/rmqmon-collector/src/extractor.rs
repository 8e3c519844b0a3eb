//! Statistics extraction: snapshot in, ordered `(suffix, value)` points out.
//!
//! Emission order is fixed so two runs over the same snapshot produce the
//! same sequence:
//!
//! 1. object totals          `<kind>_total_count`
//! 2. queue totals           `queue_<kind>_total_count` / `_rate`
//! 3. message statistics     `message_<kind>_total_count` / `_rate`
//! 4. connection aggregates  `connections.<label>` (always emitted, zero if no connections)
//! 5. node health            `nodes.<node>.<label>`
//! 6. queue details          `queues.<queue>.<label>`
//! 7. named-queue peeks      `msg_count-<queue>`
//!
//! Absent sections and absent keys are skipped, never reported as zero,
//! except for the connection aggregates.

use rmqmon_config::RabbitMqServer;
use rmqmon_graphite::{sanitize_segment, MetricValue};
use rmqmon_rabbitmq::{Connection, CountedStat, ManagementApi, Node, Queue, Snapshot};

use crate::error::CollectError;

/// Suffix of the per-pass duration sample appended by the orchestrator.
pub const ELAPSED_SUFFIX: &str = "scraptime_elapsed_seconds";

/// A metric before it is placed under a sink's namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub suffix: String,
    pub value: MetricValue,
}

impl MetricPoint {
    pub fn new(suffix: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self {
            suffix: suffix.into(),
            value: value.into(),
        }
    }
}

/// Output of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub points: Vec<MetricPoint>,
    /// Named queues whose peek failed and were reported as zero.
    pub failed_peeks: Vec<String>,
}

type Accessor<T> = fn(&T) -> Option<MetricValue>;

const CONNECTION_METRICS: &[(&str, Accessor<Connection>)] = &[
    ("channels", |c| c.channels),
    ("received_bytes", |c| c.recv_oct),
    ("received_packets", |c| c.recv_cnt),
    ("sent_bytes", |c| c.send_oct),
    ("sent_packets", |c| c.send_cnt),
    ("send_pending", |c| c.send_pend),
];

const NODE_METRICS: &[(&str, Accessor<Node>)] = &[
    ("running", |n| n.running.map(MetricValue::from)),
    ("memory_used", |n| n.mem_used),
    ("memory_limit", |n| n.mem_limit),
    ("memory_alarm", |n| n.mem_alarm.map(MetricValue::from)),
    ("disk_free", |n| n.disk_free),
    ("disk_free_alarm", |n| n.disk_free_alarm.map(MetricValue::from)),
    ("disk_free_limit", |n| n.disk_free_limit),
    ("file_descriptors_used", |n| n.fd_used),
    ("file_descriptors_total", |n| n.fd_total),
    ("sockets_used", |n| n.sockets_used),
    ("sockets_total", |n| n.sockets_total),
    ("partitions", |n| n.partitions.as_ref().map(|p| MetricValue::from(p.len()))),
];

const QUEUE_METRICS: &[(&str, Accessor<Queue>)] = &[
    ("messages", |q| q.messages),
    ("messages_ready", |q| q.messages_ready),
    ("messages_unacknowledged", |q| q.messages_unacknowledged),
    ("messages_ram", |q| q.messages_ram),
    ("messages_ready_ram", |q| q.messages_ready_ram),
    ("messages_unacknowledged_ram", |q| q.messages_unacknowledged_ram),
    ("messages_persistent", |q| q.messages_persistent),
    ("message_bytes", |q| q.message_bytes),
    ("message_bytes_ready", |q| q.message_bytes_ready),
    ("message_bytes_unacknowledged", |q| q.message_bytes_unacknowledged),
    ("message_bytes_ram", |q| q.message_bytes_ram),
    ("message_bytes_persistent", |q| q.message_bytes_persistent),
    ("consumers", |q| q.consumers),
    ("consumer_utilisation", |q| q.consumer_utilisation),
    ("memory", |q| q.memory),
    ("head_message_timestamp", |q| q.head_message_timestamp),
];

/// Run steps 1 to 6 over a snapshot. Pure: no I/O.
pub fn extract_snapshot(snapshot: &Snapshot) -> Vec<MetricPoint> {
    let mut points = Vec::new();
    let overview = &snapshot.overview;

    if let Some(totals) = &overview.object_totals {
        for (kind, value) in totals.entries() {
            if let Some(value) = value {
                points.push(MetricPoint::new(format!("{}_total_count", kind), value));
            }
        }
    }

    if let Some(totals) = &overview.queue_totals {
        push_counted(&mut points, "queue", &totals.entries());
    }

    if let Some(stats) = &overview.message_stats {
        push_counted(&mut points, "message", &stats.entries());
    }

    let connections = snapshot.connections();
    for (label, get) in CONNECTION_METRICS {
        let total = connections
            .iter()
            .filter_map(get)
            .fold(MetricValue::ZERO, MetricValue::saturating_add);
        points.push(MetricPoint::new(format!("connections.{}", label), total));
    }

    for node in snapshot.nodes() {
        let node_name = sanitize_segment(&node.name);
        for (label, get) in NODE_METRICS {
            if let Some(value) = get(node) {
                points.push(MetricPoint::new(format!("nodes.{}.{}", node_name, label), value));
            }
        }
    }

    for queue in snapshot.queues() {
        let queue_name = sanitize_segment(&queue.name);
        for (label, get) in QUEUE_METRICS {
            if let Some(value) = get(queue) {
                points.push(MetricPoint::new(format!("queues.{}.{}", queue_name, label), value));
            }
        }
    }

    points
}

fn push_counted(points: &mut Vec<MetricPoint>, family: &str, stats: &[CountedStat]) {
    for stat in stats {
        let Some(count) = stat.count else { continue };
        points.push(MetricPoint::new(format!("{}_{}_total_count", family, stat.kind), count));
        if let Some(rate) = stat.rate {
            points.push(MetricPoint::new(format!("{}_{}_total_rate", family, stat.kind), rate));
        }
    }
}

/// Step 7: peek every queue named in the source configuration.
///
/// The reported count is the broker's remaining `message_count` plus one:
/// the peeked message itself is not included in that count while it is out
/// for delivery. A failed peek is logged and reported as zero.
pub async fn peek_named_queues(api: &dyn ManagementApi, source: &RabbitMqServer) -> Extraction {
    let mut extraction = Extraction::default();

    for queue_name in &source.queues {
        let count = match api.peek_queue(&source.vhost, queue_name, 1, true).await {
            Ok(messages) => match messages.first() {
                Some(message) => {
                    MetricValue::from(message.message_count.unwrap_or(0).saturating_add(1))
                }
                None => MetricValue::ZERO,
            },
            Err(error) => {
                let err = CollectError::QueuePeek {
                    queue: queue_name.clone(),
                    error,
                };
                tracing::error!(
                    cluster = source.display_name(),
                    queue = %queue_name,
                    error = %err,
                    "Error opening queue details"
                );
                extraction.failed_peeks.push(queue_name.clone());
                MetricValue::ZERO
            }
        };
        extraction
            .points
            .push(MetricPoint::new(format!("msg_count-{}", sanitize_segment(queue_name)), count));
    }

    extraction
}

/// Steps 1 to 7 for one (source, sink) pass.
pub async fn extract(
    api: &dyn ManagementApi,
    snapshot: &Snapshot,
    source: &RabbitMqServer,
) -> Extraction {
    let mut points = extract_snapshot(snapshot);
    let peeked = peek_named_queues(api, source).await;
    points.extend(peeked.points);
    Extraction {
        points,
        failed_peeks: peeked.failed_peeks,
    }
}
