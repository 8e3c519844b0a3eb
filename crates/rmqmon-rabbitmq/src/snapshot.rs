//! Typed view of the management API statistics.
//!
//! Field names match the JSON keys the broker returns. Anything the broker
//! may leave out, or send as `null`, is an `Option` and reads as "absent".

use rmqmon_graphite::MetricValue;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Decode an optional field the broker may send in an unexpected shape, such
/// as `""` for an idle queue's `consumer_utilisation`. Anything that does not
/// decode as `T` reads as absent instead of failing the whole document.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// `{"rate": ...}` companion object of a counted statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateDetails {
    #[serde(default, deserialize_with = "lenient")]
    pub rate: Option<MetricValue>,
}

/// One counted statistic with its optional pre-computed rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountedStat {
    pub kind: &'static str,
    pub count: Option<MetricValue>,
    pub rate: Option<MetricValue>,
}

/// Declares a struct of `<kind>` / `<kind>_details` field pairs and an
/// `entries()` accessor that yields them in declaration order.
macro_rules! counted_stats {
    ($(#[$meta:meta])* $name:ident { $($kind:ident => $details:ident),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(default, deserialize_with = "lenient")]
                pub $kind: Option<MetricValue>,
                #[serde(default, deserialize_with = "lenient")]
                pub $details: Option<RateDetails>,
            )*
        }

        impl $name {
            pub fn entries(&self) -> Vec<CountedStat> {
                vec![$(
                    CountedStat {
                        kind: stringify!($kind),
                        count: self.$kind,
                        rate: self.$details.and_then(|d| d.rate),
                    },
                )*]
            }
        }
    };
}

counted_stats! {
    /// Cluster-wide message counts across all queues.
    QueueTotals {
        messages => messages_details,
        messages_ready => messages_ready_details,
        messages_unacknowledged => messages_unacknowledged_details,
    }
}

counted_stats! {
    /// Cluster-wide message operation counters. Which kinds are present
    /// depends on the broker version and on what traffic has been seen.
    MessageStats {
        ack => ack_details,
        confirm => confirm_details,
        deliver => deliver_details,
        deliver_get => deliver_get_details,
        deliver_no_ack => deliver_no_ack_details,
        get => get_details,
        get_no_ack => get_no_ack_details,
        publish => publish_details,
        publish_in => publish_in_details,
        publish_out => publish_out_details,
        redeliver => redeliver_details,
        return_unroutable => return_unroutable_details,
    }
}

/// Object counts from `/api/overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectTotals {
    #[serde(default, deserialize_with = "lenient")]
    pub channels: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub connections: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub consumers: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub exchanges: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub queues: Option<MetricValue>,
}

impl ObjectTotals {
    pub fn entries(&self) -> [(&'static str, Option<MetricValue>); 5] {
        [
            ("channels", self.channels),
            ("connections", self.connections),
            ("consumers", self.consumers),
            ("exchanges", self.exchanges),
            ("queues", self.queues),
        ]
    }
}

/// `/api/overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default, deserialize_with = "lenient")]
    pub cluster_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub rabbitmq_version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub object_totals: Option<ObjectTotals>,
    #[serde(default, deserialize_with = "lenient")]
    pub queue_totals: Option<QueueTotals>,
    #[serde(default, deserialize_with = "lenient")]
    pub message_stats: Option<MessageStats>,
}

/// One entry of `/api/connections`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub channels: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub recv_oct: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub recv_cnt: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub send_oct: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub send_cnt: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub send_pend: Option<MetricValue>,
}

/// One entry of `/api/nodes`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub running: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub mem_used: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub mem_limit: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub mem_alarm: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub disk_free: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub disk_free_alarm: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub disk_free_limit: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub fd_used: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub fd_total: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub sockets_used: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub sockets_total: Option<MetricValue>,
    /// Nodes this node cannot see; non-empty means a network partition.
    #[serde(default, deserialize_with = "lenient")]
    pub partitions: Option<Vec<serde_json::Value>>,
}

/// One entry of `/api/queues`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Queue {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub vhost: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages_ready: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages_unacknowledged: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages_ram: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages_ready_ram: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages_unacknowledged_ram: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub messages_persistent: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub message_bytes: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub message_bytes_ready: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub message_bytes_unacknowledged: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub message_bytes_ram: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub message_bytes_persistent: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub consumers: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub consumer_utilisation: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub memory: Option<MetricValue>,
    #[serde(default, deserialize_with = "lenient")]
    pub head_message_timestamp: Option<MetricValue>,
}

/// One message returned by `POST /api/queues/{vhost}/{name}/get`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeekedMessage {
    /// Messages left in the queue after this one was taken.
    #[serde(default, deserialize_with = "lenient")]
    pub message_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub redelivered: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub routing_key: Option<String>,
}

/// Everything fetched from one broker for one cycle. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub overview: Overview,
    pub connections: Option<Vec<Connection>>,
    pub nodes: Option<Vec<Node>>,
    pub queues: Option<Vec<Queue>>,
}

impl Snapshot {
    pub fn connections(&self) -> &[Connection] {
        self.connections.as_deref().unwrap_or_default()
    }

    pub fn nodes(&self) -> &[Node] {
        self.nodes.as_deref().unwrap_or_default()
    }

    pub fn queues(&self) -> &[Queue] {
        self.queues.as_deref().unwrap_or_default()
    }
}
