//! End-to-end cycle: a legacy JSON config, a broker serving realistic
//! management API documents, and two plaintext Graphite listeners.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rmqmon_collector::{ClientFactory, CycleOrchestrator};
use rmqmon_config::{ConfigFormat, RabbitMqServer};
use rmqmon_graphite::{parse_line, MetricValue, Sample};
use rmqmon_rabbitmq::{
    ClientError, ClientResult, Connection, ManagementApi, Node, Overview, PeekedMessage, Queue,
};
use serde_json::json;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

struct JsonBroker {
    overview: serde_json::Value,
    connections: serde_json::Value,
    nodes: serde_json::Value,
    queues: serde_json::Value,
    peeked: Mutex<Vec<(String, String)>>,
}

fn decode<T>(endpoint: &str, value: &serde_json::Value) -> ClientResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value.clone()).map_err(|e| ClientError::Decode {
        endpoint: endpoint.into(),
        message: e.to_string(),
    })
}

#[async_trait]
impl ManagementApi for JsonBroker {
    async fn overview(&self) -> ClientResult<Overview> {
        decode("/api/overview", &self.overview)
    }

    async fn connections(&self) -> ClientResult<Option<Vec<Connection>>> {
        decode("/api/connections", &self.connections)
    }

    async fn nodes(&self) -> ClientResult<Option<Vec<Node>>> {
        decode("/api/nodes", &self.nodes)
    }

    async fn queues(&self) -> ClientResult<Option<Vec<Queue>>> {
        decode("/api/queues", &self.queues)
    }

    async fn peek_queue(
        &self,
        vhost: &str,
        queue: &str,
        _: u32,
        _: bool,
    ) -> ClientResult<Vec<PeekedMessage>> {
        self.peeked.lock().push((vhost.to_string(), queue.to_string()));
        match queue {
            "orders" => Ok(vec![PeekedMessage {
                message_count: Some(41),
                ..Default::default()
            }]),
            "idle" => Ok(Vec::new()),
            _ => Err(ClientError::Api {
                endpoint: format!("/api/queues/{}/{}/get", vhost, queue),
                status: 404,
                message: "Object Not Found".into(),
            }),
        }
    }
}

struct SharedBroker(Arc<JsonBroker>);

impl ClientFactory for SharedBroker {
    fn create(&self, _: &RabbitMqServer) -> ClientResult<Arc<dyn ManagementApi>> {
        Ok(self.0.clone() as Arc<dyn ManagementApi>)
    }
}

fn broker() -> JsonBroker {
    JsonBroker {
        overview: json!({
            "cluster_name": "rabbit@prod-1",
            "rabbitmq_version": "3.12.4",
            "object_totals": {
                "channels": 3,
                "connections": 2,
                "consumers": 1,
                "exchanges": 9,
                "queues": 3
            },
            "queue_totals": {
                "messages": 12,
                "messages_details": {"rate": 0.4},
                "messages_ready": 10,
                "messages_unacknowledged": 2,
                "messages_unacknowledged_details": {"rate": 0.0}
            },
            "message_stats": {"publish": 1000, "publish_details": {"rate": 2.5}, "ack": 990}
        }),
        connections: json!([
            {
                "name": "c1", "channels": 1, "recv_oct": 100, "recv_cnt": 4,
                "send_oct": 50, "send_cnt": 2, "send_pend": 0
            },
            {
                "name": "c2", "channels": 2, "recv_oct": 300, "recv_cnt": 6,
                "send_oct": 70, "send_cnt": 3, "send_pend": 0
            }
        ]),
        nodes: json!([
            {
                "name": "rabbit@prod-1.example",
                "running": true,
                "mem_used": 104857600,
                "mem_alarm": false,
                "partitions": []
            }
        ]),
        queues: json!(null),
        peeked: Mutex::new(Vec::new()),
    }
}

async fn fake_graphite() -> (u16, tokio::task::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = String::new();
        socket.read_to_string(&mut buf).await.unwrap();
        buf
    });
    (port, handle)
}

fn parse_batch(batch: &str) -> Vec<Sample> {
    batch.lines().map(|line| parse_line(line).unwrap()).collect()
}

fn value_of(samples: &[Sample], path: &str) -> Option<MetricValue> {
    samples.iter().find(|s| s.path == path).map(|s| s.value)
}

#[tokio::test]
async fn test_full_cycle_from_legacy_config() {
    let (port_a, batch_a) = fake_graphite().await;
    let (port_b, batch_b) = fake_graphite().await;

    let document = json!({
        "graphite_servers": [
            {"host": "127.0.0.1", "port": port_a, "prefix": "dc1.rabbitmq"},
            {"host": "127.0.0.1", "port": port_b, "prefix": "backup."}
        ],
        "rabbitmq_servers": [{
            "host": "mq.internal",
            "username": "monitor",
            "password": "secret",
            "cluster_name": "prod.eu",
            "vhost": "/",
            "queues": ["orders", "idle", "missing"]
        }]
    });
    let config = rmqmon_config::parse(&document.to_string(), ConfigFormat::Json).unwrap();

    let broker = Arc::new(broker());
    let orchestrator = CycleOrchestrator::new(config, SharedBroker(broker.clone()));
    let report = orchestrator.run_cycle().await;

    assert_eq!(report.sources_ok, 1);
    assert_eq!(report.sink_passes_ok, 2);
    assert_eq!(report.sink_passes_failed, 0);
    // "missing" fails on both passes.
    assert_eq!(report.failed_peeks, 2);
    assert_eq!(broker.peeked.lock().len(), 6);
    assert!(broker.peeked.lock().iter().all(|(vhost, _)| vhost == "/"));

    let a = parse_batch(&batch_a.await.unwrap());
    let b = parse_batch(&batch_b.await.unwrap());
    assert_eq!(a.len(), b.len());
    assert_eq!(a.len() + b.len(), report.samples_sent);

    assert!(a.iter().all(|s| s.path.starts_with("dc1.rabbitmq.prod_eu.")));
    assert!(b.iter().all(|s| s.path.starts_with("backup.prod_eu.")));

    let ns = "dc1.rabbitmq.prod_eu";
    let at = |suffix: &str| value_of(&a, &format!("{}.{}", ns, suffix));

    assert_eq!(a[0].path, format!("{}.channels_total_count", ns));
    assert_eq!(at("queues_total_count"), Some(MetricValue::Int(3)));
    assert_eq!(at("queue_messages_total_count"), Some(MetricValue::Int(12)));
    assert_eq!(at("queue_messages_total_rate"), Some(MetricValue::Float(0.4)));
    assert_eq!(at("queue_messages_ready_total_count"), Some(MetricValue::Int(10)));
    assert_eq!(at("queue_messages_ready_total_rate"), None);
    assert_eq!(at("message_publish_total_rate"), Some(MetricValue::Float(2.5)));
    assert_eq!(at("message_ack_total_count"), Some(MetricValue::Int(990)));
    assert_eq!(at("message_deliver_total_count"), None);

    assert_eq!(at("connections.channels"), Some(MetricValue::Int(3)));
    assert_eq!(at("connections.received_bytes"), Some(MetricValue::Int(400)));
    assert_eq!(at("connections.sent_packets"), Some(MetricValue::Int(5)));

    assert_eq!(at("nodes.rabbit@prod-1_example.running"), Some(MetricValue::Int(1)));
    assert_eq!(at("nodes.rabbit@prod-1_example.memory_alarm"), Some(MetricValue::Int(0)));
    assert_eq!(at("nodes.rabbit@prod-1_example.partitions"), Some(MetricValue::Int(0)));
    assert_eq!(at("nodes.rabbit@prod-1_example.disk_free"), None);

    assert_eq!(at("msg_count-orders"), Some(MetricValue::Int(42)));
    assert_eq!(at("msg_count-idle"), Some(MetricValue::Int(0)));
    assert_eq!(at("msg_count-missing"), Some(MetricValue::Int(0)));

    let last = a.last().unwrap();
    assert_eq!(last.path, format!("{}.scraptime_elapsed_seconds", ns));
    assert!(matches!(last.value, MetricValue::Float(_)));

    let first_ts = a[0].epoch_seconds();
    assert!(a.iter().all(|s| (s.epoch_seconds() - first_ts).abs() <= 1));
}
