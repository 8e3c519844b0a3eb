//! The management API seam.

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::snapshot::{Connection, Node, Overview, PeekedMessage, Queue, Snapshot};

/// Statistics queries against one broker cluster.
///
/// A `None` list means the broker returned `null` or nothing at all; callers
/// treat it the same as an empty list.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn overview(&self) -> ClientResult<Overview>;

    async fn connections(&self) -> ClientResult<Option<Vec<Connection>>>;

    async fn nodes(&self) -> ClientResult<Option<Vec<Node>>>;

    async fn queues(&self) -> ClientResult<Option<Vec<Queue>>>;

    /// Fetch up to `count` messages from a queue. With `requeue` set the
    /// messages go back onto the queue afterwards.
    async fn peek_queue(
        &self,
        vhost: &str,
        queue: &str,
        count: u32,
        requeue: bool,
    ) -> ClientResult<Vec<PeekedMessage>>;
}

/// Issue the four aggregate queries once and assemble a [`Snapshot`].
///
/// The first failing call aborts the fetch.
pub async fn fetch_snapshot(api: &dyn ManagementApi) -> ClientResult<Snapshot> {
    let overview = api.overview().await?;
    let connections = api.connections().await?;
    let nodes = api.nodes().await?;
    let queues = api.queues().await?;

    tracing::debug!(
        version = overview.rabbitmq_version.as_deref().unwrap_or("unknown"),
        connections = connections.as_ref().map_or(0, Vec::len),
        nodes = nodes.as_ref().map_or(0, Vec::len),
        queues = queues.as_ref().map_or(0, Vec::len),
        "fetched broker snapshot"
    );

    Ok(Snapshot {
        overview,
        connections,
        nodes,
        queues,
    })
}
