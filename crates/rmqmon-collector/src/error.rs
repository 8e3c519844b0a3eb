//! Failure taxonomy for one collection cycle.
//!
//! None of these abort the process: each is logged and the cycle moves on
//! to the next queue, backend, or cluster.

use rmqmon_graphite::GraphiteError;
use rmqmon_rabbitmq::ClientError;

#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The aggregate statistics could not be fetched; the cluster is skipped
    /// for this cycle.
    #[error("cannot fetch statistics from {cluster}: {error}")]
    SourceFetch {
        cluster: String,
        #[source]
        error: ClientError,
    },

    /// Peeking one named queue failed; its count is reported as zero.
    #[error("cannot peek queue {queue}: {error}")]
    QueuePeek {
        queue: String,
        #[source]
        error: ClientError,
    },

    /// The Graphite backend could not be reached; nothing was sent to it.
    #[error("cannot connect to graphite {sink}: {error}")]
    SinkConnect {
        sink: String,
        #[source]
        error: GraphiteError,
    },

    /// Writing to the Graphite backend failed part-way.
    #[error("cannot write metrics to graphite {sink}: {error}")]
    SinkWrite {
        sink: String,
        #[source]
        error: GraphiteError,
    },
}

impl CollectError {
    pub fn sink(sink: &str, error: GraphiteError) -> Self {
        let sink = sink.to_string();
        if error.is_connect() {
            CollectError::SinkConnect { sink, error }
        } else {
            CollectError::SinkWrite { sink, error }
        }
    }
}
