use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to a Graphite backend.
#[derive(Debug, Error)]
pub enum GraphiteError {
    /// The peer refused the connection or the connect call failed.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// No connection could be established within the connect timeout.
    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: String, timeout: Duration },

    /// Writing the batch failed; the backend may have received a prefix of it.
    #[error("write of {total} bytes to {addr} failed: {source}")]
    Write {
        addr: String,
        total: usize,
        #[source]
        source: std::io::Error,
    },

    /// A line did not match `name value timestamp`.
    #[error("malformed line {line:?}: {reason}")]
    Parse { line: String, reason: String },
}

impl GraphiteError {
    /// True for failures that happened before any byte was sent.
    pub fn is_connect(&self) -> bool {
        matches!(
            self,
            GraphiteError::Connect { .. } | GraphiteError::ConnectTimeout { .. }
        )
    }
}
