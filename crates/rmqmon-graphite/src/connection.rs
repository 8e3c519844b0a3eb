//! Short-lived TCP connection to a Graphite (carbon) plaintext listener.
//!
//! One connection carries one batch: open, write every line, close. The
//! connect phase is bounded by a timeout; the write phase is not, since the
//! backend is trusted to accept a bounded burst.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::encoder::encode_sample;
use crate::error::GraphiteError;
use crate::sample::Sample;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// An open connection to one Graphite backend.
///
/// Dropping the value closes the socket; [`GraphiteConnection::close`] also
/// sends a FIN so the backend sees a clean end of batch.
pub struct GraphiteConnection {
    stream: TcpStream,
    addr: String,
}

impl GraphiteConnection {
    /// Connect to `host:port`, giving up after `connect_timeout`.
    pub async fn open(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, GraphiteError> {
        let addr = format!("{}:{}", host, port);
        tracing::debug!(%addr, "connecting to graphite");

        let stream =
            connect_within(&addr, connect_timeout, TcpStream::connect((host, port))).await?;
        // Samples go out as one burst; don't hold the tail back.
        let _ = stream.set_nodelay(true);

        Ok(Self { stream, addr })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Write pre-encoded lines as one contiguous buffer.
    ///
    /// Either every byte is handed to the kernel or an error is returned.
    pub async fn send_lines(&mut self, lines: &[String]) -> Result<usize, GraphiteError> {
        let payload = lines.concat();
        let total = payload.len();
        let result = async {
            self.stream.write_all(payload.as_bytes()).await?;
            self.stream.flush().await
        }
        .await;

        result.map_err(|source| GraphiteError::Write {
            addr: self.addr.clone(),
            total,
            source,
        })?;
        Ok(total)
    }

    /// Encode and send a batch of samples.
    pub async fn send_samples(&mut self, samples: &[Sample]) -> Result<usize, GraphiteError> {
        let lines: Vec<String> = samples.iter().map(encode_sample).collect();
        for line in &lines {
            tracing::debug!(sink = %self.addr, line = line.trim_end(), "sending metric");
        }
        self.send_lines(&lines).await
    }

    /// Shut the connection down. Errors are logged, never returned: by the
    /// time we close, the batch has either been written or already failed.
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!(sink = %self.addr, error = %e, "graphite connection shutdown failed");
        }
    }
}

async fn connect_within<F>(
    addr: &str,
    limit: Duration,
    connect: F,
) -> Result<TcpStream, GraphiteError>
where
    F: Future<Output = io::Result<TcpStream>>,
{
    match tokio::time::timeout(limit, connect).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(source)) => Err(GraphiteError::Connect {
            addr: addr.to_string(),
            source,
        }),
        Err(_) => Err(GraphiteError::ConnectTimeout {
            addr: addr.to_string(),
            timeout: limit,
        }),
    }
}

impl std::fmt::Debug for GraphiteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphiteConnection")
            .field("addr", &self.addr)
            .finish()
    }
}
