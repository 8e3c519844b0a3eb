//! Graphite plaintext protocol support for rmqmon.
//!
//! A [`Sample`] is one `(path, value, timestamp)` data point. Paths are built
//! with [`MetricPath`], encoded into `name value timestamp\n` lines by
//! [`encode`], and shipped over a short-lived [`GraphiteConnection`].

pub mod connection;
pub mod encoder;
pub mod error;
pub mod path;
pub mod sample;

pub use connection::{GraphiteConnection, DEFAULT_CONNECT_TIMEOUT};
pub use encoder::{encode, encode_sample, parse_line};
pub use error::GraphiteError;
pub use path::{sanitize_segment, MetricPath};
pub use sample::{MetricValue, Sample};
