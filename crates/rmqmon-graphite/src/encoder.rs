//! Plaintext line protocol: `<path> <value> <timestamp>\n`.
//!
//! The path is written verbatim. Callers are responsible for having
//! sanitized every segment (see [`crate::path`]).

use chrono::DateTime;

use crate::error::GraphiteError;
use crate::sample::{MetricValue, Sample};

/// Encode one data point as a newline-terminated line.
pub fn encode(path: &str, value: MetricValue, epoch_seconds: i64) -> String {
    format!("{} {} {}\n", path, value, epoch_seconds)
}

pub fn encode_sample(sample: &Sample) -> String {
    encode(&sample.path, sample.value, sample.epoch_seconds())
}

/// Parse a line produced by [`encode`]. The trailing newline is optional.
pub fn parse_line(line: &str) -> Result<Sample, GraphiteError> {
    let malformed = |reason: &str| GraphiteError::Parse {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = line.strip_suffix('\n').unwrap_or(line);
    let mut fields = trimmed.split(' ');
    let (Some(path), Some(value), Some(timestamp), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(malformed("expected exactly three space-separated fields"));
    };
    if path.is_empty() {
        return Err(malformed("empty metric path"));
    }

    let value = match value.parse::<i64>() {
        Ok(v) => MetricValue::Int(v),
        Err(_) => MetricValue::Float(
            value
                .parse::<f64>()
                .map_err(|_| malformed("value is not numeric"))?,
        ),
    };
    let seconds: i64 = timestamp
        .parse()
        .map_err(|_| malformed("timestamp is not an integer"))?;
    let timestamp =
        DateTime::from_timestamp(seconds, 0).ok_or_else(|| malformed("timestamp out of range"))?;

    Ok(Sample::at(path, value, timestamp))
}
