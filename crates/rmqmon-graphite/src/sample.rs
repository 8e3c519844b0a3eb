use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A numeric metric value, kept in the representation the broker reported.
///
/// Integers stay integers on the wire (`5`, not `5.0`). Floats always carry a
/// decimal point or exponent so a parsed line keeps the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Int(i64),
    Float(f64),
}

impl MetricValue {
    pub const ZERO: MetricValue = MetricValue::Int(0);

    pub fn as_f64(&self) -> f64 {
        match *self {
            MetricValue::Int(v) => v as f64,
            MetricValue::Float(v) => v,
        }
    }

    /// Add two values, staying integral when both sides are.
    pub fn saturating_add(self, other: MetricValue) -> MetricValue {
        match (self, other) {
            (MetricValue::Int(a), MetricValue::Int(b)) => MetricValue::Int(a.saturating_add(b)),
            (a, b) => MetricValue::Float(a.as_f64() + b.as_f64()),
        }
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(v) => write!(f, "{}", v),
            MetricValue::Float(v) => write!(f, "{:?}", v),
        }
    }
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Int(i64::from(v))
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        i64::try_from(v)
            .map(MetricValue::Int)
            .unwrap_or(MetricValue::Float(v as f64))
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::from(v as u64)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

/// One time-series data point ready to be encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub path: String,
    pub value: MetricValue,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    /// Create a sample stamped with the current time.
    pub fn new(path: impl Into<String>, value: impl Into<MetricValue>) -> Self {
        Self::at(path, value, Utc::now())
    }

    pub fn at(
        path: impl Into<String>,
        value: impl Into<MetricValue>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
            timestamp,
        }
    }

    /// Seconds since the Unix epoch, as written on the wire.
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}
