//! Hierarchical metric path composition.
//!
//! Graphite treats `.` as the hierarchy separator, so every segment that comes
//! from broker data (node names, queue names, cluster names) has its dots
//! replaced before it is joined into a path.

use std::fmt;

/// Replace every `.` and whitespace character in a single path segment
/// with `_`. Whitespace would split the plaintext line into extra fields.
pub fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c == '.' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// A dotted metric path under a fixed `<prefix>.<source>` namespace.
///
/// The prefix is taken verbatim from the sink configuration and may itself
/// be hierarchical (`servers.rabbit`); the source display name is a single
/// segment and is sanitized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPath {
    namespace: String,
}

impl MetricPath {
    pub fn new(prefix: &str, source_name: &str) -> Self {
        let prefix = prefix.trim_matches('.');
        let source = sanitize_segment(source_name);
        let namespace = if prefix.is_empty() {
            source
        } else {
            format!("{}.{}", prefix, source)
        };
        Self { namespace }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Join a metric-specific suffix onto the namespace.
    ///
    /// The suffix is expected to be pre-composed from sanitized segments.
    pub fn join(&self, suffix: &str) -> String {
        format!("{}.{}", self.namespace, suffix)
    }
}

impl fmt::Display for MetricPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.namespace)
    }
}
