//! Client error types.

/// Errors that can occur while talking to the management API.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced an HTTP response (DNS, connect, timeout, TLS).
    #[error("transport error calling {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    /// The API answered with a non-success status.
    #[error("management API returned {status} for {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The response body was not the JSON shape we expect.
    #[error("cannot decode response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid management endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Convenience result type.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
