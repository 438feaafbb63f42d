//! Error types for the transport core.
//!
//! # Design
//! Backend failures pass through untouched: `Http` and `Io` are transparent
//! so the caller sees exactly what ureq or the socket reported, and decides
//! for itself whether to retry. The remaining variants cover problems this
//! crate detects on its own before or after the exchange.

use thiserror::Error;

/// Errors returned by every `TransportService` operation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The high-level backend failed to complete the exchange (DNS, connect,
    /// timeout, TLS, protocol).
    #[error(transparent)]
    Http(#[from] ureq::Error),

    /// The low-level backend failed while connecting, writing or reading.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A query parameter value could not be rendered as a string.
    #[error("query parameter `{key}` cannot be encoded: {reason}")]
    Encoding { key: String, reason: String },

    /// The target URL could not be parsed.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The low-level backend only speaks plain HTTP.
    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),

    /// A request header name or value cannot be written on the wire.
    #[error("invalid request header `{name}`: {reason}")]
    InvalidHeader { name: String, reason: String },

    /// A redirect chain was longer than the configured limit.
    #[error("gave up after {0} redirects")]
    TooManyRedirects(u32),

    /// The peer sent something that is not an HTTP/1.x response.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The transport configuration is not valid JSON for `TransportConfig`.
    #[error("invalid transport configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// The transport configuration file could not be read.
    #[error("failed to read transport configuration: {0}")]
    ConfigIo(#[source] std::io::Error),
}
