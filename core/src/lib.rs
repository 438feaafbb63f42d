//! Pluggable HTTP transport for a CMIS client.
//!
//! # Overview
//! Issues GET/PUT/POST/DELETE against a remote endpoint and hands back a
//! `NormalizedResponse` plus the raw body bytes. Which engine performed
//! the exchange is invisible to the caller: the ureq backend and the raw
//! HTTP/1.1 backend produce the same response shape.
//!
//! # Design
//! - `TransportService` is the one capability both backends implement;
//!   `TransportConfig::into_service` picks one.
//! - `RequestBuilder` is pure: URL query merging, header assembly and
//!   option merging happen before any I/O.
//! - Calls are blocking and share no mutable state. Every call gets its own
//!   request, handle and accumulators; a service holds only its user agent
//!   and default options.
//! - No retries, caching or pooling. Errors reach the caller as the backend
//!   reported them.

pub mod accumulator;
pub mod config;
pub mod error;
pub mod handle;
pub mod http;
pub mod options;
pub mod raw_service;
pub mod request;
pub mod response;
pub mod service;
pub mod ureq_service;

pub use accumulator::{ContentAccumulator, HeaderAccumulator};
pub use config::{BackendKind, TransportConfig, DEFAULT_USER_AGENT};
pub use error::TransportError;
pub use handle::{RawHandle, ResponseSink};
pub use http::{Credentials, Headers, HttpMethod, TransportRequest};
pub use options::{BackendOptions, OptionValue};
pub use raw_service::RawService;
pub use request::{QueryParams, QueryValue, RequestBuilder, RequestOptions};
pub use response::NormalizedResponse;
pub use service::{Exchange, TransportService};
pub use ureq_service::UreqService;
