//! Low-level backend: every verb runs through a `RawHandle`.
//!
//! # Design
//! Each exchange acquires its own handle and its own header/content
//! accumulators. The handle is dropped before the exchange returns, on
//! success or error, and anything accumulated before a failure goes with it.
//!
//! GET follows `Location` on 301/302/303/307/308 with a fresh handle per
//! hop, up to `max_redirects` (0 returns the redirect itself). Credentials
//! are not sent past the first hop. Intermediate responses are discarded,
//! so `previous` is always empty.

use url::Url;

use crate::accumulator::{ContentAccumulator, HeaderAccumulator};
use crate::config::DEFAULT_USER_AGENT;
use crate::error::TransportError;
use crate::handle::{RawHandle, ResponseSink};
use crate::http::{decode_latin1, Credentials, Headers, HttpMethod, TransportRequest};
use crate::options::{BackendOptions, CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, TIMEOUT_SECS, VERBOSE};
use crate::response::NormalizedResponse;
use crate::service::{Exchange, TransportService};

const KNOWN_OPTIONS: &[&str] = &[TIMEOUT_SECS, CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, VERBOSE];

/// Hops followed when `max_redirects` is not set.
const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// Transport service driving a raw HTTP/1.1 handle.
#[derive(Debug, Clone)]
pub struct RawService {
    user_agent: String,
    defaults: BackendOptions,
}

impl RawService {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_USER_AGENT, BackendOptions::new())
    }

    /// `defaults` apply to every call; options passed with a call win on
    /// key collisions.
    pub fn with_options(user_agent: impl Into<String>, defaults: BackendOptions) -> Self {
        Self {
            user_agent: user_agent.into(),
            defaults,
        }
    }
}

impl Default for RawService {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes handle callbacks into the per-call accumulators.
struct Collector {
    headers: HeaderAccumulator,
    body: ContentAccumulator,
    verbose: bool,
}

impl ResponseSink for Collector {
    fn header_line(&mut self, line: &[u8]) {
        if self.verbose {
            let text = decode_latin1(line);
            tracing::trace!(line = %text.trim_end(), "header");
        }
        self.headers.record(line);
    }

    fn content(&mut self, chunk: &[u8]) {
        self.body.append(chunk);
    }
}

/// One request/response round trip on a fresh handle.
fn perform_once(
    method: HttpMethod,
    url: &str,
    headers: &Headers,
    payload: Option<&[u8]>,
    credentials: Option<&Credentials>,
    options: &BackendOptions,
) -> Result<(u16, Collector), TransportError> {
    let mut headers = headers.clone();
    let mut handle = RawHandle::new(url)?;
    handle.set_method(method);
    if let Some(user_agent) = headers.remove("user-agent") {
        handle.set_user_agent(&user_agent)?;
    }
    handle.set_headers(headers)?;
    if let Some(credentials) = credentials {
        handle.set_credentials(credentials.clone());
    }
    if let Some(payload) = payload {
        handle.set_body(payload.to_vec());
    }
    handle.set_timeout(options.duration_secs(TIMEOUT_SECS));
    handle.set_connect_timeout(options.duration_secs(CONNECT_TIMEOUT_SECS));

    let mut collector = Collector {
        headers: HeaderAccumulator::new(),
        body: ContentAccumulator::new(),
        verbose: options.flag(VERBOSE),
    };
    handle.perform(&mut collector)?;
    Ok((handle.response_code(), collector))
}

/// Where a redirect response points, resolved against the URL that
/// produced it. `None` when the response is not a followable redirect.
fn redirect_target(current: &str, status: u16, headers: &Headers) -> Result<Option<String>, TransportError> {
    if !matches!(status, 301 | 302 | 303 | 307 | 308) {
        return Ok(None);
    }
    let Some(location) = headers.get("location") else {
        return Ok(None);
    };
    Ok(Some(Url::parse(current)?.join(location)?.to_string()))
}

impl TransportService for RawService {
    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn default_options(&self) -> &BackendOptions {
        &self.defaults
    }

    fn execute(&self, request: TransportRequest) -> Result<Exchange, TransportError> {
        let TransportRequest {
            method,
            url,
            headers,
            payload,
            credentials,
            options,
        } = request;
        options.warn_unrecognized("raw", KNOWN_OPTIONS);
        let max_redirects = if method == HttpMethod::Get {
            options.u32_value(MAX_REDIRECTS).unwrap_or(DEFAULT_MAX_REDIRECTS)
        } else {
            0
        };

        let mut target = url;
        let mut credentials = credentials;
        let mut hops = 0;
        loop {
            let (status, collector) = perform_once(
                method,
                &target,
                &headers,
                payload.as_deref(),
                credentials.as_ref(),
                &options,
            )?;

            let next = if max_redirects > 0 {
                redirect_target(&target, status, collector.headers.headers())?
            } else {
                None
            };
            let Some(next) = next else {
                tracing::debug!(
                    method = method.as_str(),
                    url = %target,
                    status = status,
                    redirects = hops,
                    bytes = collector.body.value().len(),
                    "request complete"
                );
                let response = NormalizedResponse::from_accumulated(status, collector.headers);
                return Ok((response, collector.body.into_value()));
            };

            if hops == max_redirects {
                return Err(TransportError::TooManyRedirects(max_redirects));
            }
            hops += 1;
            tracing::debug!(from = %target, to = %next, status = status, "following redirect");
            target = next;
            credentials = None;
        }
    }
}
