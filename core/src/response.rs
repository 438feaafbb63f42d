//! Backend-independent response record.
//!
//! # Design
//! Both backends end in a `NormalizedResponse`: the ureq backend converts
//! the `http` response head it gets back, the raw backend wraps whatever its
//! `HeaderAccumulator` collected. Either way header names come out
//! lowercased and trimmed with one value each, so callers never see which
//! engine ran the exchange.

use ureq::http::response::Parts;

use crate::accumulator::HeaderAccumulator;
use crate::http::{decode_latin1, Headers};

/// Status, headers, and the responses that redirected to this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedResponse {
    status: u16,
    headers: Headers,
    previous: Vec<NormalizedResponse>,
}

impl NormalizedResponse {
    pub fn new(status: u16, headers: Headers) -> Self {
        Self {
            status,
            headers,
            previous: Vec::new(),
        }
    }

    /// Attach redirect history, oldest hop first.
    pub fn with_previous(mut self, previous: Vec<NormalizedResponse>) -> Self {
        self.previous = previous;
        self
    }

    /// Build from the header mapping the low-level backend accumulated.
    pub fn from_accumulated(status: u16, headers: HeaderAccumulator) -> Self {
        Self::new(status, headers.into_headers())
    }

    /// Build from the head of an `http` response as returned by ureq.
    ///
    /// Values are read as raw bytes and decoded as ISO-8859-1, so a
    /// non-ASCII value survives instead of being dropped.
    pub fn from_http_parts(parts: &Parts) -> Self {
        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| (name.as_str(), decode_latin1(value.as_bytes())))
            .collect::<Headers>();
        Self::new(parts.status.as_u16(), headers)
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Earlier responses in the redirect chain. Empty when no redirect was
    /// observed or the backend does not report hops.
    pub fn previous(&self) -> &[NormalizedResponse] {
        &self.previous
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ureq::http::{HeaderValue, Response, StatusCode};

    #[test]
    fn from_http_parts_lowercases_and_keeps_last() {
        let mut response = Response::builder()
            .status(StatusCode::CREATED)
            .header("Content-Type", "application/atom+xml;type=entry")
            .header("Location", "http://x/obj/1")
            .body(())
            .unwrap();
        response
            .headers_mut()
            .append("x-dup", HeaderValue::from_static("first"));
        response
            .headers_mut()
            .append("x-dup", HeaderValue::from_static("second"));
        let (parts, _) = response.into_parts();

        let normalized = NormalizedResponse::from_http_parts(&parts);
        assert_eq!(normalized.status(), 201);
        assert_eq!(normalized.header("content-type"), Some("application/atom+xml;type=entry"));
        assert_eq!(normalized.header("Location"), Some("http://x/obj/1"));
        assert_eq!(normalized.header("x-dup"), Some("second"));
        assert!(normalized.previous().is_empty());
    }

    #[test]
    fn from_http_parts_decodes_opaque_bytes() {
        let mut response = Response::builder().status(200).body(()).unwrap();
        response
            .headers_mut()
            .insert("x-name", HeaderValue::from_bytes(b"Jos\xe9").unwrap());
        let (parts, _) = response.into_parts();
        assert_eq!(NormalizedResponse::from_http_parts(&parts).header("x-name"), Some("José"));
    }

    #[test]
    fn from_accumulated_wraps_headers() {
        let mut acc = HeaderAccumulator::new();
        acc.record(b"HTTP/1.1 404 Not Found\r\n");
        acc.record(b"Content-Length: 0\r\n");
        let normalized = NormalizedResponse::from_accumulated(404, acc);
        assert_eq!(normalized.status(), 404);
        assert_eq!(normalized.header("content-length"), Some("0"));
        assert!(!normalized.is_success());
    }

    #[test]
    fn history_is_kept_in_order() {
        let first = NormalizedResponse::new(301, Headers::new());
        let second = NormalizedResponse::new(302, Headers::new());
        let last = NormalizedResponse::new(200, Headers::new()).with_previous(vec![first, second]);
        let statuses: Vec<u16> = last.previous().iter().map(|r| r.status()).collect();
        assert_eq!(statuses, vec![301, 302]);
        assert!(last.is_success());
    }
}
