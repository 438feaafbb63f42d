//! Per-call accumulators for the low-level backend.
//!
//! The raw handle hands over header lines and body chunks as they arrive.
//! These two values collect them; both are created for one exchange and
//! dropped with it.

use crate::http::{decode_latin1, Headers};

/// Collects raw header lines into a lowercase-keyed mapping.
#[derive(Debug, Default)]
pub struct HeaderAccumulator {
    headers: Headers,
}

impl HeaderAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one raw header line, terminator included or not.
    ///
    /// Lines without a colon (the status line, the blank line closing the
    /// block) are skipped. Otherwise the line is split on its first colon.
    /// Folded continuation lines are not reassembled.
    pub fn record(&mut self, raw_line: &[u8]) {
        let line = decode_latin1(raw_line);
        if let Some((name, value)) = line.split_once(':') {
            self.headers.insert(name, value);
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn into_headers(self) -> Headers {
        self.headers
    }
}

/// Concatenates body chunks in arrival order. No size cap.
#[derive(Debug, Default)]
pub struct ContentAccumulator {
    buf: Vec<u8>,
}

impl ContentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    pub fn value(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_value(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(lines: &[&[u8]]) -> Headers {
        let mut acc = HeaderAccumulator::new();
        for line in lines {
            acc.record(line);
        }
        acc.into_headers()
    }

    #[test]
    fn status_line_and_trimmed_headers() {
        let headers = accumulate(&[
            b"HTTP/1.1 200 OK",
            b"Content-Type: text/xml",
            b"  X-Custom : v1 ",
        ]);
        let collected: Vec<_> = headers.iter().collect();
        assert_eq!(collected, vec![("content-type", "text/xml"), ("x-custom", "v1")]);
    }

    #[test]
    fn wire_terminators_are_stripped() {
        let headers = accumulate(&[b"HTTP/1.1 204 No Content\r\n", b"ETag: \"abc\"\r\n", b"\r\n"]);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("etag"), Some("\"abc\""));
    }

    #[test]
    fn splits_on_first_colon_only() {
        let headers = accumulate(&[b"Location: http://host:8080/path"]);
        assert_eq!(headers.get("location"), Some("http://host:8080/path"));
    }

    #[test]
    fn duplicate_names_keep_last_value() {
        let headers = accumulate(&[b"Set-Cookie: a=1", b"set-cookie: b=2"]);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("set-cookie"), Some("b=2"));
    }

    #[test]
    fn header_bytes_decode_as_latin1() {
        let headers = accumulate(&[b"X-Name: Jos\xe9"]);
        assert_eq!(headers.get("x-name"), Some("José"));
    }

    #[test]
    fn headers_readable_mid_stream() {
        let mut acc = HeaderAccumulator::new();
        acc.record(b"A: 1");
        assert_eq!(acc.headers().get("a"), Some("1"));
        acc.record(b"B: 2");
        assert_eq!(acc.headers().len(), 2);
    }

    #[test]
    fn content_concatenates_in_order() {
        let mut acc = ContentAccumulator::new();
        for chunk in [&b"ab"[..], b"", b"cd"] {
            acc.append(chunk);
        }
        assert_eq!(acc.value(), b"abcd");
        assert_eq!(acc.into_value(), b"abcd".to_vec());
    }

    #[test]
    fn empty_content_is_empty() {
        assert!(ContentAccumulator::new().value().is_empty());
    }
}
