//! Native HTTP/1.1 handle used by the low-level backend.
//!
//! # Design
//! `RawHandle` works the way a curl easy handle does. Configure it with
//! setters, call `perform` once, then read the status with `response_code`.
//! During `perform` every raw header line (status line and blank
//! terminator included) and every body chunk is pushed to a `ResponseSink`
//! as it comes off the socket. The handle owns its socket and shuts it down
//! on drop, so it is released on every exit path.
//!
//! Body framing: `Content-Length`, `Transfer-Encoding: chunked` (decoded
//! before delivery; trailer lines go to the sink as header lines), or
//! read-until-close. Interim 1xx heads are passed through and skipped.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use url::Url;

use crate::error::TransportError;
use crate::http::{decode_latin1, Credentials, Headers, HttpMethod};

const READ_CHUNK: usize = 8 * 1024;

/// Headers the handle writes itself; caller-supplied copies are dropped.
const MANAGED_HEADERS: &[&str] = &["host", "user-agent", "content-length", "connection", "authorization"];

/// Receives response data from `RawHandle::perform` in arrival order.
pub trait ResponseSink {
    /// One raw header line, including its line terminator.
    fn header_line(&mut self, line: &[u8]);

    /// One decoded piece of the response body.
    fn content(&mut self, chunk: &[u8]);
}

/// A single-use HTTP/1.1 exchange over a plain TCP connection.
#[derive(Debug)]
pub struct RawHandle {
    url: Url,
    method: HttpMethod,
    user_agent: Option<String>,
    headers: Headers,
    credentials: Option<Credentials>,
    body: Option<Vec<u8>>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    stream: Option<TcpStream>,
    response_code: u16,
}

impl RawHandle {
    /// Acquire a handle for `url`. Nothing is connected until `perform`.
    pub fn new(url: &str) -> Result<Self, TransportError> {
        let url = Url::parse(url)?;
        if url.scheme() != "http" {
            return Err(TransportError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.host_str().is_none() {
            return Err(TransportError::InvalidUrl(url::ParseError::EmptyHost));
        }
        Ok(Self {
            url,
            method: HttpMethod::Get,
            user_agent: None,
            headers: Headers::new(),
            credentials: None,
            body: None,
            timeout: None,
            connect_timeout: None,
            stream: None,
            response_code: 0,
        })
    }

    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    pub fn set_user_agent(&mut self, user_agent: &str) -> Result<(), TransportError> {
        check_field_value("user-agent", user_agent)?;
        self.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    /// Replace the request header list. Names must be HTTP tokens and values
    /// must not contain line breaks; otherwise nothing is replaced.
    pub fn set_headers(&mut self, headers: Headers) -> Result<(), TransportError> {
        for (name, value) in headers.iter() {
            if name.is_empty() || !name.bytes().all(is_token_byte) {
                return Err(TransportError::InvalidHeader {
                    name: name.to_string(),
                    reason: "name is not an HTTP token".to_string(),
                });
            }
            check_field_value(name, value)?;
        }
        self.headers = headers;
        Ok(())
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = Some(body);
    }

    /// Read and write timeout applied to the socket.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn set_connect_timeout(&mut self, timeout: Option<Duration>) {
        self.connect_timeout = timeout;
    }

    /// Status code of the final response; `0` until `perform` succeeds.
    pub fn response_code(&self) -> u16 {
        self.response_code
    }

    /// Connect, send the request and stream the response into `sink`.
    pub fn perform<S: ResponseSink>(&mut self, sink: &mut S) -> Result<(), TransportError> {
        let head = self.request_head();
        let stream = self.stream.insert(connect(&self.url, self.connect_timeout)?);
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;

        stream.write_all(head.as_bytes())?;
        if let Some(body) = &self.body {
            stream.write_all(body)?;
        }
        stream.flush()?;

        let mut reader = BufReader::new(&*stream);
        self.response_code = read_response(&mut reader, sink)?;
        Ok(())
    }

    fn request_head(&self) -> String {
        let mut target = self.url.path().to_string();
        if let Some(query) = self.url.query() {
            target.push('?');
            target.push_str(query);
        }
        let host = match (self.url.host_str(), self.url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        let mut head = format!("{} {target} HTTP/1.1\r\nHost: {host}\r\n", self.method.as_str());
        if let Some(user_agent) = &self.user_agent {
            head.push_str(&format!("User-Agent: {user_agent}\r\n"));
        }
        if let Some(credentials) = &self.credentials {
            head.push_str(&format!("Authorization: {}\r\n", credentials.basic_authorization()));
        }
        for (name, value) in self.headers.iter() {
            if !MANAGED_HEADERS.contains(&name) {
                head.push_str(&format!("{name}: {value}\r\n"));
            }
        }
        if self.body.is_some() || self.method.has_payload() {
            let len = self.body.as_ref().map_or(0, Vec::len);
            head.push_str(&format!("Content-Length: {len}\r\n"));
        }
        head.push_str("Connection: close\r\n\r\n");
        head
    }
}

impl Drop for RawHandle {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.shutdown(Shutdown::Both) {
                tracing::trace!(error = %err, "socket shutdown failed");
            }
            tracing::trace!(url = %self.url, "raw handle released");
        }
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn check_field_value(name: &str, value: &str) -> Result<(), TransportError> {
    if value.contains(|c: char| matches!(c, '\r' | '\n' | '\0')) {
        return Err(TransportError::InvalidHeader {
            name: name.to_string(),
            reason: "value contains a line break or NUL".to_string(),
        });
    }
    Ok(())
}

fn connect(url: &Url, timeout: Option<Duration>) -> Result<TcpStream, TransportError> {
    let addrs = url.socket_addrs(|| Some(80))?;
    let Some(timeout) = timeout else {
        return Ok(TcpStream::connect(&addrs[..])?);
    };
    let mut last_err = None;
    for addr in &addrs {
        match TcpStream::connect_timeout(addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses"))
        .into())
}

/// Response head fields the reader needs for framing.
#[derive(Debug, Default)]
struct Head {
    status: u16,
    content_length: Option<u64>,
    chunked: bool,
}

/// Read one complete response from `reader`, returning the final status.
pub(crate) fn read_response<R: BufRead, S: ResponseSink>(
    reader: &mut R,
    sink: &mut S,
) -> Result<u16, TransportError> {
    let head = loop {
        let head = read_head(reader, sink)?;
        // 101 has no following head; any other 1xx is interim.
        if (100..200).contains(&head.status) && head.status != 101 {
            continue;
        }
        break head;
    };

    if matches!(head.status, 101 | 204 | 304) {
        return Ok(head.status);
    }

    if head.chunked {
        read_chunked(reader, sink)?;
    } else if let Some(len) = head.content_length {
        read_exact_len(reader, len, sink)?;
    } else {
        read_to_close(reader, sink)?;
    }
    Ok(head.status)
}

fn read_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> Result<bool, TransportError> {
    line.clear();
    Ok(reader.read_until(b'\n', line)? > 0)
}

fn read_head<R: BufRead, S: ResponseSink>(reader: &mut R, sink: &mut S) -> Result<Head, TransportError> {
    let mut line = Vec::new();
    if !read_line(reader, &mut line)? {
        return Err(TransportError::MalformedResponse(
            "connection closed before status line".to_string(),
        ));
    }
    sink.header_line(&line);
    let mut head = Head {
        status: parse_status_line(&line)?,
        ..Head::default()
    };

    loop {
        if !read_line(reader, &mut line)? {
            return Err(TransportError::MalformedResponse(
                "connection closed inside response headers".to_string(),
            ));
        }
        sink.header_line(&line);
        let text = decode_latin1(&line);
        let text = text.trim();
        if text.is_empty() {
            return Ok(head);
        }
        let Some((name, value)) = text.split_once(':') else {
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        if name.eq_ignore_ascii_case("content-length") {
            let len = value.parse().map_err(|_| {
                TransportError::MalformedResponse(format!("invalid content-length {value:?}"))
            })?;
            head.content_length = Some(len);
        } else if name.eq_ignore_ascii_case("transfer-encoding") {
            head.chunked = value.to_ascii_lowercase().contains("chunked");
        }
    }
}

fn parse_status_line(line: &[u8]) -> Result<u16, TransportError> {
    let text = decode_latin1(line);
    let mut parts = text.split_whitespace();
    let version = parts.next().unwrap_or_default();
    let code = parts.next().and_then(|c| c.parse::<u16>().ok());
    match code {
        Some(code) if version.starts_with("HTTP/") => Ok(code),
        _ => Err(TransportError::MalformedResponse(format!(
            "invalid status line {:?}",
            text.trim_end()
        ))),
    }
}

fn read_exact_len<R: Read, S: ResponseSink>(
    reader: &mut R,
    len: u64,
    sink: &mut S,
) -> Result<(), TransportError> {
    let mut buf = [0u8; READ_CHUNK];
    let mut remaining = len;
    while remaining > 0 {
        let want = remaining.min(READ_CHUNK as u64) as usize;
        let n = match reader.read(&mut buf[..want]) {
            Ok(0) => {
                return Err(TransportError::MalformedResponse(format!(
                    "connection closed with {remaining} body bytes outstanding"
                )))
            }
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        sink.content(&buf[..n]);
        remaining -= n as u64;
    }
    Ok(())
}

fn read_to_close<R: Read, S: ResponseSink>(reader: &mut R, sink: &mut S) -> Result<(), TransportError> {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => sink.content(&buf[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

fn read_chunked<R: BufRead, S: ResponseSink>(reader: &mut R, sink: &mut S) -> Result<(), TransportError> {
    let mut line = Vec::new();
    loop {
        if !read_line(reader, &mut line)? {
            return Err(TransportError::MalformedResponse(
                "connection closed before last chunk".to_string(),
            ));
        }
        let text = decode_latin1(&line);
        let size_field = text.split(';').next().unwrap_or_default().trim();
        let size = u64::from_str_radix(size_field, 16).map_err(|_| {
            TransportError::MalformedResponse(format!("invalid chunk size {size_field:?}"))
        })?;

        if size == 0 {
            while read_line(reader, &mut line)? {
                if line.iter().all(u8::is_ascii_whitespace) {
                    break;
                }
                sink.header_line(&line);
            }
            return Ok(());
        }

        read_exact_len(reader, size, sink)?;
        read_line(reader, &mut line)?;
    }
}
