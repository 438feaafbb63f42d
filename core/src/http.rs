//! HTTP vocabulary shared by the request builder, both backends and the
//! response normalizer.
//!
//! # Design
//! `Headers` is the single header representation used on both sides of the
//! exchange. Names are folded to lowercase on insert so lookups never depend
//! on the casing a server or caller happened to use, and a repeated name
//! replaces the earlier value.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::options::BackendOptions;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether requests with this method carry a payload and content type.
    pub fn has_payload(&self) -> bool {
        matches!(self, HttpMethod::Put | HttpMethod::Post)
    }
}

/// Case-insensitive header mapping with a single value per name.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: BTreeMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing any previous value stored under the same
    /// name. The name is trimmed and lowercased, the value trimmed.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.entries
            .insert(fold_name(name), value.trim().to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&fold_name(name)).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&fold_name(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(&fold_name(name))
    }

    /// Copy every entry of `other` over this mapping.
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in other.iter() {
            self.insert(name, value);
        }
    }

    /// Iterate over `(lowercased name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: AsRef<str>, V: AsRef<str>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value.as_ref());
        }
        headers
    }
}

/// Header names whose values never appear in debug output.
const REDACTED_HEADERS: &[&str] = &["authorization", "proxy-authorization", "cookie", "set-cookie"];

impl std::fmt::Debug for Headers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(name, value)| {
                let shown = if REDACTED_HEADERS.contains(&name) { "<redacted>" } else { value };
                (name, shown)
            }))
            .finish()
    }
}

fn fold_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Decode bytes as ISO-8859-1, the charset HTTP header fields travel in.
/// Every byte maps to the code point of the same value, so this never fails.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Username/password pair attached to a single exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value for a preemptive `Authorization: Basic` header.
    pub fn basic_authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A fully prepared request, handed to a backend's `execute`.
///
/// Built per call by `RequestBuilder::prepare` and consumed by the backend;
/// nothing in it outlives the exchange.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: HttpMethod,
    /// Final URL with query parameters already merged in.
    pub url: String,
    /// Effective headers: caller overrides, `user-agent`, and `content-type`
    /// for PUT/POST when one was supplied.
    pub headers: Headers,
    pub payload: Option<Vec<u8>>,
    pub credentials: Option<Credentials>,
    /// Construction-time defaults with call-time options laid over them.
    pub options: BackendOptions,
}
