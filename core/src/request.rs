//! Request builder: final URL and effective header set for one exchange.
//!
//! # Design
//! The builder is pure. It never touches the network, so everything a
//! backend sends (URL, headers, payload, merged options) can be checked
//! without a server. Query parameters and extra headers travel in separate
//! fields of `RequestOptions`, so headers are never encoded into the URL.

use std::collections::BTreeMap;

use serde::Deserialize;
use url::form_urlencoded;

use crate::error::TransportError;
use crate::http::{Credentials, Headers, HttpMethod, TransportRequest};
use crate::options::{BackendOptions, OptionValue};

/// A scalar query parameter value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl QueryValue {
    /// Render the value as it appears in the query string (before
    /// percent-encoding). Non-finite floats have no textual form.
    pub fn encode(&self, key: &str) -> Result<String, TransportError> {
        match self {
            QueryValue::Bool(b) => Ok(b.to_string()),
            QueryValue::Int(n) => Ok(n.to_string()),
            QueryValue::Float(f) if f.is_finite() => Ok(f.to_string()),
            QueryValue::Float(f) => Err(TransportError::Encoding {
                key: key.to_string(),
                reason: format!("{f} is not a finite number"),
            }),
            QueryValue::Str(s) => Ok(s.clone()),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

/// Query parameters for one call. Order of insertion does not matter; the
/// encoded query lists keys in sorted order.
pub type QueryParams = BTreeMap<String, QueryValue>;

/// Caller-supplied keyword options for a single call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub params: QueryParams,
    pub headers: Option<Headers>,
    pub backend: BackendOptions,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.get_or_insert_with(Headers::new).insert(name, value);
        self
    }

    pub fn backend_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.backend.insert(key, value);
        self
    }
}

/// Builds final URLs and header sets on behalf of a transport service.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    user_agent: &'a str,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(user_agent: &'a str) -> Self {
        Self { user_agent }
    }

    /// Merge `params` into `url` and assemble the base header set.
    ///
    /// Parameters are appended with `?`, or with `&` when `url` already has a
    /// query. `user-agent` is always set last so an extra header cannot
    /// replace it.
    pub fn build(
        &self,
        url: &str,
        params: &QueryParams,
        extra_headers: Option<&Headers>,
    ) -> Result<(String, Headers), TransportError> {
        let mut final_url = url.to_string();
        if !params.is_empty() {
            let query = encode_query(params)?;
            final_url.push(if url.contains('?') { '&' } else { '?' });
            final_url.push_str(&query);
        }

        let mut headers = Headers::new();
        if let Some(extra) = extra_headers {
            tracing::debug!(headers = ?extra, "extra headers passed in");
            headers.merge(extra);
        }
        headers.insert("User-Agent", self.user_agent);

        Ok((final_url, headers))
    }

    /// Produce the complete request a backend executes.
    ///
    /// `content-type` is set only for PUT/POST and only when `content_type`
    /// is non-empty. Call-time backend options win over `defaults`.
    #[allow(clippy::too_many_arguments)]
    pub fn prepare(
        &self,
        method: HttpMethod,
        url: &str,
        payload: Option<&[u8]>,
        content_type: Option<&str>,
        credentials: Option<&Credentials>,
        options: RequestOptions,
        defaults: &BackendOptions,
    ) -> Result<TransportRequest, TransportError> {
        let (url, mut headers) = self.build(url, &options.params, options.headers.as_ref())?;

        let payload = if method.has_payload() {
            if let Some(content_type) = content_type.filter(|ct| !ct.is_empty()) {
                headers.insert("Content-Type", content_type);
            }
            Some(payload.unwrap_or_default().to_vec())
        } else {
            None
        };

        if !options.backend.is_empty() {
            tracing::debug!(options = ?options.backend, "backend options passed in");
        }
        let options = options.backend.merged_over(defaults);

        tracing::debug!(method = method.as_str(), url = %url, "about to send request");

        Ok(TransportRequest {
            method,
            url,
            headers,
            payload,
            credentials: credentials.cloned(),
            options,
        })
    }
}

fn encode_query(params: &QueryParams) -> Result<String, TransportError> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, &value.encode(key)?);
    }
    Ok(serializer.finish())
}
