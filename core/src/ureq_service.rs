//! High-level backend built on ureq.
//!
//! # Design
//! A fresh agent is configured for every call from the merged backend
//! options, so no connection, cookie or credential state carries from one
//! exchange to the next. Status codes come back as data rather than errors;
//! ureq follows redirects itself.

use std::io::Read;

use ureq::{Agent, RequestBuilder};

use crate::config::DEFAULT_USER_AGENT;
use crate::error::TransportError;
use crate::http::{HttpMethod, TransportRequest};
use crate::options::{BackendOptions, CONNECT_TIMEOUT_SECS, MAX_REDIRECTS, TIMEOUT_SECS};
use crate::response::NormalizedResponse;
use crate::service::{Exchange, TransportService};

const KNOWN_OPTIONS: &[&str] = &[TIMEOUT_SECS, CONNECT_TIMEOUT_SECS, MAX_REDIRECTS];

/// Transport service backed by a ureq agent.
#[derive(Debug, Clone)]
pub struct UreqService {
    user_agent: String,
    defaults: BackendOptions,
}

impl UreqService {
    pub fn new() -> Self {
        Self::with_options(DEFAULT_USER_AGENT, BackendOptions::new())
    }

    pub fn with_options(user_agent: impl Into<String>, defaults: BackendOptions) -> Self {
        Self {
            user_agent: user_agent.into(),
            defaults,
        }
    }

    fn agent(options: &BackendOptions) -> Agent {
        options.warn_unrecognized("ureq", KNOWN_OPTIONS);

        let mut config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(options.duration_secs(TIMEOUT_SECS))
            .timeout_connect(options.duration_secs(CONNECT_TIMEOUT_SECS));
        if let Some(max) = options.u32_value(MAX_REDIRECTS) {
            config = config.max_redirects(max);
        }
        config.build().new_agent()
    }
}

impl Default for UreqService {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportService for UreqService {
    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn default_options(&self) -> &BackendOptions {
        &self.defaults
    }

    fn execute(&self, request: TransportRequest) -> Result<Exchange, TransportError> {
        let agent = Self::agent(&request.options);
        let payload = request.payload.as_deref().unwrap_or_default();

        let response = match request.method {
            HttpMethod::Get => apply_headers(agent.get(&request.url), &request).call()?,
            HttpMethod::Delete => apply_headers(agent.delete(&request.url), &request).call()?,
            HttpMethod::Put => apply_headers(agent.put(&request.url), &request).send(payload)?,
            HttpMethod::Post => apply_headers(agent.post(&request.url), &request).send(payload)?,
        };

        let (parts, body) = response.into_parts();
        let mut content = Vec::new();
        body.into_reader().read_to_end(&mut content)?;

        let normalized = NormalizedResponse::from_http_parts(&parts);
        tracing::debug!(
            method = request.method.as_str(),
            url = %request.url,
            status = normalized.status(),
            bytes = content.len(),
            "request complete"
        );
        Ok((normalized, content))
    }
}

/// Copy the effective headers and any credentials onto a ureq request.
fn apply_headers<B>(mut builder: RequestBuilder<B>, request: &TransportRequest) -> RequestBuilder<B> {
    for (name, value) in request.headers.iter() {
        builder = builder.header(name, value);
    }
    if let Some(credentials) = &request.credentials {
        builder = builder.header("authorization", credentials.basic_authorization().as_str());
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestOptions;

    #[test]
    fn default_user_agent_names_the_library() {
        let svc = UreqService::new();
        assert!(svc.user_agent().starts_with("cmislib/"));
        assert!(svc.default_options().is_empty());
    }

    #[test]
    fn unreachable_host_surfaces_transport_error() {
        // Port 9 on localhost is the discard service and is closed on test hosts.
        let svc = UreqService::with_options("t/0", BackendOptions::new().with(CONNECT_TIMEOUT_SECS, 2i64));
        let err = svc.get("http://127.0.0.1:9/", None, RequestOptions::new()).unwrap_err();
        assert!(matches!(err, TransportError::Http(_)));
    }
}
