//! Transport configuration and backend selection.
//!
//! A `TransportConfig` is plain data: which backend to run, the user agent
//! to send, and default backend options. Each service built from it keeps
//! its own copy, so differently configured services can live side by side.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::options::BackendOptions;
use crate::raw_service::RawService;
use crate::service::TransportService;
use crate::ureq_service::UreqService;

/// User agent sent when the configuration does not name one.
pub const DEFAULT_USER_AGENT: &str =
    concat!("cmislib/", env!("CARGO_PKG_VERSION"), " +http://chemistry.apache.org/");

/// Which HTTP engine performs the exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ureq client.
    #[default]
    Ureq,
    /// Raw HTTP/1.1 handle; plain `http://` only.
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub backend: BackendKind,
    pub user_agent: String,
    pub options: BackendOptions,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            options: BackendOptions::new(),
        }
    }
}

impl TransportConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let raw = std::fs::read_to_string(path).map_err(TransportError::ConfigIo)?;
        Self::from_json_str(&raw)
    }

    /// Build the configured backend.
    pub fn into_service(self) -> Box<dyn TransportService> {
        tracing::debug!(backend = ?self.backend, user_agent = %self.user_agent, "building transport service");
        match self.backend {
            BackendKind::Ureq => Box::new(UreqService::with_options(self.user_agent, self.options)),
            BackendKind::Raw => Box::new(RawService::with_options(self.user_agent, self.options)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionValue;

    #[test]
    fn empty_object_yields_defaults() {
        let config = TransportConfig::from_json_str("{}").unwrap();
        assert_eq!(config, TransportConfig::default());
        assert_eq!(config.backend, BackendKind::Ureq);
        assert!(config.user_agent.starts_with("cmislib/"));
    }

    #[test]
    fn parses_backend_and_options() {
        let config = TransportConfig::from_json_str(
            r#"{"backend":"raw","user_agent":"probe/2","options":{"timeout_secs":5,"verbose":true}}"#,
        )
        .unwrap();
        assert_eq!(config.backend, BackendKind::Raw);
        assert_eq!(config.user_agent, "probe/2");
        assert_eq!(config.options.get("timeout_secs"), Some(&OptionValue::Int(5)));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = TransportConfig::from_json_str(r#"{"backend":"curl"}"#).unwrap_err();
        assert!(matches!(err, TransportError::Config(_)));
    }

    #[test]
    fn missing_file_is_a_config_io_error() {
        let err = TransportConfig::from_path("/nonexistent/transport.json").unwrap_err();
        assert!(matches!(err, TransportError::ConfigIo(_)));
    }

    #[test]
    fn selected_service_carries_configuration() {
        let service = TransportConfig {
            backend: BackendKind::Raw,
            user_agent: "probe/2".to_string(),
            options: BackendOptions::new().with("verbose", true),
        }
        .into_service();
        assert_eq!(service.user_agent(), "probe/2");
        assert!(service.default_options().flag("verbose"));
    }
}
