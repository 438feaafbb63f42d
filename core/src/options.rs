//! Backend-specific options.
//!
//! Options are an open mapping passed through to whichever backend runs the
//! exchange. Each backend picks out the keys it understands and logs the rest.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Overall time budget for one exchange, in whole seconds.
pub const TIMEOUT_SECS: &str = "timeout_secs";
/// Time budget for establishing the connection, in whole seconds.
pub const CONNECT_TIMEOUT_SECS: &str = "connect_timeout_secs";
/// Redirect hops the high-level backend follows before giving up.
pub const MAX_REDIRECTS: &str = "max_redirects";
/// Trace-log every raw header line seen by the low-level backend.
pub const VERBOSE: &str = "verbose";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Str(value)
    }
}

/// Opaque per-backend option mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendOptions(BTreeMap<String, OptionValue>);

impl BackendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Lay `self` over `defaults`: every key from `defaults` is kept unless
    /// `self` supplies the same key, in which case `self` wins.
    pub fn merged_over(&self, defaults: &BackendOptions) -> BackendOptions {
        let mut merged = defaults.0.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        BackendOptions(merged)
    }

    /// Read a non-negative integer option as a number of seconds.
    pub fn duration_secs(&self, key: &str) -> Option<Duration> {
        match self.0.get(key)? {
            OptionValue::Int(secs) if *secs >= 0 => Some(Duration::from_secs(*secs as u64)),
            other => {
                tracing::warn!(option = key, value = ?other, "expected a non-negative number of seconds, ignoring");
                None
            }
        }
    }

    pub fn u32_value(&self, key: &str) -> Option<u32> {
        match self.0.get(key)? {
            OptionValue::Int(n) => match u32::try_from(*n) {
                Ok(n) => Some(n),
                Err(_) => {
                    tracing::warn!(option = key, value = *n, "value out of range, ignoring");
                    None
                }
            },
            other => {
                tracing::warn!(option = key, value = ?other, "expected an integer, ignoring");
                None
            }
        }
    }

    /// A boolean option; absent or non-boolean values read as `false`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.0.get(key), Some(OptionValue::Bool(true)))
    }

    /// Log every key the named backend does not understand.
    pub(crate) fn warn_unrecognized(&self, backend: &str, known: &[&str]) {
        for key in self.0.keys().filter(|k| !known.contains(&k.as_str())) {
            tracing::warn!(backend = backend, option = %key, "ignoring unrecognized backend option");
        }
    }
}
