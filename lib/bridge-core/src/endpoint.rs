//! Endpoint descriptors delivered by the discovery side
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Endpoint and service properties
pub type Properties = BTreeMap<String, Value>;

/// Description of a remotely published service.
///
/// A descriptor is immutable once delivered; an update event carries a new
/// descriptor for the same `uid` which supersedes the previous properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    /// Globally unique endpoint identifier
    pub uid: String,

    /// Interface names, in declaration order
    #[serde(default)]
    pub interfaces: Vec<String>,

    /// Export configuration tags (e.g. "jabsorb-rpc")
    #[serde(default)]
    pub configurations: Vec<String>,

    /// Access URLs, endpoint name and arbitrary metadata
    #[serde(default)]
    pub properties: Properties,

    /// Host substituted into access URL templates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

impl EndpointDescriptor {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            ..Default::default()
        }
    }

    pub fn with_interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    pub fn with_configuration(mut self, config: impl Into<String>) -> Self {
        self.configurations.push(config.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    /// Get a non-empty string property
    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Compute the access URL from a comma-separated list property.
    ///
    /// Only the first entry is used. When the descriptor carries a server
    /// hint, every occurrence of `placeholder` is replaced by it.
    pub fn access_url(&self, key: &str, placeholder: &str) -> Option<String> {
        let raw = self.string_property(key)?;
        let first = raw.split(',').next().map(str::trim).unwrap_or_default();
        if first.is_empty() {
            return None;
        }

        match self.server.as_deref() {
            Some(server) if !server.is_empty() && !placeholder.is_empty() => {
                Some(first.replace(placeholder, server))
            }
            _ => Some(first.to_string()),
        }
    }

    /// Compute the remote endpoint name.
    ///
    /// Falls back to `service_<id>` when no explicit name is set and the
    /// service identifier property holds a non-zero integer.
    pub fn endpoint_name(&self, name_key: &str, service_id_key: &str) -> Option<String> {
        if let Some(name) = self.string_property(name_key) {
            return Some(name.to_string());
        }

        let service_id = match self.properties.get(service_id_key)? {
            Value::Number(number) => number.as_i64(),
            Value::String(raw) => raw.trim().parse::<i64>().ok(),
            _ => None,
        };

        service_id
            .filter(|id| *id != 0)
            .map(|id| format!("service_{}", id))
    }
}

impl fmt::Display for EndpointDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Endpoint(uid={}, interfaces={:?}, configurations={:?})",
            self.uid, self.interfaces, self.configurations
        )
    }
}
