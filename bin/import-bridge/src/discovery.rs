//! Endpoint discovery from a polled descriptor file

use anyhow::{Context, Result};
use bridge_core::{EndpointDescriptor, EndpointListener, ImporterConfig, Module, Properties};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

fn default_poll_interval_secs() -> u64 {
    30
}

/// Contents of the bridge file
#[derive(Debug, Default, Deserialize)]
pub struct BridgeFile {
    #[serde(default)]
    pub config: ImporterConfig,

    /// Modules exporting the interfaces that can be imported
    #[serde(default)]
    pub modules: Vec<Module>,

    /// Remote endpoints currently published
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl BridgeFile {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Lifecycle event derived from two successive snapshots
#[derive(Clone, Debug, PartialEq)]
pub enum EndpointEvent {
    Added(EndpointDescriptor),
    Updated(EndpointDescriptor, Properties),
    Removed(String),
}

/// Known endpoints, by UID
#[derive(Clone, Debug, Default)]
pub struct EndpointSnapshot {
    endpoints: BTreeMap<String, EndpointDescriptor>,
}

impl EndpointSnapshot {
    pub fn new(endpoints: impl IntoIterator<Item = EndpointDescriptor>) -> Self {
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|descriptor| (descriptor.uid.clone(), descriptor))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Compute the events turning `self` into `next`.
    ///
    /// Removals come first. A property-only change is an update; any other
    /// change replaces the endpoint (removal then addition).
    pub fn diff(&self, next: &EndpointSnapshot) -> Vec<EndpointEvent> {
        let mut removed = Vec::new();
        let mut added = Vec::new();
        let mut updated = Vec::new();

        for (uid, old) in &self.endpoints {
            match next.endpoints.get(uid) {
                None => removed.push(EndpointEvent::Removed(uid.clone())),
                Some(new) if new == old => {}
                Some(new) if Self::same_shape(old, new) => {
                    updated.push(EndpointEvent::Updated(new.clone(), old.properties.clone()));
                }
                Some(new) => {
                    removed.push(EndpointEvent::Removed(uid.clone()));
                    added.push(EndpointEvent::Added(new.clone()));
                }
            }
        }

        for (uid, new) in &next.endpoints {
            if !self.endpoints.contains_key(uid) {
                added.push(EndpointEvent::Added(new.clone()));
            }
        }

        removed.into_iter().chain(updated).chain(added).collect()
    }

    /// Re-add events for endpoints unchanged in `next` but not imported.
    ///
    /// Used after the module set changed, when interfaces that failed to
    /// resolve may have become available.
    pub fn retries(&self, next: &EndpointSnapshot, imported: &[String]) -> Vec<EndpointEvent> {
        self.endpoints
            .iter()
            .filter(|(uid, old)| next.endpoints.get(*uid) == Some(*old))
            .filter(|(uid, _)| !imported.contains(*uid))
            .map(|(_, descriptor)| EndpointEvent::Added(descriptor.clone()))
            .collect()
    }

    fn same_shape(old: &EndpointDescriptor, new: &EndpointDescriptor) -> bool {
        old.interfaces == new.interfaces
            && old.configurations == new.configurations
            && old.server == new.server
    }
}

/// Deliver events to a listener, in order
pub async fn dispatch(listener: &dyn EndpointListener, events: &[EndpointEvent]) {
    for event in events {
        match event {
            EndpointEvent::Added(descriptor) => {
                debug!("Endpoint added: {}", descriptor.uid);
                listener.endpoint_added(descriptor).await;
            }
            EndpointEvent::Updated(descriptor, old_properties) => {
                debug!("Endpoint updated: {}", descriptor.uid);
                listener.endpoint_updated(descriptor, old_properties).await;
            }
            EndpointEvent::Removed(uid) => {
                debug!("Endpoint removed: {}", uid);
                listener.endpoint_removed(uid).await;
            }
        }
    }
}
