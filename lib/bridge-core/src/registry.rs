//! Endpoint registry: imports remote endpoints as local proxies

use crate::config::ImporterConfig;
use crate::endpoint::{EndpointDescriptor, Properties};
use crate::proxy::{ProxyBuilder, ProxyHandle};
use crate::resolver::TypeResolver;
use crate::services::{RegistrationHandle, ServicePublisher};
use crate::transport::{Channel, SessionFactory};
use crate::types::TypeLookup;
use crate::{ImportError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Result of an import request that did not fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The endpoint has been imported and published
    Imported,
    /// None of the endpoint configurations is handled here
    Unsupported,
    /// The endpoint was already imported
    AlreadyImported,
}

/// Receives endpoint lifecycle events from the discovery side
#[async_trait]
pub trait EndpointListener: Send + Sync {
    async fn endpoint_added(&self, descriptor: &EndpointDescriptor);

    async fn endpoint_updated(&self, descriptor: &EndpointDescriptor, old_properties: &Properties);

    async fn endpoint_removed(&self, uid: &str);
}

/// A live import
struct ImportedEndpoint {
    proxy: Arc<ProxyHandle>,
    registration: RegistrationHandle,
    access_url: String,
}

/// EndpointRegistry owns the endpoint UID -> {channel, proxy, registration} table.
///
/// Every lifecycle operation holds the table lock for its whole duration, so
/// an add and a remove for the same endpoint never interleave.
pub struct EndpointRegistry {
    config: ImporterConfig,
    resolver: TypeResolver,
    builder: ProxyBuilder,
    sessions: Arc<dyn SessionFactory>,
    publisher: Arc<dyn ServicePublisher>,
    endpoints: Mutex<HashMap<String, ImportedEndpoint>>,
}

impl EndpointRegistry {
    pub fn new(
        config: ImporterConfig,
        lookup: Arc<dyn TypeLookup>,
        sessions: Arc<dyn SessionFactory>,
        publisher: Arc<dyn ServicePublisher>,
    ) -> Self {
        Self {
            config,
            resolver: TypeResolver::new(lookup.clone()),
            builder: ProxyBuilder::new(lookup),
            sessions,
            publisher,
            endpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Import an endpoint.
    ///
    /// Nothing is recorded unless every step succeeds; a channel opened before
    /// a failure is closed before returning.
    pub async fn import(&self, descriptor: &EndpointDescriptor) -> Result<ImportOutcome> {
        let mut endpoints = self.endpoints.lock().await;

        if !self.config.supports(&descriptor.configurations) {
            debug!("Ignoring {}: no supported configuration", descriptor.uid);
            return Ok(ImportOutcome::Unsupported);
        }

        let access_url = match descriptor.access_url(
            &self.config.access_url_property,
            &self.config.server_placeholder,
        ) {
            Some(url) => url,
            None => {
                warn!("No access URL given: {}", descriptor);
                return Err(ImportError::MissingProperty(
                    self.config.access_url_property.clone(),
                ));
            }
        };
        debug!("Chosen access: {}", access_url);

        if endpoints.contains_key(&descriptor.uid) {
            debug!("Endpoint {} already imported", descriptor.uid);
            return Ok(ImportOutcome::AlreadyImported);
        }

        let name = match descriptor.endpoint_name(
            &self.config.name_property,
            &self.config.service_id_property,
        ) {
            Some(name) => name,
            None => {
                error!("Remote endpoint has no name: {}", descriptor);
                return Err(ImportError::MissingProperty(self.config.name_property.clone()));
            }
        };
        debug!("Importing {} with name: {}", descriptor, name);

        let interfaces = self.resolver.resolve(&descriptor.interfaces)?;

        let channel = Channel::open(self.sessions.as_ref(), &access_url)
            .await
            .map_err(|e| {
                error!("Can't open a channel to {}: {}", access_url, e);
                ImportError::from(e)
            })?;
        let proxy = Arc::new(self.builder.build(channel, name, interfaces));

        let registration = match self
            .publisher
            .publish(&descriptor.interfaces, proxy.clone(), descriptor.properties.clone())
            .await
        {
            Ok(registration) => registration,
            Err(e) => {
                error!("Can't publish proxy for {}: {}", descriptor.uid, e);
                proxy.close().await;
                return Err(e.into());
            }
        };

        endpoints.insert(
            descriptor.uid.clone(),
            ImportedEndpoint {
                proxy,
                registration,
                access_url,
            },
        );

        info!("Imported endpoint {} as {}", descriptor.uid, registration);
        Ok(ImportOutcome::Imported)
    }

    /// Propagate new properties of an imported endpoint.
    ///
    /// The channel and proxy are kept as they are. Returns false if the
    /// endpoint is unknown or the publisher refused the update.
    pub async fn update(&self, descriptor: &EndpointDescriptor, old_properties: &Properties) -> bool {
        let endpoints = self.endpoints.lock().await;

        let Some(entry) = endpoints.get(&descriptor.uid) else {
            debug!("Unknown endpoint: {}", descriptor.uid);
            return false;
        };

        if let Some(url) = descriptor.access_url(
            &self.config.access_url_property,
            &self.config.server_placeholder,
        ) {
            if url != entry.access_url {
                warn!(
                    "Access URL of {} changed from {} to {}; keeping the current channel",
                    descriptor.uid, entry.access_url, url
                );
            }
        }

        debug!(
            "Updating {} ({} old properties, {} new)",
            descriptor.uid,
            old_properties.len(),
            descriptor.properties.len()
        );

        match self
            .publisher
            .update_properties(entry.registration, descriptor.properties.clone())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("Can't update properties of {}: {}", descriptor.uid, e);
                false
            }
        }
    }

    /// Remove an imported endpoint: unpublish first, then close the channel.
    ///
    /// Returns false if the endpoint is unknown.
    pub async fn remove(&self, uid: &str) -> bool {
        let mut endpoints = self.endpoints.lock().await;

        let Some(entry) = endpoints.remove(uid) else {
            debug!("Unknown endpoint: {}", uid);
            return false;
        };

        self.teardown(uid, entry).await;
        true
    }

    /// Remove every imported endpoint; returns how many were removed
    pub async fn shutdown(&self) -> usize {
        let mut endpoints = self.endpoints.lock().await;

        let mut uids: Vec<String> = endpoints.keys().cloned().collect();
        uids.sort();

        let mut count = 0;
        for uid in uids {
            if let Some(entry) = endpoints.remove(&uid) {
                self.teardown(&uid, entry).await;
                count += 1;
            }
        }

        info!("Removed {} imported endpoint(s)", count);
        count
    }

    /// Get the proxy of an imported endpoint
    pub async fn imported(&self, uid: &str) -> Option<Arc<ProxyHandle>> {
        let endpoints = self.endpoints.lock().await;
        endpoints.get(uid).map(|entry| entry.proxy.clone())
    }

    /// UIDs of the imported endpoints, sorted
    pub async fn imported_uids(&self) -> Vec<String> {
        let endpoints = self.endpoints.lock().await;
        let mut uids: Vec<String> = endpoints.keys().cloned().collect();
        uids.sort();
        uids
    }

    /// Get count of imported endpoints
    pub async fn imported_count(&self) -> usize {
        let endpoints = self.endpoints.lock().await;
        endpoints.len()
    }

    async fn teardown(&self, uid: &str, entry: ImportedEndpoint) {
        if let Err(e) = self.publisher.unpublish(entry.registration).await {
            warn!("Error unpublishing {}: {}", uid, e);
        }
        entry.proxy.close().await;
        info!("Removed endpoint {}", uid);
    }
}

#[async_trait]
impl EndpointListener for EndpointRegistry {
    async fn endpoint_added(&self, descriptor: &EndpointDescriptor) {
        if let Err(e) = self.import(descriptor).await {
            debug!("Import of {} aborted: {}", descriptor.uid, e);
        }
    }

    async fn endpoint_updated(&self, descriptor: &EndpointDescriptor, old_properties: &Properties) {
        self.update(descriptor, old_properties).await;
    }

    async fn endpoint_removed(&self, uid: &str) {
        self.remove(uid).await;
    }
}
