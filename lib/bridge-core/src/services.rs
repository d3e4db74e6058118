//! Publication of imported proxies to local consumers

use crate::endpoint::Properties;
use crate::proxy::ProxyHandle;
use crate::PublishError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Token identifying a published proxy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistrationHandle(u64);

impl RegistrationHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "registration #{}", self.0)
    }
}

/// Local service environment receiving imported proxies
#[async_trait]
pub trait ServicePublisher: Send + Sync {
    /// Publish a proxy under the given interface names
    async fn publish(
        &self,
        interfaces: &[String],
        proxy: Arc<ProxyHandle>,
        properties: Properties,
    ) -> Result<RegistrationHandle, PublishError>;

    /// Revoke a publication
    async fn unpublish(&self, handle: RegistrationHandle) -> Result<(), PublishError>;

    /// Replace the properties of a publication
    async fn update_properties(
        &self,
        handle: RegistrationHandle,
        properties: Properties,
    ) -> Result<(), PublishError>;
}

/// A proxy published in the local registry
#[derive(Clone, Debug)]
pub struct PublishedService {
    pub handle: RegistrationHandle,
    pub interfaces: Vec<String>,
    pub proxy: Arc<ProxyHandle>,
    pub properties: Properties,
}

/// LocalServiceRegistry keeps published proxies available to local consumers
pub struct LocalServiceRegistry {
    next_id: AtomicU64,
    // Map of registration ID to published service
    services: Arc<RwLock<HashMap<RegistrationHandle, PublishedService>>>,
}

impl LocalServiceRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            services: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get a published service
    pub async fn get_service(&self, handle: RegistrationHandle) -> Result<PublishedService, PublishError> {
        let services = self.services.read().await;
        services
            .get(&handle)
            .cloned()
            .ok_or(PublishError::UnknownRegistration(handle.id()))
    }

    /// Find the proxies published under an interface name
    pub async fn find(&self, interface: &str) -> Vec<Arc<ProxyHandle>> {
        let services = self.services.read().await;
        let mut matching: Vec<&PublishedService> = services
            .values()
            .filter(|service| service.interfaces.iter().any(|name| name == interface))
            .collect();
        matching.sort_by_key(|service| service.handle.id());
        matching.into_iter().map(|service| service.proxy.clone()).collect()
    }

    /// Get count of published services
    pub async fn service_count(&self) -> usize {
        let services = self.services.read().await;
        services.len()
    }
}

impl Default for LocalServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServicePublisher for LocalServiceRegistry {
    async fn publish(
        &self,
        interfaces: &[String],
        proxy: Arc<ProxyHandle>,
        properties: Properties,
    ) -> Result<RegistrationHandle, PublishError> {
        if interfaces.is_empty() {
            return Err(PublishError::Rejected(format!(
                "proxy {} has no interface",
                proxy.name()
            )));
        }

        let handle = RegistrationHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut services = self.services.write().await;
        services.insert(
            handle,
            PublishedService {
                handle,
                interfaces: interfaces.to_vec(),
                proxy,
                properties,
            },
        );

        debug!("Published {:?} as {}", interfaces, handle);
        Ok(handle)
    }

    async fn unpublish(&self, handle: RegistrationHandle) -> Result<(), PublishError> {
        let mut services = self.services.write().await;
        services
            .remove(&handle)
            .ok_or(PublishError::UnknownRegistration(handle.id()))?;
        debug!("Unpublished {}", handle);
        Ok(())
    }

    async fn update_properties(
        &self,
        handle: RegistrationHandle,
        properties: Properties,
    ) -> Result<(), PublishError> {
        let mut services = self.services.write().await;
        let service = services
            .get_mut(&handle)
            .ok_or(PublishError::UnknownRegistration(handle.id()))?;
        service.properties = properties;
        debug!("Updated properties of {}", handle);
        Ok(())
    }
}
