//! Local proxies forwarding invocations to a remote endpoint

use crate::method::find_method;
use crate::resolver::ResolvedInterfaceSet;
use crate::transport::Channel;
use crate::types::{MethodSignature, TypeLookup};
use crate::InvocationError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Key of the type hint carried by marshalled objects
const CLASS_HINT: &str = "javaClass";

/// Builds proxies over call channels
#[derive(Clone)]
pub struct ProxyBuilder {
    loader: Arc<dyn TypeLookup>,
}

impl ProxyBuilder {
    /// Create a builder; `loader` is used to check result type hints
    pub fn new(loader: Arc<dyn TypeLookup>) -> Self {
        Self { loader }
    }

    /// Build a proxy named `name` implementing `interfaces` over `channel`
    pub fn build(
        &self,
        channel: Channel,
        name: impl Into<String>,
        interfaces: ResolvedInterfaceSet,
    ) -> ProxyHandle {
        let name = name.into();
        debug!(
            "Created proxy {} for {:?} on {}",
            name,
            interfaces.names(),
            channel.url()
        );
        ProxyHandle {
            name,
            interfaces,
            channel,
            loader: self.loader.clone(),
        }
    }
}

/// A dispatcher exposing the union of the resolved interfaces' methods.
///
/// Invocations are sent as `<name>.<method>` over the channel.
pub struct ProxyHandle {
    name: String,
    interfaces: ResolvedInterfaceSet,
    channel: Channel,
    loader: Arc<dyn TypeLookup>,
}

impl ProxyHandle {
    /// Remote endpoint name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        self.channel.url()
    }

    pub fn interfaces(&self) -> &ResolvedInterfaceSet {
        &self.interfaces
    }

    pub fn interface_names(&self) -> Vec<&str> {
        self.interfaces.names()
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.contains(interface)
    }

    /// Every method this proxy can forward
    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.interfaces.methods()
    }

    pub fn is_closed(&self) -> bool {
        self.channel.is_closed()
    }

    /// Invoke a method whose signature is already known
    pub async fn invoke(&self, method: &MethodSignature, args: Vec<Value>) -> Result<Value, InvocationError> {
        if self.is_closed() {
            return Err(InvocationError::Closed(self.name.clone()));
        }

        let remote_method = format!("{}.{}", self.name, method.name);
        debug!("Calling {} with {} argument(s)", remote_method, args.len());

        let result = self.channel.call(&remote_method, args).await.map_err(|e| {
            debug!("Call to {} failed: {}", remote_method, e);
            InvocationError::from(e)
        })?;

        self.check_class_hint(&result);
        Ok(result)
    }

    /// Invoke a method by name, matching on the number of arguments
    pub async fn call(&self, method_name: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        let method = find_method(self.interfaces.types(), method_name, args.len()).ok_or_else(|| {
            InvocationError::MethodNotFound {
                method: method_name.to_string(),
                arg_count: args.len(),
            }
        })?;
        self.invoke(method, args).await
    }

    /// Release the channel; safe to call more than once
    pub async fn close(&self) {
        if self.channel.close().await {
            debug!("Closed proxy {}", self.name);
        }
    }

    fn check_class_hint(&self, result: &Value) {
        if let Some(class) = result.get(CLASS_HINT).and_then(Value::as_str) {
            if self.loader.find_type(class, false).is_none() {
                debug!("Result type {} of proxy {} is not known locally", class, self.name);
            }
        }
    }
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("name", &self.name)
            .field("interfaces", &self.interfaces.names())
            .field("channel", &self.channel)
            .finish()
    }
}
