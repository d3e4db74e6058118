//! Core of the remote-service import bridge
//!
//! This library provides:
//! - Endpoint descriptors and importer configuration
//! - Interface resolution against active modules only
//! - Call channels over an injected transport session
//! - Proxies with direct and name + arity dispatch
//! - The endpoint registry driving the import lifecycle

pub mod config;
pub mod endpoint;
pub mod error;
pub mod method;
pub mod proxy;
pub mod registry;
pub mod resolver;
pub mod services;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::ImporterConfig;
pub use endpoint::{EndpointDescriptor, Properties};
pub use error::{ImportError, InvocationError, PublishError, Result, TransportError};
pub use method::find_method;
pub use proxy::{ProxyBuilder, ProxyHandle};
pub use registry::{EndpointListener, EndpointRegistry, ImportOutcome};
pub use resolver::{ResolvedInterfaceSet, TypeResolver};
pub use services::{LocalServiceRegistry, PublishedService, RegistrationHandle, ServicePublisher};
pub use transport::{Channel, Session, SessionFactory};
pub use types::{MethodSignature, Module, ModuleRegistry, ModuleState, TypeDescriptor, TypeLookup};
