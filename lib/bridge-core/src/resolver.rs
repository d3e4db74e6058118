//! Resolution of endpoint interface names to loadable types

use crate::types::{MethodSignature, TypeDescriptor, TypeLookup};
use crate::{ImportError, Result};
use std::sync::Arc;
use tracing::{error, warn};

/// Interfaces of an endpoint that could be loaded locally
#[derive(Clone, Debug)]
pub struct ResolvedInterfaceSet {
    types: Vec<Arc<TypeDescriptor>>,
    unresolved: Vec<String>,
}

impl ResolvedInterfaceSet {
    /// Resolved types, in the order the names were requested
    pub fn types(&self) -> &[Arc<TypeDescriptor>] {
        &self.types
    }

    /// Names that could not be resolved
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(|ty| ty.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|ty| ty.name == name)
    }

    pub fn is_partial(&self) -> bool {
        !self.unresolved.is_empty()
    }

    /// All methods, interface by interface
    pub fn methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.types.iter().flat_map(|ty| ty.methods.iter())
    }
}

/// Resolves interface names through a module-scoped lookup
#[derive(Clone)]
pub struct TypeResolver {
    lookup: Arc<dyn TypeLookup>,
}

impl TypeResolver {
    pub fn new(lookup: Arc<dyn TypeLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve each name independently against active modules.
    ///
    /// Unresolved names are reported in a single warning; the call only fails
    /// when nothing at all could be resolved.
    pub fn resolve(&self, names: &[String]) -> Result<ResolvedInterfaceSet> {
        if names.is_empty() {
            error!("No/Empty interface list");
            return Err(ImportError::ResolutionFailure {
                requested: Vec::new(),
            });
        }

        let mut types = Vec::with_capacity(names.len());
        let mut unresolved = Vec::new();

        for name in names.iter().filter(|name| !name.is_empty()) {
            match self.lookup.find_type(name, true) {
                Some(ty) => types.push(ty),
                None => unresolved.push(name.clone()),
            }
        }

        if types.is_empty() {
            error!("No interface found in: {:?}", names);
            return Err(ImportError::ResolutionFailure {
                requested: names.to_vec(),
            });
        }

        if !unresolved.is_empty() {
            warn!("Some interfaces are missing: {:?}", unresolved);
        }

        Ok(ResolvedInterfaceSet { types, unresolved })
    }
}
