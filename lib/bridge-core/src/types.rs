//! Interface descriptors and module-scoped type lookup

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// A method declared by a remote interface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
}

impl MethodSignature {
    pub fn new<S: Into<String>>(name: impl Into<String>, parameter_types: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            parameter_types: parameter_types.into_iter().map(Into::into).collect(),
            return_type: None,
        }
    }

    pub fn returning(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.parameter_types.join(", "))
    }
}

/// A loadable interface type
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodSignature>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, methods: Vec<MethodSignature>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }
}

/// Module-scoped type lookup provided by the environment.
///
/// Implementations must never fall back to a process-global registry: the
/// same name may denote distinct types in isolated modules.
pub trait TypeLookup: Send + Sync {
    /// Find a type by name. With `active_only`, only active modules are scanned.
    fn find_type(&self, name: &str, active_only: bool) -> Option<Arc<TypeDescriptor>>;
}

/// Lifecycle state of a module
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    Installed,
    Resolved,
    Active,
    Stopping,
}

/// A module exporting interface types
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub state: ModuleState,
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

#[derive(PartialEq)]
struct ModuleEntry {
    name: String,
    state: ModuleState,
    types: Vec<Arc<TypeDescriptor>>,
}

/// In-memory module registry, scanned in installation order
#[derive(Default)]
pub struct ModuleRegistry {
    modules: RwLock<Vec<ModuleEntry>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_modules(modules: impl IntoIterator<Item = Module>) -> Self {
        let registry = Self::new();
        for module in modules {
            registry.install(module);
        }
        registry
    }

    /// Install a module, replacing any module with the same name
    pub fn install(&self, module: Module) {
        let entry = ModuleEntry::from(module);
        let mut modules = self.modules.write().unwrap_or_else(|e| e.into_inner());
        match modules.iter_mut().find(|existing| existing.name == entry.name) {
            Some(existing) => *existing = entry,
            None => modules.push(entry),
        }
    }

    /// Replace the whole module set; returns true if anything changed
    pub fn replace_all(&self, modules: impl IntoIterator<Item = Module>) -> bool {
        let mut entries: Vec<ModuleEntry> = Vec::new();
        for entry in modules.into_iter().map(ModuleEntry::from) {
            match entries.iter_mut().find(|existing| existing.name == entry.name) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }

        let mut current = self.modules.write().unwrap_or_else(|e| e.into_inner());
        if *current == entries {
            return false;
        }
        debug!("Module set changed: {} module(s)", entries.len());
        *current = entries;
        true
    }

    /// Change the state of a module; returns false if it is unknown
    pub fn set_state(&self, name: &str, state: ModuleState) -> bool {
        let mut modules = self.modules.write().unwrap_or_else(|e| e.into_inner());
        match modules.iter_mut().find(|module| module.name == name) {
            Some(module) => {
                debug!("Module {} is now {:?}", name, state);
                module.state = state;
                true
            }
            None => false,
        }
    }

    pub fn module_state(&self, name: &str) -> Option<ModuleState> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        modules
            .iter()
            .find(|module| module.name == name)
            .map(|module| module.state)
    }

    pub fn module_count(&self) -> usize {
        self.modules.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl From<Module> for ModuleEntry {
    fn from(module: Module) -> Self {
        Self {
            name: module.name,
            state: module.state,
            types: module.types.into_iter().map(Arc::new).collect(),
        }
    }
}

impl TypeLookup for ModuleRegistry {
    fn find_type(&self, name: &str, active_only: bool) -> Option<Arc<TypeDescriptor>> {
        let modules = self.modules.read().unwrap_or_else(|e| e.into_inner());
        modules
            .iter()
            .filter(|module| match module.state {
                ModuleState::Active => true,
                ModuleState::Resolved => !active_only,
                ModuleState::Installed | ModuleState::Stopping => false,
            })
            .find_map(|module| module.types.iter().find(|ty| ty.name == name).cloned())
    }
}
