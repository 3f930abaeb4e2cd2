//! Type manifests: what a module exports to a discovery pass.
//!
//! Every registered module provides a manifest function producing its list
//! of exported types. The function is fallible by construction so the finder
//! can model modules whose type list cannot be obtained, or was obtained
//! only partially, without aborting the whole scan by accident.

use std::any::Any;

use crate::capability::{Capability, CapabilityRef};

/// Factory signature for instantiable types. The payload is opaque to the
/// finder; consumers downcast to the contract they asked for.
pub type FactoryFn = fn() -> anyhow::Result<Box<dyn Any + Send + Sync>>;

/// Whether a type can be instantiated.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeKind {
    /// Instantiable; may carry a factory.
    Concrete,
    /// Satisfies contracts but cannot be instantiated directly.
    Abstract,
    /// A contract itself; never returned by a scan.
    Interface,
}

/// One exported type as declared in a module manifest.
#[derive(Clone, Debug)]
pub struct TypeEntry {
    type_name: &'static str,
    kind: TypeKind,
    ignored: bool,
    capabilities: Vec<CapabilityRef>,
    factory: Option<FactoryFn>,
}

impl TypeEntry {
    #[must_use]
    pub fn concrete(type_name: &'static str) -> Self {
        Self::new(type_name, TypeKind::Concrete)
    }

    #[must_use]
    pub fn abstract_type(type_name: &'static str) -> Self {
        Self::new(type_name, TypeKind::Abstract)
    }

    #[must_use]
    pub fn interface(type_name: &'static str) -> Self {
        Self::new(type_name, TypeKind::Interface)
    }

    fn new(type_name: &'static str, kind: TypeKind) -> Self {
        Self {
            type_name,
            kind,
            ignored: false,
            capabilities: Vec::new(),
            factory: None,
        }
    }

    /// Declares a capability this type satisfies.
    #[must_use]
    pub fn with_capability(mut self, capability: CapabilityRef) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Attaches the no-argument factory used to instantiate the type.
    #[must_use]
    pub fn with_factory(mut self, factory: FactoryFn) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Marks the type as excluded from every scan.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    #[must_use]
    pub fn factory(&self) -> Option<FactoryFn> {
        self.factory
    }

    #[must_use]
    pub fn satisfies(&self, query: &Capability) -> bool {
        self.capabilities.iter().any(|c| query.matches(c))
    }
}

/// Result of enumerating a module's exported types.
#[derive(Clone, Debug)]
pub enum Manifest {
    /// Every exported type enumerated successfully.
    Ready(Vec<TypeEntry>),
    /// The type list could not be obtained at all.
    Unavailable { reason: String },
    /// Some types enumerated, some failed to load. A scan touching such a
    /// module fails with all `errors` aggregated; the entries are never
    /// partially consumed.
    Partial {
        entries: Vec<TypeEntry>,
        errors: Vec<String>,
    },
}

/// A type that survived filtering in one discovery call, paired with the
/// module that exported it. Ephemeral; not persisted across passes.
#[derive(Clone, Debug)]
pub struct TypeMatch {
    pub module: &'static str,
    pub entry: TypeEntry,
}
