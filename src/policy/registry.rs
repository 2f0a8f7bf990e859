use alloc::{
    boxed::Box,
    collections::{btree_map, BTreeMap, BTreeSet},
    string::ToString,
};

use tracing::debug;

use super::{lru::LruPolicy, priority_fifo::PriorityFifoPolicy, Policy, ReplacementPolicy};
use crate::error::CsError;

pub trait RegisteredPolicy: ReplacementPolicy + Default + 'static {
    const POLICY_NAME: &'static str;
}

pub type PolicyFactory = fn() -> Box<dyn ReplacementPolicy>;

fn make<P: RegisteredPolicy>() -> Box<dyn ReplacementPolicy> {
    Box::new(P::default())
}

// Duplicate names panic. Unknown names are an error, as they come from
//  configuration.
#[derive(Default)]
pub struct PolicyRegistry {
    factories: BTreeMap<&'static str, PolicyFactory>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_policies() -> Self {
        let mut registry = Self::new();
        registry.register::<LruPolicy>();
        registry.register::<PriorityFifoPolicy>();
        registry
    }

    pub fn register<P: RegisteredPolicy>(&mut self) {
        self.register_with(P::POLICY_NAME, make::<P>)
    }

    pub fn register_with(&mut self, name: &'static str, factory: PolicyFactory) {
        assert!(!name.is_empty(), "policy name must not be empty");
        match self.factories.entry(name) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(factory);
            }
            btree_map::Entry::Occupied(_) => {
                panic!("a content store policy named {:?} is already registered", name)
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn create(&self, name: &str) -> Result<Policy, CsError> {
        let (name, factory) = self
            .factories
            .get_key_value(name)
            .ok_or_else(|| CsError::UnknownPolicy(name.to_string()))?;
        debug!(policy = *name, "creating policy");
        Ok(Policy::new(*name, factory()))
    }

    pub fn policy_names(&self) -> BTreeSet<&'static str> {
        self.factories.keys().copied().collect()
    }
}

#[cfg(feature = "std")]
mod global {
    use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

    use super::PolicyRegistry;

    // Built-in policies are registered when the registry is first touched;
    //  anything else must be registered explicitly during startup.
    static REGISTRY: OnceLock<RwLock<PolicyRegistry>> = OnceLock::new();

    fn registry() -> &'static RwLock<PolicyRegistry> {
        REGISTRY.get_or_init(|| RwLock::new(PolicyRegistry::with_builtin_policies()))
    }

    // A panic while registering (a duplicate name) poisons the lock, but
    //  leaves the map itself untouched, so it is safe to keep using it.
    pub(super) fn read() -> RwLockReadGuard<'static, PolicyRegistry> {
        registry().read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(super) fn write() -> RwLockWriteGuard<'static, PolicyRegistry> {
        registry().write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(feature = "std")]
pub fn register_policy<P: RegisteredPolicy>() {
    global::write().register::<P>()
}

#[cfg(feature = "std")]
pub fn create_policy(name: &str) -> Result<Policy, CsError> {
    global::read().create(name)
}

#[cfg(feature = "std")]
pub fn policy_names() -> BTreeSet<&'static str> {
    global::read().policy_names()
}
