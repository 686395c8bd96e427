use crate::error::BorgError;
use serde_json::Value;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

lazy_static::lazy_static! {
    static ref GLOBAL_STATE: SharedState = SharedState::new();
}

/// One attribute namespace for a whole family of handles.
///
/// Cloning a `SharedState` aliases the same map; it never copies the
/// attributes. Each call holds the lock for a single read or write.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    attributes: Arc<Mutex<HashMap<String, Value>>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide family, created on first use and never dropped.
    pub fn global() -> &'static SharedState {
        &GLOBAL_STATE
    }

    // Writers never leave the map half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.attributes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Result<Value, BorgError> {
        self.lock()
            .get(name)
            .cloned()
            .ok_or_else(|| BorgError::attribute_not_found(name))
    }

    /// Overwrites `name`, returning what the family held before.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.lock().insert(name.into(), value.into())
    }

    /// Seeds `name` only if no handle has written it yet. Returns `true` if
    /// this call did the seeding.
    pub fn set_default(&self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        match self.lock().entry(name.into()) {
            Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.lock().remove(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted, so output is stable across runs.
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn same_family(&self, other: &SharedState) -> bool {
        Arc::ptr_eq(&self.attributes, &other.attributes)
    }
}
