//! Base registry trait and implementation.
//!
//! Provides the ordered, duplicate-rejecting storage shared by the step type
//! registry and the session registry.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use autorpa_protocols::RegistryError;

/// Trait for items that can be stored in a registry.
///
/// Each registerable item must provide a unique ID.
pub trait Registerable: Send + Sync {
    /// Returns the unique identifier for this item.
    fn registry_id(&self) -> &str;
}

/// Generic registry for managing items by ID.
///
/// Iteration follows registration order. Removing an item keeps the relative
/// order of the remaining ones.
pub struct BaseRegistry<T: ?Sized + Registerable> {
    items: RwLock<IndexMap<String, Arc<T>>>,
}

impl<T: ?Sized + Registerable> BaseRegistry<T> {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(IndexMap::new()),
        }
    }

    /// Register an item.
    ///
    /// Returns an error if an item with the same ID is already registered.
    pub fn register(&self, item: Arc<T>) -> Result<(), RegistryError> {
        let id = item.registry_id().to_string();
        let mut items = self.items.write();

        if items.contains_key(&id) {
            return Err(RegistryError::DuplicateType(id));
        }

        items.insert(id, item);
        Ok(())
    }

    /// Remove an item by ID, returning it if it was present.
    pub fn remove(&self, id: &str) -> Option<Arc<T>> {
        self.items.write().shift_remove(id)
    }

    /// Get an item by ID.
    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.items.read().get(id).cloned()
    }

    /// Check if an item with the given ID is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.items.read().contains_key(id)
    }

    /// List all registered item IDs in registration order.
    pub fn list_ids(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }

    /// Get the number of registered items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Snapshot of all items in registration order.
    pub fn values(&self) -> Vec<Arc<T>> {
        self.items.read().values().cloned().collect()
    }

    /// First item, in registration order, matching `predicate`.
    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<Arc<T>> {
        self.items
            .read()
            .values()
            .find(|item| predicate(item))
            .cloned()
    }

    /// Remove and return every item.
    pub fn drain(&self) -> Vec<Arc<T>> {
        self.items.write().drain(..).map(|(_, item)| item).collect()
    }
}

impl<T: ?Sized + Registerable> Default for BaseRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;
