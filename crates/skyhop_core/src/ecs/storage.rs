//! # Component Storage
//!
//! Sparse storage for a single component type, keyed by entity.
//!
//! - Insert, lookup and erase are amortized O(1)
//! - One entry per (type, entity) pair
//! - The world holds one store per type behind [`ErasedStore`], so
//!   heterogeneous stores can live in a single table

use std::any::{self, Any};
use std::collections::HashMap;

use super::component::Component;
use super::entity::EntityId;

/// Sparse storage for one component type.
///
/// The store does not know about masks; keeping the entity's mask bit in
/// step is the [`World`](super::World)'s job.
///
/// # Example
///
/// ```rust
/// use skyhop_core::{ComponentStore, EntityId, Position};
///
/// let mut store: ComponentStore<Position> = ComponentStore::new();
/// let id = EntityId::from_raw(0);
/// store.add(id, Position::new(1.0, 2.0, 3.0));
/// assert_eq!(store.get(id), Some(&Position::new(1.0, 2.0, 3.0)));
/// ```
#[derive(Debug)]
pub struct ComponentStore<C: Component> {
    entries: HashMap<EntityId, C>,
}

impl<C: Component> Default for ComponentStore<C> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C: Component> ComponentStore<C> {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the component for `id`.
    ///
    /// # Returns
    ///
    /// Mutable reference to the stored value.
    pub fn add(&mut self, id: EntityId, component: C) -> &mut C {
        match self.entries.entry(id) {
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                slot.insert(component);
                slot.into_mut()
            }
            std::collections::hash_map::Entry::Vacant(slot) => slot.insert(component),
        }
    }

    /// Gets the component for `id`, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&C> {
        self.entries.get(&id)
    }

    /// Gets the component for `id` mutably, if present.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut C> {
        self.entries.get_mut(&id)
    }

    /// Erases the component for `id`. No-op when absent.
    #[inline]
    pub fn remove(&mut self, id: EntityId) -> Option<C> {
        self.entries.remove(&id)
    }

    /// Checks if `id` has a stored component.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the store is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(entity, component)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> {
        self.entries.iter().map(|(id, c)| (*id, c))
    }

    /// Drops every stored component and releases the memory.
    pub fn clear(&mut self) {
        self.entries = HashMap::new();
    }
}

/// Object-safe view of a [`ComponentStore`] of any type.
pub trait ErasedStore: Any {
    /// Upcast for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;
    /// Mutable upcast for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Erases whatever the store holds for `id`.
    fn purge(&mut self, id: EntityId);
    /// Checks if the store holds a value for `id`.
    fn holds(&self, id: EntityId) -> bool;
    /// Entities with a stored value.
    fn entities(&self) -> Vec<EntityId>;
    /// Number of stored values.
    fn stored(&self) -> usize;
    /// Rust type name of the component.
    fn component_name(&self) -> &'static str;
}

impl<C: Component> ErasedStore for ComponentStore<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn purge(&mut self, id: EntityId) {
        self.entries.remove(&id);
    }

    fn holds(&self, id: EntityId) -> bool {
        self.contains(id)
    }

    fn entities(&self) -> Vec<EntityId> {
        self.entries.keys().copied().collect()
    }

    fn stored(&self) -> usize {
        self.len()
    }

    fn component_name(&self) -> &'static str {
        any::type_name::<C>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{OnGround, Position, Velocity};

    #[test]
    fn test_add_get_remove() {
        let mut store: ComponentStore<Position> = ComponentStore::new();
        let id = EntityId::from_raw(4);

        assert!(store.get(id).is_none());
        store.add(id, Position::new(1.0, 2.0, 3.0));
        assert_eq!(store.get(id), Some(&Position::new(1.0, 2.0, 3.0)));

        assert_eq!(store.remove(id), Some(Position::new(1.0, 2.0, 3.0)));
        assert!(store.get(id).is_none());
        // Removing again is a no-op.
        assert_eq!(store.remove(id), None);
    }

    #[test]
    fn test_add_overwrites_and_returns_stored_value() {
        let mut store: ComponentStore<Velocity> = ComponentStore::new();
        let id = EntityId::from_raw(0);
        store.add(id, Velocity::new(1.0, 0.0, 0.0));

        let stored = store.add(id, Velocity::new(2.0, 0.0, 0.0));
        stored.dy = 5.0;

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id), Some(&Velocity::new(2.0, 5.0, 0.0)));
    }

    #[test]
    fn test_erased_downcast_and_purge() {
        let mut erased: Box<dyn ErasedStore> = Box::new(ComponentStore::<OnGround>::new());
        let id = EntityId::from_raw(2);

        erased
            .as_any_mut()
            .downcast_mut::<ComponentStore<OnGround>>()
            .unwrap()
            .add(id, OnGround);
        assert!(erased.holds(id));
        assert!(erased.as_any().downcast_ref::<ComponentStore<Position>>().is_none());

        erased.purge(id);
        assert!(!erased.holds(id));
        assert_eq!(erased.stored(), 0);
        assert!(erased.component_name().ends_with("OnGround"));
    }
}
