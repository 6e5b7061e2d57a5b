//! # ECS World
//!
//! The central container for all entities and components. Binds the
//! [`EntityRegistry`] to one lazily created store per component type and
//! keeps masks and stores in step.

use std::any::{self, TypeId};

use super::component::Component;
use super::entity::{ComponentMask, EntityId, EntityRegistry, MAX_COMPONENTS, MAX_ENTITIES};
use super::error::{EcsError, EcsResult};
use super::storage::{ComponentStore, ErasedStore};

/// Which Rust type owns a component index.
#[derive(Clone, Copy, Debug)]
struct Binding {
    type_id: TypeId,
    name: &'static str,
}

/// The ECS World - container for all game state.
///
/// Every mutation that touches both a store and a mask goes through this
/// façade, so a mask bit is never observed without its stored value.
///
/// # Example
///
/// ```rust
/// use skyhop_core::{OnGround, Position, World};
///
/// let mut world = World::new();
/// let id = world.create_entity();
/// world.add_component(id, Position::new(1.0, 2.0, 3.0)).unwrap();
/// world.add_component(id, OnGround).unwrap();
///
/// world.remove_component::<OnGround>(id).unwrap();
/// assert!(!world.has_component::<OnGround>(id));
/// ```
pub struct World {
    /// Entity ids and masks.
    registry: EntityRegistry,
    /// One slot per component index; `None` until the type is first used.
    stores: Vec<Option<Box<dyn ErasedStore>>>,
    /// Index to type bindings. Never cleared, not even by [`World::reset`].
    bindings: [Option<Binding>; MAX_COMPONENTS],
    /// Bumped on every reset.
    epoch: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::with_entity_limit(MAX_ENTITIES)
    }

    /// Creates an empty world holding at most `limit` entity slots.
    #[must_use]
    pub fn with_entity_limit(limit: u32) -> Self {
        Self {
            registry: EntityRegistry::with_limit(limit),
            stores: (0..MAX_COMPONENTS).map(|_| None).collect(),
            bindings: [None; MAX_COMPONENTS],
            epoch: 0,
        }
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an entity with no components.
    ///
    /// # Panics
    ///
    /// Panics if the entity limit is reached; see [`World::try_create_entity`].
    pub fn create_entity(&mut self) -> EntityId {
        self.registry.create()
    }

    /// Creates an entity with no components.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityLimitReached`] if every slot is live.
    pub fn try_create_entity(&mut self) -> EcsResult<EntityId> {
        self.registry.try_create()
    }

    /// Destroys an entity and erases every component it owned.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the entity is not alive.
    pub fn destroy_entity(&mut self, id: EntityId) -> EcsResult<()> {
        self.registry.destroy(id)?;
        for store in self.stores.iter_mut().flatten() {
            store.purge(id);
        }
        Ok(())
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.registry.is_alive(id)
    }

    /// Total slots ever allocated since the last reset (live or free).
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.registry.count()
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.registry.alive_count()
    }

    /// Iterates over live entities in slot order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.registry.iter_alive()
    }

    /// Returns a copy of an entity's component mask.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the id was never allocated.
    pub fn mask(&self, id: EntityId) -> EcsResult<ComponentMask> {
        self.registry.mask(id).copied()
    }

    /// Checks if an entity owns every component in `required`.
    ///
    /// Destroyed and unknown ids never match a non-empty mask.
    #[inline]
    #[must_use]
    pub fn matches(&self, id: EntityId, required: ComponentMask) -> bool {
        self.registry
            .mask(id)
            .is_ok_and(|mask| mask.contains_all(required))
    }

    /// See [`EntityRegistry::incarnation`].
    #[inline]
    #[must_use]
    pub fn incarnation(&self, id: EntityId) -> Option<u32> {
        self.registry.incarnation(id)
    }

    /// Read access to the registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Number of resets this world has gone through.
    ///
    /// Anything cached by entity id must be dropped when this changes.
    #[inline]
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attaches (or overwrites) a component and sets its mask bit.
    ///
    /// # Errors
    ///
    /// - [`EcsError::InvalidEntity`] if the entity is not alive
    /// - [`EcsError::ComponentIdOutOfRange`] / [`EcsError::ComponentIdConflict`]
    ///   if `C` cannot be registered under its declared index
    ///
    /// Nothing is modified when an error is returned.
    pub fn add_component<C: Component>(&mut self, id: EntityId, component: C) -> EcsResult<&mut C> {
        let mask = self.registry.mask_mut(id)?;
        let store = store_entry::<C>(&mut self.stores, &mut self.bindings)?;
        let stored = store.add(id, component);
        mask.set(C::ID);
        Ok(stored)
    }

    /// Detaches a component and clears its mask bit.
    ///
    /// # Returns
    ///
    /// The removed value, or `None` if the entity did not have one.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the entity is not alive.
    pub fn remove_component<C: Component>(&mut self, id: EntityId) -> EcsResult<Option<C>> {
        let mask = self.registry.mask_mut(id)?;
        let Some(store) = typed_store_mut::<C>(&mut self.stores, &self.bindings) else {
            return Ok(None);
        };
        let removed = store.remove(id);
        mask.clear(C::ID);
        Ok(removed)
    }

    /// Gets a component, if the entity has one.
    #[inline]
    #[must_use]
    pub fn get_component<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.store::<C>()?.get(id)
    }

    /// Gets a component mutably, if the entity has one.
    #[inline]
    pub fn get_component_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        typed_store_mut::<C>(&mut self.stores, &self.bindings)?.get_mut(id)
    }

    /// Checks if an entity has a component of type `C`.
    #[inline]
    #[must_use]
    pub fn has_component<C: Component>(&self, id: EntityId) -> bool {
        self.is_bound::<C>() && self.registry.mask(id).is_ok_and(|mask| mask.has(C::ID))
    }

    /// Read access to the whole store of `C`, if the type has been used.
    #[must_use]
    pub fn store<C: Component>(&self) -> Option<&ComponentStore<C>> {
        if !self.is_bound::<C>() {
            return None;
        }
        self.stores
            .get(usize::from(C::ID))?
            .as_ref()?
            .as_any()
            .downcast_ref::<ComponentStore<C>>()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Discards every entity and component.
    ///
    /// Store memory is released; component index bindings survive.
    /// Must only be called between ticks.
    pub fn reset(&mut self) {
        let discarded = self.registry.alive_count();
        self.registry = EntityRegistry::with_limit(self.registry.limit());
        for slot in &mut self.stores {
            *slot = None;
        }
        self.epoch += 1;
        tracing::debug!(epoch = self.epoch, discarded, "world reset");
    }

    /// Audits the mask/store invariant for every slot and every store.
    ///
    /// # Errors
    ///
    /// [`EcsError::IncoherentMask`] describing the first mismatch found.
    pub fn check_coherence(&self) -> EcsResult<()> {
        for index in 0..self.registry.count() {
            let Ok(raw) = u32::try_from(index) else {
                break;
            };
            let entity = EntityId::from_raw(raw);
            let mask = self.registry.mask(entity)?;

            for (component, store) in self.stores.iter().enumerate() {
                let id = u8::try_from(component).unwrap_or(u8::MAX);
                let stored = store.as_ref().is_some_and(|store| store.holds(entity));
                if stored != mask.has(id) {
                    return Err(EcsError::IncoherentMask {
                        entity,
                        id,
                        in_mask: mask.has(id),
                    });
                }
            }
        }

        // Entries keyed to ids the registry never issued.
        for (component, store) in self.stores.iter().enumerate() {
            let Some(store) = store else { continue };
            if let Some(entity) = store
                .entities()
                .into_iter()
                .find(|entity| entity.index() >= self.registry.count())
            {
                return Err(EcsError::IncoherentMask {
                    entity,
                    id: u8::try_from(component).unwrap_or(u8::MAX),
                    in_mask: false,
                });
            }
        }

        Ok(())
    }

    fn is_bound<C: Component>(&self) -> bool {
        self.bindings
            .get(usize::from(C::ID))
            .and_then(Option::as_ref)
            .is_some_and(|binding| binding.type_id == TypeId::of::<C>())
    }
}

/// Returns the store for `C`, registering the type on first use.
fn store_entry<'a, C: Component>(
    stores: &'a mut [Option<Box<dyn ErasedStore>>],
    bindings: &mut [Option<Binding>; MAX_COMPONENTS],
) -> EcsResult<&'a mut ComponentStore<C>> {
    let index = usize::from(C::ID);
    let requested = any::type_name::<C>();
    let Some(binding) = bindings.get_mut(index) else {
        return Err(EcsError::ComponentIdOutOfRange {
            name: requested,
            id: C::ID,
            max: MAX_COMPONENTS,
        });
    };

    match binding {
        Some(existing) if existing.type_id != TypeId::of::<C>() => {
            return Err(EcsError::ComponentIdConflict {
                id: C::ID,
                existing: existing.name,
                requested,
            });
        }
        Some(_) => {}
        None => {
            tracing::trace!(id = C::ID, component = requested, "component type registered");
            *binding = Some(Binding {
                type_id: TypeId::of::<C>(),
                name: requested,
            });
        }
    }

    let conflict = EcsError::ComponentIdConflict {
        id: C::ID,
        existing: requested,
        requested,
    };
    stores[index]
        .get_or_insert_with(|| Box::new(ComponentStore::<C>::new()))
        .as_any_mut()
        .downcast_mut::<ComponentStore<C>>()
        .ok_or(conflict)
}

/// Returns the store for `C` only if `C` owns its index and the store exists.
fn typed_store_mut<'a, C: Component>(
    stores: &'a mut [Option<Box<dyn ErasedStore>>],
    bindings: &[Option<Binding>; MAX_COMPONENTS],
) -> Option<&'a mut ComponentStore<C>> {
    let index = usize::from(C::ID);
    let binding = bindings.get(index)?.as_ref()?;
    if binding.type_id != TypeId::of::<C>() {
        return None;
    }
    stores
        .get_mut(index)?
        .as_mut()?
        .as_any_mut()
        .downcast_mut::<ComponentStore<C>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::component::{OnGround, Position, Scale, Velocity};

    #[derive(Debug, PartialEq)]
    struct Impostor;

    impl Component for Impostor {
        const ID: u8 = Position::ID;
    }

    #[derive(Debug)]
    struct TooWide;

    impl Component for TooWide {
        const ID: u8 = 64;
    }

    #[test]
    fn test_world_creation() {
        let world = World::new();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.alive_count(), 0);
        assert_eq!(world.epoch(), 0);
    }

    #[test]
    fn test_add_sets_mask_and_stores_value() {
        let mut world = World::new();
        let id = world.create_entity();

        world.add_component(id, Position::new(1.0, 2.0, 3.0)).unwrap();

        assert!(world.mask(id).unwrap().has(Position::ID));
        assert_eq!(world.get_component::<Position>(id), Some(&Position::new(1.0, 2.0, 3.0)));
        assert!(world.has_component::<Position>(id));
        assert!(!world.has_component::<Velocity>(id));
        world.check_coherence().unwrap();
    }

    #[test]
    fn test_remove_clears_mask_and_store() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, OnGround).unwrap();

        assert_eq!(world.remove_component::<OnGround>(id).unwrap(), Some(OnGround));
        assert!(!world.mask(id).unwrap().has(OnGround::ID));
        assert!(world.get_component::<OnGround>(id).is_none());
        // Removing an absent component is fine.
        assert_eq!(world.remove_component::<OnGround>(id).unwrap(), None);
        assert_eq!(world.remove_component::<Scale>(id).unwrap(), None);
        world.check_coherence().unwrap();
    }

    #[test]
    fn test_destroy_purges_stores() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Position::new(1.0, 0.0, 0.0)).unwrap();
        world.add_component(id, Velocity::new(0.0, 1.0, 0.0)).unwrap();

        world.destroy_entity(id).unwrap();
        assert!(world.get_component::<Position>(id).is_none());
        assert!(world.get_component::<Velocity>(id).is_none());

        let reused = world.create_entity();
        assert_eq!(reused, id);
        assert!(world.mask(reused).unwrap().is_empty());
        assert!(world.get_component::<Position>(reused).is_none());
        world.check_coherence().unwrap();
    }

    #[test]
    fn test_dead_entity_is_rejected() {
        let mut world = World::new();
        let id = world.create_entity();
        world.destroy_entity(id).unwrap();

        assert_eq!(
            world.add_component(id, Position::default()).unwrap_err(),
            EcsError::InvalidEntity(id)
        );
        assert!(world.remove_component::<Position>(id).is_err());
        assert!(world.destroy_entity(id).is_err());
        assert!(world.add_component(EntityId::from_raw(99), OnGround).is_err());
        world.check_coherence().unwrap();
    }

    #[test]
    fn test_index_conflict_is_rejected() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Position::default()).unwrap();

        let err = world.add_component(id, Impostor).unwrap_err();
        assert!(matches!(err, EcsError::ComponentIdConflict { id: 0, .. }));
        // The impostor cannot see or clear the real component.
        assert!(world.get_component::<Impostor>(id).is_none());
        assert!(!world.has_component::<Impostor>(id));
        assert_eq!(world.remove_component::<Impostor>(id).unwrap(), None);
        assert!(world.has_component::<Position>(id));
        world.check_coherence().unwrap();
    }

    #[test]
    fn test_entity_limit_survives_reset() {
        let mut world = World::with_entity_limit(1);
        let only = world.create_entity();
        world.add_component(only, Position::default()).unwrap();

        assert_eq!(
            world.try_create_entity(),
            Err(EcsError::EntityLimitReached { limit: 1 })
        );
        assert!(world.has_component::<Position>(only));

        world.reset();
        assert_eq!(world.try_create_entity(), Ok(only));
        assert!(world.try_create_entity().is_err());
        world.check_coherence().unwrap();
    }

    #[test]
    fn test_index_out_of_range_is_rejected() {
        let mut world = World::new();
        let id = world.create_entity();
        let err = world.add_component(id, TooWide).unwrap_err();
        assert!(matches!(err, EcsError::ComponentIdOutOfRange { id: 64, .. }));
        assert!(world.mask(id).unwrap().is_empty());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut world = World::new();
        let ids: Vec<_> = (0..5).map(|_| world.create_entity()).collect();
        for id in &ids {
            world.add_component(*id, Position::default()).unwrap();
        }

        world.reset();
        assert_eq!(world.entity_count(), 0);
        world.reset();
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.epoch(), 2);

        for id in ids {
            assert!(world.get_component::<Position>(id).is_none());
            assert!(!world.is_alive(id));
        }
        world.check_coherence().unwrap();
    }

    #[test]
    fn test_reset_keeps_bindings() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Position::default()).unwrap();
        world.reset();

        let id = world.create_entity();
        assert!(world.add_component(id, Impostor).is_err());
    }

    #[test]
    fn test_matches_required_mask() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Position::default()).unwrap();
        world.add_component(id, Velocity::default()).unwrap();

        let moving = ComponentMask::of::<Position>().with::<Velocity>();
        let grounded = moving.with::<OnGround>();
        assert!(world.matches(id, moving));
        assert!(!world.matches(id, grounded));
        assert!(!world.matches(EntityId::from_raw(42), moving));
    }

    #[test]
    fn test_get_component_mut_writes_through() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Velocity::default()).unwrap();

        world.get_component_mut::<Velocity>(id).unwrap().dy = -3.0;
        assert_eq!(world.get_component::<Velocity>(id).unwrap().dy, -3.0);
    }
}
