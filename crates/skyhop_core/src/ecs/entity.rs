//! # Entity Management
//!
//! Entities are bare slot indices. Each slot carries:
//! - The component mask (one bit per component type)
//! - An alive flag
//! - An incarnation counter, bumped every time the slot is handed out
//!
//! Destroyed slots go onto a free list and are reused LIFO before any
//! never-used index is issued.

use std::fmt;
use std::marker::PhantomData;

use super::component::Component;
use super::error::{EcsError, EcsResult};

/// Number of distinct component types a mask can describe.
pub const MAX_COMPONENTS: usize = 64;

/// Slot count of a default [`EntityRegistry`].
pub const MAX_ENTITIES: u32 = u32::MAX;

/// Opaque handle for an entity.
///
/// Unique among live entities at any instant, reused after destruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates an entity ID from a raw slot index.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw slot index.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the slot index as a `usize`.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// Fixed-width bitset of component types.
///
/// Bit `i` set means the entity owns a component whose [`Component::ID`] is `i`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ComponentMask(u64);

impl ComponentMask {
    /// The empty mask.
    pub const EMPTY: Self = Self(0);

    /// Mask with the single bit for component type `C`.
    #[inline]
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self::EMPTY.with::<C>()
    }

    /// Returns this mask plus the bit for component type `C`.
    ///
    /// A component whose [`Component::ID`] does not fit the mask fails to
    /// build instead of producing a mask that matches everything:
    ///
    /// ```compile_fail
    /// use skyhop_core::{Component, ComponentMask};
    ///
    /// struct Wide;
    /// impl Component for Wide {
    ///     const ID: u8 = 70;
    /// }
    ///
    /// let _ = ComponentMask::of::<Wide>();
    /// ```
    #[inline]
    #[must_use]
    pub fn with<C: Component>(self) -> Self {
        Self(self.0 | TypedBit::<C>::BIT)
    }

    /// Returns the raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Checks if the bit for component index `id` is set.
    #[inline]
    #[must_use]
    pub fn has(self, id: u8) -> bool {
        self.0 & Self::bit(id) != 0
    }

    /// Checks if every bit of `required` is also set here.
    #[inline]
    #[must_use]
    pub const fn contains_all(self, required: Self) -> bool {
        self.0 & required.0 == required.0
    }

    /// Sets the bit for component index `id`.
    #[inline]
    pub fn set(&mut self, id: u8) {
        self.0 |= Self::bit(id);
    }

    /// Clears the bit for component index `id`.
    #[inline]
    pub fn clear(&mut self, id: u8) {
        self.0 &= !Self::bit(id);
    }

    /// Clears every bit.
    #[inline]
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Checks if no bit is set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the indices of set bits, lowest first.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            #[allow(clippy::cast_possible_truncation)]
            let id = bits.trailing_zeros() as u8;
            bits &= bits - 1;
            Some(id)
        })
    }

    // Raw indices past the mask width map to no bit; `World` rejects such
    // types at registration and typed masks reject them at compile time.
    #[inline]
    fn bit(id: u8) -> u64 {
        1u64.checked_shl(u32::from(id)).unwrap_or(0)
    }
}

/// Mask bit of component type `C`, checked against the mask width at
/// compile time.
struct TypedBit<C>(PhantomData<C>);

impl<C: Component> TypedBit<C> {
    #[allow(clippy::cast_lossless)]
    const BIT: u64 = {
        assert!(
            (C::ID as usize) < MAX_COMPONENTS,
            "Component::ID does not fit in a ComponentMask"
        );
        1u64 << C::ID
    };
}

/// Per-slot bookkeeping.
#[derive(Clone, Copy, Debug, Default)]
struct EntitySlot {
    mask: ComponentMask,
    alive: bool,
    incarnation: u32,
}

/// Allocates entity ids and owns their component masks.
#[derive(Debug)]
pub struct EntityRegistry {
    /// Every slot ever allocated, live or free.
    slots: Vec<EntitySlot>,
    /// Destroyed ids awaiting reuse (popped from the back).
    free: Vec<EntityId>,
    /// Most slots this registry will ever allocate.
    limit: u32,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::with_limit(MAX_ENTITIES)
    }
}

impl EntityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry that allocates at most `limit` slots.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            limit,
        }
    }

    /// Most slots this registry will allocate.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Allocates an entity id.
    ///
    /// Reuses the most recently destroyed id if there is one, otherwise
    /// appends a fresh slot. The returned entity always has an empty mask.
    ///
    /// # Panics
    ///
    /// Panics if every slot up to [`Self::limit`] is live. Use
    /// [`Self::try_create`] where that can happen.
    pub fn create(&mut self) -> EntityId {
        match self.try_create() {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Allocates an entity id, failing instead of reusing a live one.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityLimitReached`] if no slot is free and the registry
    /// already holds [`Self::limit`] slots. Nothing is modified.
    pub fn try_create(&mut self) -> EcsResult<EntityId> {
        if let Some(id) = self.free.pop() {
            let slot = &mut self.slots[id.index()];
            slot.alive = true;
            slot.mask.reset();
            slot.incarnation = slot.incarnation.wrapping_add(1);
            return Ok(id);
        }

        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|index| *index < self.limit)
            .ok_or(EcsError::EntityLimitReached { limit: self.limit })?;
        self.slots.push(EntitySlot {
            mask: ComponentMask::EMPTY,
            alive: true,
            incarnation: 0,
        });
        Ok(EntityId(index))
    }

    /// Destroys an entity, clearing its mask and queueing the id for reuse.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the id is out of range or already
    /// destroyed. Nothing is modified in that case.
    pub fn destroy(&mut self, id: EntityId) -> EcsResult<()> {
        let slot = self.live_slot_mut(id)?;
        slot.alive = false;
        slot.mask.reset();
        self.free.push(id);
        Ok(())
    }

    /// Returns the component mask of an entity.
    ///
    /// Destroyed slots are readable and always report an empty mask.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the id was never allocated.
    pub fn mask(&self, id: EntityId) -> EcsResult<&ComponentMask> {
        self.slots
            .get(id.index())
            .map(|slot| &slot.mask)
            .ok_or(EcsError::InvalidEntity(id))
    }

    /// Returns the component mask of a live entity for modification.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidEntity`] if the id is out of range or destroyed.
    pub fn mask_mut(&mut self, id: EntityId) -> EcsResult<&mut ComponentMask> {
        self.live_slot_mut(id).map(|slot| &mut slot.mask)
    }

    /// Total number of slots ever allocated, including free ones.
    ///
    /// Systems use this to bound index iteration; it is not a live count.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.slots.len()
    }

    /// Number of currently live entities.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Checks if an id refers to a live entity.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots.get(id.index()).is_some_and(|slot| slot.alive)
    }

    /// How many times the slot behind `id` has been handed out, minus one.
    ///
    /// Two handles with the same id but different incarnations refer to
    /// different entities. Returns `None` for ids never allocated.
    #[inline]
    #[must_use]
    pub fn incarnation(&self, id: EntityId) -> Option<u32> {
        self.slots.get(id.index()).map(|slot| slot.incarnation)
    }

    /// Iterates over live entity ids in slot order.
    pub fn iter_alive(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .filter_map(|(index, _)| u32::try_from(index).ok().map(EntityId))
    }

    fn live_slot_mut(&mut self, id: EntityId) -> EcsResult<&mut EntitySlot> {
        match self.slots.get_mut(id.index()) {
            Some(slot) if slot.alive => Ok(slot),
            _ => Err(EcsError::InvalidEntity(id)),
        }
    }
}
