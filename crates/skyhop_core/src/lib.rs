//! # SKYHOP Core
//!
//! Entity Component System (ECS) for the SKYHOP platformer:
//! - Entity ids recycled through a free list
//! - One 64-bit component mask per entity
//! - Sparse per-type component stores, created lazily on first use
//!
//! ## Architecture Rules
//!
//! 1. **The mask is the truth** - a mask bit is set if and only if the
//!    matching store holds a value for the entity
//! 2. **The world owns everything** - systems borrow for one call and keep
//!    no references across ticks
//! 3. **Components are plain data** - no ECS-aware behavior in records
//!
//! ## Example
//!
//! ```rust
//! use skyhop_core::{Position, Velocity, World};
//!
//! let mut world = World::new();
//! let entity = world.create_entity();
//! world.add_component(entity, Position::new(0.0, 2.0, 0.0)).unwrap();
//! world.add_component(entity, Velocity::default()).unwrap();
//! assert!(world.has_component::<Position>(entity));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;

pub use ecs::{
    Acceleration, Collidable, Component, ComponentMask, ComponentStore, EcsError, EcsResult,
    EntityId, EntityRegistry, ErasedStore, GravityAffected, Material, OnGround, PlayerControlled,
    Position, Renderable3D, Rotation, Scale, Velocity, World, MAX_COMPONENTS, MAX_ENTITIES,
};
