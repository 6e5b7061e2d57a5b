//! # Entity Component System
//!
//! ## Design Philosophy
//!
//! - Entity IDs are plain slot indices, recycled LIFO
//! - Each entity carries a bitmask of the component types it owns
//! - Each component type lives in its own sparse store, keyed by entity
//! - Stores are type-erased behind [`ErasedStore`] and looked up by
//!   the component's declared index

mod component;
mod entity;
mod error;
mod storage;
mod world;

pub use component::{
    Acceleration, Collidable, Component, GravityAffected, Material, OnGround, PlayerControlled,
    Position, Renderable3D, Rotation, Scale, Velocity,
};
pub use entity::{ComponentMask, EntityId, EntityRegistry, MAX_COMPONENTS, MAX_ENTITIES};
pub use error::{EcsError, EcsResult};
pub use storage::{ComponentStore, ErasedStore};
pub use world::World;
