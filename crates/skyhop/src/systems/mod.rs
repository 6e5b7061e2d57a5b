//! # Simulation Systems
//!
//! Run once per fixed tick, in this order:
//!
//! ```text
//! InputSnapshot ──> MovementSystem ──> PhysicsSystem
//!                   (intent)           (integrate, collide, ground)
//! ```
//!
//! Systems copy small components out of the world, work on the copies and
//! write them back. Nothing is borrowed across entities or ticks.

pub mod movement;
pub mod physics;

pub use movement::MovementSystem;
pub use physics::{Aabb, PhysicsSystem};

use skyhop_core::{ComponentMask, EntityId, World};

/// Live entities whose mask holds every bit of `required`, in slot order.
pub(crate) fn matching(world: &World, required: ComponentMask) -> Vec<EntityId> {
    world
        .entities()
        .filter(|id| world.matches(*id, required))
        .collect()
}
