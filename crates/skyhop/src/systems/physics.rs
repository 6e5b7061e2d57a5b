//! # Physics System
//!
//! Two passes per tick:
//!
//! - **Integration**: gravity, `v += a·dt`, `p += v·dt`, acceleration
//!   cleared; spin integrated into the orientation quaternion.
//! - **Collision & grounding**: every falling collider is tested against
//!   every other collider. Only the vertical axis is resolved. Landing
//!   while descending grounds the entity; hitting a ceiling while rising
//!   kills the upward speed.

use glam::{Quat, Vec3};
use skyhop_core::{
    Acceleration, Collidable, ComponentMask, EcsResult, EntityId, GravityAffected, OnGround,
    Position, Rotation, Scale, Velocity, World,
};

use super::matching;
use crate::config::PhysicsConfig;

// ============================================================================
// AABB (Axis-Aligned Bounding Box)
// ============================================================================

/// Axis-aligned box around an entity center.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from a center and per-axis half extents.
    #[must_use]
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Checks if the closed boxes share at least one point.
    ///
    /// Faces that merely touch count as intersecting.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.max.cmpge(other.min).all() && other.max.cmpge(self.min).all()
    }

    /// Smallest vertical move that separates the boxes.
    #[must_use]
    pub fn vertical_penetration(&self, other: &Self) -> f32 {
        (self.max.y - other.min.y).min(other.max.y - self.min.y)
    }
}

/// Integrator and collision resolver.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Runs both passes for one tick.
    ///
    /// # Errors
    ///
    /// Only if toggling [`OnGround`] on a live entity fails, which the world
    /// never does for entities taken from its own live set.
    pub fn run(dt: f32, world: &mut World, config: &PhysicsConfig) -> EcsResult<()> {
        integrate_linear(dt, world, config);
        integrate_angular(dt, world);
        resolve_collisions(world, config)
    }
}

fn integrate_linear(dt: f32, world: &mut World, config: &PhysicsConfig) {
    let required = ComponentMask::of::<Position>()
        .with::<Velocity>()
        .with::<Acceleration>();

    for id in matching(world, required) {
        let (Some(mut position), Some(mut velocity), Some(mut acceleration)) = (
            world.get_component::<Position>(id).copied(),
            world.get_component::<Velocity>(id).copied(),
            world.get_component::<Acceleration>(id).copied(),
        ) else {
            continue;
        };

        if world.has_component::<GravityAffected>(id) {
            acceleration.ay += config.gravity;
        }

        velocity.dx += acceleration.ax * dt;
        velocity.dy += acceleration.ay * dt;
        velocity.dz += acceleration.az * dt;

        position.x += velocity.dx * dt;
        position.y += velocity.dy * dt;
        position.z += velocity.dz * dt;

        acceleration = Acceleration::default();

        if let Some(slot) = world.get_component_mut::<Position>(id) {
            *slot = position;
        }
        if let Some(slot) = world.get_component_mut::<Velocity>(id) {
            *slot = velocity;
        }
        if let Some(slot) = world.get_component_mut::<Acceleration>(id) {
            *slot = acceleration;
        }
    }
}

fn integrate_angular(dt: f32, world: &mut World) {
    for id in matching(world, ComponentMask::of::<Rotation>()) {
        let Some(rotation) = world.get_component_mut::<Rotation>(id) else {
            continue;
        };

        rotation.angular_velocity += rotation.angular_acceleration * dt;
        let delta = Quat::from_scaled_axis(rotation.angular_velocity * dt);
        rotation.quaternion = (delta * rotation.quaternion).normalize();
        rotation.angular_acceleration = Vec3::ZERO;
    }
}

fn resolve_collisions(world: &mut World, config: &PhysicsConfig) -> EcsResult<()> {
    let solids = ComponentMask::of::<Position>().with::<Collidable>();
    let falling = solids.with::<Velocity>().with::<GravityAffected>();

    let colliders = matching(world, solids);

    for id in matching(world, falling) {
        let (Some(mut position), Some(mut velocity)) = (
            world.get_component::<Position>(id).copied(),
            world.get_component::<Velocity>(id).copied(),
        ) else {
            continue;
        };
        let half = half_extents(world, id, config);
        let mut grounded = false;

        for &other in &colliders {
            if other == id {
                continue;
            }
            let Some(other_center) = world.get_component::<Position>(other) else {
                continue;
            };
            let other_box =
                Aabb::from_center(other_center.to_vec3(), half_extents(world, other, config));
            let own_box = Aabb::from_center(position.to_vec3(), half);

            if !own_box.intersects(&other_box) {
                continue;
            }

            let penetration = own_box.vertical_penetration(&other_box);
            if penetration <= 0.0 {
                continue;
            }
            if velocity.dy < 0.0 {
                position.y += penetration;
                velocity.dy = 0.0;
                grounded = true;
            } else if velocity.dy > 0.0 {
                position.y -= penetration;
                velocity.dy = 0.0;
            }
        }

        if let Some(slot) = world.get_component_mut::<Position>(id) {
            *slot = position;
        }
        if let Some(slot) = world.get_component_mut::<Velocity>(id) {
            *slot = velocity;
        }

        match (grounded, world.has_component::<OnGround>(id)) {
            (true, false) => {
                world.add_component(id, OnGround)?;
                tracing::trace!(entity = %id, y = position.y, "landed");
            }
            (false, true) => {
                world.remove_component::<OnGround>(id)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn half_extents(world: &World, id: EntityId, config: &PhysicsConfig) -> Vec3 {
    let scale = world.get_component::<Scale>(id).copied().unwrap_or_default();
    scale.0 * config.default_half_extent
}
