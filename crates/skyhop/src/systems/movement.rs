//! # Movement System
//!
//! Turns the frame's key state into kinematic intent for every
//! player-controlled entity: yaw spin, horizontal velocity along the
//! facing direction, and the jump impulse.

use skyhop_core::{
    ComponentMask, EcsResult, OnGround, PlayerControlled, Position, Rotation, Velocity, World,
};

use super::matching;
use crate::config::MovementConfig;
use crate::input::{InputSnapshot, Key};

/// Player control law.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    /// Components an entity needs before input touches it.
    #[must_use]
    pub fn required() -> ComponentMask {
        ComponentMask::of::<Velocity>()
            .with::<Position>()
            .with::<PlayerControlled>()
            .with::<Rotation>()
    }

    /// Applies one tick of input.
    ///
    /// # Errors
    ///
    /// Only if the world rejects removing [`OnGround`], which cannot happen
    /// for the live entities visited here.
    pub fn run(
        dt: f32,
        world: &mut World,
        input: &InputSnapshot,
        config: &MovementConfig,
    ) -> EcsResult<()> {
        for id in matching(world, Self::required()) {
            let (Some(mut velocity), Some(mut rotation)) = (
                world.get_component::<Velocity>(id).copied(),
                world.get_component::<Rotation>(id).copied(),
            ) else {
                continue;
            };

            steer(&mut rotation, input, config, dt);
            thrust(&mut velocity, rotation.forward(), input, config, dt);

            if input.is_pressed(Key::Jump) && world.has_component::<OnGround>(id) {
                velocity.dy += config.jump_force;
                world.remove_component::<OnGround>(id)?;
                tracing::trace!(entity = %id, "jump");
            }

            if let Some(slot) = world.get_component_mut::<Rotation>(id) {
                *slot = rotation;
            }
            if let Some(slot) = world.get_component_mut::<Velocity>(id) {
                *slot = velocity;
            }
        }
        Ok(())
    }
}

/// Yaw: keys accelerate the spin, no key lets it decay.
fn steer(rotation: &mut Rotation, input: &InputSnapshot, config: &MovementConfig, dt: f32) {
    let left = input.is_pressed(Key::Left);
    let right = input.is_pressed(Key::Right);
    let spin = &mut rotation.angular_velocity.y;

    if left {
        *spin += config.rotation_acceleration() * dt;
    }
    if right {
        *spin -= config.rotation_acceleration() * dt;
    }
    if !left && !right {
        *spin *= 1.0 - config.rotational_friction * dt;
    }

    let cap = config.max_rotation_speed();
    *spin = spin.clamp(-cap, cap);
}

/// Horizontal velocity along `forward`, then the speed cap.
fn thrust(
    velocity: &mut Velocity,
    forward: glam::Vec3,
    input: &InputSnapshot,
    config: &MovementConfig,
    dt: f32,
) {
    let ahead = input.is_pressed(Key::Forward);
    let back = input.is_pressed(Key::Back);
    let push = forward * config.acceleration * dt;

    if ahead {
        velocity.dx += push.x;
        velocity.dz += push.z;
    }
    if back {
        velocity.dx -= push.x;
        velocity.dz -= push.z;
    }
    if !ahead && !back {
        let keep = 1.0 - config.friction * dt;
        velocity.dx *= keep;
        velocity.dz *= keep;
    }

    clamp_horizontal(velocity, config.max_speed);
}

/// Rescales (dx, dz) so its length is at most `max_speed`, keeping direction.
pub(crate) fn clamp_horizontal(velocity: &mut Velocity, max_speed: f32) {
    let speed = velocity.horizontal_speed();
    if speed > max_speed {
        let factor = max_speed / speed;
        velocity.dx *= factor;
        velocity.dz *= factor;
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};
    use skyhop_core::EntityId;

    use super::*;

    const DT: f32 = 1.0 / 120.0;

    fn player(world: &mut World) -> EntityId {
        let id = world.create_entity();
        world.add_component(id, Position::default()).unwrap();
        world.add_component(id, Velocity::default()).unwrap();
        world.add_component(id, Rotation::default()).unwrap();
        world.add_component(id, PlayerControlled).unwrap();
        id
    }

    #[test]
    fn test_forward_follows_facing() {
        let mut world = World::new();
        let id = player(&mut world);
        let config = MovementConfig::default();

        MovementSystem::run(DT, &mut world, &InputSnapshot::from_keys(&[Key::Forward]), &config)
            .unwrap();

        let velocity = world.get_component::<Velocity>(id).unwrap();
        assert!(velocity.dx.abs() < 1e-5);
        assert!(velocity.dz < 0.0);
        assert!((velocity.horizontal_speed() - config.acceleration * DT).abs() < 1e-4);

        // Holding forward long enough hits the cap.
        let forward = InputSnapshot::from_keys(&[Key::Forward]);
        for _ in 0..10 {
            MovementSystem::run(DT, &mut world, &forward, &config).unwrap();
        }
        let velocity = world.get_component::<Velocity>(id).unwrap();
        assert!((velocity.horizontal_speed() - config.max_speed).abs() < 1e-4);
    }

    #[test]
    fn test_back_moves_against_facing() {
        let mut world = World::new();
        let id = player(&mut world);
        let facing = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        *world.get_component_mut::<Rotation>(id).unwrap() = Rotation::new(facing);

        let config = MovementConfig {
            acceleration: 60.0,
            ..MovementConfig::default()
        };
        MovementSystem::run(DT, &mut world, &InputSnapshot::from_keys(&[Key::Back]), &config)
            .unwrap();

        // Facing -X after a quarter turn, so back pushes toward +X.
        let velocity = world.get_component::<Velocity>(id).unwrap();
        assert!((velocity.dx - 0.5).abs() < 1e-5);
        assert!(velocity.dz.abs() < 1e-5);
    }

    #[test]
    fn test_friction_without_keys() {
        let mut world = World::new();
        let id = player(&mut world);
        *world.get_component_mut::<Velocity>(id).unwrap() = Velocity::new(6.0, -2.0, 0.0);
        world.get_component_mut::<Rotation>(id).unwrap().angular_velocity.y = 1.0;
        let config = MovementConfig::default();

        MovementSystem::run(DT, &mut world, &InputSnapshot::NONE, &config).unwrap();

        let keep = 1.0 - config.friction * DT;
        let velocity = world.get_component::<Velocity>(id).unwrap();
        assert!((velocity.dx - 6.0 * keep).abs() < 1e-5);
        assert_eq!(velocity.dy, -2.0);
        let spin = world.get_component::<Rotation>(id).unwrap().angular_velocity.y;
        assert!((spin - (1.0 - config.rotational_friction * DT)).abs() < 1e-5);
    }

    #[test]
    fn test_yaw_is_clamped() {
        let mut world = World::new();
        let id = player(&mut world);
        let config = MovementConfig::default();
        let left = InputSnapshot::from_keys(&[Key::Left]);

        for _ in 0..240 {
            MovementSystem::run(DT, &mut world, &left, &config).unwrap();
        }
        let spin = world.get_component::<Rotation>(id).unwrap().angular_velocity.y;
        assert!((spin - config.max_rotation_speed()).abs() < 1e-5);

        let right = InputSnapshot::from_keys(&[Key::Right]);
        for _ in 0..480 {
            MovementSystem::run(DT, &mut world, &right, &config).unwrap();
        }
        let spin = world.get_component::<Rotation>(id).unwrap().angular_velocity.y;
        assert!((spin + config.max_rotation_speed()).abs() < 1e-5);
    }

    #[test]
    fn test_jump_needs_ground() {
        let mut world = World::new();
        let id = player(&mut world);
        let config = MovementConfig::default();
        let jump = InputSnapshot::from_keys(&[Key::Jump]);

        MovementSystem::run(DT, &mut world, &jump, &config).unwrap();
        assert_eq!(world.get_component::<Velocity>(id).unwrap().dy, 0.0);

        world.add_component(id, OnGround).unwrap();
        MovementSystem::run(DT, &mut world, &jump, &config).unwrap();
        assert_eq!(world.get_component::<Velocity>(id).unwrap().dy, config.jump_force);
        assert!(!world.has_component::<OnGround>(id));
    }

    #[test]
    fn test_incomplete_entities_are_untouched() {
        let mut world = World::new();
        let id = world.create_entity();
        world.add_component(id, Position::default()).unwrap();
        world.add_component(id, Velocity::new(3.0, 0.0, 0.0)).unwrap();
        world.add_component(id, Rotation::default()).unwrap();
        world.add_component(id, OnGround).unwrap();

        let all = InputSnapshot::from_keys(&Key::ALL);
        MovementSystem::run(DT, &mut world, &all, &MovementConfig::default()).unwrap();

        assert_eq!(world.get_component::<Velocity>(id), Some(&Velocity::new(3.0, 0.0, 0.0)));
        assert_eq!(world.get_component::<Rotation>(id).unwrap().angular_velocity, Vec3::ZERO);
        assert!(world.has_component::<OnGround>(id));
    }

    #[test]
    fn test_clamp_keeps_direction() {
        let mut velocity = Velocity::new(30.0, 7.0, 40.0);
        clamp_horizontal(&mut velocity, 20.0);
        assert!((velocity.horizontal_speed() - 20.0).abs() < 1e-4);
        assert!((velocity.dx / velocity.dz - 0.75).abs() < 1e-5);
        assert_eq!(velocity.dy, 7.0);

        let mut slow = Velocity::new(3.0, 0.0, 4.0);
        clamp_horizontal(&mut slow, 20.0);
        assert_eq!(slow, Velocity::new(3.0, 0.0, 4.0));
    }
}
