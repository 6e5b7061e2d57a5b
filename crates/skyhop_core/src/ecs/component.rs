//! # Component System
//!
//! Components are pure data containers with no behavior.
//! Each type declares a stable index into the entity component mask.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

/// Marker trait for ECS components.
///
/// # Example
///
/// ```rust
/// use skyhop_core::Component;
///
/// #[derive(Clone, Copy, Debug, Default)]
/// struct Health(f32);
///
/// impl Component for Health {
///     const ID: u8 = 32;
/// }
/// ```
pub trait Component: 'static {
    /// Unique index for this component type (0-63).
    ///
    /// This index selects the type's bit in every entity's mask. Two
    /// types registered with the same world must not share it.
    const ID: u8;
}

/// Position component for entities.
///
/// Center of the entity in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Position {
    /// X coordinate in world space.
    pub x: f32,
    /// Y coordinate in world space (up).
    pub y: f32,
    /// Z coordinate in world space.
    pub z: f32,
}

impl Component for Position {
    const ID: u8 = 0;
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the position as a vector.
    #[inline]
    #[must_use]
    pub const fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }
}

/// Velocity component for entities.
///
/// World units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Velocity {
    /// X velocity component.
    pub dx: f32,
    /// Y velocity component.
    pub dy: f32,
    /// Z velocity component.
    pub dz: f32,
}

impl Component for Velocity {
    const ID: u8 = 1;
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(dx: f32, dy: f32, dz: f32) -> Self {
        Self { dx, dy, dz }
    }

    /// Magnitude of the (x, z) part.
    #[inline]
    #[must_use]
    pub fn horizontal_speed(self) -> f32 {
        (self.dx * self.dx + self.dz * self.dz).sqrt()
    }
}

/// Acceleration component for entities.
///
/// Valid for a single tick; physics zeroes it after integrating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Acceleration {
    /// X acceleration component.
    pub ax: f32,
    /// Y acceleration component.
    pub ay: f32,
    /// Z acceleration component.
    pub az: f32,
}

impl Component for Acceleration {
    const ID: u8 = 2;
}

impl Acceleration {
    /// Creates a new acceleration.
    #[inline]
    #[must_use]
    pub const fn new(ax: f32, ay: f32, az: f32) -> Self {
        Self { ax, ay, az }
    }
}

/// Orientation plus spin.
///
/// `quaternion` is unit length after every physics update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    /// Current orientation.
    pub quaternion: Quat,
    /// Radians per second around X, Y (yaw), Z.
    pub angular_velocity: Vec3,
    /// Change of angular velocity per second, zeroed every tick.
    pub angular_acceleration: Vec3,
}

impl Component for Rotation {
    const ID: u8 = 3;
}

impl Default for Rotation {
    fn default() -> Self {
        Self::new(Quat::IDENTITY)
    }
}

impl Rotation {
    /// Creates a rotation at rest with the given orientation.
    #[must_use]
    pub const fn new(quaternion: Quat) -> Self {
        Self {
            quaternion,
            angular_velocity: Vec3::ZERO,
            angular_acceleration: Vec3::ZERO,
        }
    }

    /// Creates a rotation with an initial spin.
    #[must_use]
    pub const fn spinning(quaternion: Quat, angular_velocity: Vec3) -> Self {
        Self {
            quaternion,
            angular_velocity,
            angular_acceleration: Vec3::ZERO,
        }
    }

    /// Local -Z rotated into world space.
    #[inline]
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.quaternion * Vec3::NEG_Z
    }
}

/// Non-uniform scale multiplier.
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Scale(pub Vec3);

impl Component for Scale {
    const ID: u8 = 4;
}

impl Default for Scale {
    fn default() -> Self {
        Self(Vec3::ONE)
    }
}

impl Scale {
    /// Creates a new scale.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }
}

/// Static geometry, written once when the entity is built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Renderable3D {
    /// Vertex positions in model space.
    pub vertices: Vec<Vec3>,
    /// Per-vertex normals.
    pub normals: Vec<Vec3>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
}

impl Component for Renderable3D {
    const ID: u8 = 5;
}

impl Renderable3D {
    /// Number of triangles described by `indices`.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Lighting and color properties.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Base color (linear RGB).
    pub diffuse_color: Vec3,
    /// How reflective the surface is.
    pub specular_strength: f32,
    /// Specular exponent.
    pub shininess: f32,
}

impl Component for Material {
    const ID: u8 = 6;
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Vec3::splat(0.5), 0.5, 32.0)
    }
}

impl Material {
    /// Creates a new material.
    #[must_use]
    pub const fn new(diffuse_color: Vec3, specular_strength: f32, shininess: f32) -> Self {
        Self {
            diffuse_color,
            specular_strength,
            shininess,
        }
    }
}

/// Tag: entity is steered by player input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerControlled;

impl Component for PlayerControlled {
    const ID: u8 = 7;
}

/// Tag: entity takes part in collision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Collidable;

impl Component for Collidable {
    const ID: u8 = 8;
}

/// Tag: entity falls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GravityAffected;

impl Component for GravityAffected {
    const ID: u8 = 9;
}

/// Tag: vertical support was found in the latest physics pass.
///
/// Derived state, owned by the physics system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OnGround;

impl Component for OnGround {
    const ID: u8 = 10;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_ids_are_distinct() {
        let mut ids = vec![
            Position::ID,
            Velocity::ID,
            Acceleration::ID,
            Rotation::ID,
            Scale::ID,
            Renderable3D::ID,
            Material::ID,
            PlayerControlled::ID,
            Collidable::ID,
            GravityAffected::ID,
            OnGround::ID,
        ];
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_identity_forward_is_negative_z() {
        let forward = Rotation::default().forward();
        assert!((forward - Vec3::NEG_Z).length() < 1e-6);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Scale::default().0, Vec3::ONE);
        assert_eq!(Material::default().shininess, 32.0);
        assert_eq!(Rotation::default().quaternion, Quat::IDENTITY);
    }

    #[test]
    fn test_horizontal_speed() {
        let v = Velocity::new(3.0, 100.0, 4.0);
        assert!((v.horizontal_speed() - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_kinematic_sizes() {
        assert_eq!(std::mem::size_of::<Position>(), 12);
        assert_eq!(std::mem::size_of::<Velocity>(), 12);
        assert_eq!(std::mem::size_of::<Scale>(), 12);
    }
}
