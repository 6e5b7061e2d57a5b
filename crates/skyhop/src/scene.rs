//! # Scene Population
//!
//! Builds the level into an empty world: the player above a wide start
//! platform, then a winding path of smaller platforms that climbs a little
//! with every hop. The path is drawn from a seeded ChaCha stream, so one
//! seed always gives one level.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skyhop_core::{
    Acceleration, Collidable, EntityId, GravityAffected, Material, PlayerControlled, Position,
    Renderable3D, Rotation, Scale, Velocity, World,
};

use crate::assets::{MeshData, ModelLoader};
use crate::config::SceneConfig;
use crate::error::GameResult;

/// Player color.
pub const PLAYER_COLOR: Vec3 = Vec3::new(1.0, 0.5, 0.0);

/// Platform color.
pub const PLATFORM_COLOR: Vec3 = Vec3::splat(0.8);

/// Heading of the first hop.
const INITIAL_DIRECTION: Vec3 = Vec3::X;

/// Ids of what [`populate`] created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneHandles {
    /// The player-controlled entity.
    pub player: EntityId,
    /// Start platform first, then the path in order.
    pub platforms: Vec<EntityId>,
}

/// Fills `world` with the player and the platform path.
///
/// The model is requested once. If the loader fails the error is logged
/// and every entity is built without [`Renderable3D`].
///
/// # Errors
///
/// Only if the world rejects a component, which cannot happen for the
/// freshly created entities used here.
pub fn populate(
    world: &mut World,
    loader: &dyn ModelLoader,
    config: &SceneConfig,
) -> GameResult<SceneHandles> {
    let mesh = match loader.load(&config.model_path) {
        Ok(mesh) => Some(mesh),
        Err(err) => {
            tracing::warn!(path = %config.model_path, error = %err, "model unavailable, spawning without geometry");
            None
        }
    };

    let player = spawn_player(world, mesh.as_ref(), config)?;

    let mut platforms = Vec::with_capacity(config.platform_count as usize + 1);
    let mut last = Vec3::ZERO;
    let mut direction = INITIAL_DIRECTION;
    platforms.push(spawn_platform(
        world,
        mesh.as_ref(),
        last,
        Vec3::from_array(config.start_platform_scale),
    )?);

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let max_turn = config.max_turn_deg.to_radians();
    for _ in 0..config.platform_count {
        let turn = if max_turn > 0.0 {
            rng.gen_range(-max_turn..=max_turn)
        } else {
            0.0
        };
        let distance = if config.min_platform_distance < config.max_platform_distance {
            rng.gen_range(config.min_platform_distance..=config.max_platform_distance)
        } else {
            config.min_platform_distance
        };

        direction = Quat::from_rotation_y(turn) * direction;
        let next = last + direction * distance + Vec3::Y * config.platform_step_height;
        platforms.push(spawn_platform(
            world,
            mesh.as_ref(),
            next,
            Vec3::from_array(config.platform_scale),
        )?);
        last = next;
    }

    tracing::info!(
        seed = config.seed,
        platforms = platforms.len(),
        textured = mesh.is_some(),
        "scene populated"
    );

    Ok(SceneHandles { player, platforms })
}

fn spawn_player(
    world: &mut World,
    mesh: Option<&MeshData>,
    config: &SceneConfig,
) -> GameResult<EntityId> {
    let [x, y, z] = config.player_spawn;
    let id = world.create_entity();

    world.add_component(id, Position::new(x, y, z))?;
    world.add_component(id, Velocity::default())?;
    world.add_component(id, Acceleration::default())?;
    if let Some(mesh) = mesh {
        world.add_component(id, Renderable3D::from(mesh.clone()))?;
    }
    world.add_component(id, Material::new(PLAYER_COLOR, 0.5, 32.0))?;
    world.add_component(id, PlayerControlled)?;
    world.add_component(id, Collidable)?;
    world.add_component(id, GravityAffected)?;
    world.add_component(id, Rotation::default())?;
    world.add_component(id, Scale::default())?;

    Ok(id)
}

fn spawn_platform(
    world: &mut World,
    mesh: Option<&MeshData>,
    center: Vec3,
    scale: Vec3,
) -> GameResult<EntityId> {
    let id = world.create_entity();

    world.add_component(id, Position::new(center.x, center.y, center.z))?;
    world.add_component(id, Velocity::default())?;
    world.add_component(id, Acceleration::default())?;
    if let Some(mesh) = mesh {
        world.add_component(id, Renderable3D::from(mesh.clone()))?;
    }
    world.add_component(id, Material::new(PLATFORM_COLOR, 0.5, 32.0))?;
    world.add_component(id, Collidable)?;
    world.add_component(id, Scale(scale))?;

    Ok(id)
}
