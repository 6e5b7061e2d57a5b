//! # Presentation
//!
//! The contract between the simulation and whatever draws it. A presenter
//! reads the world once per rendered frame and never writes to it.
//!
//! ## Caching
//!
//! Presenters usually keep derived GPU data per entity. Entity ids are
//! recycled and the whole world can be reset, so an id alone is not a safe
//! key. [`RenderCache`] pairs every entry with the slot incarnation it was
//! built for and drops everything when the world epoch moves.
//!
//! ## Headless
//!
//! [`FrameCollector`] performs the whole per-frame job (chase camera, mesh
//! upload, instance packing) into plain buffers. A real backend would hand
//! the same bytes to its GPU API.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use skyhop_core::{
    ComponentMask, EntityId, Material, PlayerControlled, Position, Renderable3D, Rotation, Scale,
    World,
};

/// Anything that turns world state into pixels (or bytes).
pub trait Presenter {
    /// Draws the current world state. Read-only.
    fn present(&mut self, world: &World);

    /// Drops every cached per-entity resource.
    ///
    /// Called whenever the world is reset.
    fn invalidate(&mut self);
}

// ============================================================================
// RENDER CACHE
// ============================================================================

#[derive(Debug)]
struct CacheEntry<V> {
    incarnation: u32,
    value: V,
}

/// Per-entity cache that cannot serve data built for a previous owner of
/// the same id.
#[derive(Debug)]
pub struct RenderCache<V> {
    epoch: u64,
    entries: HashMap<EntityId, CacheEntry<V>>,
    builds: u64,
}

impl<V> Default for RenderCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RenderCache<V> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: 0,
            entries: HashMap::new(),
            builds: 0,
        }
    }

    /// Returns the value for `id`, building it when missing or stale.
    ///
    /// Returns `None` for ids that are not alive in `world`.
    pub fn get_or_insert_with(
        &mut self,
        world: &World,
        id: EntityId,
        build: impl FnOnce() -> V,
    ) -> Option<&V> {
        if self.epoch != world.epoch() {
            self.entries.clear();
            self.epoch = world.epoch();
        }
        if !world.is_alive(id) {
            return None;
        }
        let incarnation = world.incarnation(id)?;

        let entry = match self.entries.entry(id) {
            Entry::Occupied(mut slot) => {
                if slot.get().incarnation != incarnation {
                    slot.insert(CacheEntry {
                        incarnation,
                        value: build(),
                    });
                    self.builds += 1;
                }
                slot.into_mut()
            }
            Entry::Vacant(slot) => {
                self.builds += 1;
                slot.insert(CacheEntry {
                    incarnation,
                    value: build(),
                })
            }
        };
        Some(&entry.value)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many values have been built over the cache's lifetime.
    #[must_use]
    pub fn builds(&self) -> u64 {
        self.builds
    }
}

// ============================================================================
// GPU-SIDE DATA
// ============================================================================

/// Interleaved vertex: position then normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    /// Model-space position.
    pub position: [f32; 3],
    /// Model-space normal.
    pub normal: [f32; 3],
}

/// Mesh ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GpuMesh {
    /// Interleaved vertices.
    pub vertices: Vec<MeshVertex>,
    /// Triangle list.
    pub indices: Vec<u32>,
}

impl GpuMesh {
    /// Interleaves a renderable's attribute arrays.
    ///
    /// Missing normals default to zero.
    #[must_use]
    pub fn from_renderable(renderable: &Renderable3D) -> Self {
        let vertices = renderable
            .vertices
            .iter()
            .enumerate()
            .map(|(i, position)| MeshVertex {
                position: position.to_array(),
                normal: renderable.normals.get(i).copied().unwrap_or(Vec3::ZERO).to_array(),
            })
            .collect();

        Self {
            vertices,
            indices: renderable.indices.clone(),
        }
    }

    /// Vertex buffer contents.
    #[must_use]
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer contents.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Per-instance data sent to the GPU.
///
/// 96 bytes, 16-byte aligned rows.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Column-major model matrix.
    pub model: [f32; 16],
    /// Diffuse RGB, specular strength in w.
    pub diffuse_specular: [f32; 4],
    /// Shininess in x, rest unused.
    pub shininess: [f32; 4],
}

impl InstanceData {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Packs a transform and a material.
    #[must_use]
    pub fn new(model: Mat4, material: &Material) -> Self {
        let color = material.diffuse_color;
        Self {
            model: model.to_cols_array(),
            diffuse_specular: [color.x, color.y, color.z, material.specular_strength],
            shininess: [material.shininess, 0.0, 0.0, 0.0],
        }
    }

    /// The model matrix.
    #[must_use]
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_cols_array(&self.model)
    }
}

// ============================================================================
// CAMERA
// ============================================================================

/// Third-person camera trailing the player.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Camera position.
    pub eye: Vec3,
    /// Point looked at.
    pub target: Vec3,
}

impl Camera {
    /// Height of the eye above the player.
    pub const HEIGHT: f32 = 5.0;
    /// Horizontal distance behind the player.
    pub const DISTANCE: f32 = 15.0;
    /// Vertical field of view (radians).
    pub const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
    /// Near clip plane.
    pub const NEAR: f32 = 0.1;
    /// Far clip plane.
    pub const FAR: f32 = 1000.0;

    /// Places the camera behind and above `position`, looking along the
    /// horizontal part of the player's facing.
    #[must_use]
    pub fn chase(position: Vec3, orientation: Quat) -> Self {
        let facing = orientation * Vec3::NEG_Z;
        let flat = Vec3::new(facing.x, 0.0, facing.z).try_normalize().unwrap_or(Vec3::NEG_Z);

        Self {
            eye: position + Vec3::Y * Self::HEIGHT - flat * Self::DISTANCE,
            target: position + Vec3::Y * (Self::HEIGHT / 2.0),
        }
    }

    /// World-to-view transform.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    /// View-to-clip transform for the given aspect ratio.
    #[must_use]
    pub fn projection(aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(Self::FOV_Y, aspect_ratio.max(f32::EPSILON), Self::NEAR, Self::FAR)
    }
}

// ============================================================================
// HEADLESS PRESENTER
// ============================================================================

/// Everything one frame would submit.
#[derive(Clone, Debug, Default)]
pub struct Frame {
    /// Chase camera, if a player exists.
    pub camera: Option<Camera>,
    /// Combined view-projection matrix.
    pub view_projection: Mat4,
    /// Drawn entities, parallel to `instances`.
    pub entities: Vec<EntityId>,
    /// One instance per drawn entity.
    pub instances: Vec<InstanceData>,
    /// Indices submitted across all draws.
    pub index_count: usize,
}

impl Frame {
    /// Instance buffer contents.
    #[must_use]
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Reference presenter that records frames instead of drawing them.
#[derive(Debug)]
pub struct FrameCollector {
    meshes: RenderCache<GpuMesh>,
    frame: Frame,
    aspect_ratio: f32,
    frames_presented: u64,
}

impl Default for FrameCollector {
    fn default() -> Self {
        Self::new(16.0 / 9.0)
    }
}

impl FrameCollector {
    /// Creates a collector for a viewport of the given aspect ratio.
    #[must_use]
    pub fn new(aspect_ratio: f32) -> Self {
        Self {
            meshes: RenderCache::new(),
            frame: Frame::default(),
            aspect_ratio,
            frames_presented: 0,
        }
    }

    /// The most recently presented frame.
    #[must_use]
    pub fn last_frame(&self) -> &Frame {
        &self.frame
    }

    /// The uploaded mesh cache.
    #[must_use]
    pub fn meshes(&self) -> &RenderCache<GpuMesh> {
        &self.meshes
    }

    /// Frames presented so far.
    #[must_use]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    fn drawable() -> ComponentMask {
        ComponentMask::of::<Renderable3D>()
            .with::<Position>()
            .with::<Material>()
    }

    fn find_camera(world: &World) -> Option<Camera> {
        let required = ComponentMask::of::<PlayerControlled>()
            .with::<Position>()
            .with::<Rotation>();
        let player = world.entities().find(|id| world.matches(*id, required))?;
        let position = world.get_component::<Position>(player)?;
        let rotation = world.get_component::<Rotation>(player)?;
        Some(Camera::chase(position.to_vec3(), rotation.quaternion))
    }
}

impl Presenter for FrameCollector {
    fn present(&mut self, world: &World) {
        self.frames_presented += 1;
        self.frame.entities.clear();
        self.frame.instances.clear();
        self.frame.index_count = 0;

        self.frame.camera = Self::find_camera(world);
        let Some(camera) = self.frame.camera else {
            tracing::debug!("no player to follow, nothing drawn");
            return;
        };
        self.frame.view_projection = Camera::projection(self.aspect_ratio) * camera.view();

        let drawable = Self::drawable();
        for id in world.entities().filter(|id| world.matches(*id, drawable)) {
            let (Some(position), Some(renderable), Some(material)) = (
                world.get_component::<Position>(id),
                world.get_component::<Renderable3D>(id),
                world.get_component::<Material>(id),
            ) else {
                continue;
            };
            let rotation = world
                .get_component::<Rotation>(id)
                .map_or(Quat::IDENTITY, |rotation| rotation.quaternion);
            let scale = world.get_component::<Scale>(id).copied().unwrap_or_default();

            let Some(mesh) = self
                .meshes
                .get_or_insert_with(world, id, || GpuMesh::from_renderable(renderable))
            else {
                continue;
            };
            self.frame.index_count += mesh.indices.len();

            let model = Mat4::from_scale_rotation_translation(scale.0, rotation, position.to_vec3());
            self.frame.entities.push(id);
            self.frame.instances.push(InstanceData::new(model, material));
        }
    }

    fn invalidate(&mut self) {
        let dropped = self.meshes.len();
        self.meshes.clear();
        self.frame = Frame::default();
        tracing::debug!(dropped, "presentation caches invalidated");
    }
}
