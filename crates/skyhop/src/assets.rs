//! # Model Assets
//!
//! Geometry comes from a [`ModelLoader`]. File formats live outside this
//! crate; the bundled [`ProceduralModelLoader`] builds shapes in code.

use std::path::Path;

use glam::Vec3;
use skyhop_core::Renderable3D;

use crate::error::{GameError, GameResult};

/// Triangle mesh as produced by a loader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions in model space.
    pub vertices: Vec<Vec3>,
    /// One normal per vertex.
    pub normals: Vec<Vec3>,
    /// Triangle list.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned cube of edge 1 centered on the origin.
    ///
    /// Four vertices per face so every face gets a flat normal.
    #[must_use]
    pub fn unit_cube() -> Self {
        const FACES: [(Vec3, Vec3, Vec3); 6] = [
            // normal, u axis, v axis (u × v == normal)
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut mesh = Self {
            vertices: Vec::with_capacity(24),
            normals: Vec::with_capacity(24),
            indices: Vec::with_capacity(36),
        };

        for (face, (normal, u, v)) in (0u32..).zip(FACES) {
            let center = normal * 0.5;
            for (su, sv) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
                mesh.vertices.push(center + u * su + v * sv);
                mesh.normals.push(normal);
            }
            let base = face * 4;
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Checks that every index is in range and normals match vertices.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let count = self.vertices.len();
        self.normals.len() == count
            && self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|index| usize::try_from(*index).is_ok_and(|index| index < count))
    }
}

impl From<MeshData> for Renderable3D {
    fn from(mesh: MeshData) -> Self {
        Self {
            vertices: mesh.vertices,
            normals: mesh.normals,
            indices: mesh.indices,
        }
    }
}

/// Source of model geometry.
pub trait ModelLoader {
    /// Loads the model at `path`.
    ///
    /// # Errors
    ///
    /// [`GameError::AssetLoad`] if the model cannot be produced.
    fn load(&self, path: &str) -> GameResult<MeshData>;
}

/// Loader that synthesizes meshes instead of reading files.
///
/// Any path whose file name mentions `cube` yields [`MeshData::unit_cube`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ProceduralModelLoader;

impl ModelLoader for ProceduralModelLoader {
    fn load(&self, path: &str) -> GameResult<MeshData> {
        let stem = Path::new(path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if stem.contains("cube") {
            Ok(MeshData::unit_cube())
        } else {
            Err(GameError::AssetLoad {
                path: path.to_owned(),
                reason: "no procedural model with this name".to_owned(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cube_shape() {
        let cube = MeshData::unit_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.is_well_formed());

        for vertex in &cube.vertices {
            assert!((vertex.abs() - Vec3::splat(0.5)).abs().max_element() < 1e-6);
        }
    }

    #[test]
    fn test_cube_triangles_face_outward() {
        let cube = MeshData::unit_cube();
        for triangle in cube.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| cube.vertices[triangle[k] as usize]);
            let winding = (b - a).cross(c - a).normalize();
            let normal = cube.normals[triangle[0] as usize];
            assert!((winding - normal).length() < 1e-5, "{winding} vs {normal}");
        }
    }

    #[test]
    fn test_procedural_loader() {
        let loader = ProceduralModelLoader;
        assert_eq!(loader.load("assets/models/cube.obj").unwrap(), MeshData::unit_cube());
        assert!(loader.load("Rounded_Cube.glb").is_ok());

        let err = loader.load("assets/models/teapot.obj").unwrap_err();
        assert!(matches!(err, GameError::AssetLoad { ref path, .. } if path.contains("teapot")));
    }

    #[test]
    fn test_mesh_becomes_renderable() {
        let renderable = Renderable3D::from(MeshData::unit_cube());
        assert_eq!(renderable.triangle_count(), 12);
    }
}
