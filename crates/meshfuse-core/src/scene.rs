//! Scene data model
//!
//! The captured, immutable view of a scene that clustering works on:
//! - Transforms and shared mesh data
//! - Renderable objects (one mesh instance with one material)
//! - LOD group descriptors listing objects per level

use std::fmt;
use std::sync::Arc;

use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::MeshDefect;
use crate::math::Aabb;

/// World transform of a renderable object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// World position
    pub position: Vec3,
    /// World rotation
    pub rotation: Quat,
    /// World scale
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Create a new transform from all components
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Local-to-world matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Matrix for transforming normals (inverse transpose of the upper 3x3)
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix()).inverse().transpose()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Opaque handle back to the originating scene object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Material identity; objects are only ever merged with objects sharing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mat{}", self.0)
    }
}

/// LOD membership of an object
///
/// `Unassigned` is the "no LOD membership" sentinel. It orders before every
/// real level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LodLevel {
    /// Not part of any LOD chain
    #[default]
    Unassigned,
    /// Visible at the given level (0 = most detailed)
    Level(u32),
}

impl LodLevel {
    /// The level index, `None` for the sentinel
    pub fn index(&self) -> Option<u32> {
        match self {
            Self::Unassigned => None,
            Self::Level(level) => Some(*level),
        }
    }

    /// Whether this is a real LOD level
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Level(_))
    }
}

impl fmt::Display for LodLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unassigned => write!(f, "LOD-"),
            Self::Level(level) => write!(f, "LOD{}", level),
        }
    }
}

/// Triangle mesh in object space
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshData {
    /// Vertex positions
    pub positions: Vec<Vec3>,
    /// Vertex normals (empty when the mesh has none)
    pub normals: Vec<Vec3>,
    /// Primary UV channel (empty when the mesh has none)
    pub uvs: Vec<Vec2>,
    /// Triangle list indices
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Create a mesh from positions and triangle indices
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            indices,
        }
    }

    /// Attach per-vertex normals
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = normals;
        self
    }

    /// Attach a primary UV channel
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Self {
        self.uvs = uvs;
        self
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the mesh contributes no geometry
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.len() < 3
    }

    /// Whether every vertex carries a normal
    pub fn has_normals(&self) -> bool {
        !self.positions.is_empty() && self.normals.len() == self.positions.len()
    }

    /// Whether every vertex carries a UV
    pub fn has_uvs(&self) -> bool {
        !self.positions.is_empty() && self.uvs.len() == self.positions.len()
    }

    /// Check that indices form whole triangles over existing vertices and
    /// that normals and UVs are either absent or one per vertex
    pub fn validate(&self) -> Result<(), MeshDefect> {
        let vertices = self.positions.len();
        if self.indices.len() % 3 != 0 {
            return Err(MeshDefect::PartialTriangle {
                count: self.indices.len(),
            });
        }
        if let Some((position, &index)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &index)| index as usize >= vertices)
        {
            return Err(MeshDefect::IndexOutOfRange {
                position,
                index,
                vertices,
            });
        }
        for (attribute, count) in [("normals", self.normals.len()), ("uvs", self.uvs.len())] {
            if count != 0 && count != vertices {
                return Err(MeshDefect::AttributeCount {
                    attribute,
                    count,
                    vertices,
                });
            }
        }
        Ok(())
    }

    /// Object-space bounds
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied())
    }
}

/// A leaf geometry instance captured from the scene
#[derive(Debug, Clone)]
pub struct RenderableObject {
    /// Source identity
    pub id: ObjectId,
    /// Scene object name
    pub name: String,
    /// World transform
    pub transform: Transform,
    /// Shared mesh, `None` when the object has no mesh attached
    pub mesh: Option<Arc<MeshData>>,
    /// Material identity
    pub material: MaterialId,
    /// Intrinsic LOD membership
    pub lod: LodLevel,
    /// Scene tag
    pub tag: String,
    /// Scene layer
    pub layer: u32,
    /// Marked static in the scene
    pub is_static: bool,
    /// Object active in the hierarchy
    pub active: bool,
    /// Renderer component enabled
    pub renderer_enabled: bool,
}

impl RenderableObject {
    /// Create an active, non-static object with no mesh at the origin
    pub fn new(id: ObjectId, name: impl Into<String>, material: MaterialId) -> Self {
        Self {
            id,
            name: name.into(),
            transform: Transform::IDENTITY,
            mesh: None,
            material,
            lod: LodLevel::Unassigned,
            tag: String::from("Untagged"),
            layer: 0,
            is_static: false,
            active: true,
            renderer_enabled: true,
        }
    }

    /// Set the world transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the world position, keeping rotation and scale
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    /// Attach a shared mesh
    pub fn with_mesh(mut self, mesh: Arc<MeshData>) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Set the intrinsic LOD level
    pub fn with_lod(mut self, lod: LodLevel) -> Self {
        self.lod = lod;
        self
    }

    /// World position
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Local-to-world matrix
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// Triangle count of the attached mesh (0 without mesh)
    pub fn triangle_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, |m| m.triangle_count())
    }

    /// Vertex count of the attached mesh (0 without mesh)
    pub fn vertex_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, |m| m.vertex_count())
    }

    /// Whether the object has geometry that can be merged
    pub fn has_geometry(&self) -> bool {
        self.mesh.as_ref().is_some_and(|m| !m.is_empty())
    }

    /// World-space bounds of the mesh, or a point box at the position
    pub fn world_bounds(&self) -> Aabb {
        match &self.mesh {
            Some(mesh) if !mesh.positions.is_empty() => mesh.bounds().transform(self.world_matrix()),
            _ => Aabb::new(self.position(), self.position()),
        }
    }
}

/// A named LOD group: the objects visible at each level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodGroupDescriptor {
    /// Group name
    pub name: String,
    /// Objects per level, index 0 is the most detailed level
    pub levels: Vec<Vec<ObjectId>>,
}

impl LodGroupDescriptor {
    /// Create a descriptor from per-level object lists
    pub fn new(name: impl Into<String>, levels: Vec<Vec<ObjectId>>) -> Self {
        Self {
            name: name.into(),
            levels,
        }
    }

    /// Highest level index present, `None` for a group with no levels
    pub fn max_level(&self) -> Option<u32> {
        self.levels.len().checked_sub(1).map(|l| l as u32)
    }

    /// Iterate `(level, object)` pairs in level order
    pub fn entries(&self) -> impl Iterator<Item = (u32, ObjectId)> + '_ {
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(level, ids)| ids.iter().map(move |id| (level as u32, *id)))
    }
}
