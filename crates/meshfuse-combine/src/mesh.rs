//! Combined meshes
//!
//! Merged vertex and index buffers produced from one cluster, recentered
//! around their bounding-box center.

use glam::{Vec2, Vec3};
use meshfuse_core::math::Aabb;
use meshfuse_core::{MaterialId, ObjectId};
use serde::{Deserialize, Serialize};

use crate::collision::CollisionMesh;

/// Largest vertex count addressable with 16-bit indices
pub const U16_VERTEX_LIMIT: usize = u16::MAX as usize;

/// Offsets below this are treated as already centered
const RECENTER_EPSILON: f32 = 1e-6;

/// Index element width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexFormat {
    U16,
    U32,
}

impl IndexFormat {
    /// Narrowest format able to address `vertex_count` vertices
    pub fn for_vertex_count(vertex_count: usize) -> Self {
        if vertex_count > U16_VERTEX_LIMIT {
            Self::U32
        } else {
            Self::U16
        }
    }

    /// Bytes per index
    pub fn size(&self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Triangle-list indices stored at the narrowest sufficient width
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    /// Pack indices for a mesh with `vertex_count` vertices.
    ///
    /// Every index must be below `vertex_count`.
    pub fn new(indices: Vec<u32>, vertex_count: usize) -> Self {
        debug_assert!(indices.iter().all(|&i| (i as usize) < vertex_count));
        match IndexFormat::for_vertex_count(vertex_count) {
            IndexFormat::U16 => Self::U16(indices.into_iter().map(|i| i as u16).collect()),
            IndexFormat::U32 => Self::U32(indices),
        }
    }

    pub fn format(&self) -> IndexFormat {
        match self {
            Self::U16(_) => IndexFormat::U16,
            Self::U32(_) => IndexFormat::U32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U16(indices) => indices.len(),
            Self::U32(indices) => indices.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate indices widened to 32 bits
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Self::U16(indices) => Box::new(indices.iter().map(|&i| i as u32)),
            Self::U32(indices) => Box::new(indices.iter().copied()),
        }
    }

    /// Copy of the indices as 32-bit values
    pub fn to_u32(&self) -> Vec<u32> {
        self.iter().collect()
    }

    /// Size of the buffer in bytes
    pub fn byte_size(&self) -> usize {
        self.len() * self.format().size()
    }
}

/// Merged geometry for one cluster, or one LOD level of it
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedMesh {
    pub material: MaterialId,
    /// LOD level the mesh was built for, `None` for a plain cluster
    pub lod_level: Option<u32>,
    /// Objects whose geometry was merged
    pub sources: Vec<ObjectId>,
    /// Vertex positions relative to [`CombinedMesh::anchor`]
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Primary UVs, empty when no source carried any
    pub uvs: Vec<Vec2>,
    /// Secondary UV channel for lightmapping
    pub lightmap_uvs: Option<Vec<Vec2>>,
    pub indices: IndexBuffer,
    /// World position the vertices are relative to
    pub anchor: Vec3,
    /// Bounds of the recentered vertices
    pub bounds: Aabb,
    /// Placement hint: combined objects should be marked static
    pub mark_static: bool,
    pub collision: Option<CollisionMesh>,
}

impl CombinedMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn index_format(&self) -> IndexFormat {
        self.indices.format()
    }

    /// Bounds in world space
    pub fn world_bounds(&self) -> Aabb {
        self.bounds.translated(self.anchor)
    }

    /// Vertex positions in world space
    pub fn world_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.positions.iter().map(move |p| *p + self.anchor)
    }

    /// Move vertices so the bounding-box center sits at the origin, folding
    /// the offset into the anchor. A second call is a no-op.
    pub fn recenter(&mut self) {
        let center = self.bounds.center();
        if self.bounds.is_empty() || center.abs_diff_eq(Vec3::ZERO, RECENTER_EPSILON) {
            return;
        }
        for position in &mut self.positions {
            *position -= center;
        }
        if let Some(collision) = &mut self.collision {
            collision.translate(-center);
        }
        self.bounds = Aabb::from_points(self.positions.iter().copied());
        self.anchor += center;
    }

    /// Serializable statistics for reports
    pub fn stats(&self) -> MeshStats {
        MeshStats {
            material: self.material,
            lod_level: self.lod_level,
            sources: self.sources.clone(),
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
            index_format: self.index_format(),
            anchor: self.anchor.to_array(),
            size: self.bounds.size().to_array(),
            has_lightmap_uvs: self.lightmap_uvs.is_some(),
            collision_vertices: self.collision.as_ref().map(|c| c.vertex_count()),
            mark_static: self.mark_static,
        }
    }
}

/// Summary of one combined mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    pub material: MaterialId,
    pub lod_level: Option<u32>,
    pub sources: Vec<ObjectId>,
    pub vertices: usize,
    pub triangles: usize,
    pub index_format: IndexFormat,
    pub anchor: [f32; 3],
    pub size: [f32; 3],
    pub has_lightmap_uvs: bool,
    pub collision_vertices: Option<usize>,
    pub mark_static: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh_at(offset: Vec3) -> CombinedMesh {
        let positions: Vec<Vec3> = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 2.0)]
            .iter()
            .map(|p| *p + offset)
            .collect();
        CombinedMesh {
            material: MaterialId(0),
            lod_level: None,
            sources: vec![ObjectId(1)],
            bounds: Aabb::from_points(positions.iter().copied()),
            positions,
            normals: Vec::new(),
            uvs: Vec::new(),
            lightmap_uvs: None,
            indices: IndexBuffer::new(vec![0, 1, 2, 1, 3, 2], 4),
            anchor: Vec3::ZERO,
            mark_static: true,
            collision: None,
        }
    }

    #[test]
    fn test_index_format_threshold() {
        assert_eq!(IndexFormat::for_vertex_count(0), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65_535), IndexFormat::U16);
        assert_eq!(IndexFormat::for_vertex_count(65_536), IndexFormat::U32);
    }

    #[test]
    fn test_index_buffer_packing() {
        let small = IndexBuffer::new(vec![0, 1, 65_534], 65_535);
        assert_eq!(small.format(), IndexFormat::U16);
        assert_eq!(small.to_u32(), vec![0, 1, 65_534]);
        assert_eq!(small.byte_size(), 6);

        let large = IndexBuffer::new(vec![0, 65_535, 70_000], 70_001);
        assert_eq!(large.format(), IndexFormat::U32);
        assert_eq!(large.iter().last(), Some(70_000));
    }

    #[test]
    fn test_recenter_moves_anchor() {
        let mut mesh = mesh_at(Vec3::new(10.0, 0.0, -4.0));
        let world_before: Vec<Vec3> = mesh.world_positions().collect();

        mesh.recenter();
        assert!(mesh.bounds.center().abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(mesh.anchor.abs_diff_eq(Vec3::new(10.5, 0.5, -3.0), 1e-5));

        let world_after: Vec<Vec3> = mesh.world_positions().collect();
        for (a, b) in world_before.iter().zip(&world_after) {
            assert!(a.abs_diff_eq(*b, 1e-5));
        }
    }

    #[test]
    fn test_recenter_idempotent() {
        let mut mesh = mesh_at(Vec3::new(3.0, 7.0, 1.0));
        mesh.recenter();
        let once = mesh.clone();
        mesh.recenter();
        assert_eq!(mesh, once);
    }

    #[test]
    fn test_stats() {
        let mesh = mesh_at(Vec3::ZERO);
        let stats = mesh.stats();
        assert_eq!(stats.vertices, 4);
        assert_eq!(stats.triangles, 2);
        assert_eq!(stats.index_format, IndexFormat::U16);
        assert_eq!(stats.collision_vertices, None);
    }
}
