//! Collision mesh
//!
//! Welded triangle soup built from merged render geometry. Vertices with
//! bitwise-equal positions are merged, so seams split for normals or UVs
//! collapse back into shared vertices.

use ahash::AHashMap;
use glam::Vec3;

/// Position-only triangle mesh for physics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionMesh {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
}

impl CollisionMesh {
    /// Weld `positions` and remap the triangle list `indices`.
    ///
    /// Triangles that become degenerate after welding are dropped.
    pub fn weld(positions: &[Vec3], indices: impl IntoIterator<Item = u32>) -> Self {
        let mut lookup: AHashMap<[u32; 3], u32> = AHashMap::with_capacity(positions.len());
        let mut vertices = Vec::new();
        let remap: Vec<u32> = positions
            .iter()
            .map(|p| {
                let key = [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()];
                *lookup.entry(key).or_insert_with(|| {
                    vertices.push(*p);
                    (vertices.len() - 1) as u32
                })
            })
            .collect();

        let indices: Vec<u32> = indices.into_iter().collect();
        let triangles = indices
            .chunks_exact(3)
            .map(|t| [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]])
            .filter(|[a, b, c]| a != b && b != c && a != c)
            .collect();

        Self { vertices, triangles }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub(crate) fn translate(&mut self, offset: Vec3) {
        for vertex in &mut self.vertices {
            *vertex += offset;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weld_shared_corners() {
        // Two triangles of a quad stored with split vertices
        let positions = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::ZERO,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ];
        let mesh = CollisionMesh::weld(&positions, [0, 1, 2, 3, 4, 5]);

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangles, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_degenerate_dropped() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::X];
        let mesh = CollisionMesh::weld(&positions, [0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.vertex_count(), 2);
    }
}
