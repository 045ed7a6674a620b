//! Normal recomputation

use glam::Vec3;

/// Unit normal of a triangle, `None` when it has no area
pub fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Option<Vec3> {
    (p1 - p0).cross(p2 - p0).try_normalize()
}

/// Area-weighted smooth vertex normals.
///
/// Each triangle contributes its unnormalized cross product to its three
/// corners, so larger faces weigh more. Vertices touched only by degenerate
/// triangles get +Y.
pub fn smooth_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut accumulated = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [triangle[0] as usize, triangle[1] as usize, triangle[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let weighted = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        accumulated[a] += weighted;
        accumulated[b] += weighted;
        accumulated[c] += weighted;
    }

    accumulated
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
        .collect()
}
