//! Lightmap UV generation
//!
//! Every triangle becomes its own chart: it is projected onto the plane
//! facing its dominant normal axis, scaled uniformly to fit a square grid
//! cell with padding, and placed row by row. All coordinates land in [0, 1].
//! Charts do not share vertices, so the mesh is unwelded first.

use glam::{Vec2, Vec3};

use crate::normals::face_normal;

/// Fraction of a grid cell left empty on each side of a chart
pub const CHART_PADDING: f32 = 0.1;

/// Expand an indexed attribute into one value per triangle corner
pub fn unweld<T: Copy>(values: &[T], indices: &[u32]) -> Vec<T> {
    indices.iter().map(|&i| values[i as usize]).collect()
}

/// Project a point onto the plane perpendicular to the dominant axis of `normal`
fn project(point: Vec3, normal: Vec3) -> Vec2 {
    let n = normal.abs();
    if n.x >= n.y && n.x >= n.z {
        Vec2::new(point.y, point.z)
    } else if n.y >= n.z {
        Vec2::new(point.x, point.z)
    } else {
        Vec2::new(point.x, point.y)
    }
}

/// Lightmap UVs for an unwelded triangle list, one per corner.
///
/// `positions` holds three consecutive corners per triangle.
pub fn per_triangle_charts(positions: &[Vec3]) -> Vec<Vec2> {
    let triangle_count = positions.len() / 3;
    if triangle_count == 0 {
        return Vec::new();
    }

    let columns = (triangle_count as f32).sqrt().ceil() as usize;
    let cell = 1.0 / columns as f32;
    let padding = cell * CHART_PADDING;
    let usable = cell - 2.0 * padding;

    let mut uvs = Vec::with_capacity(triangle_count * 3);
    for (index, corners) in positions.chunks_exact(3).enumerate() {
        let normal = face_normal(corners[0], corners[1], corners[2]).unwrap_or(Vec3::Y);
        let projected = [
            project(corners[0], normal),
            project(corners[1], normal),
            project(corners[2], normal),
        ];

        let min = projected[0].min(projected[1]).min(projected[2]);
        let max = projected[0].max(projected[1]).max(projected[2]);
        let extent = (max - min).max_element();
        let scale = if extent > f32::EPSILON { usable / extent } else { 0.0 };

        let origin = Vec2::new((index % columns) as f32, (index / columns) as f32) * cell + Vec2::splat(padding);
        for p in projected {
            let uv = origin + (p - min) * scale;
            uvs.push(uv.clamp(Vec2::ZERO, Vec2::ONE));
        }
    }

    uvs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unweld() {
        let values = [10, 20, 30, 40];
        assert_eq!(unweld(&values, &[0, 1, 2, 0, 2, 3]), vec![10, 20, 30, 10, 30, 40]);
    }

    #[test]
    fn test_charts_in_unit_square() {
        let mut positions = Vec::new();
        for i in 0..7 {
            let base = Vec3::new(i as f32 * 5.0, -3.0, 2.0);
            positions.extend([base, base + Vec3::new(4.0, 0.0, 0.0), base + Vec3::new(0.0, 0.0, -9.0)]);
        }
        let uvs = per_triangle_charts(&positions);

        assert_eq!(uvs.len(), positions.len());
        for uv in &uvs {
            assert!(uv.x >= 0.0 && uv.x <= 1.0 && uv.y >= 0.0 && uv.y <= 1.0);
        }
    }

    #[test]
    fn test_charts_do_not_overlap() {
        let tri = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let positions: Vec<Vec3> = tri.iter().chain(tri.iter()).copied().collect();
        let uvs = per_triangle_charts(&positions);

        // Two charts in a 2x2 grid: the second starts in the next column
        let first_max_x = uvs[..3].iter().map(|uv| uv.x).fold(f32::MIN, f32::max);
        let second_min_x = uvs[3..].iter().map(|uv| uv.x).fold(f32::MAX, f32::min);
        assert!(first_max_x < second_min_x);
    }

    #[test]
    fn test_dominant_axis_projection() {
        // Triangle facing +X keeps its Y/Z shape
        assert_eq!(project(Vec3::new(7.0, 1.0, 2.0), Vec3::X), Vec2::new(1.0, 2.0));
        assert_eq!(project(Vec3::new(7.0, 1.0, 2.0), Vec3::NEG_Z), Vec2::new(7.0, 1.0));
    }
}
