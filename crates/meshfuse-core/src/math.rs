//! Math utilities
//!
//! Re-exports from glam and the bounding volumes used by clustering and
//! geometry aggregation.

pub use glam::{IVec3, Mat3, Mat4, Quat, Vec2, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create an empty AABB
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create the smallest AABB enclosing all points.
    ///
    /// Returns [`Aabb::EMPTY`] for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut result = Self::EMPTY;
        for point in points {
            result.expand_to_include(point);
        }
        result
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if the AABB is empty
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Check if a point is inside the AABB
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Expand the AABB to include a point
    pub fn expand_to_include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Merge with another AABB
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Translate both corners by `offset`
    pub fn translated(&self, offset: Vec3) -> Aabb {
        if self.is_empty() {
            return *self;
        }
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Transform the AABB by a matrix
    pub fn transform(&self, matrix: Mat4) -> Aabb {
        if self.is_empty() {
            return *self;
        }

        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        Aabb::from_points(corners.into_iter().map(|c| matrix.transform_point3(c)))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere
    pub center: Vec3,
    /// Radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a new bounding sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if a point is inside the sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius
    }
}

/// Integer grid cell containing `position` for cells of size `cell_size`.
///
/// Each axis is floor-divided, so negative coordinates land in negative cells
/// (`-0.5` with a cell size of `1.0` is cell `-1`).
pub fn cell_coord(position: Vec3, cell_size: Vec3) -> IVec3 {
    (position / cell_size).floor().as_ivec3()
}

/// Arithmetic mean of a set of points, `None` when there are none.
pub fn mean(points: impl IntoIterator<Item = Vec3>) -> Option<Vec3> {
    let (sum, count) = points
        .into_iter()
        .fold((Vec3::ZERO, 0usize), |(sum, count), p| (sum + p, count + 1));
    (count > 0).then(|| sum / count as f32)
}
