//! K-Means partitioner
//!
//! Runs an independent K-Means per material group. Centroids start at
//! uniform random points inside the group's bounding box and are refined
//! for a fixed number of iterations.

use glam::Vec3;
use indexmap::IndexMap;
use meshfuse_core::math::Aabb;
use meshfuse_core::{Algorithm, Diagnostics, MaterialId};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{ItemPool, PartitionItem, Partitioner, build_cluster};
use crate::cluster::Cluster;

/// Per-material K-Means partitioner
#[derive(Debug, Clone)]
pub struct KMeansPartitioner<R: Rng = ChaCha8Rng> {
    /// Centroids per material
    k: usize,
    /// Fixed iteration count
    iterations: usize,
    rng: R,
}

impl KMeansPartitioner {
    /// Create a partitioner backed by ChaCha8.
    ///
    /// With `seed` the output is reproducible; without it a fresh seed is
    /// drawn from the thread-local generator.
    pub fn new(k: usize, iterations: usize, seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self::with_rng(k, iterations, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> KMeansPartitioner<R> {
    /// Create a partitioner drawing initial centroids from `rng`
    pub fn with_rng(k: usize, iterations: usize, rng: R) -> Self {
        Self { k, iterations, rng }
    }

    /// Centroids per material
    pub fn k(&self) -> usize {
        self.k
    }

    /// Fixed iteration count
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn random_point(&mut self, bounds: &Aabb) -> Vec3 {
        let mut axis = |min: f32, max: f32| {
            if min < max {
                self.rng.random_range(min..=max)
            } else {
                min
            }
        };
        Vec3::new(
            axis(bounds.min.x, bounds.max.x),
            axis(bounds.min.y, bounds.max.y),
            axis(bounds.min.z, bounds.max.z),
        )
    }

    /// Assign every point to a centroid index
    fn assign(&mut self, points: &[Vec3]) -> Vec<usize> {
        let bounds = Aabb::from_points(points.iter().copied());
        let mut centroids: Vec<Vec3> = (0..self.k).map(|_| self.random_point(&bounds)).collect();
        let mut assignment = vec![0; points.len()];

        for _ in 0..self.iterations {
            for (slot, point) in assignment.iter_mut().zip(points) {
                *slot = nearest(&centroids, *point);
            }

            let mut sums = vec![Vec3::ZERO; self.k];
            let mut counts = vec![0usize; self.k];
            for (&c, point) in assignment.iter().zip(points) {
                sums[c] += *point;
                counts[c] += 1;
            }
            for ((centroid, sum), count) in centroids.iter_mut().zip(sums).zip(counts) {
                if count > 0 {
                    *centroid = sum / count as f32;
                }
            }
        }

        assignment
    }
}

/// Index of the nearest centroid; ties go to the lower index
fn nearest(centroids: &[Vec3], point: Vec3) -> usize {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = centroid.distance_squared(point);
        if distance < best_distance {
            best = index;
            best_distance = distance;
        }
    }
    best
}

impl<R: Rng> Partitioner for KMeansPartitioner<R> {
    fn algorithm(&self) -> Algorithm {
        Algorithm::KMeans
    }

    fn partition<'a>(&mut self, pool: &ItemPool<'a>, diagnostics: &mut Diagnostics) -> Vec<Cluster<'a>> {
        let mut by_material: IndexMap<MaterialId, Vec<&PartitionItem<'a>>> = IndexMap::new();
        for item in &pool.items {
            by_material.entry(item.material).or_default().push(item);
        }

        let mut clusters = Vec::new();
        for (material, items) in &by_material {
            let points: Vec<Vec3> = items.iter().map(|item| item.position).collect();
            let assignment = self.assign(&points);

            let mut buckets: Vec<Vec<&PartitionItem<'a>>> = vec![Vec::new(); self.k];
            for (item, &c) in items.iter().zip(&assignment) {
                buckets[c].push(*item);
            }

            let before = clusters.len();
            clusters.extend(
                buckets
                    .iter()
                    .filter(|bucket| !bucket.is_empty())
                    .filter_map(|bucket| build_cluster(bucket, Algorithm::KMeans, pool.has_lod_groups, diagnostics)),
            );
            tracing::debug!(
                %material,
                items = items.len(),
                clusters = clusters.len() - before,
                "k-means partition"
            );
        }

        clusters
    }
}
