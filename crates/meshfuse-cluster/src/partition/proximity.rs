//! Proximity partitioner
//!
//! Greedy single-seed grouping: the first unassigned item seeds a group and
//! absorbs every remaining item within the radius that shares its material.
//! Absorbed items are not re-used as seeds for the same group, so groups are
//! balls around the seed rather than transitive closures.

use glam::Vec3;
use meshfuse_core::{Algorithm, Diagnostics};

use super::{ItemPool, PartitionItem, Partitioner, build_cluster};
use crate::cluster::Cluster;

/// Seed-and-absorb over `pool`.
///
/// Seeds are taken in pool order. Each remaining entry is tested against the
/// seed only, in scan order, and absorbed when it lies within `radius` of the
/// seed and `accept(seed, entry)` holds. Groups come out in seed order with
/// the seed first.
pub(crate) fn seed_and_absorb<T>(
    pool: Vec<T>,
    radius: f32,
    position: impl Fn(&T) -> Vec3,
    accept: impl Fn(&T, &T) -> bool,
) -> Vec<Vec<T>> {
    let mut groups = Vec::new();
    let mut remaining = pool.into_iter();

    loop {
        let Some(seed) = remaining.next() else {
            break;
        };
        let seed_position = position(&seed);
        let mut group = vec![];
        let mut rest = Vec::new();

        for entry in remaining {
            if seed_position.distance(position(&entry)) <= radius && accept(&seed, &entry) {
                group.push(entry);
            } else {
                rest.push(entry);
            }
        }

        group.insert(0, seed);
        groups.push(group);
        remaining = rest.into_iter();
    }

    groups
}

/// Radius-based greedy partitioner
#[derive(Debug, Clone)]
pub struct ProximityPartitioner {
    radius: f32,
}

impl ProximityPartitioner {
    /// Create a partitioner grouping items within `radius` of a seed
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    /// Grouping radius
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Partitioner for ProximityPartitioner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Proximity
    }

    fn partition<'a>(&mut self, pool: &ItemPool<'a>, diagnostics: &mut Diagnostics) -> Vec<Cluster<'a>> {
        let items: Vec<&PartitionItem<'a>> = pool.items.iter().collect();
        let groups = seed_and_absorb(
            items,
            self.radius,
            |item| item.position,
            |seed, item| seed.material == item.material,
        );

        tracing::debug!(
            radius = self.radius,
            items = pool.items.len(),
            groups = groups.len(),
            "proximity partition"
        );

        groups
            .iter()
            .filter_map(|group| build_cluster(group, Algorithm::Proximity, pool.has_lod_groups, diagnostics))
            .collect()
    }
}
