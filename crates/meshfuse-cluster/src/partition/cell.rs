//! Cell partitioner
//!
//! Buckets items into a fixed-size 3D grid. Items sharing a cell, material
//! and LOD level end up in the same cluster. Buckets are emitted in the order
//! their first item appears, so output is deterministic for a given input.

use glam::{IVec3, Vec3};
use indexmap::IndexMap;
use meshfuse_core::math::cell_coord;
use meshfuse_core::{Algorithm, Diagnostics, LodLevel, MaterialId};

use super::{ItemPool, PartitionItem, Partitioner, build_cluster};
use crate::cluster::Cluster;

type CellKey = (MaterialId, LodLevel, IVec3);

/// Fixed-grid partitioner
#[derive(Debug, Clone)]
pub struct CellPartitioner {
    cell_size: Vec3,
}

impl CellPartitioner {
    /// Create a partitioner with the given cell dimensions
    pub fn new(cell_size: Vec3) -> Self {
        Self { cell_size }
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    /// Grid key of one item
    pub fn key_of(&self, item: &PartitionItem<'_>) -> (MaterialId, LodLevel, IVec3) {
        (item.material, item.lod_key(), cell_coord(item.position, self.cell_size))
    }
}

impl Partitioner for CellPartitioner {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Cell
    }

    fn partition<'a>(&mut self, pool: &ItemPool<'a>, diagnostics: &mut Diagnostics) -> Vec<Cluster<'a>> {
        let mut buckets: IndexMap<CellKey, Vec<&PartitionItem<'a>>> = IndexMap::new();
        for item in &pool.items {
            buckets.entry(self.key_of(item)).or_default().push(item);
        }

        tracing::debug!(
            cell_size = ?self.cell_size,
            items = pool.items.len(),
            cells = buckets.len(),
            "cell partition"
        );

        buckets
            .values()
            .filter_map(|bucket| build_cluster(bucket, Algorithm::Cell, pool.has_lod_groups, diagnostics))
            .collect()
    }
}
