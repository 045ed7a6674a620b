//! Partitioners
//!
//! Three interchangeable strategies that turn a pool of items into initial
//! same-material clusters:
//! - **Proximity**: greedy seed-and-absorb within a radius
//! - **K-Means**: per-material iterative centroid assignment
//! - **Cell**: fixed-size 3D grid bucketing keyed by material and LOD level

mod cell;
mod kmeans;
mod proximity;

pub use cell::CellPartitioner;
pub use kmeans::KMeansPartitioner;
pub use proximity::ProximityPartitioner;

pub(crate) use proximity::seed_and_absorb;

use glam::Vec3;
use meshfuse_core::{Algorithm, ClusteringConfig, Diagnostics, LodLevel, MaterialId, NoticeKind, RenderableObject};
use smallvec::{SmallVec, smallvec};

use crate::cluster::Cluster;

/// One unit the partitioners place: a single object, or an atomic set of
/// objects (a LOD group's members sharing one material) moved together
#[derive(Debug, Clone)]
pub struct PartitionItem<'a> {
    /// Position used for distance and cell tests
    pub position: Vec3,
    /// Material shared by every member
    pub material: MaterialId,
    /// Members with their LOD level
    pub members: SmallVec<[(LodLevel, &'a RenderableObject); 1]>,
}

impl<'a> PartitionItem<'a> {
    /// Item for a single object at its own position
    pub fn single(object: &'a RenderableObject, level: LodLevel) -> Self {
        Self {
            position: object.position(),
            material: object.material,
            members: smallvec![(level, object)],
        }
    }

    /// Lowest LOD level among the members; the level used for cell keys
    pub fn lod_key(&self) -> LodLevel {
        self.members
            .iter()
            .map(|(level, _)| *level)
            .min()
            .unwrap_or(LodLevel::Unassigned)
    }

    /// Sum of member triangle counts
    pub fn triangle_count(&self) -> usize {
        self.members.iter().map(|(_, o)| o.triangle_count()).sum()
    }
}

/// Items clustered together in one pass
#[derive(Debug, Clone, Default)]
pub struct ItemPool<'a> {
    pub items: Vec<PartitionItem<'a>>,
    /// Copied onto every cluster built from this pool
    pub has_lod_groups: bool,
}

impl<'a> ItemPool<'a> {
    pub fn new(items: Vec<PartitionItem<'a>>, has_lod_groups: bool) -> Self {
        Self {
            items,
            has_lod_groups,
        }
    }

    /// Number of objects across all items
    pub fn object_count(&self) -> usize {
        self.items.iter().map(|i| i.members.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Uniform partitioning capability
pub trait Partitioner {
    /// Strategy recorded as the origin of produced clusters
    fn algorithm(&self) -> Algorithm;

    /// Partition a pool into clusters. Every object in the pool ends up in
    /// exactly one cluster unless rejected for a material mismatch.
    fn partition<'a>(&mut self, pool: &ItemPool<'a>, diagnostics: &mut Diagnostics) -> Vec<Cluster<'a>>;
}

/// Closed set of strategies selected by configuration
#[derive(Debug)]
pub enum PartitionStrategy {
    Proximity(ProximityPartitioner),
    KMeans(KMeansPartitioner),
    Cell(CellPartitioner),
}

impl PartitionStrategy {
    /// Build the strategy named by `config.algorithm`
    pub fn from_config(config: &ClusteringConfig) -> Self {
        match config.algorithm {
            Algorithm::Proximity => Self::Proximity(ProximityPartitioner::new(config.grouping_radius)),
            Algorithm::KMeans => Self::KMeans(KMeansPartitioner::new(
                config.k_clusters,
                config.kmeans_iterations,
                config.seed,
            )),
            Algorithm::Cell => Self::Cell(CellPartitioner::new(config.cell_size)),
        }
    }
}

impl Partitioner for PartitionStrategy {
    fn algorithm(&self) -> Algorithm {
        match self {
            Self::Proximity(p) => p.algorithm(),
            Self::KMeans(p) => p.algorithm(),
            Self::Cell(p) => p.algorithm(),
        }
    }

    fn partition<'a>(&mut self, pool: &ItemPool<'a>, diagnostics: &mut Diagnostics) -> Vec<Cluster<'a>> {
        match self {
            Self::Proximity(p) => p.partition(pool, diagnostics),
            Self::KMeans(p) => p.partition(pool, diagnostics),
            Self::Cell(p) => p.partition(pool, diagnostics),
        }
    }
}

/// Materialize one cluster from a group of items, reporting rejected members
pub(crate) fn build_cluster<'a>(
    items: &[&PartitionItem<'a>],
    algorithm: Algorithm,
    has_lod_groups: bool,
    diagnostics: &mut Diagnostics,
) -> Option<Cluster<'a>> {
    let (cluster, rejected) = Cluster::from_items(items.iter().copied(), algorithm, has_lod_groups);
    for err in rejected {
        diagnostics.warn(NoticeKind::MaterialMismatch, err.to_string());
    }
    cluster
}


#[cfg(test)]
mod tests {
    use super::test_utils::object;
    use super::*;

    #[test]
    fn test_item_lod_key() {
        let a = object(1, 0, Vec3::ZERO, 4);
        let b = object(2, 0, Vec3::ZERO, 2);
        let item = PartitionItem {
            position: Vec3::ZERO,
            material: MaterialId(0),
            members: smallvec![(LodLevel::Level(1), &b), (LodLevel::Level(0), &a)],
        };
        assert_eq!(item.lod_key(), LodLevel::Level(0));
        assert_eq!(item.triangle_count(), 6);
        assert_eq!(PartitionItem::single(&a, LodLevel::Unassigned).lod_key(), LodLevel::Unassigned);
    }

    #[test]
    fn test_strategy_from_config() {
        let mut config = ClusteringConfig::default();
        assert_eq!(PartitionStrategy::from_config(&config).algorithm(), Algorithm::Proximity);
        config.algorithm = Algorithm::KMeans;
        assert_eq!(PartitionStrategy::from_config(&config).algorithm(), Algorithm::KMeans);
        config.algorithm = Algorithm::Cell;
        assert_eq!(PartitionStrategy::from_config(&config).algorithm(), Algorithm::Cell);
    }
}
