//! # Meshfuse Cluster
//!
//! Groups renderable objects into same-material clusters ready for merging.
//!
//! ## Pipeline
//! - LOD reconciliation splits the input into partition pools
//! - A partitioner (Proximity, K-Means or Cell) builds initial clusters
//! - Budget subdivision splits clusters above the triangle limit
//!
//! Clusters borrow the caller's objects for the duration of a run.

pub mod cluster;
pub mod lod;
pub mod partition;
pub mod report;
pub mod subdivide;

pub use cluster::{Cluster, RADIUS_PADDING};
pub use lod::{LevelMembers, LodReconciler, ReconciledPools, fill_level_gaps};
pub use partition::{
    CellPartitioner, ItemPool, KMeansPartitioner, PartitionItem, PartitionStrategy, Partitioner,
    ProximityPartitioner,
};
pub use report::{ClusterRow, ClusterSummary, MaterialCount, material_census};
pub use subdivide::BudgetSubdivider;

use meshfuse_core::{
    Algorithm, ClusteringConfig, ConfigError, Diagnostics, LodGroupDescriptor, MaterialId, NoticeKind, ObjectId,
    RenderableObject,
};
use thiserror::Error;

/// Clustering errors
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("No objects to cluster")]
    EmptyPool,

    #[error("Object {object} uses {found} but the cluster uses {expected}")]
    MaterialMismatch {
        object: ObjectId,
        expected: MaterialId,
        found: MaterialId,
    },
}

/// Result type for clustering operations
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Output of one clustering run
#[derive(Debug, Clone, Default)]
pub struct ClusterSet<'a> {
    /// Clusters in production order
    pub clusters: Vec<Cluster<'a>>,
    /// Highest LOD level over the input, used for gap-filling
    pub max_lod_level: Option<u32>,
}

impl<'a> ClusterSet<'a> {
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cluster<'a>> {
        self.clusters.iter()
    }

    /// Summary table against a triangle limit
    pub fn summary(&self, triangle_limit: usize) -> ClusterSummary {
        ClusterSummary::new(&self.clusters, triangle_limit)
    }
}

/// Clustering engine holding one validated configuration
#[derive(Debug, Clone)]
pub struct ClusterEngine {
    config: ClusteringConfig,
}

impl ClusterEngine {
    /// Create an engine, rejecting invalid configuration up front
    pub fn new(config: ClusteringConfig) -> ClusterResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Cluster `objects`.
    ///
    /// Every object ends up in exactly one cluster unless it is rejected for
    /// a material mismatch, which is reported through `diagnostics`.
    pub fn run<'a>(
        &self,
        objects: &[&'a RenderableObject],
        lod_groups: &[LodGroupDescriptor],
        diagnostics: &mut Diagnostics,
    ) -> ClusterResult<ClusterSet<'a>> {
        if objects.is_empty() {
            return Err(ClusterError::EmptyPool);
        }

        let span = tracing::debug_span!(
            "cluster",
            algorithm = ?self.config.algorithm,
            objects = objects.len()
        );
        let _guard = span.enter();

        let reconciled = LodReconciler::new(lod_groups, self.config.lod_handling).reconcile(objects);
        let subdivider = BudgetSubdivider::from_config(&self.config);

        let mut clusters = Vec::new();
        for pool in &reconciled.pools {
            // Fresh strategy per pool so seeded K-Means runs are reproducible
            let mut strategy = PartitionStrategy::from_config(&self.config);
            let partitioned = strategy.partition(pool, diagnostics);
            log::debug!(
                "{:?} partition: {} objects -> {} clusters (lod: {})",
                strategy.algorithm(),
                pool.object_count(),
                partitioned.len(),
                pool.has_lod_groups
            );

            if strategy.algorithm() == Algorithm::Cell {
                clusters.extend(partitioned);
            } else {
                clusters.extend(subdivider.subdivide_all(partitioned, diagnostics));
            }
        }

        let subdivided = clusters.iter().filter(|c| c.is_subdivided()).count();
        diagnostics.info(
            NoticeKind::Summary,
            format!(
                "Clustered {} objects into {} clusters ({} from subdivision)",
                objects.len(),
                clusters.len(),
                subdivided
            ),
        );

        Ok(ClusterSet {
            clusters,
            max_lod_level: reconciled.max_lod_level,
        })
    }
}

/// Validate `config` and cluster `objects` in one call
pub fn cluster_objects<'a>(
    objects: &[&'a RenderableObject],
    lod_groups: &[LodGroupDescriptor],
    config: &ClusteringConfig,
    diagnostics: &mut Diagnostics,
) -> ClusterResult<ClusterSet<'a>> {
    ClusterEngine::new(config.clone())?.run(objects, lod_groups, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::test_utils::object;
    use glam::Vec3;
    use meshfuse_core::{LodHandling, LodLevel};

    fn assert_partition(objects: &[RenderableObject], set: &ClusterSet<'_>) {
        let mut ids: Vec<ObjectId> = set.iter().flat_map(|c| c.object_ids()).collect();
        ids.sort();
        let mut expected: Vec<ObjectId> = objects.iter().map(|o| o.id).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }

    fn field(count: u64) -> Vec<RenderableObject> {
        (0..count)
            .map(|i| {
                let position = Vec3::new((i % 10) as f32 * 1.5, 0.0, (i / 10) as f32 * 1.5);
                object(i, (i % 3) as u32, position, 200 + (i as usize % 7) * 50)
            })
            .collect()
    }

    #[test]
    fn test_twelve_objects_three_materials() {
        let objects: Vec<_> = (0..12)
            .map(|i| object(i, (i / 4) as u32, Vec3::new((i % 4) as f32, 0.0, 0.0), 100))
            .collect();
        let refs: Vec<_> = objects.iter().collect();
        let config = ClusteringConfig {
            triangle_limit: 100_000,
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let set = cluster_objects(&refs, &[], &config, &mut diagnostics).unwrap();
        assert_eq!(set.len(), 3);
        for cluster in set.iter() {
            assert_eq!(cluster.member_count(), 4);
            assert!(!cluster.is_subdivided());
        }
        assert_eq!(diagnostics.of_kind(NoticeKind::Summary).count(), 1);
    }

    #[test]
    fn test_every_algorithm_partitions() {
        let objects = field(60);
        let refs: Vec<_> = objects.iter().collect();

        for algorithm in [Algorithm::Proximity, Algorithm::KMeans, Algorithm::Cell] {
            let config = ClusteringConfig {
                algorithm,
                triangle_limit: 1500,
                k_clusters: 4,
                cell_size: Vec3::splat(6.0),
                seed: Some(11),
                ..Default::default()
            };
            let set = cluster_objects(&refs, &[], &config, &mut Diagnostics::new()).unwrap();
            assert_partition(&objects, &set);
            for cluster in set.iter() {
                assert!(cluster.members().all(|(_, o)| o.material == cluster.material()));
                if algorithm != Algorithm::Cell {
                    assert!(cluster.triangle_count() <= 1500 || cluster.is_over_budget());
                }
            }
        }
    }

    #[test]
    fn test_lod_handling_partitions() {
        let objects = field(30);
        let refs: Vec<_> = objects.iter().collect();
        let groups = vec![
            LodGroupDescriptor::new("A", vec![vec![ObjectId(0), ObjectId(3)], vec![ObjectId(6)]]),
            LodGroupDescriptor::new("B", vec![vec![ObjectId(1)], vec![], vec![ObjectId(4)]]),
        ];

        for lod_handling in [LodHandling::Separate, LodHandling::Unify, LodHandling::PreserveOriginal] {
            let config = ClusteringConfig {
                lod_handling,
                ..Default::default()
            };
            let set = cluster_objects(&refs, &groups, &config, &mut Diagnostics::new()).unwrap();
            assert_partition(&objects, &set);
            assert_eq!(set.max_lod_level, Some(2));
        }
    }

    #[test]
    fn test_separate_keeps_lod_and_plain_apart() {
        let objects = [
            object(1, 0, Vec3::ZERO, 10).with_lod(LodLevel::Level(0)),
            object(2, 0, Vec3::X, 10),
        ];
        let refs: Vec<_> = objects.iter().collect();

        let set = cluster_objects(&refs, &[], &ClusteringConfig::default(), &mut Diagnostics::new()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.clusters[0].has_lod_groups());
        assert!(!set.clusters[1].has_lod_groups());
    }

    #[test]
    fn test_empty_pool_rejected() {
        let result = cluster_objects(&[], &[], &ClusteringConfig::default(), &mut Diagnostics::new());
        assert!(matches!(result, Err(ClusterError::EmptyPool)));
    }

    #[test]
    fn test_invalid_config_rejected_before_partitioning() {
        let objects = [object(1, 0, Vec3::ZERO, 10)];
        let refs: Vec<_> = objects.iter().collect();
        let config = ClusteringConfig {
            algorithm: Algorithm::KMeans,
            k_clusters: 0,
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();

        let result = cluster_objects(&refs, &[], &config, &mut diagnostics);
        assert!(matches!(result, Err(ClusterError::Config(ConfigError::ZeroClusters))));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cell_scenario() {
        let objects = [
            object(1, 0, Vec3::new(1.0, 1.0, 1.0), 10),
            object(2, 0, Vec3::new(9.0, 9.0, 9.0), 10),
            object(3, 0, Vec3::new(11.0, 1.0, 1.0), 10),
        ];
        let refs: Vec<_> = objects.iter().collect();
        let config = ClusteringConfig {
            algorithm: Algorithm::Cell,
            cell_size: Vec3::splat(10.0),
            triangle_limit: 1,
            ..Default::default()
        };

        let set = cluster_objects(&refs, &[], &config, &mut Diagnostics::new()).unwrap();
        let sizes: Vec<_> = set.iter().map(|c| c.member_count()).collect();
        assert_eq!(sizes, vec![2, 1]);
        // Over budget, but cell clusters are never subdivided
        assert!(set.iter().all(|c| !c.is_subdivided() && !c.is_over_budget()));
    }
}
