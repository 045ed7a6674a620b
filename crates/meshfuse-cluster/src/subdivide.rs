//! Budget subdivision
//!
//! Splits clusters whose triangle count exceeds the configured limit by
//! re-running seed-and-absorb on their items with the smaller subgroup
//! radius. Children are processed again until they fit the budget or the
//! recursion cap is reached.

use meshfuse_core::{Algorithm, ClusteringConfig, Diagnostics, NoticeKind};

use crate::cluster::Cluster;
use crate::partition::{PartitionItem, seed_and_absorb};

/// Triangle-budget enforcement for clusters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetSubdivider {
    /// Maximum triangles per cluster
    pub triangle_limit: usize,
    /// Seed-and-absorb radius for splits
    pub subgroup_radius: f32,
    /// Depth at which splitting stops
    pub max_depth: u32,
}

impl BudgetSubdivider {
    pub fn new(triangle_limit: usize, subgroup_radius: f32, max_depth: u32) -> Self {
        Self {
            triangle_limit,
            subgroup_radius,
            max_depth,
        }
    }

    pub fn from_config(config: &ClusteringConfig) -> Self {
        Self::new(config.triangle_limit, config.subgroup_radius, config.max_recursion_depth)
    }

    /// Whether a cluster fits the triangle budget
    pub fn within_budget(&self, cluster: &Cluster<'_>) -> bool {
        cluster.triangle_count() <= self.triangle_limit
    }

    /// Split one cluster into leaves that fit the budget.
    ///
    /// Leaves come out in depth-first order. A leaf still over budget at the
    /// recursion cap is marked with [`Cluster::is_over_budget`] and reported.
    /// Cell clusters are returned untouched.
    pub fn subdivide<'a>(&self, cluster: Cluster<'a>, diagnostics: &mut Diagnostics) -> Vec<Cluster<'a>> {
        if cluster.origin() == Algorithm::Cell {
            return vec![cluster];
        }

        let mut leaves = Vec::new();
        let mut stack = vec![cluster];

        while let Some(mut cluster) = stack.pop() {
            if self.within_budget(&cluster) {
                leaves.push(cluster);
                continue;
            }

            if cluster.depth() >= self.max_depth {
                cluster.mark_over_budget();
                diagnostics.warn(
                    NoticeKind::DepthExhausted,
                    format!(
                        "Cluster of {} {} objects still has {} triangles (limit {}) at subdivision depth {}",
                        cluster.member_count(),
                        cluster.material(),
                        cluster.triangle_count(),
                        self.triangle_limit,
                        cluster.depth()
                    ),
                );
                leaves.push(cluster);
                continue;
            }

            let children = self.split(&cluster);
            tracing::debug!(
                depth = cluster.depth(),
                triangles = cluster.triangle_count(),
                children = children.len(),
                "split over-budget cluster"
            );
            stack.extend(children.into_iter().rev());
        }

        leaves
    }

    /// Subdivide every cluster, keeping input order
    pub fn subdivide_all<'a>(&self, clusters: Vec<Cluster<'a>>, diagnostics: &mut Diagnostics) -> Vec<Cluster<'a>> {
        clusters
            .into_iter()
            .flat_map(|cluster| self.subdivide(cluster, diagnostics))
            .collect()
    }

    /// Re-group the cluster's items with the subgroup radius. Items are
    /// pooled by LOD level (sentinel first) then insertion order; atomic LOD
    /// group items move as a whole.
    fn split<'a>(&self, cluster: &Cluster<'a>) -> Vec<Cluster<'a>> {
        let mut pooled: Vec<&PartitionItem<'a>> = cluster.items().iter().collect();
        pooled.sort_by_key(|item| item.lod_key());
        seed_and_absorb(pooled, self.subgroup_radius, |item| item.position, |_, _| true)
            .iter()
            .filter_map(|group| Cluster::subdivision_of(cluster, group))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::test_utils::object;
    use crate::partition::{ItemPool, Partitioner, ProximityPartitioner};
    use glam::Vec3;
    use meshfuse_core::{LodLevel, MaterialId, ObjectId, RenderableObject};
    use smallvec::smallvec;

    fn single(object: &RenderableObject, origin: Algorithm) -> Cluster<'_> {
        Cluster::new(object, LodLevel::Unassigned, origin, false)
    }

    #[test]
    fn test_within_budget_untouched() {
        let a = object(1, 0, Vec3::ZERO, 50);
        let subdivider = BudgetSubdivider::new(100, 2.0, 10);
        let mut diagnostics = Diagnostics::new();

        let out = subdivider.subdivide(single(&a, Algorithm::Proximity), &mut diagnostics);
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_subdivided());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nine_objects_split() {
        let mut objects: Vec<_> = (0..4)
            .map(|i| object(i, 0, Vec3::new(i as f32, 0.0, 0.0), 100))
            .collect();
        objects.extend((0..5).map(|i| object(10 + i, 0, Vec3::new(20.0 + i as f32 * 1.2, 0.0, 0.0), 300)));

        let pool = ItemPool::new(
            objects
                .iter()
                .map(|o| PartitionItem::single(o, LodLevel::Unassigned))
                .collect(),
            false,
        );
        let mut diagnostics = Diagnostics::new();
        let clusters = ProximityPartitioner::new(5.0).partition(&pool, &mut diagnostics);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].member_count(), 4);
        assert_eq!(clusters[1].triangle_count(), 1500);

        let subdivider = BudgetSubdivider::new(1000, 1.0, 10);
        let leaves = subdivider.subdivide_all(clusters, &mut diagnostics);

        assert_eq!(leaves[0].member_count(), 4);
        assert!(!leaves[0].is_subdivided());
        let rest: usize = leaves[1..].iter().map(|c| c.member_count()).sum();
        assert_eq!(rest, 5);
        for leaf in &leaves {
            assert!(leaf.triangle_count() <= 1000 || leaf.depth() == 10);
        }
        assert_eq!(leaves.len(), 6);
        assert!(leaves[1..].iter().all(|c| c.is_subdivided() && c.depth() == 1));
        assert_eq!(diagnostics.warning_count(), 0);
    }

    #[test]
    fn test_depth_order_matches_recursion() {
        // Two far groups of two; each pair splits again at a smaller radius
        let objects = [
            object(1, 0, Vec3::new(0.0, 0.0, 0.0), 60),
            object(2, 0, Vec3::new(1.5, 0.0, 0.0), 60),
            object(3, 0, Vec3::new(50.0, 0.0, 0.0), 60),
            object(4, 0, Vec3::new(51.5, 0.0, 0.0), 60),
        ];
        let mut cluster = single(&objects[0], Algorithm::Proximity);
        for o in &objects[1..] {
            cluster.insert(o, LodLevel::Unassigned).unwrap();
        }

        let subdivider = BudgetSubdivider::new(100, 2.0, 10);
        let leaves = subdivider.subdivide(cluster, &mut Diagnostics::new());
        let order: Vec<_> = leaves.iter().flat_map(|c| c.object_ids()).collect();
        assert_eq!(
            order,
            vec![
                ObjectId(1),
                ObjectId(2),
                ObjectId(3),
                ObjectId(4)
            ]
        );
        // Pairs of 120 triangles exceed 100 and stay together within radius 2
        // until the cap, so every leaf ends over budget
        assert!(leaves.iter().all(|c| c.is_over_budget() && c.depth() == 10));
        assert_eq!(leaves.len(), 2);
    }

    #[test]
    fn test_lod_group_items_split_whole() {
        // A LOD group whose levels sit apart, placed at its bounding center
        let near = object(1, 0, Vec3::ZERO, 300);
        let lod0 = object(2, 0, Vec3::ZERO, 300);
        let lod1 = object(3, 0, Vec3::new(30.0, 0.0, 0.0), 300);
        let far = object(4, 0, Vec3::new(60.0, 0.0, 0.0), 300);
        let group = PartitionItem {
            position: Vec3::new(15.0, 0.0, 0.0),
            material: MaterialId(0),
            members: smallvec![(LodLevel::Level(0), &lod0), (LodLevel::Level(1), &lod1)],
        };
        let items = [
            PartitionItem::single(&near, LodLevel::Unassigned),
            group,
            PartitionItem::single(&far, LodLevel::Unassigned),
        ];
        let (cluster, rejected) = Cluster::from_items(&items, Algorithm::Proximity, true);
        assert!(rejected.is_empty());

        let subdivider = BudgetSubdivider::new(700, 2.0, 10);
        let leaves = subdivider.subdivide(cluster.unwrap(), &mut Diagnostics::new());
        assert_eq!(leaves.len(), 3);

        let chain = leaves.iter().find(|c| c.contains(ObjectId(2))).unwrap();
        assert!(chain.contains(ObjectId(3)));
        assert_eq!(chain.member_count(), 2);
        assert_eq!(chain.max_level(), Some(1));
        assert!(leaves.iter().all(|c| c.triangle_count() <= 700 && c.depth() == 1));
    }

    #[test]
    fn test_depth_cap_warns() {
        let heavy = object(1, 0, Vec3::ZERO, 500);
        let subdivider = BudgetSubdivider::new(100, 2.0, 3);
        let mut diagnostics = Diagnostics::new();

        let out = subdivider.subdivide(single(&heavy, Algorithm::KMeans), &mut diagnostics);
        assert_eq!(out.len(), 1);
        assert!(out[0].is_over_budget());
        assert_eq!(out[0].depth(), 3);
        assert_eq!(diagnostics.of_kind(NoticeKind::DepthExhausted).count(), 1);
    }

    #[test]
    fn test_cell_clusters_pass_through() {
        let heavy = object(1, 0, Vec3::ZERO, 500);
        let subdivider = BudgetSubdivider::new(100, 2.0, 10);
        let mut diagnostics = Diagnostics::new();

        let out = subdivider.subdivide(single(&heavy, Algorithm::Cell), &mut diagnostics);
        assert!(!out[0].is_over_budget());
        assert_eq!(out[0].depth(), 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = ClusteringConfig::default();
        let subdivider = BudgetSubdivider::from_config(&config);
        assert_eq!(subdivider.triangle_limit, 10_000);
        assert_eq!(subdivider.max_depth, 10);
    }
}
