//! Cluster model
//!
//! A cluster is a group of same-material objects scheduled to be merged into
//! one mesh per LOD level. Members are borrowed from the caller's object pool
//! for the duration of a run.

use std::collections::BTreeMap;

use glam::Vec3;
use meshfuse_core::{Algorithm, BoundingSphere, LodLevel, MaterialId, ObjectId, RenderableObject};

use crate::partition::PartitionItem;
use crate::{ClusterError, ClusterResult};

/// Padding added to the enclosing radius so single-member clusters stay visible
pub const RADIUS_PADDING: f32 = 0.5;

/// Same-material group of objects, keyed by LOD level
#[derive(Debug, Clone)]
pub struct Cluster<'a> {
    members: BTreeMap<LodLevel, Vec<&'a RenderableObject>>,
    /// Placement units in insertion order; budget splits never break one up
    items: Vec<PartitionItem<'a>>,
    material: MaterialId,
    origin: Algorithm,
    has_lod_groups: bool,
    is_subdivided: bool,
    depth: u32,
    over_budget: bool,
    position_sum: Vec3,
    member_count: usize,
    center: Vec3,
    triangle_count: usize,
}

impl<'a> Cluster<'a> {
    /// Create a cluster from its seed member. The seed fixes the material.
    pub fn new(
        seed: &'a RenderableObject,
        level: LodLevel,
        origin: Algorithm,
        has_lod_groups: bool,
    ) -> Self {
        let mut cluster = Self::empty(seed.material, origin, has_lod_groups);
        cluster.push_item(PartitionItem::single(seed, level));
        cluster
    }

    fn empty(material: MaterialId, origin: Algorithm, has_lod_groups: bool) -> Self {
        Self {
            members: BTreeMap::new(),
            items: Vec::new(),
            material,
            origin,
            has_lod_groups,
            is_subdivided: false,
            depth: 0,
            over_budget: false,
            position_sum: Vec3::ZERO,
            member_count: 0,
            center: Vec3::ZERO,
            triangle_count: 0,
        }
    }

    /// Build a cluster from partition items, seeded by the first member of
    /// the first item. Returns `None` when the items hold no members.
    ///
    /// Members with a foreign material are dropped and returned as errors.
    pub fn from_items<'i>(
        items: impl IntoIterator<Item = &'i PartitionItem<'a>>,
        origin: Algorithm,
        has_lod_groups: bool,
    ) -> (Option<Self>, Vec<ClusterError>)
    where
        'a: 'i,
    {
        let mut cluster: Option<Self> = None;
        let mut rejected = Vec::new();

        for item in items {
            let material = match (&cluster, item.members.first()) {
                (Some(c), _) => c.material,
                (None, Some((_, seed))) => seed.material,
                (None, None) => continue,
            };

            let mut kept = item.clone();
            kept.members.retain(|(_, object)| {
                if object.material == material {
                    return true;
                }
                rejected.push(ClusterError::MaterialMismatch {
                    object: object.id,
                    expected: material,
                    found: object.material,
                });
                false
            });
            if kept.members.is_empty() {
                continue;
            }

            cluster
                .get_or_insert_with(|| Self::empty(material, origin, has_lod_groups))
                .push_item(kept);
        }

        (cluster, rejected)
    }

    /// Create a sub-cluster of `parent` one level deeper from some of its items
    pub(crate) fn subdivision_of(parent: &Cluster<'a>, items: &[&PartitionItem<'a>]) -> Option<Self> {
        let mut cluster = Self::empty(parent.material, parent.origin, parent.has_lod_groups);
        cluster.is_subdivided = true;
        cluster.depth = parent.depth + 1;
        for &item in items {
            // Items already share the parent's material
            cluster.push_item(item.clone());
        }
        (cluster.member_count > 0).then_some(cluster)
    }

    /// Add a member at the given LOD level.
    ///
    /// Objects whose material differs from the cluster's are rejected and
    /// leave the cluster unchanged.
    pub fn insert(&mut self, object: &'a RenderableObject, level: LodLevel) -> ClusterResult<()> {
        if object.material != self.material {
            return Err(ClusterError::MaterialMismatch {
                object: object.id,
                expected: self.material,
                found: object.material,
            });
        }
        self.push_item(PartitionItem::single(object, level));
        Ok(())
    }

    fn push_item(&mut self, item: PartitionItem<'a>) {
        for &(level, object) in &item.members {
            self.members.entry(level).or_default().push(object);
            self.member_count += 1;
            self.position_sum += object.position();
            self.triangle_count += object.triangle_count();
        }
        if self.member_count > 0 {
            self.center = self.position_sum / self.member_count as f32;
        }
        self.items.push(item);
    }

    pub(crate) fn mark_over_budget(&mut self) {
        self.over_budget = true;
    }

    /// Shared material of every member
    pub fn material(&self) -> MaterialId {
        self.material
    }

    /// Strategy that produced this cluster
    pub fn origin(&self) -> Algorithm {
        self.origin
    }

    /// Mean of the member positions
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Sum of member triangle counts
    pub fn triangle_count(&self) -> usize {
        self.triangle_count
    }

    /// Number of members across all levels
    pub fn member_count(&self) -> usize {
        self.member_count
    }

    pub fn has_lod_groups(&self) -> bool {
        self.has_lod_groups
    }

    /// Whether this cluster was produced by budget subdivision
    pub fn is_subdivided(&self) -> bool {
        self.is_subdivided
    }

    /// Subdivision depth, 0 for clusters straight from a partitioner
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Set when subdivision gave up at the recursion cap
    pub fn is_over_budget(&self) -> bool {
        self.over_budget
    }

    /// Placement units in insertion order
    pub fn items(&self) -> &[PartitionItem<'a>] {
        &self.items
    }

    /// Members at one LOD level
    pub fn members_at(&self, level: LodLevel) -> &[&'a RenderableObject] {
        self.members.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Populated LOD levels in ascending order, sentinel first
    pub fn levels(&self) -> impl Iterator<Item = LodLevel> + '_ {
        self.members.keys().copied()
    }

    /// Highest real LOD level present
    pub fn max_level(&self) -> Option<u32> {
        self.members.keys().rev().find_map(|level| level.index())
    }

    /// All members with their level, in level order then insertion order
    pub fn members(&self) -> impl Iterator<Item = (LodLevel, &'a RenderableObject)> + '_ {
        self.members
            .iter()
            .flat_map(|(level, objects)| objects.iter().map(move |o| (*level, *o)))
    }

    /// Source identities of all members
    pub fn object_ids(&self) -> Vec<ObjectId> {
        self.members().map(|(_, o)| o.id).collect()
    }

    /// Check if an object is a member at any level
    pub fn contains(&self, id: ObjectId) -> bool {
        self.members().any(|(_, o)| o.id == id)
    }

    /// Largest member distance from the center plus [`RADIUS_PADDING`]
    pub fn enclosing_radius(&self) -> f32 {
        let furthest = self
            .members()
            .map(|(_, o)| o.position().distance(self.center))
            .fold(0.0f32, f32::max);
        furthest + RADIUS_PADDING
    }

    /// Sphere around the center with the enclosing radius
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center, self.enclosing_radius())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partition::test_utils::object;

    #[test]
    fn test_center_tracks_inserts() {
        let a = object(1, 0, Vec3::new(0.0, 0.0, 0.0), 10);
        let b = object(2, 0, Vec3::new(4.0, 0.0, 0.0), 20);
        let c = object(3, 0, Vec3::new(2.0, 6.0, 0.0), 30);

        let mut cluster = Cluster::new(&a, LodLevel::Unassigned, Algorithm::Proximity, false);
        assert_eq!(cluster.center(), Vec3::ZERO);

        cluster.insert(&b, LodLevel::Unassigned).unwrap();
        assert_eq!(cluster.center(), Vec3::new(2.0, 0.0, 0.0));

        cluster.insert(&c, LodLevel::Unassigned).unwrap();
        assert_eq!(cluster.center(), Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(cluster.triangle_count(), 60);
        assert_eq!(cluster.member_count(), 3);
    }

    #[test]
    fn test_material_mismatch_rejected() {
        let a = object(1, 0, Vec3::ZERO, 1);
        let b = object(2, 1, Vec3::new(10.0, 0.0, 0.0), 1);

        let mut cluster = Cluster::new(&a, LodLevel::Unassigned, Algorithm::Proximity, false);
        let err = cluster.insert(&b, LodLevel::Unassigned).unwrap_err();
        assert!(matches!(
            err,
            ClusterError::MaterialMismatch { object: ObjectId(2), expected: MaterialId(0), found: MaterialId(1) }
        ));
        assert_eq!(cluster.member_count(), 1);
        assert_eq!(cluster.center(), Vec3::ZERO);
        assert!(!cluster.contains(ObjectId(2)));
    }

    #[test]
    fn test_levels_and_members() {
        let a = object(1, 0, Vec3::ZERO, 100);
        let b = object(2, 0, Vec3::ZERO, 50);
        let c = object(3, 0, Vec3::ZERO, 5);

        let mut cluster = Cluster::new(&b, LodLevel::Level(1), Algorithm::Cell, true);
        cluster.insert(&a, LodLevel::Level(0)).unwrap();
        cluster.insert(&c, LodLevel::Unassigned).unwrap();

        let levels: Vec<_> = cluster.levels().collect();
        assert_eq!(levels, vec![LodLevel::Unassigned, LodLevel::Level(0), LodLevel::Level(1)]);
        assert_eq!(cluster.max_level(), Some(1));
        assert_eq!(cluster.members_at(LodLevel::Level(0)).len(), 1);
        assert!(cluster.members_at(LodLevel::Level(4)).is_empty());
        assert_eq!(cluster.object_ids(), vec![ObjectId(3), ObjectId(1), ObjectId(2)]);
        assert!(cluster.has_lod_groups());
    }

    #[test]
    fn test_enclosing_radius() {
        let a = object(1, 0, Vec3::new(-3.0, 0.0, 0.0), 1);
        let b = object(2, 0, Vec3::new(3.0, 0.0, 0.0), 1);

        let mut cluster = Cluster::new(&a, LodLevel::Unassigned, Algorithm::Proximity, false);
        assert_eq!(cluster.enclosing_radius(), RADIUS_PADDING);

        cluster.insert(&b, LodLevel::Unassigned).unwrap();
        assert!((cluster.enclosing_radius() - (3.0 + RADIUS_PADDING)).abs() < 1e-6);
        assert!(cluster.bounding_sphere().contains_point(Vec3::new(3.2, 0.0, 0.0)));
    }

    #[test]
    fn test_from_items_reports_rejects() {
        let a = object(1, 0, Vec3::ZERO, 1);
        let b = object(2, 1, Vec3::ZERO, 1);
        let items = vec![
            PartitionItem::single(&a, LodLevel::Unassigned),
            PartitionItem::single(&b, LodLevel::Unassigned),
        ];

        let (cluster, rejected) = Cluster::from_items(&items, Algorithm::Proximity, false);
        assert_eq!(cluster.unwrap().member_count(), 1);
        assert_eq!(rejected.len(), 1);

        let (empty, _) = Cluster::from_items(std::iter::empty(), Algorithm::Proximity, false);
        assert!(empty.is_none());
    }

    #[test]
    fn test_subdivision_of() {
        let a = object(1, 0, Vec3::ZERO, 1);
        let b = object(2, 0, Vec3::X, 1);
        let parent = Cluster::new(&a, LodLevel::Level(0), Algorithm::KMeans, true);

        let first = PartitionItem::single(&a, LodLevel::Level(0));
        let second = PartitionItem::single(&b, LodLevel::Level(1));
        let child = Cluster::subdivision_of(&parent, &[&first, &second]).unwrap();
        assert!(child.is_subdivided());
        assert_eq!(child.depth(), 1);
        assert_eq!(child.origin(), Algorithm::KMeans);
        assert!(child.has_lod_groups());
        assert_eq!(child.member_count(), 2);
        assert_eq!(child.items().len(), 2);
        assert!(Cluster::subdivision_of(&parent, &[]).is_none());
    }

    #[test]
    fn test_items_keep_groups() {
        let a = object(1, 0, Vec3::ZERO, 1);
        let b = object(2, 0, Vec3::new(8.0, 0.0, 0.0), 1);
        let c = object(3, 0, Vec3::X, 1);
        let group = PartitionItem {
            position: Vec3::new(4.0, 0.0, 0.0),
            material: MaterialId(0),
            members: smallvec::smallvec![(LodLevel::Level(0), &a), (LodLevel::Level(1), &b)],
        };

        let (cluster, _) = Cluster::from_items([&group], Algorithm::Proximity, true);
        let mut cluster = cluster.unwrap();
        cluster.insert(&c, LodLevel::Unassigned).unwrap();

        assert_eq!(cluster.items().len(), 2);
        assert_eq!(cluster.items()[0].members.len(), 2);
        assert_eq!(cluster.member_count(), 3);
        assert_eq!(cluster.center(), Vec3::new(3.0, 0.0, 0.0));
    }
}
