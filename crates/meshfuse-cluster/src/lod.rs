//! LOD reconciliation
//!
//! Decides which objects carry LOD structure and how they are fed to the
//! partitioners under each [`LodHandling`] policy. Also provides the
//! gap-filling view the aggregator uses to build one mesh per level.

use ahash::AHashMap;
use indexmap::IndexMap;
use meshfuse_core::math::Aabb;
use meshfuse_core::{LodGroupDescriptor, LodHandling, LodLevel, MaterialId, ObjectId, RenderableObject};
use smallvec::SmallVec;

use crate::cluster::Cluster;
use crate::partition::{ItemPool, PartitionItem};

/// Pools ready for partitioning, plus the highest LOD level seen
#[derive(Debug, Clone, Default)]
pub struct ReconciledPools<'a> {
    /// Non-empty pools, LOD-bearing pool first
    pub pools: Vec<ItemPool<'a>>,
    /// Highest level over descriptors and intrinsic levels
    pub max_lod_level: Option<u32>,
}

/// Applies a [`LodHandling`] policy to a set of objects
#[derive(Debug, Clone, Copy)]
pub struct LodReconciler<'g> {
    groups: &'g [LodGroupDescriptor],
    handling: LodHandling,
}

impl<'g> LodReconciler<'g> {
    pub fn new(groups: &'g [LodGroupDescriptor], handling: LodHandling) -> Self {
        Self { groups, handling }
    }

    /// Descriptor membership: object -> (group index, level).
    ///
    /// The first descriptor and level listing an object wins.
    fn memberships(&self) -> AHashMap<ObjectId, (usize, u32)> {
        let mut memberships: AHashMap<ObjectId, (usize, u32)> = AHashMap::new();
        for (index, group) in self.groups.iter().enumerate() {
            for (level, id) in group.entries() {
                if let Some(&(first, first_level)) = memberships.get(&id) {
                    log::debug!(
                        "Object {} listed again in LOD group `{}` level {}; keeping `{}` level {}",
                        id,
                        group.name,
                        level,
                        self.groups[first].name,
                        first_level
                    );
                    continue;
                }
                memberships.insert(id, (index, level));
            }
        }
        memberships
    }

    /// Highest level over every descriptor and the objects' intrinsic levels
    pub fn max_lod_level(&self, objects: &[&RenderableObject]) -> Option<u32> {
        let described = self.groups.iter().filter_map(LodGroupDescriptor::max_level);
        let intrinsic = objects.iter().filter_map(|o| o.lod.index());
        described.chain(intrinsic).max()
    }

    /// Split objects into partition pools according to the policy
    pub fn reconcile<'a>(&self, objects: &[&'a RenderableObject]) -> ReconciledPools<'a> {
        let memberships = self.memberships();
        let level_of = |object: &RenderableObject| match memberships.get(&object.id) {
            Some(&(_, level)) => LodLevel::Level(level),
            None => object.lod,
        };

        let pools = match self.handling {
            LodHandling::Unify => {
                let items = objects
                    .iter()
                    .map(|&o| PartitionItem::single(o, level_of(o)))
                    .collect();
                vec![ItemPool::new(items, true)]
            }
            LodHandling::Separate => {
                let (lod, plain): (Vec<_>, Vec<_>) = objects
                    .iter()
                    .map(|&o| PartitionItem::single(o, level_of(o)))
                    .partition(|item| item.lod_key().is_assigned());
                vec![ItemPool::new(lod, true), ItemPool::new(plain, false)]
            }
            LodHandling::PreserveOriginal => {
                let mut grouped: IndexMap<(usize, MaterialId), SmallVec<[(LodLevel, &'a RenderableObject); 1]>> =
                    IndexMap::new();
                let mut loose = Vec::new();
                let mut plain = Vec::new();

                for &object in objects {
                    match memberships.get(&object.id) {
                        Some(&(group, level)) => grouped
                            .entry((group, object.material))
                            .or_default()
                            .push((LodLevel::Level(level), object)),
                        None if object.lod.is_assigned() => loose.push(PartitionItem::single(object, object.lod)),
                        None => plain.push(PartitionItem::single(object, LodLevel::Unassigned)),
                    }
                }

                let mut lod: Vec<PartitionItem<'a>> = grouped
                    .into_values()
                    .map(|members| {
                        let bounds = members
                            .iter()
                            .fold(Aabb::EMPTY, |acc, (_, o)| acc.merge(&o.world_bounds()));
                        PartitionItem {
                            position: bounds.center(),
                            material: members[0].1.material,
                            members,
                        }
                    })
                    .collect();
                lod.extend(loose);
                vec![ItemPool::new(lod, true), ItemPool::new(plain, false)]
            }
        };

        let pools: Vec<_> = pools.into_iter().filter(|pool| !pool.is_empty()).collect();
        log::debug!(
            "LOD reconciliation ({:?}): {} pool(s) from {} objects",
            self.handling,
            pools.len(),
            objects.len()
        );

        ReconciledPools {
            pools,
            max_lod_level: self.max_lod_level(objects),
        }
    }
}

/// Objects to merge for one LOD level of a cluster
#[derive(Debug, Clone)]
pub struct LevelMembers<'a> {
    pub level: u32,
    /// Level members followed by the cluster's unassigned members
    pub objects: Vec<&'a RenderableObject>,
    /// Lower level whose members were reused because this level was empty
    pub reused_from: Option<u32>,
}

/// Members for every level `0..=max_level`.
///
/// An empty level reuses the members of the nearest lower populated level.
/// Unassigned members are appended to every level.
pub fn fill_level_gaps<'a>(cluster: &Cluster<'a>, max_level: u32) -> Vec<LevelMembers<'a>> {
    let shared = cluster.members_at(LodLevel::Unassigned);
    let mut last_populated: Option<u32> = None;

    (0..=max_level)
        .map(|level| {
            let own = cluster.members_at(LodLevel::Level(level));
            let (source, reused_from) = if !own.is_empty() {
                last_populated = Some(level);
                (own, None)
            } else if let Some(lower) = last_populated {
                (cluster.members_at(LodLevel::Level(lower)), Some(lower))
            } else {
                (own, None)
            };

            let mut objects = Vec::with_capacity(source.len() + shared.len());
            objects.extend_from_slice(source);
            objects.extend_from_slice(shared);
            LevelMembers {
                level,
                objects,
                reused_from,
            }
        })
        .collect()
}
