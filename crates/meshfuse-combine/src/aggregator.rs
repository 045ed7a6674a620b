//! Geometry aggregation
//!
//! Turns clusters into combined meshes. Plain clusters become one mesh;
//! LOD-bearing clusters become a chain with one mesh per populated level,
//! empty levels filled from the nearest lower level.

use glam::{Vec2, Vec3};
use meshfuse_cluster::{Cluster, ClusterSet, fill_level_gaps};
use meshfuse_core::math::Aabb;
use meshfuse_core::{Diagnostics, MaterialId, MeshData, NoticeKind, PostProcessConfig, RenderableObject};

use crate::collision::CollisionMesh;
use crate::lightmap::{per_triangle_charts, unweld};
use crate::lod_chain::LodChain;
use crate::mesh::{CombinedMesh, IndexBuffer};
use crate::normals::smooth_normals;
use crate::{CombineError, CombineResult};

/// Result of combining one cluster
#[derive(Debug, Clone, PartialEq)]
pub enum CombinedCluster {
    Single(CombinedMesh),
    Lod(LodChain),
}

impl CombinedCluster {
    /// Every mesh produced for the cluster
    pub fn meshes(&self) -> Vec<&CombinedMesh> {
        match self {
            Self::Single(mesh) => vec![mesh],
            Self::Lod(chain) => chain.rungs.iter().map(|r| &r.mesh).collect(),
        }
    }

    pub fn material(&self) -> MaterialId {
        match self {
            Self::Single(mesh) => mesh.material,
            Self::Lod(chain) => chain.material,
        }
    }
}

/// World-space geometry concatenated from several instances
#[derive(Debug, Default)]
struct MergedGeometry {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    indices: Vec<u32>,
    missing_normals: bool,
    any_uvs: bool,
}

impl MergedGeometry {
    fn append(&mut self, object: &RenderableObject) {
        let Some(mesh) = object.mesh.as_deref() else {
            return;
        };
        let base = self.positions.len() as u32;
        let matrix = object.world_matrix();
        let normal_matrix = object.transform.normal_matrix();

        self.positions
            .extend(mesh.positions.iter().map(|p| matrix.transform_point3(*p)));

        if mesh.has_normals() {
            self.normals
                .extend(mesh.normals.iter().map(|n| (normal_matrix * *n).normalize_or_zero()));
        } else {
            self.missing_normals = true;
            self.normals.extend(std::iter::repeat_n(Vec3::ZERO, mesh.vertex_count()));
        }

        if mesh.has_uvs() {
            self.any_uvs = true;
            self.uvs.extend_from_slice(&mesh.uvs);
        } else {
            self.uvs.extend(std::iter::repeat_n(Vec2::ZERO, mesh.vertex_count()));
        }

        self.indices.extend(mesh.indices.iter().map(|i| base + i));
    }
}

/// Merges cluster members into meshes according to post-processing options
#[derive(Debug, Clone, Default)]
pub struct GeometryAggregator {
    post: PostProcessConfig,
}

impl GeometryAggregator {
    pub fn new(post: PostProcessConfig) -> Self {
        Self { post }
    }

    pub fn post(&self) -> &PostProcessConfig {
        &self.post
    }

    /// Merge `objects` into one mesh of `material`.
    ///
    /// Members without geometry are skipped; members with another material
    /// or a malformed mesh are skipped with a warning. Returns `None` when nothing was merged.
    pub fn merge_instances(
        &self,
        objects: &[&RenderableObject],
        material: MaterialId,
        lod_level: Option<u32>,
        diagnostics: &mut Diagnostics,
    ) -> Option<CombinedMesh> {
        let mut geometry = MergedGeometry::default();
        let mut sources = Vec::with_capacity(objects.len());

        for object in objects {
            if object.material != material {
                diagnostics.warn(
                    NoticeKind::MaterialMismatch,
                    format!(
                        "Skipping {} `{}`: uses {} but the mesh uses {}",
                        object.id, object.name, object.material, material
                    ),
                );
                continue;
            }
            if !object.has_geometry() {
                log::debug!("Skipping {} `{}`: no mesh geometry", object.id, object.name);
                continue;
            }
            if let Some(Err(defect)) = object.mesh.as_deref().map(MeshData::validate) {
                diagnostics.warn(
                    NoticeKind::InvalidMesh,
                    format!("Skipping {} `{}`: {}", object.id, object.name, defect),
                );
                continue;
            }
            geometry.append(object);
            sources.push(object.id);
        }

        if sources.is_empty() {
            return None;
        }

        let MergedGeometry {
            mut positions,
            mut normals,
            mut uvs,
            mut indices,
            missing_normals,
            any_uvs,
        } = geometry;

        if self.post.rebuild_normals || missing_normals {
            normals = smooth_normals(&positions, &indices);
        }
        if !any_uvs {
            uvs.clear();
        }

        let lightmap_uvs = if self.post.rebuild_lightmap_uv {
            positions = unweld(&positions, &indices);
            normals = unweld(&normals, &indices);
            if !uvs.is_empty() {
                uvs = unweld(&uvs, &indices);
            }
            indices = (0..positions.len() as u32).collect();
            Some(per_triangle_charts(&positions))
        } else {
            None
        };

        let collision = self
            .post
            .add_collision_mesh
            .then(|| CollisionMesh::weld(&positions, indices.iter().copied()));

        let bounds = Aabb::from_points(positions.iter().copied());
        let vertex_count = positions.len();
        let mut mesh = CombinedMesh {
            material,
            lod_level,
            sources,
            positions,
            normals,
            uvs,
            lightmap_uvs,
            indices: IndexBuffer::new(indices, vertex_count),
            anchor: Vec3::ZERO,
            bounds,
            mark_static: self.post.mark_static,
            collision,
        };
        mesh.recenter();

        tracing::debug!(
            material = %material,
            lod = ?lod_level,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "merged instances"
        );
        Some(mesh)
    }

    /// Combine one cluster.
    ///
    /// LOD-bearing clusters yield a chain over levels `0..=max_lod_level`;
    /// levels without geometry are skipped with an info notice. Fails when
    /// no level produced a mesh.
    pub fn combine_cluster(
        &self,
        cluster: &Cluster<'_>,
        max_lod_level: Option<u32>,
        diagnostics: &mut Diagnostics,
    ) -> CombineResult<CombinedCluster> {
        let span = tracing::debug_span!(
            "combine",
            material = %cluster.material(),
            members = cluster.member_count()
        );
        let _guard = span.enter();

        let combined = match max_lod_level.filter(|_| cluster.has_lod_groups()) {
            Some(max_level) => {
                let mut chain = LodChain::new(cluster.material());
                for level in fill_level_gaps(cluster, max_level) {
                    match self.merge_instances(&level.objects, cluster.material(), Some(level.level), diagnostics) {
                        Some(mesh) => chain.push(level.level, mesh, level.reused_from),
                        None => diagnostics.info(
                            NoticeKind::EmptyCombineSet,
                            format!(
                                "LOD{} of a {} cluster has no geometry; level skipped",
                                level.level,
                                cluster.material()
                            ),
                        ),
                    }
                }
                (!chain.is_empty()).then_some(CombinedCluster::Lod(chain))
            }
            None => {
                let members: Vec<&RenderableObject> = cluster.members().map(|(_, o)| o).collect();
                self.merge_instances(&members, cluster.material(), None, diagnostics)
                    .map(CombinedCluster::Single)
            }
        };

        combined.ok_or_else(|| {
            let err = CombineError::NoGeometry {
                material: cluster.material(),
                members: cluster.member_count(),
            };
            diagnostics.warn(NoticeKind::EmptyCombineSet, err.to_string());
            err
        })
    }

    /// Combine every cluster of a run. Clusters that fail are reported and
    /// left out.
    pub fn combine_set(&self, set: &ClusterSet<'_>, diagnostics: &mut Diagnostics) -> Vec<CombinedCluster> {
        let combined: Vec<CombinedCluster> = set
            .iter()
            .filter_map(|cluster| self.combine_cluster(cluster, set.max_lod_level, diagnostics).ok())
            .collect();

        let meshes: usize = combined.iter().map(|c| c.meshes().len()).sum();
        diagnostics.info(
            NoticeKind::Summary,
            format!(
                "Combined {} of {} clusters into {} meshes",
                combined.len(),
                set.len(),
                meshes
            ),
        );
        combined
    }
}
