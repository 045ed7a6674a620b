//! Reports
//!
//! Read-only views over inputs and results: a per-material census of the
//! input objects and a summary table of the produced clusters.

use std::fmt;

use indexmap::IndexMap;
use meshfuse_core::{MaterialId, RenderableObject};

use crate::cluster::Cluster;

/// Objects and triangles using one material
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterialCount {
    pub material: MaterialId,
    pub objects: usize,
    pub triangles: usize,
}

/// Count objects per material, in order of first appearance
pub fn material_census(objects: &[&RenderableObject]) -> Vec<MaterialCount> {
    let mut counts: IndexMap<MaterialId, MaterialCount> = IndexMap::new();
    for object in objects {
        let entry = counts.entry(object.material).or_insert(MaterialCount {
            material: object.material,
            objects: 0,
            triangles: 0,
        });
        entry.objects += 1;
        entry.triangles += object.triangle_count();
    }
    counts.into_values().collect()
}

/// One line of the cluster summary
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterRow {
    pub index: usize,
    pub material: MaterialId,
    pub members: usize,
    pub triangles: usize,
    /// Subdivision depth; 0 for main clusters
    pub depth: u32,
    pub over_limit: bool,
    pub has_lod_groups: bool,
}

/// Totals and per-cluster rows for a clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub total_objects: usize,
    pub total_triangles: usize,
    pub triangle_limit: usize,
    pub rows: Vec<ClusterRow>,
}

impl ClusterSummary {
    pub fn new(clusters: &[Cluster<'_>], triangle_limit: usize) -> Self {
        let rows: Vec<ClusterRow> = clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| ClusterRow {
                index,
                material: cluster.material(),
                members: cluster.member_count(),
                triangles: cluster.triangle_count(),
                depth: cluster.depth(),
                over_limit: cluster.triangle_count() > triangle_limit,
                has_lod_groups: cluster.has_lod_groups(),
            })
            .collect();

        Self {
            total_objects: rows.iter().map(|r| r.members).sum(),
            total_triangles: rows.iter().map(|r| r.triangles).sum(),
            triangle_limit,
            rows,
        }
    }

    pub fn cluster_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows still above the triangle limit
    pub fn over_limit(&self) -> impl Iterator<Item = &ClusterRow> {
        self.rows.iter().filter(|r| r.over_limit)
    }
}

impl fmt::Display for ClusterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} objects, {} triangles, {} clusters (limit {} triangles)",
            self.total_objects,
            self.total_triangles,
            self.rows.len(),
            self.triangle_limit
        )?;
        for row in &self.rows {
            let kind = if row.depth == 0 {
                String::from("main")
            } else {
                format!("sub L{}", row.depth)
            };
            write!(
                f,
                "  [{:>3}] {:<8} {:<8} {:>5} objects {:>8} triangles",
                row.index,
                row.material.to_string(),
                kind,
                row.members,
                row.triangles
            )?;
            if row.has_lod_groups {
                write!(f, " lod")?;
            }
            if row.over_limit {
                write!(f, " OVER LIMIT")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
