//! Configuration
//!
//! Immutable settings passed into each clustering run, with JSON
//! persistence and validation.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::filter::ObjectFilter;
use crate::{ConfigError, ConfigResult};

/// Default recursion cap for budget subdivision
pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 10;

/// Partitioning strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Greedy seed-and-absorb within the grouping radius
    #[default]
    Proximity,
    /// Per-material K-Means on object positions
    KMeans,
    /// Fixed-size 3D grid bucketing
    Cell,
}

/// How objects with and without LOD structure are clustered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LodHandling {
    /// LOD-bearing and plain objects are clustered independently
    #[default]
    Separate,
    /// Everything is clustered together as LOD-bearing
    Unify,
    /// Each LOD group moves as one unit
    PreserveOriginal,
}

/// Clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Partitioning strategy
    pub algorithm: Algorithm,
    /// Seed-and-absorb radius for the proximity partitioner
    pub grouping_radius: f32,
    /// Seed-and-absorb radius used when splitting over-budget clusters
    pub subgroup_radius: f32,
    /// Maximum triangles per cluster before subdivision
    pub triangle_limit: usize,
    /// Centroids per material for K-Means
    pub k_clusters: usize,
    /// Fixed K-Means iteration count
    pub kmeans_iterations: usize,
    /// Cell dimensions for the cell partitioner
    pub cell_size: Vec3,
    /// LOD handling policy
    pub lod_handling: LodHandling,
    /// Recursion cap for budget subdivision
    pub max_recursion_depth: u32,
    /// K-Means seed; `None` draws a fresh seed every run
    pub seed: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Proximity,
            grouping_radius: 5.0,
            subgroup_radius: 2.0,
            triangle_limit: 10_000,
            k_clusters: 8,
            kmeans_iterations: 10,
            cell_size: Vec3::splat(10.0),
            lod_handling: LodHandling::Separate,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            seed: None,
        }
    }
}

impl ClusteringConfig {
    /// Check every parameter the selected algorithm relies on
    pub fn validate(&self) -> ConfigResult<()> {
        if self.triangle_limit == 0 {
            return Err(ConfigError::invalid("triangle_limit", "must be at least 1"));
        }

        match self.algorithm {
            Algorithm::Proximity => {
                if !(self.grouping_radius.is_finite() && self.grouping_radius > 0.0) {
                    return Err(ConfigError::invalid("grouping_radius", "must be positive"));
                }
                self.validate_subgroup_radius()?;
                if self.subgroup_radius >= self.grouping_radius {
                    return Err(ConfigError::invalid(
                        "subgroup_radius",
                        "must be smaller than grouping_radius",
                    ));
                }
            }
            Algorithm::KMeans => {
                if self.k_clusters == 0 {
                    return Err(ConfigError::ZeroClusters);
                }
                if self.kmeans_iterations == 0 {
                    return Err(ConfigError::invalid("kmeans_iterations", "must be at least 1"));
                }
                // Budget subdivision still splits K-Means clusters
                self.validate_subgroup_radius()?;
            }
            Algorithm::Cell => {
                let size = self.cell_size;
                if !(size.is_finite() && size.min_element() > 0.0) {
                    return Err(ConfigError::NonPositiveCellSize(size.to_array()));
                }
            }
        }

        Ok(())
    }

    fn validate_subgroup_radius(&self) -> ConfigResult<()> {
        if !(self.subgroup_radius.is_finite() && self.subgroup_radius > 0.0) {
            return Err(ConfigError::invalid("subgroup_radius", "must be positive"));
        }
        Ok(())
    }
}

/// Settings consulted only by geometry aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessConfig {
    /// Recompute vertex normals from the merged topology
    pub rebuild_normals: bool,
    /// Generate a secondary (lightmap) UV channel
    pub rebuild_lightmap_uv: bool,
    /// Build a welded collision mesh alongside the render mesh
    pub add_collision_mesh: bool,
    /// Hint that combined objects should be marked static
    pub mark_static: bool,
}

impl Default for PostProcessConfig {
    fn default() -> Self {
        Self {
            rebuild_normals: false,
            rebuild_lightmap_uv: false,
            add_collision_mesh: false,
            mark_static: true,
        }
    }
}

/// Complete configuration for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshFuseConfig {
    /// Input filters
    pub filter: ObjectFilter,
    /// Clustering parameters
    pub clustering: ClusteringConfig,
    /// Aggregation post-processing
    pub post: PostProcessConfig,
}

impl MeshFuseConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        serde_json::from_str(json).map_err(ConfigError::Parse)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        let config = Self::from_json_str(&text)?;
        config.clustering.validate()?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = ClusteringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_recursion_depth, 10);
        assert!(PostProcessConfig::default().mark_static);
    }

    #[test]
    fn test_zero_clusters_rejected() {
        let config = ClusteringConfig {
            algorithm: Algorithm::KMeans,
            k_clusters: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZeroClusters)));

        // Only checked when K-Means is selected
        let config = ClusteringConfig {
            k_clusters: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cell_size_rejected() {
        let config = ClusteringConfig {
            algorithm: Algorithm::Cell,
            cell_size: Vec3::new(10.0, 0.0, 10.0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveCellSize(_))));
    }

    #[test]
    fn test_radius_ordering() {
        let config = ClusteringConfig {
            grouping_radius: 2.0,
            subgroup_radius: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "subgroup_radius", .. })
        ));
    }

    #[test]
    fn test_radii_checked_only_where_used() {
        // K-Means never reads grouping_radius but still subdivides
        let kmeans = ClusteringConfig {
            algorithm: Algorithm::KMeans,
            grouping_radius: 1.0,
            subgroup_radius: 3.0,
            ..Default::default()
        };
        assert!(kmeans.validate().is_ok());

        let kmeans = ClusteringConfig {
            subgroup_radius: 0.0,
            ..kmeans
        };
        assert!(matches!(
            kmeans.validate(),
            Err(ConfigError::InvalidParameter { name: "subgroup_radius", .. })
        ));

        let cell = ClusteringConfig {
            algorithm: Algorithm::Cell,
            grouping_radius: 0.0,
            subgroup_radius: -1.0,
            ..Default::default()
        };
        assert!(cell.validate().is_ok());
    }

    #[test]
    fn test_json_partial_sections() {
        let config = MeshFuseConfig::from_json_str(
            r#"{ "clustering": { "algorithm": "Cell", "cell_size": [4, 4, 4] },
                 "post": { "rebuild_normals": true } }"#,
        )
        .unwrap();
        assert_eq!(config.clustering.algorithm, Algorithm::Cell);
        assert_eq!(config.clustering.cell_size, Vec3::splat(4.0));
        assert_eq!(config.clustering.grouping_radius, 5.0);
        assert!(config.post.rebuild_normals);
        assert!(config.post.mark_static);
        assert_eq!(config.filter, ObjectFilter::none());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = MeshFuseConfig::default();
        config.clustering.lod_handling = LodHandling::PreserveOriginal;
        config.clustering.seed = Some(7);
        let text = config.to_json_string().unwrap();
        assert_eq!(MeshFuseConfig::from_json_str(&text).unwrap(), config);
    }
}
