//! # Meshfuse Combine
//!
//! Geometry aggregation for clusters produced by `meshfuse-cluster`.
//!
//! ## Features
//! - World-space merge of member meshes with 16/32-bit index selection
//! - Recentering around the bounding-box center with a recorded anchor
//! - Area-weighted normal recomputation
//! - Per-triangle lightmap UV charts
//! - Welded collision meshes
//! - LOD chains with screen-space transition thresholds

pub mod aggregator;
pub mod collision;
pub mod lightmap;
pub mod lod_chain;
pub mod mesh;
pub mod normals;

pub use aggregator::{CombinedCluster, GeometryAggregator};
pub use collision::CollisionMesh;
pub use lod_chain::{LodChain, LodRung, screen_threshold};
pub use mesh::{CombinedMesh, IndexBuffer, IndexFormat, MeshStats};

use meshfuse_core::MaterialId;
use thiserror::Error;

/// Aggregation errors
#[derive(Error, Debug)]
pub enum CombineError {
    #[error("No mergeable geometry in a {material} cluster of {members} objects")]
    NoGeometry { material: MaterialId, members: usize },
}

/// Result type for aggregation operations
pub type CombineResult<T> = Result<T, CombineError>;
