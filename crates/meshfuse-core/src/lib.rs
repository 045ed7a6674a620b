//! # Meshfuse Core
//!
//! Shared data model for the meshfuse clustering and mesh-aggregation engine.
//!
//! This crate provides:
//! - **Math**: Bounding volumes and grid helpers on top of glam
//! - **Scene**: Transforms, shared meshes, renderable objects and LOD groups
//! - **Description**: JSON scene snapshots resolved into a [`Scene`]
//! - **Filter**: Input selection by static/active flags, tag, layer and name
//! - **Config**: Immutable per-run clustering and post-processing settings
//! - **Diagnostics**: Severity-tagged notices raised during a run

pub mod config;
pub mod description;
pub mod diagnostics;
pub mod filter;
pub mod math;
pub mod scene;

pub use config::{Algorithm, ClusteringConfig, LodHandling, MeshFuseConfig, PostProcessConfig};
pub use description::{Scene, SceneDescription};
pub use diagnostics::{Diagnostics, Notice, NoticeKind, Severity};
pub use filter::ObjectFilter;
pub use math::{Aabb, BoundingSphere};
pub use scene::{LodGroupDescriptor, LodLevel, MaterialId, MeshData, ObjectId, RenderableObject, Transform};

use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: &'static str },

    #[error("K-Means requires at least one cluster")]
    ZeroClusters,

    #[error("Cell size must be positive on every axis, got {0:?}")]
    NonPositiveCellSize([f32; 3]),

    #[error("Failed to read config: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: &'static str) -> Self {
        Self::InvalidParameter { name, reason }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Scene description errors
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Object {object} references mesh {index}, but only {count} meshes exist")]
    MeshIndex { object: u64, index: usize, count: usize },

    #[error("Object {object} references material {index}, but only {count} materials exist")]
    MaterialIndex { object: u64, index: u32, count: usize },

    #[error("Mesh {index} is malformed: {defect}")]
    InvalidMesh {
        index: usize,
        #[source]
        defect: MeshDefect,
    },

    #[error("LOD group `{group}` lists unknown object {object}")]
    UnknownLodMember { group: String, object: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Structural problems in a triangle mesh
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MeshDefect {
    #[error("{count} indices do not form whole triangles")]
    PartialTriangle { count: usize },

    #[error("index {index} at position {position} exceeds the {vertices} vertices")]
    IndexOutOfRange { position: usize, index: u32, vertices: usize },

    #[error("{count} {attribute} for {vertices} vertices")]
    AttributeCount { attribute: &'static str, count: usize, vertices: usize },
}

/// Result type for scene description operations
pub type SceneResult<T> = Result<T, SceneError>;
