//! LOD chains
//!
//! One combined mesh per populated level, each with the relative screen
//! height below which the renderer switches to the next level.

use meshfuse_core::MaterialId;

use crate::mesh::CombinedMesh;

/// Screen-relative transition heights for levels 0 to 4
pub const SCREEN_THRESHOLDS: [f32; 5] = [0.6, 0.4, 0.2, 0.1, 0.05];

/// Transition height for levels past the table
pub const MIN_SCREEN_THRESHOLD: f32 = 0.01;

/// Transition height for a LOD level
pub fn screen_threshold(level: u32) -> f32 {
    SCREEN_THRESHOLDS
        .get(level as usize)
        .copied()
        .unwrap_or(MIN_SCREEN_THRESHOLD)
}

/// One level of a chain
#[derive(Debug, Clone, PartialEq)]
pub struct LodRung {
    pub level: u32,
    pub screen_threshold: f32,
    pub mesh: CombinedMesh,
    /// Lower level whose members were reused for this one
    pub reused_from: Option<u32>,
}

/// Combined meshes for every populated level of a cluster
#[derive(Debug, Clone, PartialEq)]
pub struct LodChain {
    pub material: MaterialId,
    /// Rungs in ascending level order
    pub rungs: Vec<LodRung>,
}

impl LodChain {
    pub fn new(material: MaterialId) -> Self {
        Self {
            material,
            rungs: Vec::new(),
        }
    }

    pub fn push(&mut self, level: u32, mesh: CombinedMesh, reused_from: Option<u32>) {
        self.rungs.push(LodRung {
            level,
            screen_threshold: screen_threshold(level),
            mesh,
            reused_from,
        });
    }

    pub fn len(&self) -> usize {
        self.rungs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rungs.is_empty()
    }

    /// Rung for a level, if it produced a mesh
    pub fn level(&self, level: u32) -> Option<&LodRung> {
        self.rungs.iter().find(|r| r.level == level)
    }
}
