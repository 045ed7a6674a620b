//! Scene description files
//!
//! A JSON snapshot of the objects a clustering run works on. Meshes are
//! stored once and referenced by index so instanced geometry stays shared.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::scene::{
    LodGroupDescriptor, LodLevel, MaterialId, MeshData, ObjectId, RenderableObject, Transform,
};
use crate::{SceneError, SceneResult};

/// Serialized form of one renderable object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDescription {
    pub id: u64,
    pub name: String,
    pub transform: Transform,
    /// Index into [`SceneDescription::meshes`]
    pub mesh: Option<usize>,
    /// Index into [`SceneDescription::materials`]
    pub material: u32,
    pub lod: LodLevel,
    pub tag: String,
    pub layer: u32,
    pub is_static: bool,
    pub active: bool,
    pub renderer_enabled: bool,
}

impl Default for ObjectDescription {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            transform: Transform::IDENTITY,
            mesh: None,
            material: 0,
            lod: LodLevel::Unassigned,
            tag: String::from("Untagged"),
            layer: 0,
            is_static: false,
            active: true,
            renderer_enabled: true,
        }
    }
}

/// Scene snapshot as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// Material names, indexed by [`MaterialId`]
    pub materials: Vec<String>,
    /// Shared meshes
    pub meshes: Vec<MeshData>,
    /// Objects in scene order
    pub objects: Vec<ObjectDescription>,
    /// LOD groups
    pub lod_groups: Vec<LodGroupDescriptor>,
}

/// A resolved scene ready for clustering
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Material names, indexed by [`MaterialId`]
    pub materials: Vec<String>,
    /// Objects in scene order
    pub objects: Vec<RenderableObject>,
    /// LOD groups
    pub lod_groups: Vec<LodGroupDescriptor>,
}

impl Scene {
    /// Display name for a material, falling back to its id
    pub fn material_name(&self, material: MaterialId) -> String {
        self.materials
            .get(material.0 as usize)
            .cloned()
            .unwrap_or_else(|| material.to_string())
    }
}

impl SceneDescription {
    /// Parse a description from JSON text
    pub fn from_json_str(json: &str) -> SceneResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a description from a JSON file
    pub fn load(path: &Path) -> SceneResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Resolve mesh and material references into a [`Scene`]
    pub fn build(self) -> SceneResult<Scene> {
        for (index, mesh) in self.meshes.iter().enumerate() {
            mesh.validate()
                .map_err(|defect| SceneError::InvalidMesh { index, defect })?;
        }
        let meshes: Vec<Arc<MeshData>> = self.meshes.into_iter().map(Arc::new).collect();
        let material_count = self.materials.len();

        let mut objects = Vec::with_capacity(self.objects.len());
        for desc in self.objects {
            let mesh = match desc.mesh {
                Some(index) => Some(meshes.get(index).cloned().ok_or(SceneError::MeshIndex {
                    object: desc.id,
                    index,
                    count: meshes.len(),
                })?),
                None => None,
            };
            if material_count > 0 && desc.material as usize >= material_count {
                return Err(SceneError::MaterialIndex {
                    object: desc.id,
                    index: desc.material,
                    count: material_count,
                });
            }

            objects.push(RenderableObject {
                id: ObjectId(desc.id),
                name: desc.name,
                transform: desc.transform,
                mesh,
                material: MaterialId(desc.material),
                lod: desc.lod,
                tag: desc.tag,
                layer: desc.layer,
                is_static: desc.is_static,
                active: desc.active,
                renderer_enabled: desc.renderer_enabled,
            });
        }

        for group in &self.lod_groups {
            for (_, id) in group.entries() {
                if !objects.iter().any(|o| o.id == id) {
                    return Err(SceneError::UnknownLodMember {
                        group: group.name.clone(),
                        object: id.0,
                    });
                }
            }
        }

        Ok(Scene {
            materials: self.materials,
            objects,
            lod_groups: self.lod_groups,
        })
    }
}
