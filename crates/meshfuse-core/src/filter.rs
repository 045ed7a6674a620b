//! Input filtering
//!
//! Selects which captured objects are handed to clustering. Every filter is
//! optional; an object must satisfy all enabled filters.

use serde::{Deserialize, Serialize};

use crate::scene::RenderableObject;

/// Object filter options
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectFilter {
    /// Required static flag
    pub only_static: Option<bool>,
    /// Required active flag
    pub only_active: Option<bool>,
    /// Required renderer-enabled flag
    pub only_active_renderers: Option<bool>,
    /// Exact tag match
    pub tag: Option<String>,
    /// Exact layer match
    pub layer: Option<u32>,
    /// Substring the object name must contain
    pub name_contains: Option<String>,
}

impl ObjectFilter {
    /// A filter that accepts everything
    pub fn none() -> Self {
        Self::default()
    }

    /// Check a single object against every enabled filter
    pub fn accepts(&self, object: &RenderableObject) -> bool {
        if self.only_static.is_some_and(|v| object.is_static != v) {
            return false;
        }
        if self.only_active.is_some_and(|v| object.active != v) {
            return false;
        }
        if self.only_active_renderers.is_some_and(|v| object.renderer_enabled != v) {
            return false;
        }
        if self.tag.as_deref().is_some_and(|tag| object.tag != tag) {
            return false;
        }
        if self.layer.is_some_and(|layer| object.layer != layer) {
            return false;
        }
        if self
            .name_contains
            .as_deref()
            .is_some_and(|needle| !object.name.contains(needle))
        {
            return false;
        }
        true
    }

    /// Keep the accepted objects, preserving input order
    pub fn apply<'a>(&self, objects: &'a [RenderableObject]) -> Vec<&'a RenderableObject> {
        let selected: Vec<_> = objects.iter().filter(|o| self.accepts(o)).collect();
        log::debug!(
            "Filter kept {} of {} objects",
            selected.len(),
            objects.len()
        );
        selected
    }
}
