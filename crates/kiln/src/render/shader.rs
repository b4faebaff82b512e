//! Shader programs and uniform writes.
//!
//! A [`Shader`] is a backend program id plus a map from uniform name to
//! location. Locations follow the GL convention: `-1` means "this program
//! does not use the uniform". [`UniformWriter`] skips such writes silently,
//! as it does for names missing from the map.

use std::collections::HashMap;

use super::{RenderBackend, ShaderId};
use crate::math::Mat4;

/// Combined model-view-projection matrix.
pub const U_MVP: &str = "u_mvpMatrix";
/// Split transform matrices used by older shaders.
pub const U_WORLD: &str = "worldMatrix";
pub const U_VIEW: &str = "viewMatrix";
pub const U_PROJECTION: &str = "projectionMatrix";
/// Sprite-sheet animation inputs.
pub const U_CURRENT_FRAME: &str = "currentFrame";
pub const U_FRAME_COUNT: &str = "frameCount";

/// Every uniform name the engine writes, paired with the WGSL field of the
/// per-object uniform block that backs it. The position in this table is the
/// uniform's location.
pub const KNOWN_UNIFORMS: [(&str, &str); 6] = [
    (U_MVP, "mvp"),
    (U_WORLD, "world"),
    (U_VIEW, "view"),
    (U_PROJECTION, "projection"),
    (U_CURRENT_FRAME, "current_frame"),
    (U_FRAME_COUNT, "frame_count"),
];

/// A uniform location. Negative values are never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

impl UniformLocation {
    pub const NONE: Self = Self(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

/// A compiled program and its uniform locations.
#[derive(Debug, Clone)]
pub struct Shader {
    id: ShaderId,
    name: String,
    uniforms: HashMap<String, UniformLocation>,
}

impl Shader {
    pub fn new(id: ShaderId, name: impl Into<String>, uniforms: HashMap<String, UniformLocation>) -> Self {
        Self {
            id,
            name: name.into(),
            uniforms,
        }
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Location of `name`, or `None` when absent or `-1`.
    pub fn location(&self, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(name).copied().filter(|loc| loc.is_valid())
    }

    pub fn uniforms(&self) -> &HashMap<String, UniformLocation> {
        &self.uniforms
    }
}

/// Build the location map for a WGSL program by checking which fields of
/// the `object` uniform block it reads.
///
/// Every known name is present in the result; unused ones map to `-1`.
pub fn reflect_uniforms(wgsl: &str) -> HashMap<String, UniformLocation> {
    KNOWN_UNIFORMS
        .iter()
        .enumerate()
        .map(|(index, (name, field))| {
            let used = reads_field(wgsl, field);
            let location = if used {
                UniformLocation(index as i32)
            } else {
                UniformLocation::NONE
            };
            ((*name).to_owned(), location)
        })
        .collect()
}

/// `object.<field>` followed by a non-identifier character.
fn reads_field(source: &str, field: &str) -> bool {
    let needle = format!("object.{field}");
    source.match_indices(&needle).any(|(start, _)| {
        source[start + needle.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
    })
}

/// Writes uniforms by name for one shader, skipping names it doesn't use.
pub struct UniformWriter<'a> {
    shader: &'a Shader,
    backend: &'a mut dyn RenderBackend,
}

impl<'a> UniformWriter<'a> {
    pub fn new(shader: &'a Shader, backend: &'a mut dyn RenderBackend) -> Self {
        Self { shader, backend }
    }

    /// Returns `true` if the value was written.
    pub fn mat4(&mut self, name: &str, value: &Mat4) -> bool {
        match self.shader.location(name) {
            Some(location) => {
                self.backend.set_uniform_mat4(location, value);
                true
            }
            None => false,
        }
    }

    /// Returns `true` if the value was written.
    pub fn f32(&mut self, name: &str, value: f32) -> bool {
        match self.shader.location(name) {
            Some(location) => {
                self.backend.set_uniform_f32(location, value);
                true
            }
            None => false,
        }
    }
}
