//! A backend that records commands instead of drawing.
//!
//! Useful for running game logic without a window and for asserting on what
//! the renderers submit.

use std::collections::HashMap;

use super::shader::{Shader, reflect_uniforms};
use super::{
    BatchBufferId, FilterMode, MeshId, RenderBackend, ShaderId, TextureId, UniformLocation, Vertex,
};
use crate::error::RenderError;
use crate::math::Mat4;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    CreateMesh { id: MeshId, vertices: usize, indices: usize },
    CreateTexture { id: TextureId, width: u32, height: u32, filter: FilterMode },
    UpdateTexture { id: TextureId, width: u32, height: u32, filter: FilterMode },
    CreateShader { id: ShaderId, label: String },
    CreateBatchBuffer { id: BatchBufferId, max_vertices: u32, max_indices: u32 },
    WriteBatchBuffer { id: BatchBufferId, vertices: usize, indices: usize },
    UseShader(ShaderId),
    BindTexture { texture: TextureId, unit: u32 },
    SetUniformMat4 { location: UniformLocation, value: Mat4 },
    SetUniformF32 { location: UniformLocation, value: f32 },
    DrawMesh { mesh: MeshId, index_count: u32 },
    DrawBatch { buffer: BatchBufferId, index_count: u32 },
}

struct BatchContents {
    max_vertices: u32,
    max_indices: u32,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
}

/// Records every call; hands out sequential handles starting at 1.
#[derive(Default)]
pub struct HeadlessBackend {
    commands: Vec<BackendCommand>,
    next_id: u32,
    textures: HashMap<TextureId, (u32, u32)>,
    batches: HashMap<BatchBufferId, BatchContents>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Forget recorded commands (handles stay valid).
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Number of `draw_mesh` + `draw_batch` calls recorded.
    pub fn draw_calls(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, BackendCommand::DrawMesh { .. } | BackendCommand::DrawBatch { .. }))
            .count()
    }

    /// Textures bound, in order.
    pub fn texture_binds(&self) -> Vec<TextureId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                BackendCommand::BindTexture { texture, .. } => Some(*texture),
                _ => None,
            })
            .collect()
    }

    /// The data last written to a batch buffer.
    pub fn batch_contents(&self, id: BatchBufferId) -> Option<(&[Vertex], &[u32])> {
        self.batches
            .get(&id)
            .map(|b| (b.vertices.as_slice(), b.indices.as_slice()))
    }

    /// Current size of a texture.
    pub fn texture_size(&self, id: TextureId) -> Option<(u32, u32)> {
        self.textures.get(&id).copied()
    }

    fn next(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_mesh(&mut self, _label: &str, vertices: &[Vertex], indices: &[u32]) -> Result<MeshId, RenderError> {
        let id = MeshId(self.next());
        self.commands.push(BackendCommand::CreateMesh {
            id,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        Ok(id)
    }

    fn create_texture(
        &mut self,
        _label: &str,
        width: u32,
        height: u32,
        _rgba: &[u8],
        filter: FilterMode,
    ) -> Result<TextureId, RenderError> {
        let id = TextureId(self.next());
        self.textures.insert(id, (width, height));
        self.commands.push(BackendCommand::CreateTexture {
            id,
            width,
            height,
            filter,
        });
        Ok(id)
    }

    fn update_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        _rgba: &[u8],
        filter: FilterMode,
    ) -> Result<(), RenderError> {
        let size = self
            .textures
            .get_mut(&id)
            .ok_or(RenderError::UnknownHandle { kind: "texture", id: id.0 })?;
        *size = (width, height);
        self.commands.push(BackendCommand::UpdateTexture {
            id,
            width,
            height,
            filter,
        });
        Ok(())
    }

    fn create_shader(&mut self, label: &str, source: &str) -> Result<Shader, RenderError> {
        let id = ShaderId(self.next());
        self.commands.push(BackendCommand::CreateShader {
            id,
            label: label.to_owned(),
        });
        Ok(Shader::new(id, label, reflect_uniforms(source)))
    }

    fn create_batch_buffer(&mut self, max_vertices: u32, max_indices: u32) -> Result<BatchBufferId, RenderError> {
        let id = BatchBufferId(self.next());
        self.batches.insert(
            id,
            BatchContents {
                max_vertices,
                max_indices,
                vertices: Vec::new(),
                indices: Vec::new(),
            },
        );
        self.commands.push(BackendCommand::CreateBatchBuffer {
            id,
            max_vertices,
            max_indices,
        });
        Ok(id)
    }

    fn write_batch_buffer(&mut self, id: BatchBufferId, vertices: &[Vertex], indices: &[u32]) {
        let Some(batch) = self.batches.get_mut(&id) else {
            log::warn!("write to unknown batch buffer {}", id.0);
            return;
        };
        let v = vertices.len().min(batch.max_vertices as usize);
        let i = indices.len().min(batch.max_indices as usize);
        batch.vertices = vertices[..v].to_vec();
        batch.indices = indices[..i].to_vec();
        self.commands.push(BackendCommand::WriteBatchBuffer {
            id,
            vertices: v,
            indices: i,
        });
    }

    fn use_shader(&mut self, shader: ShaderId) {
        self.commands.push(BackendCommand::UseShader(shader));
    }

    fn bind_texture(&mut self, texture: TextureId, unit: u32) {
        self.commands.push(BackendCommand::BindTexture { texture, unit });
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        self.commands.push(BackendCommand::SetUniformMat4 {
            location,
            value: *value,
        });
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        self.commands.push(BackendCommand::SetUniformF32 { location, value });
    }

    fn draw_mesh(&mut self, mesh: MeshId, index_count: u32) {
        self.commands.push(BackendCommand::DrawMesh { mesh, index_count });
    }

    fn draw_batch(&mut self, buffer: BatchBufferId, index_count: u32) {
        self.commands.push(BackendCommand::DrawBatch { buffer, index_count });
    }
}
