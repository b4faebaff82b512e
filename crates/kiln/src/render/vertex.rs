//! GPU vertex and uniform formats.
//!
//! Every mesh and every batch uses the same interleaved layout:
//! `position: 3 × f32`, `uv: 2 × f32`, with `u32` indices and a triangle
//! list topology.

use bytemuck::{Pod, Zeroable};

use crate::math::Mat4;

/// One mesh vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }

    /// wgpu vertex buffer layout matching this struct.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };
}

/// Per-draw uniform block, bound at group 0 with a dynamic offset.
///
/// Field order is the location order used by
/// [`reflect_uniforms`](super::shader::reflect_uniforms).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub mvp: [[f32; 4]; 4],
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub current_frame: f32,
    pub frame_count: f32,
    pub _pad: [f32; 2],
}

impl ObjectUniforms {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    /// Write a matrix into the field at `index` (0..4).
    pub(crate) fn set_mat4(&mut self, index: i32, value: &Mat4) {
        let cols = value.to_cols_array_2d();
        match index {
            0 => self.mvp = cols,
            1 => self.world = cols,
            2 => self.view = cols,
            3 => self.projection = cols,
            _ => log::warn!("uniform location {index} is not a matrix"),
        }
    }

    /// Write a scalar into the field at `index` (4..6).
    pub(crate) fn set_f32(&mut self, index: i32, value: f32) {
        match index {
            4 => self.current_frame = value,
            5 => self.frame_count = value,
            _ => log::warn!("uniform location {index} is not a scalar"),
        }
    }
}

impl Default for ObjectUniforms {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            mvp: identity,
            world: identity,
            view: identity,
            projection: identity,
            current_frame: 0.0,
            frame_count: 1.0,
            _pad: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
        assert_eq!(Vertex::LAYOUT.array_stride, 20);
    }

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(ObjectUniforms::SIZE % 16, 0);
        assert_eq!(ObjectUniforms::SIZE, 4 * 64 + 16);
    }

    #[test]
    fn setters_route_by_location() {
        let mut block = ObjectUniforms::default();
        let m = Mat4::from_translation(crate::math::Vec3::new(1.0, 2.0, 3.0));
        block.set_mat4(0, &m);
        block.set_f32(4, 3.0);
        block.set_f32(5, 6.0);
        assert_eq!(block.mvp, m.to_cols_array_2d());
        assert_eq!(block.world, Mat4::IDENTITY.to_cols_array_2d());
        assert!((block.current_frame - 3.0).abs() < 0.001);
        assert!((block.frame_count - 6.0).abs() < 0.001);
    }
}
