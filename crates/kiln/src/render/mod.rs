//! # Render — the backend seam
//!
//! Renderers never talk to the GPU directly. Everything they need goes
//! through the [`RenderBackend`] trait: create meshes, textures, shaders and
//! batch buffers up front, then issue a small set of per-frame commands.
//!
//! ```text
//!   Renderer / BatchRenderer
//!          │  use_shader · bind_texture · set_uniform_* · draw_*
//!          ▼
//!   ┌──────────────────────┐
//!   │  dyn RenderBackend   │
//!   └──────┬───────────┬───┘
//!          │           │
//!          ▼           ▼
//!   WgpuBackend    HeadlessBackend
//!   (records the   (records commands
//!    frame, then    for inspection;
//!    one render     no GPU needed)
//!    pass in
//!    present)
//! ```
//!
//! The command set is modeled on a classic immediate-mode API: uniform and
//! texture state persist between draws until overwritten. The wgpu backend
//! snapshots that state at each draw into a dynamic-offset uniform slot.
//!
//! Handles ([`MeshId`], [`TextureId`], ...) are plain integers issued by the
//! backend that created them. Using a handle with a different backend is a
//! logic error; backends log and ignore unknown handles in per-frame
//! commands.

pub mod gpu;
pub mod headless;
pub mod mesh;
pub mod shader;
pub mod texture;
pub mod vertex;
pub mod wgpu_backend;

pub use gpu::GpuContext;
pub use headless::{BackendCommand, HeadlessBackend};
pub use mesh::{Mesh, MeshData, MeshParseError};
pub use shader::{Shader, UniformLocation, UniformWriter};
pub use texture::{FilterMode, PixelBuffer, PixelFormat, Texture};
pub use vertex::{ObjectUniforms, Vertex};
pub use wgpu_backend::WgpuBackend;

use crate::error::RenderError;
use crate::math::Mat4;

/// WGSL source of the plain sprite shader (MVP only).
pub const SPRITE_WGSL: &str = include_str!("shaders/sprite.wgsl");
/// WGSL source of the sprite-sheet shader (MVP plus frame slicing).
pub const ANIMATION_WGSL: &str = include_str!("shaders/animation.wgsl");

/// Backend mesh handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(pub u32);

/// Backend texture handle. Equal ids mean the same GPU texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextureId(pub u32);

/// Backend shader program handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShaderId(pub u32);

/// Backend handle for a fixed-capacity batch vertex/index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BatchBufferId(pub u32);

/// Everything the core needs from a graphics API.
pub trait RenderBackend {
    /// Upload static geometry.
    fn create_mesh(&mut self, label: &str, vertices: &[Vertex], indices: &[u32]) -> Result<MeshId, RenderError>;

    /// Upload tightly packed RGBA8 pixels.
    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
        filter: FilterMode,
    ) -> Result<TextureId, RenderError>;

    /// Replace the contents (and possibly the size) of an existing texture.
    /// The id stays valid.
    fn update_texture(
        &mut self,
        id: TextureId,
        width: u32,
        height: u32,
        rgba: &[u8],
        filter: FilterMode,
    ) -> Result<(), RenderError>;

    /// Compile a program and report its uniform locations.
    fn create_shader(&mut self, label: &str, source: &str) -> Result<Shader, RenderError>;

    /// Allocate a dynamic vertex/index buffer pair of fixed capacity.
    fn create_batch_buffer(&mut self, max_vertices: u32, max_indices: u32) -> Result<BatchBufferId, RenderError>;

    /// Overwrite the start of a batch buffer. Data past capacity is dropped.
    fn write_batch_buffer(&mut self, id: BatchBufferId, vertices: &[Vertex], indices: &[u32]);

    fn use_shader(&mut self, shader: ShaderId);

    fn bind_texture(&mut self, texture: TextureId, unit: u32);

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);

    /// Indexed draw of a whole mesh.
    fn draw_mesh(&mut self, mesh: MeshId, index_count: u32);

    /// Indexed draw of the first `index_count` indices of a batch buffer.
    fn draw_batch(&mut self, buffer: BatchBufferId, index_count: u32);
}

/// Per-call counters returned by the renderers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub texture_binds: u32,
    /// Objects skipped by frustum culling.
    pub culled: u32,
    pub vertices: u32,
}

impl std::ops::AddAssign for RenderStats {
    fn add_assign(&mut self, rhs: Self) {
        self.draw_calls += rhs.draw_calls;
        self.texture_binds += rhs.texture_binds;
        self.culled += rhs.culled;
        self.vertices += rhs.vertices;
    }
}
