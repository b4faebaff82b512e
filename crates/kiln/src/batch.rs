//! # Batch — many sprites, one draw call
//!
//! [`BatchRenderer`] multiplies every vertex of every queued object by its
//! full `projection * view * world` on the CPU and appends the result to one
//! shared vertex/index buffer. The GPU then draws the whole buffer at once
//! with an identity MVP.
//!
//! ```text
//!   add / remove / object moved / camera moved
//!                  │
//!                  ▼
//!            needs_rebuild ──build_buffer──► CPU vertices + indices
//!                                                  │ needs_send
//!                                                  ▼
//!                                   write_batch_buffer (once per rebuild)
//!                                                  │
//!                                                  ▼
//!                                       bind texture · draw_batch
//! ```
//!
//! ## Contract
//!
//! - The GPU buffer has a fixed capacity set at construction. When the next
//!   object would not fit, it and everything after it are dropped for that
//!   rebuild, with a single warning. The buffer never grows.
//! - The whole batch uses the first object's texture. Objects with a
//!   different texture still contribute geometry but are drawn with that
//!   texture; a warning is logged once per rebuild. Use one batch per
//!   texture (an atlas makes this easy).
//! - Pre-transformed vertices go stale when the camera moves, so a camera
//!   change forces a rebuild.
//! - With culling on (the default), objects outside the camera's orthographic
//!   frustum are left out of the buffer. Bounds are inclusive. A perspective
//!   camera has no frustum and culls nothing. Toggling culling forces a
//!   rebuild.

use std::cell::RefCell;
use std::rc::Rc;

use crate::camera::Camera;
use crate::error::RenderError;
use crate::id::ObjectId;
use crate::math::{Mat4, Vec3};
use crate::object::SharedObject;
use crate::queue::ObjectQueue;
use crate::render::shader::U_MVP;
use crate::render::{BatchBufferId, RenderBackend, RenderStats, Shader, Texture, UniformWriter, Vertex};

/// Index capacity per vertex of capacity.
const INDICES_PER_VERTEX: u32 = 4;

/// What the last [`BatchRenderer::build_buffer`] produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Objects whose geometry made it into the buffer.
    pub batched: usize,
    /// Objects left out because the buffer was full.
    pub dropped: usize,
    /// Objects left out because they were outside the frustum.
    pub culled: usize,
    /// Objects whose texture differs from the batch texture.
    pub foreign_textures: usize,
}

/// Draws all queued objects in a single call from a CPU-built buffer.
#[derive(Debug)]
pub struct BatchRenderer {
    camera: Option<Rc<RefCell<Camera>>>,
    shader: Option<Rc<Shader>>,
    queue: ObjectQueue,
    buffer: BatchBufferId,
    max_vertices: u32,
    max_indices: u32,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    texture: Option<Rc<Texture>>,
    built_view_projection: Option<Mat4>,
    last_build: BuildSummary,
    frustum_culling: bool,
    needs_rebuild: bool,
    needs_send: bool,
}

impl BatchRenderer {
    /// Allocate a GPU buffer for `max_vertices` vertices.
    pub fn new(
        backend: &mut dyn RenderBackend,
        max_vertices: u32,
        camera: Rc<RefCell<Camera>>,
        shader: Rc<Shader>,
    ) -> Result<Self, RenderError> {
        let max_indices = max_vertices.saturating_mul(INDICES_PER_VERTEX);
        let buffer = backend.create_batch_buffer(max_vertices, max_indices)?;
        log::debug!("batch renderer: {max_vertices} vertices, {max_indices} indices");
        Ok(Self {
            camera: Some(camera),
            shader: Some(shader),
            queue: ObjectQueue::new(),
            buffer,
            max_vertices,
            max_indices,
            vertices: Vec::with_capacity(max_vertices as usize),
            indices: Vec::with_capacity(max_indices as usize),
            texture: None,
            built_view_projection: None,
            last_build: BuildSummary::default(),
            frustum_culling: true,
            needs_rebuild: true,
            needs_send: true,
        })
    }

    pub fn set_camera(&mut self, camera: Rc<RefCell<Camera>>) {
        self.camera = Some(camera);
        self.needs_rebuild = true;
    }

    pub fn set_shader(&mut self, shader: Rc<Shader>) {
        self.shader = Some(shader);
    }

    pub fn camera(&self) -> Option<&Rc<RefCell<Camera>>> {
        self.camera.as_ref()
    }

    pub fn add_object(&mut self, object: SharedObject) {
        self.queue.add(object);
        self.mark_dirty();
    }

    pub fn remove_object(&mut self, object: &SharedObject) {
        self.queue.remove(object);
        self.mark_dirty();
    }

    pub fn remove_object_by_id(&mut self, id: ObjectId) {
        self.queue.remove_by_id(id);
        self.mark_dirty();
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.mark_dirty();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.queue.contains(id)
    }

    pub fn max_vertices(&self) -> u32 {
        self.max_vertices
    }

    /// Built vertices (clip space).
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The texture the whole batch is drawn with.
    pub fn texture(&self) -> Option<&Rc<Texture>> {
        self.texture.as_ref()
    }

    pub fn last_build(&self) -> BuildSummary {
        self.last_build
    }

    /// `true` until the next [`build_buffer`](Self::build_buffer).
    pub fn needs_rebuild(&self) -> bool {
        self.needs_rebuild
    }

    /// Step animations by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.queue.update(dt);
    }

    fn mark_dirty(&mut self) {
        self.needs_rebuild = true;
        self.needs_send = true;
    }

    /// Rebuild the CPU-side buffer with culling on, if anything changed.
    /// Returns whether a rebuild happened.
    pub fn build_buffer(&mut self) -> bool {
        self.build_buffer_with_culling(true)
    }

    /// Rebuild the CPU-side buffer if anything changed, or if
    /// `frustum_culling` differs from the last build.
    pub fn build_buffer_with_culling(&mut self, frustum_culling: bool) -> bool {
        if self.frustum_culling != frustum_culling {
            self.frustum_culling = frustum_culling;
            self.needs_rebuild = true;
        }
        if !self.needs_rebuild {
            return false;
        }
        let (Some(camera), Some(_)) = (&self.camera, &self.shader) else {
            log::error!("batch renderer: cannot build without a shader and a camera");
            return false;
        };

        let (view_projection, frustum) = {
            let mut camera = camera.borrow_mut();
            if camera.needs_view_update() {
                camera.calculate_view_matrix();
            }
            (camera.view_projection(), camera.frustum())
        };
        let frustum = if frustum_culling { frustum } else { None };

        self.vertices.clear();
        self.indices.clear();
        self.texture = None;
        let mut summary = BuildSummary::default();
        let total = self.queue.len();

        for (position, object) in self.queue.iter().enumerate() {
            let mut object = object.borrow_mut();
            let Some(texture) = object.texture().cloned() else {
                continue;
            };

            if let Some(frustum) = &frustum {
                let (min, max) = object.transform().bounds();
                if !frustum.intersects(min, max) {
                    summary.culled += 1;
                    continue;
                }
            }

            let mesh = object.mesh().clone();
            let base = self.vertices.len() as u32;
            if self.vertices.len() + mesh.vertices().len() > self.max_vertices as usize
                || self.indices.len() + mesh.indices().len() > self.max_indices as usize
            {
                log::warn!(
                    "batch renderer: buffer limit of {} vertices reached, discarding {} objects",
                    self.max_vertices,
                    total - position
                );
                summary.dropped = total - position;
                break;
            }

            let transform = object.transform_mut();
            if transform.is_dirty() {
                transform.recalculate_world_matrix();
            }
            let mvp = view_projection * object.transform().world_matrix();

            match self.texture.as_ref().map(|t| t.id()) {
                None => self.texture = Some(texture),
                Some(batch_texture) if batch_texture != texture.id() => {
                    if summary.foreign_textures == 0 {
                        log::warn!(
                            "batch renderer: object {} uses a different texture than the batch",
                            object.id()
                        );
                    }
                    summary.foreign_textures += 1;
                }
                Some(_) => {}
            }

            self.indices
                .extend(mesh.indices().iter().map(|&index| base + index));
            self.vertices.extend(mesh.vertices().iter().map(|vertex| {
                let clip = mvp * Vec3::from(vertex.position).extend(1.0);
                Vertex::new(clip.truncate().to_array(), vertex.uv)
            }));
            summary.batched += 1;
        }

        log::trace!(
            "batch renderer: rebuilt {} vertices from {} objects, {} culled",
            self.vertices.len(),
            summary.batched,
            summary.culled
        );
        self.built_view_projection = Some(view_projection);
        self.last_build = summary;
        self.needs_rebuild = false;
        self.needs_send = true;
        true
    }

    /// Draw the batch with frustum culling on.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> RenderStats {
        self.render_with_culling(backend, true)
    }

    /// Rebuild if needed, upload if rebuilt, then draw everything in one
    /// call. An empty batch draws nothing.
    pub fn render_with_culling(&mut self, backend: &mut dyn RenderBackend, frustum_culling: bool) -> RenderStats {
        let mut stats = RenderStats::default();
        let (Some(camera), Some(shader)) = (self.camera.clone(), self.shader.clone()) else {
            log::error!("batch renderer: cannot render without a shader and a camera");
            return stats;
        };

        for object in self.queue.iter() {
            object.borrow_mut().prepare(backend);
        }
        if self.queue.any_dirty() {
            self.needs_rebuild = true;
        }
        {
            let mut camera = camera.borrow_mut();
            if camera.needs_view_update() {
                camera.calculate_view_matrix();
            }
            if self.built_view_projection != Some(camera.view_projection()) {
                self.needs_rebuild = true;
            }
        }
        self.build_buffer_with_culling(frustum_culling);

        stats.culled = self.last_build.culled as u32;
        if self.indices.is_empty() {
            return stats;
        }

        backend.use_shader(shader.id());
        if self.needs_send {
            backend.write_batch_buffer(self.buffer, &self.vertices, &self.indices);
            self.needs_send = false;
        }
        if let Some(texture) = &self.texture {
            texture.bind(backend, 0);
            stats.texture_binds += 1;
        }
        UniformWriter::new(&shader, backend).mat4(U_MVP, &Mat4::IDENTITY);
        backend.draw_batch(self.buffer, self.indices.len() as u32);

        stats.draw_calls = 1;
        stats.vertices = self.vertices.len() as u32;
        stats
    }
}
