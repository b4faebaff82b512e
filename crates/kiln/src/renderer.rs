//! # Renderer — one draw call per object
//!
//! Each frame the renderer walks its queue in id order and, per object:
//!
//! 1. brings text textures up to date and recomputes a dirty world matrix,
//! 2. culls against the camera's ortho frustum (optional),
//! 3. rebinds the texture only if it differs from the previous object's,
//! 4. writes the MVP (and the split world/view/projection trio if the shader
//!    reads it) plus the object's own uniforms,
//! 5. issues one indexed draw of the object's mesh.
//!
//! One renderer has one shader. Scenes that mix shaders (say, plain sprites
//! and sprite-sheet animations) use one renderer per shader, drawn in
//! sequence.
//!
//! Texture-bind avoidance only compares neighbours in id order. Objects that
//! share a texture get the benefit when they were created back to back.

use std::cell::RefCell;
use std::rc::Rc;

use crate::camera::Camera;
use crate::id::ObjectId;
use crate::object::SharedObject;
use crate::queue::ObjectQueue;
use crate::render::shader::{U_MVP, U_PROJECTION, U_VIEW, U_WORLD};
use crate::render::{RenderBackend, RenderStats, Shader, TextureId, UniformWriter};

/// Draws each queued object with its own draw call.
#[derive(Debug, Default)]
pub struct Renderer {
    camera: Option<Rc<RefCell<Camera>>>,
    shader: Option<Rc<Shader>>,
    queue: ObjectQueue,
}

impl Renderer {
    pub fn new(camera: Rc<RefCell<Camera>>, shader: Rc<Shader>) -> Self {
        Self {
            camera: Some(camera),
            shader: Some(shader),
            queue: ObjectQueue::new(),
        }
    }

    pub fn set_camera(&mut self, camera: Rc<RefCell<Camera>>) {
        self.camera = Some(camera);
    }

    pub fn set_shader(&mut self, shader: Rc<Shader>) {
        self.shader = Some(shader);
    }

    pub fn camera(&self) -> Option<&Rc<RefCell<Camera>>> {
        self.camera.as_ref()
    }

    pub fn shader(&self) -> Option<&Rc<Shader>> {
        self.shader.as_ref()
    }

    /// Queue an object. An object already queued under the same id is
    /// replaced.
    pub fn add_object(&mut self, object: SharedObject) {
        if let Some(old) = self.queue.add(object) {
            log::debug!("renderer: replaced object {}", old.borrow().id());
        }
    }

    pub fn remove_object(&mut self, object: &SharedObject) {
        self.queue.remove(object);
    }

    pub fn remove_object_by_id(&mut self, id: ObjectId) {
        self.queue.remove_by_id(id);
    }

    /// Drop every queued object.
    pub fn clear(&mut self) {
        self.queue.clear();
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

    pub fn objects(&self) -> impl Iterator<Item = &SharedObject> {
        self.queue.iter()
    }

    /// Step animations by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        self.queue.update(dt);
    }

    /// Draw everything with frustum culling on.
    pub fn render(&mut self, backend: &mut dyn RenderBackend) -> RenderStats {
        self.render_with_culling(backend, true)
    }

    /// Draw everything. Without a shader or camera this logs an error and
    /// draws nothing.
    pub fn render_with_culling(&mut self, backend: &mut dyn RenderBackend, frustum_culling: bool) -> RenderStats {
        let mut stats = RenderStats::default();
        let (Some(camera), Some(shader)) = (&self.camera, &self.shader) else {
            log::error!("renderer: cannot render without a shader and a camera");
            return stats;
        };

        let (view, projection, frustum) = {
            let mut camera = camera.borrow_mut();
            if camera.needs_view_update() {
                camera.calculate_view_matrix();
            }
            (camera.view_matrix(), camera.projection_matrix(), camera.frustum())
        };
        let frustum = if frustum_culling { frustum } else { None };

        backend.use_shader(shader.id());
        let mut last_texture: Option<TextureId> = None;

        for object in self.queue.iter() {
            let mut object = object.borrow_mut();
            object.prepare(backend);

            let transform = object.transform_mut();
            if transform.is_dirty() {
                transform.recalculate_world_matrix();
            }

            if let Some(frustum) = &frustum {
                let (min, max) = object.transform().bounds();
                if !frustum.intersects(min, max) {
                    stats.culled += 1;
                    continue;
                }
            }

            let Some(texture) = object.texture() else {
                // Text with empty content.
                continue;
            };
            if last_texture != Some(texture.id()) {
                texture.bind(backend, 0);
                last_texture = Some(texture.id());
                stats.texture_binds += 1;
            }

            let world = object.transform().world_matrix();
            let mvp = projection * view * world;
            {
                let mut uniforms = UniformWriter::new(shader, backend);
                uniforms.mat4(U_MVP, &mvp);
                uniforms.mat4(U_WORLD, &world);
                uniforms.mat4(U_VIEW, &view);
                uniforms.mat4(U_PROJECTION, &projection);
                object.send_uniform_data(&mut uniforms);
            }

            let mesh = object.mesh();
            backend.draw_mesh(mesh.id(), mesh.index_count());
            stats.draw_calls += 1;
            stats.vertices += mesh.vertices().len() as u32;
        }

        log::trace!(
            "renderer: {} draws, {} binds, {} culled",
            stats.draw_calls,
            stats.texture_binds,
            stats.culled
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Vec3};
    use crate::object::tests::{BlockFont, quad, texture};
    use crate::object::{RenderObject, SpriteAnimation, Text};
    use crate::render::headless::{BackendCommand, HeadlessBackend};
    use crate::render::shader::{U_CURRENT_FRAME, U_FRAME_COUNT, reflect_uniforms};
    use crate::render::{ANIMATION_WGSL, SPRITE_WGSL};

    fn ortho_camera() -> Rc<RefCell<Camera>> {
        Rc::new(RefCell::new(Camera::orthographic(0.0, 960.0, 0.0, 540.0)))
    }

    fn sprite_renderer(backend: &mut HeadlessBackend) -> Renderer {
        let shader = backend.create_shader("sprite", SPRITE_WGSL).expect("shader");
        Renderer::new(ortho_camera(), Rc::new(shader))
    }

    fn mat_approx_eq(a: &Mat4, b: &Mat4) -> bool {
        a.to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
            .all(|(x, y)| (x - y).abs() < 0.001)
    }

    #[test]
    fn culls_offscreen_sprite() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let (mesh, tex) = (quad(&mut backend), texture(&mut backend));

        renderer.add_object(
            RenderObject::sprite(mesh.clone(), tex.clone())
                .sized(413.0, 360.0)
                .into_shared(),
        );
        renderer.add_object(
            RenderObject::sprite(mesh, tex)
                .at(1000.0, 1000.0)
                .sized(10.0, 10.0)
                .into_shared(),
        );
        backend.clear_commands();

        let stats = renderer.render(&mut backend);
        assert_eq!(backend.draw_calls(), 1);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.culled, 1);
    }

    #[test]
    fn culling_disabled_draws_everything() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let (mesh, tex) = (quad(&mut backend), texture(&mut backend));
        renderer.add_object(RenderObject::sprite(mesh.clone(), tex.clone()).into_shared());
        renderer.add_object(RenderObject::sprite(mesh, tex).at(5000.0, 0.0).into_shared());

        let stats = renderer.render_with_culling(&mut backend, false);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.culled, 0);
    }

    #[test]
    fn touching_frustum_edge_is_drawn() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let (mesh, tex) = (quad(&mut backend), texture(&mut backend));
        // max.x == frustum left
        renderer.add_object(
            RenderObject::sprite(mesh.clone(), tex.clone())
                .at(-10.0, 100.0)
                .sized(10.0, 10.0)
                .into_shared(),
        );
        // just past frustum right
        renderer.add_object(
            RenderObject::sprite(mesh, tex)
                .at(960.0 + 1e-3, 100.0)
                .sized(10.0, 10.0)
                .into_shared(),
        );

        let stats = renderer.render(&mut backend);
        assert_eq!(stats.draw_calls, 1, "edge contact counts as visible");
        assert_eq!(stats.culled, 1);
    }

    #[test]
    fn culling_follows_camera() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let (mesh, tex) = (quad(&mut backend), texture(&mut backend));
        renderer.add_object(
            RenderObject::sprite(mesh, tex)
                .at(1500.0, 100.0)
                .sized(10.0, 10.0)
                .into_shared(),
        );

        assert_eq!(renderer.render(&mut backend).draw_calls, 0);
        renderer
            .camera()
            .expect("camera")
            .borrow_mut()
            .translate(Vec3::new(1000.0, 0.0, 0.0));
        assert_eq!(renderer.render(&mut backend).draw_calls, 1);
    }

    #[test]
    fn perspective_camera_does_not_cull() {
        let mut backend = HeadlessBackend::new();
        let shader = Rc::new(backend.create_shader("sprite", SPRITE_WGSL).expect("shader"));
        let mut camera = Camera::new();
        camera.set_perspective_projection_default(16.0 / 9.0);
        let mut renderer = Renderer::new(Rc::new(RefCell::new(camera)), shader);
        let (mesh, tex) = (quad(&mut backend), texture(&mut backend));
        renderer.add_object(RenderObject::sprite(mesh, tex).at(1e6, 1e6).into_shared());

        assert_eq!(renderer.render(&mut backend).draw_calls, 1);
    }

    #[test]
    fn skips_rebind_for_adjacent_shared_texture() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let mesh = quad(&mut backend);
        let (a, b) = (texture(&mut backend), texture(&mut backend));
        for (id, tex) in [(1, &a), (2, &a), (3, &b), (4, &a)] {
            renderer.add_object(
                RenderObject::sprite(mesh.clone(), tex.clone())
                    .with_id(ObjectId::new(id))
                    .into_shared(),
            );
        }
        backend.clear_commands();

        let stats = renderer.render(&mut backend);
        assert_eq!(stats.draw_calls, 4);
        assert_eq!(backend.texture_binds(), vec![a.id(), b.id(), a.id()]);
        assert_eq!(stats.texture_binds, 3);
    }

    #[test]
    fn writes_mvp_from_camera_and_world() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let object = RenderObject::sprite(quad(&mut backend), texture(&mut backend))
            .at(100.0, 50.0)
            .sized(20.0, 10.0)
            .into_shared();
        renderer.add_object(object.clone());
        backend.clear_commands();

        renderer.render(&mut backend);

        let camera = renderer.camera().expect("camera").borrow();
        let expected = camera.projection_matrix() * camera.view_matrix() * object.borrow().transform().world_matrix();
        let mvp = backend
            .commands()
            .iter()
            .find_map(|c| match c {
                BackendCommand::SetUniformMat4 { value, .. } => Some(*value),
                _ => None,
            })
            .expect("mvp written");
        assert!(mat_approx_eq(&mvp, &expected));
        assert!(!object.borrow().transform().is_dirty(), "render recalculates dirty matrices");
    }

    #[test]
    fn animation_uniforms_follow_mvp() {
        let mut backend = HeadlessBackend::new();
        let shader = Rc::new(backend.create_shader("anim", ANIMATION_WGSL).expect("shader"));
        let mut renderer = Renderer::new(ortho_camera(), shader);
        let object = RenderObject::animation(
            quad(&mut backend),
            texture(&mut backend),
            SpriteAnimation::new(4, 0.1),
        )
        .into_shared();
        renderer.add_object(object);
        renderer.update(0.1);
        backend.clear_commands();

        renderer.render(&mut backend);
        let map = reflect_uniforms(ANIMATION_WGSL);
        let floats: Vec<_> = backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                BackendCommand::SetUniformF32 { location, value } => Some((*location, *value)),
                _ => None,
            })
            .collect();
        assert_eq!(floats, vec![(map[U_CURRENT_FRAME], 1.0), (map[U_FRAME_COUNT], 4.0)]);
        assert!(matches!(backend.commands().last(), Some(BackendCommand::DrawMesh { .. })));
    }

    #[test]
    fn missing_shader_or_camera_is_a_no_op() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = Renderer::default();
        renderer.add_object(RenderObject::sprite(quad(&mut backend), texture(&mut backend)).into_shared());
        backend.clear_commands();

        assert_eq!(renderer.render(&mut backend), RenderStats::default());
        assert!(backend.commands().is_empty());

        renderer.set_camera(ortho_camera());
        renderer.render(&mut backend);
        assert!(backend.commands().is_empty(), "still no shader");
    }

    #[test]
    fn replace_and_remove_by_id() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let (mesh, tex) = (quad(&mut backend), texture(&mut backend));
        let id = ObjectId::new(42);
        renderer.add_object(RenderObject::sprite(mesh.clone(), tex.clone()).with_id(id).into_shared());
        let replacement = RenderObject::sprite(mesh, tex).with_id(id).at(3.0, 4.0).into_shared();
        renderer.add_object(replacement.clone());

        assert_eq!(renderer.len(), 1);
        let queued = renderer.objects().next().expect("one object");
        assert!(Rc::ptr_eq(queued, &replacement));

        renderer.remove_object_by_id(id);
        assert!(renderer.is_empty());
    }

    #[test]
    fn text_is_rasterized_before_draw() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        let label = RenderObject::text(quad(&mut backend), Text::new("score", BlockFont::new(), 16.0)).into_shared();
        renderer.add_object(label.clone());

        let stats = renderer.render(&mut backend);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(label.borrow().transform().scale(), Vec3::new(40.0, 16.0, 1.0));

        label.borrow_mut().text_state_mut().expect("text").set_text("");
        assert_eq!(renderer.render(&mut backend).draw_calls, 0, "empty text draws nothing");
    }

    #[test]
    fn clear_empties_queue() {
        let mut backend = HeadlessBackend::new();
        let mut renderer = sprite_renderer(&mut backend);
        renderer.add_object(RenderObject::sprite(quad(&mut backend), texture(&mut backend)).into_shared());
        renderer.clear();
        assert!(renderer.is_empty());
        assert_eq!(renderer.render(&mut backend).draw_calls, 0);
    }
}
