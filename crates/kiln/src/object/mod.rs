//! # Objects — things a renderer can draw
//!
//! A [`RenderObject`] is a [`Transform`], a shared [`Mesh`], an optional
//! shared [`Texture`], and one of three kinds:
//!
//! | kind                         | per-frame work        | extra uniforms               |
//! |------------------------------|-----------------------|------------------------------|
//! | [`ObjectKind::Sprite2D`]     | none                  | none                         |
//! | [`ObjectKind::Animation`]    | step frames on update | `currentFrame`, `frameCount` |
//! | [`ObjectKind::Text`]         | re-rasterize if dirty | none                         |
//!
//! Objects are shared with renderers as [`SharedObject`]
//! (`Rc<RefCell<RenderObject>>`): the game state keeps a handle to move
//! things around, the renderer keeps one to draw them. An object is dropped
//! when the last handle goes away.
//!
//! Meshes and textures are `Rc` so many sprites can share one atlas. A text
//! object's texture is its own: it is rewritten in place when the string
//! changes, or replaced if something else still holds the old one.

pub mod animation;
pub mod text;

use std::cell::RefCell;
use std::rc::Rc;

pub use animation::SpriteAnimation;
pub use text::{Text, TextRasterizer};

use crate::error::TextError;
use crate::id::ObjectId;
use crate::math::{Transform, Vec3};
use crate::render::shader::{U_CURRENT_FRAME, U_FRAME_COUNT};
use crate::render::{Mesh, RenderBackend, Texture, UniformWriter};

/// A render object shared between a game state and a renderer.
pub type SharedObject = Rc<RefCell<RenderObject>>;

/// What kind of drawable an object is.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Sprite2D,
    Animation(SpriteAnimation),
    Text(Text),
}

/// A drawable: transform + mesh + texture + kind.
#[derive(Debug, Clone)]
pub struct RenderObject {
    id: ObjectId,
    transform: Transform,
    mesh: Rc<Mesh>,
    texture: Option<Rc<Texture>>,
    kind: ObjectKind,
}

impl RenderObject {
    /// A textured sprite with a generated id.
    pub fn sprite(mesh: Rc<Mesh>, texture: Rc<Texture>) -> Self {
        Self::new(mesh, Some(texture), ObjectKind::Sprite2D)
    }

    /// A sprite-sheet animation with a generated id.
    pub fn animation(mesh: Rc<Mesh>, texture: Rc<Texture>, animation: SpriteAnimation) -> Self {
        Self::new(mesh, Some(texture), ObjectKind::Animation(animation))
    }

    /// A text object with a generated id. It has no texture until its first
    /// [`update_text`](Self::update_text).
    pub fn text(mesh: Rc<Mesh>, text: Text) -> Self {
        Self::new(mesh, None, ObjectKind::Text(text))
    }

    fn new(mesh: Rc<Mesh>, texture: Option<Rc<Texture>>, kind: ObjectKind) -> Self {
        Self {
            id: ObjectId::next(),
            transform: Transform::default(),
            mesh,
            texture,
            kind,
        }
    }

    /// Replace the generated id with an explicit one.
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    /// Builder form of [`set_position`](Self::set_position).
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.set_position_xy(x, y);
        self
    }

    /// Builder form of [`set_size`](Self::set_size).
    pub fn sized(mut self, width: f32, height: f32) -> Self {
        self.transform.set_scale_xy(width, height);
        self
    }

    /// Wrap in `Rc<RefCell<_>>` for sharing with a renderer.
    pub fn into_shared(self) -> SharedObject {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.set_position(position);
    }

    pub fn set_position_xy(&mut self, x: f32, y: f32) {
        self.transform.set_position_xy(x, y);
    }

    pub fn set_rotation(&mut self, degrees: Vec3) {
        self.transform.set_rotation(degrees);
    }

    pub fn set_rotation_z(&mut self, degrees: f32) {
        self.transform.set_rotation_z(degrees);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.transform.set_scale(scale);
    }

    /// Size in world units. With the unit quad this is the on-screen size.
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.transform.set_scale_xy(width, height);
    }

    pub fn mesh(&self) -> &Rc<Mesh> {
        &self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Rc<Mesh>) {
        self.mesh = mesh;
    }

    pub fn texture(&self) -> Option<&Rc<Texture>> {
        self.texture.as_ref()
    }

    pub fn set_texture(&mut self, texture: Rc<Texture>) {
        self.texture = Some(texture);
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    pub fn animation_state(&self) -> Option<&SpriteAnimation> {
        match &self.kind {
            ObjectKind::Animation(anim) => Some(anim),
            _ => None,
        }
    }

    pub fn animation_state_mut(&mut self) -> Option<&mut SpriteAnimation> {
        match &mut self.kind {
            ObjectKind::Animation(anim) => Some(anim),
            _ => None,
        }
    }

    pub fn text_state(&self) -> Option<&Text> {
        match &self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn text_state_mut(&mut self) -> Option<&mut Text> {
        match &mut self.kind {
            ObjectKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Per-frame logic. Only animations do anything here.
    pub fn update(&mut self, dt: f32) {
        if let ObjectKind::Animation(anim) = &mut self.kind {
            anim.update(dt);
        }
    }

    /// Write kind-specific uniforms. Called by the renderer after the
    /// transform uniforms, right before the draw.
    pub fn send_uniform_data(&self, uniforms: &mut UniformWriter<'_>) {
        if let ObjectKind::Animation(anim) = &self.kind {
            uniforms.f32(U_CURRENT_FRAME, anim.current_frame() as f32);
            uniforms.f32(U_FRAME_COUNT, anim.frame_count() as f32);
        }
    }

    /// Re-rasterize a dirty text object into its texture and resize the
    /// transform to the pixel size of the result.
    ///
    /// Returns `Ok(false)` when there was nothing to do. On error the old
    /// texture stays in place and the text stays dirty, so the next call
    /// retries.
    pub fn update_text(&mut self, backend: &mut dyn RenderBackend) -> Result<bool, TextError> {
        let ObjectKind::Text(text) = &mut self.kind else {
            return Ok(false);
        };
        if !text.needs_update() {
            return Ok(false);
        }

        if text.text().is_empty() {
            self.texture = None;
            text.mark_clean();
            return Ok(true);
        }

        let pixels = text
            .font()
            .rasterize(text.text(), text.font_size(), text.color())?;
        let (width, height) = (pixels.width, pixels.height);
        if width == 0 || height == 0 {
            return Err(TextError::EmptyOutput(text.text().to_owned()));
        }
        let rgba = pixels.into_tight_rgba()?;

        match self.texture.as_mut().and_then(Rc::get_mut) {
            Some(texture) => texture.update(backend, width, height, &rgba, text.filter_mode())?,
            None => {
                let texture = Texture::from_rgba(backend, "text", width, height, &rgba, text.filter_mode())?;
                self.texture = Some(Rc::new(texture));
            }
        }

        self.transform
            .set_scale(Vec3::new(width as f32, height as f32, 1.0));
        text.mark_clean();
        Ok(true)
    }

    /// Bring GPU-side state up to date before drawing. Failures are logged.
    pub(crate) fn prepare(&mut self, backend: &mut dyn RenderBackend) {
        if let Err(e) = self.update_text(backend) {
            log::error!("text object {} failed to update: {e}", self.id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::color::Color;
    use crate::render::headless::{BackendCommand, HeadlessBackend};
    use crate::render::shader::reflect_uniforms;
    use crate::render::{ANIMATION_WGSL, FilterMode, MeshData, PixelBuffer, RenderBackend, SPRITE_WGSL};
    use std::cell::Cell;

    /// Renders every string as a `len * 8` by `size` block. Fails on "fail".
    pub(crate) struct BlockFont {
        pub calls: Cell<u32>,
    }

    impl BlockFont {
        pub(crate) fn new() -> Rc<Self> {
            Rc::new(Self { calls: Cell::new(0) })
        }
    }

    impl TextRasterizer for BlockFont {
        fn rasterize(&self, text: &str, size_px: f32, color: Color) -> Result<PixelBuffer, TextError> {
            self.calls.set(self.calls.get() + 1);
            if text == "fail" {
                return Err(TextError::EmptyOutput(text.to_owned()));
            }
            let width = text.len() as u32 * 8;
            let height = size_px as u32;
            let px = color.to_rgba8();
            let data = px.repeat((width * height) as usize);
            Ok(PixelBuffer::rgba(width, height, data))
        }
    }

    pub(crate) fn quad(backend: &mut HeadlessBackend) -> Rc<Mesh> {
        Rc::new(Mesh::upload(backend, "quad", MeshData::quad()).expect("upload"))
    }

    pub(crate) fn texture(backend: &mut HeadlessBackend) -> Rc<Texture> {
        Rc::new(Texture::from_rgba(backend, "tex", 1, 1, &[255; 4], FilterMode::Nearest).expect("texture"))
    }

    #[test]
    fn sprite_sends_no_extra_uniforms() {
        let mut backend = HeadlessBackend::new();
        let sprite = RenderObject::sprite(quad(&mut backend), texture(&mut backend));
        let shader = backend.create_shader("anim", ANIMATION_WGSL).expect("shader");
        backend.clear_commands();

        sprite.send_uniform_data(&mut UniformWriter::new(&shader, &mut backend));
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn animation_sends_frame_uniforms() {
        let mut backend = HeadlessBackend::new();
        let mut obj = RenderObject::animation(
            quad(&mut backend),
            texture(&mut backend),
            SpriteAnimation::new(6, 0.1),
        );
        obj.update(0.1);
        obj.update(0.1);
        let shader = backend.create_shader("anim", ANIMATION_WGSL).expect("shader");
        backend.clear_commands();

        obj.send_uniform_data(&mut UniformWriter::new(&shader, &mut backend));
        let map = reflect_uniforms(ANIMATION_WGSL);
        assert_eq!(
            backend.commands(),
            &[
                BackendCommand::SetUniformF32 {
                    location: map[U_CURRENT_FRAME],
                    value: 2.0
                },
                BackendCommand::SetUniformF32 {
                    location: map[U_FRAME_COUNT],
                    value: 6.0
                },
            ]
        );
    }

    #[test]
    fn animation_uniforms_skipped_by_plain_shader() {
        let mut backend = HeadlessBackend::new();
        let obj = RenderObject::animation(
            quad(&mut backend),
            texture(&mut backend),
            SpriteAnimation::new(6, 0.1),
        );
        let shader = backend.create_shader("sprite", SPRITE_WGSL).expect("shader");
        backend.clear_commands();

        obj.send_uniform_data(&mut UniformWriter::new(&shader, &mut backend));
        assert!(backend.commands().is_empty(), "sprite shader has no frame uniforms");
    }

    #[test]
    fn explicit_id_overrides_generated() {
        let mut backend = HeadlessBackend::new();
        let obj = RenderObject::sprite(quad(&mut backend), texture(&mut backend)).with_id(ObjectId::new(9000));
        assert_eq!(obj.id(), ObjectId::new(9000));
    }

    #[test]
    fn text_rasterizes_and_resizes() {
        let mut backend = HeadlessBackend::new();
        let font = BlockFont::new();
        let mut obj = RenderObject::text(quad(&mut backend), Text::new("hello", font.clone(), 16.0));
        assert!(obj.texture().is_none());

        assert!(obj.update_text(&mut backend).expect("rasterize"));
        let texture = obj.texture().expect("texture created").clone();
        assert_eq!((texture.width(), texture.height()), (40, 16));
        assert_eq!(obj.transform().scale(), Vec3::new(40.0, 16.0, 1.0));
        assert!(!obj.text_state().expect("text").needs_update());

        // Clean text is a no-op.
        assert!(!obj.update_text(&mut backend).expect("no-op"));
        assert_eq!(font.calls.get(), 1);
    }

    #[test]
    fn text_reuses_its_texture() {
        let mut backend = HeadlessBackend::new();
        let mut obj = RenderObject::text(quad(&mut backend), Text::new("hi", BlockFont::new(), 10.0));
        obj.update_text(&mut backend).expect("first");
        let first_id = obj.texture().expect("texture").id();

        obj.text_state_mut().expect("text").set_text("longer");
        obj.update_text(&mut backend).expect("second");
        assert_eq!(obj.texture().expect("texture").id(), first_id);
        assert_eq!(backend.texture_size(first_id), Some((48, 10)));
        assert!(backend
            .commands()
            .iter()
            .any(|c| matches!(c, BackendCommand::UpdateTexture { id, .. } if *id == first_id)));
    }

    #[test]
    fn text_failure_keeps_old_texture_and_retries() {
        let mut backend = HeadlessBackend::new();
        let font = BlockFont::new();
        let mut obj = RenderObject::text(quad(&mut backend), Text::new("ok", font.clone(), 8.0));
        obj.update_text(&mut backend).expect("first");
        let before = obj.texture().expect("texture").clone();

        obj.text_state_mut().expect("text").set_text("fail");
        assert!(obj.update_text(&mut backend).is_err());
        assert_eq!(obj.texture().map(|t| t.id()), Some(before.id()));
        assert_eq!(obj.transform().scale(), Vec3::new(16.0, 8.0, 1.0));
        assert!(obj.text_state().expect("text").needs_update(), "dirty flag must survive failure");

        assert!(obj.update_text(&mut backend).is_err());
        assert_eq!(font.calls.get(), 3, "each call retries");
    }

    #[test]
    fn text_setters_mark_dirty() {
        let mut backend = HeadlessBackend::new();
        let mut obj = RenderObject::text(quad(&mut backend), Text::new("a", BlockFont::new(), 8.0));
        obj.update_text(&mut backend).expect("rasterize");

        let text = obj.text_state_mut().expect("text");
        text.set_color(Color::RED);
        assert!(text.needs_update());
        text.mark_clean();
        text.set_font_size(12.0);
        assert!(text.needs_update());
        text.mark_clean();
        text.set_filter_mode(FilterMode::Nearest);
        assert!(text.needs_update());
        text.mark_clean();
        text.set_font(BlockFont::new());
        assert!(text.needs_update());
    }

    #[test]
    fn text_size_follows_on_update_not_on_set() {
        let mut backend = HeadlessBackend::new();
        let mut obj = RenderObject::text(quad(&mut backend), Text::new("hi", BlockFont::new(), 10.0));
        obj.update_text(&mut backend).expect("first");
        assert_eq!(obj.transform().scale(), Vec3::new(16.0, 10.0, 1.0));

        obj.text_state_mut().expect("text").set_text("longer");
        assert_eq!(obj.transform().scale(), Vec3::new(16.0, 10.0, 1.0), "setter does not rasterize");

        obj.update_text(&mut backend).expect("second");
        assert_eq!(obj.transform().scale(), Vec3::new(48.0, 10.0, 1.0));
    }

    #[test]
    fn empty_text_drops_texture() {
        let mut backend = HeadlessBackend::new();
        let mut obj = RenderObject::text(quad(&mut backend), Text::new("abc", BlockFont::new(), 8.0));
        obj.update_text(&mut backend).expect("rasterize");
        obj.text_state_mut().expect("text").set_text("");
        assert!(obj.update_text(&mut backend).expect("empty is fine"));
        assert!(obj.texture().is_none());
    }
}
