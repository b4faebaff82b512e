//! Sprites — a per-object renderer, a batch of tiles and an animated sprite.
//!
//! Arrow keys pan the camera. Space toggles culling. Escape quits.
//! Textures are generated in code so the demo needs no files on disk.

use std::cell::RefCell;
use std::rc::Rc;

use kiln::assets::{ANIMATION_SHADER, QUAD, SPRITE_SHADER};
use kiln::prelude::*;

const TILE: f32 = 48.0;
const PAN_SPEED: f32 = 240.0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = EngineConfig::load_or_default("kiln.json");
    Game::new(config).title("kiln — sprites").run(Sprites::default())?;
    Ok(())
}

/// Checkerboard RGBA pixels, `cells` squares per side.
fn checker(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Vec<u8> {
    let cell = (size / cells).max(1);
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let even = ((x / cell) + (y / cell)) % 2 == 0;
            rgba.extend_from_slice(if even { &a } else { &b });
        }
    }
    rgba
}

/// A horizontal strip of `frames` solid-colored cells.
fn strip(frame_size: u32, frames: u32) -> Vec<u8> {
    let width = frame_size * frames;
    let mut rgba = Vec::with_capacity((width * frame_size * 4) as usize);
    for _ in 0..frame_size {
        for x in 0..width {
            let shade = (255 * (x / frame_size + 1) / frames) as u8;
            rgba.extend_from_slice(&[shade, 64, 255 - shade, 255]);
        }
    }
    rgba
}

fn upload(
    ctx: &mut StateContext<'_>,
    name: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> Result<Rc<Texture>, ResourceError> {
    let texture = Texture::from_rgba(ctx.backend, name, width, height, rgba, FilterMode::Nearest)
        .map_err(|source| ResourceError::Render {
            name: name.to_string(),
            source,
        })?;
    let texture = Rc::new(texture);
    ctx.resources.insert_texture(name, texture.clone());
    Ok(texture)
}

#[derive(Default)]
struct Sprites {
    camera: Option<Rc<RefCell<Camera>>>,
    renderer: Renderer,
    animated: Option<Renderer>,
    tiles: Option<BatchRenderer>,
    culling: bool,
    last: RenderStats,
}

impl GameState for Sprites {
    fn init(&mut self, ctx: &mut StateContext<'_>) -> Result<(), ResourceError> {
        let (width, height) = ctx.screen_size;
        let camera = Rc::new(RefCell::new(Camera::orthographic(
            0.0,
            width as f32,
            0.0,
            height as f32,
        )));

        let quad = ctx.resources.load_mesh(ctx.backend, QUAD)?;
        let sprite_shader = ctx.resources.load_shader(ctx.backend, SPRITE_SHADER)?;
        let animation_shader = ctx.resources.load_shader(ctx.backend, ANIMATION_SHADER)?;

        let crate_tex = upload(ctx, "crate", 32, 32, &checker(32, 4, [180, 120, 60, 255], [120, 80, 40, 255]))?;
        let grass = upload(ctx, "grass", 16, 16, &checker(16, 2, [60, 160, 60, 255], [40, 120, 40, 255]))?;
        let sheet = upload(ctx, "sheet", 32 * 6, 32, &strip(32, 6))?;

        // Ground: one batch of tiles along the bottom edge.
        let mut tiles = BatchRenderer::new(
            ctx.backend,
            ctx.config.batch_capacity,
            camera.clone(),
            sprite_shader.clone(),
        )
        .map_err(|source| ResourceError::Render {
            name: "tiles".to_string(),
            source,
        })?;
        let columns = (width as f32 / TILE).ceil() as u32 * 2;
        for column in 0..columns {
            let tile = RenderObject::sprite(quad.clone(), grass.clone())
                .at(column as f32 * TILE, height as f32 - TILE)
                .sized(TILE, TILE);
            tiles.add_object(tile.into_shared());
        }

        // Crates scattered across a world wider than the screen.
        self.renderer.set_camera(camera.clone());
        self.renderer.set_shader(sprite_shader);
        for i in 0..12 {
            let x = 80.0 + i as f32 * 150.0;
            let y = 120.0 + (i % 3) as f32 * 110.0;
            let object = ctx.resources.sprite(ctx.backend, crate_tex.clone())?.at(x, y).sized(64.0, 64.0);
            self.renderer.add_object(object.into_shared());
        }

        // The animated sprite draws with its own shader, so it gets its own renderer.
        let mut animated = Renderer::new(camera.clone(), animation_shader);
        let runner = RenderObject::animation(quad, sheet, SpriteAnimation::new(6, 0.12))
            .at(width as f32 / 2.0 - 48.0, height as f32 / 2.0 - 48.0)
            .sized(96.0, 96.0);
        animated.add_object(runner.into_shared());
        self.animated = Some(animated);

        self.tiles = Some(tiles);
        self.camera = Some(camera);
        self.culling = true;
        log::info!("sprites ready: {} crates, {} tiles", self.renderer.len(), columns);
        Ok(())
    }

    fn update(&mut self, ctx: &mut StateContext<'_>, dt: f32) -> Transition {
        if ctx.input.keys.just_pressed(KeyCode::Escape) {
            return Transition::Quit;
        }
        if ctx.input.keys.just_pressed(KeyCode::Space) {
            self.culling = !self.culling;
            log::info!("culling {}", if self.culling { "on" } else { "off" });
        }

        let mut pan = Vec3::ZERO;
        if ctx.input.keys.pressed(KeyCode::ArrowLeft) {
            pan.x -= 1.0;
        }
        if ctx.input.keys.pressed(KeyCode::ArrowRight) {
            pan.x += 1.0;
        }
        if ctx.input.keys.pressed(KeyCode::ArrowUp) {
            pan.y -= 1.0;
        }
        if ctx.input.keys.pressed(KeyCode::ArrowDown) {
            pan.y += 1.0;
        }
        if pan != Vec3::ZERO {
            if let Some(camera) = &self.camera {
                let mut camera = camera.borrow_mut();
                let offset = pan * PAN_SPEED * dt;
                let (position, target) = (camera.position(), camera.target());
                camera.set_position(position + offset);
                camera.set_target(target + offset);
            }
        }

        self.renderer.update(dt);
        if let Some(animated) = self.animated.as_mut() {
            animated.update(dt);
        }
        Transition::None
    }

    fn draw(&mut self, backend: &mut dyn RenderBackend) {
        let mut stats = RenderStats::default();
        if let Some(tiles) = self.tiles.as_mut() {
            stats += tiles.render_with_culling(backend, self.culling);
        }
        stats += self.renderer.render_with_culling(backend, self.culling);
        if let Some(animated) = self.animated.as_mut() {
            stats += animated.render(backend);
        }
        if stats != self.last {
            log::debug!("{stats:?}");
            self.last = stats;
        }
    }

    fn exit(&mut self) {
        log::info!("sprites done");
    }
}
