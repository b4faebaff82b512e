//! Text — a title, and a click counter that re-rasterizes when it changes.
//!
//! Needs a TTF font in the configured font directory:
//!
//! ```text
//! cargo run --example text -- DejaVuSans.ttf
//! ```
//!
//! Click anywhere to bump the counter. Escape quits.

use std::cell::RefCell;
use std::rc::Rc;

use kiln::assets::{QUAD, SPRITE_SHADER};
use kiln::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let font = std::env::args().nth(1).unwrap_or_else(|| "DejaVuSans.ttf".to_owned());
    let config = EngineConfig::load_or_default("kiln.json");
    Game::new(config)
        .title("kiln — text")
        .run(Labels::new(font))?;
    Ok(())
}

struct Labels {
    font: String,
    renderer: Renderer,
    counter: Option<SharedObject>,
    clicks: u32,
}

impl Labels {
    fn new(font: String) -> Self {
        Self {
            font,
            renderer: Renderer::default(),
            counter: None,
            clicks: 0,
        }
    }
}

impl GameState for Labels {
    fn init(&mut self, ctx: &mut StateContext<'_>) -> Result<(), ResourceError> {
        let face = match ctx.resources.load_font(&self.font) {
            Ok(face) => face,
            Err(e) => {
                log::error!("{e}; pass a font file from {}", ctx.resources.paths().fonts.display());
                return Err(e);
            }
        };
        let font: Rc<dyn TextRasterizer> = face;

        let (width, height) = ctx.screen_size;
        let camera = Rc::new(RefCell::new(Camera::orthographic(
            0.0,
            width as f32,
            0.0,
            height as f32,
        )));
        let quad = ctx.resources.load_mesh(ctx.backend, QUAD)?;
        let shader = ctx.resources.load_shader(ctx.backend, SPRITE_SHADER)?;
        self.renderer.set_camera(camera);
        self.renderer.set_shader(shader);

        let mut title = Text::new("kiln", font.clone(), 72.0);
        title.set_color(Color::rgb(0.85, 0.35, 0.1));
        let title = RenderObject::text(quad.clone(), title).at(40.0, 40.0);
        self.renderer.add_object(title.into_shared());

        let counter = RenderObject::text(quad, Text::new("clicks: 0", font, 32.0))
            .at(40.0, 160.0)
            .into_shared();
        self.renderer.add_object(counter.clone());
        self.counter = Some(counter);
        Ok(())
    }

    fn update(&mut self, ctx: &mut StateContext<'_>, dt: f32) -> Transition {
        if ctx.input.keys.just_pressed(KeyCode::Escape) {
            return Transition::Quit;
        }
        self.renderer.update(dt);
        Transition::None
    }

    fn mouse_event(&mut self, button: MouseButton, pressed: bool, _x: f32, _y: f32) -> Transition {
        if button == MouseButton::Left && pressed {
            self.clicks += 1;
            if let Some(counter) = &self.counter {
                if let Some(text) = counter.borrow_mut().text_state_mut() {
                    text.set_text(format!("clicks: {}", self.clicks));
                }
            }
        }
        Transition::None
    }

    fn draw(&mut self, backend: &mut dyn RenderBackend) {
        self.renderer.render(backend);
    }
}
