//! # Kiln — 2D game framework core
//!
//! Sprites, sprite-sheet animations and text drawn through two renderers:
//!
//! - [`Renderer`](renderer::Renderer) issues one draw per object, culls
//!   against the orthographic camera, and skips redundant texture binds.
//! - [`BatchRenderer`](batch::BatchRenderer) pre-transforms every vertex on
//!   the CPU into one fixed-capacity buffer and draws it in a single call.
//!
//! Both talk to the GPU through [`RenderBackend`](render::RenderBackend), so
//! everything above the backend runs against
//! [`HeadlessBackend`](render::HeadlessBackend) in tests.
//!
//! Start with `use kiln::prelude::*` and hand a [`GameState`](state::GameState)
//! to [`Game::run`](game::Game::run).

pub mod assets;
pub mod batch;
pub mod camera;
pub mod color;
pub mod config;
pub mod error;
#[cfg(feature = "text")]
pub mod font;
pub mod game;
pub mod id;
pub mod input;
pub mod math;
pub mod object;
pub mod prelude;
pub mod queue;
pub mod render;
pub mod renderer;
pub mod state;
pub mod time;
pub(crate) mod window;
