//! Game entry point.
//!
//! [`Game`] owns the [`EngineConfig`] and runs the event loop with a first
//! [`GameState`]. Everything after that is driven by state transitions.
//!
//! # Example
//!
//! ```ignore
//! use kiln::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     env_logger::init();
//!     let config = EngineConfig::load_or_default("kiln.json");
//!     Game::new(config).run(TitleScreen::default())?;
//!     Ok(())
//! }
//! ```

use winit::error::EventLoopError;
use winit::event_loop::EventLoop;

use crate::config::EngineConfig;
use crate::state::GameState;
use crate::window::WinitApp;

/// Window, GPU and game loop, configured up front.
pub struct Game {
    config: EngineConfig,
}

impl Game {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Set the window title (builder pattern).
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = title.into();
        self
    }

    /// Open the window and run until the state stack empties or the window
    /// closes.
    pub fn run(self, initial: impl GameState + 'static) -> Result<(), EventLoopError> {
        log::info!(
            "starting {} at {}x{}",
            self.config.title,
            self.config.width,
            self.config.height
        );
        let event_loop = EventLoop::new()?;
        let mut app = WinitApp::new(self.config, Box::new(initial));
        event_loop.run_app(&mut app)
    }
}
