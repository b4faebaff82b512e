//! Window management via winit.
//!
//! Implements [`winit::application::ApplicationHandler`] to drive the event
//! loop: window and GPU creation, input forwarding, resize, and the frame
//! (fixed-step updates, draw, present).

use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::assets::ResourceManager;
use crate::config::EngineConfig;
use crate::input::InputState;
use crate::render::{GpuContext, WgpuBackend};
use crate::state::{GameState, GameStateMachine, StateContext};
use crate::time::{FixedTimestep, Time};

/// Everything that exists only once the window is open.
struct Surface {
    window: Arc<Window>,
    gpu: GpuContext,
    backend: WgpuBackend,
}

/// The application state that winit drives.
pub(crate) struct WinitApp {
    config: EngineConfig,
    initial: Option<Box<dyn GameState>>,
    surface: Option<Surface>,
    resources: ResourceManager,
    machine: GameStateMachine,
    input: InputState,
    time: Time,
    fixed: FixedTimestep,
}

impl WinitApp {
    pub fn new(config: EngineConfig, initial: Box<dyn GameState>) -> Self {
        let resources = ResourceManager::new(config.resources.clone());
        let fixed = FixedTimestep::new(config.fixed_timestep, config.max_steps_per_frame);
        Self {
            config,
            initial: Some(initial),
            surface: None,
            resources,
            machine: GameStateMachine::new(),
            input: InputState::new(),
            time: Time::new(),
            fixed,
        }
    }

    fn open(&self, event_loop: &ActiveEventLoop) -> Option<Surface> {
        let attrs = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                return None;
            }
        };
        let gpu = match GpuContext::new(window.clone(), self.config.vsync) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("failed to initialize GPU: {e}");
                return None;
            }
        };
        let backend = WgpuBackend::new(&gpu);
        Some(Surface { window, gpu, backend })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        self.time.update();
        let steps = self.fixed.accumulate(self.time.delta_secs());
        let dt = self.fixed.step();
        {
            let mut ctx = StateContext {
                backend: &mut surface.backend,
                resources: &mut self.resources,
                input: &self.input,
                config: &self.config,
                screen_size: surface.gpu.surface_size(),
            };
            for _ in 0..steps {
                self.machine.update(&mut ctx, dt);
                if !self.machine.is_running() {
                    break;
                }
            }
        }
        self.input.end_frame();

        if !self.machine.is_running() {
            log::info!("no game state left, exiting");
            event_loop.exit();
            return;
        }

        self.machine.draw(&mut surface.backend);
        match surface.backend.present(&surface.gpu, self.config.clear_color) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = surface.gpu.surface_size();
                surface.gpu.resize(w, h);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory");
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("surface error: {e:?}"),
        }

        surface.window.request_redraw();
    }
}

impl ApplicationHandler for WinitApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_none() {
            match self.open(event_loop) {
                Some(surface) => self.surface = Some(surface),
                None => {
                    event_loop.exit();
                    return;
                }
            }
        }

        if let (Some(initial), Some(surface)) = (self.initial.take(), self.surface.as_mut()) {
            let mut ctx = StateContext {
                backend: &mut surface.backend,
                resources: &mut self.resources,
                input: &self.input,
                config: &self.config,
                screen_size: surface.gpu.surface_size(),
            };
            self.machine.start(&mut ctx, initial);
            surface.window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested, exiting");
                self.machine.quit();
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                surface.gpu.resize(size.width, size.height);
                self.machine.resized(size.width, size.height);
            }

            WindowEvent::Focused(false) => self.input.reset(),

            WindowEvent::KeyboardInput { event, .. } => {
                let PhysicalKey::Code(key) = event.physical_key else {
                    return;
                };
                let pressed = event.state == ElementState::Pressed;
                let changed = if pressed {
                    self.input.keys.press(key)
                } else {
                    self.input.keys.release(key)
                };
                if changed {
                    let mut ctx = StateContext {
                        backend: &mut surface.backend,
                        resources: &mut self.resources,
                        input: &self.input,
                        config: &self.config,
                        screen_size: surface.gpu.surface_size(),
                    };
                    self.machine.key_event(&mut ctx, key, pressed);
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                if pressed {
                    self.input.mouse.press(button);
                } else {
                    self.input.mouse.release(button);
                }
                let cursor = self.input.cursor;
                let mut ctx = StateContext {
                    backend: &mut surface.backend,
                    resources: &mut self.resources,
                    input: &self.input,
                    config: &self.config,
                    screen_size: surface.gpu.surface_size(),
                };
                self.machine
                    .mouse_event(&mut ctx, button, pressed, cursor.x, cursor.y);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.input.cursor.x = position.x as f32;
                self.input.cursor.y = position.y as f32;
                self.machine
                    .mouse_moved(self.input.cursor.x, self.input.cursor.y);
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }

        if !self.machine.is_running() && self.initial.is_none() {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.machine.quit();
        self.resources.free_all();
        log::info!("shutdown after {} frames", self.time.frame_count());
    }
}
