//! # State — the game-state stack
//!
//! A game is a stack of [`GameState`]s: intro, menu, play, pause overlay and
//! so on. Only the top state updates and receives input; it asks for changes
//! by returning a [`Transition`].
//!
//! ```text
//!   Push(s)    top.pause()  →  s.init()          [.. top s]
//!   Pop        top.exit()   →  below.resume()    [.. below]
//!   Replace(s) top.exit()   →  s.init()          [.. s]
//!   Quit       every state exits, top first      []
//! ```
//!
//! Transitions apply after the callback that returned them has finished, so
//! a state never observes itself being paused or exited mid-update. The
//! machine is done when the stack is empty; the shell then closes the
//! window.

use crate::assets::ResourceManager;
use crate::config::EngineConfig;
use crate::error::ResourceError;
use crate::input::{InputState, KeyCode, MouseButton};
use crate::render::RenderBackend;

/// What the active state wants to happen next.
pub enum Transition {
    None,
    Push(Box<dyn GameState>),
    Pop,
    Replace(Box<dyn GameState>),
    Quit,
}

impl Transition {
    pub fn push(state: impl GameState + 'static) -> Self {
        Self::Push(Box::new(state))
    }

    pub fn replace(state: impl GameState + 'static) -> Self {
        Self::Replace(Box::new(state))
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Push(s) => write!(f, "Push({})", s.name()),
            Self::Pop => f.write_str("Pop"),
            Self::Replace(s) => write!(f, "Replace({})", s.name()),
            Self::Quit => f.write_str("Quit"),
        }
    }
}

/// What a state can reach while it runs.
pub struct StateContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub resources: &'a mut ResourceManager,
    pub input: &'a InputState,
    pub config: &'a EngineConfig,
    /// Drawable size in pixels.
    pub screen_size: (u32, u32),
}

/// One screen of the game.
///
/// Only `init`, `update` and `draw` are required. Input callbacks default to
/// doing nothing; polling [`StateContext::input`] in `update` works too.
pub trait GameState {
    /// Shown in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Load resources and build objects. A failing state is removed from
    /// the stack.
    fn init(&mut self, ctx: &mut StateContext<'_>) -> Result<(), ResourceError>;

    /// One fixed step of game logic.
    fn update(&mut self, ctx: &mut StateContext<'_>, dt: f32) -> Transition;

    /// Issue draw commands.
    fn draw(&mut self, backend: &mut dyn RenderBackend);

    /// Another state was pushed on top.
    fn pause(&mut self) {}

    /// The state above was popped.
    fn resume(&mut self) {}

    /// Leaving the stack for good.
    fn exit(&mut self) {}

    fn key_event(&mut self, _key: KeyCode, _pressed: bool) -> Transition {
        Transition::None
    }

    /// `x`, `y` are the cursor position in window pixels.
    fn mouse_event(&mut self, _button: MouseButton, _pressed: bool, _x: f32, _y: f32) -> Transition {
        Transition::None
    }

    fn mouse_moved(&mut self, _x: f32, _y: f32) {}

    fn resized(&mut self, _width: u32, _height: u32) {}
}

/// The state stack.
#[derive(Default)]
pub struct GameStateMachine {
    stack: Vec<Box<dyn GameState>>,
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the first state (or any state from outside a callback).
    pub fn start(&mut self, ctx: &mut StateContext<'_>, state: Box<dyn GameState>) {
        self.apply(ctx, Transition::Push(state));
    }

    /// `true` while there is a state to run.
    pub fn is_running(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Name of the top state.
    pub fn active_name(&self) -> Option<&str> {
        self.stack.last().map(|s| s.name())
    }

    pub fn update(&mut self, ctx: &mut StateContext<'_>, dt: f32) {
        if let Some(state) = self.stack.last_mut() {
            let transition = state.update(ctx, dt);
            self.apply(ctx, transition);
        }
    }

    pub fn draw(&mut self, backend: &mut dyn RenderBackend) {
        if let Some(state) = self.stack.last_mut() {
            state.draw(backend);
        }
    }

    pub fn key_event(&mut self, ctx: &mut StateContext<'_>, key: KeyCode, pressed: bool) {
        if let Some(state) = self.stack.last_mut() {
            let transition = state.key_event(key, pressed);
            self.apply(ctx, transition);
        }
    }

    pub fn mouse_event(&mut self, ctx: &mut StateContext<'_>, button: MouseButton, pressed: bool, x: f32, y: f32) {
        if let Some(state) = self.stack.last_mut() {
            let transition = state.mouse_event(button, pressed, x, y);
            self.apply(ctx, transition);
        }
    }

    pub fn mouse_moved(&mut self, x: f32, y: f32) {
        if let Some(state) = self.stack.last_mut() {
            state.mouse_moved(x, y);
        }
    }

    /// Every state hears about a resize, not just the top one.
    pub fn resized(&mut self, width: u32, height: u32) {
        for state in &mut self.stack {
            state.resized(width, height);
        }
    }

    /// Exit every state, top first.
    pub fn quit(&mut self) {
        while let Some(mut state) = self.stack.pop() {
            log::debug!("state '{}' exit", state.name());
            state.exit();
        }
    }

    fn apply(&mut self, ctx: &mut StateContext<'_>, transition: Transition) {
        match transition {
            Transition::None => {}
            Transition::Push(state) => {
                if let Some(top) = self.stack.last_mut() {
                    log::debug!("state '{}' pause", top.name());
                    top.pause();
                }
                self.enter(ctx, state);
            }
            Transition::Pop => self.pop(),
            Transition::Replace(state) => {
                if let Some(mut top) = self.stack.pop() {
                    log::debug!("state '{}' exit", top.name());
                    top.exit();
                }
                self.enter(ctx, state);
            }
            Transition::Quit => self.quit(),
        }
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>, mut state: Box<dyn GameState>) {
        log::info!("state '{}' init", state.name());
        match state.init(ctx) {
            Ok(()) => self.stack.push(state),
            Err(e) => {
                log::error!("state '{}' failed to init: {e}", state.name());
                state.exit();
                if let Some(top) = self.stack.last_mut() {
                    top.resume();
                }
            }
        }
    }

    fn pop(&mut self) {
        let Some(mut state) = self.stack.pop() else {
            return;
        };
        log::debug!("state '{}' exit", state.name());
        state.exit();
        if let Some(top) = self.stack.last_mut() {
            log::debug!("state '{}' resume", top.name());
            top.resume();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Records every callback and returns a scripted transition from `update`.
    struct Probe {
        tag: &'static str,
        log: Log,
        next: Option<Transition>,
        fail_init: bool,
    }

    impl Probe {
        fn new(tag: &'static str, log: &Log) -> Self {
            Self {
                tag,
                log: log.clone(),
                next: None,
                fail_init: false,
            }
        }

        fn then(mut self, transition: Transition) -> Self {
            self.next = Some(transition);
            self
        }

        fn record(&self, event: &str) {
            self.log.borrow_mut().push(format!("{}:{event}", self.tag));
        }
    }

    impl GameState for Probe {
        fn name(&self) -> &str {
            self.tag
        }

        fn init(&mut self, _ctx: &mut StateContext<'_>) -> Result<(), ResourceError> {
            self.record("init");
            if self.fail_init {
                return Err(ResourceError::NotFound(PathBuf::from("missing.png")));
            }
            Ok(())
        }

        fn update(&mut self, _ctx: &mut StateContext<'_>, _dt: f32) -> Transition {
            self.record("update");
            self.next.take().unwrap_or(Transition::None)
        }

        fn draw(&mut self, _backend: &mut dyn RenderBackend) {
            self.record("draw");
        }

        fn pause(&mut self) {
            self.record("pause");
        }

        fn resume(&mut self) {
            self.record("resume");
        }

        fn exit(&mut self) {
            self.record("exit");
        }

        fn key_event(&mut self, key: KeyCode, pressed: bool) -> Transition {
            if key == KeyCode::Escape && pressed {
                Transition::Pop
            } else {
                Transition::None
            }
        }
    }

    struct Harness {
        backend: HeadlessBackend,
        resources: ResourceManager,
        input: InputState,
        config: EngineConfig,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                backend: HeadlessBackend::new(),
                resources: ResourceManager::default(),
                input: InputState::new(),
                config: EngineConfig::default(),
            }
        }

        fn ctx(&mut self) -> StateContext<'_> {
            StateContext {
                backend: &mut self.backend,
                resources: &mut self.resources,
                input: &self.input,
                config: &self.config,
                screen_size: (960, 540),
            }
        }
    }

    fn drain(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn push_pauses_and_pop_resumes() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut machine = GameStateMachine::new();

        let menu = Probe::new("menu", &log).then(Transition::push(Probe::new("play", &log).then(Transition::Pop)));
        machine.start(&mut h.ctx(), Box::new(menu));
        machine.update(&mut h.ctx(), 0.016);
        assert_eq!(machine.depth(), 2);
        assert_eq!(machine.active_name(), Some("play"));
        assert_eq!(drain(&log), ["menu:init", "menu:update", "menu:pause", "play:init"]);

        machine.update(&mut h.ctx(), 0.016);
        assert_eq!(machine.active_name(), Some("menu"));
        assert_eq!(drain(&log), ["play:update", "play:exit", "menu:resume"]);
    }

    #[test]
    fn replace_exits_old_state() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut machine = GameStateMachine::new();
        let intro = Probe::new("intro", &log).then(Transition::replace(Probe::new("menu", &log)));
        machine.start(&mut h.ctx(), Box::new(intro));
        drain(&log);

        machine.update(&mut h.ctx(), 0.016);
        assert_eq!(machine.depth(), 1);
        assert_eq!(drain(&log), ["intro:update", "intro:exit", "menu:init"]);
    }

    #[test]
    fn popping_last_state_stops_machine() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut machine = GameStateMachine::new();
        machine.start(&mut h.ctx(), Box::new(Probe::new("only", &log)));
        assert!(machine.is_running());

        machine.key_event(&mut h.ctx(), KeyCode::Escape, true);
        assert!(!machine.is_running());
        assert_eq!(drain(&log), ["only:init", "only:exit"]);
    }

    #[test]
    fn quit_exits_every_state_top_first() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut machine = GameStateMachine::new();
        let bottom = Probe::new("bottom", &log).then(Transition::push(Probe::new("top", &log).then(Transition::Quit)));
        machine.start(&mut h.ctx(), Box::new(bottom));
        machine.update(&mut h.ctx(), 0.016);
        drain(&log);

        machine.update(&mut h.ctx(), 0.016);
        assert!(!machine.is_running());
        assert_eq!(drain(&log), ["top:update", "top:exit", "bottom:exit"]);
    }

    #[test]
    fn failed_init_is_not_pushed() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut machine = GameStateMachine::new();
        let mut broken = Probe::new("broken", &log);
        broken.fail_init = true;
        let menu = Probe::new("menu", &log).then(Transition::Push(Box::new(broken)));
        machine.start(&mut h.ctx(), Box::new(menu));
        drain(&log);

        machine.update(&mut h.ctx(), 0.016);
        assert_eq!(machine.active_name(), Some("menu"));
        assert_eq!(
            drain(&log),
            ["menu:update", "menu:pause", "broken:init", "broken:exit", "menu:resume"]
        );
    }

    #[test]
    fn only_top_state_updates_and_draws() {
        let log = Log::default();
        let mut h = Harness::new();
        let mut machine = GameStateMachine::new();
        let bottom = Probe::new("bottom", &log).then(Transition::push(Probe::new("top", &log)));
        machine.start(&mut h.ctx(), Box::new(bottom));
        machine.update(&mut h.ctx(), 0.016);
        drain(&log);

        machine.update(&mut h.ctx(), 0.016);
        machine.draw(&mut h.backend);
        assert_eq!(drain(&log), ["top:update", "top:draw"]);
    }
}
