//! Convenience re-exports — `use kiln::prelude::*` for the common items.

// Core
pub use crate::assets::ResourceManager;
pub use crate::camera::{Camera, OrthoFrustum, Projection};
pub use crate::color::Color;
pub use crate::config::{EngineConfig, ResourcePaths};
pub use crate::error::{ConfigError, RenderError, ResourceError, TextError};
pub use crate::game::Game;
pub use crate::id::ObjectId;
pub use crate::input::{CursorPosition, Input, InputState, KeyCode, MouseButton};
pub use crate::math::{Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::state::{GameState, GameStateMachine, StateContext, Transition};
pub use crate::time::{FixedTimestep, Time};

// Drawables
pub use crate::object::{
    ObjectKind, RenderObject, SharedObject, SpriteAnimation, Text, TextRasterizer,
};

// Rendering
pub use crate::batch::{BatchRenderer, BuildSummary};
pub use crate::render::{
    FilterMode, HeadlessBackend, Mesh, MeshData, RenderBackend, RenderStats, Shader, Texture,
};
pub use crate::renderer::Renderer;

#[cfg(feature = "text")]
pub use crate::font::FontFace;
