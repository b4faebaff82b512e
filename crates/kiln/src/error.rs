//! Error types.
//!
//! Construction and loading return these through `Result`. The per-frame
//! paths (`Renderer::render`, `BatchRenderer::render`, `RenderObject::update_text`)
//! never return them: they log and keep drawing what they can.

use std::path::PathBuf;

use thiserror::Error;

use crate::render::mesh::MeshParseError;

/// GPU and backend failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No compatible adapter was found.
    #[error("failed to request GPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// The adapter refused to create a device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreateFailed(String),

    /// The window surface could not be created.
    #[error("failed to create surface: {0}")]
    SurfaceCreateFailed(String),

    /// WGSL failed validation or the pipeline could not be built.
    #[error("shader '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    /// A handle was used with a backend that never issued it.
    #[error("unknown {kind} handle {id}")]
    UnknownHandle { kind: &'static str, id: u32 },

    /// Pixel data does not match the declared dimensions.
    #[error("texture data is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    TextureSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Zero-sized textures cannot be created on the GPU.
    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    EmptyTexture { width: u32, height: u32 },
}

/// Failures while loading a named resource from disk.
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode image {name}: {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to parse mesh {name}: {source}")]
    Mesh {
        name: String,
        #[source]
        source: MeshParseError,
    },

    #[error("failed to parse font {name}: {reason}")]
    Font { name: String, reason: String },

    #[error("GPU upload of {name} failed: {source}")]
    Render {
        name: String,
        #[source]
        source: RenderError,
    },
}

/// Failures while turning a string into a text texture.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("rasterizer produced an empty image for {0:?}")]
    EmptyOutput(String),

    #[error("pixel buffer stride {stride} is smaller than a {width}px row")]
    BadStride { width: u32, stride: usize },

    #[error("pixel buffer holds {actual} bytes, expected at least {expected}")]
    ShortBuffer { expected: usize, actual: usize },

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failures while loading [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
