//! Text state and the rasterizer seam.

use std::fmt;
use std::rc::Rc;

use crate::color::Color;
use crate::error::TextError;
use crate::render::{FilterMode, PixelBuffer};

/// Turns a string into pixels.
///
/// Implemented by [`FontFace`](crate::font::FontFace) when the `text` feature
/// is on; tests and custom font backends can provide their own.
pub trait TextRasterizer {
    fn rasterize(&self, text: &str, size_px: f32, color: Color) -> Result<PixelBuffer, TextError>;
}

/// The string, font and style of a text object.
///
/// Every setter only marks the text dirty. The texture, and the object's
/// scale that follows its pixel size, are regenerated by
/// [`RenderObject::update_text`](super::RenderObject::update_text), which the
/// renderers call before drawing. Until then `transform().scale()` still
/// holds the previous size, so call `update_text` first when the new size is
/// needed right away.
#[derive(Clone)]
pub struct Text {
    content: String,
    font: Rc<dyn TextRasterizer>,
    font_size: f32,
    color: Color,
    filter: FilterMode,
    dirty: bool,
}

impl Text {
    /// Black text, linear filtering.
    pub fn new(content: impl Into<String>, font: Rc<dyn TextRasterizer>, font_size: f32) -> Self {
        Self {
            content: content.into(),
            font,
            font_size,
            color: Color::BLACK,
            filter: FilterMode::Linear,
            dirty: true,
        }
    }

    pub fn set_text(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.dirty = true;
    }

    pub fn set_font(&mut self, font: Rc<dyn TextRasterizer>) {
        self.font = font;
        self.dirty = true;
    }

    pub fn set_font_size(&mut self, size_px: f32) {
        self.font_size = size_px;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.dirty = true;
    }

    pub fn set_filter_mode(&mut self, filter: FilterMode) {
        self.filter = filter;
        self.dirty = true;
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn font(&self) -> &Rc<dyn TextRasterizer> {
        &self.font
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter
    }

    /// Returns `true` if the texture is out of date.
    pub fn needs_update(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Text")
            .field("content", &self.content)
            .field("font_size", &self.font_size)
            .field("color", &self.color)
            .field("filter", &self.filter)
            .field("dirty", &self.dirty)
            .finish()
    }
}
