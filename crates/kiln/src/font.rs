//! # Font — TTF/OTF rasterization for text objects
//!
//! Uses [fontdue](https://docs.rs/fontdue) to turn a whole string into one
//! RGBA image. Every pixel carries the text color; alpha is the glyph
//! coverage times the color's alpha. The sprite shader samples the result
//! like any other texture.
//!
//! ## Layout
//!
//! Lines are split on `\n` and stacked top to bottom using the font's
//! horizontal line metrics (`new_line_size`). Within a line the pen advances
//! by each glyph's `advance_width`. The image is as wide as the widest line
//! and as tall as all lines together, so a text object can size its quad to
//! the image 1:1.

use crate::color::Color;
use crate::error::{ResourceError, TextError};
use crate::object::TextRasterizer;
use crate::render::PixelBuffer;

/// A parsed font, ready to rasterize at any pixel size.
pub struct FontFace {
    name: String,
    font: fontdue::Font,
}

impl FontFace {
    /// Parse TTF/OTF bytes. `scale` is the pixel size fontdue optimizes its
    /// outlines for; other sizes still work.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>, scale: f32) -> Result<Self, ResourceError> {
        let name = name.into();
        let font = fontdue::Font::from_bytes(
            bytes,
            fontdue::FontSettings {
                scale,
                ..Default::default()
            },
        )
        .map_err(|reason| ResourceError::Font {
            name: name.clone(),
            reason: reason.to_owned(),
        })?;
        log::debug!("parsed font '{name}' ({} glyphs)", font.glyph_count());
        Ok(Self { name, font })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace").field("name", &self.name).finish()
    }
}

/// One glyph placed on the canvas.
struct PlacedGlyph {
    x: i32,
    y: i32,
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

impl TextRasterizer for FontFace {
    fn rasterize(&self, text: &str, size_px: f32, color: Color) -> Result<PixelBuffer, TextError> {
        let (ascent, line_height) = match self.font.horizontal_line_metrics(size_px) {
            Some(m) => (m.ascent, m.new_line_size),
            None => (size_px, size_px * 1.2),
        };

        let mut glyphs = Vec::new();
        let mut width = 0.0_f32;
        let lines: Vec<&str> = text.split('\n').collect();

        for (row, line) in lines.iter().enumerate() {
            let baseline = row as f32 * line_height + ascent;
            let mut pen_x = 0.0_f32;
            for ch in line.chars() {
                let (metrics, coverage) = self.font.rasterize(ch, size_px);
                if metrics.width > 0 && metrics.height > 0 {
                    glyphs.push(PlacedGlyph {
                        x: (pen_x + metrics.xmin as f32).round() as i32,
                        y: (baseline - (metrics.ymin as f32 + metrics.height as f32)).round() as i32,
                        width: metrics.width,
                        height: metrics.height,
                        coverage,
                    });
                    width = width.max(pen_x + metrics.xmin as f32 + metrics.width as f32);
                }
                pen_x += metrics.advance_width;
            }
            width = width.max(pen_x);
        }

        let canvas_w = width.ceil() as u32;
        let canvas_h = (lines.len() as f32 * line_height).ceil() as u32;
        if canvas_w == 0 || canvas_h == 0 {
            return Err(TextError::EmptyOutput(text.to_owned()));
        }

        let mut canvas = Canvas::new(canvas_w, canvas_h, color);
        for glyph in &glyphs {
            canvas.blit(glyph);
        }
        Ok(PixelBuffer::rgba(canvas_w, canvas_h, canvas.data))
    }
}

/// RGBA target with the text color pre-filled and alpha zero.
struct Canvas {
    width: u32,
    height: u32,
    alpha: f32,
    data: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, color: Color) -> Self {
        let [r, g, b, _] = color.to_rgba8();
        let data = [r, g, b, 0].repeat((width * height) as usize);
        Self {
            width,
            height,
            alpha: color.a.clamp(0.0, 1.0),
            data,
        }
    }

    /// Overlapping glyphs keep the larger coverage.
    fn blit(&mut self, glyph: &PlacedGlyph) {
        for gy in 0..glyph.height {
            let y = glyph.y + gy as i32;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            for gx in 0..glyph.width {
                let x = glyph.x + gx as i32;
                if x < 0 || x >= self.width as i32 {
                    continue;
                }
                let coverage = glyph.coverage[gy * glyph.width + gx];
                let a = (coverage as f32 * self.alpha).round() as u8;
                let idx = (y as usize * self.width as usize + x as usize) * 4 + 3;
                self.data[idx] = self.data[idx].max(a);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyph(x: i32, y: i32, w: usize, h: usize, value: u8) -> PlacedGlyph {
        PlacedGlyph {
            x,
            y,
            width: w,
            height: h,
            coverage: vec![value; w * h],
        }
    }

    fn alpha_at(canvas: &Canvas, x: u32, y: u32) -> u8 {
        canvas.data[((y * canvas.width + x) * 4 + 3) as usize]
    }

    #[test]
    fn canvas_starts_transparent_in_text_color() {
        let canvas = Canvas::new(2, 1, Color::RED);
        assert_eq!(canvas.data, vec![255, 0, 0, 0, 255, 0, 0, 0]);
    }

    #[test]
    fn blit_scales_coverage_by_alpha() {
        let mut canvas = Canvas::new(2, 2, Color::rgba(0.0, 0.0, 0.0, 0.5));
        canvas.blit(&glyph(0, 0, 1, 1, 200));
        assert_eq!(alpha_at(&canvas, 0, 0), 100);
        assert_eq!(alpha_at(&canvas, 1, 1), 0);
    }

    #[test]
    fn blit_clips_to_canvas() {
        let mut canvas = Canvas::new(2, 2, Color::BLACK);
        canvas.blit(&glyph(-1, -1, 4, 4, 255));
        assert!(canvas.data.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn overlapping_glyphs_keep_max_coverage() {
        let mut canvas = Canvas::new(1, 1, Color::BLACK);
        canvas.blit(&glyph(0, 0, 1, 1, 180));
        canvas.blit(&glyph(0, 0, 1, 1, 90));
        assert_eq!(alpha_at(&canvas, 0, 0), 180);
    }

    #[test]
    fn garbage_bytes_are_a_font_error() {
        let err = FontFace::from_bytes("junk.ttf", vec![0, 1, 2, 3], 16.0).unwrap_err();
        assert!(matches!(err, ResourceError::Font { ref name, .. } if name == "junk.ttf"));
    }
}
