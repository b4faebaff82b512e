//! Textures and CPU pixel buffers.
//!
//! A [`Texture`] is a backend handle plus its size and filter. Identity is the
//! [`TextureId`]: two textures are "the same" for bind-avoidance purposes when
//! their ids match.
//!
//! [`PixelBuffer`] is what rasterizers and decoders hand over before upload.
//! Rows may be padded (`stride > width * 4`) and channels may be BGRA; the
//! buffer is repacked into tight RGBA before it reaches the backend.

use super::{RenderBackend, TextureId};
use crate::error::{RenderError, TextError};

/// Sampler filter for minification and magnification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    Nearest,
    #[default]
    Linear,
}

/// An uploaded texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    filter: FilterMode,
}

impl Texture {
    /// Upload tightly packed RGBA8 pixels.
    pub fn from_rgba(
        backend: &mut dyn RenderBackend,
        label: &str,
        width: u32,
        height: u32,
        rgba: &[u8],
        filter: FilterMode,
    ) -> Result<Self, RenderError> {
        check_rgba_len(width, height, rgba)?;
        let id = backend.create_texture(label, width, height, rgba, filter)?;
        Ok(Self {
            id,
            width,
            height,
            filter,
        })
    }

    /// Replace the pixels of this texture in place, keeping its id.
    pub fn update(
        &mut self,
        backend: &mut dyn RenderBackend,
        width: u32,
        height: u32,
        rgba: &[u8],
        filter: FilterMode,
    ) -> Result<(), RenderError> {
        check_rgba_len(width, height, rgba)?;
        backend.update_texture(self.id, width, height, rgba, filter)?;
        self.width = width;
        self.height = height;
        self.filter = filter;
        Ok(())
    }

    /// Bind to a texture unit for the next draw.
    pub fn bind(&self, backend: &mut dyn RenderBackend, unit: u32) {
        backend.bind_texture(self.id, unit);
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }
}

fn check_rgba_len(width: u32, height: u32, rgba: &[u8]) -> Result<(), RenderError> {
    if width == 0 || height == 0 {
        return Err(RenderError::EmptyTexture { width, height });
    }
    let expected = width as usize * height as usize * 4;
    if rgba.len() != expected {
        return Err(RenderError::TextureSizeMismatch {
            width,
            height,
            expected,
            actual: rgba.len(),
        });
    }
    Ok(())
}

/// Channel order of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgba8,
    Bgra8,
}

/// Raw 32-bit pixels with an explicit row stride in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub stride: usize,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// A tightly packed RGBA buffer.
    pub fn rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width as usize * 4,
            format: PixelFormat::Rgba8,
            data,
        }
    }

    /// Drop row padding and convert to RGBA.
    pub fn into_tight_rgba(self) -> Result<Vec<u8>, TextError> {
        let row = self.width as usize * 4;
        if self.stride < row {
            return Err(TextError::BadStride {
                width: self.width,
                stride: self.stride,
            });
        }
        let height = self.height as usize;
        let expected = if height == 0 {
            0
        } else {
            self.stride * (height - 1) + row
        };
        if self.data.len() < expected {
            return Err(TextError::ShortBuffer {
                expected,
                actual: self.data.len(),
            });
        }

        let mut out = if self.stride == row {
            let mut data = self.data;
            data.truncate(row * height);
            data
        } else {
            let mut out = Vec::with_capacity(row * height);
            for y in 0..height {
                let start = y * self.stride;
                out.extend_from_slice(&self.data[start..start + row]);
            }
            out
        };

        if self.format == PixelFormat::Bgra8 {
            for px in out.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_row_padding() {
        // 2x2 pixels, 12-byte stride (4 bytes of padding per row).
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 1, 1, 1, 2, 2, 2, 2, 9, 9, 9, 9]);
        data.extend_from_slice(&[3, 3, 3, 3, 4, 4, 4, 4, 9, 9, 9, 9]);
        let buffer = PixelBuffer {
            width: 2,
            height: 2,
            stride: 12,
            format: PixelFormat::Rgba8,
            data,
        };
        let tight = buffer.into_tight_rgba().expect("valid buffer");
        assert_eq!(tight.len(), 16);
        assert!(!tight.contains(&9), "padding bytes leaked into the output");
        assert_eq!(&tight[12..], &[4, 4, 4, 4]);
    }

    #[test]
    fn last_row_padding_is_optional() {
        let buffer = PixelBuffer {
            width: 1,
            height: 2,
            stride: 8,
            format: PixelFormat::Rgba8,
            data: vec![1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8],
        };
        assert_eq!(
            buffer.into_tight_rgba().expect("valid buffer"),
            vec![1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn swizzles_bgra() {
        let buffer = PixelBuffer {
            width: 1,
            height: 1,
            stride: 4,
            format: PixelFormat::Bgra8,
            data: vec![10, 20, 30, 255],
        };
        assert_eq!(buffer.into_tight_rgba().expect("valid buffer"), vec![30, 20, 10, 255]);
    }

    #[test]
    fn rejects_short_stride() {
        let buffer = PixelBuffer {
            width: 4,
            height: 1,
            stride: 8,
            format: PixelFormat::Rgba8,
            data: vec![0; 8],
        };
        assert!(matches!(buffer.into_tight_rgba(), Err(TextError::BadStride { .. })));
    }

    #[test]
    fn rejects_truncated_data() {
        let buffer = PixelBuffer::rgba(2, 2, vec![0; 12]);
        assert!(matches!(buffer.into_tight_rgba(), Err(TextError::ShortBuffer { expected: 16, actual: 12 })));
    }
}
