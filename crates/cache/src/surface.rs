//! Rendered page surfaces

use image::{ImageBuffer, Rgba};

/// RGBA backing store, four bytes per device pixel.
pub type Pixels = ImageBuffer<Rgba<u8>, Vec<u8>>;

/// An off-screen surface holding a rasterized page
///
/// The pixel size is the device-pixel size of the backing store. The logical
/// (CSS pixel) size is the pixel size divided by the density it was rendered
/// at.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: Pixels,
}

impl Surface {
    /// Allocate a fully transparent surface
    pub fn blank(width: u32, height: u32) -> Self {
        Self { pixels: Pixels::new(width, height) }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// True for zero-area surfaces produced by degenerate geometry
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn pixels(&self) -> &Pixels {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut Pixels {
        &mut self.pixels
    }

    /// Memory held by the backing store in bytes
    pub fn memory_size(&self) -> usize {
        self.pixels.as_raw().len()
    }
}
