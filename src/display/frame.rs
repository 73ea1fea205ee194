//! Packed ARGB destination surface handed to the presentation stage

/// Row-major buffer of `0xAARRGGBB` pixels.
///
/// Allocated once by the presentation stage and overwritten in place for
/// every frame. Conversion lays the pixels out with the rotated dimensions
/// (see [`RgbFrame::width`]); the allocation itself never changes.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
}

impl RgbFrame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            width,
            height,
        }
    }

    /// Width of the most recently written image
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels that can be written without reallocating
    pub fn capacity(&self) -> usize {
        self.pixels.len()
    }

    /// Pixels of the current image, `width * height` long
    pub fn pixels(&self) -> &[u32] {
        &self.pixels[..self.width * self.height]
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Re-lay the buffer as `width` x `height` and return the pixels to fill.
    /// Returns `None` if the image would not fit the allocation.
    pub(crate) fn layout_mut(&mut self, width: usize, height: usize) -> Option<&mut [u32]> {
        let len = width.checked_mul(height)?;
        if len > self.pixels.len() {
            return None;
        }
        self.width = width;
        self.height = height;
        Some(&mut self.pixels[..len])
    }
}

/// Consumer of converted frames: a window, encoder, or test sink
pub trait Presenter {
    fn present(&mut self, frame: &RgbFrame);
}
