//! PNG export of a converted frame

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use tracing::info;

use crate::display::frame::RgbFrame;
use crate::error::Result;

impl RgbFrame {
    /// Unpack to an 8-bit RGBA image
    pub fn to_image(&self) -> RgbaImage {
        let width = self.width();
        let pixels = self.pixels();
        RgbaImage::from_fn(width as u32, self.height() as u32, |x, y| {
            let p = pixels[y as usize * width + x as usize];
            Rgba([(p >> 16) as u8, (p >> 8) as u8, p as u8, (p >> 24) as u8])
        })
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_image().save_with_format(path, ImageFormat::Png)?;
        info!("Saved {}x{} snapshot to {}", self.width(), self.height(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trips_channels() {
        let mut frame = RgbFrame::new(2, 1);
        frame
            .layout_mut(2, 1)
            .unwrap()
            .copy_from_slice(&[0xFF11_2233, 0xFFAA_BBCC]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        frame.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (2, 1));
        assert_eq!(loaded.get_pixel(0, 0).0, [0x11, 0x22, 0x33, 0xFF]);
        assert_eq!(loaded.get_pixel(1, 0).0, [0xAA, 0xBB, 0xCC, 0xFF]);
    }
}
