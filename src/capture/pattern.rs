//! Synthetic YUV 4:2:0 frames for the demo producer and tests

use bytes::{Bytes, BytesMut};

use crate::capture::frame::{CapturedFrame, CropRect, FrameMetadata, PixelFormat, Plane};

/// One studio-range sample triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Yuv {
    pub y: u8,
    pub u: u8,
    pub v: u8,
}

impl Yuv {
    pub const fn new(y: u8, u: u8, v: u8) -> Self {
        Self { y, u, v }
    }
}

/// 100% colour bars, BT.601 studio range
pub const COLOR_BARS: [Yuv; 8] = [
    Yuv::new(235, 128, 128), // white
    Yuv::new(210, 16, 146),  // yellow
    Yuv::new(170, 166, 16),  // cyan
    Yuv::new(145, 54, 34),   // green
    Yuv::new(106, 202, 222), // magenta
    Yuv::new(81, 90, 240),   // red
    Yuv::new(41, 240, 110),  // blue
    Yuv::new(16, 128, 128),  // black
];

/// How the generated planes are laid out in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    /// 1 for fully planar chroma, 2 for U and V interleaved in one buffer
    pub chroma_pixel_stride: usize,
    /// Extra bytes at the end of every row
    pub row_padding: usize,
}

impl Default for PlaneLayout {
    fn default() -> Self {
        Self {
            chroma_pixel_stride: 2,
            row_padding: 0,
        }
    }
}

/// Build a frame by sampling `pixel` at every luma position. Chroma for
/// each 2x2 block is taken from the block's top-left pixel.
pub fn synthesize(
    sequence: u64,
    width: u32,
    height: u32,
    layout: PlaneLayout,
    pixel: impl Fn(u32, u32) -> Yuv,
) -> CapturedFrame {
    let (w, h) = (width as usize, height as usize);
    let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
    let stride = layout.chroma_pixel_stride.max(1);

    let y_stride = w + layout.row_padding;
    let mut luma = BytesMut::zeroed(y_stride * h);
    for y in 0..h {
        for x in 0..w {
            luma[y * y_stride + x] = pixel(x as u32, y as u32).y;
        }
    }

    let c_stride = cw * stride + layout.row_padding;
    let (u_plane, v_plane) = if stride == 1 {
        let mut u = BytesMut::zeroed(c_stride * ch);
        let mut v = BytesMut::zeroed(c_stride * ch);
        for cy in 0..ch {
            for cx in 0..cw {
                let s = pixel(2 * cx as u32, 2 * cy as u32);
                u[cy * c_stride + cx] = s.u;
                v[cy * c_stride + cx] = s.v;
            }
        }
        (u.freeze(), v.freeze())
    } else {
        // U at even offsets, V one byte later, both views over the same buffer.
        let mut uv = BytesMut::zeroed(c_stride * ch);
        for cy in 0..ch {
            for cx in 0..cw {
                let s = pixel(2 * cx as u32, 2 * cy as u32);
                let at = cy * c_stride + cx * stride;
                uv[at] = s.u;
                uv[at + 1] = s.v;
            }
        }
        let uv: Bytes = uv.freeze();
        let len = uv.len();
        (uv.slice(..len.saturating_sub(1)), uv.slice(len.min(1)..))
    };

    CapturedFrame::new(
        vec![
            Plane::new(luma.freeze(), y_stride, 1),
            Plane::new(u_plane, c_stride, stride),
            Plane::new(v_plane, c_stride, stride),
        ],
        FrameMetadata {
            sequence,
            width,
            height,
            crop: CropRect::full(width, height),
            format: PixelFormat::Yuv420,
        },
    )
}

/// Scrolling colour-bar source
#[derive(Debug, Clone)]
pub struct TestPattern {
    width: u32,
    height: u32,
    layout: PlaneLayout,
    crop: Option<CropRect>,
    sequence: u64,
}

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layout: PlaneLayout::default(),
            crop: None,
            sequence: 0,
        }
    }

    pub fn with_layout(mut self, layout: PlaneLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_crop(mut self, crop: CropRect) -> Self {
        self.crop = Some(crop);
        self
    }

    /// Render the next frame; bars shift one pixel left per frame.
    pub fn next_frame(&mut self) -> CapturedFrame {
        self.sequence += 1;
        let phase = self.sequence as u32;
        let bar_width = (self.width / COLOR_BARS.len() as u32).max(1);

        let mut frame = synthesize(self.sequence, self.width, self.height, self.layout, |x, _| {
            let bar = (x.wrapping_add(phase) / bar_width) as usize % COLOR_BARS.len();
            COLOR_BARS[bar]
        });
        if let Some(crop) = self.crop {
            std::sync::Arc::make_mut(&mut frame.meta).crop = crop;
        }
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_layout_shares_one_buffer() {
        let frame = synthesize(1, 4, 2, PlaneLayout::default(), |x, _| {
            Yuv::new(100, x as u8, 200 + x as u8)
        });

        let u = frame.plane(1).unwrap();
        let v = frame.plane(2).unwrap();
        assert_eq!(u.pixel_stride, 2);
        assert_eq!(u.row_stride, 4);
        // Block 0 sampled at x = 0, block 1 at x = 2
        assert_eq!(&u.data[..], &[0u8, 200, 2][..]);
        assert_eq!(v.data[0], 200);
        assert_eq!(v.data[2], 202);
    }

    #[test]
    fn planar_layout_with_padding() {
        let layout = PlaneLayout {
            chroma_pixel_stride: 1,
            row_padding: 3,
        };
        let frame = synthesize(1, 4, 4, layout, |_, y| Yuv::new(y as u8, 1, 2));

        let luma = frame.plane(0).unwrap();
        assert_eq!(luma.row_stride, 7);
        assert_eq!(luma.data[7 * 3], 3);

        let u = frame.plane(1).unwrap();
        assert_eq!((u.row_stride, u.pixel_stride), (5, 1));
        assert_eq!(u.data.len(), 10);
    }

    #[test]
    fn sequence_advances() {
        let mut pattern = TestPattern::new(16, 8);
        assert_eq!(pattern.next_frame().sequence(), 1);
        assert_eq!(pattern.next_frame().sequence(), 2);
    }
}
