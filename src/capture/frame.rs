use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::capture::source::Lease;

/// Plane indices of a YUV 4:2:0 frame
pub const Y_PLANE: usize = 0;
pub const U_PLANE: usize = 1;
pub const V_PLANE: usize = 2;

/// One colour plane of a captured frame
#[derive(Debug, Clone)]
pub struct Plane {
    /// Plane bytes, shared with the capture device without copying
    pub data: Bytes,
    /// Bytes from the start of one row to the start of the next
    pub row_stride: usize,
    /// Bytes between horizontally adjacent samples
    pub pixel_stride: usize,
}

impl Plane {
    pub fn new(data: impl Into<Bytes>, row_stride: usize, pixel_stride: usize) -> Self {
        Self {
            data: data.into(),
            row_stride,
            pixel_stride,
        }
    }
}

/// Logical image region inside the coded frame, in luma pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    pub fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Crop covering a whole `width` x `height` frame
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Frame metadata
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    pub sequence: u64,
    /// Coded (uncropped) dimensions
    pub width: u32,
    pub height: u32,
    pub crop: CropRect,
    pub format: PixelFormat,
}

/// Pixel formats a capture device may hand us. Only `Yuv420` converts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Yuv420,
    Nv12,
    Yuyv4,
    Rgb24,
}

/// Frame as produced by the capture subsystem.
///
/// Deliberately not `Clone`: a frame is acquired once, converted once and
/// handed back to its source through [`CaptureSource::release`].
///
/// [`CaptureSource::release`]: crate::capture::CaptureSource::release
#[derive(Debug)]
pub struct CapturedFrame {
    planes: Vec<Plane>,

    /// Frame metadata
    pub meta: Arc<FrameMetadata>,

    /// Arrival timestamp for latency tracking
    pub timestamp: Instant,

    /// Present while the frame is checked out of a device
    lease: Option<Lease>,
}

impl CapturedFrame {
    pub fn new(planes: Vec<Plane>, meta: FrameMetadata) -> Self {
        Self {
            planes,
            meta: Arc::new(meta),
            timestamp: Instant::now(),
            lease: None,
        }
    }

    /// Tie the frame to a device slot that is returned when it drops
    pub fn with_lease(mut self, lease: Lease) -> Self {
        self.lease = Some(lease);
        self
    }

    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, index: usize) -> Option<&Plane> {
        self.planes.get(index)
    }

    pub fn row_stride(&self, index: usize) -> Option<usize> {
        self.plane(index).map(|p| p.row_stride)
    }

    pub fn pixel_stride(&self, index: usize) -> Option<usize> {
        self.plane(index).map(|p| p.pixel_stride)
    }

    pub fn crop(&self) -> CropRect {
        self.meta.crop
    }

    pub fn format(&self) -> PixelFormat {
        self.meta.format
    }

    pub fn sequence(&self) -> u64 {
        self.meta.sequence
    }

    /// Time since the frame arrived from the device
    pub fn age(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_dimensions() {
        let crop = CropRect::new(2, 4, 10, 8);
        assert_eq!(crop.width(), 8);
        assert_eq!(crop.height(), 4);
        assert!(!crop.is_empty());

        let inverted = CropRect::new(10, 0, 2, 8);
        assert_eq!(inverted.width(), 0);
        assert!(inverted.is_empty());
    }

    #[test]
    fn age_counts_from_arrival() {
        let meta = FrameMetadata {
            sequence: 1,
            width: 2,
            height: 2,
            crop: CropRect::full(2, 2),
            format: PixelFormat::Yuv420,
        };
        let mut frame = CapturedFrame::new(Vec::new(), meta);
        if let Some(earlier) = Instant::now().checked_sub(Duration::from_millis(40)) {
            frame.timestamp = earlier;
            assert!(frame.age() >= Duration::from_millis(40));
        }
    }

    #[test]
    fn plane_accessors() {
        let planes = vec![
            Plane::new(vec![0u8; 16], 4, 1),
            Plane::new(vec![0u8; 8], 4, 2),
            Plane::new(vec![0u8; 8], 4, 2),
        ];
        let frame = CapturedFrame::new(
            planes,
            FrameMetadata {
                sequence: 7,
                width: 4,
                height: 4,
                crop: CropRect::full(4, 4),
                format: PixelFormat::Yuv420,
            },
        );

        assert_eq!(frame.plane_count(), 3);
        assert_eq!(frame.row_stride(U_PLANE), Some(4));
        assert_eq!(frame.pixel_stride(V_PLANE), Some(2));
        assert_eq!(frame.pixel_stride(3), None);
        assert_eq!(frame.sequence(), 7);
    }
}
