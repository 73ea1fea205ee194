//! Read-only addressing over one plane of a captured frame

use crate::capture::frame::{CropRect, Plane};
use crate::error::FormatIssue;

/// Sampling density of a plane relative to the luma grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subsampling {
    /// One sample per luma pixel
    Full,
    /// One sample per 2x2 block of luma pixels (4:2:0 chroma)
    Half,
}

impl Subsampling {
    fn shift(self) -> u32 {
        match self {
            Subsampling::Full => 0,
            Subsampling::Half => 1,
        }
    }
}

/// View of one plane restricted to the frame's crop rectangle.
///
/// Coordinates passed to [`PlaneView::sample`] are logical luma positions
/// relative to the crop origin; the view applies the crop offset, the
/// subsampling divisor and the plane's own strides. Construction checks that
/// every position inside the crop lands inside the plane, so sampling never
/// indexes out of bounds.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    data: &'a [u8],
    row_stride: usize,
    pixel_stride: usize,
    origin_x: usize,
    origin_y: usize,
    width: usize,
    height: usize,
    shift: u32,
}

impl<'a> PlaneView<'a> {
    pub fn new(
        index: usize,
        plane: &'a Plane,
        crop: CropRect,
        subsampling: Subsampling,
    ) -> Result<Self, FormatIssue> {
        if plane.row_stride == 0 || plane.pixel_stride == 0 {
            return Err(FormatIssue::ZeroStride { plane: index });
        }

        let view = Self {
            data: &plane.data,
            row_stride: plane.row_stride,
            pixel_stride: plane.pixel_stride,
            origin_x: crop.left as usize,
            origin_y: crop.top as usize,
            width: crop.width() as usize,
            height: crop.height() as usize,
            shift: subsampling.shift(),
        };

        let required = view
            .required_len()
            .ok_or(FormatIssue::StrideOverflow { plane: index })?;
        if view.data.len() < required {
            return Err(FormatIssue::PlaneTooShort {
                plane: index,
                required,
                actual: view.data.len(),
            });
        }

        Ok(view)
    }

    /// Byte offset of logical position (x, y) within the plane.
    ///
    /// Only positions inside the crop are valid; for those the arithmetic
    /// was range-checked by [`PlaneView::new`].
    #[inline]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        // Subsample the absolute position: with an odd crop origin,
        // `(left >> 1) + (x >> 1)` would pick the block to the left.
        ((self.origin_y + y) >> self.shift) * self.row_stride
            + ((self.origin_x + x) >> self.shift) * self.pixel_stride
    }

    #[inline]
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[self.offset(x, y)]
    }

    /// Minimum plane length that covers the whole crop, or `None` when the
    /// strides push the far corner past `usize::MAX`.
    fn required_len(&self) -> Option<usize> {
        if self.width == 0 || self.height == 0 {
            return Some(0);
        }
        // Offset grows monotonically in both axes, so the far corner is the max.
        let row = self.origin_y.checked_add(self.height - 1)? >> self.shift;
        let col = self.origin_x.checked_add(self.width - 1)? >> self.shift;
        row.checked_mul(self.row_stride)?
            .checked_add(col.checked_mul(self.pixel_stride)?)?
            .checked_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_applies_crop_origin_and_stride() {
        // 6 wide, row stride 8 (2 bytes padding), 4 rows
        let data: Vec<u8> = (0..32).collect();
        let plane = Plane::new(data, 8, 1);
        let crop = CropRect::new(1, 1, 5, 3);

        let view = PlaneView::new(0, &plane, crop, Subsampling::Full).unwrap();
        assert_eq!(view.offset(0, 0), 9);
        assert_eq!(view.sample(3, 1), 8 * 2 + 4);
    }

    #[test]
    fn chroma_uses_own_pixel_stride_and_halves_both_axes() {
        // Interleaved-style chroma: pixel stride 2, row stride 8
        let data: Vec<u8> = (0..32).collect();
        let plane = Plane::new(data, 8, 2);
        let crop = CropRect::new(0, 0, 8, 8);

        let view = PlaneView::new(1, &plane, crop, Subsampling::Half).unwrap();
        assert_eq!(view.offset(0, 0), 0);
        assert_eq!(view.offset(1, 1), 0);
        assert_eq!(view.offset(2, 0), 2);
        assert_eq!(view.offset(3, 3), 8 + 2);
        assert_eq!(view.offset(7, 7), 3 * 8 + 3 * 2);
    }

    #[test]
    fn odd_crop_origin_selects_covering_chroma_sample() {
        let data: Vec<u8> = (0..32).collect();
        let plane = Plane::new(data, 8, 1);
        let crop = CropRect::new(1, 1, 5, 5);

        let view = PlaneView::new(1, &plane, crop, Subsampling::Half).unwrap();
        // Luma (1,1) sits in the first chroma block, luma (2,2) in the next one.
        assert_eq!(view.offset(0, 0), 0);
        assert_eq!(view.offset(1, 1), 8 + 1);
    }

    #[test]
    fn rejects_short_plane() {
        let plane = Plane::new(vec![0u8; 10], 4, 1);
        let crop = CropRect::full(4, 4);

        let err = PlaneView::new(0, &plane, crop, Subsampling::Full).unwrap_err();
        assert_eq!(
            err,
            FormatIssue::PlaneTooShort {
                plane: 0,
                required: 16,
                actual: 10
            }
        );
    }

    #[test]
    fn rejects_strides_that_overflow() {
        let plane = Plane::new(vec![16u8; 4], usize::MAX, 1);
        let err = PlaneView::new(0, &plane, CropRect::full(2, 2), Subsampling::Full).unwrap_err();
        assert_eq!(err, FormatIssue::StrideOverflow { plane: 0 });

        let plane = Plane::new(vec![16u8; 4], 2, usize::MAX / 2);
        let err = PlaneView::new(1, &plane, CropRect::full(8, 2), Subsampling::Half).unwrap_err();
        assert_eq!(err, FormatIssue::StrideOverflow { plane: 1 });
    }

    #[test]
    fn single_row_ignores_huge_row_stride() {
        // Only row 0 is addressed, so the row stride never enters the offset.
        let plane = Plane::new(vec![7u8; 4], usize::MAX, 1);
        let view = PlaneView::new(0, &plane, CropRect::full(4, 1), Subsampling::Full).unwrap();
        assert_eq!(view.sample(3, 0), 7);
    }

    #[test]
    fn rejects_zero_stride() {
        let plane = Plane::new(vec![0u8; 16], 0, 1);
        let err = PlaneView::new(2, &plane, CropRect::full(4, 4), Subsampling::Half).unwrap_err();
        assert_eq!(err, FormatIssue::ZeroStride { plane: 2 });
    }
}
