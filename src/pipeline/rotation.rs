//! Output orientations and their coordinate remapping
//!
//! All four mappings are expressed as pure index functions over the cropped
//! source extent, so they can be checked without touching a pixel buffer.
//! The rotated output buffer is addressed with its own width (the source
//! height for 90 and 270 degrees), never the source width.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;

/// Counter-clockwise rotation applied when presenting a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    pub fn degrees(self) -> i32 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 90,
            Orientation::Deg180 => 180,
            Orientation::Deg270 => 270,
        }
    }

    /// Sum of two rotations, e.g. sensor mounting plus user rotation
    pub fn compose(self, other: Orientation) -> Orientation {
        Self::ALL[((self.quarter_turns() + other.quarter_turns()) % 4) as usize]
    }

    /// Logical destination dimensions for a `width` x `height` source
    pub fn output_extent(self, width: usize, height: usize) -> (usize, usize) {
        match self {
            Orientation::Deg0 | Orientation::Deg180 => (width, height),
            Orientation::Deg90 | Orientation::Deg270 => (height, width),
        }
    }

    /// Destination (column, row) for source position (x, y)
    #[inline]
    pub fn remap(self, x: usize, y: usize, width: usize, height: usize) -> (usize, usize) {
        match self {
            Orientation::Deg0 => (x, y),
            Orientation::Deg90 => (height - 1 - y, x),
            // Also a horizontal mirror of the upside-down image: front camera self-view.
            Orientation::Deg180 => (width - 1 - x, height - 1 - y),
            Orientation::Deg270 => (y, width - 1 - x),
        }
    }

    fn quarter_turns(self) -> u8 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 1,
            Orientation::Deg180 => 2,
            Orientation::Deg270 => 3,
        }
    }
}

impl TryFrom<i32> for Orientation {
    type Error = PipelineError;

    fn try_from(degrees: i32) -> Result<Self, Self::Error> {
        match degrees {
            0 => Ok(Orientation::Deg0),
            90 => Ok(Orientation::Deg90),
            180 => Ok(Orientation::Deg180),
            270 => Ok(Orientation::Deg270),
            other => Err(PipelineError::UnsupportedRotation(other)),
        }
    }
}

impl From<Orientation> for i32 {
    fn from(orientation: Orientation) -> Self {
        orientation.degrees()
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Maps source positions of one crop extent to linear destination offsets
#[derive(Debug, Clone, Copy)]
pub struct RotationMapper {
    orientation: Orientation,
    width: usize,
    height: usize,
    out_width: usize,
}

impl RotationMapper {
    pub fn new(orientation: Orientation, width: usize, height: usize) -> Self {
        let (out_width, _) = orientation.output_extent(width, height);
        Self {
            orientation,
            width,
            height,
            out_width,
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn output_extent(&self) -> (usize, usize) {
        self.orientation.output_extent(self.width, self.height)
    }

    /// Row-major offset into the destination buffer for source (x, y)
    #[inline]
    pub fn destination_index(&self, x: usize, y: usize) -> usize {
        let (col, row) = self
            .orientation
            .remap(x, y, self.width, self.height);
        row * self.out_width + col
    }
}
