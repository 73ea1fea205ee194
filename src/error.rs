use thiserror::Error;

use crate::capture::frame::PixelFormat;

/// Why a captured frame was rejected before conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatIssue {
    #[error("expected YUV 4:2:0 (3 planes), got {0:?}")]
    PixelFormat(PixelFormat),

    #[error("expected 3 planes, got {0}")]
    PlaneCount(usize),

    #[error("crop rectangle {left},{top} -> {right},{bottom} is empty or inverted")]
    EmptyCrop {
        left: u32,
        top: u32,
        right: u32,
        bottom: u32,
    },

    #[error("crop rectangle exceeds coded frame {width}x{height}")]
    CropOutOfBounds { width: u32, height: u32 },

    #[error("plane {plane} has a zero row or pixel stride")]
    ZeroStride { plane: usize },

    #[error("chroma planes disagree on strides (U row {u_row}/pixel {u_pixel}, V row {v_row}/pixel {v_pixel})")]
    ChromaStrideMismatch {
        u_row: usize,
        u_pixel: usize,
        v_row: usize,
        v_pixel: usize,
    },

    #[error("plane {plane} holds {actual} bytes, crop needs {required}")]
    PlaneTooShort {
        plane: usize,
        required: usize,
        actual: usize,
    },

    #[error("plane {plane} strides overflow the address space over the crop")]
    StrideOverflow { plane: usize },
}

/// Pipeline errors. None of these are fatal; every one is local to a single
/// call and leaves the pipeline usable.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid frame format: {0}")]
    InvalidFormat(#[from] FormatIssue),

    #[error("unsupported rotation: {0} degrees")]
    UnsupportedRotation(i32),

    #[error("destination buffer holds {actual} pixels, frame needs {required}")]
    DestinationTooSmall { required: usize, actual: usize },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("snapshot failed: {0}")]
    Snapshot(#[from] image::ImageError),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;
