pub mod capture;
pub mod display;
pub mod error;
pub mod pipeline;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capture::AcquirePolicy;
use crate::pipeline::{queue::DEFAULT_CAPACITY, Orientation};

pub use crate::capture::{CaptureSource, CapturedFrame, RingCapture};
pub use crate::display::RgbFrame;
pub use crate::error::{PipelineError, Result};
pub use crate::pipeline::{FrameBufferQueue, FramePipeline, Tick};

/// Prefix for environment overrides, e.g. `FRAMEPIPE_PIPELINE__ORIENTATION=90`
pub const ENV_PREFIX: &str = "FRAMEPIPE";

/// System configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub capture: CaptureConfig,
    pub display: DisplayConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Size of the device's frame ring
    pub max_images: usize,
    pub chroma_pixel_stride: usize,
    pub row_padding: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    pub refresh_hz: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Frames admitted ahead of the consumer
    pub capacity: usize,
    pub policy: AcquirePolicy,
    /// Degrees counter-clockwise: 0, 90, 180 or 270
    pub orientation: Orientation,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                width: 720,
                height: 480,
                fps: 30,
                max_images: 2,
                chroma_pixel_stride: 2,
                row_padding: 0,
            },
            display: DisplayConfig {
                width: 720,
                height: 480,
                refresh_hz: 60,
            },
            pipeline: PipelineConfig {
                capacity: DEFAULT_CAPACITY,
                policy: AcquirePolicy::Latest,
                orientation: Orientation::Deg0,
            },
        }
    }
}

impl Config {
    /// Layer defaults, an optional TOML file and `FRAMEPIPE_*` environment
    /// variables, later sources winning.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Config::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}
